//! Bounded record of the edges that closed dependency cycles

use serde::Serialize;
use std::fmt;

use crate::domain::{DepKind, PackageGraph, PackageId, Relation};

pub const DEFAULT_LOOP_CAPACITY: usize = 20;

/// The edge that closed a cycle: `dependent` needed `target`, which was
/// still being visited
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoopEdge {
    pub dependent: PackageId,
    pub dependent_name: String,
    pub target: PackageId,
    pub target_name: String,
    pub kind: DepKind,
    /// Capability the target provides, if reached through Provides
    pub via: Option<String>,
    /// The in-progress package the traversal ran back into
    pub closes_at: PackageId,
}

impl LoopEdge {
    pub fn new(graph: &PackageGraph, relation: &Relation<'_>, closes_at: PackageId) -> Self {
        Self {
            dependent: relation.owner,
            dependent_name: graph.name(relation.owner).to_string(),
            target: relation.target,
            target_name: graph.name(relation.target).to_string(),
            kind: relation.kind(),
            via: relation.edge.via.clone(),
            closes_at,
        }
    }
}

impl fmt::Display for LoopEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.dependent_name, self.kind.label(), self.target_name)?;
        if let Some(via) = &self.via {
            write!(f, " (via {})", via)?;
        }
        Ok(())
    }
}

/// Keeps the first `capacity` loop edges and counts all of them
#[derive(Debug, Clone)]
pub struct LoopRecord {
    edges: Vec<LoopEdge>,
    capacity: usize,
    count: usize,
}

impl Default for LoopRecord {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_LOOP_CAPACITY)
    }
}

impl LoopRecord {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            edges: Vec::with_capacity(capacity),
            capacity,
            count: 0,
        }
    }

    /// Records a loop; the edge is dropped once the record is full
    pub fn push(&mut self, edge: LoopEdge) {
        self.count += 1;
        if self.edges.len() < self.capacity {
            self.edges.push(edge);
        }
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.count = 0;
    }

    /// Number of loops detected, including dropped ones
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns true if some loops were detected but not kept
    pub fn truncated(&self) -> bool {
        self.count > self.edges.len()
    }

    pub fn edges(&self) -> &[LoopEdge] {
        &self.edges
    }
}
