//! Ordering failures

use thiserror::Error;

use super::loops::LoopEdge;
use crate::domain::PackageId;

#[derive(Debug, Error, PartialEq)]
pub enum OrderError {
    #[error("Unresolved dependency cycle ({count} detected): {}", describe(.loops, .truncated))]
    CycleUnresolved {
        loops: Vec<LoopEdge>,
        count: usize,
        /// Some detected loops were not kept in `loops`
        truncated: bool,
    },

    #[error("Traversal depth exceeded {limit} while visiting {package}")]
    DepthExceeded { package: String, limit: usize },

    #[error("{requested} candidates exceed the sequence capacity of {capacity}")]
    CapacityExceeded { requested: usize, capacity: usize },

    #[error("Unknown package id: {0}")]
    UnknownPackage(PackageId),
}

fn describe(loops: &[LoopEdge], truncated: &bool) -> String {
    let mut text = loops
        .iter()
        .map(|l| l.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    if *truncated {
        text.push_str("; ...");
    }
    text
}

impl OrderError {
    /// Returns the recorded loop edges, if this is a cycle failure
    pub fn loops(&self) -> &[LoopEdge] {
        match self {
            OrderError::CycleUnresolved { loops, .. } => loops,
            _ => &[],
        }
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self, OrderError::CycleUnresolved { .. })
    }
}
