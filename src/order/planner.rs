//! Transaction planning around the ordering engine
//!
//! Runs the three modes in sequence and applies the loop-breaking strategy
//! between them: essential packages and what they pre-depend on configure
//! immediately, and when unpacking still runs into a cycle, the packages the
//! recorded loops closed on are marked `Immediate` and the pass is retried.
//! Immediate packages are configured as part of unpacking and are left out of
//! the configure sequence.

use serde::{Deserialize, Serialize};

use super::error::OrderError;
use super::flags::{Flags, Lifecycle};
use super::list::OrderList;
use super::presort::FileGroups;
use crate::domain::{DepKind, PackageId, Slot};

/// Planner settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Unpack retries after marking loop members `Immediate`
    pub max_loop_breaks: usize,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self { max_loop_breaks: 8 }
    }
}

/// The sequences of one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionPlan {
    pub critical: Vec<PackageId>,
    /// Packages configured right after unpacking
    pub immediate: Vec<PackageId>,
    pub unpack: Vec<PackageId>,
    pub configure: Vec<PackageId>,
    /// Packages marked `Immediate` to break unpack loops
    pub loop_breaks: Vec<PackageId>,
    /// Unpack passes run, including the successful one
    pub attempts: usize,
}

pub struct Planner<'l, 'g> {
    list: &'l mut OrderList<'g>,
    config: PlannerConfig,
}

impl<'l, 'g> Planner<'l, 'g> {
    pub fn new(list: &'l mut OrderList<'g>, config: PlannerConfig) -> Self {
        Self { list, config }
    }

    /// Plans the whole transaction; `groups` feeds the unpack pre-sort
    pub fn plan(mut self, groups: Option<FileGroups>) -> Result<TransactionPlan, OrderError> {
        let critical = self.list.order_critical()?;

        self.list.reset_transient();
        self.mark_essential_immediate();
        let initially_immediate = self.list.immediate();

        if let Some(groups) = groups {
            self.list.set_file_groups(groups);
        }
        let (unpack, attempts) = self.unpack_breaking_loops()?;
        let immediate = self.list.immediate();
        let loop_breaks = immediate
            .iter()
            .copied()
            .filter(|id| !initially_immediate.contains(id))
            .collect();

        self.record_unpacked(&unpack);
        self.list.reset_transient();
        let pending = self.unconfigured();
        self.list.set_candidates(&pending)?;
        let configure = self.list.order_configure()?;

        Ok(TransactionPlan {
            critical,
            immediate,
            unpack,
            configure,
            loop_breaks,
            attempts,
        })
    }

    /// Essential packages being installed and the packages they pre-depend on
    fn mark_essential_immediate(&mut self) {
        let graph = self.list.graph();

        for pkg in graph.packages().filter(|p| p.essential && p.action.installs()) {
            self.list.mark_immediate(pkg.id);

            for relation in graph.forward(pkg.id, Slot::Candidate) {
                let target = graph.package(relation.target);
                if relation.kind() == DepKind::PreDepends && target.action.installs() {
                    self.list.mark_immediate(target.id);
                }
            }
        }
    }

    fn unpack_breaking_loops(&mut self) -> Result<(Vec<PackageId>, usize), OrderError> {
        let mut attempts = 0;

        loop {
            attempts += 1;
            let err = match self.list.order_unpack(None) {
                Ok(order) => return Ok((order, attempts)),
                Err(err) => err,
            };

            if !err.is_cycle() || attempts > self.config.max_loop_breaks {
                return Err(err);
            }

            let graph = self.list.graph();
            let mut marked = false;
            for edge in err.loops() {
                // Configuring early does not help a pending removal
                if !graph.package(edge.closes_at).action.installs() {
                    continue;
                }
                if !self.list.is_flag(edge.closes_at, Flags::IMMEDIATE) {
                    self.list.mark_immediate(edge.closes_at);
                    marked = true;
                }
            }
            if !marked {
                return Err(err);
            }
        }
    }

    /// Immediate packages count as configured once unpacked
    fn record_unpacked(&mut self, unpack: &[PackageId]) {
        let graph = self.list.graph();
        for &id in unpack {
            let stage = if graph.package(id).action.is_remove() {
                Lifecycle::Removed
            } else if self.list.is_flag(id, Flags::IMMEDIATE) {
                Lifecycle::Configured
            } else {
                Lifecycle::UnPacked
            };
            self.list.set_lifecycle(id, stage);
        }
    }

    fn unconfigured(&self) -> Vec<PackageId> {
        self.list
            .graph()
            .packages()
            .filter(|p| p.action.installs() && self.list.lifecycle(p.id) != Lifecycle::Configured)
            .map(|p| p.id)
            .collect()
    }
}
