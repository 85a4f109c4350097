//! The ordering engine
//!
//! An [`OrderList`] is bound to one snapshot and owns the flag store and the
//! output sequence for the whole transaction. Each `order_*` call starts a new
//! pass: the sequence, the loop record and the per-pass flags are reset, while
//! lifecycle stages and `Immediate` marks carry over.

use serde::{Deserialize, Serialize};

use super::error::OrderError;
use super::flags::{FlagStore, Flags, Lifecycle};
use super::loops::{LoopRecord, DEFAULT_LOOP_CAPACITY};
use super::policy::Mode;
use super::presort::{self, FileGroups, Score, SortKey};
use crate::domain::{PackageGraph, PackageId};

pub const DEFAULT_MAX_DEPTH: usize = 4096;

/// Engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrderConfig {
    /// Largest number of packages visited at once before giving up
    pub max_depth: usize,

    /// Loop edges kept for diagnostics
    pub loop_capacity: usize,

    /// Sort candidates before visiting them
    pub presort: bool,
}

impl Default for OrderConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            loop_capacity: DEFAULT_LOOP_CAPACITY,
            presort: true,
        }
    }
}

pub struct OrderList<'g> {
    pub(super) graph: &'g PackageGraph,
    pub(super) config: OrderConfig,
    pub(super) flags: FlagStore,
    pub(super) list: Vec<PackageId>,
    pub(super) capacity: usize,
    pub(super) loops: LoopRecord,
    pub(super) mode: Mode,
    /// Candidates of the running pass
    pub(super) eligible: Vec<bool>,
    file_groups: Option<FileGroups>,
    candidates: Option<Vec<PackageId>>,
}

impl<'g> OrderList<'g> {
    pub fn new(graph: &'g PackageGraph) -> Self {
        Self::with_config(graph, OrderConfig::default())
    }

    pub fn with_config(graph: &'g PackageGraph, config: OrderConfig) -> Self {
        let capacity = graph.len();
        Self {
            graph,
            flags: FlagStore::new(capacity),
            list: Vec::with_capacity(capacity),
            capacity,
            loops: LoopRecord::with_capacity(config.loop_capacity),
            mode: Mode::Unpack,
            eligible: vec![false; capacity],
            file_groups: None,
            candidates: None,
            config,
        }
    }

    pub fn graph(&self) -> &'g PackageGraph {
        self.graph
    }

    pub fn config(&self) -> &OrderConfig {
        &self.config
    }

    // ---------------------------------------------------------------------
    // Flags
    // ---------------------------------------------------------------------

    /// Returns true if every bit of `f` is set for the package
    pub fn is_flag(&self, pkg: PackageId, f: Flags) -> bool {
        self.flags.is(pkg, f)
    }

    pub fn flags(&self, pkg: PackageId) -> Flags {
        self.flags.get(pkg)
    }

    /// Sets non-lifecycle flags; lifecycle bits in `f` are ignored, use
    /// [`OrderList::set_lifecycle`] for those
    pub fn flag(&mut self, pkg: PackageId, f: Flags) {
        self.flags.set(pkg, f.without(Flags::STATES));
    }

    pub fn lifecycle(&self, pkg: PackageId) -> Lifecycle {
        self.flags.lifecycle(pkg)
    }

    pub fn set_lifecycle(&mut self, pkg: PackageId, stage: Lifecycle) {
        self.flags.set_lifecycle(pkg, stage);
    }

    /// Returns true if the transaction has not touched the package yet
    pub fn is_now(&self, pkg: PackageId) -> bool {
        self.flags.is_now(pkg)
    }

    /// Forces the package to configure right after it is unpacked
    pub fn mark_immediate(&mut self, pkg: PackageId) {
        self.flags.set(pkg, Flags::IMMEDIATE);
    }

    /// Packages currently marked `Immediate`
    pub fn immediate(&self) -> Vec<PackageId> {
        self.flags.with(Flags::IMMEDIATE).collect()
    }

    /// Packages flagged as members of an unresolved cycle
    pub fn looped(&self) -> Vec<PackageId> {
        self.flags.with(Flags::LOOP).collect()
    }

    /// Clears `mask` on every package
    pub fn wipe_flags(&mut self, mask: Flags) {
        self.flags.wipe(mask);
    }

    /// Resets the state that must not leak between independent modes
    pub fn reset_transient(&mut self) {
        self.flags.wipe(Flags::TRANSIENT);
        self.loops.clear();
    }

    // ---------------------------------------------------------------------
    // Inputs
    // ---------------------------------------------------------------------

    pub fn set_file_groups(&mut self, groups: FileGroups) {
        self.file_groups = Some(groups);
    }

    pub fn clear_file_groups(&mut self) {
        self.file_groups = None;
    }

    /// Returns true if file groups are in use and an installing package has
    /// no file
    pub fn is_missing(&self, pkg: PackageId) -> bool {
        match &self.file_groups {
            Some(groups) => {
                self.graph.package(pkg).action.installs() && !groups.contains_key(&pkg)
            }
            None => false,
        }
    }

    /// Replaces the snapshot-derived candidate set for all modes
    pub fn set_candidates(&mut self, candidates: &[PackageId]) -> Result<(), OrderError> {
        self.check_candidates(candidates)?;
        self.candidates = Some(candidates.to_vec());
        Ok(())
    }

    pub fn clear_candidates(&mut self) {
        self.candidates = None;
    }

    fn check_candidates(&self, candidates: &[PackageId]) -> Result<(), OrderError> {
        if candidates.len() > self.capacity {
            return Err(OrderError::CapacityExceeded {
                requested: candidates.len(),
                capacity: self.capacity,
            });
        }
        match candidates.iter().find(|id| !self.graph.contains(**id)) {
            Some(id) => Err(OrderError::UnknownPackage(*id)),
            None => Ok(()),
        }
    }

    // ---------------------------------------------------------------------
    // Output sequence
    // ---------------------------------------------------------------------

    pub fn as_slice(&self) -> &[PackageId] {
        &self.list
    }

    pub fn iter(&self) -> impl Iterator<Item = PackageId> + '_ {
        self.list.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Size of the package universe; the sequence never grows beyond it
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Loops recorded by the last pass
    pub fn loops(&self) -> &LoopRecord {
        &self.loops
    }

    pub(super) fn push(&mut self, pkg: PackageId) -> Result<(), OrderError> {
        if self.list.len() >= self.capacity {
            return Err(OrderError::CapacityExceeded {
                requested: self.list.len() + 1,
                capacity: self.capacity,
            });
        }
        self.list.push(pkg);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Modes
    // ---------------------------------------------------------------------

    /// Orders by conflicts and essential pre-dependencies only
    pub fn order_critical(&mut self) -> Result<Vec<PackageId>, OrderError> {
        self.run(Mode::Critical)
    }

    /// Full unpack ordering; `groups` replaces the file groups when given
    pub fn order_unpack(
        &mut self,
        groups: Option<FileGroups>,
    ) -> Result<Vec<PackageId>, OrderError> {
        if let Some(groups) = groups {
            self.set_file_groups(groups);
        }
        self.run(Mode::Unpack)
    }

    /// Orders the packages to configure
    pub fn order_configure(&mut self) -> Result<Vec<PackageId>, OrderError> {
        self.run(Mode::Configure)
    }

    /// Runs one pass in the given mode
    pub fn order(&mut self, mode: Mode) -> Result<Vec<PackageId>, OrderError> {
        self.run(mode)
    }

    /// Tie-break keys of a package
    pub fn score(&self, pkg: PackageId) -> Score {
        Score::of(self.graph.package(pkg), self.flags.is(pkg, Flags::IMMEDIATE))
    }

    /// Candidates of `mode` in the order a pass would start visiting them
    pub fn presorted(&self, mode: Mode) -> Result<Vec<SortKey<'_>>, OrderError> {
        let candidates = self.candidates_for(mode);
        self.check_candidates(&candidates)?;

        let groups = match mode {
            Mode::Unpack => self.file_groups.as_ref(),
            _ => None,
        };
        let mut keys: Vec<_> = candidates
            .iter()
            .map(|&id| {
                SortKey::new(
                    self.graph.package(id),
                    self.flags.is(id, Flags::IMMEDIATE),
                    groups,
                )
            })
            .collect();

        if self.config.presort {
            presort::sort(&mut keys);
        }
        Ok(keys)
    }

    fn candidates_for(&self, mode: Mode) -> Vec<PackageId> {
        match &self.candidates {
            Some(candidates) => candidates.clone(),
            None => mode.default_candidates(self.graph),
        }
    }

    fn begin_pass(&mut self, mode: Mode) {
        self.mode = mode;
        self.flags.wipe(Flags::PASS);
        self.list.clear();
        self.loops.clear();
        self.eligible.iter_mut().for_each(|e| *e = false);
    }

    fn run(&mut self, mode: Mode) -> Result<Vec<PackageId>, OrderError> {
        self.begin_pass(mode);

        let order: Vec<PackageId> = self.presorted(mode)?.iter().map(|k| k.id).collect();
        for &pkg in &order {
            self.eligible[pkg.index()] = true;
        }

        for pkg in order {
            if self.flags.get(pkg).intersects(Flags::IN_LIST | Flags::LOOP) {
                continue;
            }
            self.visit(pkg)?;
        }

        if !self.loops.is_empty() {
            return Err(OrderError::CycleUnresolved {
                loops: self.loops.edges().to_vec(),
                count: self.loops.count(),
                truncated: self.loops.truncated(),
            });
        }

        Ok(self.list.clone())
    }
}
