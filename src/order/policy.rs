//! Ordering modes and the predicates deciding which edges gate a package
//!
//! | Mode | Forward edges | Edges from removals | Edges into removals |
//! |------|---------------|---------------------|---------------------|
//! | Critical | Conflicts/Breaks, essential PreDepends | Conflicts/Breaks | none |
//! | Unpack | Conflicts/Breaks, both PreDepends variants, Depends (soft) | Conflicts/Breaks | reverse Depends/PreDepends |
//! | Configure | PreDepends (configured), Depends | none | none |

use serde::Serialize;

use super::flags::{FlagStore, Lifecycle};
use crate::domain::{DepKind, Needs, PackageGraph, PackageId, Relation};

/// Ordering mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Critical,
    Unpack,
    Configure,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Critical => "critical",
            Mode::Unpack => "unpack",
            Mode::Configure => "configure",
        }
    }

    /// Returns the dispatch table for this mode
    pub fn policies(self) -> &'static PolicySet {
        match self {
            Mode::Critical => &CRITICAL,
            Mode::Unpack => &UNPACK,
            Mode::Configure => &CONFIGURE,
        }
    }

    /// Packages this mode orders when the caller supplies none
    pub fn default_candidates(self, graph: &PackageGraph) -> Vec<PackageId> {
        match self {
            Mode::Critical | Mode::Unpack => graph.selected(),
            Mode::Configure => graph
                .packages()
                .filter(|p| p.action.installs())
                .map(|p| p.id)
                .collect(),
        }
    }
}

/// Policies consulted for one mode
#[derive(Debug)]
pub struct PolicySet {
    /// Relations declared by the visited package
    pub forward: &'static [Policy],
    /// Relations of other packages pointing at a visited non-removal
    pub reverse: &'static [Policy],
    /// Relations of other packages pointing at a visited removal
    pub removal: &'static [Policy],
}

static CRITICAL: PolicySet = PolicySet {
    forward: &[Policy::Critical],
    reverse: &[Policy::ConflictedBy],
    removal: &[],
};

static UNPACK: PolicySet = PolicySet {
    forward: &[
        Policy::Critical,
        Policy::PreDependsConfigured,
        Policy::PreDependsUnpacked,
        Policy::Depends,
    ],
    reverse: &[Policy::ConflictedBy],
    removal: &[Policy::Remove],
};

static CONFIGURE: PolicySet = PolicySet {
    forward: &[Policy::PreDependsConfigured, Policy::Configure],
    reverse: &[],
    removal: &[],
};

/// Whether a gating edge must hold or is only preferred
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Strength {
    Soft,
    Hard,
}

/// Read-only state the predicates look at
#[derive(Clone, Copy)]
pub struct Context<'a> {
    pub graph: &'a PackageGraph,
    pub flags: &'a FlagStore,
}

impl Context<'_> {
    fn lifecycle(&self, pkg: PackageId) -> Lifecycle {
        self.flags.lifecycle(pkg)
    }

    fn is_removal(&self, pkg: PackageId) -> bool {
        self.graph.package(pkg).action.is_remove()
    }

    fn needs_met(&self, target: PackageId, needs: Needs) -> bool {
        match needs {
            Needs::Unpacked => !self.flags.is_now(target),
            Needs::Configured => self.lifecycle(target) == Lifecycle::Configured,
        }
    }
}

/// Edge predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Policy {
    /// Conflicts/Breaks against a removal, PreDepends touching an essential package
    Critical,
    /// Conflicts/Breaks a pending removal declares against the visited package
    ConflictedBy,
    /// PreDepends whose target only has to be unpacked
    PreDependsUnpacked,
    /// PreDepends whose target has to be configured
    PreDependsConfigured,
    /// Plain Depends during unpack, kept only when it costs no cycle
    Depends,
    /// Plain Depends whose target is not configured yet
    Configure,
    /// A dependent of a removal that has to be handled first
    Remove,
}

impl Policy {
    pub fn strength(self) -> Strength {
        match self {
            Policy::Depends => Strength::Soft,
            _ => Strength::Hard,
        }
    }

    /// Returns true if `relation.target` has to come before `relation.owner`
    /// (for `ConflictedBy` and `Remove`: if `relation.owner` has to come
    /// before `relation.target`)
    pub fn gates(self, relation: &Relation<'_>, ctx: &Context<'_>) -> bool {
        let edge = relation.edge;
        let target = relation.target;

        match self {
            Policy::Critical => match edge.kind {
                DepKind::Conflicts | DepKind::Breaks => {
                    ctx.is_removal(target) && ctx.lifecycle(target) != Lifecycle::Removed
                }
                DepKind::PreDepends => {
                    let essential = ctx.graph.package(relation.owner).essential
                        || ctx.graph.package(target).essential;
                    essential && !ctx.is_removal(target) && !ctx.needs_met(target, edge.needs)
                }
                DepKind::Depends => false,
            },
            Policy::ConflictedBy => {
                let owner = relation.owner;
                matches!(edge.kind, DepKind::Conflicts | DepKind::Breaks)
                    && ctx.is_removal(owner)
                    && ctx.lifecycle(owner) != Lifecycle::Removed
            }
            Policy::PreDependsUnpacked => {
                edge.kind == DepKind::PreDepends
                    && edge.needs == Needs::Unpacked
                    && !ctx.is_removal(target)
                    && ctx.flags.is_now(target)
            }
            Policy::PreDependsConfigured => {
                edge.kind == DepKind::PreDepends
                    && edge.needs == Needs::Configured
                    && !ctx.is_removal(target)
                    && ctx.lifecycle(target) != Lifecycle::Configured
            }
            Policy::Depends => {
                edge.kind == DepKind::Depends
                    && !ctx.is_removal(target)
                    && ctx.flags.is_now(target)
            }
            Policy::Configure => {
                edge.kind == DepKind::Depends
                    && !ctx.is_removal(target)
                    && ctx.lifecycle(target) != Lifecycle::Configured
            }
            Policy::Remove => {
                let dependent = relation.owner;
                let name = edge
                    .via
                    .as_deref()
                    .unwrap_or_else(|| ctx.graph.name(target));

                matches!(edge.kind, DepKind::Depends | DepKind::PreDepends)
                    && ctx.graph.package(dependent).action.is_selected()
                    && ctx.lifecycle(dependent) != Lifecycle::Removed
                    && !ctx.graph.satisfied_without(name, target)
            }
        }
    }
}

/// Returns the strongest gate any of `policies` puts on the relation
pub fn strongest(policies: &[Policy], relation: &Relation<'_>, ctx: &Context<'_>) -> Option<Strength> {
    policies
        .iter()
        .filter(|p| p.gates(relation, ctx))
        .map(|p| p.strength())
        .max()
}
