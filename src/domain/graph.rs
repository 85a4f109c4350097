//! Package graph snapshot
//!
//! Resolves every declared dependency into concrete package-to-package edges
//! and keeps them in a petgraph `DiGraph`, so reverse dependencies are the
//! incoming edges of a node. The snapshot is immutable once built.

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;
use thiserror::Error;

use super::package::{DepKind, Needs, Package, PackageId, Slot};

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Package listed twice: {0}")]
    DuplicatePackage(String),

    #[error("Package {package} is marked '{action}' but has no {slot:?} version")]
    MissingVersion {
        package: String,
        action: &'static str,
        slot: Slot,
    },

    #[error("Too many packages: {0}")]
    TooManyPackages(usize),
}

/// A resolved relation stored on a graph edge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepEdge {
    pub kind: DepKind,
    pub needs: Needs,
    /// Version of the owner that declares the relation
    pub slot: Slot,
    /// Position in that version's dependency list
    pub index: usize,
    /// Capability name when the target was reached through Provides
    pub via: Option<String>,
}

/// A borrowed view of one edge with its endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Relation<'g> {
    pub owner: PackageId,
    pub target: PackageId,
    pub edge: &'g DepEdge,
}

impl Relation<'_> {
    pub fn kind(&self) -> DepKind {
        self.edge.kind
    }

    /// Returns true if the target was reached through a virtual capability
    pub fn is_provided(&self) -> bool {
        self.edge.via.is_some()
    }
}

/// Read-only snapshot of the packages taking part in a transaction
#[derive(Debug, Default)]
pub struct PackageGraph {
    packages: Vec<Package>,

    /// Edge direction: owner -> target
    graph: DiGraph<PackageId, DepEdge>,

    /// Map from package name to id
    node_map: HashMap<String, PackageId>,

    /// Map from capability name to the packages providing it
    providers: HashMap<String, Vec<PackageId>>,
}

impl PackageGraph {
    /// Builds a snapshot, assigning ids in input order
    pub fn from_packages(packages: impl IntoIterator<Item = Package>) -> Result<Self, GraphError> {
        let mut graph = Self::default();

        // First pass: nodes
        for mut pkg in packages {
            if graph.packages.len() >= u32::MAX as usize {
                return Err(GraphError::TooManyPackages(graph.packages.len() + 1));
            }
            if graph.node_map.contains_key(&pkg.name) {
                return Err(GraphError::DuplicatePackage(pkg.name));
            }
            validate_versions(&pkg)?;

            let id = PackageId(graph.packages.len() as u32);
            pkg.id = id;
            let idx = graph.graph.add_node(id);
            debug_assert_eq!(idx.index(), id.index());
            graph.node_map.insert(pkg.name.clone(), id);
            graph.packages.push(pkg);
        }

        // Second pass: capabilities
        for pkg in &graph.packages {
            for slot in [Slot::Current, Slot::Candidate] {
                let Some(version) = pkg.version(slot) else {
                    continue;
                };
                for capability in &version.provides {
                    let list = graph.providers.entry(capability.clone()).or_default();
                    if !list.contains(&pkg.id) {
                        list.push(pkg.id);
                    }
                }
            }
        }

        // Third pass: edges
        let mut edges = Vec::new();
        for pkg in &graph.packages {
            for slot in [Slot::Current, Slot::Candidate] {
                let Some(version) = pkg.version(slot) else {
                    continue;
                };
                for (index, dep) in version.depends.iter().enumerate() {
                    let direct = graph.node_map.get(&dep.target).copied();
                    if let Some(target) = direct.filter(|t| *t != pkg.id) {
                        edges.push((pkg.id, target, DepEdge {
                            kind: dep.kind,
                            needs: dep.needs,
                            slot,
                            index,
                            via: None,
                        }));
                    }
                    for &provider in graph.providers.get(&dep.target).into_iter().flatten() {
                        if provider == pkg.id || Some(provider) == direct {
                            continue;
                        }
                        edges.push((pkg.id, provider, DepEdge {
                            kind: dep.kind,
                            needs: dep.needs,
                            slot,
                            index,
                            via: Some(dep.target.clone()),
                        }));
                    }
                }
            }
        }
        for (owner, target, edge) in edges {
            graph.graph.add_edge(node(owner), node(target), edge);
        }

        Ok(graph)
    }

    /// Returns the number of packages
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Returns true if the snapshot is empty
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Returns true if the id belongs to this snapshot
    pub fn contains(&self, id: PackageId) -> bool {
        id.index() < self.packages.len()
    }

    /// Returns the package with the given id
    ///
    /// Panics if the id does not belong to this snapshot.
    pub fn package(&self, id: PackageId) -> &Package {
        &self.packages[id.index()]
    }

    pub fn get(&self, id: PackageId) -> Option<&Package> {
        self.packages.get(id.index())
    }

    /// Looks a package up by name
    pub fn find(&self, name: &str) -> Option<PackageId> {
        self.node_map.get(name).copied()
    }

    /// Returns the name of a package, for diagnostics
    pub fn name(&self, id: PackageId) -> &str {
        self.get(id).map(|p| p.name.as_str()).unwrap_or("<unknown>")
    }

    /// Iterates over all packages in id order
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    /// Returns the packages the transaction acts on, in id order
    pub fn selected(&self) -> Vec<PackageId> {
        self.packages
            .iter()
            .filter(|p| p.action.is_selected())
            .map(|p| p.id)
            .collect()
    }

    /// Returns the packages providing a capability
    pub fn providers(&self, capability: &str) -> &[PackageId] {
        self.providers
            .get(capability)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns true if something other than `except` still satisfies `name`
    /// once the transaction's removals are done
    pub fn satisfied_without(&self, name: &str, except: PackageId) -> bool {
        let survives = |id: PackageId| id != except && !self.package(id).action.is_remove();

        self.find(name).is_some_and(|id| survives(id) && self.package(id).acting_version().is_some())
            || self.providers(name).iter().any(|&id| survives(id))
    }

    /// Returns the relations declared by one version of a package, in
    /// declaration order (direct target before providers)
    pub fn forward(&self, id: PackageId, slot: Slot) -> Vec<Relation<'_>> {
        let mut relations: Vec<_> = self
            .graph
            .edges_directed(node(id), Direction::Outgoing)
            .filter(|e| e.weight().slot == slot)
            .map(|e| Relation {
                owner: id,
                target: self.graph[e.target()],
                edge: e.weight(),
            })
            .collect();

        relations.sort_by_key(|r| (r.edge.index, r.is_provided(), r.target));
        relations
    }

    /// Returns the relations of other packages' `slot` versions that point
    /// at this package, ordered by owner
    pub fn reverse(&self, id: PackageId, slot: Slot) -> Vec<Relation<'_>> {
        let mut relations: Vec<_> = self
            .graph
            .edges_directed(node(id), Direction::Incoming)
            .filter(|e| e.weight().slot == slot)
            .map(|e| Relation {
                owner: self.graph[e.source()],
                target: id,
                edge: e.weight(),
            })
            .collect();

        relations.sort_by_key(|r| (r.owner, r.edge.index, r.is_provided()));
        relations
    }

    /// Finds groups of installing packages that pre-depend on each other in a
    /// cycle. Each group is sorted by id; groups are sorted by their first id.
    pub fn hard_cycles(&self) -> Vec<Vec<PackageId>> {
        let installs = |id: PackageId| self.package(id).action.installs();

        let hard = self.graph.filter_map(
            |_, &id| installs(id).then_some(id),
            |_, edge| {
                (edge.kind == DepKind::PreDepends && edge.slot == Slot::Candidate).then_some(())
            },
        );

        let mut cycles: Vec<Vec<PackageId>> = tarjan_scc(&hard)
            .into_iter()
            .filter(|component| component.len() > 1)
            .map(|component| {
                let mut ids: Vec<_> = component.into_iter().map(|idx| hard[idx]).collect();
                ids.sort();
                ids
            })
            .collect();

        cycles.sort();
        cycles
    }
}

fn node(id: PackageId) -> NodeIndex {
    NodeIndex::new(id.index())
}

fn validate_versions(pkg: &Package) -> Result<(), GraphError> {
    use super::package::Action;

    let missing = match pkg.action {
        Action::Install | Action::Upgrade | Action::Downgrade if pkg.candidate.is_none() => {
            Some(Slot::Candidate)
        }
        Action::Reinstall if pkg.candidate.is_none() && pkg.current.is_none() => {
            Some(Slot::Candidate)
        }
        Action::Remove if pkg.current.is_none() => Some(Slot::Current),
        _ => None,
    };

    match missing {
        Some(slot) => Err(GraphError::MissingVersion {
            package: pkg.name.clone(),
            action: pkg.action.as_str(),
            slot,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Dependency, VersionInfo};

    fn install(name: &str, deps: Vec<Dependency>) -> Package {
        let mut version = VersionInfo::new("1.0");
        version.depends = deps;
        Package::install(name, version)
    }

    #[test]
    fn empty_graph() {
        let graph = PackageGraph::from_packages(Vec::new()).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.len(), 0);
        assert!(graph.selected().is_empty());
    }

    #[test]
    fn ids_follow_input_order() {
        let graph = PackageGraph::from_packages([
            install("a", vec![]),
            install("b", vec![]),
        ])
        .unwrap();

        assert_eq!(graph.find("a"), Some(PackageId(0)));
        assert_eq!(graph.find("b"), Some(PackageId(1)));
        assert_eq!(graph.package(PackageId(1)).name, "b");
        assert!(graph.contains(PackageId(1)));
        assert!(!graph.contains(PackageId(2)));
    }

    #[test]
    fn duplicate_rejected() {
        let result = PackageGraph::from_packages([install("a", vec![]), install("a", vec![])]);
        assert_eq!(result.unwrap_err(), GraphError::DuplicatePackage("a".into()));
    }

    #[test]
    fn missing_version_rejected() {
        let pkg = Package::new("a").with_action(crate::domain::Action::Remove);
        let result = PackageGraph::from_packages([pkg]);
        assert!(matches!(result, Err(GraphError::MissingVersion { slot: Slot::Current, .. })));
    }

    #[test]
    fn forward_keeps_declaration_order() {
        let graph = PackageGraph::from_packages([
            install("a", vec![Dependency::depends("c"), Dependency::depends("b")]),
            install("b", vec![]),
            install("c", vec![]),
        ])
        .unwrap();

        let targets: Vec<_> = graph
            .forward(PackageId(0), Slot::Candidate)
            .iter()
            .map(|r| r.target)
            .collect();
        assert_eq!(targets, vec![PackageId(2), PackageId(1)]);
        assert!(graph.forward(PackageId(0), Slot::Current).is_empty());
    }

    #[test]
    fn unknown_targets_and_self_edges_dropped() {
        let graph = PackageGraph::from_packages([install(
            "a",
            vec![Dependency::depends("nowhere"), Dependency::conflicts("a")],
        )])
        .unwrap();

        assert!(graph.forward(PackageId(0), Slot::Candidate).is_empty());
    }

    #[test]
    fn provides_expand_to_every_provider() {
        let mta = |name: &str| {
            Package::install(name, VersionInfo::new("1.0").with_provides("mail-transport-agent"))
        };
        let graph = PackageGraph::from_packages([
            install("mutt", vec![Dependency::depends("mail-transport-agent")]),
            mta("postfix"),
            mta("exim4"),
        ])
        .unwrap();

        let relations = graph.forward(PackageId(0), Slot::Candidate);
        assert_eq!(relations.len(), 2);
        assert!(relations.iter().all(|r| r.edge.via.as_deref() == Some("mail-transport-agent")));

        let reverse = graph.reverse(PackageId(2), Slot::Candidate);
        assert_eq!(reverse.len(), 1);
        assert_eq!(reverse[0].owner, PackageId(0));
    }

    #[test]
    fn satisfied_without_ignores_removals() {
        let graph = PackageGraph::from_packages([
            Package::remove("postfix", VersionInfo::new("1").with_provides("mta")),
            Package::remove("exim4", VersionInfo::new("1").with_provides("mta")),
            Package::install("sendmail", VersionInfo::new("1").with_provides("mta")),
        ])
        .unwrap();

        assert!(graph.satisfied_without("mta", PackageId(0)));
        assert!(!graph.satisfied_without("postfix", PackageId(0)));
    }

    #[test]
    fn hard_cycles_found() {
        let graph = PackageGraph::from_packages([
            install("x", vec![Dependency::pre_depends("y", Needs::Configured)]),
            install("y", vec![Dependency::pre_depends("x", Needs::Configured)]),
            install("z", vec![Dependency::depends("x")]),
        ])
        .unwrap();

        assert_eq!(graph.hard_cycles(), vec![vec![PackageId(0), PackageId(1)]]);
    }

    #[test]
    fn soft_cycles_not_reported() {
        let graph = PackageGraph::from_packages([
            install("x", vec![Dependency::depends("y")]),
            install("y", vec![Dependency::depends("x")]),
        ])
        .unwrap();

        assert!(graph.hard_cycles().is_empty());
    }
}
