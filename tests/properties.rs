//! Property tests for the ordering engine over generated acyclic snapshots

use std::collections::HashSet;

use pkgorder::domain::{
    DepKind, Dependency, Needs, Package, PackageGraph, PackageId, Slot, VersionInfo,
};
use pkgorder::order::OrderList;
use proptest::prelude::*;

/// One generated package: essential, removal, and (target, kind) picks
type Spec = (bool, bool, Vec<(usize, u8)>);

/// Package `i` only relates to packages with a lower index. Installs depend
/// on earlier installs and may conflict with or break earlier removals;
/// removals may conflict with or break earlier installs and depend on nothing.
fn acyclic_graph(specs: &[Spec]) -> PackageGraph {
    let mut installs: Vec<String> = Vec::new();
    let mut removals: Vec<String> = Vec::new();
    let mut packages = Vec::new();

    for (i, (essential, removal, picks)) in specs.iter().enumerate() {
        let name = format!("p{}", i);
        let mut version = VersionInfo::new("1.0");

        for &(target, kind) in picks {
            let pool = match (*removal, kind) {
                (false, 0..=2) => &installs,
                (false, _) => &removals,
                (true, 3..) => &installs,
                (true, _) => continue,
            };
            if pool.is_empty() {
                continue;
            }
            let target = pool[target % pool.len()].clone();
            version.depends.push(match kind {
                0 => Dependency::pre_depends(target, Needs::Configured),
                1 => Dependency::pre_depends(target, Needs::Unpacked),
                2 => Dependency::depends(target),
                3 => Dependency::conflicts(target),
                _ => Dependency::breaks(target),
            });
        }

        if *removal {
            packages.push(Package::remove(name.clone(), version));
            removals.push(name);
        } else {
            let pkg = Package::install(name.clone(), version);
            packages.push(if *essential { pkg.essential() } else { pkg });
            installs.push(name);
        }
    }
    PackageGraph::from_packages(packages).unwrap()
}

fn snapshot_specs() -> impl Strategy<Value = Vec<Spec>> {
    prop::collection::vec(
        (
            any::<bool>(),
            prop::bool::weighted(0.3),
            prop::collection::vec((any::<usize>(), 0u8..5), 0..4),
        ),
        1..16,
    )
}

/// Relations declared by the version a package acts on
fn relations(graph: &PackageGraph, pkg: &Package) -> Vec<(PackageId, PackageId, DepKind, Needs)> {
    let slot = if pkg.action.is_remove() {
        Slot::Current
    } else {
        Slot::Candidate
    };
    graph
        .forward(pkg.id, slot)
        .into_iter()
        .map(|r| (r.owner, r.target, r.kind(), r.edge.needs))
        .collect()
}

fn is_conflict(kind: DepKind) -> bool {
    matches!(kind, DepKind::Conflicts | DepKind::Breaks)
}

proptest! {
    #[test]
    fn unpack_places_pre_depends_first(specs in snapshot_specs()) {
        let graph = acyclic_graph(&specs);
        let mut list = OrderList::new(&graph);
        let order = list.order_unpack(None).unwrap();

        prop_assert_eq!(order.len(), graph.len());
        let position = |id: PackageId| order.iter().position(|&p| p == id).unwrap();

        for pkg in graph.packages() {
            for (owner, target, kind, _) in relations(&graph, pkg) {
                if kind == DepKind::PreDepends {
                    prop_assert!(
                        position(target) < position(owner),
                        "{} placed before its pre-dependency {}",
                        pkg.name,
                        graph.name(target)
                    );
                }
            }
        }
    }

    #[test]
    fn no_package_is_placed_twice(specs in snapshot_specs()) {
        let graph = acyclic_graph(&specs);
        let mut list = OrderList::new(&graph);

        for order in [
            list.order_critical().unwrap(),
            list.order_unpack(None).unwrap(),
            list.order_configure().unwrap(),
        ] {
            let unique: HashSet<_> = order.iter().collect();
            prop_assert_eq!(unique.len(), order.len());
        }
    }

    #[test]
    fn rerunning_a_mode_is_deterministic(specs in snapshot_specs()) {
        let graph = acyclic_graph(&specs);
        let mut list = OrderList::new(&graph);

        let first = list.order_unpack(None).unwrap();
        list.reset_transient();
        let second = list.order_unpack(None).unwrap();

        prop_assert_eq!(first, second);
    }

    #[test]
    fn configure_follows_every_dependency(specs in snapshot_specs()) {
        let graph = acyclic_graph(&specs);
        let mut list = OrderList::new(&graph);
        let order = list.order_configure().unwrap();
        let position = |id: PackageId| order.iter().position(|&p| p == id).unwrap();

        for pkg in graph.packages().filter(|p| p.action.installs()) {
            for (owner, target, kind, needs) in relations(&graph, pkg) {
                let gated = kind == DepKind::Depends
                    || (kind == DepKind::PreDepends && needs == Needs::Configured);
                if gated {
                    prop_assert!(position(target) < position(owner));
                }
            }
        }
    }

    #[test]
    fn conflicting_removals_come_first(specs in snapshot_specs()) {
        let graph = acyclic_graph(&specs);
        let mut list = OrderList::new(&graph);

        for order in [list.order_critical().unwrap(), list.order_unpack(None).unwrap()] {
            prop_assert_eq!(order.len(), graph.selected().len());
            let position = |id: PackageId| order.iter().position(|&p| p == id).unwrap();

            for pkg in graph.packages() {
                for (owner, target, kind, _) in relations(&graph, pkg) {
                    if !is_conflict(kind) {
                        continue;
                    }
                    let (removal, conflicted) = if graph.package(owner).action.is_remove() {
                        (owner, target)
                    } else {
                        (target, owner)
                    };
                    prop_assert!(
                        position(removal) < position(conflicted),
                        "{} placed before conflicting removal {}",
                        graph.name(conflicted),
                        graph.name(removal)
                    );
                }
            }
        }
    }
}
