//! Single-mode commands (order, score)

use std::path::Path;

use anyhow::{Context, Result};

use super::output::Output;
use crate::domain::{PackageGraph, PackageId};
use crate::order::{Mode, OrderError, OrderList, Placement};
use crate::storage::{self, Config};

/// Order the snapshot's packages in one mode
pub fn order(
    output: &Output,
    config: &Config,
    snapshot: &Path,
    mode: Mode,
    groups: Option<&Path>,
    immediate: &[String],
) -> Result<()> {
    let graph = load_graph(output, snapshot)?;
    let mut list = OrderList::with_config(&graph, config.project.order.clone());

    if let Some(path) = groups {
        list.set_file_groups(load_groups(output, path, &graph)?);
    }
    for name in immediate {
        let id = storage::resolve(&graph, name)?;
        output.verbose_ctx("order", &format!("Marking {} immediate", name));
        list.mark_immediate(id);
    }

    output.verbose_ctx("order", &format!("Running {} pass", mode.as_str()));
    let sequence = match list.order(mode) {
        Ok(sequence) => sequence,
        Err(err) => return Err(cycle_failure(output, &graph, err)),
    };
    output.verbose_ctx("order", &format!("Placed {} packages", sequence.len()));

    if output.is_json() {
        output.data(&serde_json::json!({
            "mode": mode.as_str(),
            "order": entries(&graph, &sequence),
        }));
    } else if sequence.is_empty() {
        println!("Nothing to {}.", mode.as_str());
    } else {
        println!("{} order ({} packages):", mode.as_str(), sequence.len());
        print_sequence(&graph, &sequence);
    }

    Ok(())
}

/// Show candidates in the order a pass would start visiting them
pub fn score(
    output: &Output,
    config: &Config,
    snapshot: &Path,
    mode: Mode,
    groups: Option<&Path>,
) -> Result<()> {
    let graph = load_graph(output, snapshot)?;
    let mut list = OrderList::with_config(&graph, config.project.order.clone());

    if let Some(path) = groups {
        list.set_file_groups(load_groups(output, path, &graph)?);
    }

    let keys = list.presorted(mode)?;
    output.verbose_ctx("score", &format!("{} {} candidates", keys.len(), mode.as_str()));

    if output.is_json() {
        let items: Vec<_> = keys
            .iter()
            .map(|key| {
                serde_json::json!({
                    "id": key.id,
                    "name": graph.name(key.id),
                    "placement": key.placement,
                    "score": key.score,
                    "weight": key.score.weight(),
                })
            })
            .collect();
        output.data(&items);
    } else if keys.is_empty() {
        println!("No {} candidates.", mode.as_str());
    } else {
        println!("{:<4} {:<24} {:<12} {:>6}  KEYS", "#", "NAME", "GROUP", "WEIGHT");
        println!("{}", "-".repeat(70));
        for (pos, key) in keys.iter().enumerate() {
            let group = match key.placement {
                None => "-",
                Some(Placement::NoFile) => "(none)",
                Some(Placement::File(group)) => group,
                Some(Placement::Missing) => "(missing)",
            };
            let score = key.score;
            let mut flags = Vec::new();
            if score.removal {
                flags.push("removal");
            }
            if score.essential {
                flags.push("essential");
            }
            if score.immediate {
                flags.push("immediate");
            }
            if score.pre_depends {
                flags.push("pre-depends");
            }
            println!(
                "{:<4} {:<24} {:<12} {:>6}  {}",
                pos + 1,
                graph.name(key.id),
                group,
                score.weight(),
                flags.join(",")
            );
        }
    }

    Ok(())
}

pub(super) fn load_graph(output: &Output, path: &Path) -> Result<PackageGraph> {
    let graph = storage::load_snapshot(path)
        .with_context(|| format!("Failed to load snapshot: {}", path.display()))?;
    output.verbose_ctx(
        "snapshot",
        &format!(
            "Loaded {} packages ({} selected) from {}",
            graph.len(),
            graph.selected().len(),
            path.display()
        ),
    );
    Ok(graph)
}

pub(super) fn load_groups(
    output: &Output,
    path: &Path,
    graph: &PackageGraph,
) -> Result<crate::order::FileGroups> {
    let groups = storage::load_groups(path, graph)
        .with_context(|| format!("Failed to load file groups: {}", path.display()))?;
    output.verbose_ctx("snapshot", &format!("Loaded {} file group entries", groups.len()));
    Ok(groups)
}

/// One row per placed package
pub(super) fn entries(graph: &PackageGraph, sequence: &[PackageId]) -> Vec<serde_json::Value> {
    sequence
        .iter()
        .enumerate()
        .map(|(pos, &id)| {
            let pkg = graph.package(id);
            serde_json::json!({
                "position": pos + 1,
                "id": id,
                "name": pkg.name,
                "action": pkg.action.as_str(),
            })
        })
        .collect()
}

pub(super) fn print_sequence(graph: &PackageGraph, sequence: &[PackageId]) {
    for (pos, &id) in sequence.iter().enumerate() {
        let pkg = graph.package(id);
        println!("  {:<4} {:<24} {}", pos + 1, pkg.name, pkg.action.as_str());
    }
}

/// Reports the recorded loops of a failed pass and converts the error
pub(super) fn cycle_failure(output: &Output, graph: &PackageGraph, err: OrderError) -> anyhow::Error {
    if let OrderError::CycleUnresolved {
        loops,
        count,
        truncated,
    } = &err
    {
        for edge in loops {
            output.verbose_ctx("loop", &format!("{} (closes at {})", edge, graph.name(edge.closes_at)));
        }
        if output.is_json() {
            output.data(&serde_json::json!({
                "success": false,
                "error": err.to_string(),
                "loops": loops,
                "count": count,
                "truncated": truncated,
            }));
        }
    }
    err.into()
}
