//! Transaction commands (plan, check)

use std::path::Path;

use anyhow::Result;

use super::order_cmd::{cycle_failure, entries, load_graph, load_groups, print_sequence};
use super::output::Output;
use crate::domain::{PackageGraph, PackageId};
use crate::order::{OrderList, Planner};
use crate::storage::Config;

/// Plan the whole transaction
pub fn plan(output: &Output, config: &Config, snapshot: &Path, groups: Option<&Path>) -> Result<()> {
    let graph = load_graph(output, snapshot)?;
    let file_groups = match groups {
        Some(path) => Some(load_groups(output, path, &graph)?),
        None => None,
    };

    let mut list = OrderList::with_config(&graph, config.project.order.clone());
    let planner = Planner::new(&mut list, config.project.planner.clone());
    let plan = match planner.plan(file_groups) {
        Ok(plan) => plan,
        Err(err) => return Err(cycle_failure(output, &graph, err)),
    };

    output.verbose_ctx(
        "plan",
        &format!(
            "{} unpack attempt(s), {} loop break(s)",
            plan.attempts,
            plan.loop_breaks.len()
        ),
    );

    if output.is_json() {
        output.data(&serde_json::json!({
            "critical": entries(&graph, &plan.critical),
            "immediate": names(&graph, &plan.immediate),
            "unpack": entries(&graph, &plan.unpack),
            "configure": entries(&graph, &plan.configure),
            "loop_breaks": names(&graph, &plan.loop_breaks),
            "attempts": plan.attempts,
        }));
        return Ok(());
    }

    println!("Critical ({}):", plan.critical.len());
    print_sequence(&graph, &plan.critical);
    println!();
    println!("Unpack ({}):", plan.unpack.len());
    print_sequence(&graph, &plan.unpack);
    println!();
    println!("Configure ({}):", plan.configure.len());
    print_sequence(&graph, &plan.configure);

    if !plan.immediate.is_empty() {
        println!();
        println!("Configured immediately: {}", names(&graph, &plan.immediate).join(", "));
    }
    if !plan.loop_breaks.is_empty() {
        println!(
            "Loops broken after {} attempts: {}",
            plan.attempts,
            names(&graph, &plan.loop_breaks).join(", ")
        );
    }

    Ok(())
}

/// Report cycles among installing packages that pre-depend on each other
pub fn check(output: &Output, snapshot: &Path) -> Result<()> {
    let graph = load_graph(output, snapshot)?;
    let cycles = graph.hard_cycles();
    output.verbose_ctx("check", &format!("Found {} cycle(s)", cycles.len()));

    if output.is_json() {
        let items: Vec<_> = cycles.iter().map(|cycle| names(&graph, cycle)).collect();
        output.data(&serde_json::json!({
            "cycles": items,
        }));
    } else if cycles.is_empty() {
        output.success("No pre-dependency cycles.");
    } else {
        println!("Pre-dependency cycles ({}):", cycles.len());
        for cycle in &cycles {
            println!("  {}", names(&graph, cycle).join(" <-> "));
        }
    }

    if !cycles.is_empty() {
        anyhow::bail!("{} pre-dependency cycle(s) found", cycles.len());
    }
    Ok(())
}

fn names(graph: &PackageGraph, ids: &[PackageId]) -> Vec<String> {
    ids.iter().map(|&id| graph.name(id).to_string()).collect()
}
