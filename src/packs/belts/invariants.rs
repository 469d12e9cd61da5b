//! Invariants for the belt routing pack
//!
//! Checks a produced solution against its problem. Parallel segments share a
//! `(from, to)` pair in the output, so the bound checks operate on per-pair
//! aggregates; for simple graphs that is exact.

use super::types::{BeltsProblem, BeltsSolution};
use crate::packs::InvariantResult;
use std::collections::{BTreeSet, HashMap};

const CHECK_TOLERANCE: f64 = 1e-6;

/// Check all invariants that apply to the given solution
#[must_use]
pub fn check_all(problem: &BeltsProblem, solution: &BeltsSolution) -> Vec<InvariantResult> {
    match solution {
        BeltsSolution::Ok { .. } => vec![
            check_flow_conservation(problem, solution),
            check_edge_bounds(problem, solution),
            check_node_caps(problem, solution),
            check_total_flow(problem, solution),
        ],
        BeltsSolution::Infeasible { .. } => vec![check_diagnosis(problem, solution)],
        BeltsSolution::Error { .. } => Vec::new(),
    }
}

fn flow_totals(solution: &BeltsSolution) -> (HashMap<&str, f64>, HashMap<&str, f64>) {
    let mut inflow: HashMap<&str, f64> = HashMap::new();
    let mut outflow: HashMap<&str, f64> = HashMap::new();
    if let BeltsSolution::Ok { flows, .. } = solution {
        for arc in flows {
            *inflow.entry(arc.to.as_str()).or_insert(0.0) += arc.flow;
            *outflow.entry(arc.from.as_str()).or_insert(0.0) += arc.flow;
        }
    }
    (inflow, outflow)
}

/// Inflow equals outflow at every non-source, non-sink node
#[must_use]
pub fn check_flow_conservation(problem: &BeltsProblem, solution: &BeltsSolution) -> InvariantResult {
    let invariant = "flow_conservation";
    let sources: BTreeSet<&str> = problem.sources.iter().map(|s| s.name.as_str()).collect();
    let (inflow, outflow) = flow_totals(solution);

    for name in &problem.nodes {
        let name = name.as_str();
        if sources.contains(name) || name == problem.sink.name.as_str() {
            continue;
        }
        let enter = inflow.get(name).copied().unwrap_or(0.0);
        let leave = outflow.get(name).copied().unwrap_or(0.0);
        if (enter - leave).abs() > CHECK_TOLERANCE {
            return InvariantResult::fail(
                invariant,
                format!("node {name}: inflow {enter} != outflow {leave}"),
            );
        }
    }
    InvariantResult::pass(invariant)
}

/// Per endpoint pair, total flow lies within the summed `[lo, hi]` bounds
#[must_use]
pub fn check_edge_bounds(problem: &BeltsProblem, solution: &BeltsSolution) -> InvariantResult {
    let invariant = "edge_bounds";
    let mut lo_sum: HashMap<(&str, &str), f64> = HashMap::new();
    let mut hi_sum: HashMap<(&str, &str), f64> = HashMap::new();
    for edge in &problem.edges {
        let key = (edge.from.as_str(), edge.to.as_str());
        *lo_sum.entry(key).or_insert(0.0) += edge.lo;
        *hi_sum.entry(key).or_insert(0.0) += edge.hi;
    }

    let mut routed: HashMap<(&str, &str), f64> = HashMap::new();
    if let BeltsSolution::Ok { flows, .. } = solution {
        for arc in flows {
            if arc.flow < -CHECK_TOLERANCE {
                return InvariantResult::fail(
                    invariant,
                    format!("negative flow on {}->{}", arc.from, arc.to),
                );
            }
            *routed.entry((arc.from.as_str(), arc.to.as_str())).or_insert(0.0) += arc.flow;
        }
    }

    for (key, &hi) in &hi_sum {
        let lo = lo_sum.get(key).copied().unwrap_or(0.0);
        let flow = routed.get(key).copied().unwrap_or(0.0);
        if flow > hi + CHECK_TOLERANCE || flow < lo - CHECK_TOLERANCE {
            return InvariantResult::fail(
                invariant,
                format!("{}->{}: flow {flow} outside [{lo}, {hi}]", key.0, key.1),
            );
        }
    }
    InvariantResult::pass(invariant)
}

/// Inflow at capped non-source, non-sink nodes stays within the cap
#[must_use]
pub fn check_node_caps(problem: &BeltsProblem, solution: &BeltsSolution) -> InvariantResult {
    let invariant = "node_caps";
    let sources: BTreeSet<&str> = problem.sources.iter().map(|s| s.name.as_str()).collect();
    let (inflow, _) = flow_totals(solution);

    for cap in &problem.node_caps {
        let name = cap.name.as_str();
        if sources.contains(name) || name == problem.sink.name.as_str() {
            continue;
        }
        let enter = inflow.get(name).copied().unwrap_or(0.0);
        if enter > cap.cap + CHECK_TOLERANCE {
            return InvariantResult::fail(
                invariant,
                format!("node {name}: inflow {enter} exceeds cap {}", cap.cap),
            );
        }
    }
    InvariantResult::pass(invariant)
}

/// `max_flow_per_min` equals total supply, and the sink absorbs it all
#[must_use]
pub fn check_total_flow(problem: &BeltsProblem, solution: &BeltsSolution) -> InvariantResult {
    let invariant = "total_flow";
    let BeltsSolution::Ok { max_flow_per_min, .. } = solution else {
        return InvariantResult::pass(invariant);
    };
    let expected = problem.total_supply();
    if (max_flow_per_min - expected).abs() > CHECK_TOLERANCE {
        return InvariantResult::fail(
            invariant,
            format!("max_flow_per_min {max_flow_per_min} != total supply {expected}"),
        );
    }
    let (inflow, outflow) = flow_totals(solution);
    let sink = problem.sink.name.as_str();
    let absorbed = inflow.get(sink).copied().unwrap_or(0.0)
        - outflow.get(sink).copied().unwrap_or(0.0);
    if (absorbed - expected).abs() > CHECK_TOLERANCE {
        return InvariantResult::fail(
            invariant,
            format!("sink absorbs {absorbed}, expected {expected}"),
        );
    }
    InvariantResult::pass(invariant)
}

/// An infeasibility diagnosis names a positive deficit over known nodes
#[must_use]
pub fn check_diagnosis(problem: &BeltsProblem, solution: &BeltsSolution) -> InvariantResult {
    let invariant = "diagnosis";
    let BeltsSolution::Infeasible { cut_reachable, deficit } = solution else {
        return InvariantResult::pass(invariant);
    };
    if deficit.demand_balance <= 0.0 {
        return InvariantResult::fail(
            invariant,
            format!("non-positive deficit {}", deficit.demand_balance),
        );
    }
    let known: BTreeSet<&str> = problem.nodes.iter().map(String::as_str).collect();
    for name in cut_reachable {
        if !known.contains(name.as_str()) {
            return InvariantResult::fail(invariant, format!("unknown node {name} in cut"));
        }
    }
    InvariantResult::pass(invariant)
}
