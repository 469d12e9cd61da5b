//! Solver for the belt routing pack
//!
//! Reduces flow-with-lower-bounds plus node throughput caps to a plain
//! max-flow instance:
//!
//! 1. Capped junctions are split into in/out endpoints joined by a
//!    cap-limited arc.
//! 2. Each segment enters the auxiliary network with capacity `hi - lo`;
//!    the lower bounds are re-injected through a super source/sink pair
//!    sized by each node's requirement `R(v) = B(v) + supply(v) - demand(v)`.
//! 3. Parallel segments between the same endpoints collapse into one
//!    aggregated arc and are re-apportioned after solving.
//!
//! The instance is feasible exactly when the auxiliary max flow saturates the
//! super source. On failure, the residual reachability of the solved network
//! is a minimum-cut witness from which the diagnosis is read.

use super::types::{ArcFlow, BeltEdge, BeltsProblem, BeltsSolution, Deficit, TightEdge};
use crate::graph::{max_flow, FlowNetwork};
use crate::{within, Error, Result, FLOW_TOLERANCE};
use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Solve a belt routing problem.
///
/// Validation failures and kernel errors are folded into
/// [`BeltsSolution::Error`]; this function does not panic on bad input.
#[must_use]
pub fn solve(problem: &BeltsProblem) -> BeltsSolution {
    match route(problem) {
        Ok(solution) => solution,
        Err(err) => BeltsSolution::Error {
            message: err.to_string(),
        },
    }
}

/// Which auxiliary endpoints represent each original node
struct Endpoints {
    /// Endpoint receiving the node's inbound segments
    entry: Vec<usize>,
    /// Endpoint emitting the node's outbound segments
    exit: Vec<usize>,
    /// Whether the node was split (entry != exit)
    split: Vec<bool>,
    /// Total auxiliary endpoint count
    count: usize,
}

fn route(problem: &BeltsProblem) -> Result<BeltsSolution> {
    problem.validate()?;

    let node_id: HashMap<&str, usize> = problem
        .nodes
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();
    let n = problem.nodes.len();

    // Last entry wins for duplicated cap/source names; ordered maps keep
    // float summation order fixed across runs
    let mut caps: BTreeMap<&str, f64> = BTreeMap::new();
    for cap in &problem.node_caps {
        caps.insert(cap.name.as_str(), cap.cap);
    }
    let mut supplies: BTreeMap<&str, f64> = BTreeMap::new();
    for source in &problem.sources {
        supplies.insert(source.name.as_str(), source.supply);
    }
    let total_supply: f64 = supplies.values().sum();
    let sink = problem.sink.name.as_str();

    // A node is split iff it is capped, not a source, and not the sink.
    // Sources and the sink carry their supply/demand without throttling here.
    let mut endpoints = Endpoints {
        entry: vec![0; n],
        exit: vec![0; n],
        split: vec![false; n],
        count: 0,
    };
    for (i, name) in problem.nodes.iter().enumerate() {
        let name = name.as_str();
        if caps.contains_key(name) && !supplies.contains_key(name) && name != sink {
            endpoints.entry[i] = endpoints.count;
            endpoints.exit[i] = endpoints.count + 1;
            endpoints.split[i] = true;
            endpoints.count += 2;
        } else {
            endpoints.entry[i] = endpoints.count;
            endpoints.exit[i] = endpoints.count;
            endpoints.count += 1;
        }
    }
    let super_source = endpoints.count;
    let super_sink = endpoints.count + 1;

    // Parallel segments collapse per mapped endpoint pair, first occurrence
    // fixing the group's position.
    let reduced = |edge: &BeltEdge| edge.hi - edge.lo;
    let mut groups: IndexMap<(usize, usize), Vec<usize>> = IndexMap::new();
    for (idx, edge) in problem.edges.iter().enumerate() {
        let tail = endpoints.exit[node_id[edge.from.as_str()]];
        let head = endpoints.entry[node_id[edge.to.as_str()]];
        groups.entry((tail, head)).or_default().push(idx);
    }

    // B(v) = sum lo(in) - sum lo(out); R(v) = B(v) + supply(v) - demand(v)
    let mut balance = vec![0.0f64; n];
    for edge in &problem.edges {
        balance[node_id[edge.to.as_str()]] += edge.lo;
        balance[node_id[edge.from.as_str()]] -= edge.lo;
    }
    let mut requirement = vec![0.0f64; n];
    for (i, name) in problem.nodes.iter().enumerate() {
        let supply = supplies.get(name.as_str()).copied().unwrap_or(0.0);
        let demand = if name.as_str() == sink { total_supply } else { 0.0 };
        requirement[i] = balance[i] + supply - demand;
    }

    let mut net = FlowNetwork::new(endpoints.count + 2);

    let mut cap_arc: Vec<Option<usize>> = vec![None; n];
    for (i, name) in problem.nodes.iter().enumerate() {
        if endpoints.split[i] {
            cap_arc[i] = Some(net.add_edge(
                endpoints.entry[i],
                endpoints.exit[i],
                caps[name.as_str()],
            ));
        }
    }

    let mut group_arc = Vec::with_capacity(groups.len());
    for (&(tail, head), members) in &groups {
        let capacity: f64 = members.iter().map(|&i| reduced(&problem.edges[i])).sum();
        group_arc.push(net.add_edge(tail, head, capacity));
    }

    let mut demand = 0.0;
    for i in 0..n {
        if requirement[i] > FLOW_TOLERANCE {
            net.add_edge(super_source, endpoints.entry[i], requirement[i]);
            demand += requirement[i];
        } else if requirement[i] < -FLOW_TOLERANCE {
            net.add_edge(endpoints.exit[i], super_sink, -requirement[i]);
        }
    }

    debug!(
        nodes = endpoints.count,
        arcs = net.num_arcs(),
        demand,
        "auxiliary network built"
    );

    let result = max_flow(&net, super_source, super_sink)?;
    debug!(max_flow = result.max_flow, demand, "reduction solved");

    if !within(result.max_flow, demand, FLOW_TOLERANCE) {
        return Ok(diagnose(
            problem, &endpoints, &groups, &group_arc, &cap_arc, &caps, &result.arc_flows,
            &result.source_side, demand - result.max_flow,
        ));
    }

    // Lift: apportion each aggregated flow across its members by reduced
    // share, then re-add the lower bounds.
    let mut lifted = vec![0.0f64; problem.edges.len()];
    for (group_idx, members) in groups.values().enumerate() {
        let flow = result.arc_flows[group_arc[group_idx]];
        let total_reduced: f64 = members.iter().map(|&i| reduced(&problem.edges[i])).sum();
        if total_reduced > FLOW_TOLERANCE {
            for &i in members {
                lifted[i] = reduced(&problem.edges[i]) / total_reduced * flow;
            }
        }
    }

    let mut flows = Vec::new();
    for (i, edge) in problem.edges.iter().enumerate() {
        let flow = lifted[i] + edge.lo;
        if flow > edge.hi + FLOW_TOLERANCE {
            return Err(Error::solver(format!(
                "apportioned flow {flow} exceeds upper bound on edge {}->{}",
                edge.from, edge.to
            )));
        }
        if flow > FLOW_TOLERANCE {
            flows.push(ArcFlow {
                from: edge.from.clone(),
                to: edge.to.clone(),
                flow,
            });
        }
    }
    flows.sort_by(|a, b| (&a.from, &a.to).cmp(&(&b.from, &b.to)));

    Ok(BeltsSolution::Ok {
        max_flow_per_min: total_supply,
        flows,
    })
}

/// Read the infeasibility diagnosis off the solved auxiliary network.
#[allow(clippy::too_many_arguments)]
fn diagnose(
    problem: &BeltsProblem,
    endpoints: &Endpoints,
    groups: &IndexMap<(usize, usize), Vec<usize>>,
    group_arc: &[usize],
    cap_arc: &[Option<usize>],
    caps: &BTreeMap<&str, f64>,
    arc_flows: &[f64],
    source_side: &[bool],
    deficit: f64,
) -> BeltsSolution {
    // A base node sits on the supply side if either endpoint does.
    let mut cut_reachable: BTreeSet<&str> = BTreeSet::new();
    for (i, name) in problem.nodes.iter().enumerate() {
        if source_side[endpoints.entry[i]] || source_side[endpoints.exit[i]] {
            cut_reachable.insert(name.as_str());
        }
    }

    let mut by_name: Vec<(&str, usize)> = problem
        .nodes
        .iter()
        .enumerate()
        .map(|(i, name)| (name.as_str(), i))
        .collect();
    by_name.sort_unstable();

    let mut tight_nodes = Vec::new();
    for (name, i) in by_name {
        if !cut_reachable.contains(name) || !endpoints.split[i] {
            continue;
        }
        if let Some(arc) = cap_arc[i] {
            if caps[name] - arc_flows[arc] <= FLOW_TOLERANCE {
                tight_nodes.push(name.to_string());
            }
        }
    }

    let reduced = |i: usize| problem.edges[i].hi - problem.edges[i].lo;
    let mut tight_edges = Vec::new();
    for (group_idx, (&(tail, head), members)) in groups.iter().enumerate() {
        if !source_side[tail] || source_side[head] {
            continue;
        }
        let capacity: f64 = members.iter().copied().map(reduced).sum();
        if capacity - arc_flows[group_arc[group_idx]] <= FLOW_TOLERANCE {
            for &i in members {
                tight_edges.push(TightEdge {
                    from: problem.edges[i].from.clone(),
                    to: problem.edges[i].to.clone(),
                    flow_needed: deficit,
                });
            }
        }
    }

    BeltsSolution::Infeasible {
        cut_reachable: cut_reachable.iter().map(ToString::to_string).collect(),
        deficit: Deficit {
            demand_balance: deficit,
            tight_nodes,
            tight_edges,
        },
    }
}
