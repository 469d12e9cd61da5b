//! Network flow algorithms
//!
//! - **Max Flow**: maximum flow from source to sink (Push-Relabel), over
//!   real-valued capacities
//! - **Min Cut**: source-side partition of a minimum cut, read from the
//!   residual graph of the solved network

use crate::{Error, Result};
use std::collections::VecDeque;

/// Residual capacities and excesses below this threshold are treated as zero.
/// Keeps the discharge loop from spinning on floating-point dust.
const EPS: f64 = 1e-12;

/// A flow network for max flow problems
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    /// Number of nodes
    pub num_nodes: usize,
    /// Adjacency list: adj[u] contains indices into `edges` for arcs leaving u
    adj: Vec<Vec<usize>>,
    /// All arcs (forward and reverse)
    edges: Vec<FlowEdge>,
}

/// An arc in the flow network
#[derive(Debug, Clone, Copy)]
struct FlowEdge {
    /// Target node
    to: usize,
    /// Capacity
    capacity: f64,
    /// Current flow
    flow: f64,
    /// Index of the paired reverse arc
    rev: usize,
}

impl FlowNetwork {
    /// Create a new flow network with n nodes
    #[must_use]
    pub fn new(num_nodes: usize) -> Self {
        Self {
            num_nodes,
            adj: vec![Vec::new(); num_nodes],
            edges: Vec::new(),
        }
    }

    /// Add an arc from `from` to `to` with the given capacity.
    ///
    /// Returns the arc's index in insertion order; [`MaxFlowResult::arc_flows`]
    /// is indexed the same way.
    pub fn add_edge(&mut self, from: usize, to: usize, capacity: f64) -> usize {
        let forward_idx = self.edges.len();
        let reverse_idx = self.edges.len() + 1;

        // Forward arc
        self.edges.push(FlowEdge {
            to,
            capacity,
            flow: 0.0,
            rev: reverse_idx,
        });
        self.adj[from].push(forward_idx);

        // Reverse arc (residual graph only, zero capacity)
        self.edges.push(FlowEdge {
            to: from,
            capacity: 0.0,
            flow: 0.0,
            rev: forward_idx,
        });
        self.adj[to].push(reverse_idx);

        forward_idx / 2
    }

    /// Number of arcs added via [`FlowNetwork::add_edge`]
    #[must_use]
    pub fn num_arcs(&self) -> usize {
        self.edges.len() / 2
    }

    /// Residual capacity of an arc (by internal index)
    fn residual(&self, edge_idx: usize) -> f64 {
        self.edges[edge_idx].capacity - self.edges[edge_idx].flow
    }

    /// Push flow along an arc, updating the paired reverse arc
    fn push_flow(&mut self, edge_idx: usize, amount: f64) {
        self.edges[edge_idx].flow += amount;
        let rev = self.edges[edge_idx].rev;
        self.edges[rev].flow -= amount;
    }
}

// ============================================================================
// MAX FLOW - Push-Relabel Algorithm (Goldberg-Tarjan)
// ============================================================================

/// Result of a max flow computation
#[derive(Debug, Clone)]
pub struct MaxFlowResult {
    /// Maximum flow value
    pub max_flow: f64,
    /// Flow on each arc, indexed by the order of `add_edge` calls
    pub arc_flows: Vec<f64>,
    /// Nodes reachable from the source in the residual graph of the solved
    /// network. This is the source side of a minimum s-t cut.
    pub source_side: Vec<bool>,
}

/// Solve max flow using the Push-Relabel algorithm.
///
/// Time complexity: O(V²E) with FIFO selection.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] when `source`/`sink` are out of range or
/// equal.
pub fn max_flow(network: &FlowNetwork, source: usize, sink: usize) -> Result<MaxFlowResult> {
    if source >= network.num_nodes || sink >= network.num_nodes {
        return Err(Error::invalid_input("source or sink out of range"));
    }
    if source == sink {
        return Err(Error::invalid_input("source and sink must be different"));
    }

    let n = network.num_nodes;

    // Clone network for mutation
    let mut net = network.clone();

    // Height (distance labels) and excess flow at each node
    let mut height = vec![0usize; n];
    let mut excess = vec![0.0f64; n];

    // Current edge pointer for each node (for the discharge operation)
    let mut current = vec![0usize; n];

    // Active nodes queue (nodes with excess, excluding source and sink)
    let mut active: VecDeque<usize> = VecDeque::new();
    let mut in_queue = vec![false; n];

    // Initialize: set source height to n, saturate all outgoing arcs
    height[source] = n;

    let source_edges: Vec<usize> = net.adj[source].clone();
    for edge_idx in source_edges {
        let cap = net.residual(edge_idx);
        if cap > EPS {
            let to = net.edges[edge_idx].to;
            net.push_flow(edge_idx, cap);
            excess[to] += cap;
            excess[source] -= cap;

            if to != sink && to != source && !in_queue[to] {
                active.push_back(to);
                in_queue[to] = true;
            }
        }
    }

    // Main loop: process active nodes
    while let Some(u) = active.pop_front() {
        in_queue[u] = false;

        let activated = discharge(&mut net, &mut height, &mut excess, &mut current, u, source, sink);

        for v in activated {
            if !in_queue[v] {
                active.push_back(v);
                in_queue[v] = true;
            }
        }

        // Re-queue if the node still carries excess
        if excess[u] > EPS && u != source && u != sink && !in_queue[u] {
            active.push_back(u);
            in_queue[u] = true;
        }
    }

    // Extract per-arc flows (forward arcs sit at even indices)
    let arc_flows: Vec<f64> = (0..net.edges.len())
        .step_by(2)
        .map(|i| net.edges[i].flow)
        .collect();

    let source_side = residual_reachable(&net, source);

    Ok(MaxFlowResult {
        max_flow: excess[sink],
        arc_flows,
        source_side,
    })
}

/// Discharge operation: push excess from node u.
/// Returns nodes that received flow and became active (excluding source/sink).
fn discharge(
    net: &mut FlowNetwork,
    height: &mut [usize],
    excess: &mut [f64],
    current: &mut [usize],
    u: usize,
    source: usize,
    sink: usize,
) -> Vec<usize> {
    let mut activated = Vec::new();

    while excess[u] > EPS {
        if current[u] >= net.adj[u].len() {
            // Relabel: raise height to min(height[v] + 1) over residual arcs
            relabel(net, height, u);
            current[u] = 0;
        } else {
            let edge_idx = net.adj[u][current[u]];
            let v = net.edges[edge_idx].to;
            let residual = net.residual(edge_idx);

            if residual > EPS && height[u] == height[v] + 1 {
                let push_amount = excess[u].min(residual);
                net.push_flow(edge_idx, push_amount);
                excess[u] -= push_amount;

                let was_idle = excess[v] <= EPS;
                excess[v] += push_amount;

                if was_idle && v != source && v != sink {
                    activated.push(v);
                }
            } else {
                current[u] += 1;
            }
        }
    }

    activated
}

/// Relabel operation: set height[u] to min(height[v] + 1) over residual arcs
fn relabel(net: &FlowNetwork, height: &mut [usize], u: usize) {
    let mut min_height = usize::MAX;

    for &edge_idx in &net.adj[u] {
        if net.residual(edge_idx) > EPS {
            let v = net.edges[edge_idx].to;
            min_height = min_height.min(height[v]);
        }
    }

    if min_height < usize::MAX {
        height[u] = min_height + 1;
    }
}

/// BFS over residual arcs from `start`. On a solved network this yields the
/// source side of a minimum cut.
fn residual_reachable(net: &FlowNetwork, start: usize) -> Vec<bool> {
    let mut seen = vec![false; net.num_nodes];
    let mut queue = VecDeque::new();
    seen[start] = true;
    queue.push_back(start);

    while let Some(u) = queue.pop_front() {
        for &edge_idx in &net.adj[u] {
            if net.residual(edge_idx) > EPS {
                let v = net.edges[edge_idx].to;
                if !seen[v] {
                    seen[v] = true;
                    queue.push_back(v);
                }
            }
        }
    }

    seen
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_max_flow_simple_path() {
        // 0 -> 1 -> 2 with capacities 5, 3: the bottleneck is 3
        let mut net = FlowNetwork::new(3);
        net.add_edge(0, 1, 5.0);
        net.add_edge(1, 2, 3.0);

        let result = max_flow(&net, 0, 2).unwrap();
        assert_abs_diff_eq!(result.max_flow, 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.arc_flows[0], 3.0, epsilon = 1e-9);
        assert_abs_diff_eq!(result.arc_flows[1], 3.0, epsilon = 1e-9);
    }

    #[test]
    fn test_max_flow_parallel_paths() {
        // Two disjoint paths 0 -> 1 -> 3 and 0 -> 2 -> 3, each carrying 10
        let mut net = FlowNetwork::new(4);
        net.add_edge(0, 1, 10.0);
        net.add_edge(1, 3, 10.0);
        net.add_edge(0, 2, 10.0);
        net.add_edge(2, 3, 10.0);

        let result = max_flow(&net, 0, 3).unwrap();
        assert_abs_diff_eq!(result.max_flow, 20.0, epsilon = 1e-9);
    }

    #[test]
    fn test_max_flow_classic_network() {
        //        10        4
        //   0 ------> 1 ------> 3
        //   |         | 2       | 10
        //   | 10      v    9    v
        //   +-------> 2 ------> 4 (sink)
        //             1 ---8--> 4
        let mut net = FlowNetwork::new(5);
        net.add_edge(0, 1, 10.0);
        net.add_edge(0, 2, 10.0);
        net.add_edge(1, 2, 2.0);
        net.add_edge(1, 3, 4.0);
        net.add_edge(1, 4, 8.0);
        net.add_edge(2, 4, 9.0);
        net.add_edge(3, 4, 10.0);

        // Sink capacity in: 8 + 9 + 4 = 21, but node 1 receives at most 10
        // and node 2 at most 12 while forwarding at most 9. Max flow is 19.
        let result = max_flow(&net, 0, 4).unwrap();
        assert_abs_diff_eq!(result.max_flow, 19.0, epsilon = 1e-9);
    }

    #[test]
    fn test_min_cut_partition() {
        // 0 -> 1 (cap 100) -> 2 (cap 1): the cut separates {0, 1} from {2}
        let mut net = FlowNetwork::new(3);
        net.add_edge(0, 1, 100.0);
        net.add_edge(1, 2, 1.0);

        let result = max_flow(&net, 0, 2).unwrap();
        assert_abs_diff_eq!(result.max_flow, 1.0, epsilon = 1e-9);
        assert_eq!(result.source_side, vec![true, true, false]);
    }

    #[test]
    fn test_min_cut_at_source_edge() {
        // 0 -> 1 (cap 1) -> 2 (cap 100): the cut separates {0} from {1, 2}
        let mut net = FlowNetwork::new(3);
        net.add_edge(0, 1, 1.0);
        net.add_edge(1, 2, 100.0);

        let result = max_flow(&net, 0, 2).unwrap();
        assert_abs_diff_eq!(result.max_flow, 1.0, epsilon = 1e-9);
        assert_eq!(result.source_side, vec![true, false, false]);
    }

    #[test]
    fn test_disconnected_sink() {
        let mut net = FlowNetwork::new(4);
        net.add_edge(0, 1, 5.0);
        // Node 2 -> 3 exists but nothing reaches node 2
        net.add_edge(2, 3, 5.0);

        let result = max_flow(&net, 0, 3).unwrap();
        assert_abs_diff_eq!(result.max_flow, 0.0, epsilon = 1e-9);
        assert!(result.source_side[0]);
        assert!(!result.source_side[3]);
    }

    #[test]
    fn test_fractional_capacities() {
        let mut net = FlowNetwork::new(3);
        net.add_edge(0, 1, 2.5);
        net.add_edge(1, 2, 1.75);

        let result = max_flow(&net, 0, 2).unwrap();
        assert_abs_diff_eq!(result.max_flow, 1.75, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_endpoints() {
        let net = FlowNetwork::new(2);
        assert!(max_flow(&net, 0, 5).is_err());
        assert!(max_flow(&net, 1, 1).is_err());
    }

    #[test]
    fn test_arc_index_order() {
        let mut net = FlowNetwork::new(3);
        let a = net.add_edge(0, 1, 4.0);
        let b = net.add_edge(1, 2, 4.0);
        assert_eq!((a, b), (0, 1));
        assert_eq!(net.num_arcs(), 2);
    }
}
