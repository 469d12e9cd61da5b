//! Types for the belt routing pack

use crate::{Error, Result, FLOW_TOLERANCE};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Input for the belt routing engine
///
/// A directed transport graph with per-edge throughput bounds, optional
/// per-node throughput caps, a set of supplying nodes, and a single sink
/// that must absorb the entire supply.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BeltsProblem {
    /// Node identifiers; every other name in the problem must appear here
    #[serde(default)]
    pub nodes: Vec<String>,
    /// Directed belt segments; parallel segments are permitted and preserved
    #[serde(default)]
    pub edges: Vec<BeltEdge>,
    /// Per-node throughput caps (max total flow routed through the node)
    #[serde(default)]
    pub node_caps: Vec<NodeCap>,
    /// Supplying nodes and their rates
    #[serde(default)]
    pub sources: Vec<SupplySource>,
    /// The node that must absorb the entire supply
    pub sink: SinkRef,
}

/// One directed belt segment with throughput bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BeltEdge {
    /// Tail node
    pub from: String,
    /// Head node
    pub to: String,
    /// Upper throughput bound (items/min)
    pub hi: f64,
    /// Lower throughput bound (items/min); the segment must carry at least this
    #[serde(default)]
    pub lo: f64,
}

/// Throughput cap for one node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeCap {
    /// Node name
    pub name: String,
    /// Maximum throughput routed through the node (items/min)
    pub cap: f64,
}

/// A supplying node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplySource {
    /// Node name
    pub name: String,
    /// Supply rate (items/min)
    pub supply: f64,
}

/// Reference to the sink node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SinkRef {
    /// Node name
    pub name: String,
}

impl BeltsProblem {
    /// Validate name references and edge bounds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when an edge, cap, source, or the sink
    /// names a node missing from `nodes`, or when an edge has `hi < lo`
    /// beyond tolerance.
    pub fn validate(&self) -> Result<()> {
        let known: BTreeSet<&str> = self.nodes.iter().map(String::as_str).collect();

        for edge in &self.edges {
            for endpoint in [&edge.from, &edge.to] {
                if !known.contains(endpoint.as_str()) {
                    return Err(Error::invalid_input(format!(
                        "edge {}->{} references unknown node {endpoint}",
                        edge.from, edge.to
                    )));
                }
            }
            if edge.hi + FLOW_TOLERANCE < edge.lo {
                return Err(Error::invalid_input(format!(
                    "edge {}->{} has hi < lo",
                    edge.from, edge.to
                )));
            }
        }
        for cap in &self.node_caps {
            if !known.contains(cap.name.as_str()) {
                return Err(Error::invalid_input(format!(
                    "node cap references unknown node {}",
                    cap.name
                )));
            }
        }
        for source in &self.sources {
            if !known.contains(source.name.as_str()) {
                return Err(Error::invalid_input(format!(
                    "source {} is not a declared node",
                    source.name
                )));
            }
        }
        if !known.contains(self.sink.name.as_str()) {
            return Err(Error::invalid_input(format!(
                "sink {} is not a declared node",
                self.sink.name
            )));
        }
        Ok(())
    }

    /// Total supply across all sources. Duplicate source entries for the same
    /// name count once, last entry winning.
    #[must_use]
    pub fn total_supply(&self) -> f64 {
        let mut per_source = std::collections::BTreeMap::new();
        for source in &self.sources {
            per_source.insert(source.name.as_str(), source.supply);
        }
        per_source.values().sum()
    }
}

/// Output of the belt routing engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BeltsSolution {
    /// All supply reaches the sink; per-segment flows attached
    Ok {
        /// Total routed flow, equal to the total supply
        max_flow_per_min: f64,
        /// Per-segment flows above tolerance, sorted by `(from, to)`
        flows: Vec<ArcFlow>,
    },
    /// The supply cannot be fully routed; carries a min-cut diagnosis
    Infeasible {
        /// Nodes on the supply side of a minimum cut, sorted by name
        cut_reachable: Vec<String>,
        /// What is missing and where the network is tight
        deficit: Deficit,
    },
    /// Malformed problem or kernel failure
    Error {
        /// Human-readable description
        message: String,
    },
}

/// Flow assigned to one belt segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArcFlow {
    /// Tail node
    pub from: String,
    /// Head node
    pub to: String,
    /// Routed flow (items/min)
    pub flow: f64,
}

/// Infeasibility diagnosis attached to [`BeltsSolution::Infeasible`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deficit {
    /// How much supply cannot reach the sink (items/min)
    pub demand_balance: f64,
    /// Capped nodes saturated on the supply side of the cut, sorted by name
    pub tight_nodes: Vec<String>,
    /// Saturated segments crossing the cut; each would need `flow_needed` more
    pub tight_edges: Vec<TightEdge>,
}

/// A saturated belt segment crossing the min cut
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TightEdge {
    /// Tail node
    pub from: String,
    /// Head node
    pub to: String,
    /// Additional throughput this segment would need (the full deficit)
    pub flow_needed: f64,
}
