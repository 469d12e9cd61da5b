//! Graph algorithms
//!
//! This module provides the flow machinery behind the belt routing engine:
//!
//! - [`flow`] - Max flow over real-valued capacities, with min-cut extraction
//!
//! ## Graph Representation
//!
//! Flow networks use a flat arc store with adjacency lists and paired
//! forward/reverse arcs, so the residual graph is implicit and a minimum cut
//! can be read off the solved network without rebuilding anything.
//!
//! ## Example: Max Flow
//!
//! ```rust
//! use foundry_optimization::graph::{FlowNetwork, max_flow};
//!
//! let mut net = FlowNetwork::new(4);
//! net.add_edge(0, 1, 10.0);
//! net.add_edge(0, 2, 10.0);
//! net.add_edge(1, 3, 10.0);
//! net.add_edge(2, 3, 10.0);
//!
//! let result = max_flow(&net, 0, 3).unwrap();
//! assert!((result.max_flow - 20.0).abs() < 1e-9);
//! ```

pub mod flow;

// Re-export main types
pub use flow::{max_flow, FlowNetwork, MaxFlowResult};
