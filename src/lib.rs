//! # foundry-optimization
//!
//! Batch planning engines for factory-builder style simulations. Each engine
//! is a pure `problem -> solution` function over JSON-friendly schemas, with
//! a first-class infeasibility diagnosis instead of a bare "no".
//!
//! ## Modules
//!
//! - [`graph`] - Flow algorithms (max flow with min-cut extraction)
//! - [`lp`] - Linear programming bridge (Clarabel via `good_lp`)
//! - [`packs`] - Domain packs: belt routing and factory planning
//!
//! ## Quick Start
//!
//! ```rust
//! use foundry_optimization::packs::belts::{self, BeltsProblem, BeltsSolution};
//!
//! let problem: BeltsProblem = serde_json::from_str(r#"{
//!     "nodes": ["src", "sink"],
//!     "edges": [{"from": "src", "to": "sink", "hi": 100}],
//!     "sources": [{"name": "src", "supply": 50}],
//!     "sink": {"name": "sink"}
//! }"#).unwrap();
//!
//! match belts::solve(&problem) {
//!     BeltsSolution::Ok { max_flow_per_min, .. } => assert_eq!(max_flow_per_min, 50.0),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! ## Status taxonomy
//!
//! Every pack resolves to one of three statuses, encoded as a tagged enum and
//! serialized with a `"status"` discriminant:
//!
//! - `ok` - a solution that passes the internal feasibility check
//! - `infeasible` - well-formed but unsolvable; carries diagnostics
//! - `error` - malformed input, unknown references, or a kernel failure

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod graph;
pub mod lp;
pub mod packs;

mod error;
mod types;

pub use error::{Error, Result};
pub use types::*;

/// Prelude for common imports
pub mod prelude {
    pub use crate::graph::{max_flow, FlowNetwork, MaxFlowResult};
    pub use crate::packs::belts::{BeltsProblem, BeltsSolution};
    pub use crate::packs::factory::{FactoryProblem, FactorySolution};
    pub use crate::packs::{InvariantResult, Pack, PackRegistry};
    pub use crate::Error;
    pub use crate::Result;
}
