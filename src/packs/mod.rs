//! Domain Packs
//!
//! Each pack owns one planning problem end to end:
//! - Typed input/output schemas (serde)
//! - A deterministic solver
//! - Invariant checks over produced solutions
//!
//! ## Available Packs
//!
//! - [`belts`] - Belt routing: flow with lower bounds and node throughput caps
//! - [`factory`] - Factory planning: minimum-machine recipe mix for a target rate
//!
//! ## Example
//!
//! ```rust
//! use foundry_optimization::packs::{Pack, PackRegistry};
//!
//! let registry = PackRegistry::with_builtins();
//! let pack = registry.get("belts").unwrap();
//! let input = serde_json::json!({
//!     "nodes": ["s", "t"],
//!     "edges": [{"from": "s", "to": "t", "hi": 10}],
//!     "sources": [{"name": "s", "supply": 4}],
//!     "sink": {"name": "t"}
//! });
//! let solution = pack.solve_value(&input);
//! assert_eq!(solution["status"], "ok");
//! ```

pub mod registry;
pub mod traits;

pub mod belts;
pub mod factory;

pub use registry::*;
pub use traits::*;
