//! Factory Planning Pack
//!
//! Plans the cheapest machine mix that hits a target output rate.
//!
//! ## Problem
//!
//! Given:
//! - Machine types with baseline tempos and optional speed/productivity
//!   modifiers
//! - Recipes consuming and producing materials on those machines
//! - Raw material budgets and machine-count caps
//! - A target material and net production rate
//!
//! Find:
//! - Crafts-per-minute per recipe minimizing total machine-count
//!   equivalents, with intermediates balanced and raws within budget, or
//! - The maximum achievable target rate plus the constraints binding it
//!
//! ## Solver
//!
//! Linear programming over one non-negative activity per recipe; see
//! [`solver`]. Raw materials are never net-produced: a dedicated row keeps
//! synthesis of raws out of every plan and doubles as a bottleneck label.

mod invariants;
mod solver;
mod types;

pub use invariants::*;
pub use solver::*;
pub use types::*;

use crate::packs::{encode_solution, Pack};

/// Factory Planning Pack
pub struct FactoryPack;

impl Pack for FactoryPack {
    fn name(&self) -> &'static str {
        "factory"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn solve_value(&self, input: &serde_json::Value) -> serde_json::Value {
        let solution = match serde_json::from_value::<FactoryProblem>(input.clone()) {
            Ok(problem) => solve(&problem),
            Err(err) => FactorySolution::Error {
                message: format!("invalid input: {err}"),
            },
        };
        encode_solution(&solution)
    }
}
