//! Pack traits and core abstractions

use serde::Serialize;

/// A domain pack for batch planning
///
/// Packs define the contract for one planning domain: schema validation,
/// solving, and JSON encoding. Infeasibility and input errors are first-class
/// solution statuses, so [`Pack::solve_value`] is total: whatever arrives on
/// the wire, a status document comes back.
pub trait Pack: Send + Sync {
    /// Pack name (e.g., "belts")
    fn name(&self) -> &'static str;

    /// Pack version
    fn version(&self) -> &'static str;

    /// Solve a JSON problem document, producing a JSON solution document
    /// with a `"status"` of `ok`, `infeasible`, or `error`.
    fn solve_value(&self, input: &serde_json::Value) -> serde_json::Value;
}

/// Encode a solution, folding encoder failures into the `error` status.
///
/// Serialization of a solution schema cannot realistically fail, but the
/// batch contract forbids surfacing a panic either way.
pub fn encode_solution<T: Serialize>(solution: &T) -> serde_json::Value {
    match serde_json::to_value(solution) {
        Ok(value) => value,
        Err(err) => serde_json::json!({
            "status": "error",
            "message": format!("encode error: {err}"),
        }),
    }
}

/// Result of checking one solution invariant
#[derive(Debug, Clone)]
pub struct InvariantResult {
    /// Which invariant was checked
    pub invariant: String,
    /// Whether it held
    pub passed: bool,
    /// Violation details if it did not
    pub detail: Option<String>,
}

impl InvariantResult {
    /// Create a passing result
    pub fn pass(invariant: impl Into<String>) -> Self {
        Self {
            invariant: invariant.into(),
            passed: true,
            detail: None,
        }
    }

    /// Create a failing result
    pub fn fail(invariant: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            invariant: invariant.into(),
            passed: false,
            detail: Some(detail.into()),
        }
    }
}
