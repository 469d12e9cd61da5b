//! Belt Routing Pack
//!
//! Routes supplies across a directed belt network to a single sink, honoring
//! per-segment throughput bounds (including mandatory lower bounds) and
//! per-junction throughput caps.
//!
//! ## Problem
//!
//! Given:
//! - A directed graph of belt segments with `[lo, hi]` throughput bounds
//! - Optional per-node throughput caps
//! - Source nodes with supply rates and a single sink
//!
//! Find:
//! - Per-segment flows delivering the entire supply to the sink, or
//! - A minimum-cut diagnosis: how much cannot be delivered, which capped
//!   junctions and which segments are the binding bottlenecks
//!
//! ## Solver
//!
//! Lower-bounded flow reduces to plain max flow on an auxiliary network
//! (capped junctions split in two, reduced capacities `hi - lo`, a super
//! source/sink pair injecting the bound-induced requirements); see
//! [`solver`].

mod invariants;
mod solver;
mod types;

pub use invariants::*;
pub use solver::*;
pub use types::*;

use crate::packs::{encode_solution, Pack};

/// Belt Routing Pack
pub struct BeltsPack;

impl Pack for BeltsPack {
    fn name(&self) -> &'static str {
        "belts"
    }

    fn version(&self) -> &'static str {
        "1.0.0"
    }

    fn solve_value(&self, input: &serde_json::Value) -> serde_json::Value {
        let solution = match serde_json::from_value::<BeltsProblem>(input.clone()) {
            Ok(problem) => solve(&problem),
            Err(err) => BeltsSolution::Error {
                message: format!("invalid input: {err}"),
            },
        };
        encode_solution(&solution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    fn parse(value: serde_json::Value) -> BeltsProblem {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_feasible_linear_chain() {
        let problem = parse(serde_json::json!({
            "nodes": ["src", "a", "sink"],
            "edges": [
                {"from": "src", "to": "a", "hi": 100},
                {"from": "a", "to": "sink", "hi": 100}
            ],
            "sources": [{"name": "src", "supply": 50}],
            "sink": {"name": "sink"}
        }));

        let solution = solve(&problem);
        let BeltsSolution::Ok { max_flow_per_min, ref flows } = solution else {
            panic!("expected ok, got {solution:?}");
        };
        assert_abs_diff_eq!(max_flow_per_min, 50.0, epsilon = 1e-9);
        assert_eq!(flows.len(), 2);
        assert_abs_diff_eq!(flows[0].flow, 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(flows[1].flow, 50.0, epsilon = 1e-9);
        // Sorted by (from, to)
        assert_eq!(flows[0].from, "a");
        assert_eq!(flows[1].from, "src");

        assert!(check_all(&problem, &solution).iter().all(|r| r.passed));
    }

    #[test]
    fn test_bottleneck_infeasible() {
        let problem = parse(serde_json::json!({
            "nodes": ["src", "a", "sink"],
            "edges": [
                {"from": "src", "to": "a", "hi": 100},
                {"from": "a", "to": "sink", "hi": 20}
            ],
            "sources": [{"name": "src", "supply": 50}],
            "sink": {"name": "sink"}
        }));

        let solution = solve(&problem);
        let BeltsSolution::Infeasible { ref cut_reachable, ref deficit } = solution else {
            panic!("expected infeasible, got {solution:?}");
        };
        assert_abs_diff_eq!(deficit.demand_balance, 30.0, epsilon = 1e-9);
        assert!(cut_reachable.contains(&"src".to_string()));
        assert!(cut_reachable.contains(&"a".to_string()));
        assert!(!cut_reachable.contains(&"sink".to_string()));
        assert!(deficit.tight_nodes.is_empty());
        assert_eq!(deficit.tight_edges.len(), 1);
        assert_eq!(deficit.tight_edges[0].from, "a");
        assert_eq!(deficit.tight_edges[0].to, "sink");
        assert_abs_diff_eq!(deficit.tight_edges[0].flow_needed, 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lower_bound_forced_flow() {
        let problem = parse(serde_json::json!({
            "nodes": ["s", "a", "sink"],
            "edges": [
                {"from": "s", "to": "a", "lo": 10, "hi": 10},
                {"from": "a", "to": "sink", "lo": 0, "hi": 100}
            ],
            "sources": [{"name": "s", "supply": 10}],
            "sink": {"name": "sink"}
        }));

        let solution = solve(&problem);
        let BeltsSolution::Ok { ref flows, .. } = solution else {
            panic!("expected ok, got {solution:?}");
        };
        assert_eq!(flows.len(), 2);
        for arc in flows {
            assert_abs_diff_eq!(arc.flow, 10.0, epsilon = 1e-9);
        }
        assert!(check_all(&problem, &solution).iter().all(|r| r.passed));
    }

    #[test]
    fn test_node_cap_respected_when_feasible() {
        let problem = parse(serde_json::json!({
            "nodes": ["src", "j", "sink"],
            "edges": [
                {"from": "src", "to": "j", "hi": 100},
                {"from": "j", "to": "sink", "hi": 100}
            ],
            "node_caps": [{"name": "j", "cap": 60}],
            "sources": [{"name": "src", "supply": 50}],
            "sink": {"name": "sink"}
        }));

        let solution = solve(&problem);
        assert!(matches!(solution, BeltsSolution::Ok { .. }), "{solution:?}");
        assert!(check_all(&problem, &solution).iter().all(|r| r.passed));
    }

    #[test]
    fn test_node_cap_bottleneck() {
        let problem = parse(serde_json::json!({
            "nodes": ["src", "j", "sink"],
            "edges": [
                {"from": "src", "to": "j", "hi": 100},
                {"from": "j", "to": "sink", "hi": 100}
            ],
            "node_caps": [{"name": "j", "cap": 30}],
            "sources": [{"name": "src", "supply": 50}],
            "sink": {"name": "sink"}
        }));

        let solution = solve(&problem);
        let BeltsSolution::Infeasible { ref cut_reachable, ref deficit } = solution else {
            panic!("expected infeasible, got {solution:?}");
        };
        assert_abs_diff_eq!(deficit.demand_balance, 20.0, epsilon = 1e-9);
        assert_eq!(deficit.tight_nodes, vec!["j".to_string()]);
        assert_eq!(cut_reachable, &vec!["j".to_string(), "src".to_string()]);
        assert!(deficit.tight_edges.is_empty());
    }

    #[test]
    fn test_capped_source_is_not_throttled() {
        // Caps on sources are carried without splitting, so the full supply
        // still leaves the node.
        let problem = parse(serde_json::json!({
            "nodes": ["src", "sink"],
            "edges": [{"from": "src", "to": "sink", "hi": 100}],
            "node_caps": [{"name": "src", "cap": 1}],
            "sources": [{"name": "src", "supply": 50}],
            "sink": {"name": "sink"}
        }));

        let solution = solve(&problem);
        assert!(matches!(solution, BeltsSolution::Ok { .. }), "{solution:?}");
    }

    #[test]
    fn test_parallel_edges_apportioned_by_capacity() {
        let problem = parse(serde_json::json!({
            "nodes": ["s", "t"],
            "edges": [
                {"from": "s", "to": "t", "hi": 10},
                {"from": "s", "to": "t", "hi": 30}
            ],
            "sources": [{"name": "s", "supply": 20}],
            "sink": {"name": "t"}
        }));

        let solution = solve(&problem);
        let BeltsSolution::Ok { ref flows, .. } = solution else {
            panic!("expected ok, got {solution:?}");
        };
        assert_eq!(flows.len(), 2);
        assert_abs_diff_eq!(flows[0].flow, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(flows[1].flow, 15.0, epsilon = 1e-9);
        assert!(check_all(&problem, &solution).iter().all(|r| r.passed));
    }

    #[test]
    fn test_parallel_edges_with_lower_bound() {
        let problem = parse(serde_json::json!({
            "nodes": ["s", "t"],
            "edges": [
                {"from": "s", "to": "t", "lo": 5, "hi": 10},
                {"from": "s", "to": "t", "hi": 30}
            ],
            "sources": [{"name": "s", "supply": 20}],
            "sink": {"name": "t"}
        }));

        let solution = solve(&problem);
        let BeltsSolution::Ok { ref flows, .. } = solution else {
            panic!("expected ok, got {solution:?}");
        };
        let total: f64 = flows.iter().map(|f| f.flow).sum();
        assert_abs_diff_eq!(total, 20.0, epsilon = 1e-9);
        assert!(flows[0].flow >= 5.0 - 1e-9 && flows[0].flow <= 10.0 + 1e-9);
        assert!(check_all(&problem, &solution).iter().all(|r| r.passed));
    }

    #[test]
    fn test_unreachable_source() {
        let problem = parse(serde_json::json!({
            "nodes": ["s1", "s2", "sink"],
            "edges": [{"from": "s1", "to": "sink", "hi": 100}],
            "sources": [{"name": "s1", "supply": 50}, {"name": "s2", "supply": 25}],
            "sink": {"name": "sink"}
        }));

        let solution = solve(&problem);
        let BeltsSolution::Infeasible { ref cut_reachable, ref deficit } = solution else {
            panic!("expected infeasible, got {solution:?}");
        };
        assert_abs_diff_eq!(deficit.demand_balance, 25.0, epsilon = 1e-9);
        assert_eq!(cut_reachable, &vec!["s2".to_string()]);
    }

    #[test]
    fn test_hi_below_lo_is_an_error() {
        let problem = parse(serde_json::json!({
            "nodes": ["s", "t"],
            "edges": [{"from": "s", "to": "t", "lo": 5, "hi": 2}],
            "sources": [{"name": "s", "supply": 1}],
            "sink": {"name": "t"}
        }));

        let solution = solve(&problem);
        let BeltsSolution::Error { ref message } = solution else {
            panic!("expected error, got {solution:?}");
        };
        assert!(message.contains("s->t has hi < lo"), "{message}");
    }

    #[test]
    fn test_unknown_node_is_an_error() {
        let problem = parse(serde_json::json!({
            "nodes": ["s", "t"],
            "edges": [{"from": "s", "to": "ghost", "hi": 2}],
            "sources": [{"name": "s", "supply": 1}],
            "sink": {"name": "t"}
        }));

        assert!(matches!(solve(&problem), BeltsSolution::Error { .. }));
    }

    #[test]
    fn test_zero_supply_trivially_ok() {
        let problem = parse(serde_json::json!({
            "nodes": ["s", "t"],
            "edges": [{"from": "s", "to": "t", "hi": 10}],
            "sources": [],
            "sink": {"name": "t"}
        }));

        let solution = solve(&problem);
        let BeltsSolution::Ok { max_flow_per_min, ref flows } = solution else {
            panic!("expected ok, got {solution:?}");
        };
        assert_abs_diff_eq!(max_flow_per_min, 0.0, epsilon = 1e-9);
        assert!(flows.is_empty());
    }

    #[test]
    fn test_determinism() {
        let problem = parse(serde_json::json!({
            "nodes": ["s", "a", "b", "t"],
            "edges": [
                {"from": "s", "to": "a", "hi": 30},
                {"from": "s", "to": "b", "hi": 30},
                {"from": "a", "to": "t", "hi": 25},
                {"from": "b", "to": "t", "hi": 25}
            ],
            "sources": [{"name": "s", "supply": 40}],
            "sink": {"name": "t"}
        }));

        let first = serde_json::to_string(&solve(&problem)).unwrap();
        let second = serde_json::to_string(&solve(&problem)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_pack_wiring() {
        let pack = BeltsPack;
        assert_eq!(pack.name(), "belts");

        let input = serde_json::json!({
            "nodes": ["s", "t"],
            "edges": [{"from": "s", "to": "t", "hi": 10}],
            "sources": [{"name": "s", "supply": 4}],
            "sink": {"name": "t"}
        });
        let value = pack.solve_value(&input);
        assert_eq!(value["status"], "ok");
        assert_eq!(value["flows"][0]["from"], "s");

        let garbage = serde_json::json!({"nodes": 7});
        let value = pack.solve_value(&garbage);
        assert_eq!(value["status"], "error");
    }

    proptest! {
        /// Random cap-only networks either route everything (and satisfy the
        /// published invariants) or come back with a positive deficit whose
        /// cut excludes the sink.
        #[test]
        fn prop_solve_is_consistent(
            edges in proptest::collection::vec((0usize..5, 0usize..5, 0.0f64..50.0), 1..12),
            supply in 0.0f64..60.0,
            cap in 1.0f64..40.0,
        ) {
            let nodes = ["n0", "n1", "n2", "n3", "n4"];
            let edge_values: Vec<_> = edges
                .iter()
                .filter(|(a, b, _)| a != b)
                .map(|&(a, b, hi)| serde_json::json!({"from": nodes[a], "to": nodes[b], "hi": hi}))
                .collect();
            let problem: BeltsProblem = serde_json::from_value(serde_json::json!({
                "nodes": nodes,
                "edges": edge_values,
                "node_caps": [{"name": "n2", "cap": cap}],
                "sources": [{"name": "n0", "supply": supply}],
                "sink": {"name": "n4"}
            })).unwrap();

            let solution = solve(&problem);
            match &solution {
                BeltsSolution::Ok { .. } => {
                    let results = check_all(&problem, &solution);
                    prop_assert!(results.iter().all(|r| r.passed), "{results:?}");
                }
                BeltsSolution::Infeasible { cut_reachable, deficit } => {
                    prop_assert!(deficit.demand_balance > 0.0);
                    prop_assert!(!cut_reachable.contains(&"n4".to_string()));
                }
                BeltsSolution::Error { message } => {
                    prop_assert!(false, "unexpected error: {message}");
                }
            }
        }
    }
}
