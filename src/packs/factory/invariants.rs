//! Invariants for the factory planning pack

use super::types::{FactoryProblem, FactorySolution};
use crate::packs::InvariantResult;
use std::collections::BTreeSet;

const CHECK_TOLERANCE: f64 = 1e-4;

/// Check all invariants that apply to the given solution
#[must_use]
pub fn check_all(problem: &FactoryProblem, solution: &FactorySolution) -> Vec<InvariantResult> {
    match solution {
        FactorySolution::Ok { .. } => vec![
            check_material_balance(problem, solution),
            check_non_negativity(problem, solution),
            check_raw_caps(problem, solution),
            check_machine_counts(problem, solution),
        ],
        FactorySolution::Infeasible { .. } => vec![check_fallback(problem, solution)],
        FactorySolution::Error { .. } => Vec::new(),
    }
}

fn material_classes(problem: &FactoryProblem) -> (BTreeSet<&str>, BTreeSet<&str>) {
    let mut consumed: BTreeSet<&str> = BTreeSet::new();
    let mut produced: BTreeSet<&str> = BTreeSet::new();
    for recipe in problem.recipes.values() {
        consumed.extend(recipe.inputs.keys().map(String::as_str));
        produced.extend(recipe.outputs.keys().map(String::as_str));
    }
    let raws = consumed.difference(&produced).copied().collect();
    let intermediates = consumed.intersection(&produced).copied().collect();
    (raws, intermediates)
}

fn net_rate(problem: &FactoryProblem, solution: &FactorySolution, material: &str) -> f64 {
    let FactorySolution::Ok { per_recipe_crafts_per_min, .. } = solution else {
        return 0.0;
    };
    problem
        .recipes
        .iter()
        .map(|(name, recipe)| {
            let x = per_recipe_crafts_per_min.get(name).copied().unwrap_or(0.0);
            let output = recipe.outputs.get(material).copied().unwrap_or(0.0);
            let input = recipe.inputs.get(material).copied().unwrap_or(0.0);
            (output * problem.prod_mult(recipe) - input) * x
        })
        .sum()
}

/// Intermediates balance to zero; the target balances to its rate
#[must_use]
pub fn check_material_balance(
    problem: &FactoryProblem,
    solution: &FactorySolution,
) -> InvariantResult {
    let invariant = "material_balance";
    if !matches!(solution, FactorySolution::Ok { .. }) {
        return InvariantResult::pass(invariant);
    }

    let (_, intermediates) = material_classes(problem);
    for material in intermediates {
        if material == problem.target.item.as_str() {
            continue;
        }
        let rate = net_rate(problem, solution, material);
        if rate.abs() > CHECK_TOLERANCE {
            return InvariantResult::fail(
                invariant,
                format!("{material} nets {rate} items/min, expected 0"),
            );
        }
    }
    let target_rate = net_rate(problem, solution, &problem.target.item);
    if (target_rate - problem.target.rate_per_min).abs() > CHECK_TOLERANCE {
        return InvariantResult::fail(
            invariant,
            format!(
                "target nets {target_rate} items/min, expected {}",
                problem.target.rate_per_min
            ),
        );
    }
    InvariantResult::pass(invariant)
}

/// Activities and machine counts are non-negative
#[must_use]
pub fn check_non_negativity(
    _problem: &FactoryProblem,
    solution: &FactorySolution,
) -> InvariantResult {
    let invariant = "non_negativity";
    let FactorySolution::Ok { per_recipe_crafts_per_min, per_machine_counts, .. } = solution
    else {
        return InvariantResult::pass(invariant);
    };
    for (name, &value) in per_recipe_crafts_per_min {
        if value < -CHECK_TOLERANCE {
            return InvariantResult::fail(invariant, format!("recipe {name} runs at {value}"));
        }
    }
    for (name, &value) in per_machine_counts {
        if value < -CHECK_TOLERANCE {
            return InvariantResult::fail(invariant, format!("machine {name} counts {value}"));
        }
    }
    InvariantResult::pass(invariant)
}

/// Raw consumption stays within `[0, supply]`
#[must_use]
pub fn check_raw_caps(problem: &FactoryProblem, solution: &FactorySolution) -> InvariantResult {
    let invariant = "raw_caps";
    let FactorySolution::Ok { raw_consumption_per_min, .. } = solution else {
        return InvariantResult::pass(invariant);
    };
    for (material, &drawn) in raw_consumption_per_min {
        if drawn < -CHECK_TOLERANCE {
            return InvariantResult::fail(
                invariant,
                format!("{material} is net-produced at {} items/min", -drawn),
            );
        }
        let supply = problem
            .limits
            .raw_supply_per_min
            .get(material)
            .copied()
            .unwrap_or(f64::INFINITY);
        if drawn > supply + CHECK_TOLERANCE {
            return InvariantResult::fail(
                invariant,
                format!("{material} draws {drawn} over supply {supply}"),
            );
        }
    }
    InvariantResult::pass(invariant)
}

/// Reported machine counts agree with activities and respect the caps
#[must_use]
pub fn check_machine_counts(
    problem: &FactoryProblem,
    solution: &FactorySolution,
) -> InvariantResult {
    let invariant = "machine_counts";
    let FactorySolution::Ok { per_recipe_crafts_per_min, per_machine_counts, .. } = solution
    else {
        return InvariantResult::pass(invariant);
    };

    for (machine, &reported) in per_machine_counts {
        let expected: f64 = problem
            .recipes
            .iter()
            .filter(|(_, r)| &r.machine == machine)
            .map(|(name, r)| {
                let x = per_recipe_crafts_per_min.get(name).copied().unwrap_or(0.0);
                x / problem.effective_crafts(r)
            })
            .sum();
        if (reported - expected).abs() > CHECK_TOLERANCE {
            return InvariantResult::fail(
                invariant,
                format!("machine {machine} reports {reported}, recomputed {expected}"),
            );
        }
        let cap = problem
            .limits
            .max_machines
            .get(machine)
            .copied()
            .unwrap_or(f64::INFINITY);
        if reported > cap + CHECK_TOLERANCE {
            return InvariantResult::fail(
                invariant,
                format!("machine {machine} uses {reported} over cap {cap}"),
            );
        }
    }
    InvariantResult::pass(invariant)
}

/// A fallback report names a non-negative achievable rate
#[must_use]
pub fn check_fallback(_problem: &FactoryProblem, solution: &FactorySolution) -> InvariantResult {
    let invariant = "fallback";
    let FactorySolution::Infeasible { max_feasible_target_per_min, .. } = solution else {
        return InvariantResult::pass(invariant);
    };
    if *max_feasible_target_per_min < -CHECK_TOLERANCE {
        return InvariantResult::fail(
            invariant,
            format!("negative achievable rate {max_feasible_target_per_min}"),
        );
    }
    InvariantResult::pass(invariant)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn problem() -> FactoryProblem {
        serde_json::from_value(serde_json::json!({
            "machines": {"assembler": {"crafts_per_min": 60}},
            "recipes": {
                "iron_gear": {
                    "machine": "assembler", "time_s": 0.5,
                    "in": {"iron_plate": 2}, "out": {"iron_gear": 1}
                }
            },
            "limits": {"raw_supply_per_min": {"iron_plate": 200}},
            "target": {"item": "iron_gear", "rate_per_min": 10}
        }))
        .unwrap()
    }

    fn ok_solution(crafts: f64) -> FactorySolution {
        let per_recipe: BTreeMap<String, f64> =
            [("iron_gear".to_string(), crafts)].into_iter().collect();
        let machines: BTreeMap<String, f64> =
            [("assembler".to_string(), crafts / 7200.0)].into_iter().collect();
        let raws: BTreeMap<String, f64> =
            [("iron_plate".to_string(), 2.0 * crafts)].into_iter().collect();
        FactorySolution::Ok {
            per_recipe_crafts_per_min: per_recipe,
            per_machine_counts: machines,
            raw_consumption_per_min: raws,
        }
    }

    #[test]
    fn test_all_pass_on_consistent_solution() {
        let results = check_all(&problem(), &ok_solution(10.0));
        assert!(results.iter().all(|r| r.passed), "{results:?}");
    }

    #[test]
    fn test_balance_violation() {
        // Running at 7 crafts/min misses the target rate of 10
        let result = check_material_balance(&problem(), &ok_solution(7.0));
        assert!(!result.passed);
    }

    #[test]
    fn test_raw_cap_violation() {
        // 150 crafts/min draws 300 plates/min against a 200 supply
        let mut problem = problem();
        problem.target.rate_per_min = 150.0;
        let result = check_raw_caps(&problem, &ok_solution(150.0));
        assert!(!result.passed);
    }

    #[test]
    fn test_fallback_accepts_zero() {
        let solution = FactorySolution::Infeasible {
            max_feasible_target_per_min: 0.0,
            bottleneck_hint: vec![],
        };
        assert!(check_fallback(&problem(), &solution).passed);
    }
}
