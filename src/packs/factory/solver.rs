//! Solver for the factory planning pack
//!
//! One non-negative variable per recipe (crafts/min). The primary program
//! minimizes total machine-count equivalents subject to material balance
//! (intermediates at zero, target at the requested rate) and the machine,
//! raw-budget, and raw-non-production limits. If it is infeasible, a
//! fallback program drops the target balance and maximizes the net target
//! rate under the remaining constraints; binding rows of that optimum become
//! the bottleneck hints.

use super::types::{FactoryProblem, FactorySolution, RecipeSpec};
use crate::lp::{self, LpOutcome};
use crate::{binding, Result, PLAN_TOLERANCE};
use indexmap::IndexSet;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Solve a factory planning problem.
///
/// Validation failures and kernel errors are folded into
/// [`FactorySolution::Error`]; this function does not panic on bad input.
#[must_use]
pub fn solve(problem: &FactoryProblem) -> FactorySolution {
    match plan(problem) {
        Ok(solution) => solution,
        Err(err) => FactorySolution::Error {
            message: err.to_string(),
        },
    }
}

/// One recipe with its derived rates, in canonical (sorted-name) order
struct RecipePlan {
    name: String,
    machine: String,
    effective: f64,
    spec: RecipeSpec,
}

impl RecipePlan {
    fn prod_mult(&self, problem: &FactoryProblem) -> f64 {
        problem.prod_mult(&self.spec)
    }

    /// Net production of a material per craft (productivity scales outputs,
    /// never inputs)
    fn net_out(&self, problem: &FactoryProblem, material: &str) -> f64 {
        let output = self.spec.outputs.get(material).copied().unwrap_or(0.0);
        let input = self.spec.inputs.get(material).copied().unwrap_or(0.0);
        output * self.prod_mult(problem) - input
    }

    /// Net consumption of a material per craft
    fn net_in(&self, problem: &FactoryProblem, material: &str) -> f64 {
        -self.net_out(problem, material)
    }
}

/// The classified problem: recipes with rates, materials by class
struct PlanModel {
    recipes: Vec<RecipePlan>,
    /// Machine types, sorted
    machines: Vec<String>,
    /// Input-only materials, sorted
    raws: Vec<String>,
    /// Materials appearing on both sides of some recipe, sorted
    intermediates: Vec<String>,
    /// Every material mentioned by any recipe, sorted
    all_materials: Vec<String>,
}

fn classify(problem: &FactoryProblem) -> PlanModel {
    let recipes: Vec<RecipePlan> = problem
        .recipes
        .iter()
        .map(|(name, spec)| RecipePlan {
            name: name.clone(),
            machine: spec.machine.clone(),
            effective: problem.effective_crafts(spec),
            spec: spec.clone(),
        })
        .collect();

    let mut consumed: BTreeSet<&str> = BTreeSet::new();
    let mut produced: BTreeSet<&str> = BTreeSet::new();
    for recipe in &recipes {
        consumed.extend(recipe.spec.inputs.keys().map(String::as_str));
        produced.extend(recipe.spec.outputs.keys().map(String::as_str));
    }

    PlanModel {
        machines: problem.machines.keys().cloned().collect(),
        raws: consumed.difference(&produced).map(ToString::to_string).collect(),
        intermediates: consumed.intersection(&produced).map(ToString::to_string).collect(),
        all_materials: consumed.union(&produced).map(ToString::to_string).collect(),
        recipes,
    }
}

/// One inequality row: dense coefficients, an upper bound, and the label it
/// contributes when binding
struct ConstraintRow {
    coefficients: Vec<f64>,
    bound: f64,
    hint: String,
}

/// All inequality rows in scan order: machine caps, then raw budgets, then
/// raw non-production. The scan order fixes the hint order.
fn inequality_rows(problem: &FactoryProblem, model: &PlanModel) -> Vec<ConstraintRow> {
    let mut rows = Vec::new();

    for machine in &model.machines {
        let coefficients = model
            .recipes
            .iter()
            .map(|r| if &r.machine == machine { 1.0 / r.effective } else { 0.0 })
            .collect();
        rows.push(ConstraintRow {
            coefficients,
            bound: problem
                .limits
                .max_machines
                .get(machine)
                .copied()
                .unwrap_or(f64::INFINITY),
            hint: format!("{machine} cap"),
        });
    }

    for raw in &model.raws {
        let coefficients = model
            .recipes
            .iter()
            .map(|r| r.net_in(problem, raw))
            .collect();
        rows.push(ConstraintRow {
            coefficients,
            bound: problem
                .limits
                .raw_supply_per_min
                .get(raw)
                .copied()
                .unwrap_or(f64::INFINITY),
            hint: format!("{raw} production restriction"),
        });
    }

    for raw in &model.raws {
        let coefficients = model
            .recipes
            .iter()
            .map(|r| r.net_out(problem, raw))
            .collect();
        rows.push(ConstraintRow {
            coefficients,
            bound: 0.0,
            hint: format!("{raw} supply"),
        });
    }

    rows
}

/// Material balance rows for the primary program: intermediates plus the
/// target, each balanced to zero except the target row at the target rate
fn balance_rows(problem: &FactoryProblem, model: &PlanModel) -> Vec<lp::Row> {
    let mut materials: BTreeSet<&str> =
        model.intermediates.iter().map(String::as_str).collect();
    materials.insert(problem.target.item.as_str());

    materials
        .into_iter()
        .map(|material| {
            let coefficients = model
                .recipes
                .iter()
                .map(|r| r.net_out(problem, material))
                .collect();
            let rhs = if material == problem.target.item {
                problem.target.rate_per_min
            } else {
                0.0
            };
            (coefficients, rhs)
        })
        .collect()
}

fn plan(problem: &FactoryProblem) -> Result<FactorySolution> {
    problem.validate()?;
    let model = classify(problem);

    let objective: Vec<f64> = model.recipes.iter().map(|r| 1.0 / r.effective).collect();
    let inequalities = inequality_rows(problem, &model);
    let upper_bounds: Vec<lp::Row> = inequalities
        .iter()
        .map(|row| (row.coefficients.clone(), row.bound))
        .collect();
    let equalities = balance_rows(problem, &model);

    debug!(
        recipes = model.recipes.len(),
        balance_rows = equalities.len(),
        limit_rows = inequalities.len(),
        "primary program assembled"
    );

    match lp::minimize(&objective, &equalities, &upper_bounds)? {
        LpOutcome::Optimal(activity) => Ok(success(problem, &model, &activity)),
        LpOutcome::Infeasible | LpOutcome::Unbounded => {
            debug!("primary program infeasible, maximizing achievable target");
            maximize_target(problem, &model, &inequalities, &upper_bounds)
        }
    }
}

fn success(problem: &FactoryProblem, model: &PlanModel, activity: &[f64]) -> FactorySolution {
    let per_recipe_crafts_per_min: BTreeMap<String, f64> = model
        .recipes
        .iter()
        .zip(activity)
        .map(|(r, &x)| (r.name.clone(), x))
        .collect();

    let mut per_machine_counts: BTreeMap<String, f64> =
        model.machines.iter().map(|m| (m.clone(), 0.0)).collect();
    for (recipe, &x) in model.recipes.iter().zip(activity) {
        if let Some(count) = per_machine_counts.get_mut(&recipe.machine) {
            *count += x / recipe.effective;
        }
    }

    let raw_consumption_per_min: BTreeMap<String, f64> = model
        .raws
        .iter()
        .map(|raw| {
            let drawn: f64 = model
                .recipes
                .iter()
                .zip(activity)
                .map(|(r, &x)| r.net_in(problem, raw) * x)
                .sum();
            (raw.clone(), drawn)
        })
        .collect();

    FactorySolution::Ok {
        per_recipe_crafts_per_min,
        per_machine_counts,
        raw_consumption_per_min,
    }
}

/// Fallback program: maximize the net target rate with the target balance
/// row dropped. Every other non-raw material stays balanced at zero,
/// including output-only byproducts.
fn maximize_target(
    problem: &FactoryProblem,
    model: &PlanModel,
    inequalities: &[ConstraintRow],
    upper_bounds: &[lp::Row],
) -> Result<FactorySolution> {
    let target = problem.target.item.as_str();
    let target_rate: Vec<f64> = model
        .recipes
        .iter()
        .map(|r| r.net_out(problem, target))
        .collect();
    let objective: Vec<f64> = target_rate.iter().map(|c| -c).collect();

    let raws: BTreeSet<&str> = model.raws.iter().map(String::as_str).collect();
    let equalities: Vec<lp::Row> = model
        .all_materials
        .iter()
        .filter(|m| m.as_str() != target && !raws.contains(m.as_str()))
        .map(|material| {
            let coefficients = model
                .recipes
                .iter()
                .map(|r| r.net_out(problem, material))
                .collect();
            (coefficients, 0.0)
        })
        .collect();

    let LpOutcome::Optimal(activity) = lp::minimize(&objective, &equalities, upper_bounds)?
    else {
        return Ok(FactorySolution::Infeasible {
            max_feasible_target_per_min: 0.0,
            bottleneck_hint: Vec::new(),
        });
    };

    let achieved: f64 = target_rate.iter().zip(&activity).map(|(c, x)| c * x).sum();

    // The interior-point kernel meets constraints to a scale-relative
    // accuracy, so the binding test widens with the bound's magnitude.
    let mut hints: IndexSet<String> = IndexSet::new();
    for row in inequalities {
        let slack = lp::slack(&row.coefficients, row.bound, &activity);
        let threshold = PLAN_TOLERANCE * row.bound.abs().max(1.0);
        if binding(slack, threshold) {
            hints.insert(row.hint.clone());
        }
    }

    debug!(achieved, hints = hints.len(), "fallback program solved");

    Ok(FactorySolution::Infeasible {
        max_feasible_target_per_min: achieved,
        bottleneck_hint: hints.into_iter().collect(),
    })
}
