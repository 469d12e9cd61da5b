//! Types for the factory planning pack

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Input for the factory planning engine
///
/// Recipes run on machines at rates derived from machine tempo, recipe time,
/// and per-machine speed modifiers; productivity modifiers scale recipe
/// outputs. The plan must hit a target output rate while respecting raw
/// material budgets and machine-count limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactoryProblem {
    /// Machine types and their baseline tempo
    pub machines: BTreeMap<String, MachineSpec>,
    /// Recipes keyed by name
    pub recipes: BTreeMap<String, RecipeSpec>,
    /// Per-machine speed/productivity modifiers (additive bonuses)
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleSpec>,
    /// Raw supply and machine-count limits
    pub limits: Limits,
    /// The production goal
    pub target: Target,
}

/// Baseline tempo of a machine type
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MachineSpec {
    /// Crafts per minute at speed 1.0
    pub crafts_per_min: f64,
}

/// One recipe: what it consumes and produces per craft, and where it runs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSpec {
    /// Machine type executing this recipe
    pub machine: String,
    /// Nominal craft time in seconds
    pub time_s: f64,
    /// Consumed materials per craft
    #[serde(default, rename = "in")]
    pub inputs: BTreeMap<String, f64>,
    /// Produced materials per craft (before productivity)
    #[serde(default, rename = "out")]
    pub outputs: BTreeMap<String, f64>,
}

/// Additive speed/productivity bonuses for one machine type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModuleSpec {
    /// Speed bonus; effective tempo scales by `1 + speed`
    #[serde(default)]
    pub speed: f64,
    /// Productivity bonus; outputs scale by `1 + prod`
    #[serde(default)]
    pub prod: f64,
}

/// Resource and machine limits
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Limits {
    /// Raw material budgets (items/min); absent entries are unbounded
    #[serde(default)]
    pub raw_supply_per_min: BTreeMap<String, f64>,
    /// Machine-count caps per machine type; absent entries are unbounded
    #[serde(default)]
    pub max_machines: BTreeMap<String, f64>,
}

/// The production goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Target {
    /// Material to produce
    pub item: String,
    /// Required net production rate (items/min)
    pub rate_per_min: f64,
}

impl FactoryProblem {
    /// Validate structural references and rate-model preconditions.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidInput`] when there are no recipes, a recipe
    /// names an unknown machine, a tempo or craft time is non-positive, or a
    /// module bonus is negative.
    pub fn validate(&self) -> Result<()> {
        if self.recipes.is_empty() {
            return Err(Error::invalid_input("no recipes defined"));
        }
        for (name, recipe) in &self.recipes {
            let Some(machine) = self.machines.get(&recipe.machine) else {
                return Err(Error::invalid_input(format!(
                    "recipe {name} references unknown machine {}",
                    recipe.machine
                )));
            };
            if machine.crafts_per_min <= 0.0 {
                return Err(Error::invalid_input(format!(
                    "machine {} has non-positive crafts_per_min",
                    recipe.machine
                )));
            }
            if recipe.time_s <= 0.0 {
                return Err(Error::invalid_input(format!(
                    "recipe {name} has non-positive time_s"
                )));
            }
        }
        for (name, module) in &self.modules {
            if module.speed < 0.0 || module.prod < 0.0 {
                return Err(Error::invalid_input(format!(
                    "modules for {name} must be non-negative"
                )));
            }
        }
        Ok(())
    }

    /// Effective crafts per minute for a recipe, including its machine's
    /// speed modifier. Assumes [`FactoryProblem::validate`] passed.
    #[must_use]
    pub fn effective_crafts(&self, recipe: &RecipeSpec) -> f64 {
        let tempo = self
            .machines
            .get(&recipe.machine)
            .map_or(0.0, |m| m.crafts_per_min);
        let speed = self
            .modules
            .get(&recipe.machine)
            .map_or(0.0, |m| m.speed);
        tempo * (1.0 + speed) * 60.0 / recipe.time_s
    }

    /// Productivity multiplier for a recipe (scales outputs only)
    #[must_use]
    pub fn prod_mult(&self, recipe: &RecipeSpec) -> f64 {
        1.0 + self
            .modules
            .get(&recipe.machine)
            .map_or(0.0, |m| m.prod)
    }
}

/// Output of the factory planning engine
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FactorySolution {
    /// A minimum-machine plan hitting the target rate
    Ok {
        /// Crafts per minute per recipe (all recipes listed)
        per_recipe_crafts_per_min: BTreeMap<String, f64>,
        /// Machine-count equivalents per machine type (all types listed)
        per_machine_counts: BTreeMap<String, f64>,
        /// Net raw consumption per raw material (all raws listed)
        raw_consumption_per_min: BTreeMap<String, f64>,
    },
    /// The target rate is out of reach; carries the achievable maximum and
    /// the binding constraints
    Infeasible {
        /// Best net target rate under all other constraints
        max_feasible_target_per_min: f64,
        /// Human-readable binding-constraint labels, scan order, deduplicated
        bottleneck_hint: Vec<String>,
    },
    /// Malformed problem or kernel failure
    Error {
        /// Human-readable description
        message: String,
    },
}
