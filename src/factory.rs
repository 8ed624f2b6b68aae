//! Steady-state factory planner.
//!
//! The instance reduces to two linear programs over per-recipe crafting
//! rates. Phase 1 maximizes the achievable target rate to decide
//! feasibility; Phase 2 pins the target and minimizes total machines. When
//! Phase 1 falls short, the binding rows' shadow prices name the
//! bottleneck.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::lp::{LinearProgram, LpSolution, Row, Var};
use crate::models::{FactoryInput, FactoryOutcome};
use crate::{Error, EPSILON};

/// Machine cost assigned to recipes that cannot craft at all, so the
/// minimizer avoids them unless nothing else reaches the target.
const UNCRAFTABLE_COST: f64 = 1e30;

/// A recipe with its derived steady-state rates.
#[derive(Debug, Clone)]
struct PreparedRecipe {
    name: String,
    machine: String,
    inputs: BTreeMap<String, f64>,
    outputs: BTreeMap<String, f64>,
    /// Machines occupied per craft-per-minute of throughput.
    machine_cost_per_craft: f64,
    /// Output multiplier from productivity modules.
    prod_mult: f64,
}

/// The classified instance: derived recipe rates plus item classes.
#[derive(Debug)]
struct Model {
    recipes: Vec<PreparedRecipe>,
    machine_caps: BTreeMap<String, f64>,
    raw_caps: BTreeMap<String, f64>,
    intermediates: BTreeSet<String>,
    target_item: String,
    target_rate: f64,
}

/// One phase's LP with the handles needed to read its solution back.
struct PhaseLp {
    lp: LinearProgram,
    recipe_vars: Vec<Var>,
    /// Present in Phase 1 only: the achievable-target variable.
    target_var: Option<Var>,
    machine_rows: BTreeMap<String, Row>,
    raw_rows: BTreeMap<String, Row>,
    target_row: Row,
}

/// Solve a factory instance end to end.
pub fn solve(input: &FactoryInput) -> Result<FactoryOutcome, Error> {
    let model = prepare(input)?;
    debug!(
        "factory model: {} recipes, {} raw items, {} intermediates, {} capped machines",
        model.recipes.len(),
        model.raw_caps.len(),
        model.intermediates.len(),
        model.machine_caps.len()
    );

    // Phase 1: how much of the target is reachable at all?
    let PhaseLp {
        lp,
        target_var,
        machine_rows,
        raw_rows,
        ..
    } = build_phase(&model, None);
    let target_var = target_var.expect("phase 1 has a target variable");
    let solution = match lp.solve() {
        Ok(solution) => solution,
        Err(failure) => {
            debug!("phase 1 failed: {failure}");
            return Ok(infeasible(0.0, "Initial solver failure"));
        }
    };
    let max_feasible = solution.value(target_var);
    debug!("phase 1 optimum {max_feasible}, requested {}", model.target_rate);

    if max_feasible < model.target_rate - EPSILON {
        let hints = bottleneck_hints(&machine_rows, &raw_rows, &solution, max_feasible);
        return Ok(FactoryOutcome::Infeasible {
            max_feasible_target_per_min: max_feasible,
            bottleneck_hint: hints,
        });
    }

    // Phase 2: pin the target and minimize total machines across all
    // recipes, capped or not.
    let phase2 = build_phase(&model, Some(model.target_rate));
    let PhaseLp {
        lp,
        recipe_vars,
        raw_rows,
        target_row,
        ..
    } = phase2;
    let solution = match lp.solve() {
        Ok(solution) => solution,
        Err(failure) => {
            debug!("phase 2 failed: {failure}");
            return Ok(infeasible(max_feasible, "Phase 2 solver failure"));
        }
    };

    Ok(build_plan(&model, &recipe_vars, &raw_rows, target_row, &solution))
}

/// Derive per-recipe rates and classify every mentioned item as raw,
/// target, or intermediate.
fn prepare(input: &FactoryInput) -> Result<Model, Error> {
    let raw_caps = input.limits.raw_supply_per_min.clone();
    let mut all_items: BTreeSet<String> = raw_caps.keys().cloned().collect();

    let mut recipes = Vec::with_capacity(input.recipes.len());
    for (name, spec) in &input.recipes {
        let machine = input
            .machines
            .get(&spec.machine)
            .ok_or_else(|| Error::UnknownMachine {
                recipe: name.clone(),
                machine: spec.machine.clone(),
            })?;
        let modules = input.modules.get(&spec.machine);
        let speed = modules.map_or(0.0, |m| m.speed);
        let prod = modules.map_or(0.0, |m| m.prod);

        let eff_crafts_per_min = machine.crafts_per_min * (1.0 + speed) * 60.0 / spec.time_s;
        let machine_cost_per_craft = if eff_crafts_per_min > EPSILON {
            1.0 / eff_crafts_per_min
        } else {
            UNCRAFTABLE_COST
        };

        all_items.extend(spec.inputs.keys().cloned());
        all_items.extend(spec.outputs.keys().cloned());
        recipes.push(PreparedRecipe {
            name: name.clone(),
            machine: spec.machine.clone(),
            inputs: spec.inputs.clone(),
            outputs: spec.outputs.clone(),
            machine_cost_per_craft,
            prod_mult: 1.0 + prod,
        });
    }

    let target_item = input.target.item.clone();
    let intermediates = all_items
        .into_iter()
        .filter(|item| *item != target_item && !raw_caps.contains_key(item))
        .collect();

    Ok(Model {
        recipes,
        machine_caps: input.limits.max_machines.clone(),
        raw_caps,
        intermediates,
        target_item,
        target_rate: input.target.rate_per_min,
    })
}

/// Build one phase's LP. With `pin_target` absent this is Phase 1
/// (maximize the free target variable); with a rate it is Phase 2
/// (pin the target row, minimize machine cost).
fn build_phase(model: &Model, pin_target: Option<f64>) -> PhaseLp {
    let mut lp = match pin_target {
        None => LinearProgram::maximize(),
        Some(_) => LinearProgram::minimize(),
    };

    let recipe_vars: Vec<Var> = model
        .recipes
        .iter()
        .map(|recipe| {
            let objective = match pin_target {
                None => 0.0,
                Some(_) => recipe.machine_cost_per_craft,
            };
            lp.add_var(objective)
        })
        .collect();
    let target_var = match pin_target {
        None => Some(lp.add_var(1.0)),
        Some(_) => None,
    };

    // Net balance coefficient per (item, recipe): an item consumed and
    // produced by the same recipe contributes out * prod_mult - in.
    let mut balance: BTreeMap<&str, BTreeMap<usize, f64>> = BTreeMap::new();
    for (index, recipe) in model.recipes.iter().enumerate() {
        for (item, qty) in &recipe.inputs {
            *balance.entry(item).or_default().entry(index).or_insert(0.0) -= *qty;
        }
        for (item, qty) in &recipe.outputs {
            *balance.entry(item).or_default().entry(index).or_insert(0.0) +=
                qty * recipe.prod_mult;
        }
    }
    let coeffs_for = |item: &str| -> Vec<(Var, f64)> {
        balance
            .get(item)
            .map(|cols| cols.iter().map(|(&index, &c)| (recipe_vars[index], c)).collect())
            .unwrap_or_default()
    };

    // Item balance rows: intermediates must net to zero, raw items may be
    // drawn down to their supply cap, the target carries the demand.
    for item in &model.intermediates {
        lp.add_row(0.0, 0.0, &coeffs_for(item));
    }
    let mut raw_rows = BTreeMap::new();
    for (item, cap) in &model.raw_caps {
        if *item == model.target_item {
            continue;
        }
        raw_rows.insert(item.clone(), lp.add_row(-cap, 0.0, &coeffs_for(item)));
    }
    let mut target_coeffs = coeffs_for(&model.target_item);
    let target_row = match pin_target {
        None => {
            target_coeffs.push((target_var.expect("phase 1 target variable"), -1.0));
            lp.add_row(0.0, 0.0, &target_coeffs)
        }
        Some(rate) => lp.add_row(rate, rate, &target_coeffs),
    };

    // Machine usage rows, for capped machines only.
    let mut machine_rows = BTreeMap::new();
    for (machine, cap) in &model.machine_caps {
        let coeffs: Vec<(Var, f64)> = model
            .recipes
            .iter()
            .enumerate()
            .filter(|(_, recipe)| recipe.machine == *machine)
            .map(|(index, recipe)| (recipe_vars[index], recipe.machine_cost_per_craft))
            .collect();
        machine_rows.insert(machine.clone(), lp.add_row(0.0, *cap, &coeffs));
    }

    PhaseLp {
        lp,
        recipe_vars,
        target_var,
        machine_rows,
        raw_rows,
        target_row,
    }
}

/// Name the binding Phase-1 constraints via their shadow prices. Backends
/// disagree on dual signs under a maximize sense, so binding rows are
/// detected by nonzero magnitude; non-binding rows dual to zero.
fn bottleneck_hints(
    machine_rows: &BTreeMap<String, Row>,
    raw_rows: &BTreeMap<String, Row>,
    solution: &LpSolution,
    max_feasible: f64,
) -> BTreeSet<String> {
    let mut hints = BTreeSet::new();
    for (machine, row) in machine_rows {
        if solution.dual(*row).abs() > EPSILON {
            hints.insert(format!("{machine} cap"));
        }
    }
    for (item, row) in raw_rows {
        if solution.dual(*row).abs() > EPSILON {
            hints.insert(format!("{item} supply"));
        }
    }
    if hints.is_empty() {
        if max_feasible > EPSILON {
            hints.insert("Target rate conflicts with other constraints".to_string());
        } else {
            hints.insert("Unknown bottleneck, possibly no production path".to_string());
        }
    }
    hints
}

/// Assemble the success document from the Phase-2 optimum.
fn build_plan(
    model: &Model,
    recipe_vars: &[Var],
    raw_rows: &BTreeMap<String, Row>,
    target_row: Row,
    solution: &LpSolution,
) -> FactoryOutcome {
    let mut per_recipe: BTreeMap<String, f64> = model
        .recipes
        .iter()
        .map(|recipe| (recipe.name.clone(), 0.0))
        .collect();
    let mut per_machine: BTreeMap<String, f64> = model
        .machine_caps
        .keys()
        .map(|machine| (machine.clone(), 0.0))
        .collect();

    for (index, recipe) in model.recipes.iter().enumerate() {
        let crafts = solution.value(recipe_vars[index]);
        if crafts > EPSILON {
            per_recipe.insert(recipe.name.clone(), crafts);
            if let Some(count) = per_machine.get_mut(&recipe.machine) {
                *count += crafts * recipe.machine_cost_per_craft;
            }
        }
    }

    let mut raw_consumption = BTreeMap::new();
    for item in model.raw_caps.keys() {
        // A raw item that doubles as the target reads its balance from the
        // target row.
        let row = if *item == model.target_item {
            target_row
        } else {
            raw_rows[item]
        };
        let consumption = -solution.activity(row);
        raw_consumption.insert(
            item.clone(),
            if consumption > EPSILON { consumption } else { 0.0 },
        );
    }

    FactoryOutcome::Ok {
        per_recipe_crafts_per_min: per_recipe,
        per_machine_counts: per_machine,
        raw_consumption_per_min: raw_consumption,
    }
}

fn infeasible(max_feasible: f64, hint: &str) -> FactoryOutcome {
    FactoryOutcome::Infeasible {
        max_feasible_target_per_min: max_feasible,
        bottleneck_hint: BTreeSet::from([hint.to_string()]),
    }
}
