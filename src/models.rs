//! Typed problem instances and result documents for both solvers.
//!
//! Maps and sets that reach the wire are `BTreeMap`/`BTreeSet` so key order
//! is lexicographic and repeated runs produce byte-identical output.

use std::collections::{BTreeMap, BTreeSet};

use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// A factory problem instance as read from standard input.
#[derive(Debug, Clone, Deserialize)]
pub struct FactoryInput {
    /// Machine catalog, keyed by machine name.
    pub machines: BTreeMap<String, MachineSpec>,
    /// Optional per-machine module effects.
    #[serde(default)]
    pub modules: BTreeMap<String, ModuleSpec>,
    /// Recipe catalog, keyed by recipe name.
    pub recipes: BTreeMap<String, RecipeSpec>,
    pub limits: Limits,
    pub target: Target,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MachineSpec {
    /// Base crafting rate of one machine, in crafts per minute.
    pub crafts_per_min: f64,
}

/// Additive speed/productivity multipliers applied on top of base rates.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleSpec {
    #[serde(default)]
    pub speed: f64,
    #[serde(default)]
    pub prod: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecipeSpec {
    /// Machine type the recipe runs on; must exist in the machine catalog.
    pub machine: String,
    /// Duration of one craft, in seconds.
    pub time_s: f64,
    /// Items consumed per craft.
    #[serde(rename = "in", default)]
    pub inputs: BTreeMap<String, f64>,
    /// Items produced per craft, before the productivity multiplier.
    #[serde(rename = "out", default)]
    pub outputs: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Limits {
    /// Per-machine-type count caps; machines not listed are unbounded.
    pub max_machines: BTreeMap<String, f64>,
    /// Raw item supply caps in items per minute; the keys define which
    /// items count as raw.
    pub raw_supply_per_min: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Target {
    pub item: String,
    pub rate_per_min: f64,
}

/// Result document of the factory solver.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum FactoryOutcome {
    Ok {
        /// Crafts per minute for every recipe; 0 when unused.
        per_recipe_crafts_per_min: BTreeMap<String, f64>,
        /// Machine counts for every capped machine; uncapped machines are
        /// not reported.
        per_machine_counts: BTreeMap<String, f64>,
        /// Net consumption for every raw item; 0 when untouched.
        raw_consumption_per_min: BTreeMap<String, f64>,
    },
    Infeasible {
        max_feasible_target_per_min: f64,
        bottleneck_hint: BTreeSet<String>,
    },
}

/// A belts problem instance as read from standard input.
#[derive(Debug, Clone, Deserialize)]
pub struct BeltsInput {
    /// Supply nodes with their rates.
    pub sources: BTreeMap<String, f64>,
    pub sink: String,
    /// Throughput caps for intermediate nodes; caps on sources or the sink
    /// are ignored.
    #[serde(default)]
    pub node_caps: BTreeMap<String, f64>,
    /// Directed edges; parallel edges between the same pair are distinct.
    pub edges: Vec<EdgeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Result document of the belts solver.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum BeltsOutcome {
    Ok {
        max_flow_per_min: f64,
        /// Per-edge flows in input-edge order; zero-flow edges are omitted.
        flows: Vec<FlowEntry>,
    },
    Infeasible {
        /// Names on the source side of the min cut.
        cut_reachable: BTreeSet<String>,
        deficit: Deficit,
    },
}

#[derive(Debug, Serialize)]
pub struct FlowEntry {
    pub from: String,
    pub to: String,
    pub flow: f64,
}

#[derive(Debug, Serialize)]
pub struct Deficit {
    /// Demand the max flow failed to deliver.
    pub demand_balance: f64,
    /// Capped nodes whose internal capacity arc crosses the cut.
    pub tight_nodes: BTreeSet<String>,
    /// Original edges crossing the cut, in input-edge order.
    pub tight_edges: Vec<TightEdge>,
}

#[derive(Debug, Serialize)]
pub struct TightEdge {
    pub from: String,
    pub to: String,
    pub flow_needed: FlowNeeded,
}

/// Either a concrete shortfall (negative for an impossible bound) or the
/// literal string `"at capacity"` for a saturated cut edge.
#[derive(Debug, Clone, Copy)]
pub enum FlowNeeded {
    Amount(f64),
    AtCapacity,
}

impl Serialize for FlowNeeded {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FlowNeeded::Amount(value) => serializer.serialize_f64(*value),
            FlowNeeded::AtCapacity => serializer.serialize_str("at capacity"),
        }
    }
}
