//! Offline production-planning solvers for factory-automation games.
//!
//! Two independent command-line tools share this library. `factory` decides
//! whether a requested steady-state production rate is achievable under raw
//! supply and machine-count limits and, if so, emits a machine-minimal plan.
//! `belts` routes all supply through a capacitated transport network with
//! per-edge lower bounds, emitting either a feasible flow or a min-cut
//! certificate.
//!
//! Both tools read one JSON problem instance from standard input and write
//! one JSON result document to standard output. Infeasibility is a
//! first-class answer (exit 0 with a certificate); only malformed input or
//! an unexpected oracle error exits nonzero.

pub mod belts;
pub mod factory;
pub mod io;
pub mod lp;
pub mod maxflow;
pub mod models;

use thiserror::Error;

/// Tolerance governing every feasibility and positivity comparison.
pub const EPSILON: f64 = 1e-9;

/// Errors that abort a run before any JSON reaches standard output.
#[derive(Debug, Error)]
pub enum Error {
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("recipe '{recipe}' references unknown machine '{machine}'")]
    UnknownMachine { recipe: String, machine: String },

    #[error("failed to read standard input: {0}")]
    Io(#[from] std::io::Error),
}
