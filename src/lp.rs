//! Deterministic LP oracle backed by HiGHS.
//!
//! The planners need three read-backs from an optimal basic solution:
//! primal variable values, per-row activities, and per-row shadow prices.
//! HiGHS exposes all three; this wrapper keeps the handle bookkeeping in
//! one place and pins the solver to a reproducible configuration (dual
//! simplex, fixed seed, single thread).

use std::fmt;

use highs::{HighsModelStatus, RowProblem, Sense};
use log::debug;

/// Handle to a decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Var(usize);

/// Handle to a ranged constraint row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Row(usize);

/// A linear program under construction. All variables are continuous and
/// nonnegative; all rows are two-sided ranged constraints.
pub struct LinearProgram {
    problem: RowProblem,
    sense: Sense,
    cols: Vec<highs::Col>,
    row_count: usize,
}

impl LinearProgram {
    pub fn maximize() -> Self {
        Self::with_sense(Sense::Maximise)
    }

    pub fn minimize() -> Self {
        Self::with_sense(Sense::Minimise)
    }

    fn with_sense(sense: Sense) -> Self {
        LinearProgram {
            problem: RowProblem::default(),
            sense,
            cols: Vec::new(),
            row_count: 0,
        }
    }

    /// Add a variable with the given objective coefficient, bounded below
    /// by zero and unbounded above.
    pub fn add_var(&mut self, objective: f64) -> Var {
        let col = self.problem.add_column(objective, 0.0..);
        self.cols.push(col);
        Var(self.cols.len() - 1)
    }

    /// Add a constraint `lower <= sum(coeff * var) <= upper`.
    pub fn add_row(&mut self, lower: f64, upper: f64, coeffs: &[(Var, f64)]) -> Row {
        self.problem.add_row(
            lower..=upper,
            coeffs.iter().map(|&(var, coeff)| (self.cols[var.0], coeff)),
        );
        self.row_count += 1;
        Row(self.row_count - 1)
    }

    /// Solve to optimality. Any other terminal status is a failure the
    /// caller maps to its own diagnostics.
    pub fn solve(self) -> Result<LpSolution, LpFailure> {
        let mut model = self.problem.optimise(self.sense);
        model.set_option("output_flag", false);
        model.set_option("solver", "simplex");
        model.set_option("simplex_strategy", 1);
        model.set_option("random_seed", 1);
        model.set_option("threads", 1);

        let solved = model.solve();
        let status = solved.status();
        debug!("lp: {} cols, {} rows, status {status:?}", self.cols.len(), self.row_count);
        if status != HighsModelStatus::Optimal {
            return Err(LpFailure(status));
        }

        let solution = solved.get_solution();
        Ok(LpSolution {
            primal: solution.columns().to_vec(),
            activity: solution.rows().to_vec(),
            dual: solution.dual_rows().to_vec(),
        })
    }
}

/// Read-only view of an optimal basic solution.
#[derive(Debug, Clone)]
pub struct LpSolution {
    primal: Vec<f64>,
    activity: Vec<f64>,
    dual: Vec<f64>,
}

impl LpSolution {
    pub fn value(&self, var: Var) -> f64 {
        self.primal[var.0]
    }

    /// Value of the row's linear expression at the optimum.
    pub fn activity(&self, row: Row) -> f64 {
        self.activity[row.0]
    }

    /// Shadow price of the row. The sign depends on the objective sense and
    /// on which bound is active; a non-binding row's dual is zero.
    pub fn dual(&self, row: Row) -> f64 {
        self.dual[row.0]
    }
}

/// The backend stopped with a status other than `Optimal`.
#[derive(Debug, Clone, Copy)]
pub struct LpFailure(pub HighsModelStatus);

impl fmt::Display for LpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LP solve ended with status {:?}", self.0)
    }
}

impl std::error::Error for LpFailure {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximizes_over_a_bounded_polytope() {
        // max 2x + y  s.t.  x + y <= 3, x <= 2
        let mut lp = LinearProgram::maximize();
        let x = lp.add_var(2.0);
        let y = lp.add_var(1.0);
        lp.add_row(0.0, 3.0, &[(x, 1.0), (y, 1.0)]);
        lp.add_row(0.0, 2.0, &[(x, 1.0)]);

        let solution = lp.solve().unwrap();
        assert!((solution.value(x) - 2.0).abs() < 1e-6);
        assert!((solution.value(y) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn binding_rows_carry_nonzero_duals() {
        // max x + y  s.t.  x <= 5, y <= 2; both caps bind.
        let mut lp = LinearProgram::maximize();
        let x = lp.add_var(1.0);
        let y = lp.add_var(1.0);
        let x_cap = lp.add_row(0.0, 5.0, &[(x, 1.0)]);
        let y_cap = lp.add_row(0.0, 2.0, &[(y, 1.0)]);

        let solution = lp.solve().unwrap();
        assert!((solution.activity(x_cap) - 5.0).abs() < 1e-6);
        assert!(solution.dual(x_cap).abs() > 1e-6);
        assert!(solution.dual(y_cap).abs() > 1e-6);
    }

    #[test]
    fn reports_equality_row_activity() {
        // min x + y  s.t.  x + y = 1
        let mut lp = LinearProgram::minimize();
        let x = lp.add_var(1.0);
        let y = lp.add_var(1.0);
        let row = lp.add_row(1.0, 1.0, &[(x, 1.0), (y, 1.0)]);

        let solution = lp.solve().unwrap();
        assert!((solution.activity(row) - 1.0).abs() < 1e-6);
        assert!((solution.value(x) + solution.value(y) - 1.0).abs() < 1e-6);
    }
}
