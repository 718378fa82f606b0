use good_lp::solvers::highs::highs;
use good_lp::solvers::{DualValues, SolutionWithDual};
use good_lp::{
    constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel,
    Variable,
};
use model::errors::{Result, SchedulingError};
use tracing::{debug, warn};

use super::{is_optimal, LpModel, LpSolution, LpSolver, LpStatus, RowSense};

/// The HiGHS dual simplex, driven through `good_lp`.
///
/// Every row is handed to HiGHS as `<=` or `==`. `Ge` rows are negated on the way in and their
/// duals on the way out. The returned solution is checked for primal and dual feasibility and a
/// zero duality gap. Row duals are oriented so that this check holds, a solution failing it in
/// both orientations is reported as [`LpStatus::LimitReached`].
#[derive(Debug, Clone)]
pub struct HighsSolver {
    time_limit: Option<f64>,
    tolerance: f64,
}

impl Default for HighsSolver {
    fn default() -> Self {
        HighsSolver {
            time_limit: None,
            tolerance: 1e-6,
        }
    }
}

impl HighsSolver {
    /// Wall clock limit per LP solve in seconds.
    pub fn with_time_limit(self, seconds: f64) -> HighsSolver {
        HighsSolver {
            time_limit: Some(seconds),
            ..self
        }
    }

    pub fn with_tolerance(self, tolerance: f64) -> HighsSolver {
        HighsSolver { tolerance, ..self }
    }
}

impl LpSolver for HighsSolver {
    fn solve(&self, model: &LpModel) -> Result<LpSolution> {
        if model.num_columns() == 0 {
            return Ok(solve_without_columns(model));
        }

        let mut variables = ProblemVariables::new();
        let xs: Vec<Variable> = model
            .columns()
            .iter()
            .map(|_| variables.add(variable().min(0.0)))
            .collect();
        let objective = model
            .columns()
            .iter()
            .zip(xs.iter())
            .fold(Expression::from(0.0), |acc, (column, x)| {
                acc + column.cost * *x
            });

        let mut lhs: Vec<Expression> = vec![Expression::from(0.0); model.num_rows()];
        for (column, x) in model.columns().iter().zip(xs.iter()) {
            for (row, a) in column.entries.iter() {
                lhs[*row] += *a * *x;
            }
        }

        let mut problem = variables.minimise(objective).using(highs);
        problem.set_verbose(false);
        if let Some(seconds) = self.time_limit {
            problem = problem.set_time_limit(seconds);
        }
        let references: Vec<_> = model
            .rows()
            .iter()
            .zip(lhs)
            .map(|(row, lhs)| {
                let rhs = Expression::from(row.rhs);
                problem.add_constraint(match row.sense {
                    RowSense::Le => constraint::leq(lhs, rhs),
                    RowSense::Eq => constraint::eq(lhs, rhs),
                    RowSense::Ge => constraint::leq(-lhs, -rhs),
                })
            })
            .collect();

        let mut solution = match problem.solve() {
            Ok(solution) => solution,
            Err(ResolutionError::Infeasible) => {
                return Ok(LpSolution::with_status(LpStatus::Infeasible))
            }
            Err(ResolutionError::Unbounded) => {
                return Ok(LpSolution::with_status(LpStatus::Unbounded))
            }
            Err(error) => {
                return Err(SchedulingError::logic(format!("HiGHS failed: {}", error)));
            }
        };

        let values: Vec<f64> = xs.iter().map(|x| solution.value(*x).max(0.0)).collect();
        let dual_values = solution.compute_dual();
        let mut duals: Vec<f64> = model
            .rows()
            .iter()
            .zip(references)
            .map(|(row, reference)| match row.sense {
                RowSense::Ge => -dual_values.dual(reference),
                RowSense::Le | RowSense::Eq => dual_values.dual(reference),
            })
            .collect();

        if !is_optimal(model, &values, &duals, self.tolerance) {
            let flipped: Vec<f64> = duals.iter().map(|y| -y).collect();
            if !is_optimal(model, &values, &flipped, self.tolerance) {
                warn!(
                    "HiGHS returned a solution without optimality certificate ({} rows, {} columns)",
                    model.num_rows(),
                    model.num_columns()
                );
                return Ok(LpSolution::with_status(LpStatus::LimitReached));
            }
            duals = flipped;
        }

        let objective: f64 = model
            .columns()
            .iter()
            .zip(values.iter())
            .map(|(c, x)| c.cost * x)
            .sum();
        debug!(
            "HiGHS: objective {:.3} with {} rows and {} columns",
            objective,
            model.num_rows(),
            model.num_columns()
        );
        Ok(LpSolution {
            status: LpStatus::Optimal,
            objective,
            values,
            duals,
        })
    }
}

/// Only the zero vector is a candidate. Its duals are all zero.
fn solve_without_columns(model: &LpModel) -> LpSolution {
    let feasible = model.rows().iter().all(|row| match row.sense {
        RowSense::Le => row.rhs >= 0.0,
        RowSense::Eq => row.rhs == 0.0,
        RowSense::Ge => row.rhs <= 0.0,
    });
    if !feasible {
        return LpSolution::with_status(LpStatus::Infeasible);
    }
    LpSolution {
        status: LpStatus::Optimal,
        objective: 0.0,
        values: Vec::new(),
        duals: vec![0.0; model.num_rows()],
    }
}
