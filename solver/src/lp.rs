pub mod highs_solver;

#[cfg(test)]
mod tests;

use model::errors::Result;

pub use highs_solver::HighsSolver;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSense {
    /// sum <= rhs
    Le,
    /// sum == rhs
    Eq,
    /// sum >= rhs
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LpRow {
    pub sense: RowSense,
    pub rhs: f64,
}

/// A variable with its objective coefficient and its non-zero entries (row, coefficient).
#[derive(Debug, Clone, PartialEq)]
pub struct LpColumn {
    pub cost: f64,
    pub entries: Vec<(usize, f64)>,
}

/// min c^T x subject to the rows, x >= 0. Stored column-wise as columns are what column
/// generation adds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LpModel {
    rows: Vec<LpRow>,
    columns: Vec<LpColumn>,
}

impl LpModel {
    pub fn new() -> LpModel {
        LpModel::default()
    }

    pub fn add_row(&mut self, sense: RowSense, rhs: f64) -> usize {
        self.rows.push(LpRow { sense, rhs });
        self.rows.len() - 1
    }

    pub fn add_column(&mut self, cost: f64, entries: Vec<(usize, f64)>) -> usize {
        self.columns.push(LpColumn { cost, entries });
        self.columns.len() - 1
    }

    pub fn rows(&self) -> &[LpRow] {
        &self.rows
    }

    pub fn columns(&self) -> &[LpColumn] {
        &self.columns
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

/// Status of an LP solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LpStatus {
    Optimal,
    Infeasible,
    Unbounded,
    /// The backend stopped at a time or iteration limit before it could prove optimality.
    LimitReached,
}

/// Result of an LP solve. Values and duals are only meaningful for [`LpStatus::Optimal`].
///
/// The duals y satisfy: reduced cost of column j = c_j - sum_i y_i a_ij >= 0 at optimality, so
/// y_i <= 0 for `Le` rows and y_i >= 0 for `Ge` rows.
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    pub status: LpStatus,
    pub objective: f64,
    pub values: Vec<f64>,
    pub duals: Vec<f64>,
}

impl LpSolution {
    pub fn with_status(status: LpStatus) -> LpSolution {
        LpSolution {
            status,
            objective: f64::INFINITY,
            values: Vec::new(),
            duals: Vec::new(),
        }
    }
}

/// Checks primal feasibility, dual feasibility and a zero duality gap of `values` and `duals`
/// for `model`, within `tolerance` relative to the magnitude of the data.
pub fn is_optimal(model: &LpModel, values: &[f64], duals: &[f64], tolerance: f64) -> bool {
    if values.len() != model.num_columns() || duals.len() != model.num_rows() {
        return false;
    }
    if values.iter().any(|x| *x < -tolerance) {
        return false;
    }
    let mut activity = vec![0.0; model.num_rows()];
    for (column, x) in model.columns().iter().zip(values.iter()) {
        for (row, a) in column.entries.iter() {
            activity[*row] += a * x;
        }
    }
    let primal_feasible = model
        .rows()
        .iter()
        .zip(activity.iter())
        .all(|(row, lhs)| {
            let slack = tolerance * (1.0 + row.rhs.abs());
            match row.sense {
                RowSense::Le => *lhs <= row.rhs + slack,
                RowSense::Eq => (*lhs - row.rhs).abs() <= slack,
                RowSense::Ge => *lhs >= row.rhs - slack,
            }
        });
    let dual_signs = model.rows().iter().zip(duals.iter()).all(|(row, y)| {
        match row.sense {
            RowSense::Le => *y <= tolerance * (1.0 + y.abs()),
            RowSense::Eq => true,
            RowSense::Ge => *y >= -tolerance * (1.0 + y.abs()),
        }
    });
    let reduced_costs = model.columns().iter().all(|column| {
        let priced: f64 = column.entries.iter().map(|(i, a)| duals[*i] * a).sum();
        column.cost - priced >= -tolerance * (1.0 + column.cost.abs() + priced.abs())
    });
    let primal: f64 = model
        .columns()
        .iter()
        .zip(values.iter())
        .map(|(c, x)| c.cost * x)
        .sum();
    let dual: f64 = model
        .rows()
        .iter()
        .zip(duals.iter())
        .map(|(row, y)| row.rhs * y)
        .sum();
    let no_gap = (primal - dual).abs() <= tolerance * (1.0 + primal.abs());
    primal_feasible && dual_signs && reduced_costs && no_gap
}

/// Backend solving the master LP. Anything providing optimal primal values and row duals can
/// be plugged in.
pub trait LpSolver: Send + Sync {
    fn solve(&self, model: &LpModel) -> Result<LpSolution>;
}
