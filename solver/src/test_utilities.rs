use std::sync::atomic::{AtomicUsize, Ordering};

use model::errors::Result;

use crate::lp::{HighsSolver, LpModel, LpSolution, LpSolver, LpStatus};

/// HiGHS for the first `optimal_solves` calls, afterwards every solve stops at a limit.
pub struct LimitedLpSolver {
    inner: HighsSolver,
    remaining: AtomicUsize,
}

impl LimitedLpSolver {
    pub fn new(optimal_solves: usize) -> LimitedLpSolver {
        LimitedLpSolver {
            inner: HighsSolver::default(),
            remaining: AtomicUsize::new(optimal_solves),
        }
    }
}

impl LpSolver for LimitedLpSolver {
    fn solve(&self, model: &LpModel) -> Result<LpSolution> {
        let granted = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if !granted {
            return Ok(LpSolution::with_status(LpStatus::LimitReached));
        }
        self.inner.solve(model)
    }
}
