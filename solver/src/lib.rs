pub mod branch_and_bound;
pub mod branching;
pub mod column_generation;
pub mod column_pool;
pub mod horizon_scheduler;
pub mod lp;
pub mod master_problem;
pub mod pricing;

#[cfg(test)]
mod test_utilities;
#[cfg(test)]
mod tests;

pub use branch_and_bound::{BranchAndPrice, TreeOutcome};
pub use branching::{BranchingStrategy, Lookahead, MostFractional, PseudoCost, StrongBranching};
pub use horizon_scheduler::HorizonScheduler;
pub use lp::{HighsSolver, LpSolver};

use std::time::Instant;

use model::errors::Result;
use model::json_serialisation::load_instance_from_json;
use solution::json_serialisation::{schedule_to_json, statistics_to_json};
use solution::statistics::StatisticsRecorder;
use time::DateTime;
use tracing::info;

/// Reads an instance, schedules the period with the default LP solver and branching strategy
/// and returns the schedule together with the run statistics.
pub fn solve_instance(
    input_data: serde_json::Value,
    period_start: DateTime,
    period_end: DateTime,
) -> Result<serde_json::Value> {
    let start_time = Instant::now();
    let (instance, config) = load_instance_from_json(input_data)?;
    info!(
        "instance loaded: {} vehicles, {} chargers, {} trips, {} maintenances",
        instance.vehicles().len(),
        instance.chargers().len(),
        instance.trips().len(),
        instance.maintenances().len()
    );

    let mut recorder = StatisticsRecorder::new();
    let schedule =
        HorizonScheduler::new(instance.clone(), config).run(period_start, period_end, &mut recorder)?;
    info!(
        "running time: {:0.2}sec",
        start_time.elapsed().as_secs_f32()
    );

    Ok(serde_json::json!({
        "objectiveValue": schedule.objective(),
        "schedule": schedule_to_json(&schedule, &instance)?,
        "statistics": statistics_to_json(recorder.statistics())?,
    }))
}
