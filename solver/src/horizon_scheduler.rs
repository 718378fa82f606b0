
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use model::base_types::{MaintenanceId, TripId};
use model::config::Config;
use model::errors::{Result, SchedulingError};
use model::instance::Instance;
use model::network::{ActivityNetwork, TimeWindow, VehicleStart};
use rayon::prelude::*;
use solution::statistics::{PlanningHorizonSummary, StatisticsRecorder};
use solution::{Schedule, VehicleSchedule};
use time::{DateTime, Duration};
use tracing::{info, warn};

use crate::branch_and_bound::BranchAndPrice;
use crate::branching::{BranchingStrategy, MostFractional, StrongBranching};
use crate::lp::{HighsSolver, LpSolver};
use crate::master_problem::MasterProblem;

/// One step of the rolling horizon. Activities starting in [start, end) are owned by the
/// horizon, the networks see everything starting before `window_end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanningHorizon {
    pub idx: usize,
    pub start: DateTime,
    pub end: DateTime,
    pub window_end: DateTime,
}

/// The committed part of one horizon.
#[derive(Debug, Clone)]
pub struct HorizonOutcome {
    pub parts: Vec<VehicleSchedule>,
    /// where every vehicle enters the next horizon, in vehicle order
    pub next_starts: Vec<VehicleStart>,
    pub unassigned_trips: Vec<TripId>,
    pub unassigned_maintenances: Vec<MaintenanceId>,
    pub proven_optimal: bool,
}

/// Splits the planning period into horizons, solves each one with branch-and-price and stitches
/// the committed parts into one schedule.
pub struct HorizonScheduler {
    instance: Arc<Instance>,
    config: Arc<Config>,
    lp_solver: Arc<dyn LpSolver>,
    strategy: Arc<dyn BranchingStrategy>,
}

// static functions
impl HorizonScheduler {
    /// HiGHS as LP solver, limited per solve to the column generation time limit. Branches on
    /// the most fractional candidate, or by strong branching if the configuration asks for it.
    pub fn new(instance: Arc<Instance>, config: Arc<Config>) -> HorizonScheduler {
        let budgets = &config.budgets;
        let strategy: Arc<dyn BranchingStrategy> = if config.flags.strong_branching {
            Arc::new(StrongBranching::new(
                budgets.strong_branching_first_tier,
                budgets.strong_branching_second_tier,
            ))
        } else {
            Arc::new(MostFractional)
        };
        let lp_solver = match budgets.column_generation_time_limit {
            Duration::Length(seconds) => HighsSolver::default().with_time_limit(seconds as f64),
            Duration::Infinity => HighsSolver::default(),
        };
        HorizonScheduler {
            instance,
            config,
            lp_solver: Arc::new(lp_solver),
            strategy,
        }
    }

    pub fn with_lp_solver(self, lp_solver: Arc<dyn LpSolver>) -> HorizonScheduler {
        HorizonScheduler { lp_solver, ..self }
    }

    pub fn with_branching_strategy(self, strategy: Arc<dyn BranchingStrategy>) -> HorizonScheduler {
        HorizonScheduler { strategy, ..self }
    }
}

// methods
impl HorizonScheduler {
    pub fn run(
        &self,
        period_start: DateTime,
        period_end: DateTime,
        recorder: &mut StatisticsRecorder,
    ) -> Result<Schedule> {
        let horizons = self.planning_horizons(period_start, period_end)?;
        info!(
            "scheduling {} vehicles from {} to {} in {} horizons",
            self.instance.vehicles().len(),
            period_start,
            period_end,
            horizons.len()
        );

        let mut schedule = Schedule::empty();
        let mut starts = self.initial_starts(period_start);
        for horizon in horizons.iter() {
            let outcome = self.solve_horizon(horizon, &starts, recorder)?;
            starts = outcome.next_starts;
            schedule.add_horizon(
                outcome.parts,
                outcome.unassigned_trips,
                outcome.unassigned_maintenances,
                outcome.proven_optimal,
                &self.instance,
                &self.config,
            );
        }

        info!(
            "schedule finished: {} vehicles used, objective {:.3}, {} trips unassigned",
            schedule.number_of_used_vehicles(),
            schedule.objective(),
            schedule.unassigned_trips().len()
        );
        if !schedule.is_proven_optimal() {
            warn!("at least one horizon was not solved to proven optimality");
        }
        recorder.record_schedule(&schedule);
        Ok(schedule)
    }

    /// Horizons [s, min(s + length, end)) covering the period, each window reaching
    /// min(horizon end + overlap, end).
    pub fn planning_horizons(
        &self,
        period_start: DateTime,
        period_end: DateTime,
    ) -> Result<Vec<PlanningHorizon>> {
        if period_end <= period_start {
            return Err(SchedulingError::data(format!(
                "planning period from {} to {} is empty",
                period_start, period_end
            )));
        }
        let length = self.config.horizon.length;
        if length.is_zero() {
            return Err(SchedulingError::data("planning horizon length is zero"));
        }

        let mut horizons = Vec::new();
        let mut start = period_start;
        while start < period_end {
            let end = (start + length).min(period_end);
            horizons.push(PlanningHorizon {
                idx: horizons.len(),
                start,
                end,
                window_end: (end + self.config.horizon.overlap).min(period_end),
            });
            start = end;
        }
        Ok(horizons)
    }

    pub fn initial_starts(&self, period_start: DateTime) -> Vec<VehicleStart> {
        self.instance
            .vehicles()
            .iter()
            .map(|v| VehicleStart {
                location: v.start_location(),
                time: v.available_from().max(period_start),
                state: v.initial_state(),
                in_service: false,
            })
            .collect()
    }

    /// Solves one horizon from the given vehicle starts and commits everything starting before
    /// the horizon end. A summary of the horizon is recorded.
    pub fn solve_horizon(
        &self,
        horizon: &PlanningHorizon,
        starts: &[VehicleStart],
        recorder: &mut StatisticsRecorder,
    ) -> Result<HorizonOutcome> {
        if starts.len() != self.instance.vehicles().len() {
            return Err(SchedulingError::logic(format!(
                "{} vehicle starts given for {} vehicles",
                starts.len(),
                self.instance.vehicles().len()
            )));
        }
        let window = TimeWindow {
            start: horizon.start,
            end: horizon.window_end,
        };
        info!(
            "horizon {}: [{}, {}), window until {}",
            horizon.idx, horizon.start, horizon.end, horizon.window_end
        );

        let network_start = Instant::now();
        let networks = self
            .instance
            .vehicles()
            .par_iter()
            .zip(starts.par_iter())
            .map(|(vehicle, start)| {
                let start = VehicleStart {
                    time: start.time.max(horizon.start),
                    ..*start
                };
                ActivityNetwork::new(
                    self.instance.clone(),
                    self.config.clone(),
                    vehicle.id(),
                    start,
                    window,
                )
                .map(Arc::new)
            })
            .collect::<Result<Vec<_>>>()?;
        let network_time = network_start.elapsed().as_secs_f64();
        info!(
            "horizon {}: {} networks built with {} nodes and {} arcs in {:.3}s",
            horizon.idx,
            networks.len(),
            networks.iter().map(|n| n.num_nodes()).sum::<usize>(),
            networks.iter().map(|n| n.num_arcs()).sum::<usize>(),
            network_time
        );

        let starts_in_window = |time: DateTime| time >= window.start && time < window.end;
        let master = MasterProblem::new(
            self.instance.clone(),
            self.config.clone(),
            window,
            self.instance.vehicles().iter().map(|v| v.id()).collect(),
            self.instance
                .trips()
                .iter()
                .filter(|t| starts_in_window(t.departure()))
                .map(|t| t.id())
                .collect(),
            self.instance
                .maintenances()
                .iter()
                .filter(|m| starts_in_window(m.start()))
                .map(|m| m.id())
                .collect(),
            self.lp_solver.clone(),
        );

        let solve_start = Instant::now();
        let mut tree = BranchAndPrice::new(
            self.instance.clone(),
            self.config.clone(),
            networks.clone(),
            master,
            self.strategy.clone(),
            horizon.idx,
        );
        let outcome = tree.solve(recorder)?;
        let solve_time = solve_start.elapsed().as_secs_f64();

        // commit
        let mut parts = Vec::with_capacity(outcome.incumbent.columns.len());
        for column in outcome.incumbent.columns.iter() {
            let network = networks
                .iter()
                .find(|n| n.vehicle() == column.vehicle())
                .ok_or_else(|| {
                    SchedulingError::logic(format!(
                        "no network for the column of vehicle {}",
                        column.vehicle()
                    ))
                })?;
            parts.push(VehicleSchedule::from_column(
                column,
                network,
                Some(horizon.end),
            )?);
        }

        let next_starts = starts
            .iter()
            .zip(self.instance.vehicles())
            .map(|(start, vehicle)| {
                parts
                    .iter()
                    .find(|p| p.vehicle() == vehicle.id())
                    .and_then(|p| p.carry_over(horizon.end))
                    .map(|next| VehicleStart {
                        in_service: start.in_service || next.in_service,
                        ..next
                    })
                    .unwrap_or(VehicleStart {
                        time: start.time.max(horizon.end),
                        ..*start
                    })
            })
            .collect();

        let owned = |time: DateTime| time >= horizon.start && time < horizon.end;
        let covered_trips: HashSet<TripId> = parts.iter().flat_map(|p| p.trips()).collect();
        let covered_maintenances: HashSet<MaintenanceId> =
            parts.iter().flat_map(|p| p.maintenances()).collect();
        let unassigned_trips: Vec<TripId> = self
            .instance
            .trips()
            .iter()
            .filter(|t| t.is_mandatory() && owned(t.departure()))
            .map(|t| t.id())
            .filter(|t| !covered_trips.contains(t))
            .collect();
        let unassigned_maintenances: Vec<MaintenanceId> = self
            .instance
            .maintenances()
            .iter()
            .filter(|m| m.is_mandatory() && owned(m.start()))
            .map(|m| m.id())
            .filter(|m| !covered_maintenances.contains(m))
            .collect();

        let upper_bound = outcome.incumbent.objective;
        let gap = outcome
            .lower_bound
            .map(|lb| (upper_bound - lb).max(0.0) / upper_bound.abs().max(1.0));
        let vehicles_selected = parts.iter().filter(|p| !p.is_idle()).count();
        info!(
            "horizon {}: {} committed with {} vehicles, {} trips and {} maintenances unassigned",
            horizon.idx,
            if outcome.proven_optimal {
                "optimum"
            } else {
                "best known solution"
            },
            vehicles_selected,
            unassigned_trips.len(),
            unassigned_maintenances.len()
        );
        recorder.record_horizon(PlanningHorizonSummary {
            horizon: horizon.idx,
            start: horizon.start,
            end: horizon.end,
            window_end: horizon.window_end,
            lower_bound: outcome.lower_bound,
            upper_bound: Some(upper_bound),
            gap,
            schedules_generated: outcome.columns_generated,
            unassigned_trips: unassigned_trips.clone(),
            unassigned_maintenances: unassigned_maintenances.clone(),
            vehicles_selected,
            network_time,
            solve_time,
            tree_depth: outcome.tree_depth,
            tree_size: outcome.tree_size,
            algorithm: outcome.algorithm.to_string(),
            proven_optimal: outcome.proven_optimal,
        });

        Ok(HorizonOutcome {
            parts,
            next_starts,
            unassigned_trips,
            unassigned_maintenances,
            proven_optimal: outcome.proven_optimal,
        })
    }
}
