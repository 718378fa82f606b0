#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use model::base_types::{ChargerId, Cost, MaintenanceId, TripId, VehicleId, EPS};
use model::config::Config;
use model::errors::{Result, SchedulingError};
use model::instance::Instance;
use model::network::nodes::Activity;
use model::network::TimeWindow;
use solution::Column;
use tracing::{debug, warn};

use crate::branching::{BranchCandidate, BranchFix, BranchTarget, Fixes};
use crate::lp::{LpModel, LpSolver, LpStatus, RowSense};

/// A capacity checkpoint: charger and index k of the time `window.start + k * check interval`.
pub type Checkpoint = (ChargerId, usize);

/// Restricted master LP of one planning horizon.
///
/// Rows:
/// * per vehicle: sum of its columns <= 1
/// * per trip and maintenance of the window: sum of covering columns + slack = 1, the slack
///   costs the uncovered penalty if the activity is mandatory and nothing otherwise
/// * per violated charger checkpoint (added lazily): sum of occupying columns <= capacity
/// * per fix-to-one of the branching node: sum of the fixed vehicle's covering columns +
///   artificial = 1, the artificial costs `infeasible_fix`
///
/// Because of slacks and artificials the LP is always feasible. Fix-to-zero is enforced by
/// leaving out the columns that [`Fixes::admits`] rejects.
pub struct MasterProblem {
    instance: Arc<Instance>,
    config: Arc<Config>,
    window: TimeWindow,
    vehicles: Vec<VehicleId>,
    trips: Vec<TripId>,
    maintenances: Vec<MaintenanceId>,
    capacity_rows: BTreeSet<Checkpoint>,
    lp_solver: Arc<dyn LpSolver>,
}

/// Row duals of a master solve, in the convention of [`crate::lp::LpSolution`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Duals {
    vehicles: HashMap<VehicleId, f64>,
    trips: HashMap<TripId, f64>,
    maintenances: HashMap<MaintenanceId, f64>,
    checkpoints: HashMap<Checkpoint, f64>,
    fixes: Vec<(BranchFix, f64)>,
}

impl Duals {
    pub fn vehicle(&self, vehicle: VehicleId) -> f64 {
        self.vehicles.get(&vehicle).copied().unwrap_or(0.0)
    }

    pub fn trip(&self, trip: TripId) -> f64 {
        self.trips.get(&trip).copied().unwrap_or(0.0)
    }

    pub fn maintenance(&self, maintenance: MaintenanceId) -> f64 {
        self.maintenances.get(&maintenance).copied().unwrap_or(0.0)
    }

    pub fn checkpoint(&self, charger: ChargerId, k: usize) -> f64 {
        self.checkpoints.get(&(charger, k)).copied().unwrap_or(0.0)
    }

    /// Sum of the duals of the fix-to-one rows of `vehicle` that `activity` contributes to.
    pub fn fix(&self, vehicle: VehicleId, activity: &Activity) -> f64 {
        self.fixes
            .iter()
            .filter(|(fix, _)| fix.vehicle == vehicle && fix.target.matches(activity))
            .map(|(_, dual)| dual)
            .sum()
    }

    /// Sum of the duals of the fix-to-one rows that `column` has a coefficient in.
    pub fn fix_rows(&self, column: &Column) -> f64 {
        self.fixes
            .iter()
            .filter(|(fix, _)| fix.vehicle == column.vehicle() && fix.target.is_covered_by(column))
            .map(|(_, dual)| dual)
            .sum()
    }

    pub fn set_vehicle(&mut self, vehicle: VehicleId, dual: f64) {
        self.vehicles.insert(vehicle, dual);
    }

    pub fn set_trip(&mut self, trip: TripId, dual: f64) {
        self.trips.insert(trip, dual);
    }

    pub fn set_maintenance(&mut self, maintenance: MaintenanceId, dual: f64) {
        self.maintenances.insert(maintenance, dual);
    }

    pub fn set_checkpoint(&mut self, charger: ChargerId, k: usize, dual: f64) {
        self.checkpoints.insert((charger, k), dual);
    }

    pub fn add_fix(&mut self, fix: BranchFix, dual: f64) {
        self.fixes.push((fix, dual));
    }
}

/// Optimal solution of the restricted master of one branching node.
#[derive(Debug, Clone)]
pub struct MasterSolution {
    objective: Cost,
    columns: Vec<(Arc<Column>, f64)>,
    duals: Duals,
    uncovered_trips: Vec<(TripId, f64)>,
    uncovered_maintenances: Vec<(MaintenanceId, f64)>,
    artificial_usage: f64,
    lp_rows: usize,
    lp_columns: usize,
}

impl MasterSolution {
    pub fn objective(&self) -> Cost {
        self.objective
    }

    pub fn duals(&self) -> &Duals {
        &self.duals
    }

    /// Admitted columns with their LP values.
    pub fn columns(&self) -> &[(Arc<Column>, f64)] {
        &self.columns
    }

    /// Columns with a positive value.
    pub fn used_columns(&self) -> impl Iterator<Item = (&Arc<Column>, f64)> + '_ {
        self.columns
            .iter()
            .filter(|(_, x)| *x > EPS)
            .map(|(c, x)| (c, *x))
    }

    /// Columns at value one of an integral solution.
    pub fn selected_columns(&self) -> Vec<Arc<Column>> {
        self.columns
            .iter()
            .filter(|(_, x)| *x > 0.5)
            .map(|(c, _)| c.clone())
            .collect()
    }

    /// Sum of the artificial variables of the fix-to-one rows. Positive means the fixes of the
    /// node cannot be satisfied by the current columns.
    pub fn artificial_usage(&self) -> f64 {
        self.artificial_usage
    }

    pub fn uses_artificials(&self) -> bool {
        self.artificial_usage > EPS
    }

    pub fn is_integral(&self) -> bool {
        self.columns
            .iter()
            .all(|(_, x)| *x < EPS || *x > 1.0 - EPS)
    }

    /// Trips whose coverage slack is at one.
    pub fn uncovered_trips(&self) -> Vec<TripId> {
        self.uncovered_trips
            .iter()
            .filter(|(_, s)| *s > 0.5)
            .map(|(t, _)| *t)
            .collect()
    }

    pub fn uncovered_maintenances(&self) -> Vec<MaintenanceId> {
        self.uncovered_maintenances
            .iter()
            .filter(|(_, s)| *s > 0.5)
            .map(|(m, _)| *m)
            .collect()
    }

    pub fn lp_rows(&self) -> usize {
        self.lp_rows
    }

    pub fn lp_columns(&self) -> usize {
        self.lp_columns
    }

    /// Fractional (vehicle, trip) and (vehicle, maintenance) aggregates. Only if there are
    /// none, fractional (vehicle, charging slot) aggregates.
    pub fn candidates(&self) -> Vec<BranchCandidate> {
        let mut activities: BTreeMap<(VehicleId, BranchTarget), f64> = BTreeMap::new();
        let mut charging: BTreeMap<(VehicleId, BranchTarget), f64> = BTreeMap::new();
        for (column, x) in self.used_columns() {
            let vehicle = column.vehicle();
            for trip in column.trips() {
                *activities
                    .entry((vehicle, BranchTarget::Trip(*trip)))
                    .or_default() += x;
            }
            for maintenance in column.maintenances() {
                *activities
                    .entry((vehicle, BranchTarget::Maintenance(*maintenance)))
                    .or_default() += x;
            }
            for slot in column.charging_slots() {
                *charging
                    .entry((vehicle, BranchTarget::Charging(*slot)))
                    .or_default() += x;
            }
        }
        let fractional = |aggregates: BTreeMap<(VehicleId, BranchTarget), f64>| {
            aggregates
                .into_iter()
                .filter(|(_, value)| *value > EPS && *value < 1.0 - EPS)
                .map(|((vehicle, target), value)| BranchCandidate {
                    vehicle,
                    target,
                    value,
                })
                .collect::<Vec<_>>()
        };
        let candidates = fractional(activities);
        if candidates.is_empty() {
            fractional(charging)
        } else {
            candidates
        }
    }
}

// static functions
impl MasterProblem {
    pub fn new(
        instance: Arc<Instance>,
        config: Arc<Config>,
        window: TimeWindow,
        vehicles: Vec<VehicleId>,
        trips: Vec<TripId>,
        maintenances: Vec<MaintenanceId>,
        lp_solver: Arc<dyn LpSolver>,
    ) -> MasterProblem {
        MasterProblem {
            instance,
            config,
            window,
            vehicles,
            trips,
            maintenances,
            capacity_rows: BTreeSet::new(),
            lp_solver,
        }
    }
}

// methods
impl MasterProblem {
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn vehicles(&self) -> &[VehicleId] {
        &self.vehicles
    }

    pub fn trips(&self) -> &[TripId] {
        &self.trips
    }

    pub fn maintenances(&self) -> &[MaintenanceId] {
        &self.maintenances
    }

    pub fn capacity_rows(&self) -> impl Iterator<Item = &Checkpoint> + '_ {
        self.capacity_rows.iter()
    }

    /// Activates capacity rows, returns how many were new.
    pub fn add_capacity_rows(&mut self, checkpoints: &[Checkpoint]) -> usize {
        checkpoints
            .iter()
            .filter(|c| self.capacity_rows.insert(**c))
            .count()
    }

    /// Reduced cost of `column` in the master these duals belong to.
    pub fn reduced_cost(&self, column: &Column, duals: &Duals) -> f64 {
        let interval = self.config.durations.charger_capacity_check;
        let trips: f64 = column.trips().iter().map(|t| duals.trip(*t)).sum();
        let maintenances: f64 = column
            .maintenances()
            .iter()
            .map(|m| duals.maintenance(*m))
            .sum();
        let checkpoints: f64 = column
            .occupied_checkpoints(self.window.start, interval)
            .iter()
            .map(|(charger, k)| duals.checkpoint(*charger, *k))
            .sum();
        column.cost()
            - duals.vehicle(column.vehicle())
            - trips
            - maintenances
            - checkpoints
            - duals.fix_rows(column)
    }

    /// Objective of the solution covering nothing: every mandatory trip and maintenance of the
    /// window is paid as uncovered.
    pub fn slack_objective(&self) -> Cost {
        let costs = &self.config.costs;
        self.trips
            .iter()
            .filter(|t| self.instance.trip(**t).is_mandatory())
            .count() as f64
            * costs.uncovered_trip
            + self
                .maintenances
                .iter()
                .filter(|m| self.instance.maintenance(**m).is_mandatory())
                .count() as f64
                * costs.uncovered_maintenance
    }

    /// Checkpoints where the occupancy of the solution exceeds the charger capacity. Already
    /// active rows can not be violated and are not reported.
    pub fn capacity_violations(&self, solution: &MasterSolution) -> Vec<Checkpoint> {
        self.occupancy(solution.used_columns())
            .into_iter()
            .filter(|(checkpoint, occupancy)| {
                *occupancy > self.instance.charger(checkpoint.0).capacity() as f64 + EPS
                    && !self.capacity_rows.contains(checkpoint)
            })
            .map(|(checkpoint, _)| checkpoint)
            .collect()
    }

    /// Whether the given columns, each used once, respect all charger capacities.
    pub fn respects_capacities(&self, columns: &[Arc<Column>]) -> bool {
        self.occupancy(columns.iter().map(|c| (c, 1.0)))
            .into_iter()
            .all(|(checkpoint, occupancy)| {
                occupancy <= self.instance.charger(checkpoint.0).capacity() as f64 + EPS
            })
    }

    fn occupancy<'a>(
        &self,
        columns: impl Iterator<Item = (&'a Arc<Column>, f64)>,
    ) -> BTreeMap<Checkpoint, f64> {
        let interval = self.config.durations.charger_capacity_check;
        let mut occupancy: BTreeMap<Checkpoint, f64> = BTreeMap::new();
        for (column, x) in columns {
            for checkpoint in column.occupied_checkpoints(self.window.start, interval) {
                *occupancy.entry(checkpoint).or_default() += x;
            }
        }
        occupancy
    }

    /// Solves the LP over the columns admitted by `fixes`. `None` if the LP solver stopped at
    /// one of its limits before proving optimality.
    pub fn solve(
        &self,
        columns: &[Arc<Column>],
        fixes: &Fixes,
    ) -> Result<Option<MasterSolution>> {
        let costs = &self.config.costs;
        let interval = self.config.durations.charger_capacity_check;
        let mut model = LpModel::new();

        let vehicle_rows: HashMap<VehicleId, usize> = self
            .vehicles
            .iter()
            .map(|v| (*v, model.add_row(RowSense::Le, 1.0)))
            .collect();
        let trip_rows: HashMap<TripId, usize> = self
            .trips
            .iter()
            .map(|t| (*t, model.add_row(RowSense::Eq, 1.0)))
            .collect();
        let maintenance_rows: HashMap<MaintenanceId, usize> = self
            .maintenances
            .iter()
            .map(|m| (*m, model.add_row(RowSense::Eq, 1.0)))
            .collect();
        let capacity_rows: HashMap<Checkpoint, usize> = self
            .capacity_rows
            .iter()
            .map(|c| {
                let capacity = self.instance.charger(c.0).capacity() as f64;
                (*c, model.add_row(RowSense::Le, capacity))
            })
            .collect();
        let fix_rows: Vec<(BranchFix, usize)> = fixes
            .fixed_to_one()
            .map(|fix| (*fix, model.add_row(RowSense::Eq, 1.0)))
            .collect();

        let admitted: Vec<Arc<Column>> = columns
            .iter()
            .filter(|c| vehicle_rows.contains_key(&c.vehicle()) && fixes.admits(c))
            .cloned()
            .collect();
        for column in admitted.iter() {
            let mut entries = vec![(vehicle_rows[&column.vehicle()], 1.0)];
            entries.extend(
                column
                    .trips()
                    .iter()
                    .filter_map(|t| trip_rows.get(t))
                    .map(|r| (*r, 1.0)),
            );
            entries.extend(
                column
                    .maintenances()
                    .iter()
                    .filter_map(|m| maintenance_rows.get(m))
                    .map(|r| (*r, 1.0)),
            );
            entries.extend(
                column
                    .occupied_checkpoints(self.window.start, interval)
                    .iter()
                    .filter_map(|c| capacity_rows.get(c))
                    .map(|r| (*r, 1.0)),
            );
            entries.extend(
                fix_rows
                    .iter()
                    .filter(|(fix, _)| {
                        fix.vehicle == column.vehicle() && fix.target.is_covered_by(column)
                    })
                    .map(|(_, r)| (*r, 1.0)),
            );
            model.add_column(column.cost(), entries);
        }

        let first_slack = model.num_columns();
        for trip in self.trips.iter() {
            let cost = if self.instance.trip(*trip).is_mandatory() {
                costs.uncovered_trip
            } else {
                0.0
            };
            model.add_column(cost, vec![(trip_rows[trip], 1.0)]);
        }
        for maintenance in self.maintenances.iter() {
            let cost = if self.instance.maintenance(*maintenance).is_mandatory() {
                costs.uncovered_maintenance
            } else {
                0.0
            };
            model.add_column(cost, vec![(maintenance_rows[maintenance], 1.0)]);
        }
        let first_artificial = model.num_columns();
        for (_, row) in fix_rows.iter() {
            model.add_column(costs.infeasible_fix, vec![(*row, 1.0)]);
        }

        let lp = self.lp_solver.solve(&model)?;
        if lp.status == LpStatus::LimitReached {
            warn!(
                "master LP stopped at a solver limit ({} rows, {} columns)",
                model.num_rows(),
                model.num_columns()
            );
            return Ok(None);
        }
        if lp.status != LpStatus::Optimal {
            return Err(SchedulingError::logic(format!(
                "master LP ended with status {:?} ({} rows, {} columns)",
                lp.status,
                model.num_rows(),
                model.num_columns()
            )));
        }
        if lp.values.len() != model.num_columns() || lp.duals.len() != model.num_rows() {
            return Err(SchedulingError::logic(
                "master LP solution does not match the model dimensions",
            ));
        }

        let mut duals = Duals::default();
        for (v, r) in vehicle_rows.iter() {
            duals.set_vehicle(*v, lp.duals[*r]);
        }
        for (t, r) in trip_rows.iter() {
            duals.set_trip(*t, lp.duals[*r]);
        }
        for (m, r) in maintenance_rows.iter() {
            duals.set_maintenance(*m, lp.duals[*r]);
        }
        for (c, r) in capacity_rows.iter() {
            duals.set_checkpoint(c.0, c.1, lp.duals[*r]);
        }
        for (fix, r) in fix_rows.iter() {
            duals.add_fix(*fix, lp.duals[*r]);
        }

        let mut slacks = lp.values[first_slack..first_artificial].iter();
        let uncovered_trips = self
            .trips
            .iter()
            .zip(slacks.by_ref())
            .map(|(t, s)| (*t, *s))
            .collect();
        let uncovered_maintenances = self
            .maintenances
            .iter()
            .zip(slacks)
            .map(|(m, s)| (*m, *s))
            .collect();
        let artificial_usage = lp.values[first_artificial..].iter().sum();

        debug!(
            "master LP: objective {:.3}, {} rows, {} columns ({} admitted)",
            lp.objective,
            model.num_rows(),
            model.num_columns(),
            admitted.len()
        );

        Ok(Some(MasterSolution {
            objective: lp.objective,
            columns: admitted
                .into_iter()
                .zip(lp.values.iter().copied())
                .collect(),
            duals,
            uncovered_trips,
            uncovered_maintenances,
            artificial_usage,
            lp_rows: model.num_rows(),
            lp_columns: model.num_columns(),
        }))
    }
}
