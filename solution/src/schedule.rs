#[cfg(test)]
mod tests;

use std::collections::BTreeMap;

use model::base_types::{Cost, MaintenanceId, TripId, VehicleId};
use model::config::Config;
use model::instance::Instance;
use serde::Serialize;

use crate::vehicle_schedule::VehicleSchedule;

/// Cost of a schedule split into its components.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub vehicles: Cost,
    pub deadlegs: Cost,
    pub maintenance: Cost,
    pub unassigned_trips: Cost,
    pub unassigned_maintenances: Cost,
    pub total: Cost,
}

/// The merged result of all planning horizons.
///
/// Every mandatory trip and maintenance of the period is either performed by exactly one
/// vehicle or listed as unassigned.
#[derive(Debug, Clone, Default)]
pub struct Schedule {
    vehicles: BTreeMap<VehicleId, VehicleSchedule>,
    unassigned_trips: Vec<TripId>,
    unassigned_maintenances: Vec<MaintenanceId>,
    costs: CostBreakdown,
    proven_optimal: bool,
    horizons: usize,
}

// static functions
impl Schedule {
    pub fn empty() -> Schedule {
        Schedule {
            proven_optimal: true,
            ..Default::default()
        }
    }
}

// methods
impl Schedule {
    pub fn vehicles(&self) -> impl Iterator<Item = &VehicleSchedule> + '_ {
        self.vehicles.values()
    }

    pub fn vehicle_schedule(&self, vehicle: VehicleId) -> Option<&VehicleSchedule> {
        self.vehicles.get(&vehicle)
    }

    pub fn number_of_used_vehicles(&self) -> usize {
        self.vehicles.len()
    }

    pub fn unassigned_trips(&self) -> &[TripId] {
        &self.unassigned_trips
    }

    pub fn unassigned_maintenances(&self) -> &[MaintenanceId] {
        &self.unassigned_maintenances
    }

    pub fn costs(&self) -> CostBreakdown {
        self.costs
    }

    pub fn objective(&self) -> Cost {
        self.costs.total
    }

    /// true if every horizon was solved to proven optimality
    pub fn is_proven_optimal(&self) -> bool {
        self.proven_optimal
    }

    pub fn number_of_horizons(&self) -> usize {
        self.horizons
    }

    /// Number of vehicles performing the trip.
    pub fn times_covered(&self, trip: TripId) -> usize {
        self.vehicles
            .values()
            .flat_map(|v| v.trips())
            .filter(|t| *t == trip)
            .count()
    }

    pub fn times_maintenance_covered(&self, maintenance: MaintenanceId) -> usize {
        self.vehicles
            .values()
            .flat_map(|v| v.maintenances())
            .filter(|m| *m == maintenance)
            .count()
    }

    /// Merges the committed part of one horizon into the schedule. Idle parts are ignored.
    pub fn add_horizon(
        &mut self,
        parts: Vec<VehicleSchedule>,
        unassigned_trips: Vec<TripId>,
        unassigned_maintenances: Vec<MaintenanceId>,
        proven_optimal: bool,
        instance: &Instance,
        config: &Config,
    ) {
        for part in parts.into_iter().filter(|p| !p.is_idle()) {
            match self.vehicles.get_mut(&part.vehicle()) {
                Some(existing) => existing.append(part),
                None => {
                    self.vehicles.insert(part.vehicle(), part);
                }
            }
        }
        self.unassigned_trips.extend(unassigned_trips);
        self.unassigned_trips.sort();
        self.unassigned_maintenances.extend(unassigned_maintenances);
        self.unassigned_maintenances.sort();
        self.proven_optimal &= proven_optimal;
        self.horizons += 1;
        self.costs = self.compute_costs(instance, config);
    }

    /// Vehicle usage is charged once per vehicle over the whole period, and only if the number
    /// of vehicles is minimised.
    fn compute_costs(&self, instance: &Instance, config: &Config) -> CostBreakdown {
        let costs = &config.costs;
        let vehicles = if config.flags.minimise_vehicles {
            costs.vehicle_usage * self.vehicles.len() as Cost
        } else {
            0.0
        };
        let deadlegs: Cost = self.vehicles.values().map(|v| v.deadleg_cost()).sum();
        let maintenance: Cost = self
            .vehicles
            .values()
            .map(|v| v.maintenance_penalty())
            .sum();
        let unassigned_trips: Cost = self
            .unassigned_trips
            .iter()
            .filter(|t| instance.trip(**t).is_mandatory())
            .map(|_| costs.uncovered_trip)
            .sum();
        let unassigned_maintenances: Cost = self
            .unassigned_maintenances
            .iter()
            .filter(|m| instance.maintenance(**m).is_mandatory())
            .map(|_| costs.uncovered_maintenance)
            .sum();
        CostBreakdown {
            vehicles,
            deadlegs,
            maintenance,
            unassigned_trips,
            unassigned_maintenances,
            total: vehicles + deadlegs + maintenance + unassigned_trips + unassigned_maintenances,
        }
    }
}
