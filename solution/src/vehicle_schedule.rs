#[cfg(test)]
mod tests;

use model::base_types::{meter_to_km, Cost, Kwh, LocationId, MaintenanceId, Meter, TripId, VehicleId};
use model::errors::{Result, SchedulingError};
use model::network::nodes::{Activity, ActivityNode};
use model::network::{ActivityNetwork, VehicleStart};
use model::resource_state::ResourceState;
use time::DateTime;

use crate::column::Column;

/// One entry of a vehicle schedule. The state is the one after the stop was performed.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    activity: Activity,
    start_time: DateTime,
    end_time: DateTime,
    start_location: LocationId,
    end_location: LocationId,
    distance: Meter,
    energy_charged: Kwh,
    state: ResourceState,
}

impl Stop {
    fn new(node: &ActivityNode, end_time: DateTime, state: ResourceState) -> Stop {
        Stop {
            activity: node.activity(),
            start_time: node.start_time(),
            end_time,
            start_location: node.start_location(),
            end_location: node.end_location(),
            distance: 0,
            energy_charged: 0.0,
            state,
        }
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn start_time(&self) -> DateTime {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime {
        self.end_time
    }

    pub fn start_location(&self) -> LocationId {
        self.start_location
    }

    pub fn end_location(&self) -> LocationId {
        self.end_location
    }

    /// distance driven during the stop
    pub fn distance(&self) -> Meter {
        self.distance
    }

    pub fn energy_charged(&self) -> Kwh {
        self.energy_charged
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }
}

/// The committed activities of one vehicle, in chronological order, starting with a
/// [`Activity::Start`] stop. Deadlegs appear as stops of their own.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSchedule {
    vehicle: VehicleId,
    stops: Vec<Stop>,
    deadleg_cost: Cost,
    maintenance_penalty: Cost,
}

// static functions
impl VehicleSchedule {
    /// Replays the column in its network with the same state transitions the pricing used.
    /// Nodes starting at or after `cut` are dropped and a charging stop running over `cut` is
    /// trimmed, its energy is recomputed for the shortened duration.
    pub fn from_column(
        column: &Column,
        network: &ActivityNetwork,
        cut: Option<DateTime>,
    ) -> Result<VehicleSchedule> {
        let vehicle = network.vehicle_data();
        let config = network.config();
        let coefficient = config.costs.maintenance_penalty_coefficient;
        let infeasible = |node: &ActivityNode| {
            SchedulingError::logic(format!(
                "replaying the column of vehicle {} violates a resource bound at {}",
                vehicle.id(),
                node
            ))
        };

        let mut state = network.start_state();
        let start = network.node(network.start());
        let mut stops = vec![Stop::new(start, start.end_time(), state)];
        let mut deadleg_cost = 0.0;
        let mut maintenance_penalty = 0.0;

        for &arc_idx in column.arcs() {
            let arc = network.arc(arc_idx);
            let source = network.node(arc.source());
            let target = network.node(arc.target());
            if target.is_end() || cut.is_some_and(|cut| target.start_time() >= cut) {
                break;
            }
            maintenance_penalty += state.maintenance_penalty(arc, coefficient);

            if arc.deadleg_distance() > 0 {
                let departure = source.end_time();
                let arrival = departure + arc.deadleg_duration();
                let deadleg = ActivityNode::create_deadleg_node(
                    source.end_location(),
                    target.start_location(),
                    departure,
                    arrival,
                );
                state = state
                    .drive(arc.deadleg_distance(), vehicle)
                    .ok_or_else(|| infeasible(&deadleg))?;
                deadleg_cost += config.costs.deadleg_fix
                    + config.costs.deadleg_per_km * meter_to_km(arc.deadleg_distance());
                let mut stop = Stop::new(&deadleg, arrival, state);
                stop.distance = arc.deadleg_distance();
                stops.push(stop);
            }

            let mut end_time = target.end_time();
            let mut distance = 0;
            let mut energy_charged = 0.0;
            match target.activity() {
                Activity::Trip(_) => {
                    state = state
                        .drive(arc.activity_distance(), vehicle)
                        .ok_or_else(|| infeasible(target))?;
                    distance = arc.activity_distance();
                }
                Activity::Charging(slot) => {
                    let energy = match cut {
                        Some(cut) if cut < slot.end => {
                            let trimmed = slot.trimmed(cut);
                            end_time = trimmed.end;
                            let charging_time = trimmed
                                .duration()
                                .saturating_sub(config.durations.put_on_charge);
                            network
                                .instance()
                                .charger(slot.charger)
                                .energy_for(charging_time)
                                .min(arc.recharge())
                        }
                        _ => arc.recharge(),
                    };
                    let before = state.soc();
                    state = state.charge(energy, vehicle);
                    energy_charged = state.soc() - before;
                }
                Activity::Maintenance(_) => {
                    state = state.reset_maintenance();
                }
                _ => {}
            }
            let mut stop = Stop::new(target, end_time, state);
            stop.distance = distance;
            stop.energy_charged = energy_charged;
            stops.push(stop);
        }

        Ok(VehicleSchedule {
            vehicle: vehicle.id(),
            stops,
            deadleg_cost,
            maintenance_penalty,
        })
    }
}

// methods
impl VehicleSchedule {
    pub fn vehicle(&self) -> VehicleId {
        self.vehicle
    }

    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// true if nothing but the start stop was committed
    pub fn is_idle(&self) -> bool {
        self.stops.len() <= 1
    }

    pub fn trips(&self) -> impl Iterator<Item = TripId> + '_ {
        self.stops.iter().filter_map(|s| match s.activity {
            Activity::Trip(t) => Some(t),
            _ => None,
        })
    }

    pub fn maintenances(&self) -> impl Iterator<Item = MaintenanceId> + '_ {
        self.stops.iter().filter_map(|s| match s.activity {
            Activity::Maintenance(m) => Some(m),
            _ => None,
        })
    }

    pub fn deadleg_cost(&self) -> Cost {
        self.deadleg_cost
    }

    pub fn maintenance_penalty(&self) -> Cost {
        self.maintenance_penalty
    }

    pub fn distance(&self) -> Meter {
        self.stops.iter().map(|s| s.distance).sum()
    }

    pub fn deadleg_distance(&self) -> Meter {
        self.stops
            .iter()
            .filter(|s| s.activity == Activity::Deadleg)
            .map(|s| s.distance)
            .sum()
    }

    pub fn energy_charged(&self) -> Kwh {
        self.stops.iter().map(|s| s.energy_charged).sum()
    }

    /// Where the vehicle enters the next horizon if this part ends at `horizon_end`: location and
    /// state of the last stop, not before `horizon_end`. A part with activities puts the vehicle
    /// in service.
    pub fn carry_over(&self, horizon_end: DateTime) -> Option<VehicleStart> {
        self.stops.last().map(|last| VehicleStart {
            location: last.end_location,
            time: last.end_time.max(horizon_end),
            state: last.state,
            in_service: !self.is_idle(),
        })
    }

    /// Continues this schedule with the next horizon's part. The start stop of `other` repeats
    /// the last stop of `self` and is dropped.
    pub fn append(&mut self, other: VehicleSchedule) {
        self.stops
            .extend(other.stops.into_iter().filter(|s| s.activity != Activity::Start));
        self.deadleg_cost += other.deadleg_cost;
        self.maintenance_penalty += other.maintenance_penalty;
    }
}
