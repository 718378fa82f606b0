
use serde::Serialize;

use crate::base_types::{meter_to_km, Cost, Kwh, Meter, EPS};
use crate::network::arcs::ActivityArc;
use crate::vehicles::Vehicle;

/// Battery and distance counters of a vehicle at a point in time.
/// Invariant along every feasible path:
/// * battery_reserve <= soc <= battery_capacity
/// * distance_since_maintenance <= max_distance_between_maintenance
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceState {
    soc: Kwh,
    odometer: Meter,
    distance_since_maintenance: Meter,
}

impl ResourceState {
    pub fn new(soc: Kwh, odometer: Meter, distance_since_maintenance: Meter) -> ResourceState {
        ResourceState {
            soc,
            odometer,
            distance_since_maintenance,
        }
    }

    pub fn soc(&self) -> Kwh {
        self.soc
    }

    pub fn odometer(&self) -> Meter {
        self.odometer
    }

    pub fn distance_since_maintenance(&self) -> Meter {
        self.distance_since_maintenance
    }

    /// Applies the arc to the state: deadleg, then the target activity. Returns None if a
    /// bound is violated on the way.
    pub fn apply(&self, arc: &ActivityArc, vehicle: &Vehicle) -> Option<ResourceState> {
        let after_deadleg = self.drive(arc.deadleg_distance(), vehicle)?;
        let after_activity = after_deadleg.drive(arc.activity_distance(), vehicle)?;
        let charged = after_activity.charge(arc.recharge(), vehicle);
        if arc.resets_maintenance() {
            Some(charged.reset_maintenance())
        } else {
            Some(charged)
        }
    }

    pub fn drive(&self, distance: Meter, vehicle: &Vehicle) -> Option<ResourceState> {
        let soc = self.soc - vehicle.discharge(distance);
        let distance_since_maintenance = self.distance_since_maintenance + distance;
        if soc < vehicle.battery_reserve() - EPS
            || distance_since_maintenance > vehicle.max_distance_between_maintenance()
        {
            return None;
        }
        Some(ResourceState {
            soc,
            odometer: self.odometer + distance,
            distance_since_maintenance,
        })
    }

    /// Charges at most `energy`, bounded by the battery capacity.
    pub fn charge(&self, energy: Kwh, vehicle: &Vehicle) -> ResourceState {
        let headroom = (vehicle.battery_capacity() - self.soc).max(0.0);
        ResourceState {
            soc: self.soc + energy.max(0.0).min(headroom),
            ..*self
        }
    }

    pub fn reset_maintenance(&self) -> ResourceState {
        ResourceState {
            distance_since_maintenance: 0,
            ..*self
        }
    }

    /// Increase of 0.5 * coefficient * d^2 (d in km since the last maintenance) caused by driving
    /// the arc.
    pub fn maintenance_penalty(&self, arc: &ActivityArc, coefficient: Cost) -> Cost {
        let before = meter_to_km(self.distance_since_maintenance);
        let after = meter_to_km(self.distance_since_maintenance + arc.distance());
        0.5 * coefficient * (after * after - before * before)
    }

    pub fn is_within_bounds(&self, vehicle: &Vehicle) -> bool {
        self.soc >= vehicle.battery_reserve() - EPS
            && self.soc <= vehicle.battery_capacity() + EPS
            && self.distance_since_maintenance <= vehicle.max_distance_between_maintenance()
    }
}
