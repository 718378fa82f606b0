use std::fmt;

use time::DateTime;

use crate::base_types::{ChargerId, Kwh, LocationId, Meter, VehicleId};
use crate::resource_state::ResourceState;

/// An electric vehicle together with its state at the beginning of the planning period.
#[derive(Debug, Clone)]
pub struct Vehicle {
    id: VehicleId,
    start_location: LocationId,
    start_charger: Option<ChargerId>,
    available_from: DateTime,
    initial_soc: Kwh,
    initial_odometer: Meter,
    initial_distance_since_maintenance: Meter,
    battery_capacity: Kwh,
    battery_reserve: Kwh,
    consumption_per_km: Kwh,
    max_distance_between_maintenance: Meter,
}

pub struct VehicleSpec {
    pub start_location: LocationId,
    pub start_charger: Option<ChargerId>,
    pub available_from: DateTime,
    pub initial_soc: Kwh,
    pub initial_odometer: Meter,
    pub initial_distance_since_maintenance: Meter,
    pub battery_capacity: Kwh,
    pub battery_reserve: Kwh,
    pub consumption_per_km: Kwh,
    pub max_distance_between_maintenance: Meter,
}

// static functions
impl Vehicle {
    pub fn new(id: VehicleId, spec: VehicleSpec) -> Vehicle {
        Vehicle {
            id,
            start_location: spec.start_location,
            start_charger: spec.start_charger,
            available_from: spec.available_from,
            initial_soc: spec.initial_soc,
            initial_odometer: spec.initial_odometer,
            initial_distance_since_maintenance: spec.initial_distance_since_maintenance,
            battery_capacity: spec.battery_capacity,
            battery_reserve: spec.battery_reserve,
            consumption_per_km: spec.consumption_per_km,
            max_distance_between_maintenance: spec.max_distance_between_maintenance,
        }
    }
}

// methods
impl Vehicle {
    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn start_location(&self) -> LocationId {
        self.start_location
    }

    pub fn start_charger(&self) -> Option<ChargerId> {
        self.start_charger
    }

    pub fn available_from(&self) -> DateTime {
        self.available_from
    }

    pub fn battery_capacity(&self) -> Kwh {
        self.battery_capacity
    }

    pub fn battery_reserve(&self) -> Kwh {
        self.battery_reserve
    }

    pub fn consumption_per_km(&self) -> Kwh {
        self.consumption_per_km
    }

    pub fn max_distance_between_maintenance(&self) -> Meter {
        self.max_distance_between_maintenance
    }

    pub fn initial_state(&self) -> ResourceState {
        ResourceState::new(
            self.initial_soc,
            self.initial_odometer,
            self.initial_distance_since_maintenance,
        )
    }

    /// energy needed to drive the given distance
    pub fn discharge(&self, distance: Meter) -> Kwh {
        crate::base_types::meter_to_km(distance) * self.consumption_per_km
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "vehicle {} (start: {} at {}, soc: {:.1}/{:.1} kWh)",
            self.id, self.start_location, self.available_from, self.initial_soc, self.battery_capacity
        )
    }
}
