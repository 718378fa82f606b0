use crate::base_types::{ChargerId, LocationId, MaintenanceId, TripId, VehicleId, EPS};
use crate::chargers::Charger;
use crate::errors::{Result, SchedulingError};
use crate::locations::Locations;
use crate::maintenances::Maintenance;
use crate::trips::Trip;
use crate::vehicles::Vehicle;

/// Immutable snapshot of all input entities. The id of every entity equals its position in the
/// corresponding vector. Creation validates the data, so all lookups by id are infallible
/// afterwards.
#[derive(Debug)]
pub struct Instance {
    locations: Locations,
    vehicles: Vec<Vehicle>,
    chargers: Vec<Charger>,
    trips: Vec<Trip>,
    maintenances: Vec<Maintenance>,
}

// static functions
impl Instance {
    pub fn new(
        locations: Locations,
        vehicles: Vec<Vehicle>,
        chargers: Vec<Charger>,
        trips: Vec<Trip>,
        maintenances: Vec<Maintenance>,
    ) -> Result<Instance> {
        let instance = Instance {
            locations,
            vehicles,
            chargers,
            trips,
            maintenances,
        };
        instance.validate()?;
        Ok(instance)
    }
}

// methods
impl Instance {
    pub fn locations(&self) -> &Locations {
        &self.locations
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> &Vehicle {
        &self.vehicles[id.0]
    }

    pub fn chargers(&self) -> &[Charger] {
        &self.chargers
    }

    pub fn charger(&self, id: ChargerId) -> &Charger {
        &self.chargers[id.0]
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }

    pub fn trip(&self, id: TripId) -> &Trip {
        &self.trips[id.0]
    }

    pub fn maintenances(&self) -> &[Maintenance] {
        &self.maintenances
    }

    pub fn maintenance(&self, id: MaintenanceId) -> &Maintenance {
        &self.maintenances[id.0]
    }

    fn check_location(&self, location: LocationId, owner: &str) -> Result<()> {
        if self.locations.contains(location) {
            Ok(())
        } else {
            Err(SchedulingError::data(format!(
                "{} references unknown location {}",
                owner, location
            )))
        }
    }

    fn validate(&self) -> Result<()> {
        for (position, charger) in self.chargers.iter().enumerate() {
            let owner = format!("charger {}", charger.id());
            if charger.id().0 != position {
                return Err(SchedulingError::data(format!("{} is not at position {}", owner, position)));
            }
            self.check_location(charger.location(), &owner)?;
            if charger.capacity() == 0 {
                return Err(SchedulingError::data(format!("{} has zero capacity", owner)));
            }
            if charger.rate().is_nan() || charger.rate() <= 0.0 {
                return Err(SchedulingError::data(format!("{} has a non-positive charging rate", owner)));
            }
        }

        for (position, vehicle) in self.vehicles.iter().enumerate() {
            let owner = format!("vehicle {}", vehicle.id());
            if vehicle.id().0 != position {
                return Err(SchedulingError::data(format!("{} is not at position {}", owner, position)));
            }
            self.check_location(vehicle.start_location(), &owner)?;
            if vehicle.available_from().as_seconds().is_none() {
                return Err(SchedulingError::data(format!("{} has no concrete availability time", owner)));
            }
            if let Some(charger) = vehicle.start_charger() {
                match self.chargers.get(charger.0) {
                    Some(c) if c.location() == vehicle.start_location() => {}
                    _ => {
                        return Err(SchedulingError::data(format!(
                            "{} starts at charger {} which is not at its start location",
                            owner, charger
                        )))
                    }
                }
            }
            let state = vehicle.initial_state();
            if vehicle.battery_reserve() < 0.0
                || vehicle.battery_capacity() <= 0.0
                || vehicle.battery_reserve() > vehicle.battery_capacity()
            {
                return Err(SchedulingError::data(format!("{} has inconsistent battery bounds", owner)));
            }
            if state.soc() < vehicle.battery_reserve() - EPS
                || state.soc() > vehicle.battery_capacity() + EPS
            {
                return Err(SchedulingError::data(format!(
                    "{} has an initial state-of-charge of {} kWh outside [{}, {}]",
                    owner,
                    state.soc(),
                    vehicle.battery_reserve(),
                    vehicle.battery_capacity()
                )));
            }
            if state.distance_since_maintenance() > vehicle.max_distance_between_maintenance() {
                return Err(SchedulingError::data(format!(
                    "{} already exceeds its maximal distance between maintenances",
                    owner
                )));
            }
            if vehicle.consumption_per_km() < 0.0 {
                return Err(SchedulingError::data(format!("{} has a negative consumption", owner)));
            }
        }

        for (position, trip) in self.trips.iter().enumerate() {
            let owner = format!("trip {}", trip.id());
            if trip.id().0 != position {
                return Err(SchedulingError::data(format!("{} is not at position {}", owner, position)));
            }
            self.check_location(trip.origin(), &owner)?;
            self.check_location(trip.destination(), &owner)?;
            if trip.departure().as_seconds().is_none()
                || trip.arrival().as_seconds().is_none()
                || trip.arrival() < trip.departure()
            {
                return Err(SchedulingError::data(format!("{} arrives before it departs", owner)));
            }
        }

        for (position, maintenance) in self.maintenances.iter().enumerate() {
            let owner = format!("maintenance {}", maintenance.id());
            if maintenance.id().0 != position {
                return Err(SchedulingError::data(format!("{} is not at position {}", owner, position)));
            }
            self.check_location(maintenance.location(), &owner)?;
            if maintenance.start().as_seconds().is_none()
                || maintenance.end().as_seconds().is_none()
                || maintenance.end() < maintenance.start()
            {
                return Err(SchedulingError::data(format!("{} ends before it starts", owner)));
            }
            if let Some(vehicle) = maintenance.vehicle() {
                if vehicle.0 >= self.vehicles.len() {
                    return Err(SchedulingError::data(format!(
                        "{} is reserved for unknown vehicle {}",
                        owner, vehicle
                    )));
                }
            }
        }
        Ok(())
    }
}
