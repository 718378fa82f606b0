
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::{DateTime, Duration};

use crate::base_types::{ChargerId, LocationId, MaintenanceId, TripId, VehicleId};
use crate::chargers::Charger;
use crate::config::Config;
use crate::errors::{Result, SchedulingError};
use crate::instance::Instance;
use crate::locations::{Locations, Travel};
use crate::maintenances::Maintenance;
use crate::trips::Trip;
use crate::vehicles::{Vehicle, VehicleSpec};

type Integer = u64;

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JsonLocation {
    id: usize,
    name: String,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct DeadHeadTrips {
    indices: Vec<usize>,
    travel_time_durations_in_seconds: Vec<Vec<Option<Integer>>>,
    distances_in_meter: Vec<Vec<Option<Integer>>>,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JsonCharger {
    id: usize,
    location: usize,
    capacity: u32,
    charging_rate_in_kw: f64,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JsonVehicle {
    id: usize,
    start_location: usize,
    #[serde(default)]
    start_charger: Option<usize>,
    available_from: DateTime,
    initial_state_of_charge_in_kwh: f64,
    #[serde(default)]
    odometer_in_meter: Integer,
    #[serde(default)]
    distance_since_maintenance_in_meter: Integer,
    battery_capacity_in_kwh: f64,
    #[serde(default)]
    battery_reserve_in_kwh: f64,
    consumption_in_kwh_per_km: f64,
    #[serde(default = "unlimited_distance")]
    max_distance_between_maintenance_in_meter: Integer,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JsonTrip {
    id: usize,
    origin: usize,
    destination: usize,
    departure_time: DateTime,
    arrival_time: DateTime,
    travel_distance_in_meter: Integer,
    #[serde(default = "mandatory_by_default")]
    mandatory: bool,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JsonMaintenance {
    id: usize,
    #[serde(default)]
    vehicle: Option<usize>,
    location: usize,
    start: DateTime,
    end: DateTime,
    #[serde(default = "mandatory_by_default")]
    mandatory: bool,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JsonInput {
    locations: Vec<JsonLocation>,
    dead_head_trips: DeadHeadTrips,
    #[serde(default)]
    chargers: Vec<JsonCharger>,
    vehicles: Vec<JsonVehicle>,
    trips: Vec<JsonTrip>,
    #[serde(default)]
    maintenances: Vec<JsonMaintenance>,
    #[serde(default)]
    parameters: Config,
}

fn unlimited_distance() -> Integer {
    Integer::MAX
}

fn mandatory_by_default() -> bool {
    true
}

/// Reads an instance snapshot (as delivered by the data-input layer) and validates it.
pub fn load_instance_from_json(input: serde_json::Value) -> Result<(Arc<Instance>, Arc<Config>)> {
    let json_input: JsonInput = serde_json::from_value(input)
        .map_err(|err| SchedulingError::data(format!("malformed instance: {}", err)))?;

    let locations = create_locations(&json_input)?;
    let chargers = create_chargers(&json_input);
    let vehicles = create_vehicles(&json_input);
    let trips = create_trips(&json_input);
    let maintenances = create_maintenances(&json_input);

    let instance = Instance::new(locations, vehicles, chargers, trips, maintenances)?;
    Ok((Arc::new(instance), Arc::new(json_input.parameters)))
}

fn create_locations(json_input: &JsonInput) -> Result<Locations> {
    let mut names = Vec::with_capacity(json_input.locations.len());
    for (position, location) in json_input.locations.iter().enumerate() {
        if location.id != position {
            return Err(SchedulingError::data(format!(
                "location {} is not at position {}",
                location.name, position
            )));
        }
        names.push(location.name.clone());
    }

    let matrix = &json_input.dead_head_trips;
    let mut legs = Vec::new();
    for (i, origin) in matrix.indices.iter().enumerate() {
        for (j, destination) in matrix.indices.iter().enumerate() {
            let duration = matrix
                .travel_time_durations_in_seconds
                .get(i)
                .and_then(|row| row.get(j))
                .copied()
                .flatten();
            let distance = matrix
                .distances_in_meter
                .get(i)
                .and_then(|row| row.get(j))
                .copied()
                .flatten();
            // missing entries are reported by Locations::new
            if let (Some(duration), Some(distance)) = (duration, distance) {
                legs.push((
                    LocationId(*origin),
                    LocationId(*destination),
                    Travel::new(distance, Duration::from_seconds(duration)),
                ));
            }
        }
    }
    Locations::new(names, legs)
}

fn create_chargers(json_input: &JsonInput) -> Vec<Charger> {
    json_input
        .chargers
        .iter()
        .map(|charger| {
            Charger::new(
                ChargerId(charger.id),
                LocationId(charger.location),
                charger.capacity,
                charger.charging_rate_in_kw,
            )
        })
        .collect()
}

fn create_vehicles(json_input: &JsonInput) -> Vec<Vehicle> {
    json_input
        .vehicles
        .iter()
        .map(|vehicle| {
            Vehicle::new(
                VehicleId(vehicle.id),
                VehicleSpec {
                    start_location: LocationId(vehicle.start_location),
                    start_charger: vehicle.start_charger.map(ChargerId),
                    available_from: vehicle.available_from,
                    initial_soc: vehicle.initial_state_of_charge_in_kwh,
                    initial_odometer: vehicle.odometer_in_meter,
                    initial_distance_since_maintenance: vehicle.distance_since_maintenance_in_meter,
                    battery_capacity: vehicle.battery_capacity_in_kwh,
                    battery_reserve: vehicle.battery_reserve_in_kwh,
                    consumption_per_km: vehicle.consumption_in_kwh_per_km,
                    max_distance_between_maintenance: vehicle
                        .max_distance_between_maintenance_in_meter,
                },
            )
        })
        .collect()
}

fn create_trips(json_input: &JsonInput) -> Vec<Trip> {
    json_input
        .trips
        .iter()
        .map(|trip| {
            Trip::new(
                TripId(trip.id),
                LocationId(trip.origin),
                LocationId(trip.destination),
                trip.departure_time,
                trip.arrival_time,
                trip.travel_distance_in_meter,
                trip.mandatory,
            )
        })
        .collect()
}

fn create_maintenances(json_input: &JsonInput) -> Vec<Maintenance> {
    json_input
        .maintenances
        .iter()
        .map(|maintenance| {
            Maintenance::new(
                MaintenanceId(maintenance.id),
                maintenance.vehicle.map(VehicleId),
                LocationId(maintenance.location),
                maintenance.start,
                maintenance.end,
                maintenance.mandatory,
            )
        })
        .collect()
}
