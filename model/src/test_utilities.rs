use std::sync::Arc;

use serde_json::json;
use time::DateTime;

use crate::base_types::{LocationId, VehicleId};
use crate::config::Config;
use crate::instance::Instance;
use crate::json_serialisation::load_instance_from_json;
use crate::network::{ActivityNetwork, TimeWindow, VehicleStart};

pub struct TestData {
    pub instance: Arc<Instance>,
    pub config: Arc<Config>,
    pub period_start: DateTime,
    pub period_end: DateTime,
}

impl TestData {
    fn load(input: serde_json::Value, period_start: &str, period_end: &str) -> TestData {
        let (instance, config) = load_instance_from_json(input).unwrap();
        TestData {
            instance,
            config,
            period_start: at(period_start),
            period_end: at(period_end),
        }
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.period_start,
            end: self.period_end,
        }
    }

    pub fn start_of(&self, vehicle: VehicleId) -> VehicleStart {
        let vehicle = self.instance.vehicle(vehicle);
        VehicleStart {
            location: vehicle.start_location(),
            time: vehicle.available_from().max(self.period_start),
            state: vehicle.initial_state(),
            in_service: false,
        }
    }

    pub fn network_of(&self, vehicle: VehicleId) -> ActivityNetwork {
        ActivityNetwork::new(
            self.instance.clone(),
            self.config.clone(),
            vehicle,
            self.start_of(vehicle),
            self.window(),
        )
        .unwrap()
    }

    pub fn with_config(self, config: Config) -> TestData {
        TestData {
            config: Arc::new(config),
            ..self
        }
    }
}

/// "hh:mm" on the test day.
pub fn at(time: &str) -> DateTime {
    DateTime::new(&format!("2024-01-01T{}", time))
}

pub const DEPOT: LocationId = LocationId(0);
pub const TERMINAL: LocationId = LocationId(1);

/// One vehicle, trips depot -> terminal 08:00-08:30 and back 09:00-09:30 (20km each), a
/// charger with capacity 1 at the depot and plenty of battery. The maintenance penalty is
/// switched off.
pub fn scenario_a() -> TestData {
    let input = json!({
        "locations": two_locations(),
        "deadHeadTrips": two_location_matrix(20000, 1800),
        "chargers": [
            {"id": 0, "location": 0, "capacity": 1, "chargingRateInKw": 50.0}
        ],
        "vehicles": [
            vehicle(0, "06:00", 200.0, 300.0, 20.0)
        ],
        "trips": [
            trip(0, 0, 1, "08:00", "08:30", 20000),
            trip(1, 1, 0, "09:00", "09:30", 20000)
        ],
        "parameters": {
            "costs": {"maintenancePenaltyCoefficient": 0.0}
        }
    });
    TestData::load(input, "06:00", "12:00")
}

/// Two vehicles, two short trips and a 500km trip to a remote location that exceeds the
/// battery of both vehicles.
pub fn scenario_b() -> TestData {
    let input = json!({
        "locations": [
            {"id": 0, "name": "Depot"},
            {"id": 1, "name": "Terminal"},
            {"id": 2, "name": "Remote"}
        ],
        "deadHeadTrips": {
            "indices": [0, 1, 2],
            "travelTimeDurationsInSeconds": [
                [0, 1800, 18000],
                [1800, 0, 18000],
                [18000, 18000, 0]
            ],
            "distancesInMeter": [
                [0, 20000, 500000],
                [20000, 0, 500000],
                [500000, 500000, 0]
            ]
        },
        "chargers": [
            {"id": 0, "location": 0, "capacity": 2, "chargingRateInKw": 50.0}
        ],
        "vehicles": [
            vehicle(0, "06:00", 90.0, 100.0, 10.0),
            vehicle(1, "06:00", 90.0, 100.0, 10.0)
        ],
        "trips": [
            trip(0, 0, 1, "08:00", "08:30", 20000),
            trip(1, 1, 0, "09:00", "09:30", 20000),
            trip(2, 0, 2, "10:00", "15:00", 500000)
        ],
        "parameters": {
            "costs": {"maintenancePenaltyCoefficient": 0.0}
        }
    });
    TestData::load(input, "06:00", "18:00")
}

/// Two nearly empty vehicles at the depot, both departing at 10:00 for a 40km trip. Each one
/// has to charge at the single depot charger between 08:00 and 10:00 first.
pub fn scenario_c(charger_capacity: u32) -> TestData {
    let input = json!({
        "locations": two_locations(),
        "deadHeadTrips": two_location_matrix(40000, 2400),
        "chargers": [
            {"id": 0, "location": 0, "capacity": charger_capacity, "chargingRateInKw": 30.0}
        ],
        "vehicles": [
            vehicle(0, "08:00", 30.0, 100.0, 10.0),
            vehicle(1, "08:00", 30.0, 100.0, 10.0)
        ],
        "trips": [
            trip(0, 0, 1, "10:00", "10:40", 40000),
            trip(1, 0, 1, "10:00", "10:40", 40000)
        ],
        "parameters": {
            "costs": {"maintenancePenaltyCoefficient": 0.0}
        }
    });
    TestData::load(input, "08:00", "14:00")
}

/// One vehicle 95km into a 100km maintenance interval. Two 4km loops at the depot are
/// separated by a mandatory maintenance 09:00-09:30.
pub fn scenario_maintenance() -> TestData {
    let input = json!({
        "locations": [
            {"id": 0, "name": "Depot"}
        ],
        "deadHeadTrips": {
            "indices": [0],
            "travelTimeDurationsInSeconds": [[0]],
            "distancesInMeter": [[0]]
        },
        "vehicles": [
            {
                "id": 0,
                "startLocation": 0,
                "availableFrom": "2024-01-01T07:00",
                "initialStateOfChargeInKwh": 80.0,
                "odometerInMeter": 1000000,
                "distanceSinceMaintenanceInMeter": 95000,
                "batteryCapacityInKwh": 100.0,
                "batteryReserveInKwh": 10.0,
                "consumptionInKwhPerKm": 1.0,
                "maxDistanceBetweenMaintenanceInMeter": 100000
            }
        ],
        "trips": [
            trip(0, 0, 0, "08:00", "08:30", 4000),
            trip(1, 0, 0, "10:00", "10:30", 4000)
        ],
        "maintenances": [
            {
                "id": 0,
                "vehicle": 0,
                "location": 0,
                "start": "2024-01-01T09:00",
                "end": "2024-01-01T09:30"
            }
        ]
    });
    TestData::load(input, "07:00", "12:00")
}

/// Two vehicles without charger, each able to run any two of three 40km loops but not all
/// three. The LP relaxation shares three pairs at one half each.
pub fn scenario_odd_cycle() -> TestData {
    let input = json!({
        "locations": [
            {"id": 0, "name": "Depot"}
        ],
        "deadHeadTrips": {
            "indices": [0],
            "travelTimeDurationsInSeconds": [[0]],
            "distancesInMeter": [[0]]
        },
        "vehicles": [
            vehicle(0, "07:00", 90.0, 100.0, 10.0),
            vehicle(1, "07:00", 90.0, 100.0, 10.0)
        ],
        "trips": [
            trip(0, 0, 0, "08:00", "08:40", 40000),
            trip(1, 0, 0, "10:00", "10:40", 40000),
            trip(2, 0, 0, "12:00", "12:40", 40000)
        ],
        "parameters": {
            "costs": {"maintenancePenaltyCoefficient": 0.0}
        }
    });
    TestData::load(input, "07:00", "14:00")
}

/// A single depot charger of capacity 1 and two nearly empty vehicles arriving off the five
/// minute grid. Vehicle 0 can charge 08:02:30-08:32:40 for the 20km loop at 08:32:40, vehicle 1
/// 08:32:10-09:02:40 for the loop at 09:02:40. The two sessions overlap by 30 seconds.
pub fn scenario_staggered() -> TestData {
    let input = json!({
        "locations": [
            {"id": 0, "name": "Depot"}
        ],
        "deadHeadTrips": {
            "indices": [0],
            "travelTimeDurationsInSeconds": [[0]],
            "distancesInMeter": [[0]]
        },
        "chargers": [
            {"id": 0, "location": 0, "capacity": 1, "chargingRateInKw": 60.0}
        ],
        "vehicles": [
            vehicle(0, "08:02:30", 20.0, 100.0, 10.0),
            vehicle(1, "08:32:10", 20.0, 100.0, 10.0)
        ],
        "trips": [
            trip(0, 0, 0, "08:32:40", "08:52:40", 20000),
            trip(1, 0, 0, "09:02:40", "09:22:40", 20000)
        ],
        "parameters": {
            "costs": {"maintenancePenaltyCoefficient": 0.0}
        }
    });
    TestData::load(input, "08:00", "10:00")
}

fn two_locations() -> serde_json::Value {
    json!([
        {"id": 0, "name": "Depot"},
        {"id": 1, "name": "Terminal"}
    ])
}

fn two_location_matrix(distance: u64, seconds: u64) -> serde_json::Value {
    json!({
        "indices": [0, 1],
        "travelTimeDurationsInSeconds": [[0, seconds], [seconds, 0]],
        "distancesInMeter": [[0, distance], [distance, 0]]
    })
}

fn vehicle(id: usize, available: &str, soc: f64, capacity: f64, reserve: f64) -> serde_json::Value {
    json!({
        "id": id,
        "startLocation": 0,
        "startCharger": null,
        "availableFrom": format!("2024-01-01T{}", available),
        "initialStateOfChargeInKwh": soc,
        "batteryCapacityInKwh": capacity,
        "batteryReserveInKwh": reserve,
        "consumptionInKwhPerKm": 1.0
    })
}

fn trip(
    id: usize,
    origin: usize,
    destination: usize,
    departure: &str,
    arrival: &str,
    distance: u64,
) -> serde_json::Value {
    json!({
        "id": id,
        "origin": origin,
        "destination": destination,
        "departureTime": format!("2024-01-01T{}", departure),
        "arrivalTime": format!("2024-01-01T{}", arrival),
        "travelDistanceInMeter": distance
    })
}
