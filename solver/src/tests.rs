use model::errors::SchedulingError;
use model::test_utilities::at;
use serde_json::json;

use super::solve_instance;

fn depot_loop_instance(trip_origin: usize) -> serde_json::Value {
    json!({
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
                "availableFrom": "2024-01-01T06:00",
                "initialStateOfChargeInKwh": 80.0,
                "batteryCapacityInKwh": 100.0,
                "batteryReserveInKwh": 10.0,
                "consumptionInKwhPerKm": 1.0
            }
        ],
        "trips": [
            {
                "id": 0,
                "origin": trip_origin,
                "destination": 0,
                "departureTime": "2024-01-01T08:00",
                "arrivalTime": "2024-01-01T08:30",
                "travelDistanceInMeter": 10000
            }
        ],
        "parameters": {
            "costs": {"maintenancePenaltyCoefficient": 0.0}
        }
    })
}

#[test]
fn test_solve_instance() {
    // ARRANGE
    let input = depot_loop_instance(0);

    // ACT
    let output = solve_instance(input, at("06:00"), at("12:00")).unwrap();

    // ASSERT
    assert_eq!(output["objectiveValue"], json!(100.0));
    assert_eq!(output["schedule"]["unassignedTrips"], json!([]));
    assert_eq!(output["schedule"]["provenOptimal"], json!(true));
    let stops = output["schedule"]["schedules"][0]["stops"].as_array().unwrap();
    assert!(stops.iter().any(|s| s["type"] == json!("serviceTrip")));
    assert_eq!(
        output["statistics"]["horizons"][0]["algorithm"],
        json!("branch-and-price")
    );
}

#[test]
fn test_unknown_location_is_rejected() {
    // ARRANGE
    let input = depot_loop_instance(7);

    // ACT
    let result = solve_instance(input, at("06:00"), at("12:00"));

    // ASSERT
    assert!(matches!(result, Err(SchedulingError::Data(_))));
}
