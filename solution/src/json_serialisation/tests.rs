use model::base_types::{TripId, VehicleId};
use model::test_utilities::scenario_a;

use crate::schedule::Schedule;
use crate::statistics::{PerformanceDetail, StatisticsRecorder};
use crate::test_utilities::column_along;
use crate::vehicle_schedule::VehicleSchedule;

use super::{schedule_to_json, statistics_to_json};

#[test]
fn test_schedule_to_json() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let t1 = network.trip_node(TripId(1)).unwrap();
    let part = VehicleSchedule::from_column(&column_along(&network, &[t1]), &network, None)
        .unwrap();
    let mut schedule = Schedule::empty();
    schedule.add_horizon(vec![part], vec![TripId(0)], vec![], true, &d.instance, &d.config);

    // ACT
    let json = schedule_to_json(&schedule, &d.instance).unwrap();

    // ASSERT
    let stops = json["schedules"][0]["stops"].as_array().unwrap();
    assert_eq!(json["schedules"][0]["vehicle"], 0);
    assert_eq!(stops.len(), 3);
    assert_eq!(stops[0]["type"], "start");
    assert_eq!(stops[0]["location"], "Depot");
    assert_eq!(stops[1]["type"], "deadHeadTrip");
    assert_eq!(stops[1]["destination"], "Terminal");
    assert_eq!(stops[1]["distanceInMeter"], 20000);
    assert_eq!(stops[2]["type"], "serviceTrip");
    assert_eq!(stops[2]["id"], 1);
    assert_eq!(stops[2]["startTime"], "2024-01-01T09:00:00");
    assert_eq!(stops[2]["odometerInMeter"], 40000);
    assert_eq!(json["unassignedTrips"], serde_json::json!([0]));
    assert_eq!(json["costs"]["unassignedTrips"], 2000.0);
    assert_eq!(json["provenOptimal"], true);
}

#[test]
fn test_statistics_to_json_keeps_null_fields() {
    // ARRANGE
    let mut recorder = StatisticsRecorder::new();
    recorder.record_performance(PerformanceDetail {
        horizon: 1,
        iteration: Some(3),
        columns_added: Some(7),
        ..Default::default()
    });

    // ACT
    let json = statistics_to_json(recorder.statistics()).unwrap();

    // ASSERT
    let detail = &json["performance"][0];
    assert_eq!(detail["horizon"], 1);
    assert_eq!(detail["iteration"], 3);
    assert_eq!(detail["columnsAdded"], 7);
    assert!(detail.get("branchType").unwrap().is_null());
    assert!(detail.get("gap").unwrap().is_null());
}
