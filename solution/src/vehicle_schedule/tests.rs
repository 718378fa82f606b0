use model::base_types::{MaintenanceId, TripId, VehicleId};
use model::network::nodes::Activity;
use model::test_utilities::{at, scenario_a, scenario_maintenance, DEPOT, TERMINAL};

use crate::test_utilities::column_along;

use super::VehicleSchedule;

#[test]
fn test_replay_both_trips() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let t0 = network.trip_node(TripId(0)).unwrap();
    let t1 = network.trip_node(TripId(1)).unwrap();
    let column = column_along(&network, &[t0, t1]);

    // ACT
    let schedule = VehicleSchedule::from_column(&column, &network, None).unwrap();

    // ASSERT
    let stops = schedule.stops();
    assert_eq!(stops.len(), 3);
    assert_eq!(stops[0].activity(), Activity::Start);
    assert_eq!(stops[1].activity(), Activity::Trip(TripId(0)));
    assert_eq!(stops[2].activity(), Activity::Trip(TripId(1)));
    assert!((stops[1].state().soc() - 180.0).abs() < 1e-9);
    assert_eq!(stops[2].state(), column.end_state());
    assert_eq!(schedule.distance(), 40000);
    assert_eq!(schedule.deadleg_cost(), 0.0);
    assert_eq!(schedule.trips().collect::<Vec<_>>(), vec![TripId(0), TripId(1)]);
}

#[test]
fn test_deadleg_becomes_a_stop() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let t1 = network.trip_node(TripId(1)).unwrap();
    let column = column_along(&network, &[t1]);

    // ACT
    let schedule = VehicleSchedule::from_column(&column, &network, None).unwrap();

    // ASSERT
    let stops = schedule.stops();
    assert_eq!(stops.len(), 3);
    assert_eq!(stops[1].activity(), Activity::Deadleg);
    assert_eq!(stops[1].start_location(), DEPOT);
    assert_eq!(stops[1].end_location(), TERMINAL);
    assert_eq!(stops[1].start_time(), at("06:00"));
    assert_eq!(stops[1].end_time(), at("06:30"));
    assert_eq!(schedule.deadleg_distance(), 20000);
    assert!((schedule.deadleg_cost() - 45.0).abs() < 1e-9);
    assert!((stops[2].state().soc() - 160.0).abs() < 1e-9);
}

#[test]
fn test_cut_trims_charging() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let t0 = network.trip_node(TripId(0)).unwrap();
    let t1 = network.trip_node(TripId(1)).unwrap();
    let slot = network
        .topological_order()
        .find(|n| network.node(*n).is_charging())
        .unwrap();
    let column = column_along(&network, &[slot, t0, t1]);

    // ACT
    let schedule = VehicleSchedule::from_column(&column, &network, Some(at("07:00"))).unwrap();
    let start = schedule.carry_over(at("07:00")).unwrap();

    // ASSERT
    let stops = schedule.stops();
    assert_eq!(stops.len(), 2);
    assert_eq!(stops[1].end_time(), at("07:00"));
    // 55 minutes at 50 kW after the put-on time
    let expected = 50.0 * 55.0 / 60.0;
    assert!((stops[1].energy_charged() - expected).abs() < 1e-6);
    assert_eq!(start.location, DEPOT);
    assert_eq!(start.time, at("07:00"));
    assert!((start.state.soc() - (200.0 + expected)).abs() < 1e-6);
}

#[test]
fn test_cut_drops_later_activities() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let t0 = network.trip_node(TripId(0)).unwrap();
    let t1 = network.trip_node(TripId(1)).unwrap();
    let column = column_along(&network, &[t0, t1]);

    // ACT
    let schedule = VehicleSchedule::from_column(&column, &network, Some(at("08:45"))).unwrap();
    let start = schedule.carry_over(at("08:45")).unwrap();

    // ASSERT
    assert_eq!(schedule.trips().collect::<Vec<_>>(), vec![TripId(0)]);
    assert_eq!(start.location, TERMINAL);
    assert_eq!(start.time, at("08:45"));
    assert!((start.state.soc() - 180.0).abs() < 1e-9);
    assert_eq!(start.state.odometer(), 20000);
}

#[test]
fn test_append_continues_schedule() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let t0 = network.trip_node(TripId(0)).unwrap();
    let t1 = network.trip_node(TripId(1)).unwrap();
    let first = VehicleSchedule::from_column(&column_along(&network, &[t0]), &network, None)
        .unwrap();
    let second = VehicleSchedule::from_column(&column_along(&network, &[t1]), &network, None)
        .unwrap();
    let mut merged = first.clone();

    // ACT
    merged.append(second.clone());

    // ASSERT
    assert_eq!(merged.stops().len(), first.stops().len() + second.stops().len() - 1);
    assert_eq!(
        merged
            .stops()
            .iter()
            .filter(|s| s.activity() == Activity::Start)
            .count(),
        1
    );
    assert!((merged.deadleg_cost() - 45.0).abs() < 1e-9);
}

#[test]
fn test_maintenance_penalty_accumulates() {
    // ARRANGE
    let d = scenario_maintenance();
    let network = d.network_of(VehicleId(0));
    let t0 = network.trip_node(TripId(0)).unwrap();
    let m0 = network.maintenance_node(MaintenanceId(0)).unwrap();
    let t1 = network.trip_node(TripId(1)).unwrap();
    let column = column_along(&network, &[t0, m0, t1]);

    // ACT
    let schedule = VehicleSchedule::from_column(&column, &network, None).unwrap();

    // ASSERT
    // 0.025 * (99^2 - 95^2) + 0.025 * 4^2
    assert!((schedule.maintenance_penalty() - 19.8).abs() < 1e-6);
    assert!((column.cost() - 119.8).abs() < 1e-6);
    assert_eq!(schedule.maintenances().collect::<Vec<_>>(), vec![MaintenanceId(0)]);
    assert_eq!(schedule.stops()[2].state().distance_since_maintenance(), 0);
    assert_eq!(schedule.stops()[3].state().distance_since_maintenance(), 4000);
}
