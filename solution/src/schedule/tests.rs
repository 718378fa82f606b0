use model::base_types::{TripId, VehicleId};
use model::test_utilities::{at, scenario_a, scenario_b};

use crate::test_utilities::column_along;
use crate::vehicle_schedule::VehicleSchedule;

use super::Schedule;

#[test]
fn test_merge_horizons() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let t0 = network.trip_node(TripId(0)).unwrap();
    let t1 = network.trip_node(TripId(1)).unwrap();
    let column = column_along(&network, &[t0, t1]);
    let first = VehicleSchedule::from_column(&column, &network, Some(at("08:45"))).unwrap();
    let second = VehicleSchedule::from_column(&column_along(&network, &[t1]), &network, None)
        .unwrap();
    let mut schedule = Schedule::empty();

    // ACT
    schedule.add_horizon(vec![first], vec![], vec![], true, &d.instance, &d.config);
    schedule.add_horizon(vec![second], vec![], vec![], false, &d.instance, &d.config);

    // ASSERT
    assert_eq!(schedule.number_of_horizons(), 2);
    assert_eq!(schedule.number_of_used_vehicles(), 1);
    assert_eq!(schedule.times_covered(TripId(0)), 1);
    assert_eq!(schedule.times_covered(TripId(1)), 1);
    assert!(!schedule.is_proven_optimal());
    let costs = schedule.costs();
    // the vehicle is paid once, the second part uses a deadleg
    assert!((costs.vehicles - 100.0).abs() < 1e-9);
    assert!((costs.deadlegs - 45.0).abs() < 1e-9);
    assert!((costs.total - 145.0).abs() < 1e-9);
}

#[test]
fn test_idle_parts_and_unassigned_trips() {
    // ARRANGE
    let d = scenario_b();
    let network = d.network_of(VehicleId(1));
    let idle = VehicleSchedule::from_column(&column_along(&network, &[]), &network, None).unwrap();
    let mut schedule = Schedule::empty();

    // ACT
    schedule.add_horizon(
        vec![idle],
        vec![TripId(2), TripId(0)],
        vec![],
        true,
        &d.instance,
        &d.config,
    );

    // ASSERT
    assert_eq!(schedule.number_of_used_vehicles(), 0);
    assert!(schedule.vehicle_schedule(VehicleId(1)).is_none());
    assert_eq!(schedule.unassigned_trips(), &[TripId(0), TripId(2)]);
    assert!(schedule.is_proven_optimal());
    assert!((schedule.objective() - 4000.0).abs() < 1e-9);
    assert_eq!(schedule.costs().unassigned_trips, schedule.objective());
}
