use model::base_types::{TripId, VehicleId};
use model::test_utilities::scenario_a;
use rayon::prelude::*;
use solution::test_utilities::column_along;

use super::ColumnPool;

#[test]
fn test_insert_rejects_duplicates() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let t0 = network.trip_node(TripId(0)).unwrap();
    let pool = ColumnPool::new();

    // ACT
    let first = pool.insert(column_along(&network, &[t0]));
    let second = pool.insert(column_along(&network, &[t0]));
    let third = pool.insert(column_along(&network, &[]));

    // ASSERT
    assert!(first);
    assert!(!second);
    assert!(third);
    assert_eq!(pool.len(), 2);
    assert!(pool.columns()[0].covers_trip(TripId(0)));
}

#[test]
fn test_concurrent_inserts() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let t0 = network.trip_node(TripId(0)).unwrap();
    let t1 = network.trip_node(TripId(1)).unwrap();
    let paths = vec![vec![], vec![t0], vec![t1], vec![t0, t1]];
    let pool = ColumnPool::new();

    // ACT
    (0..40).into_par_iter().for_each(|i| {
        pool.insert(column_along(&network, &paths[i % paths.len()]));
    });

    // ASSERT
    assert_eq!(pool.len(), 4);
}

#[test]
fn test_retain_best_keeps_protected_and_cheapest() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let t0 = network.trip_node(TripId(0)).unwrap();
    let t1 = network.trip_node(TripId(1)).unwrap();
    let pool = ColumnPool::new();
    pool.insert(column_along(&network, &[]));
    pool.insert(column_along(&network, &[t0]));
    pool.insert(column_along(&network, &[t1]));
    pool.insert(column_along(&network, &[t0, t1]));

    // ACT
    // score by number of uncovered trips, the idle column is protected
    let removed = pool.retain_best(
        2,
        |c| 2.0 - c.trips().len() as f64,
        |c| c.is_idle(),
    );
    let reinserted = pool.insert(column_along(&network, &[t1]));
    let untouched = pool.retain_best(10, |_| 0.0, |_| false);

    // ASSERT
    assert_eq!(removed, 2);
    assert!(reinserted);
    assert_eq!(untouched, 0);
    let columns = pool.columns();
    assert_eq!(columns.len(), 3);
    assert!(columns[0].is_idle());
    assert_eq!(columns[1].trips(), &[TripId(0), TripId(1)]);
    assert_eq!(columns[2].trips(), &[TripId(1)]);
}
