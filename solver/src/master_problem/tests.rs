use std::sync::Arc;

use model::base_types::{MaintenanceId, NodeIdx, TripId, VehicleId};
use model::network::ActivityNetwork;
use model::test_utilities::{scenario_a, scenario_c, TestData};
use solution::test_utilities::column_along;
use solution::Column;

use crate::branching::{BranchFix, BranchTarget, Fixes};
use crate::lp::HighsSolver;
use crate::test_utilities::LimitedLpSolver;

use super::{Duals, MasterProblem, MasterSolution};

fn master_of(d: &TestData) -> MasterProblem {
    let window = d.window();
    MasterProblem::new(
        d.instance.clone(),
        d.config.clone(),
        window,
        d.instance.vehicles().iter().map(|v| v.id()).collect(),
        d.instance.trips().iter().map(|t| t.id()).collect(),
        d.instance.maintenances().iter().map(|m| m.id()).collect(),
        Arc::new(HighsSolver::default()),
    )
}

fn trip_column(network: &ActivityNetwork, trips: &[usize]) -> Arc<Column> {
    let nodes: Vec<NodeIdx> = trips
        .iter()
        .map(|t| network.trip_node(TripId(*t)).unwrap())
        .collect();
    Arc::new(column_along(network, &nodes))
}

/// column charging right from the start and then doing the trip
fn charging_column(network: &ActivityNetwork, trip: usize) -> Arc<Column> {
    let trip = network.trip_node(TripId(trip)).unwrap();
    let slot = network
        .topological_order()
        .find(|n| network.node(*n).is_charging() && network.arc_between(*n, trip).is_some())
        .unwrap();
    Arc::new(column_along(network, &[slot, trip]))
}

#[test]
fn test_single_column_covers_everything() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let master = master_of(&d);
    let columns = vec![trip_column(&network, &[0, 1])];

    // ACT
    let solution = master.solve(&columns, &Fixes::new()).unwrap().unwrap();

    // ASSERT
    assert!((solution.objective() - 100.0).abs() < 1e-6);
    assert!(solution.is_integral());
    assert!(!solution.uses_artificials());
    assert!(solution.uncovered_trips().is_empty());
    assert_eq!(solution.selected_columns().len(), 1);
    assert!(solution.candidates().is_empty());
    // 1 vehicle row + 2 trip rows; 1 column + 2 slacks
    assert_eq!(solution.lp_rows(), 3);
    assert_eq!(solution.lp_columns(), 3);
    // the basic column has reduced cost zero
    let duals = solution.duals();
    let reduced = 100.0 - duals.vehicle(VehicleId(0)) - duals.trip(TripId(0)) - duals.trip(TripId(1));
    assert!(reduced.abs() < 1e-6);
}

#[test]
fn test_uncovered_trip_is_paid() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let master = master_of(&d);
    let columns = vec![trip_column(&network, &[0]), trip_column(&network, &[1])];

    // ACT
    let solution = master.solve(&columns, &Fixes::new()).unwrap().unwrap();

    // ASSERT
    // the cheaper column is used, the other trip is paid with 2000
    assert!((solution.objective() - 2100.0).abs() < 1e-6);
    assert_eq!(solution.uncovered_trips(), vec![TripId(1)]);
    assert_eq!(solution.selected_columns()[0].trips(), &[TripId(0)]);
    assert!(master.slack_objective() > solution.objective());
    assert!((master.slack_objective() - 4000.0).abs() < 1e-9);
}

#[test]
fn test_fix_to_zero_filters_columns() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let master = master_of(&d);
    let columns = vec![
        trip_column(&network, &[0, 1]),
        trip_column(&network, &[0]),
        trip_column(&network, &[1]),
    ];
    let fixes = Fixes::new().with(BranchFix {
        vehicle: VehicleId(0),
        target: BranchTarget::Trip(TripId(0)),
        value: false,
    });

    // ACT
    let solution = master.solve(&columns, &fixes).unwrap().unwrap();

    // ASSERT
    assert_eq!(solution.columns().len(), 1);
    assert!((solution.objective() - 2145.0).abs() < 1e-6);
    assert_eq!(solution.uncovered_trips(), vec![TripId(0)]);
}

#[test]
fn test_unsatisfiable_fix_uses_artificial() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let master = master_of(&d);
    let columns = vec![trip_column(&network, &[1])];
    let fix = BranchFix {
        vehicle: VehicleId(0),
        target: BranchTarget::Trip(TripId(0)),
        value: true,
    };

    // ACT
    let solution = master.solve(&columns, &Fixes::new().with(fix)).unwrap().unwrap();

    // ASSERT
    assert!(solution.uses_artificials());
    assert!((solution.artificial_usage() - 1.0).abs() < 1e-6);
    assert_eq!(solution.lp_rows(), 4);
    // the big-M price shows up in the dual of the fix row
    let t0 = network.trip_node(TripId(0)).unwrap();
    let activity = network.node(t0).activity();
    assert!(solution.duals().fix(VehicleId(0), &activity) > 1e5);
    assert_eq!(solution.duals().fix(VehicleId(1), &activity), 0.0);
}

#[test]
fn test_lazy_capacity_rows() {
    // ARRANGE
    let d = scenario_c(1);
    let n0 = d.network_of(VehicleId(0));
    let n1 = d.network_of(VehicleId(1));
    let mut master = master_of(&d);
    let columns = vec![charging_column(&n0, 0), charging_column(&n1, 1)];

    // ACT
    let relaxed = master.solve(&columns, &Fixes::new()).unwrap().unwrap();
    let violations = master.capacity_violations(&relaxed);
    let added = master.add_capacity_rows(&violations);
    let added_again = master.add_capacity_rows(&violations);
    let constrained = master.solve(&columns, &Fixes::new()).unwrap().unwrap();

    // ASSERT
    assert!((relaxed.objective() - 200.0).abs() < 1e-6);
    assert!(!master.respects_capacities(&columns));
    assert!(!violations.is_empty());
    assert_eq!(added, violations.len());
    assert_eq!(added_again, 0);
    assert_eq!(master.capacity_rows().count(), violations.len());
    assert!((constrained.objective() - 2100.0).abs() < 1e-6);
    assert!(master.capacity_violations(&constrained).is_empty());
    // the binding capacity rows have non-positive duals
    for (charger, k) in violations {
        assert!(constrained.duals().checkpoint(charger, k) < 1e-9);
    }
}

#[test]
fn test_candidates_prefer_activities_over_charging() {
    // ARRANGE
    let d = scenario_c(2);
    let n0 = d.network_of(VehicleId(0));
    let charging = charging_column(&n0, 0);
    let idle = trip_column(&n0, &[]);
    let half = |columns: Vec<(Arc<Column>, f64)>| MasterSolution {
        objective: 0.0,
        columns,
        duals: Duals::default(),
        uncovered_trips: vec![],
        uncovered_maintenances: vec![(MaintenanceId(0), 0.0)],
        artificial_usage: 0.0,
        lp_rows: 0,
        lp_columns: 0,
    };

    // ACT
    let fractional = half(vec![(charging.clone(), 0.5), (idle.clone(), 0.5)]);
    let integral = half(vec![(charging, 1.0), (idle, 0.0)]);

    // ASSERT
    let candidates = fractional.candidates();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].target, BranchTarget::Trip(TripId(0)));
    assert!((candidates[0].value - 0.5).abs() < 1e-9);
    assert!(!fractional.is_integral());
    assert!(integral.is_integral());
    assert!(integral.candidates().is_empty());
    assert!(integral.uncovered_maintenances().is_empty());
}

#[test]
fn test_lp_limit_gives_no_solution() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let master = MasterProblem::new(
        d.instance.clone(),
        d.config.clone(),
        d.window(),
        d.instance.vehicles().iter().map(|v| v.id()).collect(),
        d.instance.trips().iter().map(|t| t.id()).collect(),
        d.instance.maintenances().iter().map(|m| m.id()).collect(),
        Arc::new(LimitedLpSolver::new(0)),
    );
    let columns = vec![trip_column(&network, &[0, 1])];

    // ACT
    let solution = master.solve(&columns, &Fixes::new()).unwrap();

    // ASSERT
    assert!(solution.is_none());
}

#[test]
fn test_reduced_cost_of_basic_column_is_zero() {
    // ARRANGE
    let d = scenario_a();
    let network = d.network_of(VehicleId(0));
    let master = master_of(&d);
    let used = trip_column(&network, &[0, 1]);
    let idle = trip_column(&network, &[]);
    let columns = vec![used.clone(), idle.clone()];

    // ACT
    let solution = master.solve(&columns, &Fixes::new()).unwrap().unwrap();

    // ASSERT
    assert!(master.reduced_cost(&used, solution.duals()).abs() < 1e-6);
    assert!(master.reduced_cost(&idle, solution.duals()) > -1e-6);
}
