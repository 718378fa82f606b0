use std::collections::HashMap;

use model::base_types::{ChargerId, MaintenanceId, TripId, VehicleId};
use model::errors::Result;
use model::network::nodes::{Activity, ChargingSlot};
use model::test_utilities::{at, scenario_b};
use solution::test_utilities::column_along;

use super::{
    BranchCandidate, BranchFix, BranchKind, BranchTarget, BranchingStrategy, Fixes, Lookahead,
    MostFractional, PseudoCost, StrongBranching,
};

fn candidate(vehicle: usize, target: BranchTarget, value: f64) -> BranchCandidate {
    BranchCandidate {
        vehicle: VehicleId(vehicle),
        target,
        value,
    }
}

fn slot() -> ChargingSlot {
    ChargingSlot {
        charger: ChargerId(0),
        start: at("06:00"),
        end: at("08:00"),
    }
}

/// Child bounds looked up per target, every evaluation is logged.
#[derive(Default)]
struct TableLookahead {
    master: HashMap<BranchTarget, [f64; 2]>,
    priced: HashMap<BranchTarget, [f64; 2]>,
    evaluated: Vec<(BranchTarget, &'static str)>,
}

impl Lookahead for TableLookahead {
    fn master_bounds(&mut self, candidate: &BranchCandidate) -> Result<[f64; 2]> {
        self.evaluated.push((candidate.target, "master"));
        Ok(self.master[&candidate.target])
    }

    fn priced_bounds(&mut self, candidate: &BranchCandidate) -> Result<[f64; 2]> {
        self.evaluated.push((candidate.target, "priced"));
        Ok(self.priced[&candidate.target])
    }
}

fn three_trips() -> (Vec<BranchCandidate>, TableLookahead) {
    let candidates = vec![
        candidate(0, BranchTarget::Trip(TripId(0)), 0.5),
        candidate(0, BranchTarget::Trip(TripId(1)), 0.4),
        candidate(1, BranchTarget::Trip(TripId(2)), 0.3),
    ];
    let lookahead = TableLookahead {
        master: HashMap::from([
            (BranchTarget::Trip(TripId(0)), [10.0, 12.0]),
            (BranchTarget::Trip(TripId(1)), [20.0, 30.0]),
            (BranchTarget::Trip(TripId(2)), [25.0, 15.0]),
        ]),
        priced: HashMap::from([
            (BranchTarget::Trip(TripId(0)), [11.0, 13.0]),
            (BranchTarget::Trip(TripId(1)), [21.0, 22.0]),
            (BranchTarget::Trip(TripId(2)), [40.0, f64::INFINITY]),
        ]),
        evaluated: Vec::new(),
    };
    (candidates, lookahead)
}

#[test]
fn test_strong_branching_first_tier() {
    // ARRANGE
    let strategy = StrongBranching::new(50, 0);
    let (candidates, mut lookahead) = three_trips();

    // ACT
    let selected = strategy
        .select_with_lookahead(&candidates, &mut lookahead)
        .unwrap()
        .unwrap();

    // ASSERT
    // the weaker children bound 10, 20 and 15
    assert_eq!(selected.target, BranchTarget::Trip(TripId(1)));
    assert_eq!(lookahead.evaluated.len(), 3);
    assert!(lookahead.evaluated.iter().all(|(_, tier)| *tier == "master"));
}

#[test]
fn test_strong_branching_second_tier() {
    // ARRANGE
    let strategy = StrongBranching::new(50, 2);
    let (candidates, mut lookahead) = three_trips();

    // ACT
    let selected = strategy
        .select_with_lookahead(&candidates, &mut lookahead)
        .unwrap()
        .unwrap();

    // ASSERT
    assert_eq!(selected.target, BranchTarget::Trip(TripId(2)));
    let priced: Vec<BranchTarget> = lookahead
        .evaluated
        .iter()
        .filter(|(_, tier)| *tier == "priced")
        .map(|(target, _)| *target)
        .collect();
    assert_eq!(
        priced,
        vec![BranchTarget::Trip(TripId(1)), BranchTarget::Trip(TripId(2))]
    );
}

#[test]
fn test_strong_branching_single_candidate_needs_no_lookahead() {
    // ARRANGE
    let strategy = StrongBranching::new(1, 25);
    let (candidates, mut lookahead) = three_trips();

    // ACT
    let selected = strategy
        .select_with_lookahead(&candidates, &mut lookahead)
        .unwrap()
        .unwrap();
    let without_candidates = strategy
        .select_with_lookahead(&[], &mut lookahead)
        .unwrap();

    // ASSERT
    // the shortlist of one is the most fractional candidate
    assert_eq!(selected.target, BranchTarget::Trip(TripId(0)));
    assert!(without_candidates.is_none());
    assert!(lookahead.evaluated.is_empty());
}

#[test]
fn test_most_fractional_selection() {
    // ARRANGE
    let candidates = vec![
        candidate(0, BranchTarget::Trip(TripId(0)), 0.2),
        candidate(1, BranchTarget::Trip(TripId(1)), 0.45),
        candidate(0, BranchTarget::Maintenance(MaintenanceId(0)), 0.9),
    ];

    // ACT
    let selected = MostFractional.select(&candidates).unwrap();

    // ASSERT
    assert_eq!(selected.vehicle, VehicleId(1));
    assert_eq!(selected.target, BranchTarget::Trip(TripId(1)));
}

#[test]
fn test_most_fractional_tie_break() {
    // ARRANGE
    let candidates = vec![
        candidate(0, BranchTarget::Charging(slot()), 0.5),
        candidate(1, BranchTarget::Maintenance(MaintenanceId(0)), 0.5),
        candidate(1, BranchTarget::Trip(TripId(1)), 0.5),
        candidate(0, BranchTarget::Trip(TripId(2)), 0.5),
    ];

    // ACT
    let selected = MostFractional.select(&candidates).unwrap();

    // ASSERT
    // trips first, then the lowest vehicle
    assert_eq!(selected.vehicle, VehicleId(0));
    assert_eq!(selected.target, BranchTarget::Trip(TripId(2)));
    assert!(MostFractional.select(&[]).is_none());
}

#[test]
fn test_pseudo_cost_learns_from_bound_changes() {
    // ARRANGE
    let strategy = PseudoCost::new();
    let trip = candidate(0, BranchTarget::Trip(TripId(0)), 0.3);
    let maintenance = candidate(0, BranchTarget::Maintenance(MaintenanceId(0)), 0.5);

    // ACT
    let before = strategy.select(&[trip, maintenance]).unwrap();
    strategy.observe(&trip, false, 6.0);
    strategy.observe(&trip, true, 14.0);
    let after = strategy.select(&[trip, maintenance]).unwrap();

    // ASSERT
    // without history the pseudo costs are 1 and the more fractional candidate wins
    assert_eq!(before.target, maintenance.target);
    assert_eq!(after.target, trip.target);
    let (down, up) = strategy.pseudo_costs(BranchKind::VehicleTrip);
    assert!((down - 20.0).abs() < 1e-9);
    assert!((up - 20.0).abs() < 1e-9);
    assert_eq!(strategy.pseudo_costs(BranchKind::VehicleMaintenance), (1.0, 1.0));
}

#[test]
fn test_pseudo_cost_running_average() {
    // ARRANGE
    let strategy = PseudoCost::new();
    let trip = candidate(0, BranchTarget::Trip(TripId(0)), 0.5);

    // ACT
    strategy.observe(&trip, false, 1.0);
    strategy.observe(&trip, false, 3.0);
    strategy.observe(&trip, false, 0.0);

    // ASSERT
    // per unit changes 2 and 6, a zero change is ignored
    let (down, up) = strategy.pseudo_costs(BranchKind::VehicleTrip);
    assert!((down - 4.0).abs() < 1e-9);
    assert_eq!(up, 1.0);
}

#[test]
fn test_fixes_admit_columns() {
    // ARRANGE
    let d = scenario_b();
    let n0 = d.network_of(VehicleId(0));
    let n1 = d.network_of(VehicleId(1));
    let v0_t0 = column_along(&n0, &[n0.trip_node(TripId(0)).unwrap()]);
    let v0_t1 = column_along(&n0, &[n0.trip_node(TripId(1)).unwrap()]);
    let v1_t0 = column_along(&n1, &[n1.trip_node(TripId(0)).unwrap()]);
    let fix_one = Fixes::new().with(BranchFix {
        vehicle: VehicleId(0),
        target: BranchTarget::Trip(TripId(0)),
        value: true,
    });
    let fix_zero = Fixes::new().with(BranchFix {
        vehicle: VehicleId(0),
        target: BranchTarget::Trip(TripId(0)),
        value: false,
    });

    // ASSERT
    assert!(fix_one.admits(&v0_t0));
    assert!(fix_one.admits(&v0_t1));
    assert!(!fix_one.admits(&v1_t0));
    assert!(!fix_zero.admits(&v0_t0));
    assert!(fix_zero.admits(&v0_t1));
    assert!(fix_zero.admits(&v1_t0));
    assert_eq!(fix_one.fixed_to_one().count(), 1);
    assert_eq!(fix_zero.fixed_to_one().count(), 0);
}

#[test]
fn test_fixes_forbid_pricing_nodes() {
    // ARRANGE
    let fixes = Fixes::new()
        .with(BranchFix {
            vehicle: VehicleId(0),
            target: BranchTarget::Trip(TripId(0)),
            value: true,
        })
        .with(BranchFix {
            vehicle: VehicleId(1),
            target: BranchTarget::Charging(slot()),
            value: false,
        })
        .with(BranchFix {
            vehicle: VehicleId(0),
            target: BranchTarget::Charging(slot()),
            value: true,
        });

    // ASSERT
    let trip = Activity::Trip(TripId(0));
    let charging = Activity::Charging(slot());
    assert!(!fixes.forbids(VehicleId(0), &trip));
    assert!(fixes.forbids(VehicleId(1), &trip));
    assert!(fixes.forbids(VehicleId(1), &charging));
    // a charging slot fixed to one vehicle stays open for the others
    assert!(!fixes.forbids(VehicleId(2), &charging));
    assert!(!fixes.forbids(VehicleId(1), &Activity::Trip(TripId(1))));
    assert_eq!(fixes.len(), 3);
}
