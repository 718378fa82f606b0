use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use model::base_types::VehicleId;
use model::test_utilities::{scenario_b, scenario_c, scenario_odd_cycle};
use solution::statistics::StatisticsRecorder;
use solver::branching::Fixes;
use solver::master_problem::Duals;
use solver::pricing::{PricingBudget, PricingSolver};
use solver::HorizonScheduler;

pub fn pricing_benchmarks(c: &mut Criterion) {
    let d = scenario_b();
    let network = d.network_of(VehicleId(0));
    let pricing = PricingSolver::new(&d.config);
    let mut duals = Duals::default();
    for trip in d.instance.trips() {
        duals.set_trip(trip.id(), 2000.0);
    }
    c.bench_function("price_scenario_b", |b| {
        b.iter(|| {
            pricing
                .solve(&network, &duals, &Fixes::new(), &PricingBudget::unlimited())
                .unwrap();
        })
    });

    let d = scenario_c(1);
    let network = d.network_of(VehicleId(0));
    let pricing = PricingSolver::new(&d.config);
    c.bench_function("price_with_charging", |b| {
        b.iter(|| {
            pricing
                .solve(&network, &duals, &Fixes::new(), &PricingBudget::unlimited())
                .unwrap();
        })
    });

    let d = scenario_odd_cycle();
    let scheduler = HorizonScheduler::new(d.instance.clone(), Arc::clone(&d.config));
    c.bench_function("branch_and_price_odd_cycle", |b| {
        b.iter(|| {
            let mut recorder = StatisticsRecorder::new();
            scheduler
                .run(d.period_start, d.period_end, &mut recorder)
                .unwrap();
        })
    });
}

criterion_group!(benches, pricing_benchmarks);
criterion_main!(benches);
