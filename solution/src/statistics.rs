
use std::collections::BTreeMap;

use model::base_types::{meter_to_km, ChargerId, Cost, Kwh, MaintenanceId, TripId, VehicleId};
use model::network::nodes::Activity;
use serde::Serialize;
use time::DateTime;

use crate::schedule::{CostBreakdown, Schedule};

/// One column-generation iteration or one branching decision. Fields that do not apply to the
/// kind of record are `None` (serialised as `null`).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceDetail {
    pub horizon: usize,
    pub branch_node: usize,
    pub iteration: Option<usize>,
    pub objective: Option<Cost>,
    pub lower_bound: Option<Cost>,
    pub gap: Option<f64>,
    pub master_time: Option<f64>,
    pub pricing_time: Option<f64>,
    pub auxiliary_time: Option<f64>,
    pub lp_rows: Option<usize>,
    pub lp_columns: Option<usize>,
    pub columns_added: Option<usize>,
    pub network_nodes: Option<usize>,
    pub network_arcs: Option<usize>,
    pub lazy_constraint_added: Option<bool>,
    pub branch_type: Option<String>,
    pub branch_parent: Option<usize>,
    pub branch_vehicle: Option<VehicleId>,
    pub branch_target: Option<String>,
    pub fractional_value: Option<f64>,
    pub branch_value: Option<u8>,
}

/// Outcome of one planning horizon.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanningHorizonSummary {
    pub horizon: usize,
    pub start: DateTime,
    pub end: DateTime,
    pub window_end: DateTime,
    pub lower_bound: Option<Cost>,
    pub upper_bound: Option<Cost>,
    pub gap: Option<f64>,
    pub schedules_generated: usize,
    pub unassigned_trips: Vec<TripId>,
    pub unassigned_maintenances: Vec<MaintenanceId>,
    pub vehicles_selected: usize,
    pub network_time: f64,
    pub solve_time: f64,
    pub tree_depth: usize,
    pub tree_size: usize,
    pub algorithm: String,
    pub proven_optimal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleCostRecord {
    #[serde(flatten)]
    pub costs: CostBreakdown,
    pub proven_optimal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleUtilisation {
    pub vehicle: VehicleId,
    pub trips: usize,
    pub maintenances: usize,
    pub distance_in_km: f64,
    pub deadleg_distance_in_km: f64,
    pub energy_charged_in_kwh: Kwh,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargerUtilisation {
    pub charger: ChargerId,
    pub sessions: usize,
    pub energy_charged_in_kwh: Kwh,
    pub peak_occupancy: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub performance: Vec<PerformanceDetail>,
    pub horizons: Vec<PlanningHorizonSummary>,
    pub costs: Vec<ScheduleCostRecord>,
    pub vehicles: Vec<VehicleUtilisation>,
    pub chargers: Vec<ChargerUtilisation>,
}

/// Collects the records of a run. It is handed down as `&mut` to every component that reports.
#[derive(Debug, Default)]
pub struct StatisticsRecorder {
    statistics: Statistics,
}

impl StatisticsRecorder {
    pub fn new() -> StatisticsRecorder {
        StatisticsRecorder::default()
    }

    pub fn record_performance(&mut self, detail: PerformanceDetail) {
        self.statistics.performance.push(detail);
    }

    pub fn record_horizon(&mut self, summary: PlanningHorizonSummary) {
        self.statistics.horizons.push(summary);
    }

    /// Records the cost breakdown and the utilisation of vehicles and chargers of a finished
    /// schedule.
    pub fn record_schedule(&mut self, schedule: &Schedule) {
        self.statistics.costs.push(ScheduleCostRecord {
            costs: schedule.costs(),
            proven_optimal: schedule.is_proven_optimal(),
        });

        self.statistics.vehicles = schedule
            .vehicles()
            .map(|v| VehicleUtilisation {
                vehicle: v.vehicle(),
                trips: v.trips().count(),
                maintenances: v.maintenances().count(),
                distance_in_km: meter_to_km(v.distance()),
                deadleg_distance_in_km: meter_to_km(v.deadleg_distance()),
                energy_charged_in_kwh: v.energy_charged(),
            })
            .collect();

        let mut sessions: BTreeMap<ChargerId, Vec<(DateTime, DateTime, Kwh)>> = BTreeMap::new();
        for stop in schedule.vehicles().flat_map(|v| v.stops()) {
            if let Activity::Charging(slot) = stop.activity() {
                sessions.entry(slot.charger).or_default().push((
                    stop.start_time(),
                    stop.end_time(),
                    stop.energy_charged(),
                ));
            }
        }
        self.statistics.chargers = sessions
            .into_iter()
            .map(|(charger, sessions)| ChargerUtilisation {
                charger,
                sessions: sessions.len(),
                energy_charged_in_kwh: sessions.iter().map(|s| s.2).sum(),
                peak_occupancy: peak_occupancy(&sessions),
            })
            .collect();
    }

    pub fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    pub fn into_statistics(self) -> Statistics {
        self.statistics
    }
}

/// Maximal number of simultaneously running half-open intervals.
fn peak_occupancy(sessions: &[(DateTime, DateTime, Kwh)]) -> usize {
    // at equal times, departures (-1) are processed before arrivals (+1)
    let mut events: Vec<(DateTime, i64)> = sessions
        .iter()
        .flat_map(|(start, end, _)| [(*start, 1), (*end, -1)])
        .collect();
    events.sort();
    let mut current: i64 = 0;
    let mut peak: i64 = 0;
    for (_, delta) in events {
        current += delta;
        peak = peak.max(current);
    }
    peak as usize
}
