#[cfg(test)]
mod tests;

use model::base_types::{ChargerId, Kwh, Meter, VehicleId};
use model::errors::{Result, SchedulingError};
use model::instance::Instance;
use model::network::nodes::Activity;
use model::resource_state::ResourceState;
use serde::Serialize;

use crate::schedule::{CostBreakdown, Schedule};
use crate::statistics::Statistics;
use crate::vehicle_schedule::Stop;

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JsonVehicleSchedule {
    vehicle: VehicleId,
    stops: Vec<JsonStop>,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JsonStop {
    #[serde(flatten)]
    activity: JsonActivity,
    start_time: String,
    end_time: String,
    state_of_charge_in_kwh: Kwh,
    odometer_in_meter: Meter,
    distance_since_maintenance_in_meter: Meter,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase", tag = "type")]
enum JsonActivity {
    #[serde(rename_all = "camelCase")]
    Start { location: String },
    #[serde(rename_all = "camelCase")]
    ServiceTrip {
        id: usize,
        origin: String,
        destination: String,
    },
    #[serde(rename_all = "camelCase")]
    Charging {
        charger: ChargerId,
        location: String,
        energy_charged_in_kwh: Kwh,
    },
    #[serde(rename_all = "camelCase")]
    Maintenance { id: usize, location: String },
    #[serde(rename_all = "camelCase")]
    DeadHeadTrip {
        origin: String,
        destination: String,
        distance_in_meter: Meter,
    },
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
struct JsonSchedule {
    schedules: Vec<JsonVehicleSchedule>,
    unassigned_trips: Vec<usize>,
    unassigned_maintenances: Vec<usize>,
    costs: CostBreakdown,
    proven_optimal: bool,
}

/// The schedule with location names resolved, ready to be written by the output layer.
pub fn schedule_to_json(schedule: &Schedule, instance: &Instance) -> Result<serde_json::Value> {
    let json_schedule = JsonSchedule {
        schedules: schedule
            .vehicles()
            .map(|v| JsonVehicleSchedule {
                vehicle: v.vehicle(),
                stops: v
                    .stops()
                    .iter()
                    .filter_map(|stop| json_stop(stop, instance))
                    .collect(),
            })
            .collect(),
        unassigned_trips: schedule.unassigned_trips().iter().map(|t| t.0).collect(),
        unassigned_maintenances: schedule
            .unassigned_maintenances()
            .iter()
            .map(|m| m.0)
            .collect(),
        costs: schedule.costs(),
        proven_optimal: schedule.is_proven_optimal(),
    };
    to_value(&json_schedule)
}

pub fn statistics_to_json(statistics: &Statistics) -> Result<serde_json::Value> {
    to_value(statistics)
}

fn to_value<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|err| SchedulingError::logic(format!("serialisation failed: {}", err)))
}

fn json_stop(stop: &Stop, instance: &Instance) -> Option<JsonStop> {
    let locations = instance.locations();
    let origin = locations.name(stop.start_location()).to_string();
    let destination = locations.name(stop.end_location()).to_string();
    let activity = match stop.activity() {
        Activity::Start => JsonActivity::Start { location: origin },
        Activity::Trip(t) => JsonActivity::ServiceTrip {
            id: t.0,
            origin,
            destination,
        },
        Activity::Charging(slot) => JsonActivity::Charging {
            charger: slot.charger,
            location: origin,
            energy_charged_in_kwh: stop.energy_charged(),
        },
        Activity::Maintenance(m) => JsonActivity::Maintenance {
            id: m.0,
            location: origin,
        },
        Activity::Deadleg => JsonActivity::DeadHeadTrip {
            origin,
            destination,
            distance_in_meter: stop.distance(),
        },
        Activity::End => return None,
    };
    let state: ResourceState = stop.state();
    Some(JsonStop {
        activity,
        start_time: stop.start_time().as_iso(),
        end_time: stop.end_time().as_iso(),
        state_of_charge_in_kwh: state.soc(),
        odometer_in_meter: state.odometer(),
        distance_since_maintenance_in_meter: state.distance_since_maintenance(),
    })
}
