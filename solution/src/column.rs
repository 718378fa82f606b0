
use std::fmt;

use itertools::Itertools;
use model::base_types::{ArcIdx, ChargerId, Cost, MaintenanceId, NodeIdx, TripId, VehicleId};
use model::errors::{Result, SchedulingError};
use model::network::nodes::{Activity, ChargingSlot};
use model::network::ActivityNetwork;
use model::resource_state::ResourceState;
use time::{DateTime, Duration};

/// Identifies a column independent of its cost, used to avoid duplicates in a column pool.
pub type ColumnSignature = (VehicleId, Vec<NodeIdx>);

/// A complete schedule of one vehicle for one planning horizon: a path from the start node to
/// the end node of the vehicle's [`ActivityNetwork`] that respects all resource bounds.
///
/// Node and arc indices refer to the network the column was generated in.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    vehicle: VehicleId,
    nodes: Vec<NodeIdx>,
    arcs: Vec<ArcIdx>,
    cost: Cost,
    trips: Vec<TripId>,
    maintenances: Vec<MaintenanceId>,
    charging_slots: Vec<ChargingSlot>,
    end_state: ResourceState,
}

// static functions
impl Column {
    /// Builds the column of the given arc sequence. The cost is the usage cost of the network plus
    /// the cost of every arc in the state it is traversed in.
    pub fn new(network: &ActivityNetwork, arcs: Vec<ArcIdx>) -> Result<Column> {
        let vehicle = network.vehicle();
        let mut nodes = vec![network.start()];
        for &arc in arcs.iter() {
            let arc = network.arc(arc);
            if Some(&arc.source()) != nodes.last() {
                return Err(SchedulingError::logic(format!(
                    "arcs of the column of vehicle {} are not consecutive",
                    vehicle
                )));
            }
            nodes.push(arc.target());
        }
        if nodes.last() != Some(&network.end()) {
            return Err(SchedulingError::logic(format!(
                "column of vehicle {} does not reach the end node",
                vehicle
            )));
        }

        let mut state = network.start_state();
        let mut cost = network.usage_cost();
        for &arc in arcs.iter() {
            cost += network.arc_cost(&state, arc);
            state = network.apply(&state, arc).ok_or_else(|| {
                SchedulingError::logic(format!(
                    "column of vehicle {} violates a resource bound at {}",
                    vehicle,
                    network.node(network.arc(arc).target())
                ))
            })?;
        }

        let mut trips = Vec::new();
        let mut maintenances = Vec::new();
        let mut charging_slots = Vec::new();
        for node in nodes.iter() {
            match network.node(*node).activity() {
                Activity::Trip(t) => trips.push(t),
                Activity::Maintenance(m) => maintenances.push(m),
                Activity::Charging(slot) => charging_slots.push(slot),
                _ => {}
            }
        }

        Ok(Column {
            vehicle,
            nodes,
            arcs,
            cost,
            trips,
            maintenances,
            charging_slots,
            end_state: state,
        })
    }
}

// methods
impl Column {
    pub fn vehicle(&self) -> VehicleId {
        self.vehicle
    }

    pub fn nodes(&self) -> &[NodeIdx] {
        &self.nodes
    }

    pub fn arcs(&self) -> &[ArcIdx] {
        &self.arcs
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub fn trips(&self) -> &[TripId] {
        &self.trips
    }

    pub fn maintenances(&self) -> &[MaintenanceId] {
        &self.maintenances
    }

    pub fn charging_slots(&self) -> &[ChargingSlot] {
        &self.charging_slots
    }

    /// state at the end node
    pub fn end_state(&self) -> ResourceState {
        self.end_state
    }

    pub fn covers_trip(&self, trip: TripId) -> bool {
        self.trips.contains(&trip)
    }

    pub fn covers_maintenance(&self, maintenance: MaintenanceId) -> bool {
        self.maintenances.contains(&maintenance)
    }

    pub fn uses_charging_slot(&self, slot: &ChargingSlot) -> bool {
        self.charging_slots.contains(slot)
    }

    /// true if the vehicle only waits or charges
    pub fn is_idle(&self) -> bool {
        self.trips.is_empty() && self.maintenances.is_empty()
    }

    /// All (charger, checkpoint) pairs this column occupies, see [`ChargingSlot::checkpoints`].
    pub fn occupied_checkpoints(
        &self,
        origin: DateTime,
        interval: Duration,
    ) -> Vec<(ChargerId, usize)> {
        self.charging_slots
            .iter()
            .flat_map(|slot| {
                slot.checkpoints(origin, interval)
                    .map(move |k| (slot.charger, k))
            })
            .unique()
            .collect()
    }

    pub fn signature(&self) -> ColumnSignature {
        (self.vehicle, self.nodes.clone())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "column of vehicle {} (cost: {:.2}, trips: [{}], maintenances: [{}], charging: {})",
            self.vehicle,
            self.cost,
            self.trips.iter().join(", "),
            self.maintenances.iter().join(", "),
            self.charging_slots.len()
        )
    }
}
