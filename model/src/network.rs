pub mod arcs;
pub mod nodes;


use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use time::{DateTime, Duration};
use tracing::debug;

use crate::base_types::{
    meter_to_km, ArcIdx, Cost, Kwh, LocationId, MaintenanceId, Meter, NodeIdx, TripId,
    VehicleId,
};
use crate::config::Config;
use crate::errors::{Result, SchedulingError};
use crate::instance::Instance;
use crate::resource_state::ResourceState;
use crate::vehicles::Vehicle;

use arcs::{ActivityArc, ArcSpec};
use nodes::{Activity, ActivityNode, ChargingSlot};

/// Half-open interval [start, end) of activity start times covered by a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime,
    pub end: DateTime,
}

/// Where, when and in which state a vehicle enters a planning horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VehicleStart {
    pub location: LocationId,
    pub time: DateTime,
    pub state: ResourceState,
    /// the vehicle already performed activities in an earlier horizon, its usage cost is paid
    pub in_service: bool,
}

/// Time-expanded activity network of a single vehicle for one time window.
///
/// Nodes and arcs are stored in arenas and addressed by [`NodeIdx`] and [`ArcIdx`]. Nodes are
/// sorted topologically (start node first, end node last, the rest by start time) and every arc
/// goes from a lower to a higher index. The network is read-only after construction.
pub struct ActivityNetwork {
    vehicle: VehicleId,
    window: TimeWindow,
    start_state: ResourceState,
    usage_cost: Cost,
    nodes: Vec<ActivityNode>,
    arcs: Vec<ActivityArc>,
    outgoing: Vec<Vec<ArcIdx>>,
    incoming: Vec<Vec<ArcIdx>>,
    trip_nodes: HashMap<TripId, NodeIdx>,
    maintenance_nodes: HashMap<MaintenanceId, NodeIdx>,
    instance: Arc<Instance>,
    config: Arc<Config>,
}

#[derive(Default)]
struct SlotLinks {
    predecessors: Vec<usize>,
    successors: Vec<usize>,
    to_end: bool,
    charging_time: Duration,
}

// methods
impl ActivityNetwork {
    pub fn vehicle(&self) -> VehicleId {
        self.vehicle
    }

    pub fn vehicle_data(&self) -> &Vehicle {
        self.instance.vehicle(self.vehicle)
    }

    pub fn window(&self) -> TimeWindow {
        self.window
    }

    pub fn start_state(&self) -> ResourceState {
        self.start_state
    }

    /// Fixed cost of every path of this network. Zero if the vehicle is already in service or
    /// the number of vehicles is not minimised.
    pub fn usage_cost(&self) -> Cost {
        self.usage_cost
    }

    pub fn instance(&self) -> &Arc<Instance> {
        &self.instance
    }

    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn node(&self, idx: NodeIdx) -> &ActivityNode {
        &self.nodes[idx.0]
    }

    pub fn arc(&self, idx: ArcIdx) -> &ActivityArc {
        &self.arcs[idx.0]
    }

    pub fn outgoing(&self, idx: NodeIdx) -> &[ArcIdx] {
        &self.outgoing[idx.0]
    }

    pub fn incoming(&self, idx: NodeIdx) -> &[ArcIdx] {
        &self.incoming[idx.0]
    }

    pub fn start(&self) -> NodeIdx {
        NodeIdx(0)
    }

    pub fn end(&self) -> NodeIdx {
        NodeIdx(self.nodes.len() - 1)
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_arcs(&self) -> usize {
        self.arcs.len()
    }

    /// All nodes in an order in which every arc points forward.
    pub fn topological_order(&self) -> impl Iterator<Item = NodeIdx> {
        (0..self.nodes.len()).map(NodeIdx)
    }

    pub fn trip_node(&self, trip: TripId) -> Option<NodeIdx> {
        self.trip_nodes.get(&trip).copied()
    }

    pub fn maintenance_node(&self, maintenance: MaintenanceId) -> Option<NodeIdx> {
        self.maintenance_nodes.get(&maintenance).copied()
    }

    pub fn arc_between(&self, source: NodeIdx, target: NodeIdx) -> Option<ArcIdx> {
        self.outgoing[source.0]
            .iter()
            .copied()
            .find(|a| self.arcs[a.0].target() == target)
    }

    /// Resource propagation along an arc, see [`ResourceState::apply`].
    pub fn apply(&self, state: &ResourceState, arc: ArcIdx) -> Option<ResourceState> {
        state.apply(&self.arcs[arc.0], self.vehicle_data())
    }

    /// Deadleg cost plus the maintenance penalty of traversing `arc` in `state`.
    pub fn arc_cost(&self, state: &ResourceState, arc: ArcIdx) -> Cost {
        let arc = &self.arcs[arc.0];
        arc.cost()
            + state.maintenance_penalty(arc, self.config.costs.maintenance_penalty_coefficient)
    }
}

// static functions
impl ActivityNetwork {
    pub fn new(
        instance: Arc<Instance>,
        config: Arc<Config>,
        vehicle: VehicleId,
        start: VehicleStart,
        window: TimeWindow,
    ) -> Result<ActivityNetwork> {
        let locations = instance.locations();
        let durations = &config.durations;

        // 1) collect the activities of the window
        let mut candidates: Vec<ActivityNode> =
            vec![ActivityNode::create_start_node(start.location, start.time)];
        for trip in instance.trips() {
            if trip.departure() >= window.start
                && trip.departure() < window.end
                && trip.departure() >= start.time
            {
                candidates.push(ActivityNode::create_trip_node(trip));
            }
        }
        for maintenance in instance.maintenances() {
            if maintenance.is_available_for(vehicle)
                && maintenance.start() >= window.start
                && maintenance.start() < window.end
                && maintenance.start() >= start.time
            {
                candidates.push(ActivityNode::create_maintenance_node(maintenance));
            }
        }
        let num_core = candidates.len();

        // 2) charging between two activities and at the end of the window
        let mut slots: BTreeMap<ChargingSlot, SlotLinks> = BTreeMap::new();
        for (from_idx, from) in candidates.iter().enumerate() {
            for charger in instance.chargers() {
                let to_charger = locations.travel(from.end_location(), charger.location());
                if !deadleg_allowed(&config, to_charger.distance()) {
                    continue;
                }
                let arrival = from.end_time() + to_charger.duration();

                for (to_idx, to) in candidates.iter().enumerate().skip(1) {
                    if to_idx == from_idx || !within_idle_limit(&config, from, to) {
                        continue;
                    }
                    let from_charger = locations.travel(charger.location(), to.start_location());
                    if !deadleg_allowed(&config, from_charger.distance()) {
                        continue;
                    }
                    let departure = to.start_time() - from_charger.duration();
                    if departure <= arrival {
                        continue;
                    }
                    let occupied = departure - arrival;
                    let overhead = durations.put_on_charge + durations.take_off_charge;
                    if occupied <= overhead {
                        continue;
                    }
                    let links = slots
                        .entry(ChargingSlot {
                            charger: charger.id(),
                            start: arrival,
                            end: departure,
                        })
                        .or_default();
                    links.charging_time = occupied - overhead;
                    push_unique(&mut links.predecessors, from_idx);
                    push_unique(&mut links.successors, to_idx);
                }

                if arrival < window.end
                    && window.end.saturating_duration_since(arrival) > durations.put_on_charge
                {
                    let links = slots
                        .entry(ChargingSlot {
                            charger: charger.id(),
                            start: arrival,
                            end: window.end,
                        })
                        .or_default();
                    links.charging_time = (window.end - arrival) - durations.put_on_charge;
                    links.to_end = true;
                    push_unique(&mut links.predecessors, from_idx);
                }
            }
        }

        // 3) sort all nodes topologically
        let slot_list: Vec<(ChargingSlot, SlotLinks)> = slots.into_iter().collect();
        for (slot, _) in slot_list.iter() {
            let location = instance.charger(slot.charger).location();
            candidates.push(ActivityNode::create_charging_node(*slot, location));
        }
        candidates.push(ActivityNode::create_end_node(start.location));
        let end_candidate = candidates.len() - 1;

        let mut order: Vec<usize> = (0..candidates.len()).collect();
        order.sort_by(|a, b| candidates[*a].cmp_start_time(&candidates[*b]));
        let mut new_index = vec![0; candidates.len()];
        for (new, old) in order.iter().enumerate() {
            new_index[*old] = new;
        }
        let mut slot_of_node: Vec<Option<usize>> = vec![None; candidates.len()];
        for (i, _) in slot_list.iter().enumerate() {
            slot_of_node[new_index[num_core + i]] = Some(i);
        }
        let mut nodes: Vec<Option<ActivityNode>> = candidates.into_iter().map(Some).collect();
        let nodes: Vec<ActivityNode> = order
            .iter()
            .filter_map(|old| nodes[*old].take())
            .collect();

        let mut network = ActivityNetwork {
            vehicle,
            window,
            start_state: start.state,
            usage_cost: if start.in_service || !config.flags.minimise_vehicles {
                0.0
            } else {
                config.costs.vehicle_usage
            },
            outgoing: vec![Vec::new(); nodes.len()],
            incoming: vec![Vec::new(); nodes.len()],
            nodes,
            arcs: Vec::new(),
            trip_nodes: HashMap::new(),
            maintenance_nodes: HashMap::new(),
            instance: instance.clone(),
            config: config.clone(),
        };
        for (idx, node) in network.nodes.iter().enumerate() {
            if let Some(trip) = node.trip() {
                network.trip_nodes.insert(trip, NodeIdx(idx));
            }
            if let Some(maintenance) = node.maintenance() {
                network.maintenance_nodes.insert(maintenance, NodeIdx(idx));
            }
        }

        // 4) arcs between the activities (start and end included)
        let end = NodeIdx(new_index[end_candidate]);
        let core: Vec<NodeIdx> = (0..num_core).map(|old| NodeIdx(new_index[old])).collect();
        for &u in core.iter() {
            for &w in core.iter() {
                if w <= u {
                    continue;
                }
                let (from, to) = (network.node(u), network.node(w));
                if !within_idle_limit(&config, from, to) {
                    continue;
                }
                let travel = locations.travel(from.end_location(), to.start_location());
                if deadleg_allowed(&config, travel.distance())
                    && from.end_time() + travel.duration() <= to.start_time()
                {
                    network.add_arc(u, w, travel.distance(), travel.duration(), 0.0);
                }
            }
            if !config.flags.end_at_charger || network.node(u).is_start() {
                network.add_arc(u, end, 0, Duration::zero(), 0.0);
            }
        }

        // 5) arcs into and out of the charging nodes
        for (idx, slot_idx) in slot_of_node.iter().enumerate() {
            let Some(slot_idx) = slot_idx else {
                continue;
            };
            let charging = NodeIdx(idx);
            let (slot, links) = &slot_list[*slot_idx];
            let charger_location = instance.charger(slot.charger).location();
            let recharge = instance.charger(slot.charger).energy_for(links.charging_time);

            for &pred in links.predecessors.iter() {
                let u = NodeIdx(new_index[pred]);
                if u >= charging {
                    return Err(SchedulingError::logic(format!(
                        "charging arc {} -> {} of vehicle {} goes backwards in time",
                        network.node(u),
                        network.node(charging),
                        vehicle
                    )));
                }
                let travel = locations.travel(network.node(u).end_location(), charger_location);
                network.add_arc(
                    u,
                    charging,
                    travel.distance(),
                    travel.duration(),
                    recharge,
                );
            }
            for &succ in links.successors.iter() {
                let w = NodeIdx(new_index[succ]);
                if w <= charging {
                    return Err(SchedulingError::logic(format!(
                        "charging arc {} -> {} of vehicle {} goes backwards in time",
                        network.node(charging),
                        network.node(w),
                        vehicle
                    )));
                }
                let travel = locations.travel(charger_location, network.node(w).start_location());
                network.add_arc(
                    charging,
                    w,
                    travel.distance(),
                    travel.duration(),
                    0.0,
                );
            }
            if links.to_end {
                network.add_arc(charging, end, 0, Duration::zero(), 0.0);
            }
        }

        debug!(
            "activity network of vehicle {}: {} nodes, {} arcs ({} charging slots)",
            vehicle,
            network.num_nodes(),
            network.num_arcs(),
            slot_list.len()
        );
        Ok(network)
    }

    fn add_arc(
        &mut self,
        source: NodeIdx,
        target: NodeIdx,
        deadleg_distance: Meter,
        deadleg_duration: Duration,
        recharge: Kwh,
    ) {
        let to = &self.nodes[target.0];
        let activity_distance = match to.activity() {
            Activity::Trip(trip) => self.instance.trip(trip).distance(),
            _ => 0,
        };
        let cost = if deadleg_distance > 0 {
            self.config.costs.deadleg_fix
                + self.config.costs.deadleg_per_km * meter_to_km(deadleg_distance)
        } else {
            0.0
        };
        let arc = ActivityArc::new(
            source,
            target,
            ArcSpec {
                deadleg_distance,
                deadleg_duration,
                activity_distance,
                recharge,
                resets_maintenance: to.maintenance().is_some(),
                cost,
            },
        );
        let idx = ArcIdx(self.arcs.len());
        self.arcs.push(arc);
        self.outgoing[source.0].push(idx);
        self.incoming[target.0].push(idx);
    }
}

fn deadleg_allowed(config: &Config, distance: Meter) -> bool {
    distance == 0 || config.flags.allow_deadlegs
}

/// Waiting is only bounded between two activities, not before the first or after the last one.
fn within_idle_limit(config: &Config, from: &ActivityNode, to: &ActivityNode) -> bool {
    from.is_start()
        || to.is_end()
        || to.start_time() < from.end_time()
        || to.start_time() - from.end_time() <= config.durations.max_idle_time
}

fn push_unique(list: &mut Vec<usize>, value: usize) {
    if !list.contains(&value) {
        list.push(value);
    }
}
