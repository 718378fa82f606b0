
use std::time::Instant;

use model::base_types::{ArcIdx, Cost, NodeIdx, VehicleId};
use model::config::Config;
use model::errors::{Result, SchedulingError};
use model::network::nodes::Activity;
use model::network::ActivityNetwork;
use model::resource_state::ResourceState;
use solution::Column;
use tracing::debug;

use crate::branching::Fixes;
use crate::master_problem::Duals;

/// Limits of one pricing run. If one is hit the run stops after the current node and the
/// result is not proven optimal.
#[derive(Debug, Clone, Copy)]
pub struct PricingBudget {
    pub label_limit: usize,
    pub deadline: Option<Instant>,
}

impl PricingBudget {
    pub fn unlimited() -> PricingBudget {
        PricingBudget {
            label_limit: usize::MAX,
            deadline: None,
        }
    }

    fn is_exhausted(&self, labels: usize) -> bool {
        labels >= self.label_limit || self.deadline.map_or(false, |d| Instant::now() >= d)
    }
}

#[derive(Debug, Clone)]
pub struct PricedColumn {
    pub column: Column,
    pub reduced_cost: f64,
}

#[derive(Debug, Clone)]
pub struct PricingOutcome {
    pub vehicle: VehicleId,
    /// columns with negative reduced cost, most negative first
    pub columns: Vec<PricedColumn>,
    /// minimal reduced cost over all paths found, negative or not
    pub min_reduced_cost: f64,
    /// false if a budget stopped the label extension early
    pub proven_optimal: bool,
    pub labels: usize,
}

#[derive(Debug, Clone)]
struct Label {
    state: ResourceState,
    cost: Cost,
    reduced_cost: f64,
    /// previous label and the arc leading here
    predecessor: Option<(usize, ArcIdx)>,
}

/// Label-setting resource-constrained shortest path on the acyclic activity network of one
/// vehicle. Resources are the state of charge and the distance since maintenance, the
/// odometer is carried along.
pub struct PricingSolver {
    max_columns: usize,
    eps: f64,
}

impl PricingSolver {
    pub fn new(config: &Config) -> PricingSolver {
        PricingSolver {
            max_columns: config.budgets.columns_per_vehicle_per_iteration,
            eps: config.tolerances.eps,
        }
    }

    pub fn solve(
        &self,
        network: &ActivityNetwork,
        duals: &Duals,
        fixes: &Fixes,
        budget: &PricingBudget,
    ) -> Result<PricingOutcome> {
        let vehicle = network.vehicle();
        let window = network.window();
        let check_interval = network.config().durations.charger_capacity_check;

        let prize = |node: NodeIdx| -> f64 {
            let activity = network.node(node).activity();
            match activity {
                Activity::Trip(t) => duals.trip(t) + duals.fix(vehicle, &activity),
                Activity::Maintenance(m) => {
                    duals.maintenance(m) + duals.fix(vehicle, &activity)
                }
                Activity::Charging(slot) => {
                    slot.checkpoints(window.start, check_interval)
                        .map(|k| duals.checkpoint(slot.charger, k))
                        .sum::<f64>()
                        + duals.fix(vehicle, &activity)
                }
                Activity::End => duals.vehicle(vehicle),
                Activity::Start | Activity::Deadleg => 0.0,
            }
        };

        let mut labels: Vec<Label> = vec![Label {
            state: network.start_state(),
            cost: network.usage_cost(),
            reduced_cost: network.usage_cost(),
            predecessor: None,
        }];
        let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); network.num_nodes()];
        buckets[network.start().0].push(0);
        let mut proven_optimal = true;

        for node in network.topological_order() {
            if node == network.end() {
                break;
            }
            let current = std::mem::take(&mut buckets[node.0]);
            for &label_idx in current.iter() {
                for &arc in network.outgoing(node) {
                    let target = network.arc(arc).target();
                    if fixes.forbids(vehicle, &network.node(target).activity()) {
                        continue;
                    }
                    let label = &labels[label_idx];
                    let Some(state) = network.apply(&label.state, arc) else {
                        continue;
                    };
                    let arc_cost = network.arc_cost(&label.state, arc);
                    let extended = Label {
                        state,
                        cost: label.cost + arc_cost,
                        reduced_cost: label.reduced_cost + arc_cost - prize(target),
                        predecessor: Some((label_idx, arc)),
                    };
                    self.insert(&mut labels, &mut buckets[target.0], extended);
                }
            }
            buckets[node.0] = current;
            if budget.is_exhausted(labels.len()) {
                proven_optimal = false;
                break;
            }
        }

        let mut at_end: Vec<usize> = buckets[network.end().0].clone();
        if at_end.is_empty() {
            return Err(SchedulingError::logic(format!(
                "no label reached the end node of vehicle {}",
                vehicle
            )));
        }
        at_end.sort_by(|a, b| labels[*a].reduced_cost.total_cmp(&labels[*b].reduced_cost));
        let min_reduced_cost = labels[at_end[0]].reduced_cost;

        let columns = at_end
            .iter()
            .filter(|l| labels[**l].reduced_cost < -self.eps)
            .take(self.max_columns)
            .map(|l| {
                Ok(PricedColumn {
                    column: Column::new(network, path_of(&labels, *l))?,
                    reduced_cost: labels[*l].reduced_cost,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "pricing vehicle {}: {} labels, min reduced cost {:.3}, {} columns{}",
            vehicle,
            labels.len(),
            min_reduced_cost,
            columns.len(),
            if proven_optimal { "" } else { " (budget hit)" }
        );

        Ok(PricingOutcome {
            vehicle,
            columns,
            min_reduced_cost,
            proven_optimal,
            labels: labels.len(),
        })
    }

    /// Adds the label to the bucket unless it is dominated, and drops the labels it dominates.
    fn insert(&self, labels: &mut Vec<Label>, bucket: &mut Vec<usize>, label: Label) {
        if bucket
            .iter()
            .any(|other| self.dominates(&labels[*other], &label))
        {
            return;
        }
        bucket.retain(|other| !self.dominates(&label, &labels[*other]));
        labels.push(label);
        bucket.push(labels.len() - 1);
    }

    fn dominates(&self, a: &Label, b: &Label) -> bool {
        a.reduced_cost <= b.reduced_cost + self.eps
            && a.state.soc() >= b.state.soc() - self.eps
            && a.state.distance_since_maintenance() <= b.state.distance_since_maintenance()
    }
}

fn path_of(labels: &[Label], last: usize) -> Vec<ArcIdx> {
    let mut arcs = Vec::new();
    let mut current = last;
    while let Some((previous, arc)) = labels[current].predecessor {
        arcs.push(arc);
        current = previous;
    }
    arcs.reverse();
    arcs
}
