
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use itertools::Itertools;
use model::base_types::{Cost, MaintenanceId, TripId, EPS};
use model::config::Config;
use model::errors::{Result, SchedulingError};
use model::instance::Instance;
use model::network::ActivityNetwork;
use solution::statistics::{PerformanceDetail, StatisticsRecorder};
use solution::Column;
use tracing::{debug, info, warn};

use crate::branching::{BranchCandidate, BranchFix, BranchingStrategy, Fixes, Lookahead};
use crate::column_generation::{deadline_after, ColumnGeneration};
use crate::column_pool::ColumnPool;
use crate::master_problem::{MasterProblem, MasterSolution};

pub type BranchNodeIdx = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    Open,
    /// bound not better than the incumbent
    Pruned,
    /// fixes can not be satisfied
    Infeasible,
    /// LP solution is integral
    Integral,
    Branched,
}

#[derive(Debug, Clone)]
pub struct BranchNode {
    idx: BranchNodeIdx,
    parent: Option<BranchNodeIdx>,
    depth: usize,
    fixes: Fixes,
    /// Lower bound. Inherited from the parent until the node is solved.
    bound: f64,
    solved: bool,
    status: NodeStatus,
    /// decision that created this node
    branch: Option<(BranchCandidate, bool)>,
}

impl BranchNode {
    pub fn idx(&self) -> BranchNodeIdx {
        self.idx
    }

    pub fn parent(&self) -> Option<BranchNodeIdx> {
        self.parent
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn fixes(&self) -> &Fixes {
        &self.fixes
    }

    pub fn bound(&self) -> f64 {
        self.bound
    }

    pub fn is_solved(&self) -> bool {
        self.solved
    }

    pub fn status(&self) -> NodeStatus {
        self.status
    }
}

/// Entry of the open set: smallest bound first, then the deeper node, then the older one.
#[derive(Debug, Clone, Copy)]
struct OpenNode {
    bound: f64,
    depth: usize,
    idx: BranchNodeIdx,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    // BinaryHeap is a max-heap, so "greater" means "pop first"
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .bound
            .total_cmp(&self.bound)
            .then(self.depth.cmp(&other.depth))
            .then(other.idx.cmp(&self.idx))
    }
}

/// Best integer solution known.
#[derive(Debug, Clone)]
pub struct Incumbent {
    pub columns: Vec<Arc<Column>>,
    pub objective: Cost,
    pub unassigned_trips: Vec<TripId>,
    pub unassigned_maintenances: Vec<MaintenanceId>,
}

#[derive(Debug, Clone)]
pub struct TreeOutcome {
    pub incumbent: Incumbent,
    /// global lower bound, `None` if no finite bound is known
    pub lower_bound: Option<Cost>,
    pub proven_optimal: bool,
    pub tree_size: usize,
    pub tree_depth: usize,
    pub columns_generated: usize,
    pub algorithm: &'static str,
}

/// Branch-and-price over the vehicle networks of one planning horizon. Nodes are solved by
/// column generation and explored best-bound-first. Every `nth_node_dive`-th node, starting
/// with the root, a dive looks for an incumbent below it.
pub struct BranchAndPrice {
    instance: Arc<Instance>,
    config: Arc<Config>,
    networks: Vec<Arc<ActivityNetwork>>,
    master: MasterProblem,
    pool: ColumnPool,
    strategy: Arc<dyn BranchingStrategy>,
    horizon: usize,
    nodes: Vec<BranchNode>,
}

// static functions
impl BranchAndPrice {
    pub fn new(
        instance: Arc<Instance>,
        config: Arc<Config>,
        networks: Vec<Arc<ActivityNetwork>>,
        master: MasterProblem,
        strategy: Arc<dyn BranchingStrategy>,
        horizon: usize,
    ) -> BranchAndPrice {
        BranchAndPrice {
            instance,
            config,
            networks,
            master,
            pool: ColumnPool::new(),
            strategy,
            horizon,
            nodes: Vec::new(),
        }
    }
}

// methods
impl BranchAndPrice {
    pub fn nodes(&self) -> &[BranchNode] {
        &self.nodes
    }

    pub fn pool(&self) -> &ColumnPool {
        &self.pool
    }

    pub fn solve(&mut self, recorder: &mut StatisticsRecorder) -> Result<TreeOutcome> {
        let start = Instant::now();
        let budgets = &self.config.budgets;
        let deadline = deadline_after(start, budgets.branch_and_price_time_limit);
        let terminate_after_root = self.config.flags.terminate_after_root;
        let cg = ColumnGeneration::new(&self.networks, &self.pool, &self.config, self.horizon);
        let truncated_cg =
            ColumnGeneration::new(&self.networks, &self.pool, &self.config, self.horizon)
                .truncated(budgets.truncated_column_generation_iterations);

        let mut incumbent = Incumbent {
            columns: Vec::new(),
            objective: self.master.slack_objective(),
            unassigned_trips: self.mandatory_trips(&HashSet::new()),
            unassigned_maintenances: self.mandatory_maintenances(&HashSet::new()),
        };

        self.nodes = vec![BranchNode {
            idx: 0,
            parent: None,
            depth: 0,
            fixes: Fixes::new(),
            bound: f64::NEG_INFINITY,
            solved: false,
            status: NodeStatus::Open,
            branch: None,
        }];
        let mut open = BinaryHeap::new();
        open.push(OpenNode {
            bound: f64::NEG_INFINITY,
            depth: 0,
            idx: 0,
        });

        let mut processed = 0;
        let mut budget_hit = false;
        let mut all_converged = true;
        let mut stopped_at_root = false;

        info!(
            "horizon {}: branch-and-price with {} vehicles, {} trips, {} maintenances",
            self.horizon,
            self.networks.len(),
            self.master.trips().len(),
            self.master.maintenances().len()
        );

        while let Some(entry) = open.pop() {
            if processed >= budgets.max_branching_nodes
                || deadline.map_or(false, |d| Instant::now() >= d)
            {
                warn!(
                    "horizon {}: branch-and-price budget exhausted after {} nodes",
                    self.horizon, processed
                );
                open.push(entry);
                budget_hit = true;
                break;
            }
            let idx = entry.idx;
            let parent_bound = self.nodes[idx].bound;
            if parent_bound >= incumbent.objective - self.pruning_tolerance(incumbent.objective) {
                self.nodes[idx].status = NodeStatus::Pruned;
                continue;
            }
            processed += 1;

            let fixes = self.nodes[idx].fixes.clone();
            let outcome = cg.run(&mut self.master, &fixes, idx, deadline, recorder)?;
            all_converged &= outcome.converged;
            budget_hit |= outcome.budget_exhausted;
            let Some(solution) = outcome.solution else {
                warn!(
                    "horizon {}: LP solver limit at node {}, the node stays open",
                    self.horizon, idx
                );
                open.push(entry);
                break;
            };
            let bound = parent_bound.max(outcome.lower_bound);
            {
                let node = &mut self.nodes[idx];
                node.bound = bound;
                node.solved = true;
            }
            if let (Some((candidate, value)), Some(parent)) =
                (self.nodes[idx].branch, self.nodes[idx].parent)
            {
                self.strategy
                    .observe(&candidate, value, bound - self.nodes[parent].bound);
            }
            debug!(
                "node {} (depth {}): LP {:.3}, bound {:.3}, incumbent {:.3}",
                idx,
                self.nodes[idx].depth,
                solution.objective(),
                bound,
                incumbent.objective
            );

            if solution.uses_artificials() {
                self.nodes[idx].status = NodeStatus::Infeasible;
                continue;
            }

            let capacity_feasible = self.master.capacity_violations(&solution).is_empty();
            if solution.is_integral() && capacity_feasible {
                if solution.objective() < incumbent.objective - EPS {
                    incumbent = self.incumbent_of(solution.selected_columns());
                    info!(
                        "horizon {}: new incumbent {:.3} at node {}",
                        self.horizon, incumbent.objective, idx
                    );
                }
                self.nodes[idx].status = NodeStatus::Integral;
                continue;
            }

            if let Some(rounded) = self.round(&solution) {
                if rounded.objective < incumbent.objective - EPS {
                    info!(
                        "horizon {}: rounding found incumbent {:.3} at node {}",
                        self.horizon, rounded.objective, idx
                    );
                    incumbent = rounded;
                }
            }

            if bound >= incumbent.objective - self.pruning_tolerance(incumbent.objective) {
                self.nodes[idx].status = NodeStatus::Pruned;
                continue;
            }

            let nth_dive = budgets.nth_node_dive;
            if nth_dive > 0 && (processed - 1) % nth_dive == 0 {
                let dive = Dive {
                    master: &mut self.master,
                    cg: &truncated_cg,
                    horizon: self.horizon,
                    branch_node: idx,
                    deadline,
                    fix_threshold: self.config.tolerances.dive_fix_threshold,
                };
                if let Some(columns) = dive.run(&fixes, &solution, recorder)? {
                    let found = self.incumbent_of(columns);
                    if found.objective < incumbent.objective - EPS {
                        info!(
                            "horizon {}: dive found incumbent {:.3} at node {}",
                            self.horizon, found.objective, idx
                        );
                        incumbent = found;
                    }
                }
                if bound >= incumbent.objective - self.pruning_tolerance(incumbent.objective) {
                    self.nodes[idx].status = NodeStatus::Pruned;
                    continue;
                }
            }
            if terminate_after_root {
                stopped_at_root = true;
                break;
            }

            let candidates = solution.candidates();
            let mut lookahead = NodeLookahead {
                master: &mut self.master,
                cg: &truncated_cg,
                fixes: &fixes,
                branch_node: idx,
                deadline,
                recorder: &mut *recorder,
            };
            let candidate = self
                .strategy
                .select_with_lookahead(&candidates, &mut lookahead)?
                .ok_or_else(|| {
                    SchedulingError::logic(format!(
                        "fractional master solution at node {} without branching candidate",
                        idx
                    ))
                })?;
            self.nodes[idx].status = NodeStatus::Branched;
            for value in [false, true] {
                let child = self.nodes.len();
                let parent = &self.nodes[idx];
                let node = BranchNode {
                    idx: child,
                    parent: Some(idx),
                    depth: parent.depth + 1,
                    fixes: parent.fixes.with(BranchFix {
                        vehicle: candidate.vehicle,
                        target: candidate.target,
                        value,
                    }),
                    bound,
                    solved: false,
                    status: NodeStatus::Open,
                    branch: Some((candidate, value)),
                };
                open.push(OpenNode {
                    bound,
                    depth: node.depth,
                    idx: child,
                });
                self.nodes.push(node);
                recorder.record_performance(PerformanceDetail {
                    horizon: self.horizon,
                    branch_node: child,
                    branch_type: Some(candidate.target.kind().as_str().to_string()),
                    branch_parent: Some(idx),
                    branch_vehicle: Some(candidate.vehicle),
                    branch_target: Some(candidate.target.to_string()),
                    fractional_value: Some(candidate.value),
                    branch_value: Some(value as u8),
                    ..Default::default()
                });
            }
            debug!(
                "node {}: branching with {} on vehicle {} and {} ({:.3})",
                idx,
                self.strategy.name(),
                candidate.vehicle,
                candidate.target,
                candidate.value
            );
        }

        let proven_optimal = !budget_hit && !stopped_at_root && all_converged && open.is_empty();
        let open_bound = open
            .iter()
            .map(|o| self.nodes[o.idx].bound)
            .fold(f64::INFINITY, f64::min);
        let root_bound = self.nodes[0].bound;
        let lower_bound = if proven_optimal {
            incumbent.objective
        } else if stopped_at_root {
            root_bound
        } else {
            open_bound.min(incumbent.objective)
        };
        if !proven_optimal {
            warn!(
                "horizon {}: result {:.3} is not proven optimal",
                self.horizon, incumbent.objective
            );
        }

        Ok(TreeOutcome {
            lower_bound: lower_bound.is_finite().then_some(lower_bound),
            proven_optimal,
            tree_size: self.nodes.len(),
            tree_depth: self.nodes.iter().map(|n| n.depth).max().unwrap_or(0),
            columns_generated: self.pool.len(),
            algorithm: if terminate_after_root {
                "root-column-generation"
            } else {
                "branch-and-price"
            },
            incumbent,
        })
    }

    fn pruning_tolerance(&self, incumbent: Cost) -> f64 {
        (self.config.tolerances.integer_optimality_gap * incumbent.abs()).max(EPS)
    }

    fn mandatory_trips(&self, covered: &HashSet<TripId>) -> Vec<TripId> {
        self.master
            .trips()
            .iter()
            .filter(|t| self.instance.trip(**t).is_mandatory() && !covered.contains(*t))
            .copied()
            .collect()
    }

    fn mandatory_maintenances(&self, covered: &HashSet<MaintenanceId>) -> Vec<MaintenanceId> {
        self.master
            .maintenances()
            .iter()
            .filter(|m| self.instance.maintenance(**m).is_mandatory() && !covered.contains(*m))
            .copied()
            .collect()
    }

    /// Integer solution made of the given columns, uncovered mandatory activities are paid.
    fn incumbent_of(&self, columns: Vec<Arc<Column>>) -> Incumbent {
        let costs = &self.config.costs;
        let trips: HashSet<TripId> = columns.iter().flat_map(|c| c.trips()).copied().collect();
        let maintenances: HashSet<MaintenanceId> = columns
            .iter()
            .flat_map(|c| c.maintenances())
            .copied()
            .collect();
        let unassigned_trips = self.mandatory_trips(&trips);
        let unassigned_maintenances = self.mandatory_maintenances(&maintenances);
        let objective = columns.iter().map(|c| c.cost()).sum::<Cost>()
            + unassigned_trips.len() as f64 * costs.uncovered_trip
            + unassigned_maintenances.len() as f64 * costs.uncovered_maintenance;
        Incumbent {
            columns,
            objective,
            unassigned_trips,
            unassigned_maintenances,
        }
    }

    /// Per vehicle the column with the largest value. Columns are taken in decreasing value
    /// and skipped if they share a trip or maintenance with a taken one or overload a charger.
    fn round(&self, solution: &MasterSolution) -> Option<Incumbent> {
        let best_per_vehicle: Vec<(Arc<Column>, f64)> = solution
            .used_columns()
            .map(|(c, x)| (c.vehicle(), (c.clone(), x)))
            .into_group_map()
            .into_iter()
            .sorted_by_key(|(vehicle, _)| *vehicle)
            .filter_map(|(_, columns)| {
                columns
                    .into_iter()
                    .max_by(|(_, x1), (_, x2)| x1.total_cmp(x2))
            })
            .sorted_by(|(_, x1), (_, x2)| x2.total_cmp(x1))
            .collect();

        let mut taken: Vec<Arc<Column>> = Vec::new();
        for (column, _) in best_per_vehicle {
            let conflicting = taken.iter().any(|other| {
                column.trips().iter().any(|t| other.covers_trip(*t))
                    || column
                        .maintenances()
                        .iter()
                        .any(|m| other.covers_maintenance(*m))
            });
            if conflicting || column.is_idle() {
                continue;
            }
            taken.push(column);
            if !self.master.respects_capacities(&taken) {
                taken.pop();
            }
        }
        if taken.is_empty() {
            return None;
        }
        Some(self.incumbent_of(taken))
    }
}

/// Child evaluation for strong branching at one node. Capacity rows and columns found on the
/// way stay in the master and the pool.
struct NodeLookahead<'t, 'c> {
    master: &'t mut MasterProblem,
    cg: &'t ColumnGeneration<'c>,
    fixes: &'t Fixes,
    branch_node: BranchNodeIdx,
    deadline: Option<Instant>,
    recorder: &'t mut StatisticsRecorder,
}

impl NodeLookahead<'_, '_> {
    fn child_fixes(&self, candidate: &BranchCandidate) -> [Fixes; 2] {
        [false, true].map(|value| {
            self.fixes.with(BranchFix {
                vehicle: candidate.vehicle,
                target: candidate.target,
                value,
            })
        })
    }
}

impl Lookahead for NodeLookahead<'_, '_> {
    fn master_bounds(&mut self, candidate: &BranchCandidate) -> Result<[f64; 2]> {
        let columns = self.cg.pool().columns();
        let mut bounds = [f64::NEG_INFINITY; 2];
        for (bound, fixes) in bounds.iter_mut().zip(self.child_fixes(candidate)) {
            if let Some(solution) = self.master.solve(&columns, &fixes)? {
                *bound = solution.objective();
            }
        }
        Ok(bounds)
    }

    fn priced_bounds(&mut self, candidate: &BranchCandidate) -> Result<[f64; 2]> {
        let mut bounds = [f64::NEG_INFINITY; 2];
        for (bound, fixes) in bounds.iter_mut().zip(self.child_fixes(candidate)) {
            let outcome = self.cg.run(
                self.master,
                &fixes,
                self.branch_node,
                self.deadline,
                self.recorder,
            )?;
            *bound = match outcome.solution {
                Some(solution) if outcome.converged && solution.uses_artificials() => {
                    f64::INFINITY
                }
                Some(_) if outcome.converged => outcome.lower_bound,
                Some(solution) => solution.objective().max(outcome.lower_bound),
                None => outcome.lower_bound,
            };
        }
        Ok(bounds)
    }
}

/// Depth-first dive below a node: fixes the most used (vehicle, target) pairs to one and
/// re-solves with truncated column generation until the master is integral.
struct Dive<'t, 'c> {
    master: &'t mut MasterProblem,
    cg: &'t ColumnGeneration<'c>,
    horizon: usize,
    branch_node: BranchNodeIdx,
    deadline: Option<Instant>,
    fix_threshold: f64,
}

impl Dive<'_, '_> {
    /// Columns of an integral solution respecting all charger capacities, `None` if the dive
    /// ran into an infeasible fix, the LP limit or the deadline.
    fn run(
        self,
        fixes: &Fixes,
        solution: &MasterSolution,
        recorder: &mut StatisticsRecorder,
    ) -> Result<Option<Vec<Arc<Column>>>> {
        let mut fixes = fixes.clone();
        let mut solution = solution.clone();
        loop {
            if solution.uses_artificials() || self.deadline.map_or(false, |d| Instant::now() >= d)
            {
                return Ok(None);
            }
            let capacity_feasible = self.master.capacity_violations(&solution).is_empty();
            if solution.is_integral() {
                return Ok(capacity_feasible.then(|| solution.selected_columns()));
            }
            let chosen = self.choose(solution.candidates());
            if chosen.is_empty() {
                return Ok(None);
            }
            for candidate in chosen.iter() {
                fixes = fixes.with(BranchFix {
                    vehicle: candidate.vehicle,
                    target: candidate.target,
                    value: true,
                });
                recorder.record_performance(PerformanceDetail {
                    horizon: self.horizon,
                    branch_node: self.branch_node,
                    branch_type: Some("dive".to_string()),
                    branch_vehicle: Some(candidate.vehicle),
                    branch_target: Some(candidate.target.to_string()),
                    fractional_value: Some(candidate.value),
                    branch_value: Some(1),
                    ..Default::default()
                });
            }
            debug!(
                "node {}: dive fixes {} pairs, {} fixes in total",
                self.branch_node,
                chosen.len(),
                fixes.len()
            );
            let outcome =
                self.cg
                    .run(self.master, &fixes, self.branch_node, self.deadline, recorder)?;
            solution = match outcome.solution {
                Some(solution) => solution,
                None => return Ok(None),
            };
        }
    }

    /// All candidates at least `fix_threshold`, otherwise the one with the largest value.
    fn choose(&self, candidates: Vec<BranchCandidate>) -> Vec<BranchCandidate> {
        let (above, below): (Vec<BranchCandidate>, Vec<BranchCandidate>) = candidates
            .into_iter()
            .partition(|c| c.value >= self.fix_threshold);
        if !above.is_empty() {
            return above;
        }
        below
            .into_iter()
            .max_by(|a, b| {
                a.value
                    .total_cmp(&b.value)
                    .then(b.target.kind().cmp(&a.target.kind()))
            })
            .into_iter()
            .collect()
    }
}
