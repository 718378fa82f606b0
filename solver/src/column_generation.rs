
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use model::config::Config;
use model::errors::Result;
use model::network::ActivityNetwork;
use parking_lot::Mutex;
use rayon::prelude::*;
use solution::column::ColumnSignature;
use solution::statistics::{PerformanceDetail, StatisticsRecorder};
use solution::Column;
use time::Duration;
use tracing::{debug, warn};

use crate::branching::Fixes;
use crate::column_pool::ColumnPool;
use crate::master_problem::{Duals, MasterProblem, MasterSolution};
use crate::pricing::{PricingBudget, PricingSolver};

/// Result of column generation at one branching node.
#[derive(Debug, Clone)]
pub struct ColumnGenerationOutcome {
    /// Last master solution, respecting all charger capacities. `None` if the LP solver hit a
    /// limit before the first master was solved.
    pub solution: Option<MasterSolution>,
    /// Valid lower bound of the node: the LP value if pricing proved LP optimality, the best
    /// Lagrangian bound otherwise (`-inf` if none is known).
    pub lower_bound: f64,
    /// pricing proved that the bound is within the linear optimality gap
    pub converged: bool,
    /// stopped by the iteration or time limit of the loop or of the LP solver
    pub budget_exhausted: bool,
    pub iterations: usize,
    pub columns_added: usize,
}

/// Alternates master solves and parallel pricing until no column with negative reduced cost
/// exists. Violated charger capacities are separated when pricing has converged.
///
/// Between full rounds only the vehicles that produced columns in the previous round are
/// priced. With model cleanup on, the master sees at most `max_columns_in_master` pool columns
/// (the most promising under the last duals) and the pool is cut to `max_columns_in_pool` before
/// each node. Within the loop of one node the pool only grows.
pub struct ColumnGeneration<'a> {
    networks: &'a [Arc<ActivityNetwork>],
    pool: &'a ColumnPool,
    config: &'a Config,
    pricing: PricingSolver,
    horizon: usize,
    max_iterations: usize,
    truncated: bool,
    /// duals and used columns of the last master solve
    last_master: Mutex<Option<(Duals, HashSet<ColumnSignature>)>>,
}

impl<'a> ColumnGeneration<'a> {
    pub fn new(
        networks: &'a [Arc<ActivityNetwork>],
        pool: &'a ColumnPool,
        config: &'a Config,
        horizon: usize,
    ) -> ColumnGeneration<'a> {
        ColumnGeneration {
            networks,
            pool,
            config,
            pricing: PricingSolver::new(config),
            horizon,
            max_iterations: config.budgets.max_column_generation_iterations,
            truncated: false,
            last_master: Mutex::new(None),
        }
    }

    /// Column generation stopping after at most `iterations` master solves. Used where a bound
    /// estimate is enough.
    pub fn truncated(self, iterations: usize) -> ColumnGeneration<'a> {
        ColumnGeneration {
            max_iterations: self.max_iterations.min(iterations),
            truncated: true,
            ..self
        }
    }

    pub fn pool(&self) -> &'a ColumnPool {
        self.pool
    }

    pub fn run(
        &self,
        master: &mut MasterProblem,
        fixes: &Fixes,
        branch_node: usize,
        deadline: Option<Instant>,
        recorder: &mut StatisticsRecorder,
    ) -> Result<ColumnGenerationOutcome> {
        let budgets = &self.config.budgets;
        let linear_gap = self.config.tolerances.linear_optimality_gap;
        let start = Instant::now();
        let cg_deadline = earliest(
            deadline_after(start, budgets.column_generation_time_limit),
            deadline,
        );
        let network_nodes: usize = self.networks.iter().map(|n| n.num_nodes()).sum();
        let network_arcs: usize = self.networks.iter().map(|n| n.num_arcs()).sum();

        let mut best_lagrangian = f64::NEG_INFINITY;
        let mut iteration = 0;
        let mut columns_added = 0;
        let mut active = vec![true; self.networks.len()];
        let mut price_all_next = true;
        let mut last_solution: Option<MasterSolution> = None;

        let removed = self.cleanup_pool(master);
        if removed > 0 {
            debug!(
                "node {}: {} pool columns removed, {} left",
                branch_node,
                removed,
                self.pool.len()
            );
        }

        loop {
            let master_start = Instant::now();
            let (columns, restricted) = self.master_columns(master, fixes);
            let solution = match master.solve(&columns, fixes)? {
                Some(solution) => solution,
                None => {
                    warn!(
                        "column generation at node {} stopped after {} iterations by the LP solver",
                        branch_node, iteration
                    );
                    return Ok(ColumnGenerationOutcome {
                        solution: last_solution,
                        lower_bound: best_lagrangian,
                        converged: false,
                        budget_exhausted: true,
                        iterations: iteration,
                        columns_added,
                    });
                }
            };
            let master_time = master_start.elapsed().as_secs_f64();
            let objective = solution.objective();
            *self.last_master.lock() = Some((
                solution.duals().clone(),
                solution.used_columns().map(|(c, _)| c.signature()).collect(),
            ));

            if iteration >= self.max_iterations
                || cg_deadline.map_or(false, |d| Instant::now() >= d)
            {
                if self.truncated {
                    debug!(
                        "truncated column generation at node {} stopped after {} iterations",
                        branch_node, iteration
                    );
                } else {
                    warn!(
                        "column generation at node {} stopped after {} iterations by its budget",
                        branch_node, iteration
                    );
                }
                return Ok(ColumnGenerationOutcome {
                    solution: Some(solution),
                    lower_bound: best_lagrangian,
                    converged: false,
                    budget_exhausted: true,
                    iterations: iteration,
                    columns_added,
                });
            }

            let nth = budgets.nth_iteration_price_all;
            let price_all = price_all_next || nth <= 1 || iteration % nth == 0;
            let pricing_start = Instant::now();
            let budget = PricingBudget {
                label_limit: budgets.pricing_label_limit,
                deadline: cg_deadline,
            };
            let duals = solution.duals();
            let outcomes = self
                .networks
                .par_iter()
                .enumerate()
                .filter(|(idx, _)| price_all || active[*idx])
                .map(|(idx, network)| {
                    let mut outcome = self.pricing.solve(network, duals, fixes, &budget)?;
                    let found = outcome.columns.len();
                    let added = std::mem::take(&mut outcome.columns)
                        .into_iter()
                        .map(|priced| self.pool.insert(priced.column))
                        .filter(|inserted| *inserted)
                        .count();
                    Ok((idx, outcome, found, added))
                })
                .collect::<Result<Vec<_>>>()?;
            let pricing_time = pricing_start.elapsed().as_secs_f64();

            active.iter_mut().for_each(|a| *a = false);
            for (idx, _, found, _) in outcomes.iter() {
                active[*idx] = *found > 0;
            }
            let all_optimal = price_all && outcomes.iter().all(|(_, o, _, _)| o.proven_optimal);
            let added: usize = outcomes.iter().map(|(_, _, _, a)| a).sum();
            let found: usize = outcomes.iter().map(|(_, _, f, _)| f).sum();
            // columns found again are still missing from a restricted master
            let progress = added > 0 || (restricted && found > 0);
            columns_added += added;
            if all_optimal {
                let lagrangian = objective
                    + outcomes
                        .iter()
                        .map(|(_, o, _, _)| o.min_reduced_cost.min(0.0))
                        .sum::<f64>();
                best_lagrangian = best_lagrangian.max(lagrangian);
            }
            let gap = (objective - best_lagrangian) / objective.abs().max(1.0);
            let stop_early = all_optimal && gap <= linear_gap;
            let settled = price_all && (!progress || stop_early);
            price_all_next = !price_all && !progress;

            let mut lazy_constraint_added = false;
            let auxiliary_start = Instant::now();
            if settled {
                let violations = master.capacity_violations(&solution);
                lazy_constraint_added = master.add_capacity_rows(&violations) > 0;
                price_all_next = lazy_constraint_added;
            }
            let auxiliary_time = auxiliary_start.elapsed().as_secs_f64();

            debug!(
                "node {} iteration {}: objective {:.3}, lagrangian {:.3}, {} of {} vehicles priced, {} columns added{}",
                branch_node,
                iteration,
                objective,
                best_lagrangian,
                outcomes.len(),
                self.networks.len(),
                added,
                if lazy_constraint_added {
                    ", capacity rows added"
                } else {
                    ""
                }
            );
            recorder.record_performance(PerformanceDetail {
                horizon: self.horizon,
                branch_node,
                iteration: Some(iteration),
                objective: Some(objective),
                lower_bound: best_lagrangian.is_finite().then_some(best_lagrangian),
                gap: gap.is_finite().then_some(gap),
                master_time: Some(master_time),
                pricing_time: Some(pricing_time),
                auxiliary_time: Some(auxiliary_time),
                lp_rows: Some(solution.lp_rows()),
                lp_columns: Some(solution.lp_columns()),
                columns_added: Some(added),
                network_nodes: Some(network_nodes),
                network_arcs: Some(network_arcs),
                lazy_constraint_added: Some(lazy_constraint_added),
                ..Default::default()
            });
            iteration += 1;

            if lazy_constraint_added || !settled {
                last_solution = Some(solution);
                continue;
            }
            let lower_bound = if !progress && all_optimal {
                objective.max(best_lagrangian)
            } else {
                best_lagrangian
            };
            if !all_optimal {
                warn!(
                    "pricing at node {} hit its label budget, the node bound is not proven",
                    branch_node
                );
            }
            return Ok(ColumnGenerationOutcome {
                solution: Some(solution),
                lower_bound,
                converged: all_optimal,
                budget_exhausted: false,
                iterations: iteration,
                columns_added,
            });
        }
    }

    /// Pool columns handed to the master and whether some admitted columns were left out. The
    /// columns used by the last master come first, then the lowest reduced cost under its duals.
    fn master_columns(&self, master: &MasterProblem, fixes: &Fixes) -> (Vec<Arc<Column>>, bool) {
        let columns = self.pool.columns();
        let limit = self.config.budgets.max_columns_in_master;
        if !self.config.flags.model_cleanup || columns.len() <= limit {
            return (columns, false);
        }
        let mut admitted: Vec<Arc<Column>> =
            columns.into_iter().filter(|c| fixes.admits(c)).collect();
        if admitted.len() <= limit {
            return (admitted, false);
        }
        if let Some((duals, used)) = self.last_master.lock().as_ref() {
            let mut scored: Vec<(bool, f64, Arc<Column>)> = admitted
                .into_iter()
                .map(|c| {
                    (
                        !used.contains(&c.signature()),
                        master.reduced_cost(&c, duals),
                        c,
                    )
                })
                .collect();
            scored.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)));
            admitted = scored.into_iter().map(|(_, _, c)| c).collect();
        }
        admitted.truncate(limit);
        (admitted, true)
    }

    /// Cuts the pool down to `max_columns_in_pool` before a node is solved, keeping the columns
    /// used by the last master and otherwise those with the lowest reduced cost under its duals.
    /// Returns the number of removed columns.
    fn cleanup_pool(&self, master: &MasterProblem) -> usize {
        if !self.config.flags.model_cleanup {
            return 0;
        }
        let last_master = self.last_master.lock();
        let Some((duals, used)) = last_master.as_ref() else {
            return 0;
        };
        self.pool.retain_best(
            self.config.budgets.max_columns_in_pool,
            |column| master.reduced_cost(column, duals),
            |column| used.contains(&column.signature()),
        )
    }
}

/// `start + limit`, `None` for an infinite limit.
pub(crate) fn deadline_after(start: Instant, limit: Duration) -> Option<Instant> {
    match limit {
        Duration::Length(seconds) => start.checked_add(std::time::Duration::from_secs(seconds)),
        Duration::Infinity => None,
    }
}

pub(crate) fn earliest(a: Option<Instant>, b: Option<Instant>) -> Option<Instant> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
