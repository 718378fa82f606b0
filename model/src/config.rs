use serde::{Deserialize, Serialize};
use time::Duration;

use crate::base_types::Cost;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    pub costs: ConfigCosts,
    pub durations: ConfigDurations,
    pub horizon: ConfigHorizon,
    pub budgets: ConfigBudgets,
    pub tolerances: ConfigTolerances,
    pub flags: ConfigFlags,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigCosts {
    pub vehicle_usage: Cost,
    pub deadleg_fix: Cost,
    pub deadleg_per_km: Cost,
    /// Coefficient c of the penalty 0.5 * c * d^2, d being the distance in km since the last
    /// maintenance.
    pub maintenance_penalty_coefficient: Cost,
    pub uncovered_trip: Cost,
    pub uncovered_maintenance: Cost,
    /// Price of the artificial variable that keeps a fix-to-one branch feasible.
    pub infeasible_fix: Cost,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigDurations {
    pub put_on_charge: Duration,
    pub take_off_charge: Duration,
    pub charger_capacity_check: Duration,
    pub max_idle_time: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigHorizon {
    pub length: Duration,
    pub overlap: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigBudgets {
    pub column_generation_time_limit: Duration,
    pub branch_and_price_time_limit: Duration,
    pub max_branching_nodes: usize,
    pub pricing_label_limit: usize,
    pub columns_per_vehicle_per_iteration: usize,
    pub max_column_generation_iterations: usize,
    /// Columns handed to the master LP when model cleanup is on.
    pub max_columns_in_master: usize,
    /// Columns kept in the pool of a horizon when model cleanup is on.
    pub max_columns_in_pool: usize,
    /// Every n-th column generation iteration all vehicles are priced, in between only those
    /// that produced columns last time. 0 or 1 prices all vehicles every time.
    pub nth_iteration_price_all: usize,
    /// Every n-th branching node starts a dive. 0 switches diving off.
    pub nth_node_dive: usize,
    /// Master iterations of the truncated column generation in dives and strong branching.
    pub truncated_column_generation_iterations: usize,
    pub strong_branching_first_tier: usize,
    pub strong_branching_second_tier: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigTolerances {
    pub linear_optimality_gap: f64,
    pub integer_optimality_gap: f64,
    pub eps: f64,
    /// A dive fixes all candidates with at least this value at once.
    pub dive_fix_threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigFlags {
    pub allow_deadlegs: bool,
    pub terminate_after_root: bool,
    pub end_at_charger: bool,
    /// Charge the vehicle usage cost, which makes fewer vehicles preferable.
    pub minimise_vehicles: bool,
    /// Cap the master LP and the column pool, see the column budgets.
    pub model_cleanup: bool,
    /// Branch by strong branching instead of on the most fractional candidate.
    pub strong_branching: bool,
}

impl Default for ConfigCosts {
    fn default() -> Self {
        ConfigCosts {
            vehicle_usage: 100.0,
            deadleg_fix: 5.0,
            deadleg_per_km: 2.0,
            maintenance_penalty_coefficient: 0.05,
            uncovered_trip: 2000.0,
            uncovered_maintenance: 2000.0,
            infeasible_fix: 1e6,
        }
    }
}

impl Default for ConfigDurations {
    fn default() -> Self {
        ConfigDurations {
            put_on_charge: Duration::from_seconds(300),
            take_off_charge: Duration::from_seconds(300),
            charger_capacity_check: Duration::from_seconds(300),
            max_idle_time: Duration::from_hours(24),
        }
    }
}

impl Default for ConfigHorizon {
    fn default() -> Self {
        ConfigHorizon {
            length: Duration::from_hours(24),
            overlap: Duration::zero(),
        }
    }
}

impl Default for ConfigBudgets {
    fn default() -> Self {
        ConfigBudgets {
            column_generation_time_limit: Duration::from_seconds(900),
            branch_and_price_time_limit: Duration::from_seconds(5400),
            max_branching_nodes: 10_000,
            pricing_label_limit: 200_000,
            columns_per_vehicle_per_iteration: 40,
            max_column_generation_iterations: 1_000,
            max_columns_in_master: 5_000,
            max_columns_in_pool: 10_000,
            nth_iteration_price_all: 10,
            nth_node_dive: 10,
            truncated_column_generation_iterations: 10,
            strong_branching_first_tier: 50,
            strong_branching_second_tier: 25,
        }
    }
}

impl Default for ConfigTolerances {
    fn default() -> Self {
        ConfigTolerances {
            linear_optimality_gap: 1e-4,
            integer_optimality_gap: 1e-3,
            eps: 1e-5,
            dive_fix_threshold: 0.9,
        }
    }
}

impl Default for ConfigFlags {
    fn default() -> Self {
        ConfigFlags {
            allow_deadlegs: true,
            terminate_after_root: false,
            end_at_charger: false,
            minimise_vehicles: true,
            model_cleanup: true,
            strong_branching: false,
        }
    }
}
