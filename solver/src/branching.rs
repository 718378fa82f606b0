#[cfg(test)]
mod tests;

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use model::base_types::{MaintenanceId, TripId, VehicleId};
use model::errors::Result;
use model::network::nodes::{Activity, ChargingSlot};
use parking_lot::Mutex;
use solution::Column;

/// What a branching decision is about, always together with a vehicle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BranchTarget {
    Trip(TripId),
    Maintenance(MaintenanceId),
    Charging(ChargingSlot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BranchKind {
    VehicleTrip,
    VehicleMaintenance,
    VehicleCharging,
}

impl BranchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchKind::VehicleTrip => "vehicle-trip",
            BranchKind::VehicleMaintenance => "vehicle-maintenance",
            BranchKind::VehicleCharging => "vehicle-charging",
        }
    }
}

impl BranchTarget {
    pub fn kind(&self) -> BranchKind {
        match self {
            BranchTarget::Trip(_) => BranchKind::VehicleTrip,
            BranchTarget::Maintenance(_) => BranchKind::VehicleMaintenance,
            BranchTarget::Charging(_) => BranchKind::VehicleCharging,
        }
    }

    /// Trips and maintenances are done by at most one vehicle, so fixing them to one vehicle
    /// excludes all others. A charging slot can be shared.
    pub fn is_exclusive(&self) -> bool {
        !matches!(self, BranchTarget::Charging(_))
    }

    pub fn is_covered_by(&self, column: &Column) -> bool {
        match self {
            BranchTarget::Trip(t) => column.covers_trip(*t),
            BranchTarget::Maintenance(m) => column.covers_maintenance(*m),
            BranchTarget::Charging(slot) => column.uses_charging_slot(slot),
        }
    }

    pub fn matches(&self, activity: &Activity) -> bool {
        match (self, activity) {
            (BranchTarget::Trip(t), Activity::Trip(other)) => t == other,
            (BranchTarget::Maintenance(m), Activity::Maintenance(other)) => m == other,
            (BranchTarget::Charging(slot), Activity::Charging(other)) => slot == other,
            _ => false,
        }
    }
}

impl fmt::Display for BranchTarget {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BranchTarget::Trip(t) => write!(f, "trip {}", t),
            BranchTarget::Maintenance(m) => write!(f, "maintenance {}", m),
            BranchTarget::Charging(slot) => write!(
                f,
                "charger {} [{}, {})",
                slot.charger, slot.start, slot.end
            ),
        }
    }
}

/// `vehicle` must (`value == true`) or must not (`value == false`) do `target`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BranchFix {
    pub vehicle: VehicleId,
    pub target: BranchTarget,
    pub value: bool,
}

/// All fixes on the path from the root to a branching node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fixes {
    fixes: Vec<BranchFix>,
}

impl Fixes {
    pub fn new() -> Fixes {
        Fixes::default()
    }

    pub fn with(&self, fix: BranchFix) -> Fixes {
        let mut fixes = self.fixes.clone();
        fixes.push(fix);
        Fixes { fixes }
    }

    pub fn iter(&self) -> impl Iterator<Item = &BranchFix> + '_ {
        self.fixes.iter()
    }

    pub fn fixed_to_one(&self) -> impl Iterator<Item = &BranchFix> + '_ {
        self.fixes.iter().filter(|f| f.value)
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    /// Whether the column may be used under these fixes.
    pub fn admits(&self, column: &Column) -> bool {
        self.fixes.iter().all(|fix| {
            if !fix.target.is_covered_by(column) {
                return true;
            }
            if fix.vehicle == column.vehicle() {
                fix.value
            } else {
                !(fix.value && fix.target.is_exclusive())
            }
        })
    }

    /// Whether a pricing label of `vehicle` must not visit a node with this activity.
    pub fn forbids(&self, vehicle: VehicleId, activity: &Activity) -> bool {
        self.fixes.iter().any(|fix| {
            fix.target.matches(activity)
                && if fix.vehicle == vehicle {
                    !fix.value
                } else {
                    fix.value && fix.target.is_exclusive()
                }
        })
    }
}

/// Aggregated LP value of all columns of `vehicle` covering `target`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BranchCandidate {
    pub vehicle: VehicleId,
    pub target: BranchTarget,
    pub value: f64,
}

impl BranchCandidate {
    /// Distance to 0.5, smaller is more fractional.
    pub fn distance_to_half(&self) -> f64 {
        (self.value - 0.5).abs()
    }

    /// Deterministic preference: more fractional first, then trips before maintenances before
    /// charging, then lower ids.
    fn cmp_preference(&self, other: &BranchCandidate) -> Ordering {
        let (d1, d2) = (self.distance_to_half(), other.distance_to_half());
        if (d1 - d2).abs() > 1e-9 {
            return d1.total_cmp(&d2);
        }
        self.target
            .kind()
            .cmp(&other.target.kind())
            .then(self.vehicle.cmp(&other.vehicle))
            .then(self.target.cmp(&other.target))
    }
}

/// Bound estimates of the two children of a candidate, fix-to-zero child first. A child that
/// can not satisfy its fixes is `+inf`, a child without estimate `-inf`.
pub trait Lookahead {
    /// Children solved by the master LP over the columns generated so far.
    fn master_bounds(&mut self, candidate: &BranchCandidate) -> Result<[f64; 2]>;

    /// Children solved by truncated column generation.
    fn priced_bounds(&mut self, candidate: &BranchCandidate) -> Result<[f64; 2]>;
}

/// Chooses the candidate to branch on. Implementations may learn from the bound changes of
/// the children they caused.
pub trait BranchingStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn select(&self, candidates: &[BranchCandidate]) -> Option<BranchCandidate>;

    /// Like [`BranchingStrategy::select`], but the children of candidates may be evaluated
    /// before deciding.
    fn select_with_lookahead(
        &self,
        candidates: &[BranchCandidate],
        _lookahead: &mut dyn Lookahead,
    ) -> Result<Option<BranchCandidate>> {
        Ok(self.select(candidates))
    }

    /// Called once per solved child with its bound minus the parent bound.
    fn observe(&self, _candidate: &BranchCandidate, _fixed_value: bool, _bound_change: f64) {}
}

/// Branches on the value closest to 0.5.
#[derive(Debug, Clone, Copy, Default)]
pub struct MostFractional;

impl BranchingStrategy for MostFractional {
    fn name(&self) -> &'static str {
        "most-fractional"
    }

    fn select(&self, candidates: &[BranchCandidate]) -> Option<BranchCandidate> {
        candidates.iter().min_by(|a, b| a.cmp_preference(b)).copied()
    }
}

#[derive(Debug, Clone, Copy)]
struct PseudoCostEntry {
    cost: f64,
    count: u64,
}

impl Default for PseudoCostEntry {
    fn default() -> Self {
        PseudoCostEntry {
            cost: 1.0,
            count: 0,
        }
    }
}

impl PseudoCostEntry {
    fn update(&mut self, per_unit_change: f64) {
        let count = self.count as f64;
        self.cost = (self.cost * count + per_unit_change) / (count + 1.0);
        self.count += 1;
    }
}

#[derive(Debug, Default)]
struct PseudoCostTable {
    down: HashMap<BranchKind, PseudoCostEntry>,
    up: HashMap<BranchKind, PseudoCostEntry>,
}

/// Scores candidates by the bound degradation per unit of fractionality that branching on the
/// same kind of target caused so far (running average, separately for the fix-to-zero and the
/// fix-to-one child). Unknown kinds start with a pseudo cost of 1.
#[derive(Debug, Default)]
pub struct PseudoCost {
    table: Mutex<PseudoCostTable>,
}

impl PseudoCost {
    pub fn new() -> PseudoCost {
        PseudoCost::default()
    }

    fn score(&self, table: &PseudoCostTable, candidate: &BranchCandidate) -> f64 {
        let kind = candidate.target.kind();
        let down = table.down.get(&kind).copied().unwrap_or_default().cost;
        let up = table.up.get(&kind).copied().unwrap_or_default().cost;
        let frac = candidate.value.clamp(0.0, 1.0);
        (frac * down * (1.0 - frac) * up).max(1e-10)
    }

    /// (down, up) pseudo costs of a kind.
    pub fn pseudo_costs(&self, kind: BranchKind) -> (f64, f64) {
        let table = self.table.lock();
        (
            table.down.get(&kind).copied().unwrap_or_default().cost,
            table.up.get(&kind).copied().unwrap_or_default().cost,
        )
    }
}

impl PseudoCost {
    /// Candidates from the highest to the lowest score.
    fn ranked(&self, candidates: &[BranchCandidate]) -> Vec<BranchCandidate> {
        let table = self.table.lock();
        let mut scored: Vec<(f64, BranchCandidate)> = candidates
            .iter()
            .map(|c| (self.score(&table, c), *c))
            .collect();
        scored.sort_by(|(s1, c1), (s2, c2)| {
            if (s1 - s2).abs() > 1e-12 {
                s2.total_cmp(s1)
            } else {
                c1.cmp_preference(c2)
            }
        });
        scored.into_iter().map(|(_, c)| c).collect()
    }
}

impl BranchingStrategy for PseudoCost {
    fn name(&self) -> &'static str {
        "pseudo-cost"
    }

    fn select(&self, candidates: &[BranchCandidate]) -> Option<BranchCandidate> {
        self.ranked(candidates).into_iter().next()
    }

    fn observe(&self, candidate: &BranchCandidate, fixed_value: bool, bound_change: f64) {
        // the fix-to-zero child moves the value down by `value`, the other one up by 1 - value
        let distance = if fixed_value {
            1.0 - candidate.value
        } else {
            candidate.value
        };
        if distance <= 1e-6 || bound_change <= 0.0 || !bound_change.is_finite() {
            return;
        }
        let mut table = self.table.lock();
        let entries = if fixed_value {
            &mut table.up
        } else {
            &mut table.down
        };
        entries
            .entry(candidate.target.kind())
            .or_default()
            .update(bound_change / distance);
    }
}

/// Strong branching in two tiers. The best `first_tier` candidates by pseudo cost have their
/// children solved by the master LP over the current columns, the best `second_tier` of those
/// again by truncated column generation. The candidate whose weaker child has the highest bound
/// wins. Without lookahead it falls back to pseudo costs, which it keeps learning.
#[derive(Debug)]
pub struct StrongBranching {
    first_tier: usize,
    second_tier: usize,
    history: PseudoCost,
}

impl StrongBranching {
    pub fn new(first_tier: usize, second_tier: usize) -> StrongBranching {
        StrongBranching {
            first_tier,
            second_tier,
            history: PseudoCost::new(),
        }
    }

    /// Sorts by score, highest first. Equal scores keep their order.
    fn best_first(scored: &mut [(f64, BranchCandidate)]) {
        scored.sort_by(|(s1, _), (s2, _)| s2.total_cmp(s1));
    }
}

fn child_score(bounds: [f64; 2]) -> f64 {
    bounds[0].min(bounds[1])
}

impl BranchingStrategy for StrongBranching {
    fn name(&self) -> &'static str {
        "strong-branching"
    }

    fn select(&self, candidates: &[BranchCandidate]) -> Option<BranchCandidate> {
        self.history.select(candidates)
    }

    fn select_with_lookahead(
        &self,
        candidates: &[BranchCandidate],
        lookahead: &mut dyn Lookahead,
    ) -> Result<Option<BranchCandidate>> {
        let mut shortlist = self.history.ranked(candidates);
        shortlist.truncate(self.first_tier.max(1));
        if shortlist.len() <= 1 {
            return Ok(shortlist.first().copied());
        }

        let mut scored = shortlist
            .into_iter()
            .map(|c| Ok((child_score(lookahead.master_bounds(&c)?), c)))
            .collect::<Result<Vec<_>>>()?;
        StrongBranching::best_first(&mut scored);

        if self.second_tier > 1 {
            scored.truncate(self.second_tier);
            scored = scored
                .into_iter()
                .map(|(_, c)| Ok((child_score(lookahead.priced_bounds(&c)?), c)))
                .collect::<Result<Vec<_>>>()?;
            StrongBranching::best_first(&mut scored);
        }
        Ok(scored.first().map(|(_, c)| *c))
    }

    fn observe(&self, candidate: &BranchCandidate, fixed_value: bool, bound_change: f64) {
        self.history.observe(candidate, fixed_value, bound_change);
    }
}
