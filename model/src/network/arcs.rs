use time::Duration;

use crate::base_types::{Cost, Kwh, Meter, NodeIdx};

/// A feasible transition of one vehicle from `source` into `target`, including performing the
/// target activity. The vehicle first drives the deadleg (if any), then performs the target
/// activity, which may drive further (trip), recharge (charging) or reset the maintenance
/// counter (maintenance).
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityArc {
    source: NodeIdx,
    target: NodeIdx,
    deadleg_distance: Meter,
    deadleg_duration: Duration,
    activity_distance: Meter,
    recharge: Kwh,
    resets_maintenance: bool,
    cost: Cost,
}

pub struct ArcSpec {
    pub deadleg_distance: Meter,
    pub deadleg_duration: Duration,
    pub activity_distance: Meter,
    pub recharge: Kwh,
    pub resets_maintenance: bool,
    pub cost: Cost,
}

impl ActivityArc {
    pub fn new(source: NodeIdx, target: NodeIdx, spec: ArcSpec) -> ActivityArc {
        ActivityArc {
            source,
            target,
            deadleg_distance: spec.deadleg_distance,
            deadleg_duration: spec.deadleg_duration,
            activity_distance: spec.activity_distance,
            recharge: spec.recharge,
            resets_maintenance: spec.resets_maintenance,
            cost: spec.cost,
        }
    }

    pub fn source(&self) -> NodeIdx {
        self.source
    }

    pub fn target(&self) -> NodeIdx {
        self.target
    }

    pub fn deadleg_distance(&self) -> Meter {
        self.deadleg_distance
    }

    pub fn deadleg_duration(&self) -> Duration {
        self.deadleg_duration
    }

    pub fn activity_distance(&self) -> Meter {
        self.activity_distance
    }

    /// deadleg and activity distance
    pub fn distance(&self) -> Meter {
        self.deadleg_distance + self.activity_distance
    }

    /// upper bound of the energy charged at the target
    pub fn recharge(&self) -> Kwh {
        self.recharge
    }

    pub fn resets_maintenance(&self) -> bool {
        self.resets_maintenance
    }

    /// deadleg cost, the state dependent maintenance penalty is not included
    pub fn cost(&self) -> Cost {
        self.cost
    }
}
