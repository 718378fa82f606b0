use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

use time::{DateTime, Duration};

use crate::base_types::{ChargerId, LocationId, MaintenanceId, TripId};
use crate::maintenances::Maintenance;
use crate::trips::Trip;

/// What a vehicle does during a node of the activity network or a stop of a schedule.
/// Deadlegs are carried by arcs in the network and only appear as stops in reconstructed
/// schedules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Activity {
    Start,
    Trip(TripId),
    Charging(ChargingSlot),
    Maintenance(MaintenanceId),
    Deadleg,
    End,
}

/// A vehicle occupying `charger` from arrival `start` until departure `end`. The put-on and
/// take-off durations are part of this interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChargingSlot {
    pub charger: ChargerId,
    pub start: DateTime,
    pub end: DateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityNode {
    activity: Activity,
    start_time: DateTime,
    end_time: DateTime,
    start_location: LocationId,
    end_location: LocationId,
}

impl ChargingSlot {
    /// Indices k of the capacity cells `[origin + k * interval, origin + (k + 1) * interval)`
    /// that [start, end) intersects. Two slots overlapping in time always share a cell, also
    /// when neither of them contains a multiple of the interval.
    pub fn checkpoints(&self, origin: DateTime, interval: Duration) -> Range<usize> {
        let step = match interval {
            Duration::Length(l) => l.max(1) as i64,
            Duration::Infinity => return 0..0,
        };
        let (Some(origin), Some(start), Some(end)) = (
            origin.as_seconds(),
            self.start.as_seconds(),
            self.end.as_seconds(),
        ) else {
            return 0..0;
        };
        if end <= start || end <= origin {
            return 0..0;
        }
        let first = (start - origin).max(0) / step;
        let last = ceil_div(end - origin, step);
        first as usize..last as usize
    }

    /// The same slot cut off at `cut`.
    pub fn trimmed(&self, cut: DateTime) -> ChargingSlot {
        ChargingSlot {
            charger: self.charger,
            start: self.start,
            end: self.end.min(cut).max(self.start),
        }
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

// methods
impl ActivityNode {
    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn start_time(&self) -> DateTime {
        self.start_time
    }

    pub fn end_time(&self) -> DateTime {
        self.end_time
    }

    pub fn start_location(&self) -> LocationId {
        self.start_location
    }

    pub fn end_location(&self) -> LocationId {
        self.end_location
    }

    pub fn is_start(&self) -> bool {
        matches!(self.activity, Activity::Start)
    }

    pub fn is_end(&self) -> bool {
        matches!(self.activity, Activity::End)
    }

    pub fn is_charging(&self) -> bool {
        matches!(self.activity, Activity::Charging(_))
    }

    pub fn trip(&self) -> Option<TripId> {
        match self.activity {
            Activity::Trip(t) => Some(t),
            _ => None,
        }
    }

    pub fn maintenance(&self) -> Option<MaintenanceId> {
        match self.activity {
            Activity::Maintenance(m) => Some(m),
            _ => None,
        }
    }

    pub fn charging_slot(&self) -> Option<ChargingSlot> {
        match self.activity {
            Activity::Charging(slot) => Some(slot),
            _ => None,
        }
    }

    /// Start nodes come first, end nodes last, everything else by time.
    pub fn cmp_start_time(&self, other: &ActivityNode) -> Ordering {
        self.rank()
            .cmp(&other.rank())
            .then_with(|| {
                if self.is_start() || self.is_end() {
                    Ordering::Equal
                } else {
                    self.start_time
                        .cmp(&other.start_time)
                        .then(self.end_time.cmp(&other.end_time))
                }
            })
            .then(self.activity.cmp(&other.activity))
    }

    fn rank(&self) -> u8 {
        match self.activity {
            Activity::Start => 0,
            Activity::End => 2,
            _ => 1,
        }
    }
}

// static functions
impl ActivityNode {
    pub fn create_start_node(location: LocationId, time: DateTime) -> ActivityNode {
        ActivityNode {
            activity: Activity::Start,
            start_time: time,
            end_time: time,
            start_location: location,
            end_location: location,
        }
    }

    pub fn create_trip_node(trip: &Trip) -> ActivityNode {
        ActivityNode {
            activity: Activity::Trip(trip.id()),
            start_time: trip.departure(),
            end_time: trip.arrival(),
            start_location: trip.origin(),
            end_location: trip.destination(),
        }
    }

    pub fn create_maintenance_node(maintenance: &Maintenance) -> ActivityNode {
        ActivityNode {
            activity: Activity::Maintenance(maintenance.id()),
            start_time: maintenance.start(),
            end_time: maintenance.end(),
            start_location: maintenance.location(),
            end_location: maintenance.location(),
        }
    }

    pub fn create_charging_node(slot: ChargingSlot, location: LocationId) -> ActivityNode {
        ActivityNode {
            activity: Activity::Charging(slot),
            start_time: slot.start,
            end_time: slot.end,
            start_location: location,
            end_location: location,
        }
    }

    pub fn create_deadleg_node(
        from: LocationId,
        to: LocationId,
        departure: DateTime,
        arrival: DateTime,
    ) -> ActivityNode {
        ActivityNode {
            activity: Activity::Deadleg,
            start_time: departure,
            end_time: arrival,
            start_location: from,
            end_location: to,
        }
    }

    /// The end node can be reached from everywhere without travelling, its location is
    /// therefore only nominal.
    pub fn create_end_node(location: LocationId) -> ActivityNode {
        ActivityNode {
            activity: Activity::End,
            start_time: DateTime::Latest,
            end_time: DateTime::Latest,
            start_location: location,
            end_location: location,
        }
    }
}

impl fmt::Display for ActivityNode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.activity {
            Activity::Start => write!(f, "start at {} ({})", self.start_location, self.start_time),
            Activity::Trip(t) => write!(
                f,
                "trip {} from {} ({}) to {} ({})",
                t, self.start_location, self.start_time, self.end_location, self.end_time
            ),
            Activity::Charging(slot) => write!(
                f,
                "charging at charger {} ({} - {})",
                slot.charger, slot.start, slot.end
            ),
            Activity::Maintenance(m) => write!(
                f,
                "maintenance {} at {} ({} - {})",
                m, self.start_location, self.start_time, self.end_time
            ),
            Activity::Deadleg => write!(
                f,
                "deadleg from {} to {}",
                self.start_location, self.end_location
            ),
            Activity::End => write!(f, "end"),
        }
    }
}

fn ceil_div(numerator: i64, denominator: i64) -> i64 {
    (numerator + denominator - 1) / denominator
}
