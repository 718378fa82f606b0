use time::Duration;

use crate::base_types::{LocationId, Meter};
use crate::errors::{Result, SchedulingError};

/// Pair-wise distances and travel times between all locations.
/// The matrix is indexed by the LocationIds, which are the positions in the name vector.
/// Every ordered pair of distinct locations must have an entry, the diagonal defaults to zero.
///
/// Distances and travel times should satisfy the triangle-inequality. This is not asserted.
#[derive(Debug)]
pub struct Locations {
    names: Vec<String>,
    travel: Vec<Vec<Travel>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Travel {
    distance: Meter,
    duration: Duration,
}

impl Travel {
    pub fn new(distance: Meter, duration: Duration) -> Travel {
        Travel { distance, duration }
    }

    pub fn distance(&self) -> Meter {
        self.distance
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

// static functions
impl Locations {
    pub fn new(
        names: Vec<String>,
        legs: impl IntoIterator<Item = (LocationId, LocationId, Travel)>,
    ) -> Result<Locations> {
        let n = names.len();
        let mut matrix: Vec<Vec<Option<Travel>>> = vec![vec![None; n]; n];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = Some(Travel::new(0, Duration::zero()));
        }
        for (from, to, travel) in legs {
            if from.0 >= n || to.0 >= n {
                return Err(SchedulingError::data(format!(
                    "travel entry {} -> {} references an unknown location",
                    from, to
                )));
            }
            if travel.duration == Duration::Infinity {
                return Err(SchedulingError::data(format!(
                    "travel entry {} -> {} has an infinite duration",
                    from, to
                )));
            }
            matrix[from.0][to.0] = Some(travel);
        }

        let mut travel = Vec::with_capacity(n);
        for (i, row) in matrix.into_iter().enumerate() {
            let mut complete_row = Vec::with_capacity(n);
            for (j, entry) in row.into_iter().enumerate() {
                match entry {
                    Some(t) => complete_row.push(t),
                    None => {
                        return Err(SchedulingError::data(format!(
                            "location pair {} -> {} is unreachable (missing travel entry)",
                            names[i], names[j]
                        )))
                    }
                }
            }
            travel.push(complete_row);
        }
        Ok(Locations { names, travel })
    }
}

// methods
impl Locations {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, location: LocationId) -> bool {
        location.0 < self.names.len()
    }

    pub fn name(&self, location: LocationId) -> &str {
        &self.names[location.0]
    }

    pub fn travel(&self, from: LocationId, to: LocationId) -> Travel {
        self.travel[from.0][to.0]
    }

    pub fn distance(&self, from: LocationId, to: LocationId) -> Meter {
        self.travel[from.0][to.0].distance
    }

    pub fn travel_time(&self, from: LocationId, to: LocationId) -> Duration {
        self.travel[from.0][to.0].duration
    }
}
