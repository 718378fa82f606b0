use time::{DateTime, Duration};

use crate::base_types::{LocationId, Meter, TripId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    id: TripId,
    origin: LocationId,
    destination: LocationId,
    departure: DateTime,
    arrival: DateTime,
    distance: Meter,
    mandatory: bool,
}

impl Trip {
    pub fn new(
        id: TripId,
        origin: LocationId,
        destination: LocationId,
        departure: DateTime,
        arrival: DateTime,
        distance: Meter,
        mandatory: bool,
    ) -> Trip {
        Trip {
            id,
            origin,
            destination,
            departure,
            arrival,
            distance,
            mandatory,
        }
    }

    pub fn id(&self) -> TripId {
        self.id
    }

    pub fn origin(&self) -> LocationId {
        self.origin
    }

    pub fn destination(&self) -> LocationId {
        self.destination
    }

    pub fn departure(&self) -> DateTime {
        self.departure
    }

    pub fn arrival(&self) -> DateTime {
        self.arrival
    }

    pub fn duration(&self) -> Duration {
        self.arrival - self.departure
    }

    pub fn distance(&self) -> Meter {
        self.distance
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }
}
