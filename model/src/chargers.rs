use time::Duration;

use crate::base_types::{ChargerId, Kw, Kwh, LocationId};

#[derive(Debug, Clone)]
pub struct Charger {
    id: ChargerId,
    location: LocationId,
    capacity: u32, // number of vehicles that can charge at the same time
    rate: Kw,
}

impl Charger {
    pub fn new(id: ChargerId, location: LocationId, capacity: u32, rate: Kw) -> Charger {
        Charger {
            id,
            location,
            capacity,
            rate,
        }
    }

    pub fn id(&self) -> ChargerId {
        self.id
    }

    pub fn location(&self) -> LocationId {
        self.location
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn rate(&self) -> Kw {
        self.rate
    }

    /// energy delivered when charging for the given duration (not bounded by any battery)
    pub fn energy_for(&self, duration: Duration) -> Kwh {
        self.rate * duration.in_hours()
    }
}
