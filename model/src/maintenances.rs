use time::DateTime;

use crate::base_types::{LocationId, MaintenanceId, VehicleId};

/// A maintenance window at a workshop. If `vehicle` is set only that vehicle can use it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Maintenance {
    id: MaintenanceId,
    vehicle: Option<VehicleId>,
    location: LocationId,
    start: DateTime,
    end: DateTime,
    mandatory: bool,
}

impl Maintenance {
    pub fn new(
        id: MaintenanceId,
        vehicle: Option<VehicleId>,
        location: LocationId,
        start: DateTime,
        end: DateTime,
        mandatory: bool,
    ) -> Maintenance {
        Maintenance {
            id,
            vehicle,
            location,
            start,
            end,
            mandatory,
        }
    }

    pub fn id(&self) -> MaintenanceId {
        self.id
    }

    pub fn vehicle(&self) -> Option<VehicleId> {
        self.vehicle
    }

    pub fn location(&self) -> LocationId {
        self.location
    }

    pub fn start(&self) -> DateTime {
        self.start
    }

    pub fn end(&self) -> DateTime {
        self.end
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    pub fn is_available_for(&self, vehicle: VehicleId) -> bool {
        self.vehicle.map_or(true, |v| v == vehicle)
    }
}
