pub mod column;
pub mod json_serialisation;
mod schedule;
pub mod statistics;
pub mod test_utilities;
pub mod vehicle_schedule;

pub use column::Column;
pub use schedule::{CostBreakdown, Schedule};
pub use vehicle_schedule::VehicleSchedule;
