pub mod base_types;
pub mod chargers;
pub mod config;
pub mod errors;
pub mod instance;
pub mod json_serialisation;
pub mod locations;
pub mod maintenances;
pub mod network;
pub mod resource_state;
pub mod test_utilities;
pub mod trips;
pub mod vehicles;
