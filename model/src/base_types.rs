use derive_more::Display;
use derive_more::From;
use serde::{Deserialize, Serialize};

pub type Idx = usize;
pub type Meter = u64;
pub type Kwh = f64;
pub type Kw = f64;
pub type Cost = f64;

/// Absolute tolerance for comparing energies, costs and LP values.
pub const EPS: f64 = 1e-5;

#[derive(
    Display, From, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct LocationId(pub Idx);

#[derive(
    Display, From, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct VehicleId(pub Idx);

#[derive(
    Display, From, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TripId(pub Idx);

#[derive(
    Display, From, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ChargerId(pub Idx);

#[derive(
    Display, From, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MaintenanceId(pub Idx);

/// Index of a node in the arena of an [`crate::network::ActivityNetwork`].
#[derive(Display, From, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeIdx(pub Idx);

/// Index of an arc in the arena of an [`crate::network::ActivityNetwork`].
#[derive(Display, From, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArcIdx(pub Idx);

pub fn meter_to_km(distance: Meter) -> f64 {
    distance as f64 / 1000.0
}
