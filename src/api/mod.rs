//! Query interface over the position store

pub mod lookup;

pub use lookup::{lookup_position, DevicePosition, LookupError, PositionQuery};
