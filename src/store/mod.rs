//! Storage abstraction for device and range-sample tables
//!
//! The engine never holds a long-lived connection. Each estimation cycle opens
//! a [`StoreSession`] through [`PositionStore::connect`], reads its snapshot,
//! stages tag position writes and commits them. Dropping a session releases
//! it; writes that were staged but not committed are discarded.

pub mod error;
pub mod json_file;
pub mod memory;

pub use error::{StoreError, StoreResult};
pub use json_file::{JsonFileStore, StoreDocument};
pub use memory::MemoryStore;

use crate::core::{Device, DeviceId, Point2, RangeSampleRow};

/// A scoped connection to the store, alive for one cycle
pub trait StoreSession {
    /// Snapshot of every device, in table order
    fn read_devices(&mut self) -> StoreResult<Vec<Device>>;

    /// Snapshot of every range sample row, nullable columns included
    fn read_range_samples(&mut self) -> StoreResult<Vec<RangeSampleRow>>;

    /// Stage a position update for a tag.
    /// Returns `Ok(false)` when `tag_id` does not name a tag; anchors are never updated.
    fn update_tag_position(&mut self, tag_id: DeviceId, position: Point2) -> StoreResult<bool>;

    /// Make staged updates durable
    fn commit(&mut self) -> StoreResult<()>;
}

/// Source of scoped sessions
pub trait PositionStore {
    fn connect(&self) -> StoreResult<Box<dyn StoreSession + '_>>;

    /// Short human-readable description for log lines
    fn describe(&self) -> String;
}

impl<S: PositionStore + ?Sized> PositionStore for &S {
    fn connect(&self) -> StoreResult<Box<dyn StoreSession + '_>> {
        (**self).connect()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
