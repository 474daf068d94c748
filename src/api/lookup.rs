//! Read-only position lookup
//!
//! Resolves a device by mac, by id, or by its 1-based ordinal in the device
//! table, and reports its stored coordinates. A device that has never been
//! located is still found; its coordinates are simply absent.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::core::{Device, DeviceId};
use crate::store::{PositionStore, StoreError};

/// How a device is identified in a lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PositionQuery {
    Mac(String),
    Id(DeviceId),
    /// 1-based row number in device table order
    Ordinal(usize),
}

impl fmt::Display for PositionQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionQuery::Mac(mac) => write!(f, "mac {}", mac),
            PositionQuery::Id(id) => write!(f, "id {}", id),
            PositionQuery::Ordinal(n) => write!(f, "device #{}", n),
        }
    }
}

/// Stored coordinates of a device
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DevicePosition {
    pub position_x: Option<f64>,
    pub position_y: Option<f64>,
}

impl From<&Device> for DevicePosition {
    fn from(device: &Device) -> Self {
        Self {
            position_x: device.position_x,
            position_y: device.position_y,
        }
    }
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no device matches {0}")]
    NotFound(PositionQuery),

    #[error("device ordinals start at 1")]
    InvalidOrdinal,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Find the device matching `query` in a fresh snapshot
pub fn lookup_position<S: PositionStore + ?Sized>(
    store: &S,
    query: &PositionQuery,
) -> Result<DevicePosition, LookupError> {
    if *query == PositionQuery::Ordinal(0) {
        return Err(LookupError::InvalidOrdinal);
    }

    let devices = store.connect()?.read_devices()?;

    let found = match query {
        PositionQuery::Mac(mac) => devices.iter().find(|d| d.mac == *mac),
        PositionQuery::Id(id) => devices.iter().find(|d| d.id == *id),
        PositionQuery::Ordinal(n) => devices.get(n - 1),
    };

    found
        .map(DevicePosition::from)
        .ok_or_else(|| LookupError::NotFound(query.clone()))
}
