//! JSON document store on disk
//!
//! The file holds both tables:
//!
//! ```json
//! {
//!   "devices": [
//!     { "id": 1, "mac": "00:11:22:33:44:01", "kind": "anchor", "position_x": 0.0, "position_y": 0.0 },
//!     { "id": 4, "mac": "00:11:22:33:44:04", "kind": "tag", "position_x": null, "position_y": null }
//!   ],
//!   "range_samples": [
//!     { "id": 1, "source_id": 4, "dest_id": 1, "distance_cm": 500.0, "rtt_ns": 33.4 }
//!   ]
//! }
//! ```
//!
//! A session loads the document on connect. Commit re-reads the file, applies
//! the staged tag positions and replaces the file through a temporary sibling,
//! so samples appended by the feeder in the meantime are kept.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{Device, DeviceId, Point2, RangeSampleRow};
use crate::store::{PositionStore, StoreError, StoreResult, StoreSession};

/// On-disk layout of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub range_samples: Vec<RangeSampleRow>,
}

/// Store backed by a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Write `document` to `path` and open a store over it
    pub fn create<P: AsRef<Path>>(path: P, document: &StoreDocument) -> StoreResult<Self> {
        let store = Self::new(path);
        store.save(document)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> StoreResult<StoreDocument> {
        let content = fs::read_to_string(&self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        serde_json::from_str(&content).map_err(|e| StoreError::Malformed {
            details: format!("{}: {}", self.path.display(), e),
        })
    }

    fn save(&self, document: &StoreDocument) -> StoreResult<()> {
        let content = serde_json::to_string_pretty(document).map_err(|e| StoreError::Malformed {
            details: format!("failed to encode store document: {}", e),
        })?;

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content).map_err(|source| StoreError::Io {
            path: tmp_path.clone(),
            source,
        })?;
        fs::rename(&tmp_path, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl PositionStore for JsonFileStore {
    fn connect(&self) -> StoreResult<Box<dyn StoreSession + '_>> {
        let document = self.load()?;
        debug!(
            path = %self.path.display(),
            devices = document.devices.len(),
            samples = document.range_samples.len(),
            "opened JSON store session"
        );

        Ok(Box::new(JsonFileSession {
            store: self,
            document,
            staged: Vec::new(),
        }))
    }

    fn describe(&self) -> String {
        format!("JSON store at {}", self.path.display())
    }
}

struct JsonFileSession<'a> {
    store: &'a JsonFileStore,
    document: StoreDocument,
    staged: Vec<(DeviceId, Point2)>,
}

impl StoreSession for JsonFileSession<'_> {
    fn read_devices(&mut self) -> StoreResult<Vec<Device>> {
        Ok(self.document.devices.clone())
    }

    fn read_range_samples(&mut self) -> StoreResult<Vec<RangeSampleRow>> {
        Ok(self.document.range_samples.clone())
    }

    fn update_tag_position(&mut self, tag_id: DeviceId, position: Point2) -> StoreResult<bool> {
        let is_tag = self.document.devices.iter().any(|d| d.id == tag_id && d.is_tag());
        if is_tag {
            self.staged.push((tag_id, position));
        }
        Ok(is_tag)
    }

    fn commit(&mut self) -> StoreResult<()> {
        if self.staged.is_empty() {
            return Ok(());
        }

        let mut latest = self.store.load()?;
        for (tag_id, position) in self.staged.drain(..) {
            if let Some(device) = latest.devices.iter_mut().find(|d| d.id == tag_id && d.is_tag()) {
                device.set_position(position);
            }
        }
        self.store.save(&latest)?;
        self.document = latest;
        Ok(())
    }
}
