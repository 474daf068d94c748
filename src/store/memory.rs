//! In-memory store for tests, demos and embedding

use std::sync::Arc;

use parking_lot::Mutex;

use crate::core::{Device, DeviceId, Point2, RangeSampleRow};
use crate::store::{PositionStore, StoreError, StoreResult, StoreSession};

#[derive(Debug, Default)]
struct MemoryState {
    devices: Vec<Device>,
    samples: Vec<RangeSampleRow>,
    disconnected: bool,
    failing_commits: u32,
    open_sessions: usize,
    commits: u64,
}

/// Shared in-memory device and sample tables.
///
/// Clones share the same tables, so a test can hand one clone to the
/// estimation loop and inspect results through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data(devices: Vec<Device>, samples: Vec<RangeSampleRow>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock();
            state.devices = devices;
            state.samples = samples;
        }
        store
    }

    pub fn insert_device(&self, device: Device) {
        self.state.lock().devices.push(device);
    }

    pub fn insert_sample(&self, sample: RangeSampleRow) {
        self.state.lock().samples.push(sample);
    }

    pub fn devices(&self) -> Vec<Device> {
        self.state.lock().devices.clone()
    }

    pub fn device(&self, id: DeviceId) -> Option<Device> {
        self.state.lock().devices.iter().find(|d| d.id == id).cloned()
    }

    /// Make every subsequent `connect` fail until [`MemoryStore::reconnect`]
    pub fn disconnect(&self) {
        self.state.lock().disconnected = true;
    }

    pub fn reconnect(&self) {
        self.state.lock().disconnected = false;
    }

    /// Fail the next `count` commits
    pub fn fail_next_commits(&self, count: u32) {
        self.state.lock().failing_commits = count;
    }

    /// Sessions currently alive
    pub fn open_sessions(&self) -> usize {
        self.state.lock().open_sessions
    }

    /// Successful commits so far
    pub fn commit_count(&self) -> u64 {
        self.state.lock().commits
    }
}

impl PositionStore for MemoryStore {
    fn connect(&self) -> StoreResult<Box<dyn StoreSession + '_>> {
        let mut state = self.state.lock();
        if state.disconnected {
            return Err(StoreError::Unavailable {
                reason: "memory store disconnected".to_string(),
            });
        }
        state.open_sessions += 1;

        Ok(Box::new(MemorySession {
            store: self,
            staged: Vec::new(),
        }))
    }

    fn describe(&self) -> String {
        "memory store".to_string()
    }
}

struct MemorySession<'a> {
    store: &'a MemoryStore,
    staged: Vec<(DeviceId, Point2)>,
}

impl StoreSession for MemorySession<'_> {
    fn read_devices(&mut self) -> StoreResult<Vec<Device>> {
        Ok(self.store.state.lock().devices.clone())
    }

    fn read_range_samples(&mut self) -> StoreResult<Vec<RangeSampleRow>> {
        Ok(self.store.state.lock().samples.clone())
    }

    fn update_tag_position(&mut self, tag_id: DeviceId, position: Point2) -> StoreResult<bool> {
        let is_tag = self
            .store
            .state
            .lock()
            .devices
            .iter()
            .any(|d| d.id == tag_id && d.is_tag());

        if is_tag {
            self.staged.push((tag_id, position));
        }
        Ok(is_tag)
    }

    fn commit(&mut self) -> StoreResult<()> {
        let mut state = self.store.state.lock();
        if state.failing_commits > 0 {
            state.failing_commits -= 1;
            self.staged.clear();
            return Err(StoreError::CommitFailed {
                reason: "injected commit failure".to_string(),
            });
        }

        for (tag_id, position) in self.staged.drain(..) {
            if let Some(device) = state.devices.iter_mut().find(|d| d.id == tag_id && d.is_tag()) {
                device.set_position(position);
            }
        }
        state.commits += 1;
        Ok(())
    }
}

impl Drop for MemorySession<'_> {
    fn drop(&mut self) {
        let mut state = self.store.state.lock();
        state.open_sessions = state.open_sessions.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::with_data(
            vec![
                Device::anchor(1, "00:11:22:33:44:01", Point2::new(0.0, 0.0)),
                Device::tag(4, "00:11:22:33:44:04"),
            ],
            vec![RangeSampleRow::new(1, 4, 1, 250.0)],
        )
    }

    #[test]
    fn test_staged_writes_visible_after_commit() {
        let store = store();
        {
            let mut session = store.connect().unwrap();
            assert!(session.update_tag_position(4, Point2::new(1.5, 2.5)).unwrap());
            assert_eq!(store.device(4).unwrap().position(), None);
            session.commit().unwrap();
        }
        assert_eq!(store.device(4).unwrap().position(), Some(Point2::new(1.5, 2.5)));
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn test_uncommitted_writes_discarded_on_drop() {
        let store = store();
        {
            let mut session = store.connect().unwrap();
            session.update_tag_position(4, Point2::new(9.0, 9.0)).unwrap();
        }
        assert_eq!(store.device(4).unwrap().position(), None);
        assert_eq!(store.open_sessions(), 0);
    }

    #[test]
    fn test_anchor_updates_refused() {
        let store = store();
        let mut session = store.connect().unwrap();
        assert!(!session.update_tag_position(1, Point2::new(5.0, 5.0)).unwrap());
        assert!(!session.update_tag_position(42, Point2::new(5.0, 5.0)).unwrap());
        session.commit().unwrap();
        drop(session);

        assert_eq!(store.device(1).unwrap().position(), Some(Point2::new(0.0, 0.0)));
    }

    #[test]
    fn test_disconnect_and_commit_faults() {
        let store = store();
        store.disconnect();
        assert!(matches!(store.connect(), Err(StoreError::Unavailable { .. })));
        store.reconnect();

        store.fail_next_commits(1);
        let mut session = store.connect().unwrap();
        session.update_tag_position(4, Point2::new(1.0, 1.0)).unwrap();
        assert!(matches!(session.commit(), Err(StoreError::CommitFailed { .. })));
        drop(session);

        assert_eq!(store.device(4).unwrap().position(), None);
        assert_eq!(store.open_sessions(), 0);
    }
}
