//! One estimation cycle: snapshot, aggregate, solve, write, commit

use thiserror::Error;
use tracing::{debug, warn};

use crate::algorithms::trilateration::solve;
use crate::core::{Device, DeviceId, PositionEstimate, ANCHORS_PER_SOLVE};
use crate::processing::{aggregate_distances, PositionWriter, WriteSummary};
use crate::store::{PositionStore, StoreError};
use crate::validation::SampleValidator;

/// Failure that abandons a cycle
#[derive(Debug, Error)]
pub enum CycleError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why a cycle ended without solving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InsufficientAnchors { available: usize, required: usize },
    NoTags,
}

/// What a completed cycle did
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub anchors: usize,
    pub tags: usize,
    pub samples_used: usize,
    pub samples_rejected: usize,
    pub estimates: Vec<PositionEstimate>,
    pub write: WriteSummary,
}

impl CycleReport {
    pub fn determined(&self) -> usize {
        self.estimates.iter().filter(|e| e.is_determined()).count()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Updated(CycleReport),
    Skipped(SkipReason),
}

/// Stateless cycle runner; every call recomputes from the latest snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimationCycle {
    validator: SampleValidator,
    writer: PositionWriter,
}

impl EstimationCycle {
    pub fn new(writer: PositionWriter) -> Self {
        Self {
            validator: SampleValidator::new(),
            writer,
        }
    }

    /// Run a single cycle against `store`.
    ///
    /// The session opened here is dropped on every return path, which
    /// releases it and discards anything left uncommitted.
    pub fn run<S: PositionStore + ?Sized>(&self, store: &S) -> Result<CycleOutcome, CycleError> {
        let mut session = store.connect()?;

        let devices = session.read_devices()?;
        let rows = session.read_range_samples()?;

        let (anchors, tags): (Vec<&Device>, Vec<&Device>) = devices.iter().partition(|d| d.is_anchor());

        if anchors.len() < ANCHORS_PER_SOLVE {
            return Ok(CycleOutcome::Skipped(SkipReason::InsufficientAnchors {
                available: anchors.len(),
                required: ANCHORS_PER_SOLVE,
            }));
        }
        if tags.is_empty() {
            return Ok(CycleOutcome::Skipped(SkipReason::NoTags));
        }

        let validation = self.validator.validate_samples(rows);
        if validation.rejected_count() > 0 {
            debug!(rejected = validation.rejected_count(), "dropped incomplete range samples");
        }

        let tag_ids: Vec<DeviceId> = tags.iter().map(|d| d.id).collect();
        let anchor_ids: Vec<DeviceId> = anchors.iter().map(|d| d.id).collect();
        let distances = aggregate_distances(&validation.valid_samples, &tag_ids, &anchor_ids);

        let mut anchor_x = Vec::with_capacity(anchors.len());
        let mut anchor_y = Vec::with_capacity(anchors.len());
        for anchor in &anchors {
            let (x, y) = match anchor.position() {
                Some(p) => (p.x, p.y),
                None => {
                    warn!(anchor_id = anchor.id, mac = %anchor.mac, "anchor has no configured position");
                    (f64::NAN, f64::NAN)
                }
            };
            anchor_x.push(x);
            anchor_y.push(y);
        }

        let estimates: Vec<PositionEstimate> = distances
            .rows()
            .map(|(tag_id, row)| solve(&anchor_x, &anchor_y, &row).into_estimate(tag_id))
            .collect();

        let write = self.writer.apply(session.as_mut(), &estimates)?;
        session.commit()?;

        Ok(CycleOutcome::Updated(CycleReport {
            anchors: anchors.len(),
            tags: tags.len(),
            samples_used: distances.samples_used(),
            samples_rejected: validation.rejected_count(),
            estimates,
            write,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Point2, RangeSampleRow};
    use crate::store::MemoryStore;

    fn anchors() -> Vec<Device> {
        vec![
            Device::anchor(1, "00:11:22:33:44:01", Point2::new(0.0, 0.0)),
            Device::anchor(2, "00:11:22:33:44:02", Point2::new(10.0, 0.0)),
            Device::anchor(3, "00:11:22:33:44:03", Point2::new(0.0, 10.0)),
        ]
    }

    #[test]
    fn test_insufficient_anchors_skip() {
        let mut devices = anchors();
        devices.truncate(2);
        devices.push(Device::tag(4, "00:11:22:33:44:04"));
        let store = MemoryStore::with_data(devices, vec![RangeSampleRow::new(1, 4, 1, 500.0)]);

        let outcome = EstimationCycle::default().run(&store).unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Skipped(SkipReason::InsufficientAnchors { available: 2, required: 3 })
        );
        assert_eq!(store.commit_count(), 0);
        assert_eq!(store.open_sessions(), 0);
    }

    #[test]
    fn test_no_tags_skip() {
        let store = MemoryStore::with_data(anchors(), Vec::new());
        let outcome = EstimationCycle::default().run(&store).unwrap();
        assert_eq!(outcome, CycleOutcome::Skipped(SkipReason::NoTags));
    }

    #[test]
    fn test_tag_without_samples_is_undetermined() {
        let mut devices = anchors();
        devices.push(Device::tag(4, "00:11:22:33:44:04"));
        let store = MemoryStore::with_data(devices, Vec::new());

        match EstimationCycle::default().run(&store).unwrap() {
            CycleOutcome::Updated(report) => {
                assert_eq!(report.tags, 1);
                assert_eq!(report.determined(), 0);
                assert_eq!(report.write.skipped, 1);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(store.device(4).unwrap().position(), None);
        assert_eq!(store.commit_count(), 1);
    }

    #[test]
    fn test_anchor_without_position_leaves_tag_unchanged() {
        let mut devices = anchors();
        devices[1].position_x = None;
        let mut tag = Device::tag(4, "00:11:22:33:44:04");
        tag.set_position(Point2::new(1.0, 1.0));
        devices.push(tag);
        let samples = vec![
            RangeSampleRow::new(1, 4, 1, 500.0),
            RangeSampleRow::new(2, 4, 2, 806.0),
            RangeSampleRow::new(3, 4, 3, 671.0),
        ];
        let store = MemoryStore::with_data(devices, samples);

        EstimationCycle::default().run(&store).unwrap();
        assert_eq!(store.device(4).unwrap().position(), Some(Point2::new(1.0, 1.0)));
    }

    #[test]
    fn test_store_failure_releases_session() {
        let mut devices = anchors();
        devices.push(Device::tag(4, "00:11:22:33:44:04"));
        let store = MemoryStore::with_data(devices, vec![RangeSampleRow::new(1, 4, 1, 500.0)]);
        store.fail_next_commits(1);

        let result = EstimationCycle::default().run(&store);
        assert!(matches!(result, Err(CycleError::Store(StoreError::CommitFailed { .. }))));
        assert_eq!(store.open_sessions(), 0);
    }
}
