//! Per-cycle distance aggregation
//!
//! Reduces validated range samples to one mean distance per (tag, anchor)
//! pair. The result always covers the full tag × anchor grid; pairs without
//! samples hold NaN, never zero.

use std::collections::HashMap;

use nalgebra::DMatrix;

use crate::core::{DeviceId, RangeSample, CM_PER_METER};

/// Mean tag-to-anchor distances in meters, rows = tags, columns = anchors
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    tag_ids: Vec<DeviceId>,
    anchor_ids: Vec<DeviceId>,
    meters: DMatrix<f64>,
    samples_used: usize,
}

impl DistanceMatrix {
    pub fn tag_ids(&self) -> &[DeviceId] {
        &self.tag_ids
    }

    pub fn anchor_ids(&self) -> &[DeviceId] {
        &self.anchor_ids
    }

    /// (tags, anchors)
    pub fn shape(&self) -> (usize, usize) {
        self.meters.shape()
    }

    /// Number of samples that contributed to at least one mean
    pub fn samples_used(&self) -> usize {
        self.samples_used
    }

    /// Mean distance for a pair, `None` when either id is unknown or the pair had no samples
    pub fn get(&self, tag_id: DeviceId, anchor_id: DeviceId) -> Option<f64> {
        let row = self.tag_ids.iter().position(|&id| id == tag_id)?;
        let col = self.anchor_ids.iter().position(|&id| id == anchor_id)?;
        let value = self.meters[(row, col)];
        (!value.is_nan()).then_some(value)
    }

    /// Distances from one tag to every anchor, in anchor order, NaN for missing pairs
    pub fn row(&self, tag_index: usize) -> Vec<f64> {
        self.meters.row(tag_index).iter().copied().collect()
    }

    /// (tag id, distance row) for every tag in tag order
    pub fn rows(&self) -> impl Iterator<Item = (DeviceId, Vec<f64>)> + '_ {
        self.tag_ids
            .iter()
            .enumerate()
            .map(move |(index, &tag_id)| (tag_id, self.row(index)))
    }

    /// Number of pairs that received at least one sample
    pub fn populated_pairs(&self) -> usize {
        self.meters.iter().filter(|v| !v.is_nan()).count()
    }
}

/// Build the distance matrix for the given tags and anchors.
///
/// Only samples whose source is a listed tag and whose destination is a
/// listed anchor are used.
pub fn aggregate_distances(
    samples: &[RangeSample],
    tag_ids: &[DeviceId],
    anchor_ids: &[DeviceId],
) -> DistanceMatrix {
    let tag_index: HashMap<DeviceId, usize> =
        tag_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();
    let anchor_index: HashMap<DeviceId, usize> =
        anchor_ids.iter().enumerate().map(|(i, &id)| (id, i)).collect();

    // (row, col) -> (sum of distances in cm, sample count)
    let mut groups: HashMap<(usize, usize), (f64, u32)> = HashMap::new();
    let mut samples_used = 0;

    for sample in samples {
        let (Some(&row), Some(&col)) = (tag_index.get(&sample.source_id), anchor_index.get(&sample.dest_id))
        else {
            continue;
        };
        let entry = groups.entry((row, col)).or_insert((0.0, 0));
        entry.0 += sample.distance_cm;
        entry.1 += 1;
        samples_used += 1;
    }

    let meters = DMatrix::from_fn(tag_ids.len(), anchor_ids.len(), |row, col| {
        match groups.get(&(row, col)) {
            Some(&(sum_cm, count)) => sum_cm / count as f64 / CM_PER_METER,
            None => f64::NAN,
        }
    });

    DistanceMatrix {
        tag_ids: tag_ids.to_vec(),
        anchor_ids: anchor_ids.to_vec(),
        meters,
        samples_used,
    }
}
