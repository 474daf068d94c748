//! Tag position write-back

use tracing::debug;

use crate::core::{Point2, PositionEstimate, POSITION_DECIMALS};
use crate::store::{StoreResult, StoreSession};

/// Counts from one write-back pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    /// Estimates staged for storage
    pub written: usize,
    /// Undetermined or non-finite estimates left untouched
    pub skipped: usize,
    /// Estimates whose id the store did not accept as a tag
    pub rejected: usize,
}

/// Stages determined tag positions on a session.
///
/// The writer never commits; the caller owns the transaction boundary.
#[derive(Debug, Clone, Copy)]
pub struct PositionWriter {
    decimals: i32,
}

impl Default for PositionWriter {
    fn default() -> Self {
        Self {
            decimals: POSITION_DECIMALS,
        }
    }
}

impl PositionWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_decimals(decimals: i32) -> Self {
        Self { decimals }
    }

    pub fn apply(
        &self,
        session: &mut (dyn StoreSession + '_),
        estimates: &[PositionEstimate],
    ) -> StoreResult<WriteSummary> {
        let mut summary = WriteSummary::default();

        for estimate in estimates {
            let Some(point) = estimate.point() else {
                debug!(tag_id = estimate.tag_id, "position undetermined, keeping stored value");
                summary.skipped += 1;
                continue;
            };

            let rounded = Point2::new(
                round_to(point.x, self.decimals),
                round_to(point.y, self.decimals),
            );
            if !(rounded.x.is_finite() && rounded.y.is_finite()) {
                debug!(tag_id = estimate.tag_id, "rounded position not finite, keeping stored value");
                summary.skipped += 1;
                continue;
            }
            if session.update_tag_position(estimate.tag_id, rounded)? {
                summary.written += 1;
            } else {
                debug!(tag_id = estimate.tag_id, "store refused update for non-tag id");
                summary.rejected += 1;
            }
        }

        Ok(summary)
    }
}

/// Round to the nearest value with `decimals` fractional digits.
///
/// Goes through the exact decimal expansion of `value`, so ties are decided
/// on the stored double rather than on a scaled copy of it. Non-finite values
/// and negative precisions are returned unchanged.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let Ok(precision) = usize::try_from(decimals) else {
        return value;
    };
    if !value.is_finite() {
        return value;
    }
    format!("{:.*}", precision, value).parse().unwrap_or(value)
}
