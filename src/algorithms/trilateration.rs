//! Planar trilateration from exactly three anchors
//!
//! Subtracting the circle equation of anchor 1 from those of anchors 2 and 3
//! removes the quadratic terms and leaves an exactly determined 2×2 system:
//!
//! ```text
//! -2(x1-x2)·x - 2(y1-y2)·y = d1² - d2² - x1² + x2² - y1² + y2²
//! -2(x1-x3)·x - 2(y1-y3)·y = d1² - d3² - x1² + x3² - y1² + y3²
//! ```
//!
//! The system is solved directly, never by least squares. Collinear or
//! duplicated anchors make it singular and the solve is reported as
//! [`Solution::Undetermined`] rather than as an error.

use nalgebra::{Matrix2, Vector2};

use crate::core::{DeviceId, Point2, PositionEstimate, ANCHORS_PER_SOLVE};

/// Relative determinant threshold below which the system is treated as singular
pub const SINGULARITY_TOLERANCE: f64 = 1e-12;

/// Outcome of a single trilateration solve
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Solution {
    Fixed(Point2),
    Undetermined,
}

impl Solution {
    pub fn is_fixed(&self) -> bool {
        matches!(self, Solution::Fixed(_))
    }

    /// Coordinates with NaN sentinels for an undetermined solve
    pub fn coordinates(&self) -> (f64, f64) {
        match self {
            Solution::Fixed(p) => (p.x, p.y),
            Solution::Undetermined => (f64::NAN, f64::NAN),
        }
    }

    pub fn into_estimate(self, tag_id: DeviceId) -> PositionEstimate {
        let (x, y) = self.coordinates();
        PositionEstimate::new(tag_id, x, y)
    }
}

/// Solve from parallel coordinate and distance slices.
///
/// Only the first three entries of each slice are used. Shorter slices cannot
/// form the system and yield [`Solution::Undetermined`].
pub fn solve(anchor_x: &[f64], anchor_y: &[f64], distances: &[f64]) -> Solution {
    if anchor_x.len() < ANCHORS_PER_SOLVE
        || anchor_y.len() < ANCHORS_PER_SOLVE
        || distances.len() < ANCHORS_PER_SOLVE
    {
        return Solution::Undetermined;
    }

    let anchors = [
        Point2::new(anchor_x[0], anchor_y[0]),
        Point2::new(anchor_x[1], anchor_y[1]),
        Point2::new(anchor_x[2], anchor_y[2]),
    ];
    trilaterate(&anchors, &[distances[0], distances[1], distances[2]])
}

/// Solve for the point at `distances` (meters) from the three anchors
pub fn trilaterate(anchors: &[Point2; 3], distances: &[f64; 3]) -> Solution {
    let [p1, p2, p3] = anchors;
    let [d1, d2, d3] = *distances;

    let a = Matrix2::new(
        -2.0 * (p1.x - p2.x),
        -2.0 * (p1.y - p2.y),
        -2.0 * (p1.x - p3.x),
        -2.0 * (p1.y - p3.y),
    );
    let b = Vector2::new(
        d1.powi(2) - d2.powi(2) - p1.x.powi(2) + p2.x.powi(2) - p1.y.powi(2) + p2.y.powi(2),
        d1.powi(2) - d3.powi(2) - p1.x.powi(2) + p3.x.powi(2) - p1.y.powi(2) + p3.y.powi(2),
    );

    if is_singular(&a) {
        return Solution::Undetermined;
    }

    match a.lu().solve(&b) {
        Some(xy) if xy.x.is_finite() && xy.y.is_finite() => Solution::Fixed(Point2::new(xy.x, xy.y)),
        _ => Solution::Undetermined,
    }
}

// Scale-relative so that collinear anchors with inexact coordinates still
// register as singular.
fn is_singular(a: &Matrix2<f64>) -> bool {
    let det = a.determinant();
    if !det.is_finite() {
        return true;
    }
    let scale = a.row(0).norm() * a.row(1).norm();
    det.abs() <= SINGULARITY_TOLERANCE * scale
}
