//! Per-cycle data processing

pub mod aggregator;
pub mod writer;

pub use aggregator::{aggregate_distances, DistanceMatrix};
pub use writer::{PositionWriter, WriteSummary};
