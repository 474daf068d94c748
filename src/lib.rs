//! Tag Positioning Engine
//!
//! Estimates the planar position of mobile tags from range samples to three
//! fixed anchors. Each estimation cycle reads a snapshot of the device and
//! range-sample tables, averages the samples per tag/anchor pair, trilaterates
//! every tag and writes the determined positions back.

pub mod core;
pub mod algorithms;
pub mod processing;
pub mod validation;
pub mod store;
pub mod engine;
pub mod api;
pub mod utils;

// Re-export commonly used types
pub use crate::core::{Device, DeviceId, DeviceKind, Point2, PositionEstimate, RangeSample, RangeSampleRow};
pub use algorithms::trilateration::{solve, trilaterate, Solution};
pub use processing::{aggregate_distances, DistanceMatrix, PositionWriter, WriteSummary};
pub use validation::SampleValidator;
pub use store::{JsonFileStore, MemoryStore, PositionStore, StoreDocument, StoreError, StoreResult, StoreSession};
pub use engine::{CycleError, CycleOutcome, CycleReport, EstimationCycle, EstimationLoop, LoopState, LoopStats, SkipReason};
pub use api::{lookup_position, DevicePosition, LookupError, PositionQuery};
pub use utils::{ConfigError, EngineConfig};
