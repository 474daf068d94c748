//! Position estimation engine

pub mod cycle;
pub mod estimation_loop;

pub use cycle::{CycleError, CycleOutcome, CycleReport, EstimationCycle, SkipReason};
pub use estimation_loop::{EstimationLoop, LoopState, LoopStats};
