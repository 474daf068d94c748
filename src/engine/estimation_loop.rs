//! Fixed-cadence estimation loop
//!
//! Runs [`EstimationCycle`] forever with a fixed sleep between cycles. A
//! failed cycle is logged and counted; the loop always carries on with the
//! next one. There is no retry limit and no backoff growth.

use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::engine::cycle::{CycleError, CycleOutcome, EstimationCycle, SkipReason};
use crate::processing::PositionWriter;
use crate::store::PositionStore;
use crate::utils::EngineConfig;

/// Whether a cycle is in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Cumulative loop counters
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopStats {
    pub cycles: u64,
    pub updated: u64,
    pub skipped: u64,
    pub failed: u64,
    pub positions_written: u64,
    /// Duration of the most recent cycle in microseconds
    pub last_cycle_us: u64,
    pub last_error: Option<String>,
}

pub struct EstimationLoop<S: PositionStore> {
    store: S,
    cycle: EstimationCycle,
    interval: Duration,
    state: LoopState,
    stats: LoopStats,
}

impl<S: PositionStore> EstimationLoop<S> {
    pub fn new(store: S, interval: Duration) -> Self {
        Self {
            store,
            cycle: EstimationCycle::default(),
            interval,
            state: LoopState::Idle,
            stats: LoopStats::default(),
        }
    }

    pub fn from_config(store: S, config: &EngineConfig) -> Self {
        let mut estimation_loop = Self::new(store, config.cycle_interval());
        estimation_loop.cycle = EstimationCycle::new(PositionWriter::with_decimals(config.position_decimals));
        estimation_loop
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one cycle, log its outcome and update the counters
    pub fn run_once(&mut self) -> Result<CycleOutcome, CycleError> {
        self.state = LoopState::Running;
        let started = Instant::now();

        let result = self.cycle.run(&self.store);

        self.stats.cycles += 1;
        self.stats.last_cycle_us = started.elapsed().as_micros() as u64;
        self.state = LoopState::Idle;

        match &result {
            Ok(CycleOutcome::Updated(report)) => {
                self.stats.updated += 1;
                self.stats.positions_written += report.write.written as u64;
                info!(
                    tags = report.tags,
                    anchors = report.anchors,
                    written = report.write.written,
                    undetermined = report.write.skipped,
                    "tag positions updated"
                );
                for estimate in &report.estimates {
                    debug!(tag_id = estimate.tag_id, x = estimate.x, y = estimate.y, "estimate");
                }
            }
            Ok(CycleOutcome::Skipped(reason)) => {
                self.stats.skipped += 1;
                match reason {
                    SkipReason::InsufficientAnchors { available, required } => {
                        info!(available, required, "not enough anchors to compute positions")
                    }
                    SkipReason::NoTags => info!("no tags to locate"),
                }
            }
            Err(e) => {
                self.stats.failed += 1;
                self.stats.last_error = Some(e.to_string());
                error!(error = %e, store = %self.store.describe(), "estimation cycle failed");
            }
        }

        result
    }

    /// Run `count` cycles, sleeping the interval between consecutive ones
    pub fn run_cycles(&mut self, count: u64) -> &LoopStats {
        for cycle in 0..count {
            if cycle > 0 {
                thread::sleep(self.interval);
            }
            // Failures are already logged and counted
            let _ = self.run_once();
        }
        &self.stats
    }

    /// Run until the process is terminated
    pub fn run(&mut self) -> ! {
        info!(
            store = %self.store.describe(),
            interval_ms = self.interval.as_millis() as u64,
            "starting position estimation loop"
        );
        loop {
            let _ = self.run_once();
            thread::sleep(self.interval);
        }
    }
}
