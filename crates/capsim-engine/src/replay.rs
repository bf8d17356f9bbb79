//! Drives a fresh simulator over a sample series and records the trace.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use capsim_core::{CapsimResult, ScalingConfig, TimeSeriesSample};

use crate::simulator::TableCapacitySim;

/// One replayed minute.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TracePoint {
    pub timestamp: DateTime<Utc>,
    /// Capacity in effect when the tick began.
    pub provisioned: f64,
    pub consumed: f64,
    pub throttled: f64,
    pub burst_available: f64,
}

/// Parallel series produced by a replay, one point per input sample.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trace {
    pub points: Vec<TracePoint>,
}

impl Trace {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn timestamps(&self) -> Vec<DateTime<Utc>> {
        self.points.iter().map(|p| p.timestamp).collect()
    }

    pub fn provisioned(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.provisioned).collect()
    }

    pub fn consumed(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.consumed).collect()
    }

    pub fn throttled(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.throttled).collect()
    }

    pub fn burst_available(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.burst_available).collect()
    }

    /// `(timestamp, provisioned)` pairs, the input to cost estimation.
    pub fn provisioned_series(&self) -> Vec<(DateTime<Utc>, f64)> {
        self.points
            .iter()
            .map(|p| (p.timestamp, p.provisioned))
            .collect()
    }

    pub fn total_throttled(&self) -> f64 {
        self.total_throttled_after(0)
    }

    /// Throttled units, ignoring the first `skip` points.
    pub fn total_throttled_after(&self, skip: usize) -> f64 {
        self.points.iter().skip(skip).map(|p| p.throttled).sum()
    }

    /// Number of ticks whose provisioned capacity differs from the
    /// previous tick's.
    pub fn scaling_events(&self) -> usize {
        self.points
            .windows(2)
            .filter(|w| w[0].provisioned != w[1].provisioned)
            .count()
    }

    pub fn peak_provisioned(&self) -> Option<f64> {
        self.points.iter().map(|p| p.provisioned).reduce(f64::max)
    }
}

/// Replay `samples` through a new simulator built from `config`.
pub fn replay(config: ScalingConfig, samples: &[TimeSeriesSample]) -> CapsimResult<Trace> {
    replay_with(TableCapacitySim::new(config)?, samples)
}

/// Replay `samples` through an already constructed simulator, e.g. one
/// starting from a table's current capacity.
pub fn replay_with(
    mut sim: TableCapacitySim,
    samples: &[TimeSeriesSample],
) -> CapsimResult<Trace> {
    let mut points = Vec::with_capacity(samples.len());

    for sample in samples {
        let provisioned = sim.capacity();
        let result = sim.process(sample.timestamp, sample.per_second_demand())?;
        points.push(TracePoint {
            timestamp: sample.timestamp,
            provisioned,
            consumed: result.consumed_capacity,
            throttled: result.throttled,
            burst_available: result.burst_available,
        });
    }

    let trace = Trace { points };
    debug!(
        samples = trace.len(),
        scaling_events = trace.scaling_events(),
        throttled = trace.total_throttled(),
        "replay finished"
    );
    Ok(trace)
}
