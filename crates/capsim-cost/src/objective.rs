//! Configuration search objective.
//!
//! Scores a candidate scaling configuration by replaying the samples
//! under it. Throttling after warm-up is a hard constraint: such
//! candidates score [`THROTTLE_PENALTY`] regardless of price.

use tracing::trace;

use capsim_core::{ScalingConfig, TimeSeriesSample};
use capsim_engine::replay;

use crate::estimator::estimate_daily_cost;

/// Score returned for candidates that throttle or cannot be simulated.
pub const THROTTLE_PENALTY: f64 = 99_999_999_999.0;

/// Leading samples whose throttling is tolerated while burst credit and
/// utilization history fill up.
pub const DEFAULT_WARMUP_SAMPLES: usize = 5;

/// A point in search space: integer bounds and a target percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub min: i64,
    pub max: i64,
    pub target_percent: i64,
}

impl Candidate {
    pub fn new(min: i64, max: i64, target_percent: i64) -> Self {
        Self {
            min,
            max,
            target_percent,
        }
    }

    /// Read a `[min, max, target_percent]` point as handed out by a
    /// minimizer.
    pub fn from_point(x: &[i64]) -> Option<Self> {
        match x {
            [min, max, target_percent] => Some(Self::new(*min, *max, *target_percent)),
            _ => None,
        }
    }

    /// Substitute this candidate's bounds and target into `base`,
    /// keeping its scaling delay.
    pub fn apply(&self, base: &ScalingConfig) -> ScalingConfig {
        ScalingConfig {
            min: self.min as f64,
            max: self.max as f64,
            target: self.target_percent as f64 / 100.0,
            ..*base
        }
    }
}

/// Daily-cost objective over a fixed sample series.
#[derive(Debug, Clone)]
pub struct Objective<'a> {
    base: ScalingConfig,
    samples: &'a [TimeSeriesSample],
    price_per_hour: f64,
    warmup: usize,
}

impl<'a> Objective<'a> {
    pub fn new(base: ScalingConfig, samples: &'a [TimeSeriesSample], price_per_hour: f64) -> Self {
        Self {
            base,
            samples,
            price_per_hour,
            warmup: DEFAULT_WARMUP_SAMPLES,
        }
    }

    pub fn with_warmup(mut self, warmup: usize) -> Self {
        self.warmup = warmup;
        self
    }

    /// Average daily cost of `candidate`, or [`THROTTLE_PENALTY`].
    pub fn evaluate(&self, candidate: &Candidate) -> f64 {
        let config = candidate.apply(&self.base);
        if let Err(e) = config.validate() {
            trace!(?candidate, error = %e, "candidate rejected");
            return THROTTLE_PENALTY;
        }

        let trace = match replay(config, self.samples) {
            Ok(trace) => trace,
            Err(e) => {
                trace!(?candidate, error = %e, "replay failed");
                return THROTTLE_PENALTY;
            }
        };

        let throttled = trace.total_throttled_after(self.warmup);
        if throttled > 0.0 {
            trace!(?candidate, throttled, "candidate throttles");
            return THROTTLE_PENALTY;
        }

        estimate_daily_cost(&trace.provisioned_series(), self.price_per_hour)
            .unwrap_or(THROTTLE_PENALTY)
    }

    /// Evaluate a raw minimizer point; malformed points score the penalty.
    pub fn evaluate_point(&self, x: &[i64]) -> f64 {
        match Candidate::from_point(x) {
            Some(candidate) => self.evaluate(&candidate),
            None => THROTTLE_PENALTY,
        }
    }
}
