//! The per-minute auto-scaling state machine.
//!
//! One [`TableCapacitySim`] models one table direction. It is fed demand
//! in chronological order through [`TableCapacitySim::process`] and never
//! reads a clock of its own: every decision is a function of the
//! timestamps it is given.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, trace, warn};

use capsim_core::{CapsimError, CapsimResult, ScalingConfig};

use crate::burst::BurstPool;
use crate::history::UtilizationHistory;
use crate::limiter::ScaledownLimiter;

/// Consecutive over-target ticks required before scaling up.
pub const SCALE_UP_TICKS: usize = 2;

/// Scale-down requires every remembered tick to sit this many
/// utilization points below target (absolute, not relative).
pub const SCALE_DOWN_MARGIN: f64 = 0.20;

/// A scaling decision waiting for its delay to elapse.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PendingChange {
    pub effective_at: DateTime<Utc>,
    pub target_capacity: f64,
}

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TickResult {
    /// Demand served, from provisioned capacity plus burst.
    pub consumed_capacity: f64,
    /// Demand that could not be served at all.
    pub throttled: f64,
    /// Burst credit left after the tick.
    pub burst_available: f64,
}

#[derive(Debug, Clone)]
pub struct TableCapacitySim {
    config: ScalingConfig,
    capacity: f64,
    burst: BurstPool,
    history: UtilizationHistory,
    pending: Option<PendingChange>,
    limiter: ScaledownLimiter,
    last_processed_at: Option<DateTime<Utc>>,
}

impl TableCapacitySim {
    /// Create a simulator provisioned at `config.min`.
    pub fn new(config: ScalingConfig) -> CapsimResult<Self> {
        Self::with_capacity(config, config.min)
    }

    /// Create a simulator starting from an already provisioned capacity,
    /// e.g. the value a table had when the replayed metrics begin.
    pub fn with_capacity(config: ScalingConfig, capacity: f64) -> CapsimResult<Self> {
        config.validate()?;
        if !capacity.is_finite() || capacity <= 0.0 {
            return Err(CapsimError::InvalidConfig(format!(
                "initial capacity must be positive, got {capacity}"
            )));
        }
        Ok(Self {
            config,
            capacity,
            burst: BurstPool::default(),
            history: UtilizationHistory::default(),
            pending: None,
            limiter: ScaledownLimiter::new(),
            last_processed_at: None,
        })
    }

    pub fn config(&self) -> &ScalingConfig {
        &self.config
    }

    /// Currently provisioned capacity.
    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn burst_available(&self) -> f64 {
        self.burst.sum()
    }

    pub fn burst_pool(&self) -> &BurstPool {
        &self.burst
    }

    pub fn utilization_history(&self) -> &UtilizationHistory {
        &self.history
    }

    pub fn pending_change(&self) -> Option<PendingChange> {
        self.pending
    }

    /// Scale-downs realized since the start of the current UTC day.
    pub fn scaledowns_today(&self) -> u32 {
        self.limiter.scaledowns()
    }

    /// Advance the simulation by one tick of `amount_requested` units.
    pub fn process(
        &mut self,
        timestamp: DateTime<Utc>,
        amount_requested: f64,
    ) -> CapsimResult<TickResult> {
        let requested = amount_requested.max(0.0);

        if let Some(last) = self.last_processed_at {
            if timestamp < last {
                warn!(%timestamp, last = %last, "tick is earlier than the previous one");
            }
            if timestamp.date_naive() != last.date_naive() {
                trace!(%timestamp, "day rollover, scale-down budget reset");
                self.limiter.reset();
            }
        }

        // Serve demand from capacity, then burst.
        let remaining = self.capacity - requested;
        let (consumed_capacity, throttled) = if remaining >= 0.0 {
            self.burst.add(remaining);
            (requested, 0.0)
        } else {
            let over = -remaining;
            // Never ask the pool for more than it reports holding.
            let burst_consumed = over.min(self.burst.sum());
            self.burst.consume(burst_consumed)?;
            (self.capacity + burst_consumed, over - burst_consumed)
        };

        self.history.push(requested / self.capacity);

        if self.pending.is_none() {
            self.decide(timestamp, requested);
        }
        self.realize(timestamp);

        self.last_processed_at = Some(timestamp);
        Ok(TickResult {
            consumed_capacity,
            throttled,
            burst_available: self.burst.sum(),
        })
    }

    /// Queue a scaling change if the utilization history calls for one.
    ///
    /// Scale-up is evaluated before scale-down; if both were to fire the
    /// scale-down proposal replaces the scale-up one.
    fn decide(&mut self, timestamp: DateTime<Utc>, requested: f64) {
        let target = self.config.target;
        let effective_at = timestamp + self.config.scaling_delay();
        let mut proposal = None;

        if self.history.recent_all_above(SCALE_UP_TICKS, target) {
            proposal = Some((requested / target).min(self.config.max));
        }

        if self.history.all_below(target - SCALE_DOWN_MARGIN) {
            if self.limiter.can_scale_down(effective_at) {
                proposal = Some((requested / target).max(self.config.min));
            } else {
                debug!(%timestamp, capacity = self.capacity, "scale-down rate limited");
            }
        }

        if let Some(target_capacity) = proposal {
            self.pending = Some(PendingChange {
                effective_at,
                target_capacity,
            });
        }
    }

    /// Apply the pending change once its delay has elapsed.
    fn realize(&mut self, timestamp: DateTime<Utc>) {
        let Some(change) = self.pending else {
            return;
        };
        if timestamp < change.effective_at {
            return;
        }

        if change.target_capacity < self.capacity {
            self.limiter.record(timestamp);
        }

        // Whole units keep later burst arithmetic free of float noise.
        let new_capacity = change.target_capacity.round().max(1.0);
        if new_capacity != self.capacity {
            debug!(
                %timestamp,
                from = self.capacity,
                to = new_capacity,
                direction = if new_capacity > self.capacity { "up" } else { "down" },
                "capacity changed"
            );
        }
        self.capacity = new_capacity;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn config(min: f64, max: f64, target: f64, delay: u32) -> ScalingConfig {
        ScalingConfig::new(min, max, target, delay)
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 2, 12, 0, 0).unwrap()
    }

    fn minute(n: i64) -> DateTime<Utc> {
        t0() + TimeDelta::minutes(n)
    }

    #[test]
    fn initializes_at_min() {
        let sim = TableCapacitySim::new(config(100.0, 1000.0, 0.5, 0)).unwrap();
        assert_eq!(sim.capacity(), 100.0);
        assert_eq!(sim.burst_available(), 0.0);
        assert_eq!(sim.burst_pool().window(), 5);
        assert_eq!(sim.utilization_history().len(), 15);
        assert!(sim.pending_change().is_none());
        assert_eq!(sim.config().target, 0.5);
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(TableCapacitySim::new(config(0.0, 1000.0, 0.5, 0)).is_err());
        assert!(TableCapacitySim::new(config(100.0, 1000.0, 1.5, 0)).is_err());
        assert!(TableCapacitySim::with_capacity(config(1.0, 10.0, 0.5, 0), 0.0).is_err());
    }

    #[test]
    fn keeps_last_five_ticks_of_unused_capacity_as_burst() {
        let mut sim = TableCapacitySim::new(config(100.0, 1000.0, 0.5, 0)).unwrap();
        let expected = [
            (30.0, 70.0, 100.0),
            (20.0, 150.0, 100.0),
            (100.0, 150.0, 100.0),
            (80.0, 170.0, 100.0),
            // Scaled up to 160 after the previous tick.
            (100.0, 230.0, 160.0),
            // Scaled up to 200; tick 1's 70 ages out.
            (200.0, 160.0, 200.0),
        ];
        for (requested, burst, capacity_before) in expected {
            assert_eq!(sim.capacity(), capacity_before);
            sim.process(t0(), requested).unwrap();
            assert_eq!(sim.burst_available(), burst);
        }
    }

    #[test]
    fn throttles_when_burst_is_empty() {
        let mut sim = TableCapacitySim::new(config(100.0, 1000.0, 0.5, 0)).unwrap();
        let result = sim.process(t0(), 200.0).unwrap();
        assert_eq!(result.consumed_capacity, 100.0);
        assert_eq!(result.throttled, 100.0);
        assert_eq!(sim.burst_available(), 0.0);
    }

    #[test]
    fn reports_consumed_throttled_and_burst() {
        let mut sim = TableCapacitySim::new(config(100.0, 1000.0, 0.5, 0)).unwrap();

        let result = sim.process(t0(), 150.0).unwrap();
        assert_eq!(result.consumed_capacity, 100.0);
        assert_eq!(result.throttled, 50.0);
        assert_eq!(result.burst_available, 0.0);

        let result = sim.process(t0(), 20.0).unwrap();
        assert_eq!(result.consumed_capacity, 20.0);
        assert_eq!(result.throttled, 0.0);
        assert_eq!(result.burst_available, 80.0);
    }

    #[test]
    fn burst_absorbs_overage_before_throttling() {
        let mut sim = TableCapacitySim::new(config(100.0, 1000.0, 0.5, 0)).unwrap();
        sim.process(minute(0), 30.0).unwrap();
        assert_eq!(sim.burst_available(), 70.0);

        let result = sim.process(minute(1), 150.0).unwrap();
        assert_eq!(result.consumed_capacity, 150.0);
        assert_eq!(result.throttled, 0.0);
        assert_eq!(result.burst_available, 20.0);
    }

    #[test]
    fn scales_up_after_two_ticks_over_target() {
        let mut sim = TableCapacitySim::new(config(100.0, 1000.0, 0.5, 0)).unwrap();
        sim.process(t0(), 100.0).unwrap();
        assert_eq!(sim.capacity(), 100.0);
        sim.process(t0(), 100.0).unwrap();
        // Lands demand exactly on target utilization.
        assert_eq!(sim.capacity(), 200.0);
    }

    #[test]
    fn scale_up_is_capped_at_max() {
        let mut sim = TableCapacitySim::new(config(100.0, 150.0, 0.5, 0)).unwrap();
        sim.process(t0(), 100.0).unwrap();
        sim.process(t0(), 100.0).unwrap();
        assert_eq!(sim.capacity(), 150.0);
    }

    #[test]
    fn scales_down_after_fifteen_ticks_below_threshold() {
        let mut sim = TableCapacitySim::with_capacity(config(100.0, 1000.0, 0.5, 0), 200.0).unwrap();

        // Fills one history slot with a high value so the zeroed history
        // cannot trigger a scale-down.
        sim.process(t0(), 200.0).unwrap();
        assert_eq!(sim.capacity(), 200.0);

        for _ in 0..14 {
            sim.process(t0(), 50.0).unwrap();
            assert_eq!(sim.capacity(), 200.0);
        }

        sim.process(t0(), 50.0).unwrap();
        assert_eq!(sim.capacity(), 100.0);
        assert_eq!(sim.scaledowns_today(), 1);
    }

    #[test]
    fn scale_down_is_floored_at_min() {
        let mut sim = TableCapacitySim::with_capacity(config(150.0, 1000.0, 0.5, 0), 400.0).unwrap();
        sim.process(t0(), 400.0).unwrap();
        for _ in 0..15 {
            sim.process(t0(), 20.0).unwrap();
        }
        assert_eq!(sim.capacity(), 150.0);
    }

    #[test]
    fn change_waits_for_scaling_delay() {
        let mut sim = TableCapacitySim::new(config(100.0, 1000.0, 0.5, 120)).unwrap();
        sim.process(minute(0), 100.0).unwrap();
        sim.process(minute(1), 100.0).unwrap();

        let pending = sim.pending_change().unwrap();
        assert_eq!(pending.effective_at, minute(3));
        assert_eq!(pending.target_capacity, 200.0);
        assert_eq!(sim.capacity(), 100.0);

        sim.process(minute(2), 100.0).unwrap();
        assert_eq!(sim.capacity(), 100.0);

        sim.process(minute(3), 100.0).unwrap();
        assert_eq!(sim.capacity(), 200.0);
        assert!(sim.pending_change().is_none());
    }

    #[test]
    fn pending_change_suppresses_new_decisions() {
        let mut sim = TableCapacitySim::new(config(100.0, 1000.0, 0.5, 300)).unwrap();
        sim.process(minute(0), 100.0).unwrap();
        sim.process(minute(1), 100.0).unwrap();
        // Demand keeps rising but the first decision stands.
        sim.process(minute(2), 400.0).unwrap();
        sim.process(minute(3), 400.0).unwrap();
        assert_eq!(sim.pending_change().unwrap().target_capacity, 200.0);

        sim.process(minute(6), 400.0).unwrap();
        assert_eq!(sim.capacity(), 200.0);
    }

    #[test]
    fn capacity_is_rounded_after_change() {
        let mut sim = TableCapacitySim::new(config(10.0, 1000.0, 0.7, 0)).unwrap();
        sim.process(t0(), 50.0).unwrap();
        sim.process(t0(), 50.0).unwrap();
        // 50 / 0.7 = 71.43
        assert_eq!(sim.capacity(), 71.0);
    }

    #[test]
    fn day_rollover_resets_scaledown_tracking() {
        let mut sim = TableCapacitySim::with_capacity(config(10.0, 1000.0, 0.5, 0), 400.0).unwrap();
        let start = Utc.with_ymd_and_hms(2000, 1, 2, 23, 0, 0).unwrap();

        sim.process(start, 200.0).unwrap();
        for m in 1..=15 {
            sim.process(start + TimeDelta::minutes(m), 112.0).unwrap();
        }
        assert_eq!(sim.capacity(), 224.0);
        assert_eq!(sim.scaledowns_today(), 1);

        let next_day = Utc.with_ymd_and_hms(2000, 1, 3, 0, 0, 0).unwrap();
        sim.process(next_day, 112.0).unwrap();
        assert_eq!(sim.scaledowns_today(), 0);
    }

    #[test]
    fn negative_demand_is_treated_as_zero() {
        let mut sim = TableCapacitySim::new(config(100.0, 1000.0, 0.5, 0)).unwrap();
        let result = sim.process(t0(), -5.0).unwrap();
        assert_eq!(result.consumed_capacity, 0.0);
        assert_eq!(result.burst_available, 100.0);
    }

    #[test]
    fn out_of_order_timestamps_are_processed() {
        // Undefined ordering is tolerated: the tick is served, nothing panics.
        let mut sim = TableCapacitySim::new(config(100.0, 1000.0, 0.5, 0)).unwrap();
        sim.process(minute(5), 10.0).unwrap();
        let result = sim.process(minute(1), 10.0).unwrap();
        assert_eq!(result.throttled, 0.0);
        assert_eq!(result.burst_available, 180.0);
    }
}
