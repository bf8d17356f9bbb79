//! Daily scale-down rate limiting.
//!
//! A table may scale down up to [`FIRST_BATCH_SCALEDOWNS`] times within the
//! hour that follows its first scale-down of the (UTC) day, and once per
//! hour after that. The owner resets the limiter at each day rollover.
//!
//! ```text
//!   no scale-down today                         → allowed
//!   t < first_batch_ends_at, batch budget left  → allowed
//!   t >= most_recent + 60min                    → allowed
//!   otherwise                                   → denied
//! ```

use chrono::{DateTime, TimeDelta, Utc};

/// Scale-downs allowed in the opening window of a day.
pub const FIRST_BATCH_SCALEDOWNS: u32 = 4;

/// Length of the opening window and of the cooldown after it.
pub const SCALEDOWN_WINDOW_MINUTES: i64 = 60;

fn window() -> TimeDelta {
    TimeDelta::minutes(SCALEDOWN_WINDOW_MINUTES)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScaledownLimiter {
    first_scaledown_at: Option<DateTime<Utc>>,
    first_batch_ends_at: Option<DateTime<Utc>>,
    remaining_in_first_batch: u32,
    most_recent_scaledown_at: Option<DateTime<Utc>>,
    /// Scale-downs recorded since the last reset.
    scaledowns: u32,
}

impl ScaledownLimiter {
    pub fn new() -> Self {
        Self {
            first_scaledown_at: None,
            first_batch_ends_at: None,
            remaining_in_first_batch: FIRST_BATCH_SCALEDOWNS,
            most_recent_scaledown_at: None,
            scaledowns: 0,
        }
    }

    /// Forget everything; called when the simulated day changes.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Whether a scale-down at `t` fits within today's budget.
    pub fn can_scale_down(&self, t: DateTime<Utc>) -> bool {
        let Some(first_batch_ends_at) = self.first_batch_ends_at else {
            return true;
        };
        if t < first_batch_ends_at && self.remaining_in_first_batch > 0 {
            return true;
        }
        match self.most_recent_scaledown_at {
            Some(most_recent) => t >= most_recent + window(),
            None => true,
        }
    }

    /// Account for a scale-down that took effect at `t`.
    pub fn record(&mut self, t: DateTime<Utc>) {
        let first_batch_ends_at = *self.first_batch_ends_at.get_or_insert(t + window());
        self.first_scaledown_at.get_or_insert(t);
        if t < first_batch_ends_at && self.remaining_in_first_batch > 0 {
            self.remaining_in_first_batch -= 1;
        }
        self.most_recent_scaledown_at = Some(t);
        self.scaledowns += 1;
    }

    pub fn first_scaledown_at(&self) -> Option<DateTime<Utc>> {
        self.first_scaledown_at
    }

    pub fn remaining_in_first_batch(&self) -> u32 {
        self.remaining_in_first_batch
    }

    pub fn scaledowns(&self) -> u32 {
        self.scaledowns
    }
}

impl Default for ScaledownLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 1, 2, hour, minute, 0).unwrap()
    }

    #[test]
    fn first_scaledown_always_allowed() {
        let limiter = ScaledownLimiter::new();
        assert!(limiter.can_scale_down(at(4, 17)));
    }

    #[test]
    fn four_in_first_hour_then_denied() {
        let mut limiter = ScaledownLimiter::new();
        for minute in 0..4 {
            assert!(limiter.can_scale_down(at(4, minute)));
            limiter.record(at(4, minute));
        }
        assert_eq!(limiter.first_scaledown_at(), Some(at(4, 0)));
        assert_eq!(limiter.remaining_in_first_batch(), 0);
        assert!(!limiter.can_scale_down(at(4, 4)));
        assert!(!limiter.can_scale_down(at(5, 2)));
        // An hour after the most recent one.
        assert!(limiter.can_scale_down(at(5, 3)));
    }

    #[test]
    fn hourly_after_first_batch_window() {
        let mut limiter = ScaledownLimiter::new();
        limiter.record(at(1, 0));
        assert!(limiter.can_scale_down(at(1, 59)));
        assert!(limiter.can_scale_down(at(2, 0)));
        // Outside the opening window, so the batch budget is untouched.
        limiter.record(at(2, 0));
        assert_eq!(limiter.remaining_in_first_batch(), 3);
        assert!(!limiter.can_scale_down(at(2, 30)));
        assert!(limiter.can_scale_down(at(3, 0)));
    }

    #[test]
    fn reset_restores_budget() {
        let mut limiter = ScaledownLimiter::new();
        for minute in 0..4 {
            limiter.record(at(23, minute));
        }
        assert!(!limiter.can_scale_down(at(23, 10)));
        limiter.reset();
        assert_eq!(limiter.scaledowns(), 0);
        assert!(limiter.can_scale_down(at(23, 10)));
    }
}
