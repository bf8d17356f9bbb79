//! capsim-engine — replay of provisioned-capacity auto-scaling.
//!
//! Models a single table direction minute by minute: unused capacity is
//! banked as burst credit, demand above capacity draws on that credit and
//! is throttled once it runs out, and utilization history drives delayed
//! scale-up and rate-limited scale-down decisions.
//!
//! # Per-tick algorithm
//!
//! ```text
//! if date(t) != date(last_t):  reset scale-down tracking
//!
//! remaining = capacity - requested
//! if remaining >= 0:  burst.add(remaining)
//! else:               draw min(-remaining, burst.sum()) from burst,
//!                     throttle the rest
//!
//! history.push(requested / capacity)
//!
//! if nothing pending:
//!     last 2 utilizations > target            → pending = requested / target (≤ max)
//!     all 15 utilizations < target - 0.20
//!       and scale-down limiter allows         → pending = requested / target (≥ min)
//!
//! if pending and t >= pending.effective_at:  capacity = round(pending.target)
//! ```

pub mod burst;
pub mod history;
pub mod limiter;
pub mod replay;
pub mod simulator;

pub use burst::BurstPool;
pub use history::UtilizationHistory;
pub use limiter::ScaledownLimiter;
pub use replay::{Trace, TracePoint, replay, replay_with};
pub use simulator::{PendingChange, TableCapacitySim, TickResult};
