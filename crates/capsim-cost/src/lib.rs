//! capsim-cost — pricing replayed capacity and searching for cheaper
//! scaling configurations.
//!
//! # Billing model
//!
//! ```text
//! provisioned:  per hour, bill max(provisioned in hour) * price/unit-hour
//! on-demand:    per hour, bill sum(consumed in hour) * price/unit
//! daily cost:   sum(hourly bills) / hours covered * 24
//! ```
//!
//! # Search
//!
//! The objective replays a sample series under a candidate
//! `(min, max, target%)` and returns its daily cost, or
//! [`THROTTLE_PENALTY`] if the candidate throttles after warm-up. Any
//! [`Minimizer`] can drive it; [`GridSearch`] is provided.

pub mod estimator;
pub mod objective;
pub mod search;

pub use estimator::{
    estimate_daily_cost, hourly_maxima, on_demand_daily_cost, provisioned_daily_cost,
};
pub use objective::{Candidate, Objective, THROTTLE_PENALTY};
pub use search::{Dimension, GridSearch, Minimizer, Optimized, SearchOutcome, optimize, search_space};
