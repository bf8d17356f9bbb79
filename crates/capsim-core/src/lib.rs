pub mod config;
pub mod error;
pub mod types;

pub use config::{CapsimConfig, PricingConfig, RateEntry, ScalingConfig, SearchConfig};
pub use error::{CapsimError, CapsimResult};
pub use types::*;
