//! capsim.toml configuration parser.

use std::path::Path;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{CapsimError, CapsimResult};
use crate::types::{BillingMode, Direction, StorageClass};

/// Auto-scaling parameters for one simulated table direction.
///
/// Immutable for the duration of a run; each simulator holds its own copy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingConfig {
    /// Lower bound on provisioned capacity (inclusive).
    pub min: f64,
    /// Upper bound on provisioned capacity (inclusive).
    pub max: f64,
    /// Target utilization as a fraction, strictly between 0 and 1.
    pub target: f64,
    /// Seconds between a scaling decision and the capacity change.
    #[serde(default)]
    pub scaling_delay_seconds: u32,
}

impl ScalingConfig {
    pub fn new(min: f64, max: f64, target: f64, scaling_delay_seconds: u32) -> Self {
        Self {
            min,
            max,
            target,
            scaling_delay_seconds,
        }
    }

    /// Reject configs that would divide by zero or produce an empty range.
    pub fn validate(&self) -> CapsimResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || !self.target.is_finite() {
            return Err(CapsimError::InvalidConfig(
                "min, max, and target must be finite".to_string(),
            ));
        }
        if self.min <= 0.0 {
            return Err(CapsimError::InvalidConfig(format!(
                "min must be greater than 0, got {}",
                self.min
            )));
        }
        if self.min > self.max {
            return Err(CapsimError::InvalidConfig(format!(
                "min ({}) must not exceed max ({})",
                self.min, self.max
            )));
        }
        if self.target <= 0.0 || self.target >= 1.0 {
            return Err(CapsimError::InvalidConfig(format!(
                "target must be between 0 and 1 exclusive, got {}",
                self.target
            )));
        }
        Ok(())
    }

    pub fn scaling_delay(&self) -> TimeDelta {
        TimeDelta::seconds(i64::from(self.scaling_delay_seconds))
    }
}

/// Parameters for the configuration search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Objective evaluations the minimizer may spend.
    #[serde(default = "default_steps")]
    pub steps: usize,
    /// Leading samples whose throttling is ignored by the objective.
    #[serde(default = "default_warmup")]
    pub warmup_samples: usize,
}

fn default_steps() -> usize {
    512
}

fn default_warmup() -> usize {
    5
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            steps: default_steps(),
            warmup_samples: default_warmup(),
        }
    }
}

/// Unit prices used by the cost commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub region: Option<String>,
    #[serde(default)]
    pub rates: Vec<RateEntry>,
}

/// A single unit price.
///
/// Provisioned rates are per unit-hour; on-demand rates are per request unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateEntry {
    pub direction: Direction,
    pub billing_mode: BillingMode,
    #[serde(default)]
    pub storage_class: StorageClass,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapsimConfig {
    pub scaling: ScalingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub pricing: PricingConfig,
}

impl CapsimConfig {
    pub fn from_file(path: &Path) -> CapsimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> CapsimResult<Self> {
        let config: CapsimConfig =
            toml::from_str(content).map_err(|e| CapsimError::ConfigFile(e.to_string()))?;
        config.scaling.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> CapsimResult<String> {
        toml::to_string_pretty(self).map_err(|e| CapsimError::ConfigFile(e.to_string()))
    }

    /// Scaffold a capsim.toml with conservative defaults and placeholder
    /// us-east-1 standard-class prices.
    pub fn scaffold() -> Self {
        let rate = |direction, billing_mode, price| RateEntry {
            direction,
            billing_mode,
            storage_class: StorageClass::Standard,
            price,
        };
        CapsimConfig {
            scaling: ScalingConfig::new(5.0, 400.0, 0.7, 120),
            search: SearchConfig::default(),
            pricing: PricingConfig {
                region: Some("us-east-1".to_string()),
                rates: vec![
                    rate(Direction::Read, BillingMode::Provisioned, 0.00013),
                    rate(Direction::Write, BillingMode::Provisioned, 0.00065),
                    rate(Direction::Read, BillingMode::OnDemand, 0.000_000_25),
                    rate(Direction::Write, BillingMode::OnDemand, 0.000_001_25),
                ],
            },
        }
    }
}
