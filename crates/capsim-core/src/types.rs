//! Domain types for capacity replay.
//!
//! These types describe the per-minute consumption records a table
//! produces, the billing dimensions used to price them, and the
//! single-direction samples the simulator consumes.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Billing dimensions ─────────────────────────────────────────────

/// Which capacity a series describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Read,
    Write,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Read => write!(f, "read"),
            Direction::Write => write!(f, "write"),
        }
    }
}

impl FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "read" | "reads" => Ok(Direction::Read),
            "write" | "writes" => Ok(Direction::Write),
            other => Err(format!("unknown direction: {other}")),
        }
    }
}

/// How a table is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingMode {
    /// Pay per request unit consumed.
    OnDemand,
    /// Pay per provisioned unit per hour.
    Provisioned,
}

impl fmt::Display for BillingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillingMode::OnDemand => write!(f, "on_demand"),
            BillingMode::Provisioned => write!(f, "provisioned"),
        }
    }
}

impl FromStr for BillingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "on_demand" | "ondemand" | "pay_per_request" => Ok(BillingMode::OnDemand),
            "provisioned" => Ok(BillingMode::Provisioned),
            other => Err(format!("unknown billing mode: {other}")),
        }
    }
}

/// Table storage class; affects unit prices only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageClass {
    #[default]
    Standard,
    StandardInfrequentAccess,
}

impl fmt::Display for StorageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageClass::Standard => write!(f, "standard"),
            StorageClass::StandardInfrequentAccess => write!(f, "standard_infrequent_access"),
        }
    }
}

impl FromStr for StorageClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "standard" => Ok(StorageClass::Standard),
            "standard_infrequent_access" | "standard_ia" | "ia" => {
                Ok(StorageClass::StandardInfrequentAccess)
            }
            other => Err(format!("unknown storage class: {other}")),
        }
    }
}

// ── Samples ────────────────────────────────────────────────────────

/// One minute of consumption for a single direction.
///
/// `consumed` and `throttled` are per-minute sums as reported by the
/// metrics source; their total is what the table was asked to serve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesSample {
    pub timestamp: DateTime<Utc>,
    pub consumed: f64,
    pub throttled: f64,
}

impl TimeSeriesSample {
    pub fn new(timestamp: DateTime<Utc>, consumed: f64, throttled: f64) -> Self {
        Self {
            timestamp,
            consumed,
            throttled,
        }
    }

    /// Total units requested during the minute.
    pub fn requested(&self) -> f64 {
        self.consumed + self.throttled
    }

    /// Requested units converted from a per-minute sum to a per-second
    /// rate, rounded to whole units. This is the demand fed to the
    /// simulator for the tick.
    pub fn per_second_demand(&self) -> f64 {
        (self.requested() / 60.0).round()
    }
}

/// One minute of table-level metrics covering both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetricsRecord {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub provisioned_read: f64,
    pub consumed_read: f64,
    #[serde(default)]
    pub provisioned_write: f64,
    pub consumed_write: f64,
    pub throttled_reads: f64,
    pub throttled_writes: f64,
}

impl TableMetricsRecord {
    /// An all-zero record, used to fill minutes the source had no data for.
    pub fn zeroed(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            provisioned_read: 0.0,
            consumed_read: 0.0,
            provisioned_write: 0.0,
            consumed_write: 0.0,
            throttled_reads: 0.0,
            throttled_writes: 0.0,
        }
    }

    /// Project this record onto a single direction.
    pub fn sample(&self, direction: Direction) -> TimeSeriesSample {
        match direction {
            Direction::Read => {
                TimeSeriesSample::new(self.timestamp, self.consumed_read, self.throttled_reads)
            }
            Direction::Write => {
                TimeSeriesSample::new(self.timestamp, self.consumed_write, self.throttled_writes)
            }
        }
    }
}

/// Split table records into `(reads, writes)` sample series.
pub fn split_by_direction(
    records: &[TableMetricsRecord],
) -> (Vec<TimeSeriesSample>, Vec<TimeSeriesSample>) {
    let reads = records.iter().map(|r| r.sample(Direction::Read)).collect();
    let writes = records.iter().map(|r| r.sample(Direction::Write)).collect();
    (reads, writes)
}
