//! Daily cost estimates from per-minute series.
//!
//! DynamoDB bills provisioned capacity per hour from a single sample of
//! the provisioned value taken during that hour. The estimate here is
//! conservative and bills each hour at its peak. Hours are UTC calendar
//! hours.

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Timelike, Utc};

use capsim_core::{CapsimError, CapsimResult, TimeSeriesSample};

/// `(year, month, day, hour)` of a UTC timestamp.
type HourKey = (i32, u32, u32, u32);

fn hour_key(timestamp: &DateTime<Utc>) -> HourKey {
    (
        timestamp.year(),
        timestamp.month(),
        timestamp.day(),
        timestamp.hour(),
    )
}

/// Peak value within each calendar hour, ordered by hour.
pub fn hourly_maxima(series: &[(DateTime<Utc>, f64)]) -> BTreeMap<HourKey, f64> {
    let mut maxima: BTreeMap<HourKey, f64> = BTreeMap::new();
    for (timestamp, value) in series {
        maxima
            .entry(hour_key(timestamp))
            .and_modify(|max| *max = max.max(*value))
            .or_insert(*value);
    }
    maxima
}

/// Scale the sum of per-hour bills to an average day.
fn daily_average(hourly_costs: impl ExactSizeIterator<Item = f64>) -> CapsimResult<f64> {
    let hours = hourly_costs.len();
    if hours == 0 {
        return Err(CapsimError::EmptySeries);
    }
    let total: f64 = hourly_costs.sum();
    Ok(total / hours as f64 * 24.0)
}

/// Average daily cost of a provisioned-capacity series.
///
/// `price_per_hour_per_unit` is the price of one capacity unit for one
/// hour. Partial-day inputs are normalized to 24 hours. An empty series
/// is an error.
pub fn estimate_daily_cost(
    provisioned: &[(DateTime<Utc>, f64)],
    price_per_hour_per_unit: f64,
) -> CapsimResult<f64> {
    let maxima = hourly_maxima(provisioned);
    daily_average(maxima.into_values().map(|max| max * price_per_hour_per_unit))
}

/// Average daily cost of serving the samples' consumption on demand.
///
/// On-demand tables never throttle for capacity, so only consumed units
/// are billed, at `price_per_unit` each.
pub fn on_demand_daily_cost(
    samples: &[TimeSeriesSample],
    price_per_unit: f64,
) -> CapsimResult<f64> {
    let mut per_hour: BTreeMap<HourKey, f64> = BTreeMap::new();
    for sample in samples {
        *per_hour.entry(hour_key(&sample.timestamp)).or_default() +=
            sample.consumed * price_per_unit;
    }
    daily_average(per_hour.into_values())
}

/// Average daily cost of provisioning exactly each minute's demand,
/// billed at the hourly peak. Useful as a baseline against simulated
/// configurations.
pub fn provisioned_daily_cost(
    samples: &[TimeSeriesSample],
    price_per_hour_per_unit: f64,
) -> CapsimResult<f64> {
    let series: Vec<_> = samples
        .iter()
        .map(|s| (s.timestamp, s.per_second_demand()))
        .collect();
    estimate_daily_cost(&series, price_per_hour_per_unit)
}
