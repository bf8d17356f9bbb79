use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use capsim_core::{
    BillingMode, CapsimConfig, Direction, StorageClass, TableMetricsRecord, TimeSeriesSample,
};
use capsim_cost::{estimate_daily_cost, on_demand_daily_cost, provisioned_daily_cost};
use capsim_engine::replay;
use capsim_ingest::{PriceLookup, PriceTable};

use super::{InputArgs, ScalingArgs, load_records};

/// Average daily cost of one direction under each billing strategy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostReport {
    pub direction: Direction,
    /// Provisioned capacity as the simulated auto-scaler sets it.
    pub simulated: f64,
    /// Provisioned capacity that tracks demand exactly.
    pub exact_fit: f64,
    pub on_demand: f64,
    /// Units the simulated configuration would have throttled.
    pub throttled: f64,
}

pub async fn cost(
    input: &InputArgs,
    scaling: &ScalingArgs,
    storage_class: StorageClass,
    format: &str,
) -> Result<()> {
    let config = scaling.load()?;
    let records = load_records(input, &config).await?;
    let region = input.region(&config);
    let prices = PriceTable::from_config(&config.pricing);

    let reports = [Direction::Read, Direction::Write]
        .into_iter()
        .map(|direction| {
            report(&records, direction, &config, &prices, &region, storage_class)
        })
        .collect::<Result<Vec<_>>>()?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&reports)?),
        _ => {
            println!("direction,simulated,exact_fit,on_demand,throttled");
            for r in &reports {
                println!(
                    "{},{:.4},{:.4},{:.4},{}",
                    r.direction, r.simulated, r.exact_fit, r.on_demand, r.throttled
                );
            }
        }
    }

    Ok(())
}

fn report(
    records: &[TableMetricsRecord],
    direction: Direction,
    config: &CapsimConfig,
    prices: &impl PriceLookup,
    region: &str,
    storage_class: StorageClass,
) -> Result<CostReport> {
    let price = |billing_mode| {
        prices
            .cost_per_unit(region, direction, billing_mode, storage_class)
            .with_context(|| format!("no {billing_mode} {direction} price configured"))
    };
    let provisioned_price = price(BillingMode::Provisioned)?;
    let on_demand_price = price(BillingMode::OnDemand)?;

    let samples: Vec<TimeSeriesSample> = records.iter().map(|r| r.sample(direction)).collect();
    let trace = replay(config.scaling, &samples)?;
    let throttled = trace.total_throttled();
    if throttled > 0.0 {
        warn!(%direction, throttled, "simulated configuration throttles");
    }

    let report = CostReport {
        direction,
        simulated: estimate_daily_cost(&trace.provisioned_series(), provisioned_price)?,
        exact_fit: provisioned_daily_cost(&samples, provisioned_price)?,
        on_demand: on_demand_daily_cost(&samples, on_demand_price)?,
        throttled,
    };
    info!(
        %direction,
        simulated = report.simulated,
        exact_fit = report.exact_fit,
        on_demand = report.on_demand,
        "daily cost estimated"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use capsim_core::ScalingConfig;
    use chrono::{TimeDelta, TimeZone, Utc};

    fn steady_day(per_second: f64) -> Vec<TableMetricsRecord> {
        let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
        (0..24 * 60)
            .map(|m| TableMetricsRecord {
                consumed_read: per_second * 60.0,
                consumed_write: per_second * 60.0,
                ..TableMetricsRecord::zeroed(start + TimeDelta::minutes(m))
            })
            .collect()
    }

    fn flat_prices() -> PriceTable {
        let mut prices = PriceTable::new(None);
        for direction in [Direction::Read, Direction::Write] {
            prices.insert(direction, BillingMode::Provisioned, StorageClass::Standard, 1.0);
            prices.insert(direction, BillingMode::OnDemand, StorageClass::Standard, 0.001);
        }
        prices
    }

    #[test]
    fn fixed_capacity_costs_capacity_times_hours() {
        let mut config = CapsimConfig::scaffold();
        config.scaling = ScalingConfig::new(50.0, 50.0, 0.5, 0);

        let report = report(
            &steady_day(20.0),
            Direction::Read,
            &config,
            &flat_prices(),
            "anywhere",
            StorageClass::Standard,
        )
        .unwrap();

        assert_eq!(report.simulated, 50.0 * 24.0);
        assert_eq!(report.exact_fit, 20.0 * 24.0);
        assert!((report.on_demand - 1200.0 * 0.001 * 60.0 * 24.0).abs() < 1e-6);
        assert_eq!(report.throttled, 0.0);
    }

    #[test]
    fn missing_price_is_an_error() {
        let config = CapsimConfig::scaffold();
        let err = report(
            &steady_day(1.0),
            Direction::Write,
            &config,
            &PriceTable::new(None),
            "us-east-1",
            StorageClass::Standard,
        )
        .unwrap_err();
        assert!(err.to_string().contains("no provisioned write price"));
    }
}
