use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use capsim_core::{
    BillingMode, Direction, ScalingConfig, StorageClass, TimeSeriesSample, split_by_direction,
};
use capsim_cost::{GridSearch, Optimized, optimize as search};
use capsim_ingest::{PriceLookup, PriceTable};

use super::{InputArgs, ScalingArgs, load_records};

#[derive(Debug, Serialize)]
struct DirectionResult {
    direction: Direction,
    #[serde(flatten)]
    optimized: Optimized,
}

/// Search both directions concurrently; each search is CPU bound and runs
/// on the blocking pool.
pub async fn optimize(
    input: &InputArgs,
    scaling: &ScalingArgs,
    steps: Option<usize>,
    warmup: Option<usize>,
    storage_class: StorageClass,
    format: &str,
) -> Result<()> {
    let config = scaling.load()?;
    let records = load_records(input, &config).await?;
    let region = input.region(&config);
    let prices = PriceTable::from_config(&config.pricing);
    let steps = steps.unwrap_or(config.search.steps);
    let warmup = warmup.unwrap_or(config.search.warmup_samples);

    let price = |direction| {
        prices
            .cost_per_unit(&region, direction, BillingMode::Provisioned, storage_class)
            .with_context(|| format!("no provisioned {direction} price for {region}"))
    };
    let read_price = price(Direction::Read)?;
    let write_price = price(Direction::Write)?;

    let (reads, writes) = split_by_direction(&records);
    info!(samples = records.len(), steps, warmup, "searching read and write configurations");

    let base = config.scaling;
    let (read, write) = tokio::try_join!(
        tokio::task::spawn_blocking(move || run(base, reads, read_price, steps, warmup)),
        tokio::task::spawn_blocking(move || run(base, writes, write_price, steps, warmup)),
    )
    .context("configuration search panicked")?;

    let results = [
        DirectionResult {
            direction: Direction::Read,
            optimized: read,
        },
        DirectionResult {
            direction: Direction::Write,
            optimized: write,
        },
    ];
    for r in results.iter().filter(|r| !r.optimized.throttle_free) {
        warn!(direction = %r.direction, "no throttle-free configuration found");
    }

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&results)?),
        _ => {
            println!("direction,min,max,target_percent,daily_cost,evaluations");
            for r in &results {
                let o = &r.optimized;
                println!(
                    "{},{},{},{},{:.4},{}",
                    r.direction, o.min, o.max, o.target_percent, o.daily_cost, o.evaluations
                );
            }
        }
    }

    Ok(())
}

fn run(
    base: ScalingConfig,
    samples: Vec<TimeSeriesSample>,
    price_per_hour: f64,
    steps: usize,
    warmup: usize,
) -> Optimized {
    search(&base, &samples, price_per_hour, &GridSearch::default(), steps, warmup)
}
