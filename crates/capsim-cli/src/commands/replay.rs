use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use capsim_core::{Direction, TableMetricsRecord};
use capsim_engine::{TableCapacitySim, Trace, replay_with};

use super::{InputArgs, ScalingArgs, load_records};

#[derive(Debug, Serialize)]
struct ReplaySummary {
    direction: Direction,
    samples: usize,
    scaling_events: usize,
    peak_provisioned: f64,
    total_throttled: f64,
}

impl ReplaySummary {
    fn new(direction: Direction, trace: &Trace) -> Self {
        Self {
            direction,
            samples: trace.len(),
            scaling_events: trace.scaling_events(),
            peak_provisioned: trace.peak_provisioned().unwrap_or(0.0),
            total_throttled: trace.total_throttled(),
        }
    }
}

pub async fn replay(
    input: &InputArgs,
    scaling: &ScalingArgs,
    direction: Direction,
    initial_capacity: Option<f64>,
    format: &str,
) -> Result<()> {
    let config = scaling.load()?;
    let records = load_records(input, &config).await?;
    let trace = simulate(&records, direction, &config.scaling, initial_capacity)?;
    let summary = ReplaySummary::new(direction, &trace);

    info!(
        %direction,
        samples = summary.samples,
        scaling_events = summary.scaling_events,
        throttled = summary.total_throttled,
        "replay complete"
    );

    match format {
        "json" => {
            #[derive(Serialize)]
            struct Output<'a> {
                summary: &'a ReplaySummary,
                trace: &'a Trace,
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&Output {
                    summary: &summary,
                    trace: &trace,
                })?
            );
        }
        _ => {
            println!("timestamp,provisioned,consumed,throttled,burst_available");
            for point in &trace.points {
                println!(
                    "{},{},{},{},{}",
                    point.timestamp.to_rfc3339(),
                    point.provisioned,
                    point.consumed,
                    point.throttled,
                    point.burst_available
                );
            }
            println!();
            println!(
                "{} {}: {} samples, {} scaling events, peak {} units, {} throttled",
                summary.direction,
                if summary.total_throttled > 0.0 { "✗" } else { "✓" },
                summary.samples,
                summary.scaling_events,
                summary.peak_provisioned,
                summary.total_throttled
            );
        }
    }

    Ok(())
}

fn simulate(
    records: &[TableMetricsRecord],
    direction: Direction,
    scaling: &capsim_core::ScalingConfig,
    initial_capacity: Option<f64>,
) -> Result<Trace> {
    let samples: Vec<_> = records.iter().map(|r| r.sample(direction)).collect();
    let sim = match initial_capacity {
        Some(capacity) => TableCapacitySim::with_capacity(*scaling, capacity)?,
        None => TableCapacitySim::new(*scaling)?,
    };
    replay_with(sim, &samples).with_context(|| format!("{direction} replay failed"))
}
