//! Subcommand implementations and the arguments they share.

pub mod convert;
pub mod cost;
pub mod init;
pub mod optimize;
pub mod replay;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::Args;
use tracing::{debug, info};

use capsim_core::{CapsimConfig, ScalingConfig, TableMetricsRecord};
use capsim_ingest::csv::read_csv;
use capsim_ingest::{JsonDumpSource, MetricsRequest, MetricsSource, fill_minute_gaps};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "capsim.toml";

const DEFAULT_REGION: &str = "us-east-1";

/// Where metrics come from.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// CloudWatch CSV export.
    #[arg(long, conflicts_with = "dump_dir")]
    pub csv: Option<PathBuf>,

    /// Directory of `<region>_<label>_<table>.json` metric dumps.
    #[arg(long, requires_all = ["table", "start", "end"])]
    pub dump_dir: Option<PathBuf>,

    /// Dump label, usually the account profile the metrics came from.
    #[arg(long, default_value = "default")]
    pub label: String,

    #[arg(long)]
    pub table: Option<String>,

    /// Region for dump lookup and pricing; defaults to `[pricing].region`.
    #[arg(long)]
    pub region: Option<String>,

    /// Range start (RFC 3339). With --end, minutes without data are zero-filled.
    #[arg(long)]
    pub start: Option<DateTime<Utc>>,

    /// Range end, exclusive (RFC 3339).
    #[arg(long)]
    pub end: Option<DateTime<Utc>>,
}

impl InputArgs {
    pub fn region(&self, config: &CapsimConfig) -> String {
        self.region
            .clone()
            .or_else(|| config.pricing.region.clone())
            .unwrap_or_else(|| DEFAULT_REGION.to_string())
    }
}

/// Config file selection and scaling overrides.
#[derive(Args, Debug, Clone, Default)]
pub struct ScalingArgs {
    /// Path to capsim.toml.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Minimum provisioned capacity.
    #[arg(long)]
    pub min: Option<f64>,

    /// Maximum provisioned capacity.
    #[arg(long)]
    pub max: Option<f64>,

    /// Target utilization as a fraction, e.g. 0.7.
    #[arg(long)]
    pub target: Option<f64>,

    /// Seconds between a scaling decision and its effect.
    #[arg(long)]
    pub delay: Option<u32>,
}

impl ScalingArgs {
    /// Load the config and apply command line overrides on top.
    pub fn load(&self) -> Result<CapsimConfig> {
        let mut config = load_config(self.config.as_deref())?;
        self.apply(&mut config.scaling)?;
        Ok(config)
    }

    pub fn apply(&self, scaling: &mut ScalingConfig) -> Result<()> {
        if let Some(min) = self.min {
            scaling.min = min;
        }
        if let Some(max) = self.max {
            scaling.max = max;
        }
        if let Some(target) = self.target {
            scaling.target = target;
        }
        if let Some(delay) = self.delay {
            scaling.scaling_delay_seconds = delay;
        }
        scaling.validate().context("invalid scaling overrides")?;
        Ok(())
    }
}

/// Explicit path, else `./capsim.toml` if present, else the scaffold.
pub fn load_config(path: Option<&Path>) -> Result<CapsimConfig> {
    if let Some(path) = path {
        return CapsimConfig::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()));
    }

    let local = Path::new(DEFAULT_CONFIG_FILE);
    if local.is_file() {
        debug!(path = %local.display(), "using local config");
        return CapsimConfig::from_file(local)
            .with_context(|| format!("failed to load {}", local.display()));
    }

    info!("no {DEFAULT_CONFIG_FILE} found, using scaffold defaults");
    Ok(CapsimConfig::scaffold())
}

/// Load per-minute table records from whichever input was given.
pub async fn load_records(input: &InputArgs, config: &CapsimConfig) -> Result<Vec<TableMetricsRecord>> {
    let mut records = if let Some(path) = &input.csv {
        read_csv(path).with_context(|| format!("failed to read {}", path.display()))?
    } else if let Some(dir) = &input.dump_dir {
        let (Some(table_name), Some(start), Some(end)) = (&input.table, input.start, input.end)
        else {
            bail!("--dump-dir needs --table, --start and --end");
        };
        let request = MetricsRequest {
            region: input.region(config),
            table_name: table_name.clone(),
            start,
            end,
        };
        fetch(&JsonDumpSource::new(dir, &input.label), &request).await?
    } else {
        bail!("no input given; pass --csv or --dump-dir");
    };

    records.sort_by_key(|r| r.timestamp);
    if let (Some(start), Some(end)) = (input.start, input.end) {
        records = fill_minute_gaps(&records, start, end);
    }
    if records.is_empty() {
        bail!("input contains no metrics");
    }
    Ok(records)
}

async fn fetch<S: MetricsSource>(
    source: &S,
    request: &MetricsRequest,
) -> Result<Vec<TableMetricsRecord>> {
    source.fetch_metrics(request).await.with_context(|| {
        format!(
            "failed to fetch metrics for {} in {}",
            request.table_name, request.region
        )
    })
}
