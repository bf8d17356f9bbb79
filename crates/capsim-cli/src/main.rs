//! capsim — replay DynamoDB-style auto-scaling over historical metrics.
//!
//! # Usage
//!
//! ```text
//! capsim init
//! capsim replay --csv export.csv --direction read --target 0.7
//! capsim cost --csv export.csv
//! capsim optimize --dump-dir stats/ --table orders --region eu-central-1 \
//!     --start 2023-01-02T00:00:00Z --end 2023-01-03T00:00:00Z
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{InputArgs, ScalingArgs};

#[derive(Parser)]
#[command(
    name = "capsim",
    about = "capsim — what-if replay of provisioned capacity auto-scaling",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Emit logs as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a capsim.toml scaffold.
    Init {
        #[arg(short, long, default_value = "capsim.toml")]
        path: PathBuf,
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Replay metrics through the simulator.
    Replay {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        scaling: ScalingArgs,
        /// Direction to simulate (read or write).
        #[arg(short, long, default_value = "read")]
        direction: capsim_core::Direction,
        /// Start from this provisioned capacity instead of min.
        #[arg(long)]
        initial_capacity: Option<f64>,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Estimate average daily cost under simulated, exact-fit, and
    /// on-demand billing.
    Cost {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        scaling: ScalingArgs,
        /// Storage class used for price lookup.
        #[arg(long, default_value = "standard")]
        storage_class: capsim_core::StorageClass,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Search for the cheapest non-throttling min/max/target.
    Optimize {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        scaling: ScalingArgs,
        /// Objective evaluations per direction.
        #[arg(long)]
        steps: Option<usize>,
        /// Leading minutes whose throttling is ignored.
        #[arg(long)]
        warmup: Option<usize>,
        #[arg(long, default_value = "standard")]
        storage_class: capsim_core::StorageClass,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
    /// Convert input metrics to a JSON dump.
    Convert {
        #[command(flatten)]
        input: InputArgs,
        /// Destination file.
        #[arg(short, long)]
        out: PathBuf,
    },
}

fn init_tracing(json: bool) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("warn,capsim=info"))?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json)?;

    match cli.command {
        Commands::Init { path, force } => commands::init::init(&path, force),
        Commands::Replay {
            input,
            scaling,
            direction,
            initial_capacity,
            format,
        } => {
            commands::replay::replay(&input, &scaling, direction, initial_capacity, &format).await
        }
        Commands::Cost {
            input,
            scaling,
            storage_class,
            format,
        } => commands::cost::cost(&input, &scaling, storage_class, &format).await,
        Commands::Optimize {
            input,
            scaling,
            steps,
            warmup,
            storage_class,
            format,
        } => {
            commands::optimize::optimize(&input, &scaling, steps, warmup, storage_class, &format)
                .await
        }
        Commands::Convert { input, out } => commands::convert::convert(&input, &out).await,
    }
}
