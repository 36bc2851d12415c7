//! Command-line runner for the tessera factor engine.
//!
//! Assembles factor snapshots from a directory of stored panels and writes
//! them next to the panels.

use std::{path::PathBuf, process::ExitCode};

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use tessera::{
    panel::CsvSource,
    pipeline::{FactorPipeline, Frequency, PipelineConfig, PipelineError, default_dates, target_columns},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Cross-sectional equity factor engine", long_about = None)]
#[command(version)]
struct Cli {
    /// Log filter used when `RUST_LOG` is unset
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble and persist factor snapshots
    Run {
        /// Directory holding the panels, calendar and metadata
        #[arg(long)]
        data_dir: PathBuf,
        /// Update frequency; overrides the configuration file
        #[arg(long, value_enum)]
        freq: Option<FreqArg>,
        /// Anchor date (YYYY-MM-DD); may be repeated
        #[arg(long = "date")]
        dates: Vec<NaiveDate>,
        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List the columns a run writes
    Columns {
        /// Update frequency
        #[arg(long, value_enum, default_value = "monthly")]
        freq: FreqArg,
        /// Whether the anchor is a month-end trading day
        #[arg(long)]
        month_end: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum FreqArg {
    Monthly,
    Weekly,
}

impl From<FreqArg> for Frequency {
    fn from(arg: FreqArg) -> Self {
        match arg {
            FreqArg::Monthly => Self::Monthly,
            FreqArg::Weekly => Self::Weekly,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| cli.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Run { data_dir, freq, dates, config } => match run(data_dir, freq, dates, config) {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(e) => {
                tracing::error!(error = %e, "run aborted");
                eprintln!("Error: {e}");
                ExitCode::FAILURE
            }
        },
        Commands::Columns { freq, month_end } => {
            for column in target_columns(freq.into(), month_end) {
                println!("{column}");
            }
            ExitCode::SUCCESS
        }
    }
}

/// Run the batch, returning whether every date succeeded.
fn run(
    data_dir: PathBuf,
    freq: Option<FreqArg>,
    dates: Vec<NaiveDate>,
    config: Option<PathBuf>,
) -> Result<bool, PipelineError> {
    let mut config = match config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(freq) = freq {
        config = config.with_frequency(freq.into());
    }

    let source = CsvSource::new(data_dir, config.indicator_registry());
    let mut pipeline = FactorPipeline::new(source, config)?;

    let dates = if dates.is_empty() {
        let today = Local::now().date_naive();
        default_dates(pipeline.config().frequency, pipeline.calendar(), today)
    } else {
        dates
    };
    tracing::info!(dates = dates.len(), frequency = ?pipeline.config().frequency, "starting run");

    let report = pipeline.run_batch(&dates);

    println!(
        "written: {}, skipped: {}, failed: {}",
        report.written.len(),
        report.skipped.len(),
        report.failed.len()
    );
    for (date, error) in &report.failed {
        println!("  {date}: {error}");
    }
    Ok(report.is_success())
}
