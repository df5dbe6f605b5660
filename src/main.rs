//! CLI entry point for the taxi trip ingester.
//!
//! Resolves the run configuration from flags and the environment, downloads
//! the monthly TLC files for the window and writes the combined result.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use taxi_ingest::{
    FetchSettings, RangeFetcher, RunConfig,
    config::{END_DATE_VAR, START_DATE_VAR, VARS_VAR},
    fetch::trip_data_url,
    months::DateRange,
    output::{print_summary, write_parquet},
};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "taxi_ingest")]
#[command(about = "Download NYC TLC trip records for a date window", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch, filter and combine trip files for the configured window
    Run {
        /// First day to include (YYYY-MM-DD); overrides BRUIN_START_DATE
        #[arg(long)]
        start_date: Option<String>,

        /// Last day to include (YYYY-MM-DD); overrides BRUIN_END_DATE
        #[arg(long)]
        end_date: Option<String>,

        /// Comma-separated taxi types; overrides `taxi_types` in BRUIN_VARS
        #[arg(long, value_delimiter = ',')]
        taxi_types: Option<Vec<String>>,

        /// Base URL of the trip-data mirror; overrides TRIP_DATA_BASE_URL
        #[arg(long)]
        base_url: Option<String>,

        /// Parquet file to write the combined rows to
        #[arg(short, long, default_value = "trips.parquet")]
        output: String,
    },
    /// List the monthly files a window would fetch
    Months {
        /// First day of the window (YYYY-MM-DD)
        start: String,

        /// Last day of the window (YYYY-MM-DD)
        end: String,

        /// Taxi type used to build the addresses
        #[arg(short, long, default_value = "yellow")]
        taxi_type: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/taxi_ingest.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("taxi_ingest.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            start_date,
            end_date,
            taxi_types,
            base_url,
            output,
        } => {
            let start_date = start_date.or_else(|| std::env::var(START_DATE_VAR).ok());
            let end_date = end_date.or_else(|| std::env::var(END_DATE_VAR).ok());
            let vars = std::env::var(VARS_VAR).ok();

            let mut config =
                RunConfig::from_values(start_date.as_deref(), end_date.as_deref(), vars.as_deref())?;
            if let Some(taxi_types) = taxi_types {
                config.categories = taxi_types
                    .into_iter()
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
            }

            let mut settings = FetchSettings::from_env();
            if let Some(base_url) = base_url {
                settings.base_url = base_url;
            }

            let fetcher = RangeFetcher::http(&settings)?;
            let table = fetcher.run(&config).await?;

            print_summary(&table);
            write_parquet(&output, &table)?;
        }
        Commands::Months {
            start,
            end,
            taxi_type,
        } => {
            let range = DateRange::parse(&start, &end)?;
            let settings = FetchSettings::from_env();
            let months = range.months();

            for month in &months {
                let url = trip_data_url(&settings.base_url, &taxi_type, *month);
                info!(month = %month, url = %url, "Month");
            }

            info!(date_range = %range, count = months.len(), "Month list summary");
        }
    }

    Ok(())
}
