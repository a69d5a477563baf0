#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line entry point for the BESS fire incident dashboard.
//!
//! Serves the dashboard API, prints summaries and chart counts for quick
//! inspection, and prefetches source link previews into the cache file the
//! server reads.
//!
//! Uses `indicatif-log-bridge` (via [`bess_map_cli_utils::init_logger`])
//! so that log lines and the prefetch progress bar share the terminal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bess_map_cli_utils::IndicatifProgress;
use bess_map_dashboard::{DashboardConfig, Session};
use bess_map_incident::Dataset;
use bess_map_incident_models::FilterSpec;
use bess_map_preview::cache::PreviewCache;
use bess_map_preview::http::HttpPreviewService;
use bess_map_preview::prefetch::prefetch_all;
use bess_map_server::{ServerOptions, run_server};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bess_map", about = "BESS fire incident dashboard")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct InputArgs {
    /// Incident table (CSV, TSV, or JSON records). Defaults to
    /// `BESS_MAP_DATA`, then `data/incidents.csv`
    #[arg(long)]
    data: Option<PathBuf>,
    /// Dashboard configuration TOML. Defaults to `BESS_MAP_CONFIG`, then the
    /// built-in configuration
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Clone)]
struct FilterArgs {
    /// Column to filter on
    #[arg(long, requires = "filter_value")]
    filter_column: Option<String>,
    /// Value to match (numeric columns: exact, text columns: substring)
    #[arg(long, requires = "filter_column")]
    filter_value: Option<String>,
}

impl FilterArgs {
    fn spec(&self) -> Option<FilterSpec> {
        match (&self.filter_column, &self.filter_value) {
            (Some(column), Some(value)) => Some(FilterSpec::new(column, value)),
            _ => None,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Start the dashboard API server
    Serve {
        #[command(flatten)]
        input: InputArgs,
        /// Preview cache file (defaults to the configured cache path)
        #[arg(long)]
        previews: Option<PathBuf>,
    },
    /// Print one line per location
    Summary {
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print incident counts grouped by a column
    Chart {
        /// Column to group by (e.g. "Country" or "Year of Incident")
        #[arg(long)]
        column: String,
        #[command(flatten)]
        input: InputArgs,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Fetch previews for every source link and write the cache file
    FetchPreviews {
        #[command(flatten)]
        input: InputArgs,
        /// Cache file to update (defaults to the configured cache path)
        #[arg(long)]
        out: Option<PathBuf>,
        /// Fetch URLs again even if they are already cached
        #[arg(long)]
        refresh: bool,
    },
}

fn load(input: &InputArgs) -> Result<(DashboardConfig, Dataset), Box<dyn std::error::Error>> {
    let config = DashboardConfig::load(input.config.as_deref())?;
    let options = ServerOptions {
        data: input.data.clone(),
        ..ServerOptions::default()
    };
    let source = bess_map_source::for_path(&options.data_path());
    log::info!("Loading incidents from {}", source.describe());
    let dataset = Dataset::ingest(config.schema.clone(), source.load()?)?;
    Ok((config, dataset))
}

fn filtered_session(
    dataset: Dataset,
    filter: &FilterArgs,
) -> Result<Session, Box<dyn std::error::Error>> {
    let mut session = Session::new(Arc::new(dataset));
    if let Some(spec) = filter.spec() {
        session.apply_filter(spec)?;
    }
    Ok(session)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = bess_map_cli_utils::init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { input, previews } => {
            let options = ServerOptions {
                data: input.data,
                config: input.config,
                previews,
                ..ServerOptions::default()
            };
            // The server uses actix-web's runtime, so run it in a blocking
            // task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(move || {
                actix_web::rt::System::new().block_on(run_server(options))
            })
            .await??;
        }
        Commands::Summary { input, filter } => {
            let (_, dataset) = load(&input)?;
            let session = filtered_session(dataset, &filter)?;
            println!("{:<40} {:>9} {:<24} COUNTRY", "LOCATION", "INCIDENTS", "LAT, LON");
            println!("{}", "-".repeat(90));
            for summary in session.summaries() {
                let coordinates = summary.coordinates.map_or_else(
                    || "-".to_string(),
                    |c| format!("{:.4}, {:.4}", c.latitude, c.longitude),
                );
                println!(
                    "{:<40} {:>9} {:<24} {}",
                    summary.location_key.as_str(),
                    summary.incident_count,
                    coordinates,
                    summary.country
                );
            }
            println!();
            println!(
                "{} locations, {} incidents",
                session.summaries().len(),
                session.rows().count()
            );
        }
        Commands::Chart {
            column,
            input,
            filter,
        } => {
            let (_, dataset) = load(&input)?;
            let session = filtered_session(dataset, &filter)?;
            let chart = session.chart(&column)?;
            println!("{}", chart.title);
            for bar in &chart.bars {
                println!("{:<30} {:>6}", bar.label, bar.count);
            }
        }
        Commands::FetchPreviews {
            input,
            out,
            refresh,
        } => {
            let (config, dataset) = load(&input)?;
            let out = out.unwrap_or_else(|| PathBuf::from(&config.preview.cache_path));
            let mut cache = PreviewCache::load(Path::new(&out))?;
            let service = HttpPreviewService::new(config.preview.clone())?;
            let progress = IndicatifProgress::fetch_bar(&multi, "Fetching previews");

            let stats = prefetch_all(
                &service,
                &mut cache,
                dataset.source_urls(),
                config.preview.concurrency,
                refresh,
                Some(&progress),
            )
            .await;
            cache.save(&out)?;

            log::info!(
                "Fetched {} previews ({} placeholders, {} already cached)",
                stats.fetched,
                stats.placeholders,
                stats.cached
            );
        }
    }

    Ok(())
}
