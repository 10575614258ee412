use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use parking_collector::{BackfillReport, CollectorConfig, CollectorError, ParkingCollector};
use std::path::PathBuf;

/// First day with data in the Open Data Hub parking history the collector targets.
const DEFAULT_BACKFILL_START: (i32, u32, u32) = (2024, 12, 1);

#[derive(Debug, Parser)]
#[command(name = "parking-collector", version, about = "Collect Dolomites parking availability from the Open Data Hub")]
struct Cli {
    /// TOML config file; built-in defaults are used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CSV store path, overriding the config.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Poll live availability at the configured interval.
    Poll {
        /// Run a single cycle and exit.
        #[arg(long, conflicts_with = "cycles")]
        once: bool,

        /// Stop after this many cycles.
        #[arg(long)]
        cycles: Option<usize>,

        /// Seconds between cycles, overriding the config.
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Fetch historical data for days missing from the store.
    Backfill {
        /// First day (YYYY-MM-DD). Defaults to 2024-12-01.
        start: Option<NaiveDate>,
        /// Last day (YYYY-MM-DD), inclusive. Defaults to today (UTC).
        end: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        log::error!("parking-collector failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CollectorError> {
    let mut config = match &cli.config {
        Some(path) => CollectorConfig::from_toml_file(path)?,
        None => CollectorConfig::default(),
    };
    if let Some(store) = cli.store {
        config.store_path = store;
    }
    log::info!("Using store {}", config.store_path.display());

    match cli.command {
        Command::Poll {
            once,
            cycles,
            interval,
        } => {
            if let Some(secs) = interval {
                config.poll_interval_secs = secs;
            }
            let collector = ParkingCollector::new(config)?;
            poll(&collector, once, cycles).await
        }
        Command::Backfill { start, end } => {
            let (y, m, d) = DEFAULT_BACKFILL_START;
            let start = start
                .or_else(|| NaiveDate::from_ymd_opt(y, m, d))
                .unwrap_or_else(|| Utc::now().date_naive());
            let end = end.unwrap_or_else(|| Utc::now().date_naive());
            let collector = ParkingCollector::new(config)?;
            let report = collector.backfill(start, end).await?;
            print_backfill(&report);
            Ok(())
        }
    }
}

async fn poll(
    collector: &ParkingCollector,
    once: bool,
    cycles: Option<usize>,
) -> Result<(), CollectorError> {
    if once {
        let report = collector.poll_once().await?;
        println!(
            "{}: appended {} of {} records ({} skipped, {} excluded)",
            report.collected_at, report.appended, report.fetched, report.skipped, report.excluded
        );
        return Ok(());
    }

    let interval = collector.config().poll_interval();
    match cycles {
        Some(cycles) => {
            let summary = collector.poller().run_cycles(cycles, interval).await?;
            println!(
                "{} cycles: {} succeeded, {} failed, {} observations appended",
                summary.cycles,
                summary.succeeded(),
                summary.failed(),
                summary.appended
            );
            Ok(())
        }
        None => Err(collector.poll_forever().await),
    }
}

fn print_backfill(report: &BackfillReport) {
    println!(
        "Fetched {} days, skipped {} already covered, {} failed",
        report.dates_fetched.len(),
        report.dates_skipped.len(),
        report.dates_failed.len()
    );
    println!(
        "Merged {} observations ({} duplicates, {} records skipped)",
        report.observations_merged, report.duplicates_skipped, report.records_skipped
    );
    for run in report.failed_runs() {
        match &run.error {
            Some(error) => println!("  {} failed: {}", run.run, error),
            None => println!("  {} failed", run.run),
        }
    }
}
