use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use river_db_scraper::config::{DEFAULT_BASE_URL, DEFAULT_CHARSET, DEFAULT_OBSERVATORY};
use river_db_scraper::writer::DEFAULT_HEADER_LINES;
use river_db_scraper::{
    parse_date, ClientConfig, DataKind, DateRange, HeaderPolicy, Orchestrator, RiverDbClient,
    ScrapeConfig,
};

/// Download hydrological records from the river.go.jp database, one month per request
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Observatory id as shown on the site
    #[arg(long, default_value = DEFAULT_OBSERVATORY)]
    observatory: String,

    /// First day of the period (YYYY-MM-DD or YYYYMMDD)
    #[arg(long, value_parser = parse_date, default_value = "2002-01-01")]
    start: NaiveDate,

    /// Last day of the period (YYYY-MM-DD or YYYYMMDD)
    #[arg(long, value_parser = parse_date, default_value = "2022-12-31")]
    end: NaiveDate,

    /// Which search to run
    #[arg(long, value_enum, default_value_t = DataKind::Dam)]
    kind: DataKind,

    /// Directory the output file is written to
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Number of header lines repeated in every response
    #[arg(long, default_value_t = DEFAULT_HEADER_LINES)]
    header_lines: usize,

    /// Append even when a response header differs from the file's
    #[arg(long)]
    no_header_check: bool,

    /// Extra attempts for a month whose submission failed
    #[arg(long, default_value_t = 0)]
    retries: u32,

    /// Seconds to wait before retrying a month
    #[arg(long, default_value_t = 5)]
    retry_delay_secs: u64,

    /// Times a page is requested before giving up on it
    #[arg(long, default_value_t = 10)]
    ready_attempts: u32,

    /// Milliseconds between page requests while waiting
    #[arg(long, default_value_t = 1000)]
    ready_interval_ms: u64,

    /// HTTP timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Charset assumed when the site does not declare one
    #[arg(long, default_value = DEFAULT_CHARSET)]
    charset: String,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    /// Continue an interrupted run from its checkpoint
    #[arg(long)]
    resume: bool,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Validate the period before touching the network
    let range = DateRange::new(cli.start, cli.end).context("Invalid period")?;

    let client_config = ClientConfig {
        base_url: cli.base_url,
        observatory_id: cli.observatory.clone(),
        kind: cli.kind,
        timeout: Duration::from_secs(cli.timeout_secs),
        ready_attempts: cli.ready_attempts,
        ready_interval: Duration::from_millis(cli.ready_interval_ms),
        default_charset: cli.charset,
    };

    let config = ScrapeConfig {
        output_dir: cli.output_dir,
        header: HeaderPolicy {
            lines: cli.header_lines,
            validate: !cli.no_header_check,
        },
        chunk_retries: cli.retries,
        retry_delay: Duration::from_secs(cli.retry_delay_secs),
        resume: cli.resume,
        ..ScrapeConfig::new(cli.observatory, range)
    };

    let client = RiverDbClient::open(client_config).context("Failed to open the search page")?;
    let mut orchestrator = Orchestrator::new(config, client);
    let summary = orchestrator.run().context("Scraping stopped")?;

    println!(
        "Fetched {} of {} month(s) ({} skipped)",
        summary.chunks_written, summary.chunks_total, summary.chunks_skipped
    );
    for output in &summary.outputs {
        println!("Records saved to {}", output.display());
    }

    Ok(())
}
