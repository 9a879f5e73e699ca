use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use river_db_scraper::writer::DEFAULT_HEADER_LINES;
use river_db_scraper::{
    extract_observatory_name, parse_date, ClientConfig, DataKind, DateRange, FormSubmitter,
    RiverDbClient,
};
use std::fs;
use std::path::Path;

/// Fetch one period and keep the raw response as a regression fixture
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    observatory: String,

    #[arg(value_parser = parse_date)]
    start: NaiveDate,

    #[arg(value_parser = parse_date)]
    end: NaiveDate,

    /// Fixture name, saved as src/tests/fixtures/failures/<NAME>.txt
    name: String,

    #[arg(long, value_enum, default_value_t = DataKind::Dam)]
    kind: DataKind,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let range = DateRange::new(cli.start, cli.end).context("Invalid period")?;

    let config = ClientConfig {
        observatory_id: cli.observatory,
        kind: cli.kind,
        ..ClientConfig::default()
    };

    println!("Fetching {} from {}...", range, config.search_url());

    let mut client = RiverDbClient::open(config).context("Failed to open the search page")?;
    let block = client
        .submit(range.start(), range.end())
        .context("Failed to submit the search form")?;
    client.reset()?;

    let failures_dir = Path::new("src/tests/fixtures/failures");
    fs::create_dir_all(failures_dir).context("Failed to create failures directory")?;

    let file_path = failures_dir.join(format!("{}.txt", cli.name));
    fs::write(&file_path, &block).context("Failed to write response file")?;

    println!(
        "Saved response to {} for regression testing",
        file_path.display()
    );

    let line_count = block.lines().count();
    println!("Response analysis:");
    println!("  - Lines: {}", line_count);
    println!(
        "  - Longer than the {}-line header: {}",
        DEFAULT_HEADER_LINES,
        line_count > DEFAULT_HEADER_LINES
    );

    match extract_observatory_name(&block) {
        Ok(name) => {
            println!("  - Observatory name: {}", name);
        }
        Err(e) => {
            println!("  - Observatory name not found: {}", e);
            println!("\nThis response will fail the regression tests until the parser handles it.");
        }
    }

    Ok(())
}
