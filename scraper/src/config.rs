use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use clap::ValueEnum;

use crate::error::Result;
use crate::partition::DateRange;
use crate::writer::HeaderPolicy;

pub const DEFAULT_BASE_URL: &str = "https://www1.river.go.jp/cgi-bin/";
pub const DEFAULT_OBSERVATORY: &str = "1368041150050";
pub const DEFAULT_CHARSET: &str = "euc-jp";

/// Which search of the database to drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
#[clap(rename_all = "lowercase")]
pub enum DataKind {
    /// Dam operation records
    #[default]
    Dam,
    /// Rainfall records
    Rain,
}

impl DataKind {
    pub fn search_program(&self) -> &'static str {
        match self {
            DataKind::Dam => "SrchDamData.exe",
            DataKind::Rain => "SrchRainData.exe",
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataKind::Dam => write!(f, "dam"),
            DataKind::Rain => write!(f, "rain"),
        }
    }
}

/// Settings of the HTTP session that talks to the search form.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub observatory_id: String,
    pub kind: DataKind,
    pub timeout: Duration,
    pub ready_attempts: u32,
    pub ready_interval: Duration,
    /// Used when a response does not declare its charset.
    pub default_charset: String,
}

impl ClientConfig {
    pub fn search_url(&self) -> String {
        format!(
            "{}/{}?ID={}&KIND=1&PAGE=0",
            self.base_url.trim_end_matches('/'),
            self.kind.search_program(),
            self.observatory_id
        )
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            observatory_id: DEFAULT_OBSERVATORY.to_string(),
            kind: DataKind::default(),
            timeout: Duration::from_secs(30),
            ready_attempts: 10,
            ready_interval: Duration::from_millis(1000),
            default_charset: DEFAULT_CHARSET.to_string(),
        }
    }
}

/// Everything one run needs. Built once and never changed afterwards.
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    pub observatory_id: String,
    pub range: DateRange,
    pub output_dir: PathBuf,
    pub header: HeaderPolicy,
    /// Extra attempts per chunk after a failed submission.
    pub chunk_retries: u32,
    pub retry_delay: Duration,
    pub resume: bool,
}

impl ScrapeConfig {
    pub fn new(observatory_id: impl Into<String>, range: DateRange) -> Self {
        Self {
            observatory_id: observatory_id.into(),
            range,
            output_dir: PathBuf::from("."),
            header: HeaderPolicy::default(),
            chunk_retries: 0,
            retry_delay: Duration::from_secs(5),
            resume: false,
        }
    }
}

/// Accepts `2002-01-31` as well as the compact `20020131`.
pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(value, "%Y%m%d"))
        .map_err(|_| format!("`{}` is not a date (YYYY-MM-DD or YYYYMMDD)", value))
}
