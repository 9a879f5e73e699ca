use std::io;
use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("invalid period: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("response has no header: expected at least 4 lines, got {lines}")]
    MissingHeader { lines: usize },

    #[error("no observatory name in header line `{line}`")]
    MissingObservatoryName { line: String },

    /// The repeated header of a later chunk does not match the one already in the file.
    #[error("header of new block does not match {}: {reason}", path.display())]
    HeaderMismatch { path: PathBuf, reason: String },

    #[error("failed to write {}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("checkpoint {} is unusable", path.display())]
    Checkpoint {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("no search form found on {url}")]
    FormNotFound { url: String },

    #[error("search form has {found} inputs, need at least {needed}")]
    FormLayout { found: usize, needed: usize },

    #[error("{what} was not ready after {attempts} attempts")]
    NotReady { what: String, attempts: u32 },

    #[error("previous submission was not reset")]
    AdapterNotReset,
}
