pub mod checkpoint;
pub mod config;
pub mod error;
pub mod io;
pub mod orchestrator;
pub mod partition;
pub mod response;
pub mod river;
pub mod submit;
pub mod writer;

#[cfg(test)]
pub mod tests;

// Re-export key types and functions for easier access
pub use crate::checkpoint::Checkpoint;
pub use crate::config::{parse_date, ClientConfig, DataKind, ScrapeConfig};
pub use crate::error::{Result, ScrapeError};
pub use crate::orchestrator::{Orchestrator, RunSummary};
pub use crate::partition::{partition, DateRange, MonthlyChunk};
pub use crate::response::extract_observatory_name;
pub use crate::river::RiverDbClient;
pub use crate::submit::FormSubmitter;
pub use crate::writer::{HeaderPolicy, IncrementalTextWriter, OutputKey, WriteOutcome};
