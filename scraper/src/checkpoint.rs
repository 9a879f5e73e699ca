use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrapeError};
use crate::partition::DateRange;

/// Progress of a run: the end of the last chunk that reached the output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub observatory_id: String,
    pub range: DateRange,
    pub last_completed: NaiveDate,
    pub output: PathBuf,
}

impl Checkpoint {
    /// Where the checkpoint of a run lives. The observatory name is not known
    /// before the first response, so the file is keyed by id instead.
    pub fn path_in(dir: &Path, observatory_id: &str, range: &DateRange) -> PathBuf {
        dir.join(format!(".{}{}.checkpoint.json", observatory_id, range.compact()))
    }

    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path).map_err(|source| ScrapeError::Storage {
            path: path.to_path_buf(),
            source,
        })?;
        let checkpoint =
            serde_json::from_str(&json).map_err(|source| ScrapeError::Checkpoint {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Some(checkpoint))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ScrapeError::Checkpoint {
            path: path.to_path_buf(),
            source,
        })?;

        // Write then rename: an interrupted save keeps the previous checkpoint.
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json)
            .and_then(|_| fs::rename(&tmp, path))
            .map_err(|source| ScrapeError::Storage {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn clear(path: &Path) -> Result<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(ScrapeError::Storage {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}
