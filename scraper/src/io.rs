use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{Result, ScrapeError};

pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    fs::create_dir_all(path).map_err(|source| ScrapeError::Storage {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads at most `count` lines from the start of a file, without line endings.
pub fn read_head_lines<P: AsRef<Path>>(path: P, count: usize) -> Result<Vec<String>> {
    let path = path.as_ref();
    let storage = |source: std::io::Error| ScrapeError::Storage {
        path: path.to_path_buf(),
        source,
    };

    let reader = BufReader::new(File::open(path).map_err(storage)?);
    reader
        .lines()
        .take(count)
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(storage)
}

pub fn sanitize_filename(input: &str) -> String {
    // Replace characters that are problematic in filenames
    let mut sanitized = input
        .replace(&['/', '\\', ':', '*', '?', '"', '<', '>', '|', '\0'][..], "_")
        .replace("__", "_");

    sanitized = sanitized.trim().trim_matches('.').to_string();

    if sanitized.is_empty() {
        sanitized = "untitled".to_string();
    }

    sanitized
}
