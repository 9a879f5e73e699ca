use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::error::{Result, ScrapeError};
use crate::io::{read_head_lines, sanitize_filename};
use crate::partition::DateRange;

/// Leading lines the data service repeats in every response.
pub const DEFAULT_HEADER_LINES: usize = 9;

/// Identifies one output file: the observatory and the whole requested period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputKey {
    pub observatory_name: String,
    pub range: DateRange,
}

impl OutputKey {
    pub fn new(observatory_name: impl Into<String>, range: DateRange) -> Self {
        Self {
            observatory_name: observatory_name.into(),
            range,
        }
    }

    /// `{observatory_name}{yyyymmdd}-{yyyymmdd}.txt`
    pub fn file_name(&self) -> String {
        format!(
            "{}{}.txt",
            sanitize_filename(&self.observatory_name),
            self.range.compact()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderPolicy {
    /// Number of leading lines dropped from every block after the first.
    pub lines: usize,
    /// Refuse to append when the dropped lines differ from the file's header.
    pub validate: bool,
}

impl Default for HeaderPolicy {
    fn default() -> Self {
        Self {
            lines: DEFAULT_HEADER_LINES,
            validate: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Created { path: PathBuf },
    Appended { path: PathBuf, lines: usize },
}

impl WriteOutcome {
    pub fn path(&self) -> &Path {
        match self {
            WriteOutcome::Created { path } | WriteOutcome::Appended { path, .. } => path,
        }
    }
}

/// Appends response blocks to per-observatory text files.
///
/// The first block written to a file is kept verbatim. Later blocks have their
/// header stripped, after checking it against the header already on disk so a
/// change in the service's layout is reported instead of silently mixed in.
/// Files are opened and closed on every call.
///
/// A write is a first write when the caller says so or when the file does not
/// exist yet. A first write replaces whatever the file held before.
pub struct IncrementalTextWriter {
    dir: PathBuf,
    policy: HeaderPolicy,
    headers: HashMap<PathBuf, Vec<String>>,
}

impl IncrementalTextWriter {
    pub fn new(dir: impl Into<PathBuf>, policy: HeaderPolicy) -> Self {
        Self {
            dir: dir.into(),
            policy,
            headers: HashMap::new(),
        }
    }

    pub fn path_for(&self, key: &OutputKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    pub fn append(
        &mut self,
        key: &OutputKey,
        block: &str,
        is_first_write: bool,
    ) -> Result<WriteOutcome> {
        let path = self.path_for(key);

        if is_first_write || !path.exists() {
            if path.exists() {
                warn!("Replacing existing '{}'", path.display());
            }
            self.create(&path, block)?;
            info!("Created '{}'", path.display());
            return Ok(WriteOutcome::Created { path });
        }

        let lines: Vec<&str> = block.lines().collect();
        self.check_header(&path, &lines)?;

        let body = lines
            .get(self.policy.lines..)
            .unwrap_or_default()
            .join("\n");
        let appended = lines.len().saturating_sub(self.policy.lines);

        let mut file = OpenOptions::new()
            .append(true)
            .open(&path)
            .map_err(|source| storage(&path, source))?;
        writeln!(file, "{}", body).map_err(|source| storage(&path, source))?;

        Ok(WriteOutcome::Appended {
            path,
            lines: appended,
        })
    }

    fn create(&mut self, path: &Path, block: &str) -> Result<()> {
        let mut file = File::create(path).map_err(|source| storage(path, source))?;
        writeln!(file, "{}", block).map_err(|source| storage(path, source))?;

        let header = block
            .lines()
            .take(self.policy.lines)
            .map(str::to_string)
            .collect();
        self.headers.insert(path.to_path_buf(), header);
        Ok(())
    }

    fn check_header(&mut self, path: &Path, lines: &[&str]) -> Result<()> {
        if !self.headers.contains_key(path) {
            let header = read_head_lines(path, self.policy.lines)?;
            self.headers.insert(path.to_path_buf(), header);
        }
        let expected = &self.headers[path];

        let problem = if lines.len() < self.policy.lines {
            Some(format!(
                "block has {} lines, header is {}",
                lines.len(),
                self.policy.lines
            ))
        } else {
            expected
                .iter()
                .zip(lines)
                .position(|(want, got)| want != got)
                .map(|idx| {
                    format!(
                        "line {} is `{}`, expected `{}`",
                        idx + 1,
                        lines[idx],
                        expected[idx]
                    )
                })
        };

        match problem {
            None => Ok(()),
            Some(reason) if self.policy.validate => Err(ScrapeError::HeaderMismatch {
                path: path.to_path_buf(),
                reason,
            }),
            Some(reason) => {
                warn!("Header of {} differs: {}", path.display(), reason);
                Ok(())
            }
        }
    }
}

fn storage(path: &Path, source: std::io::Error) -> ScrapeError {
    ScrapeError::Storage {
        path: path.to_path_buf(),
        source,
    }
}
