use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::thread;

use log::{info, warn};

use crate::checkpoint::Checkpoint;
use crate::config::ScrapeConfig;
use crate::error::{Result, ScrapeError};
use crate::io::ensure_dir;
use crate::partition::{partition, MonthlyChunk};
use crate::response::extract_observatory_name;
use crate::submit::FormSubmitter;
use crate::writer::{IncrementalTextWriter, OutputKey, WriteOutcome};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub chunks_total: usize,
    pub chunks_written: usize,
    pub chunks_skipped: usize,
    /// Output files in the order they were first touched.
    pub outputs: Vec<PathBuf>,
}

/// Runs the whole period through one submitter, month by month.
///
/// The first block a run writes to a file replaces that file, so running the
/// same period twice does not duplicate its records. A resumed run instead
/// continues the file named in its checkpoint.
pub struct Orchestrator<S> {
    config: ScrapeConfig,
    submitter: S,
    writer: IncrementalTextWriter,
}

impl<S: FormSubmitter> Orchestrator<S> {
    pub fn new(config: ScrapeConfig, submitter: S) -> Self {
        let writer = IncrementalTextWriter::new(&config.output_dir, config.header);
        Self {
            config,
            submitter,
            writer,
        }
    }

    pub fn into_submitter(self) -> S {
        self.submitter
    }

    pub fn run(&mut self) -> Result<RunSummary> {
        ensure_dir(&self.config.output_dir)?;

        let range = self.config.range;
        let chunks = partition(&range);
        let checkpoint_path =
            Checkpoint::path_in(&self.config.output_dir, &self.config.observatory_id, &range);
        let resumed = if self.config.resume {
            self.resume_point(&checkpoint_path)?
        } else {
            None
        };
        let resume_after = resumed.as_ref().map(|checkpoint| checkpoint.last_completed);

        // Files this run has written to. A resumed run continues the checkpoint's file.
        let mut started: HashSet<PathBuf> = resumed
            .into_iter()
            .map(|checkpoint| checkpoint.output)
            .collect();

        let mut summary = RunSummary {
            chunks_total: chunks.len(),
            ..RunSummary::default()
        };

        info!(
            "Fetching {} month(s) for observatory {} ({})",
            chunks.len(),
            self.config.observatory_id,
            range
        );

        for chunk in &chunks {
            if resume_after.is_some_and(|done| chunk.end() <= done) {
                summary.chunks_skipped += 1;
                continue;
            }

            info!("Processing period {}", chunk);
            let outcome = self.process_chunk(chunk, &mut started)?;
            if let WriteOutcome::Appended { lines, .. } = &outcome {
                info!("Appended {} line(s) to {}", lines, outcome.path().display());
            }

            let path = outcome.path().to_path_buf();
            Checkpoint {
                observatory_id: self.config.observatory_id.clone(),
                range,
                last_completed: chunk.end(),
                output: path.clone(),
            }
            .save(&checkpoint_path)?;

            if !summary.outputs.contains(&path) {
                summary.outputs.push(path);
            }
            summary.chunks_written += 1;
        }

        Checkpoint::clear(&checkpoint_path)?;
        Ok(summary)
    }

    fn resume_point(&self, path: &Path) -> Result<Option<Checkpoint>> {
        match Checkpoint::load(path)? {
            Some(checkpoint)
                if checkpoint.observatory_id == self.config.observatory_id
                    && checkpoint.range == self.config.range =>
            {
                info!(
                    "Resuming {} after {}",
                    checkpoint.output.display(),
                    checkpoint.last_completed
                );
                Ok(Some(checkpoint))
            }
            Some(_) => {
                warn!("Ignoring checkpoint {} of another run", path.display());
                Ok(None)
            }
            None => {
                warn!("No checkpoint at {}, starting from the beginning", path.display());
                Ok(None)
            }
        }
    }

    /// Submit, name, write, reset. The submitter is reset even when a step fails.
    fn process_chunk(
        &mut self,
        chunk: &MonthlyChunk,
        started: &mut HashSet<PathBuf>,
    ) -> Result<WriteOutcome> {
        let mut attempt = 0;
        let block = loop {
            let submitted = self.submitter.submit(chunk.start(), chunk.end());
            match submitted {
                Ok(block) => break block,
                Err(e) if attempt < self.config.chunk_retries => {
                    attempt += 1;
                    warn!(
                        "Submission for {} failed ({}), retry {}/{}",
                        chunk, e, attempt, self.config.chunk_retries
                    );
                    if let Err(reset) = self.submitter.reset() {
                        warn!("Reset after failed submission also failed: {}", reset);
                        return Err(e);
                    }
                    thread::sleep(self.config.retry_delay);
                }
                Err(e) => return Err(self.reset_after(e)),
            }
        };

        let written = extract_observatory_name(&block).and_then(|name| {
            let key = OutputKey::new(name, self.config.range);
            let path = self.writer.path_for(&key);
            let is_first_write = !started.contains(&path);
            let outcome = self.writer.append(&key, &block, is_first_write)?;
            started.insert(path);
            Ok(outcome)
        });

        match written {
            Ok(outcome) => {
                self.submitter.reset()?;
                Ok(outcome)
            }
            Err(e) => Err(self.reset_after(e)),
        }
    }

    /// Resets the submitter after `error`, keeping `error` as the one reported.
    fn reset_after(&mut self, error: ScrapeError) -> ScrapeError {
        if let Err(reset) = self.submitter.reset() {
            warn!("Reset after failure also failed: {}", reset);
        }
        error
    }
}
