use std::thread;
use std::time::Duration;

use chrono::NaiveDate;
use log::debug;

use crate::error::{Result, ScrapeError};

/// The site-specific half of a run: turns one period into one raw text block.
///
/// Implementations hold session state that is not safe to share, so a run
/// drives exactly one submitter, one chunk at a time. `reset` must be called
/// after every `submit` before the next one.
pub trait FormSubmitter {
    fn submit(&mut self, start: NaiveDate, end: NaiveDate) -> Result<String>;

    fn reset(&mut self) -> Result<()>;
}

impl<S: FormSubmitter + ?Sized> FormSubmitter for Box<S> {
    fn submit(&mut self, start: NaiveDate, end: NaiveDate) -> Result<String> {
        (**self).submit(start, end)
    }

    fn reset(&mut self) -> Result<()> {
        (**self).reset()
    }
}

/// Calls `probe` until it yields a value, sleeping `interval` between tries.
///
/// Errors from `probe` abort immediately; running out of attempts gives
/// `ScrapeError::NotReady`.
pub fn poll_until<T, F>(what: &str, attempts: u32, interval: Duration, mut probe: F) -> Result<T>
where
    F: FnMut() -> Result<Option<T>>,
{
    let attempts = attempts.max(1);
    for attempt in 1..=attempts {
        if let Some(value) = probe()? {
            return Ok(value);
        }
        debug!("{} not ready (attempt {}/{})", what, attempt, attempts);
        if attempt < attempts {
            thread::sleep(interval);
        }
    }

    Err(ScrapeError::NotReady {
        what: what.to_string(),
        attempts,
    })
}
