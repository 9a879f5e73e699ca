use crate::error::{Result, ScrapeError};

/// Zero-based line of the response header that carries the observatory name.
pub const NAME_LINE: usize = 3;
/// Field of `NAME_LINE` holding the name.
pub const NAME_FIELD: usize = 1;
pub const FIELD_DELIMITER: char = ',';

/// Reads the observatory name out of a raw response block.
///
/// The data service answers with a comma separated preamble whose fourth line
/// looks like `観測所名,宮ヶ瀬ダム`.
pub fn extract_observatory_name(block: &str) -> Result<String> {
    let lines: Vec<&str> = block.lines().collect();
    let line = lines.get(NAME_LINE).ok_or(ScrapeError::MissingHeader {
        lines: lines.len(),
    })?;

    let name = line
        .split(FIELD_DELIMITER)
        .nth(NAME_FIELD)
        .map(str::trim)
        .unwrap_or_default();

    if name.is_empty() {
        return Err(ScrapeError::MissingObservatoryName {
            line: line.to_string(),
        });
    }

    Ok(name.to_string())
}
