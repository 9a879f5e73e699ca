use anyhow::Result;
use chrono::NaiveDate;
use std::fs;
use std::path::Path;

pub mod fixtures;
pub mod writer_tests;

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day)
        .unwrap_or_else(|| panic!("invalid test date {}-{}-{}", year, month, day))
}

/// Helper function to save a response block that broke a test for future regression testing
pub fn save_failed_response(block: &str, test_name: &str) -> Result<()> {
    let failures_dir = Path::new("src/tests/fixtures/failures");
    fs::create_dir_all(failures_dir)?;

    let file_path = failures_dir.join(format!("{}.txt", test_name));
    fs::write(&file_path, block)?;

    println!("Saved failed response to {}", file_path.display());
    Ok(())
}
