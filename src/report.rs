//! Output of linked records: leaderboard order, missing members, CSV and JSON.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use crate::linker::LinkedRecord;

/// CSV header row.
const CSV_HEADER: &str = "name,class,level,score,date,similarity";

/// Sorts records by score, highest first. Equal scores keep roster order.
pub fn rank_by_score(records: &mut [LinkedRecord]) {
    records.sort_by(|a, b| b.entry.score.cmp(&a.entry.score));
}

/// Members whose linked score is zero, i.e. who did not run culvert.
pub fn zero_score_members(records: &[LinkedRecord]) -> Vec<&LinkedRecord> {
    records.iter().filter(|r| r.entry.score == 0).collect()
}

/// Initializes CSV file with header if it doesn't exist or is empty.
///
/// If the file exists and has content, this does nothing (preserves existing data).
pub fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing CSV")?;
        let reader = BufReader::new(file);
        if reader.lines().next().is_some() {
            return Ok(());
        }
    }

    let mut file = File::create(path).context("Failed to create CSV file")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    Ok(())
}

/// Appends one row per record to the CSV file.
///
/// Opens the file in append mode so earlier runs are never rewritten.
pub fn append_to_csv(path: &Path, records: &[LinkedRecord]) -> Result<()> {
    init_csv(path)?;

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .context("Failed to open CSV for append")?;

    for record in records {
        writeln!(
            file,
            "{},{},{},{},{},{:.5}",
            record.canonical_name,
            record.entry.class,
            record.entry.level,
            record.entry.score,
            record.entry.capture_date.format("%Y-%m-%d"),
            record.similarity,
        )
        .context("Failed to write CSV row")?;
    }

    Ok(())
}

/// Export records to a pretty-printed JSON file.
pub fn export_to_json(records: &[LinkedRecord], output_path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(records).context("Failed to serialize records to JSON")?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create JSON file: {}", output_path.display()))?;

    file.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;

    Ok(())
}
