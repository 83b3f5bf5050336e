//! Culvert scoreboard reader.
//!
//! Turns OCR-scanned screenshots of a guild culvert leaderboard into
//! structured rows, then links every row to a known guild member.
//!
//! Pipeline: bitmap → preprocess → Tesseract → line parsing (+ class
//! normalization) → consistency check → greedy name linking.

pub mod config;
pub mod error;
pub mod input;
pub mod linker;
pub mod ocr;
pub mod paths;
pub mod report;
pub mod roster;

pub use config::PipelineConfig;
pub use error::{LinkError, ReadError};
pub use linker::{link_entries, LinkedRecord, SimilarityMatrix};
pub use ocr::{ParsedEntry, ScoreboardReader};
pub use roster::RosterEntity;

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("culvert_ocr.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}
