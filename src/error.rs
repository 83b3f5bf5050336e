//! Failure taxonomy for reading and linking scoreboards.

use thiserror::Error;

/// Why a screenshot could not be turned into parsed entries.
#[derive(Debug, Error)]
pub enum ReadError {
    /// The input bytes are not a decodable raster image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The text-recognition engine failed to run or produced unusable output.
    #[error("text recognition failed: {0}")]
    Recognition(String),

    /// Line `line` (0-based, among non-empty lines) does not fit the row grammar.
    #[error("line {line} did not match the scoreboard grammar: {text:?}")]
    NoGrammarMatch { line: usize, text: String },

    /// Some non-empty lines produced no entry. The capture is ambiguous.
    #[error("messy capture: {raw_lines} non-empty lines but {parsed} parsed entries")]
    CountMismatch { raw_lines: usize, parsed: usize },

    /// A batch holds more screenshot slots than the reader accepts.
    #[error("too many screenshots: {given} given, at most {max} accepted")]
    TooManyScreenshots { given: usize, max: usize },

    /// Screenshot `index` (1-based slot number) of a batch failed.
    #[error("screenshot #{index} might be messy: {source}")]
    MessyScreenshot {
        index: usize,
        #[source]
        source: Box<ReadError>,
    },
}

/// Preconditions for linking parsed entries to the roster.
#[derive(Debug, Error, PartialEq)]
pub enum LinkError {
    #[error("roster has {roster} members but {entries} scores were read")]
    RosterMismatch { roster: usize, entries: usize },

    /// Two entries carry the same name, usually the same screenshot given twice.
    #[error("duplicate entry for {name:?}")]
    DuplicateEntry { name: String },
}
