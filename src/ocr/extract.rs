use anyhow::{anyhow, Result};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::category::CategoryVocabulary;
use crate::error::ReadError;
use crate::log;

/// Row grammar, applied to the text after the name column:
/// `<anything><3-digit level> <class> <score>`.
///
/// The score accepts:
/// - Plain numbers: 12345
/// - Comma or space grouping: 12,345 or 1 234 567
/// - A decimal tail, which in practice is a comma read as a period: 45.231
/// - Any 2-character alphanumeric token, for badly corrupted scores
const ROW_PATTERN: &str = r"^(?P<lead>.*?)(?P<level>\d{3})\s+(?P<class>.*?)\s+(?P<score>\d+(?:[,\s]\d{3})*(?:\.\d+)?|[A-Za-z\d]{2})$";

/// One scoreboard row recovered from a recognized line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedEntry {
    /// Name as read, accent-folded
    pub name: String,
    /// Class, already resolved against the canonical class list
    pub class: String,
    /// Character level (three digits on the scoreboard)
    pub level: u16,
    /// Culvert score with grouping separators removed
    pub score: u32,
    /// Date the scores were captured
    pub capture_date: NaiveDate,
}

/// Characters Tesseract misreads in the level and score columns, with their
/// intended digit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConfusionTable {
    pairs: Vec<(char, char)>,
}

impl Default for ConfusionTable {
    fn default() -> Self {
        Self {
            pairs: vec![('§', '5'), ('Q', '0'), ('O', '0')],
        }
    }
}

impl ConfusionTable {
    pub fn new(pairs: Vec<(char, char)>) -> Self {
        Self { pairs }
    }

    /// Replaces every confusable character; everything else passes through.
    pub fn apply(&self, text: &str) -> String {
        text.chars()
            .map(|c| {
                self.pairs
                    .iter()
                    .find(|(from, _)| *from == c)
                    .map(|(_, to)| *to)
                    .unwrap_or(c)
            })
            .collect()
    }
}

/// Decomposes to NFKD and drops combining marks, so "Ånna" reads as "Anna".
pub fn fold_accents(text: &str) -> String {
    text.nfkd().filter(|c| !is_combining_mark(*c)).collect()
}

/// Replaces a short non-numeric last token with `0`.
///
/// A zero score is rendered as a dash that Tesseract reads as noise ("-",
/// "qx", "|") or drops entirely. Tokens longer than 3 characters are left
/// alone since they are usually a real, separator-grouped score.
pub fn repair_trailing_score(text: &str) -> String {
    let mut tokens: Vec<&str> = text.split_whitespace().collect();
    if let Some(last) = tokens.last_mut() {
        let numeric = last.chars().all(|c| c.is_ascii_digit());
        if !numeric && last.chars().count() <= 3 {
            *last = "0";
        }
    }
    tokens.join(" ")
}

/// Parses a score string, removing commas, periods and whitespace.
pub fn parse_score(text: &str) -> Result<u32> {
    let digits: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '.') && !c.is_whitespace())
        .collect();

    if digits.is_empty() {
        return Err(anyhow!("No digits found in score: {}", text));
    }

    digits
        .parse::<u32>()
        .map_err(|e| anyhow!("Failed to parse score '{}': {}", text, e))
}

/// Number of lines that count toward the consistency check.
pub fn count_non_empty(lines: &[String]) -> usize {
    lines.iter().filter(|line| !line.trim().is_empty()).count()
}

/// Rejects a read where some non-empty lines produced no entry.
///
/// A partial list would silently shift every row after the gap, so the
/// whole image is refused instead.
pub fn check_consistency(raw_lines: usize, parsed: usize) -> Result<(), ReadError> {
    if raw_lines != parsed {
        return Err(ReadError::CountMismatch { raw_lines, parsed });
    }
    Ok(())
}

/// Turns recognized lines into [`ParsedEntry`] rows.
pub struct LineParser<'a> {
    confusions: &'a ConfusionTable,
    classes: &'a CategoryVocabulary,
    capture_date: NaiveDate,
    row_regex: Regex,
}

impl<'a> LineParser<'a> {
    pub fn new(
        confusions: &'a ConfusionTable,
        classes: &'a CategoryVocabulary,
        capture_date: NaiveDate,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            confusions,
            classes,
            capture_date,
            row_regex: Regex::new(ROW_PATTERN)?,
        })
    }

    pub fn capture_date(&self) -> NaiveDate {
        self.capture_date
    }

    /// Parses non-empty line `index` into an entry.
    ///
    /// The first whitespace token is the name. The grammar is tried on the
    /// remaining columns first; if that fails it is retried on the whole
    /// line, which recovers rows where OCR glued the level onto the name.
    pub fn parse_line(&self, index: usize, line: &str) -> Result<ParsedEntry, ReadError> {
        let no_match = || ReadError::NoGrammarMatch {
            line: index,
            text: line.to_string(),
        };

        let mut tokens = line.split_whitespace();
        let name_token = tokens.next().ok_or_else(no_match)?;
        let rest = tokens.collect::<Vec<_>>().join(" ");
        let rest = repair_trailing_score(&self.confusions.apply(&rest));

        let captures = match self.row_regex.captures(&rest) {
            Some(captures) => captures,
            None => {
                let joined = format!("{} {}", name_token, rest);
                return self.entry_from_row(&joined, name_token).ok_or_else(no_match);
            }
        };

        self.entry_from_captures(&captures, name_token)
            .ok_or_else(no_match)
    }

    fn entry_from_row(&self, row: &str, name_token: &str) -> Option<ParsedEntry> {
        let captures = self.row_regex.captures(row)?;
        self.entry_from_captures(&captures, name_token)
    }

    fn entry_from_captures(
        &self,
        captures: &regex::Captures<'_>,
        name_token: &str,
    ) -> Option<ParsedEntry> {
        let level = captures["level"].parse::<u16>().ok()?;
        let class = self.classes.nearest(&captures["class"])?.to_string();
        let score = match parse_score(&captures["score"]) {
            Ok(score) => score,
            Err(e) => {
                log(&format!("Score rejected: {}", e));
                return None;
            }
        };

        Some(ParsedEntry {
            name: fold_accents(name_token),
            class,
            level,
            score,
            capture_date: self.capture_date,
        })
    }

    /// Parses every non-empty line of one screenshot.
    ///
    /// Single-character lines are treated as noise and never parsed, but
    /// they still count as non-empty, so they fail the consistency check
    /// like any other unreadable line.
    pub fn extract_entries(&self, lines: &[String]) -> Result<Vec<ParsedEntry>, ReadError> {
        let non_empty: Vec<&str> = lines
            .iter()
            .map(|line| line.as_str())
            .filter(|line| !line.trim().is_empty())
            .collect();

        let mut entries = Vec::with_capacity(non_empty.len());
        for (index, line) in non_empty.iter().enumerate() {
            log(&format!("{}: {}", index, line));

            if line.trim().chars().count() <= 1 {
                log(&format!("Line {} skipped as noise", index));
                continue;
            }

            match self.parse_line(index, line) {
                Ok(entry) => {
                    log(&format!(
                        "{}: {} | {} | {} | {}",
                        index, entry.name, entry.class, entry.level, entry.score
                    ));
                    entries.push(entry);
                }
                Err(e) => log(&format!("{}", e)),
            }
        }

        check_consistency(count_non_empty(lines), entries.len())?;
        Ok(entries)
    }
}
