//! Class (category) normalization against the canonical class list.

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Canonical class names in file order.
///
/// Order matters: when two classes are equally close to a noisy token, the
/// one listed first wins.
#[derive(Debug, Clone, Default)]
pub struct CategoryVocabulary {
    names: Vec<String>,
}

impl CategoryVocabulary {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Loads one class per row, taking the first comma-separated column.
    ///
    /// A UTF-8 BOM is stripped and empty rows are skipped.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .context(format!("Failed to open class list: {}", path.display()))?;
        let reader = BufReader::new(file);
        let mut names = Vec::new();

        for line_result in reader.lines() {
            let line = line_result.context("Failed to read line from class list")?;
            let line = line.trim_start_matches('\u{feff}');
            let first = line.split(',').next().unwrap_or("").trim();
            if !first.is_empty() {
                names.push(first.to_string());
            }
        }

        if names.is_empty() {
            return Err(anyhow!("Class list {} is empty", path.display()));
        }

        Ok(Self { names })
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the class with the highest [`category_similarity`] to `token`.
    ///
    /// Linear scan; ties go to the earliest entry. `None` only when the
    /// vocabulary is empty.
    pub fn nearest(&self, token: &str) -> Option<&str> {
        let mut best: Option<(&str, f64)> = None;
        for name in &self.names {
            let similarity = category_similarity(token, name);
            if best.is_none_or(|(_, best_similarity)| similarity > best_similarity) {
                best = Some((name, similarity));
            }
        }
        best.map(|(name, _)| name)
    }
}

fn fold_for_compare(s: &str) -> String {
    s.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// `1 - levenshtein / max_len` over case-folded, whitespace-stripped text,
/// rounded to 5 decimal places.
///
/// Two empty strings are identical (1.0).
pub fn category_similarity(a: &str, b: &str) -> f64 {
    let a = fold_for_compare(a);
    let b = fold_for_compare(b);
    let longest = a.chars().count().max(b.chars().count());
    if longest == 0 {
        return 1.0;
    }

    let distance = strsim::levenshtein(&a, &b);
    let similarity = 1.0 - distance as f64 / longest as f64;
    (similarity * 100_000.0).round() / 100_000.0
}
