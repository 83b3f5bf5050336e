//! Links parsed scoreboard rows to roster members.
//!
//! Two explicit steps:
//! 1. [`SimilarityMatrix::build`]: roster × entries, zero wherever the classes
//!    differ, otherwise the normalized name ratio.
//! 2. [`SimilarityMatrix::greedy_assignment`]: each roster member, in roster
//!    order, claims its best still-unclaimed entry.
//!
//! Step 2 is greedy and order dependent. An early member can take an entry
//! that a later member matches better; the result is not a maximum-weight
//! matching. The matrix is public so a caller can run a different solver
//! over the same scores.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::LinkError;
use crate::ocr::ParsedEntry;
use crate::roster::{normalize_name, RosterEntity};

/// A roster member paired with the scoreboard row it was linked to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkedRecord {
    /// Name similarity in [0, 1]; 0 means only a class-mismatched row was left
    pub similarity: f64,
    /// Roster name
    pub canonical_name: String,
    /// Roster external id (Discord account)
    pub external_id: Option<String>,
    /// The linked row
    pub entry: ParsedEntry,
}

/// One greedy pick: roster row → entry column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assignment {
    pub row: usize,
    pub column: usize,
    pub similarity: f64,
}

/// Row-major roster × entries similarity scores.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    rows: usize,
    columns: usize,
    values: Vec<f64>,
}

/// Indel-based similarity ratio of the normalized names, in [0, 1].
pub fn name_similarity(a: &str, b: &str) -> f64 {
    let a = normalize_name(a);
    let b = normalize_name(b);
    rapidfuzz::fuzz::ratio(a.chars(), b.chars())
}

impl SimilarityMatrix {
    /// Scores every roster member against every entry.
    ///
    /// Class equality (case-insensitive) is a hard gate: a mismatched pair is
    /// 0 no matter how close the names are.
    pub fn build(roster: &[RosterEntity], entries: &[ParsedEntry]) -> Self {
        let mut values = Vec::with_capacity(roster.len() * entries.len());

        for member in roster {
            let member_class = member.class.to_lowercase();
            for entry in entries {
                let similarity = if entry.class.to_lowercase() == member_class {
                    name_similarity(&member.name, &entry.name)
                } else {
                    0.0
                };
                values.push(similarity);
            }
        }

        Self {
            rows: roster.len(),
            columns: entries.len(),
            values,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn get(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.columns + column]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        &self.values[row * self.columns..(row + 1) * self.columns]
    }

    /// Greedy claim in row order.
    ///
    /// For each row, picks the unclaimed column with the highest score
    /// (lowest column index on ties). Rows left without a free column get no
    /// assignment, so the result has `min(rows, columns)` picks.
    pub fn greedy_assignment(&self) -> Vec<Assignment> {
        let mut claimed = vec![false; self.columns];
        let mut assignments = Vec::with_capacity(self.rows.min(self.columns));

        for row in 0..self.rows {
            let mut best: Option<(usize, f64)> = None;
            for (column, &similarity) in self.row(row).iter().enumerate() {
                if claimed[column] {
                    continue;
                }
                if best.is_none_or(|(_, best_similarity)| similarity > best_similarity) {
                    best = Some((column, similarity));
                }
            }

            if let Some((column, similarity)) = best {
                claimed[column] = true;
                assignments.push(Assignment {
                    row,
                    column,
                    similarity,
                });
            }
        }

        assignments
    }
}

/// Fails if two entries share a name, which usually means the same
/// screenshot was supplied twice.
pub fn check_duplicate_entries(entries: &[ParsedEntry]) -> Result<(), LinkError> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.name.as_str()) {
            return Err(LinkError::DuplicateEntry {
                name: entry.name.clone(),
            });
        }
    }
    Ok(())
}

/// Links every roster member to exactly one entry.
///
/// Requires one entry per roster member. Records come back in roster order.
pub fn link_entries(
    roster: &[RosterEntity],
    entries: &[ParsedEntry],
) -> Result<Vec<LinkedRecord>, LinkError> {
    if roster.len() != entries.len() {
        return Err(LinkError::RosterMismatch {
            roster: roster.len(),
            entries: entries.len(),
        });
    }

    let matrix = SimilarityMatrix::build(roster, entries);
    let records: Vec<LinkedRecord> = matrix
        .greedy_assignment()
        .into_iter()
        .map(|assignment| {
            let member = &roster[assignment.row];
            let entry = &entries[assignment.column];
            crate::log(&format!(
                "Linked {} -> {} ({:.3})",
                member.name, entry.name, assignment.similarity
            ));
            LinkedRecord {
                similarity: assignment.similarity,
                canonical_name: member.name.clone(),
                external_id: member.external_id.clone(),
                entry: entry.clone(),
            }
        })
        .collect();

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn entry(name: &str, class: &str, score: u32) -> ParsedEntry {
        ParsedEntry {
            name: name.to_string(),
            class: class.to_string(),
            level: 275,
            score,
            capture_date: NaiveDate::from_ymd_opt(2024, 3, 18).unwrap(),
        }
    }

    #[test]
    fn test_name_similarity() {
        assert_eq!(name_similarity("Anna", "anna"), 1.0);
        assert_eq!(name_similarity("Anna Lee", "AnnaLee"), 1.0);
        // indel distance 1 over 7 characters
        assert!((name_similarity("Anna", "Ann") - 6.0 / 7.0).abs() < 1e-9);
        assert_eq!(name_similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_links_within_class() {
        let roster = vec![
            RosterEntity::new("Anna", "Bishop"),
            RosterEntity::new("Bob", "Paladin"),
        ];
        let entries = vec![entry("Bobb", "Paladin", 100), entry("Ann", "Bishop", 200)];

        let records = link_entries(&roster, &entries).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].canonical_name, "Anna");
        assert_eq!(records[0].entry.name, "Ann");
        assert_eq!(records[1].canonical_name, "Bob");
        assert_eq!(records[1].entry.name, "Bobb");
        assert!(records.iter().all(|r| r.similarity > 0.8));
    }

    #[test]
    fn test_class_gate_is_absolute() {
        let roster = vec![RosterEntity::new("Anna", "Bishop")];
        let entries = vec![entry("Anna", "Paladin", 100)];

        let matrix = SimilarityMatrix::build(&roster, &entries);
        assert_eq!(matrix.get(0, 0), 0.0);

        // Still linked, but flagged by zero similarity
        let records = link_entries(&roster, &entries).unwrap();
        assert_eq!(records[0].similarity, 0.0);
    }

    #[test]
    fn test_class_gate_ignores_case() {
        let roster = vec![RosterEntity::new("Anna", "bishop")];
        let entries = vec![entry("Anna", "BISHOP", 100)];
        assert_eq!(SimilarityMatrix::build(&roster, &entries).get(0, 0), 1.0);
    }

    #[test]
    fn test_greedy_is_order_dependent() {
        // Row 0 likes both columns, slightly prefers column 0, which row 1 needs.
        let matrix = SimilarityMatrix {
            rows: 2,
            columns: 2,
            values: vec![0.9, 0.8, 0.85, 0.1],
        };

        let picks = matrix.greedy_assignment();
        assert_eq!(picks[0], Assignment { row: 0, column: 0, similarity: 0.9 });
        assert_eq!(picks[1], Assignment { row: 1, column: 1, similarity: 0.1 });
    }

    #[test]
    fn test_greedy_ties_take_lowest_column() {
        let matrix = SimilarityMatrix {
            rows: 2,
            columns: 2,
            values: vec![0.0, 0.0, 0.0, 0.0],
        };

        let picks = matrix.greedy_assignment();
        assert_eq!(picks[0].column, 0);
        assert_eq!(picks[1].column, 1);
    }

    #[test]
    fn test_assignment_is_injective_and_class_safe() {
        let classes = ["Bishop", "Paladin", "Night Lord"];
        for n in 0..9 {
            let roster: Vec<RosterEntity> = (0..n)
                .map(|i| RosterEntity::new(&format!("member{}", (i * 7) % 5), classes[i % 3]))
                .collect();
            let entries: Vec<ParsedEntry> = (0..n)
                .rev()
                .map(|i| entry(&format!("membr{}", (i * 3) % 4), classes[(i * 2) % 3], i as u32))
                .collect();

            let records = link_entries(&roster, &entries).unwrap();
            assert_eq!(records.len(), n);

            let matrix = SimilarityMatrix::build(&roster, &entries);
            let picks = matrix.greedy_assignment();
            let columns: HashSet<usize> = picks.iter().map(|p| p.column).collect();
            assert_eq!(columns.len(), n, "columns reused for n = {n}");

            for (pick, record) in picks.iter().zip(&records) {
                let member = &roster[pick.row];
                if member.class != record.entry.class {
                    assert_eq!(record.similarity, 0.0);
                }
            }
        }
    }

    #[test]
    fn test_roster_mismatch() {
        let roster = vec![RosterEntity::new("Anna", "Bishop")];
        let entries = vec![entry("Anna", "Bishop", 1), entry("Bob", "Bishop", 2)];

        assert_eq!(
            link_entries(&roster, &entries).unwrap_err(),
            LinkError::RosterMismatch { roster: 1, entries: 2 }
        );
    }

    #[test]
    fn test_duplicate_entries() {
        let entries = vec![entry("Anna", "Bishop", 1), entry("Bob", "Bishop", 2)];
        assert!(check_duplicate_entries(&entries).is_ok());

        let entries = vec![entry("Anna", "Bishop", 1), entry("Anna", "Bishop", 1)];
        assert_eq!(
            check_duplicate_entries(&entries),
            Err(LinkError::DuplicateEntry { name: "Anna".to_string() })
        );
    }
}
