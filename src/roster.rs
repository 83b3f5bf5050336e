//! Guild roster: the canonical members scores are linked to.
//!
//! Roster CSV format:
//! name,class,discord_id
//!
//! `discord_id` may be empty or `0` for members without a linked account.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A known guild member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntity {
    /// Canonical name as spelled in game
    pub name: String,
    /// Canonical class, as it appears in the class list
    pub class: String,
    /// Discord account to notify, if any
    pub external_id: Option<String>,
}

impl RosterEntity {
    pub fn new(name: &str, class: &str) -> Self {
        Self {
            name: name.to_string(),
            class: class.to_string(),
            external_id: None,
        }
    }

    pub fn with_external_id(mut self, id: &str) -> Self {
        self.external_id = Some(id.to_string());
        self
    }

    /// Roster key: name with whitespace removed, lowercased.
    pub fn key(&self) -> String {
        normalize_name(&self.name)
    }
}

/// Whitespace-stripped, lowercased form used for keys and name comparison.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

/// Load the roster from a CSV file.
///
/// Skips the header row and empty lines. Malformed rows and duplicate
/// names are errors: a silently shorter roster would fail the count check
/// later with a less useful message.
pub fn load_roster(path: &Path) -> Result<Vec<RosterEntity>> {
    let file = File::open(path).context(format!("Failed to open roster: {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut roster = Vec::new();
    let mut keys = HashSet::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.context("Failed to read line from roster")?;

        // Skip header row
        if line_num == 0 {
            continue;
        }

        if line.trim().is_empty() {
            continue;
        }

        let member = parse_line(&line).context(format!("Invalid roster row {}", line_num + 1))?;
        if !keys.insert(member.key()) {
            return Err(anyhow!(
                "Duplicate roster member {:?} at row {}",
                member.name,
                line_num + 1
            ));
        }
        roster.push(member);
    }

    crate::log(&format!("Loaded {} roster members", roster.len()));
    Ok(roster)
}

fn parse_line(line: &str) -> Result<RosterEntity> {
    let parts: Vec<&str> = line.split(',').map(str::trim).collect();

    if parts.len() < 2 {
        return Err(anyhow!("Expected at least 2 columns, got {}", parts.len()));
    }
    if parts[0].is_empty() || parts[1].is_empty() {
        return Err(anyhow!("Name and class must not be empty"));
    }

    let external_id = parts
        .get(2)
        .filter(|id| !id.is_empty() && **id != "0")
        .map(|id| id.to_string());

    Ok(RosterEntity {
        name: parts[0].to_string(),
        class: parts[1].to_string(),
        external_id,
    })
}
