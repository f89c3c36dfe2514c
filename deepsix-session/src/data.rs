//! Static outcome-table data and pure lookup functions.
//!
//! The stress and panic tables are ordered range tables mapping a roll
//! total to an outcome definition. They are loaded once at startup and
//! validated for contiguity before any session is allowed to resolve
//! rolls against them.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use thiserror::Error;

use crate::constants::MIN_TOTAL;

/// Which of the two roll kinds is being resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Stress,
    Panic,
}

impl Severity {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stress => "stress",
            Self::Panic => "panic",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stress" => Ok(Self::Stress),
            "panic" => Ok(Self::Panic),
            _ => Err(()),
        }
    }
}

/// A sub-outcome the moderator may pick when committing a choice entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyChoice {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub stress_delta: Option<i32>,
}

/// Inline storage for the handful of choices an entry can carry.
pub type ChoiceSet = SmallVec<[ApplyChoice; 2]>;

/// A single row of an outcome table, covering a contiguous range of totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEntry {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub desc: String,
    pub min: i32,
    pub max: i32,
    #[serde(default)]
    pub severity: u8,
    #[serde(default)]
    pub persistent: bool,
    #[serde(default)]
    pub stress_delta: Option<i32>,
    #[serde(default)]
    pub choices: ChoiceSet,
}

impl OutcomeEntry {
    /// Whether `total` falls inside this entry's range.
    #[must_use]
    pub const fn contains(&self, total: i32) -> bool {
        total >= self.min && total <= self.max
    }
}

/// Startup validation failures. Any of these must refuse the session.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("{table} table has no entries")]
    Empty { table: Severity },
    #[error("{table} table entry '{id}' has min {min} above max {max}")]
    InvertedRange {
        table: Severity,
        id: String,
        min: i32,
        max: i32,
    },
    #[error("{table} table entry '{id}' starts at {found}, expected {expected}")]
    RangeBreak {
        table: Severity,
        id: String,
        expected: i32,
        found: i32,
    },
    #[error("{table} table declares id '{id}' more than once")]
    DuplicateId { table: Severity, id: String },
    #[error("{table} table starts at {floor}, leaving totals down to {required} unmatched")]
    FloorNotCovered {
        table: Severity,
        floor: i32,
        required: i32,
    },
}

/// An ordered, static set of ranges mapping a roll total to an outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OutcomeTable {
    pub entries: Vec<OutcomeEntry>,
}

impl OutcomeTable {
    /// Resolve a roll total to its entry.
    ///
    /// Totals above the highest entry's `max` resolve to that entry: the
    /// last row acts as an open-ended ceiling. By table invariant every
    /// other total matches exactly one row.
    ///
    /// # Panics
    ///
    /// Panics on an empty table, which validation rules out at startup.
    #[must_use]
    pub fn resolve_by_total(&self, total: i32) -> &OutcomeEntry {
        self.entries
            .iter()
            .find(|entry| entry.contains(total))
            .unwrap_or_else(|| self.entries.last().expect("validated table is non-empty"))
    }

    /// Look up an entry by its stable id.
    #[must_use]
    pub fn resolve_by_id(&self, id: &str) -> Option<&OutcomeEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Find the next distinct entry above the range matching `total`.
    ///
    /// Scans upward from the row containing `total`, skipping any entry
    /// whose id equals `exclude_id`. Returns `None` when the table is
    /// exhausted. The returned entry never carries `exclude_id`.
    #[must_use]
    pub fn next_distinct_higher(&self, total: i32, exclude_id: &str) -> Option<&OutcomeEntry> {
        let current = self
            .entries
            .iter()
            .position(|entry| entry.contains(total))
            .unwrap_or(self.entries.len().saturating_sub(1));
        self.entries
            .iter()
            .skip(current + 1)
            .find(|entry| entry.id != exclude_id)
    }

    /// Check the contiguity and exhaustiveness invariant.
    ///
    /// # Errors
    ///
    /// Returns the first violation found: empty table, inverted or
    /// non-contiguous ranges, duplicated ids, or a floor that leaves
    /// representable totals unmatched.
    pub fn validate(&self, table: Severity) -> Result<(), TableError> {
        let Some(first) = self.entries.first() else {
            return Err(TableError::Empty { table });
        };
        if first.min > MIN_TOTAL {
            return Err(TableError::FloorNotCovered {
                table,
                floor: first.min,
                required: MIN_TOTAL,
            });
        }
        let mut expected = first.min;
        for entry in &self.entries {
            if entry.min > entry.max {
                return Err(TableError::InvertedRange {
                    table,
                    id: entry.id.clone(),
                    min: entry.min,
                    max: entry.max,
                });
            }
            if entry.min != expected {
                return Err(TableError::RangeBreak {
                    table,
                    id: entry.id.clone(),
                    expected,
                    found: entry.min,
                });
            }
            expected = entry.max.saturating_add(1);
        }
        for (idx, entry) in self.entries.iter().enumerate() {
            if self.entries[..idx].iter().any(|prior| prior.id == entry.id) {
                return Err(TableError::DuplicateId {
                    table,
                    id: entry.id.clone(),
                });
            }
            for (cidx, choice) in entry.choices.iter().enumerate() {
                if entry.choices[..cidx].iter().any(|prior| prior.id == choice.id) {
                    return Err(TableError::DuplicateId {
                        table,
                        id: choice.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// The pair of outcome tables a session resolves against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TableSet {
    pub stress: OutcomeTable,
    pub panic: OutcomeTable,
}

impl TableSet {
    /// Select the table for a roll severity.
    #[must_use]
    pub const fn table_for(&self, severity: Severity) -> &OutcomeTable {
        match severity {
            Severity::Stress => &self.stress,
            Severity::Panic => &self.panic,
        }
    }

    /// Load a table set from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into valid tables.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Validate both tables.
    ///
    /// # Errors
    ///
    /// Returns the first [`TableError`] found in either table.
    pub fn validate(&self) -> Result<(), TableError> {
        self.stress.validate(Severity::Stress)?;
        self.panic.validate(Severity::Panic)
    }

    /// The built-in tables shipped with the crate.
    #[must_use]
    pub fn builtin() -> &'static Self {
        static TABLES: OnceLock<TableSet> = OnceLock::new();
        TABLES.get_or_init(|| {
            serde_json::from_str(include_str!("../assets/tables.json"))
                .expect("valid built-in tables")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, min: i32, max: i32) -> OutcomeEntry {
        OutcomeEntry {
            id: id.to_string(),
            label: format!("Entry {id}"),
            desc: String::new(),
            min,
            max,
            severity: 0,
            persistent: false,
            stress_delta: None,
            choices: ChoiceSet::new(),
        }
    }

    fn small_table() -> OutcomeTable {
        OutcomeTable {
            entries: vec![
                entry("calm", -999, 0),
                entry("mild", 1, 4),
                entry("bad", 5, 8),
                entry("worst", 9, 999),
            ],
        }
    }

    #[test]
    fn builtin_tables_pass_validation() {
        TableSet::builtin().validate().unwrap();
    }

    #[test]
    fn resolve_by_total_matches_ranges_and_ceiling() {
        let table = small_table();
        assert_eq!(table.resolve_by_total(-40).id, "calm");
        assert_eq!(table.resolve_by_total(0).id, "calm");
        assert_eq!(table.resolve_by_total(1).id, "mild");
        assert_eq!(table.resolve_by_total(8).id, "bad");
        // Above every max the highest entry acts as the ceiling.
        assert_eq!(table.resolve_by_total(5_000).id, "worst");
    }

    #[test]
    fn resolve_by_id_finds_known_entries() {
        let table = small_table();
        assert_eq!(table.resolve_by_id("bad").map(|e| e.min), Some(5));
        assert!(table.resolve_by_id("missing").is_none());
    }

    #[test]
    fn next_distinct_higher_skips_excluded_id() {
        let table = small_table();
        let next = table.next_distinct_higher(2, "bad").unwrap();
        assert_eq!(next.id, "worst");
        let next = table.next_distinct_higher(2, "unrelated").unwrap();
        assert_eq!(next.id, "bad");
    }

    #[test]
    fn next_distinct_higher_exhausts_at_table_top() {
        let table = small_table();
        assert!(table.next_distinct_higher(10, "anything").is_none());
        assert!(table.next_distinct_higher(9_999, "worst").is_none());
    }

    #[test]
    fn validation_rejects_gap() {
        let mut table = small_table();
        table.entries[2].min = 6;
        let err = table.validate(Severity::Stress).unwrap_err();
        assert!(matches!(err, TableError::RangeBreak { expected: 5, found: 6, .. }));
    }

    #[test]
    fn validation_rejects_overlap() {
        let mut table = small_table();
        table.entries[1].max = 6;
        let err = table.validate(Severity::Panic).unwrap_err();
        assert!(matches!(err, TableError::RangeBreak { .. }));
    }

    #[test]
    fn validation_rejects_duplicate_id() {
        let mut table = small_table();
        table.entries[3].id = "mild".to_string();
        let err = table.validate(Severity::Stress).unwrap_err();
        assert!(matches!(err, TableError::DuplicateId { .. }));
    }

    #[test]
    fn validation_rejects_uncovered_floor() {
        let mut table = small_table();
        table.entries[0].min = -5;
        let err = table.validate(Severity::Stress).unwrap_err();
        assert!(matches!(err, TableError::FloorNotCovered { floor: -5, .. }));
    }

    #[test]
    fn validation_rejects_empty_table() {
        let table = OutcomeTable::default();
        assert_eq!(
            table.validate(Severity::Panic),
            Err(TableError::Empty {
                table: Severity::Panic
            })
        );
    }

    #[test]
    fn severity_parses_and_prints() {
        assert_eq!("panic".parse::<Severity>(), Ok(Severity::Panic));
        assert_eq!(Severity::Stress.to_string(), "stress");
        assert!("dread".parse::<Severity>().is_err());
    }
}
