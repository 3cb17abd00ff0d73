//! Per-row and per-phase outcomes of an ingestion pass.

use std::fmt;

use crate::data::EntityKind;
use crate::store::UpsertOutcome;
use crate::types::ColumnName;

/// Why a source row was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// A required field was absent or had the wrong JSON type.
    MissingField(&'static str),
    /// A required field was present but could not be parsed or normalized.
    InvalidField(&'static str),
    /// The row was well-formed but excluded by the resource type filter.
    Filtered,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingField(field) => write!(f, "missing field '{field}'"),
            SkipReason::InvalidField(field) => write!(f, "invalid field '{field}'"),
            SkipReason::Filtered => f.write_str("filtered by resource type"),
        }
    }
}

/// Outcome of processing one source row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RowOutcome {
    /// The row decoded and was upserted.
    Imported(UpsertOutcome),
    /// The row was dropped.
    Skipped(SkipReason),
}

/// A dropped row and its position in the source collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SkippedRow {
    /// Zero-based position in the source collection.
    pub index: usize,
    /// Why the row was dropped.
    pub reason: SkipReason,
}

/// Whether a phase committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PhaseStatus {
    /// The working collection was handed to the store.
    Committed,
    /// The phase hit a fatal precondition; nothing from it was committed.
    Aborted(String),
}

/// Row accounting for one phase.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PhaseReport {
    /// Entity kind written by the phase.
    pub kind: EntityKind,
    /// Whether the phase committed.
    pub status: PhaseStatus,
    /// Rows whose identity was new to the store.
    pub inserted: usize,
    /// Rows that changed an existing entity.
    pub updated: usize,
    /// Rows identical to the stored entity.
    pub unchanged: usize,
    /// Dropped rows in source order, filtered rows included.
    pub skipped: Vec<SkippedRow>,
}

impl PhaseReport {
    /// Empty committed report for `kind`.
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            status: PhaseStatus::Committed,
            inserted: 0,
            updated: 0,
            unchanged: 0,
            skipped: Vec::new(),
        }
    }

    /// Report for a phase that never ran past its precondition.
    pub fn aborted(kind: EntityKind, reason: impl Into<String>) -> Self {
        Self {
            status: PhaseStatus::Aborted(reason.into()),
            ..Self::new(kind)
        }
    }

    /// Tally the outcome of the row at `index`.
    pub fn record(&mut self, index: usize, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Imported(UpsertOutcome::Inserted) => self.inserted += 1,
            RowOutcome::Imported(UpsertOutcome::Updated) => self.updated += 1,
            RowOutcome::Imported(UpsertOutcome::Unchanged) => self.unchanged += 1,
            RowOutcome::Skipped(reason) => self.skipped.push(SkippedRow { index, reason }),
        }
    }

    /// Rows upserted by this phase, whether or not they changed anything.
    pub fn imported(&self) -> usize {
        self.inserted + self.updated + self.unchanged
    }

    /// Rows dropped for `reason`.
    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|row| row.reason == reason).count()
    }

    /// Rows dropped because the type filter excluded them.
    pub fn filtered(&self) -> usize {
        self.skipped_for(SkipReason::Filtered)
    }

    /// Returns `true` unless the phase was aborted.
    pub fn is_committed(&self) -> bool {
        self.status == PhaseStatus::Committed
    }
}

/// A disagreement between the column map and the positional decoding table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColumnMismatch {
    /// The column map has no entry for a decoded column.
    Missing {
        /// Decoded column name.
        column: &'static str,
        /// Position the column is read from.
        expected: usize,
    },
    /// The column map places a decoded column at a different position.
    Moved {
        /// Decoded column name.
        column: &'static str,
        /// Position the column is read from.
        expected: usize,
        /// Position the column map gives.
        actual: usize,
    },
    /// The column map names a column the decoding table does not read.
    Unused {
        /// Column name from the map.
        column: ColumnName,
        /// Position the column map gives.
        position: usize,
    },
}

impl fmt::Display for ColumnMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnMismatch::Missing { column, expected } => {
                write!(f, "column '{column}' (read at {expected}) is absent from the column map")
            }
            ColumnMismatch::Moved {
                column,
                expected,
                actual,
            } => write!(f, "column '{column}' is read at {expected} but mapped to {actual}"),
            ColumnMismatch::Unused { column, position } => {
                write!(f, "column '{column}' at {position} is not decoded")
            }
        }
    }
}

/// Summary of a completed pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassReport {
    /// One report per phase, in run order.
    pub phases: Vec<PhaseReport>,
    /// Empty when column validation is disabled.
    pub column_mismatches: Vec<ColumnMismatch>,
}

impl PassReport {
    /// Report for the phase that wrote `kind`.
    pub fn phase(&self, kind: EntityKind) -> Option<&PhaseReport> {
        self.phases.iter().find(|phase| phase.kind == kind)
    }

    /// Total rows dropped across all phases.
    pub fn total_skipped(&self) -> usize {
        self.phases.iter().map(|phase| phase.skipped.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_tallies_each_outcome() {
        let mut report = PhaseReport::new(EntityKind::Document);
        report.record(0, RowOutcome::Imported(UpsertOutcome::Inserted));
        report.record(1, RowOutcome::Imported(UpsertOutcome::Updated));
        report.record(2, RowOutcome::Imported(UpsertOutcome::Unchanged));
        report.record(3, RowOutcome::Skipped(SkipReason::Filtered));
        report.record(4, RowOutcome::Skipped(SkipReason::MissingField("id")));
        report.record(5, RowOutcome::Skipped(SkipReason::Filtered));

        assert_eq!(report.imported(), 3);
        assert_eq!(report.filtered(), 2);
        assert_eq!(report.skipped_for(SkipReason::MissingField("id")), 1);
        assert_eq!(
            report.skipped[1],
            SkippedRow {
                index: 4,
                reason: SkipReason::MissingField("id")
            }
        );
        assert!(report.is_committed());
    }

    #[test]
    fn aborted_report_is_empty() {
        let report = PhaseReport::aborted(EntityKind::Document, "no sample code type");
        assert!(!report.is_committed());
        assert_eq!(report.imported(), 0);
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn skip_reasons_render_field_names() {
        assert_eq!(
            SkipReason::InvalidField("date").to_string(),
            "invalid field 'date'"
        );
        assert_eq!(
            ColumnMismatch::Moved {
                column: "url",
                expected: 9,
                actual: 10
            }
            .to_string(),
            "column 'url' is read at 9 but mapped to 10"
        );
    }
}
