//! Phase importers.
//!
//! Each importer opens one `Transaction`, upserts rows strictly in source
//! order, and commits once. Rows that fail a required-field check are recorded
//! in the phase report and otherwise ignored.

use serde_json::Value;
use tracing::debug;

use crate::report::{PhaseReport, RowOutcome, SkipReason};
use crate::schema::KeyedRow;
use crate::store::{Entity, Transaction};

/// Positional decoding table for document rows.
pub mod columns;
/// Document import (positional rows, filtering, normalization).
pub mod documents;
/// Resource type and framework import.
pub mod reference;
/// Topic hierarchy import.
pub mod topics;

pub use columns::{DOCUMENT_COLUMNS, DocumentColumn, DocumentField, validate_column_map};
pub use documents::{decode_document_row, import_documents};
pub use reference::{import_frameworks, import_resource_types};
pub use topics::import_topics;

/// Decode and upsert every row, tallying outcomes into `report`.
fn upsert_rows<'s, E, R, F>(
    txn: &mut Transaction<'s, E>,
    rows: &[R],
    report: &mut PhaseReport,
    mut decode: F,
) where
    E: Entity,
    F: FnMut(&Transaction<'s, E>, &R) -> Result<E, SkipReason>,
{
    for (index, row) in rows.iter().enumerate() {
        let outcome = match decode(txn, row) {
            Ok(entity) => RowOutcome::Imported(txn.upsert(entity)),
            Err(reason) => {
                debug!(kind = %E::KIND, index, %reason, "[catalog:import] row skipped");
                RowOutcome::Skipped(reason)
            }
        };
        report.record(index, outcome);
    }
}

/// Required string field.
fn required_text<'r>(row: &'r KeyedRow, field: &'static str) -> Result<&'r str, SkipReason> {
    row.get(field)
        .and_then(Value::as_str)
        .ok_or(SkipReason::MissingField(field))
}

/// Required integer identity that must fit in `i16`.
fn required_i16(row: &KeyedRow, field: &'static str) -> Result<i16, SkipReason> {
    let value = row
        .get(field)
        .and_then(Value::as_i64)
        .ok_or(SkipReason::MissingField(field))?;
    i16::try_from(value).map_err(|_| SkipReason::InvalidField(field))
}

/// Required numeric-text field whose value falls back when it does not parse.
///
/// The outer `Err` means the field is absent or neither a string nor a number;
/// `Ok(None)` means it is present but not a valid `i16`.
fn required_numeric_text(row: &KeyedRow, field: &'static str) -> Result<Option<i16>, SkipReason> {
    row.get(field)
        .and_then(numeric_text)
        .ok_or(SkipReason::MissingField(field))
}

/// Optional numeric-text field; absent and unparsable both read as `None`.
fn optional_numeric_text(row: &KeyedRow, field: &'static str) -> Option<i16> {
    row.get(field).and_then(numeric_text).flatten()
}

/// Numeric text carried either as a JSON string or a JSON number.
fn numeric_text(value: &Value) -> Option<Option<i16>> {
    match value {
        Value::String(text) => Some(text.parse::<i16>().ok()),
        Value::Number(number) => Some(number.as_i64().and_then(|v| i16::try_from(v).ok())),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> KeyedRow {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn required_text_requires_strings() {
        let row = row(json!({ "name": "Foo", "id": 3 }));
        assert_eq!(required_text(&row, "name"), Ok("Foo"));
        assert_eq!(required_text(&row, "id"), Err(SkipReason::MissingField("id")));
        assert_eq!(
            required_text(&row, "absent"),
            Err(SkipReason::MissingField("absent"))
        );
    }

    #[test]
    fn required_i16_rejects_out_of_range_identities() {
        let row = row(json!({ "id": 12, "big": 70000, "text": "12" }));
        assert_eq!(required_i16(&row, "id"), Ok(12));
        assert_eq!(required_i16(&row, "big"), Err(SkipReason::InvalidField("big")));
        assert_eq!(required_i16(&row, "text"), Err(SkipReason::MissingField("text")));
    }

    #[test]
    fn numeric_text_distinguishes_missing_from_unparsable() {
        let row = row(json!({
            "key": "42",
            "number": 7,
            "junk": "forty-two",
            "huge": "40000",
            "null": null
        }));
        assert_eq!(required_numeric_text(&row, "key"), Ok(Some(42)));
        assert_eq!(required_numeric_text(&row, "number"), Ok(Some(7)));
        assert_eq!(required_numeric_text(&row, "junk"), Ok(None));
        assert_eq!(required_numeric_text(&row, "huge"), Ok(None));
        assert_eq!(
            required_numeric_text(&row, "null"),
            Err(SkipReason::MissingField("null"))
        );
        assert_eq!(optional_numeric_text(&row, "junk"), None);
        assert_eq!(optional_numeric_text(&row, "absent"), None);
        assert_eq!(optional_numeric_text(&row, "key"), Some(42));
    }
}
