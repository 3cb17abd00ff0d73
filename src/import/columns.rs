//! Positional decoding table for document rows.
//!
//! Documents are decoded by fixed position. The catalog's column map is read
//! only to report where it disagrees with this table.

use indexmap::IndexMap;

use crate::report::ColumnMismatch;
use crate::types::ColumnName;

/// A field decoded from a document row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DocumentField {
    /// Display name.
    Name,
    /// Document identity.
    Id,
    /// Resource type lookup key.
    ResourceType,
    /// Publication date.
    Date,
    /// Update size code.
    UpdateSize,
    /// Primary topic lookup key.
    Topic,
    /// Framework lookup key.
    Framework,
    /// Release version.
    Release,
    /// Secondary topic lookup key.
    SubTopic,
    /// Catalog-relative path.
    Url,
    /// Sort order.
    SortOrder,
    /// Date shown to readers.
    DisplayDate,
    /// Platform text.
    Platform,
}

/// Where a document field is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DocumentColumn {
    /// Field decoded from this column.
    pub field: DocumentField,
    /// Name of the column in the catalog's column map.
    pub column: &'static str,
    /// Position within a document row.
    pub position: usize,
}

const fn column(field: DocumentField, column: &'static str, position: usize) -> DocumentColumn {
    DocumentColumn {
        field,
        column,
        position,
    }
}

/// Fixed decoding order for document rows, one entry per `DocumentField` in variant order.
pub static DOCUMENT_COLUMNS: [DocumentColumn; 13] = [
    column(DocumentField::Name, "name", 0),
    column(DocumentField::Id, "id", 1),
    column(DocumentField::ResourceType, "type", 2),
    column(DocumentField::Date, "date", 3),
    column(DocumentField::UpdateSize, "updateSize", 4),
    column(DocumentField::Topic, "topic", 5),
    column(DocumentField::Framework, "framework", 6),
    column(DocumentField::Release, "release", 7),
    column(DocumentField::SubTopic, "subtopic", 8),
    column(DocumentField::Url, "url", 9),
    column(DocumentField::SortOrder, "sortOrder", 10),
    column(DocumentField::DisplayDate, "displayDate", 11),
    // FIXME: platform is read from the display date position. Catalog rows
    // appear to carry a real platform column after it; move this once the
    // column map drives decoding.
    column(DocumentField::Platform, "platform", 11),
];

impl DocumentField {
    /// Table entry for this field.
    pub fn column(self) -> &'static DocumentColumn {
        // Table rows are listed in variant order.
        &DOCUMENT_COLUMNS[self as usize]
    }

    /// Row position this field is read from.
    pub fn position(self) -> usize {
        self.column().position
    }

    /// Column name used in skip reasons and column-map checks.
    pub fn name(self) -> &'static str {
        self.column().column
    }
}

/// Compare a catalog column map with `DOCUMENT_COLUMNS`.
///
/// Returns mismatches in table order followed by unused columns in map order.
pub fn validate_column_map(columns: &IndexMap<ColumnName, usize>) -> Vec<ColumnMismatch> {
    let mut mismatches = Vec::new();
    for entry in &DOCUMENT_COLUMNS {
        match columns.get(entry.column) {
            None => mismatches.push(ColumnMismatch::Missing {
                column: entry.column,
                expected: entry.position,
            }),
            Some(&actual) if actual != entry.position => mismatches.push(ColumnMismatch::Moved {
                column: entry.column,
                expected: entry.position,
                actual,
            }),
            Some(_) => {}
        }
    }
    for (name, &position) in columns {
        if !DOCUMENT_COLUMNS.iter().any(|entry| entry.column == name) {
            mismatches.push(ColumnMismatch::Unused {
                column: name.clone(),
                position,
            });
        }
    }
    mismatches
}
