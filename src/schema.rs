//! Locate the typed pieces of a raw catalog document.
//!
//! The raw document is loosely typed JSON. Extraction checks only the shape of
//! the five required pieces; per-row field checks belong to the importers.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::constants::schema::{
    COLUMNS_KEY, DOCUMENTS_KEY, FRAMEWORKS_LABEL, RESOURCE_TYPES_LABEL, SECTION_CONTENTS_KEY,
    SECTION_NAME_KEY, SECTIONS_KEY, TOPICS_LABEL,
};
use crate::errors::SchemaError;
use crate::types::ColumnName;

/// A row of a named section, keyed by field name.
pub type KeyedRow = Map<String, Value>;
/// A row of the document table, decoded by position.
pub type PositionalRow = Vec<Value>;

/// The five pieces of a catalog document the pipeline consumes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogSchema {
    /// Contents of the `Resource Types` section.
    pub resource_types: Vec<KeyedRow>,
    /// Contents of the `Technologies` section.
    pub frameworks: Vec<KeyedRow>,
    /// Contents of the `Topics` section.
    pub topics: Vec<KeyedRow>,
    /// The positional document table.
    pub documents: Vec<PositionalRow>,
    /// Column name to position, in source order.
    pub columns: IndexMap<ColumnName, usize>,
}

/// Extract the section contents, document table, and column map from `raw`.
///
/// When several sections share a label, the first one wins.
pub fn extract(raw: &Value) -> Result<CatalogSchema, SchemaError> {
    let root = raw.as_object().ok_or(SchemaError::NotAnObject)?;
    let sections = sections(root)?;
    Ok(CatalogSchema {
        resource_types: section_contents(&sections, RESOURCE_TYPES_LABEL)?,
        frameworks: section_contents(&sections, FRAMEWORKS_LABEL)?,
        topics: section_contents(&sections, TOPICS_LABEL)?,
        documents: documents(root)?,
        columns: columns(root)?,
    })
}

fn sections(root: &Map<String, Value>) -> Result<Vec<&Map<String, Value>>, SchemaError> {
    root.get(SECTIONS_KEY)
        .and_then(Value::as_array)
        .and_then(|items| items.iter().map(Value::as_object).collect::<Option<Vec<_>>>())
        .ok_or(SchemaError::MissingSectionList(SECTIONS_KEY))
}

fn section_contents(
    sections: &[&Map<String, Value>],
    label: &'static str,
) -> Result<Vec<KeyedRow>, SchemaError> {
    sections
        .iter()
        .find(|section| section.get(SECTION_NAME_KEY).and_then(Value::as_str) == Some(label))
        .and_then(|section| section.get(SECTION_CONTENTS_KEY))
        .and_then(Value::as_array)
        .and_then(|rows| {
            rows.iter()
                .map(|row| row.as_object().cloned())
                .collect::<Option<Vec<_>>>()
        })
        .ok_or(SchemaError::MissingSection(label))
}

fn documents(root: &Map<String, Value>) -> Result<Vec<PositionalRow>, SchemaError> {
    root.get(DOCUMENTS_KEY)
        .and_then(Value::as_array)
        .and_then(|rows| {
            rows.iter()
                .map(|row| row.as_array().cloned())
                .collect::<Option<Vec<_>>>()
        })
        .ok_or(SchemaError::MissingDocuments(DOCUMENTS_KEY))
}

fn columns(root: &Map<String, Value>) -> Result<IndexMap<ColumnName, usize>, SchemaError> {
    root.get(COLUMNS_KEY)
        .and_then(Value::as_object)
        .and_then(|map| {
            map.iter()
                .map(|(name, position)| {
                    let position = usize::try_from(position.as_u64()?).ok()?;
                    Some((name.clone(), position))
                })
                .collect::<Option<IndexMap<_, _>>>()
        })
        .ok_or(SchemaError::MissingColumns(COLUMNS_KEY))
}
