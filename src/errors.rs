use std::io;

use thiserror::Error;

/// Failure to locate one of the required top-level pieces of a catalog document.
///
/// Any of these aborts the whole pass before a single phase runs.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The root value is not an object.
    #[error("catalog document is not a JSON object")]
    NotAnObject,
    /// The section list is absent or malformed.
    #[error("section list '{0}' is missing or not an array of objects")]
    MissingSectionList(&'static str),
    /// A labelled section is absent or malformed.
    #[error("section '{0}' is missing or its contents are not an array of objects")]
    MissingSection(&'static str),
    /// The document table is absent or malformed.
    #[error("document table '{0}' is missing or not an array of arrays")]
    MissingDocuments(&'static str),
    /// The column map is absent or malformed.
    #[error("column map '{0}' is missing or not an object of column indexes")]
    MissingColumns(&'static str),
}

/// Error type for extraction, persistence, and worker failures.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The catalog document failed extraction.
    #[error("unexpected data: {0}")]
    UnexpectedData(#[from] SchemaError),
    /// The record store failed to read or write.
    #[error("record store failure: {0}")]
    Store(String),
    /// Filesystem failure outside the store engine.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Raw input is not JSON.
    #[error("catalog document is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    /// Configuration rejected by `IngestConfig::validated`.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The background pass panicked.
    #[error("ingestion worker stopped unexpectedly")]
    WorkerPanicked,
}
