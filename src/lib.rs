#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Ingestion configuration types.
pub mod config;
/// Centralized constants used across the schema, importers, and stores.
pub mod constants;
/// Entity types produced by ingestion.
pub mod data;
/// Catalog date parsing in US Pacific time.
pub mod dates;
/// Phase importers for each entity kind.
pub mod import;
/// Pass orchestration, synchronous and on a worker thread.
pub mod pipeline;
/// Row, phase, and pass outcomes.
pub mod report;
/// Raw catalog document extraction.
pub mod schema;
/// Record stores and dual-indexed collections.
pub mod store;
/// Shared type aliases.
pub mod types;
/// Text and URL normalization helpers.
pub mod utils;

mod errors;

pub use config::{IngestConfig, ParentResolution};
pub use data::{Document, EntityKind, Framework, ResourceType, Topic, UpdateSize};
pub use errors::{IngestError, SchemaError};
pub use pipeline::{CatalogPipeline, PassHandle};
pub use report::{
    ColumnMismatch, PassReport, PhaseReport, PhaseStatus, RowOutcome, SkipReason, SkippedRow,
};
pub use schema::{CatalogSchema, KeyedRow, PositionalRow, extract};
pub use store::{
    Catalog, Collection, Entity, FileRecordStore, MemoryRecordStore, RecordStore, Transaction,
    UpsertOutcome,
};
pub use types::{
    ColumnName, DisplayName, DocumentId, FrameworkId, LookupKey, ResourceTypeId, TopicId,
};
