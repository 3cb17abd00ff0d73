/// Stable resource type identifier (used for upsert across passes).
/// Example: `rt-sample-code`
pub type ResourceTypeId = String;
/// Stable framework identifier.
/// Example: `12`
pub type FrameworkId = i16;
/// Stable topic identifier.
/// Example: `3`
pub type TopicId = i16;
/// Stable document identifier.
/// Example: `TP40016241`
pub type DocumentId = String;
/// Import-scoped surrogate key used to resolve cross-entity references.
///
/// Only meaningful within a single ingestion pass; never an identity.
pub type LookupKey = i16;
/// Display name after text normalization.
/// Example: `Audio & Video`
pub type DisplayName = String;
/// Name of a column in the catalog's column map.
/// Examples: `name`, `displayDate`
pub type ColumnName = String;
