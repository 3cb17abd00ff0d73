/// Constants describing the raw catalog document layout.
pub mod schema {
    /// Top-level key holding the list of named sections.
    pub const SECTIONS_KEY: &str = "topics";
    /// Top-level key holding the flat document table.
    pub const DOCUMENTS_KEY: &str = "documents";
    /// Top-level key holding the column-name to index map.
    pub const COLUMNS_KEY: &str = "columns";
    /// Section field carrying the section label.
    pub const SECTION_NAME_KEY: &str = "name";
    /// Section field carrying the nested rows.
    pub const SECTION_CONTENTS_KEY: &str = "contents";

    /// Section label for resource types.
    pub const RESOURCE_TYPES_LABEL: &str = "Resource Types";
    /// Section label for frameworks.
    pub const FRAMEWORKS_LABEL: &str = "Technologies";
    /// Section label for topics.
    pub const TOPICS_LABEL: &str = "Topics";
}

/// Field names used by keyed section rows.
pub mod fields {
    /// Display name field.
    pub const NAME: &str = "name";
    /// Identity field.
    pub const ID: &str = "id";
    /// Lookup key field.
    pub const KEY: &str = "key";
    /// Resource type sort order field.
    pub const SORT_ORDER: &str = "sortOrder";
    /// Topic parent lookup key field.
    pub const PARENT: &str = "parent";
}

/// Fallback values used when secondary numeric fields do not parse.
pub mod fallback {
    use crate::types::LookupKey;

    /// Lookup key recorded when the source value is not a valid `i16`.
    pub const LOOKUP_KEY: LookupKey = -1;
    /// Sort order recorded when the source value is not a valid `i16`.
    pub const SORT_ORDER: i16 = 0;
}

/// Constants used by document normalization.
pub mod documents {
    /// Display name of the resource type whose documents are imported.
    pub const SAMPLE_CODE_LABEL: &str = "Sample Code";
    /// Default root for canonical document URLs.
    pub const DEFAULT_BASE_URL: &str = "https://developer.apple.com/library";
    /// Path segment inserted between the base URL and a document's relative path.
    pub const CONTENT_PATH: &str = "prerelease/content/";
    /// Relative prefix stripped from document paths.
    pub const PARENT_DIR_PREFIX: &str = "../";
    /// Encoded ampersand decoded in display names.
    pub const ENCODED_AMPERSAND: &str = "&amp;";
    /// Date pattern shared by both document date fields.
    pub const DATE_FORMAT: &str = "%Y-%m-%d";
}

/// Constants used by the file-backed record store.
pub mod store {
    /// Version tag for persisted collection payloads.
    pub const COLLECTION_RECORD_VERSION: u8 = 1;
    /// Version tag for store metadata compatibility checks.
    pub const STORE_VERSION: u8 = 1;
    /// Prefix marker for bitcode-encoded payloads.
    pub const BITCODE_PREFIX: u8 = b'B';
    /// Key used for store-level metadata.
    pub const META_KEY: &[u8] = b"__meta__";
    /// Key prefix for persisted collections.
    pub const COLLECTION_PREFIX: &[u8] = b"collection:";
    /// Default directory for persisted catalog stores.
    pub const DEFAULT_STORE_DIR: &str = ".catalog_store";
    /// Default filename for persisted catalog stores.
    pub const DEFAULT_STORE_FILENAME: &str = "catalog_store.bin";
}

/// Constants used by the pipeline orchestrator.
pub mod pipeline {
    /// Thread name used for background ingestion passes.
    pub const WORKER_THREAD_NAME: &str = "catalog-ingest";
}
