use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

pub use crate::types::{
    DisplayName, DocumentId, FrameworkId, LookupKey, ResourceTypeId, TopicId,
};

/// The four entity kinds held by a record store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    /// `ResourceType` entities.
    ResourceType,
    /// `Framework` entities.
    Framework,
    /// `Topic` entities.
    Topic,
    /// `Document` entities.
    Document,
}

impl EntityKind {
    /// Stable name used in persistence keys and log lines.
    pub const fn as_str(self) -> &'static str {
        match self {
            EntityKind::ResourceType => "resource_types",
            EntityKind::Framework => "frameworks",
            EntityKind::Topic => "topics",
            EntityKind::Document => "documents",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lookup entity classifying documents (sample code, guides, references...).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceType {
    /// Stable identity.
    pub id: ResourceTypeId,
    /// Key documents use to refer to this type.
    pub key: LookupKey,
    /// Display name, `&amp;` decoded.
    pub name: DisplayName,
    /// Presentation order; `0` when the source value did not parse.
    pub sort_order: i16,
}

/// Lookup entity for a framework (the catalog calls these "Technologies").
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Framework {
    /// Stable identity.
    pub id: FrameworkId,
    /// Key documents use to refer to this framework.
    pub key: LookupKey,
    /// Display name, `&amp;` decoded.
    pub name: DisplayName,
}

/// Node of the topic hierarchy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Stable identity.
    pub id: TopicId,
    /// Key documents and child topics use to refer to this topic.
    pub key: LookupKey,
    /// Display name, `&amp;` decoded.
    pub name: DisplayName,
    /// Identity of the parent topic, resolved from its lookup key at import time.
    /// `None` for top-level topics and for parents that could not be resolved.
    pub parent: Option<TopicId>,
}

/// Magnitude of the most recent change to a document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateSize {
    /// Code `0` or any unrecognized code.
    #[default]
    Unknown,
    /// Code `1`.
    Small,
    /// Code `2`.
    Medium,
    /// Code `3`.
    Large,
}

impl UpdateSize {
    /// Map a raw catalog size code, falling back to `Unknown` for unrecognized codes.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => UpdateSize::Small,
            2 => UpdateSize::Medium,
            3 => UpdateSize::Large,
            _ => UpdateSize::Unknown,
        }
    }

    /// Raw catalog code for this size.
    pub const fn code(self) -> i16 {
        match self {
            UpdateSize::Unknown => 0,
            UpdateSize::Small => 1,
            UpdateSize::Medium => 2,
            UpdateSize::Large => 3,
        }
    }
}

/// A catalog document (in practice, a sample code project).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identity.
    pub id: DocumentId,
    /// Display name, `&amp;` decoded.
    pub name: DisplayName,
    /// Absolute canonical URL of the document page.
    pub url: Url,
    /// Primary publication/update date (midnight Pacific time).
    pub date: DateTime<Utc>,
    /// Date shown to readers (midnight Pacific time).
    pub display_date: DateTime<Utc>,
    /// Presentation order; `0` when out of range.
    pub sort_order: i16,
    /// Magnitude of the latest change.
    pub update_size: UpdateSize,
    /// Release the document was last revised in.
    pub release_version: i16,
    /// Raw platform text (read from the display date position).
    pub platform: String,
    /// Resource type; `None` when its lookup key did not resolve.
    pub resource_type: Option<ResourceTypeId>,
    /// Primary topic; `None` when unresolved.
    pub topic: Option<TopicId>,
    /// Secondary topic; `None` when unresolved.
    pub sub_topic: Option<TopicId>,
    /// Framework; `None` when unresolved.
    pub framework: Option<FrameworkId>,
}
