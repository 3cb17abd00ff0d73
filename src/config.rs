use std::borrow::Cow;

use url::Url;

use crate::constants::documents::{DEFAULT_BASE_URL, SAMPLE_CODE_LABEL};
use crate::errors::IngestError;

/// How a topic's parent lookup key is resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParentResolution {
    /// Resolve against topics already visible when the row is processed.
    ///
    /// A parent listed later in the source than its child stays unresolved.
    #[default]
    SourceOrder,
    /// Retry unresolved parents once every topic row has been upserted.
    AfterAllTopics,
}

/// Top-level ingestion configuration.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Root prepended to every document's relative path.
    pub base_url: Cow<'static, str>,
    /// Display name of the resource type whose documents are imported.
    pub sample_code_label: Cow<'static, str>,
    /// Compare the document column map against the positional decoding table.
    ///
    /// Mismatches are reported and logged; they never fail the pass.
    pub validate_columns: bool,
    /// Topic parent resolution policy.
    pub parent_resolution: ParentResolution,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            base_url: Cow::Borrowed(DEFAULT_BASE_URL),
            sample_code_label: Cow::Borrowed(SAMPLE_CODE_LABEL),
            validate_columns: true,
            parent_resolution: ParentResolution::SourceOrder,
        }
    }
}

impl IngestConfig {
    /// Override the canonical URL root.
    pub fn with_base_url(mut self, base_url: impl Into<Cow<'static, str>>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the resource type label used to filter documents.
    pub fn with_sample_code_label(mut self, label: impl Into<Cow<'static, str>>) -> Self {
        self.sample_code_label = label.into();
        self
    }

    /// Enable or disable column map validation.
    pub fn with_validate_columns(mut self, validate: bool) -> Self {
        self.validate_columns = validate;
        self
    }

    /// Override the topic parent resolution policy.
    pub fn with_parent_resolution(mut self, policy: ParentResolution) -> Self {
        self.parent_resolution = policy;
        self
    }

    /// Check that the configuration can produce canonical URLs.
    pub fn validated(self) -> Result<Self, IngestError> {
        let parsed = Url::parse(&self.base_url).map_err(|err| {
            IngestError::Configuration(format!("invalid base url '{}': {err}", self.base_url))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(IngestError::Configuration(format!(
                "base url '{}' cannot be used as a base",
                self.base_url
            )));
        }
        if self.sample_code_label.trim().is_empty() {
            return Err(IngestError::Configuration(
                "sample code label must not be empty".to_string(),
            ));
        }
        Ok(self)
    }
}
