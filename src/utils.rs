//! Text and URL normalization helpers shared by the importers.

use url::Url;

use crate::constants::documents::{CONTENT_PATH, ENCODED_AMPERSAND, PARENT_DIR_PREFIX};

/// Decode the literal `&amp;` escape in a display name.
///
/// Only the ampersand entity is decoded; other entities pass through untouched.
pub fn decode_ampersand<T: AsRef<str>>(text: T) -> String {
    text.as_ref().replace(ENCODED_AMPERSAND, "&")
}

/// Strip a single leading `../` from a document's relative path.
pub fn strip_parent_prefix(path: &str) -> &str {
    path.strip_prefix(PARENT_DIR_PREFIX).unwrap_or(path)
}

/// Build `<base>/prerelease/content/<path>` for a catalog-relative document path.
///
/// Returns `None` when the result is not an absolute URL, or when dot segments
/// left in the path after stripping one `../` would resolve outside the
/// content root.
pub fn canonical_document_url(base: &str, relative_path: &str) -> Option<Url> {
    let content_root = format!("{}/{CONTENT_PATH}", base.trim_end_matches('/'));
    let url = Url::parse(&format!(
        "{content_root}{}",
        strip_parent_prefix(relative_path)
    ))
    .ok()?;
    let content_root = Url::parse(&content_root).ok()?;
    url.as_str()
        .starts_with(content_root.as_str())
        .then_some(url)
}
