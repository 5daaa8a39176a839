//! Shareable file links.

use super::encoding;
use super::FileKey;

/// Formats `<base>/file/<handle>#<key>`.
///
/// The key travels in the fragment, so it is never sent to the web server
/// serving `base`.
pub fn build(base: &str, handle: &str, file_key: &FileKey) -> String {
    format!(
        "{}/file/{handle}#{}",
        base.trim_end_matches('/'),
        encoding::encode(file_key.as_bytes())
    )
}
