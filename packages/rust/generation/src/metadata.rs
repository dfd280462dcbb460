//! Extraction of fixed-prefix metadata lines from generated text.

use researchpress_shared::strip_prefix_ci;

/// Prefix of the title line.
pub const TITLE_PREFIX: &str = "Title:";

/// Prefix of the meta description line.
pub const META_DESCRIPTION_PREFIX: &str = "Meta Description:";

/// Scan `text` for the title and meta description lines.
///
/// The first matching line wins for each field, and scanning stops as soon as
/// both are known. Missing fields come back empty.
pub fn extract_metadata(text: &str) -> (String, String) {
    let mut title = String::new();
    let mut meta_description = String::new();

    for line in text.lines() {
        let line = line.trim();

        if title.is_empty() {
            if let Some(value) = strip_prefix_ci(line, TITLE_PREFIX) {
                title = value.to_string();
            }
        }
        if meta_description.is_empty() {
            if let Some(value) = strip_prefix_ci(line, META_DESCRIPTION_PREFIX) {
                meta_description = value.to_string();
            }
        }

        if !title.is_empty() && !meta_description.is_empty() {
            break;
        }
    }

    (title, meta_description)
}
