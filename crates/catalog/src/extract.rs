//! Field extraction from the HTML fragments the catalog returns in its
//! search results.

use memchr::memmem;

use crate::consts::{FILENAME_IN_HTML_REGEX, TITLE_MARKER};
use crate::models::IrdFilename;

/// Extracts the IRD filename from the catalog's filename cell.
///
/// The cell holds a download link such as `<a href="ird/BLES01234-1A2B.ird">`;
/// the first `ird/<filename>` occurrence wins, and the filename keeps the
/// case it has in the HTML.
///
/// # Examples
///
/// ```rust
/// use ird_catalog::extract;
/// let html = r#"<a href="ird/ABCD12345-FF00.ird">download</a>"#;
/// assert_eq!(extract::filename(html).unwrap().as_str(), "ABCD12345-FF00.ird");
/// assert!(extract::filename("<span>no link</span>").is_none());
/// ```
pub fn filename(html: &str) -> Option<IrdFilename> {
    if html.is_empty() {
        return None;
    }
    FILENAME_IN_HTML_REGEX
        .captures(html)
        .and_then(|captures| captures.name("filename"))
        .map(|filename| IrdFilename::new(filename.as_str()))
}

/// Extracts the plain title from the catalog's title cell.
///
/// The cell decorates the title with `<span>` badges (region, flags); the
/// title is whatever follows the last `</span>`, trimmed. Cells without
/// a `</span>` are taken whole.
///
/// # Examples
///
/// ```rust
/// use ird_catalog::extract;
/// assert_eq!(extract::title("<span>EU</span> Game Title ").as_deref(), Some("Game Title"));
/// assert_eq!(extract::title("Plain Title").as_deref(), Some("Plain Title"));
/// assert_eq!(extract::title("   "), None);
/// ```
pub fn title(html: &str) -> Option<String> {
    // The marker is ASCII, so the byte position after it is a char boundary.
    let title = match memmem::rfind(html.as_bytes(), TITLE_MARKER) {
        Some(position) => &html[position + TITLE_MARKER.len()..],
        None => html,
    };
    let title = title.trim();
    (!title.is_empty()).then(|| title.to_string())
}
