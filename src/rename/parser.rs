//! FileBot output parser
//!
//! FileBot has no machine-readable dry-run format. Rename lines look like
//!
//! ```text
//! [TEST] /downloads/show.s01e01.mkv -> /media/Show/Season 01/Show - S01E01.mkv
//! ```
//!
//! Every line without the arrow separator is informational and skipped.

use crate::models::RenameSuggestion;

/// Separator between old and new path
pub const SEPARATOR: &str = " -> ";

/// Prefix FileBot puts on dry-run lines
pub const TEST_MARKER: &str = "[TEST]";

/// Parse FileBot stdout into rename suggestions, in order of appearance.
pub fn parse_output(output: &str) -> Vec<RenameSuggestion> {
    output.lines().filter_map(parse_line).collect()
}

/// Parse one `old -> new` line.
///
/// Only the first two segments count; anything after a second separator is
/// ignored.
pub fn parse_line(line: &str) -> Option<RenameSuggestion> {
    let mut parts = line.split(SEPARATOR);
    let old = parts.next()?;
    let new = parts.next()?;

    let old = strip_test_marker(old.trim()).trim();
    let new = new.trim();

    if old.is_empty() || new.is_empty() {
        return None;
    }

    Some(RenameSuggestion {
        old_path: old.to_string(),
        new_path: new.to_string(),
    })
}

fn strip_test_marker(path: &str) -> &str {
    path.strip_prefix(TEST_MARKER)
        .map(str::trim_start)
        .unwrap_or(path)
}
