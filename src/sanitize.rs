//! Path sanitization
//!
//! Every path that reaches FileBot's argument vector or a qBittorrent form
//! field goes through [`sanitize`] first. The pipeline is:
//!
//! 1. lexical normalization (`a//b/./c/../d` → `a/b/d`)
//! 2. shell metacharacter removal
//! 3. removal of every remaining `..` sequence

use thiserror::Error;

/// Characters stripped from every path.
pub const DENYLIST: &[char] = &[';', '&', '|', '`', '$', '(', ')', '{', '}', '[', ']', '<', '>'];

/// Parent-directory traversal sequence.
pub const TRAVERSAL: &str = "..";

/// Path sanitization errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SanitizeError {
    #[error("Invalid file path")]
    Empty,

    #[error("Invalid file path after sanitization")]
    EmptyAfterSanitization,
}

/// Sanitize a path for use as a subprocess argument or API field.
pub fn sanitize(path: &str) -> Result<String, SanitizeError> {
    if path.is_empty() {
        return Err(SanitizeError::Empty);
    }

    let normalized = normalize(path);
    let stripped: String = normalized.chars().filter(|c| !DENYLIST.contains(c)).collect();
    let sanitized = collapse_separators(&stripped.replace(TRAVERSAL, ""));

    if sanitized.is_empty() {
        return Err(SanitizeError::EmptyAfterSanitization);
    }

    Ok(sanitized)
}

/// True if a path still contains a traversal sequence.
///
/// [`sanitize`] never returns such a path, but callers re-check before
/// trusting a value.
pub fn contains_traversal(path: &str) -> bool {
    path.contains(TRAVERSAL)
}

/// Lexically normalize a POSIX path.
///
/// Empty and `.` segments are dropped and `name/..` pairs resolved. Leading
/// `..` segments of a relative path are kept; for absolute paths they are
/// dropped since `/..` is `/`. A trailing separator survives.
pub fn normalize(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let absolute = path.starts_with('/');
    let trailing = path.len() > 1 && path.ends_with('/');

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if !absolute => segments.push(".."),
                _ => {}
            },
            other => segments.push(other),
        }
    }

    let mut out = segments.join("/");
    if absolute {
        out.insert(0, '/');
    }
    if out.is_empty() {
        return ".".to_string();
    }
    if trailing && out != "/" {
        out.push('/');
    }
    out
}

/// Collapse runs of `/` left behind after stripping.
fn collapse_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if !previous_slash {
                out.push(c);
            }
            previous_slash = true;
        } else {
            out.push(c);
            previous_slash = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_segments() {
        assert_eq!(normalize("a//b/./c/../d"), "a/b/d");
        assert_eq!(normalize("/downloads/./show/"), "/downloads/show/");
        assert_eq!(normalize("/.."), "/");
        assert_eq!(normalize("../x"), "../x");
        assert_eq!(normalize("a/.."), ".");
    }

    #[test]
    fn test_sanitize_keeps_plain_paths() {
        assert_eq!(
            sanitize("Show/Season 1/show.s01e01.mkv").unwrap(),
            "Show/Season 1/show.s01e01.mkv"
        );
        assert_eq!(sanitize("/downloads/movie.mkv").unwrap(), "/downloads/movie.mkv");
    }

    #[test]
    fn test_sanitize_strips_metacharacters() {
        assert_eq!(sanitize("movie;rm -rf.mkv").unwrap(), "movierm -rf.mkv");
        assert_eq!(sanitize("$(whoami).mkv").unwrap(), "whoami.mkv");
        assert_eq!(sanitize("[Group] Show.mkv").unwrap(), "Group Show.mkv");
    }

    #[test]
    fn test_sanitize_removes_traversal() {
        assert_eq!(sanitize("../../etc/passwd").unwrap(), "/etc/passwd");
        assert!(!contains_traversal(&sanitize(".;./secret").unwrap()));
        assert!(!contains_traversal(&sanitize("a/....//b").unwrap()));
    }

    #[test]
    fn test_sanitize_rejects_empty() {
        assert_eq!(sanitize(""), Err(SanitizeError::Empty));
        assert_eq!(sanitize(".."), Err(SanitizeError::EmptyAfterSanitization));
        assert_eq!(sanitize(";&|"), Err(SanitizeError::EmptyAfterSanitization));
    }
}
