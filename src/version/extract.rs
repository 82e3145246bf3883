//! Asset path extraction from revision logs.
//!
//! A verbose svn log names every changed path on its own line:
//!
//! ```text
//!    M /html/trunk/html/a/app.js
//!    A /html/trunk/html/b/new.css (from /html/trunk/html/b/old.css:97)
//! ```
//!
//! Changed paths start with the repository root, which itself ends in the
//! marker (`/html/trunk/...`), so an asset path shows the marker at least twice.
//! Each line yields at most one path: the text from the LAST occurrence of the
//! marker up to the next whitespace. The repository prefix before it is
//! discarded, and for a copy/move the `(from …)` source is dropped first so the
//! destination is what gets tracked. A line with a single marker names a
//! repository-level entry (`/html/trunk/README`) and yields nothing.

/// Start of the copy-source annotation svn appends to moved paths.
const COPY_FROM: &str = "(from ";

/// Extracts marker-rooted asset paths from log text.
#[derive(Debug, Clone)]
pub struct PathExtractor {
    marker: String,
}

impl PathExtractor {
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }

    /// Lazily yield the paths mentioned in `log`, one per matching line.
    ///
    /// The iterator is cheap to clone, so callers can walk it again.
    pub fn extract<'a>(&'a self, log: &'a str) -> impl Iterator<Item = &'a str> + Clone + 'a {
        log.lines()
            .filter_map(move |line| extract_line(line, &self.marker))
    }
}

/// Path rooted at the final marker occurrence in `line`, if any.
fn extract_line<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    let line = line.find(COPY_FROM).map_or(line, |at| &line[..at]);
    let start = line.rfind(marker)?;
    if !line[..start].contains(marker) {
        return None;
    }
    let rest = &line[start..];
    let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
    let path = &rest[..end];
    (path.len() > marker.len()).then_some(path)
}
