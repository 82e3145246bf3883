//! Cache-busting reference rewriting.
//!
//! Every literal occurrence of a tracked path in a screen document becomes
//! `path?v=<rev>`. An occurrence that already carries `?v=<digits>` gets its
//! revision replaced instead of a second suffix, so rewriting is idempotent and
//! refreshes stale markers.

use super::{Revision, RevisionMap, VersionError};
use crate::{
    log,
    pipeline::{collect_files, has_extension},
    utils::size::Savings,
};
use anyhow::{Context, Result};
use regex::{Captures, Regex, RegexBuilder};
use std::{
    borrow::Cow,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

/// Query parameter carrying the revision.
const VERSION_PARAM: &str = "?v=";

/// Compiled path set large maps still fit in.
const PATTERN_SIZE_LIMIT: usize = 64 * 1024 * 1024;

/// Rewrites tracked asset references in text.
#[derive(Debug)]
pub struct Rewriter {
    /// `None` for an empty map.
    pattern: Option<Regex>,
    revisions: HashMap<String, Revision>,
}

/// Result of rewriting one screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    /// Path relative to the screens directory.
    pub path: PathBuf,
    /// Number of references versioned.
    pub replaced: usize,
    pub savings: Savings,
}

impl Rewriter {
    /// Compile the tracked paths of `map` into a single scanner.
    pub fn new(map: &RevisionMap) -> Result<Self> {
        let revisions: HashMap<String, Revision> = map
            .iter()
            .map(|(path, entry)| (path.to_owned(), entry.rev))
            .collect();

        if revisions.is_empty() {
            return Ok(Self {
                pattern: None,
                revisions,
            });
        }

        // Longest first: alternation is leftmost-first, so a path that extends
        // another one must be tried before it.
        let mut paths: Vec<&str> = revisions.keys().map(String::as_str).collect();
        paths.sort_unstable_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let alternation = paths
            .iter()
            .map(|path| regex::escape(path))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&format!(r"(?P<path>{alternation})(?:\?v=[0-9]+)?"))
            .size_limit(PATTERN_SIZE_LIMIT)
            .build()
            .context("Failed to compile tracked paths")?;

        Ok(Self {
            pattern: Some(pattern),
            revisions,
        })
    }

    /// Version every tracked reference in `content`.
    ///
    /// Returns the rewritten text and the number of references versioned.
    pub fn rewrite<'a>(&self, content: &'a str) -> (Cow<'a, str>, usize) {
        let Some(pattern) = &self.pattern else {
            return (Cow::Borrowed(content), 0);
        };

        let mut replaced = 0;
        let rewritten = pattern.replace_all(content, |caps: &Captures| {
            let path = &caps["path"];
            match self.revisions.get(path) {
                Some(rev) => {
                    replaced += 1;
                    format!("{path}{VERSION_PARAM}{rev}")
                }
                None => caps[0].to_owned(),
            }
        });
        (rewritten, replaced)
    }
}

/// Rewrite every screen under `src_dir` into the mirrored path under `dest_dir`.
///
/// Only files whose extension is listed in `extensions` are touched. A missing
/// screens directory is a configuration error.
pub fn rewrite_screens(
    rewriter: &Rewriter,
    src_dir: &Path,
    dest_dir: &Path,
    extensions: &[String],
) -> Result<Vec<DocumentReport>> {
    if !src_dir.is_dir() {
        return Err(VersionError::ScreensMissing(src_dir.to_path_buf()).into());
    }

    let screens = collect_files(src_dir)
        .into_iter()
        .filter(|path| has_extension(path, extensions));

    let mut reports = Vec::new();
    for source in screens {
        let relative = source.strip_prefix(src_dir)?.to_path_buf();
        let content = fs::read_to_string(&source)
            .with_context(|| format!("Failed to read screen {}", source.display()))?;

        let (rewritten, replaced) = rewriter.rewrite(&content);

        let dest = dest_dir.join(&relative);
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, rewritten.as_bytes())
            .with_context(|| format!("Failed to write screen {}", dest.display()))?;

        let report = DocumentReport {
            path: relative,
            replaced,
            savings: Savings::new(content.len(), rewritten.len()),
        };
        log!("version"; "{} ({} refs) {}", report.path.display(), report.replaced, report.savings);
        reports.push(report);
    }

    Ok(reports)
}
