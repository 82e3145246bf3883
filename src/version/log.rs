//! Revision log access.
//!
//! The updater only needs two questions answered by source control: what the
//! head revision is, and which lines of a single revision's verbose log mention
//! static assets. [`SvnLog`] answers them by running the `svn` client.

use super::{Revision, VersionError};
use crate::{exec, log};
use anyhow::Result;
use regex::Regex;
use std::path::PathBuf;

/// Query interface over source-control history.
pub trait RevisionLog {
    /// Current head revision. Resolved once per update cycle.
    fn head_revision(&self) -> Result<Revision>;

    /// Asset-related log lines of a single revision.
    ///
    /// Backend failures degrade to an empty string: a revision that can't be
    /// queried is treated as one that changed no assets.
    fn log(&self, rev: Revision) -> String;
}

/// `svn` command line backend.
#[derive(Debug)]
pub struct SvnLog {
    command: Vec<String>,
    target: PathBuf,
    filter: Regex,
}

impl SvnLog {
    /// Query `target` (a working copy or URL) with `command`, keeping log lines
    /// matching `filter`.
    pub fn new(command: Vec<String>, target: impl Into<PathBuf>, filter: &str) -> Result<Self> {
        Ok(Self {
            command,
            target: target.into(),
            filter: Regex::new(filter)?,
        })
    }

    fn filter_lines(&self, log: &str) -> String {
        log.lines()
            .filter(|line| self.filter.is_match(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl RevisionLog for SvnLog {
    fn head_revision(&self) -> Result<Revision> {
        let output = exec!(&self.command; "info", self.target.as_os_str())
            .map_err(|err| VersionError::HeadRevision(format!("{err:#}")))?;
        let info = String::from_utf8_lossy(&output.stdout);
        parse_info_revision(&info).ok_or_else(|| {
            VersionError::HeadRevision(format!(
                "no `Revision:` line in `svn info {}`",
                self.target.display()
            ))
            .into()
        })
    }

    fn log(&self, rev: Revision) -> String {
        let rev_arg = rev.to_string();
        match exec!(&self.command; "log", "--verbose", "-r", rev_arg, self.target.as_os_str()) {
            Ok(output) => self.filter_lines(&String::from_utf8_lossy(&output.stdout)),
            Err(err) => {
                log!("svn"; "r{rev} skipped: {err:#}");
                String::new()
            }
        }
    }
}

/// Read the `Revision: N` line of `svn info` output.
fn parse_info_revision(info: &str) -> Option<Revision> {
    info.lines()
        .find_map(|line| line.strip_prefix("Revision:"))
        .and_then(|rev| rev.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INFO: &str = "\
Path: .
Working Copy Root Path: /usr/local/app
URL: svn://svn.example.com/html/trunk
Relative URL: ^/html/trunk
Repository Root: svn://svn.example.com
Revision: 100
Node Kind: directory
Last Changed Rev: 98
";

    #[test]
    fn test_parse_info_revision() {
        assert_eq!(parse_info_revision(INFO), Some(100));
    }

    #[test]
    fn test_parse_info_revision_ignores_last_changed() {
        assert_eq!(parse_info_revision("Last Changed Rev: 98\n"), None);
        assert_eq!(parse_info_revision("Revision: abc\n"), None);
        assert_eq!(parse_info_revision(""), None);
    }

    #[test]
    fn test_filter_lines() {
        let svn = SvnLog::new(vec!["svn".into()], "/usr/local/app", r"assets/.*\.js|css").unwrap();
        let log = "\
r97 | alice | 2024-02-01 10:00:00 +0000 | 1 line
Changed paths:
   M /html/trunk/assets/js/html/a/app.js
   M /html/trunk/README
   M /html/trunk/assets/css/html/b/style.css

fix menu
";
        assert_eq!(
            svn.filter_lines(log),
            "   M /html/trunk/assets/js/html/a/app.js\n   M /html/trunk/assets/css/html/b/style.css"
        );
    }

    #[test]
    fn test_invalid_filter() {
        assert!(SvnLog::new(vec!["svn".into()], ".", "assets/(").is_err());
    }

    #[test]
    fn test_failing_backend_yields_empty_log() {
        let svn = SvnLog::new(
            vec!["revstamp-no-such-vcs".into()],
            "/usr/local/app",
            "css",
        )
        .unwrap();
        assert_eq!(svn.log(42), "");
        assert!(svn.head_revision().is_err());
    }
}
