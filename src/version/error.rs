//! Versioning error types.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors of the versioning stage.
///
/// Per-revision log failures are not here: they degrade to "no paths changed".
#[derive(Debug, Error)]
pub enum VersionError {
    #[error("revision map `{0}` could not be read")]
    MapMissing(PathBuf, #[source] std::io::Error),

    #[error("revision map `{0}` is not valid JSON")]
    MapCorrupt(PathBuf, #[source] serde_json::Error),

    #[error("head revision unavailable: {0}")]
    HeadRevision(String),

    #[error("look-back window must cover at least one revision")]
    EmptyWindow,

    #[error("screens directory `{0}` not found")]
    ScreensMissing(PathBuf),
}
