//! `[version]` section configuration.
//!
//! Controls how the revision map is maintained and which screens get rewritten.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[version]` section in revstamp.toml.
///
/// # Example
/// ```toml
/// [version]
/// map = "data/path_to_rev_map.json"
/// look_back = 6
/// marker = "/html/"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct VersionConfig {
    /// Persisted revision map (JSON). Must exist before the first run.
    #[serde(default = "defaults::version::map")]
    #[educe(Default = defaults::version::map())]
    pub map: PathBuf,

    /// Number of revisions, ending at head, re-scanned on every run.
    #[serde(default = "defaults::version::look_back")]
    #[educe(Default = defaults::version::look_back())]
    pub look_back: u64,

    /// Directory marker that roots asset paths inside log lines and screens.
    #[serde(default = "defaults::version::marker")]
    #[educe(Default = defaults::version::marker())]
    pub marker: String,

    /// Regex selecting the log lines that mention static assets.
    #[serde(default = "defaults::version::log_filter")]
    #[educe(Default = defaults::version::log_filter())]
    pub log_filter: String,

    /// Screens directory, relative to `[build].assets` (and mirrored under output).
    #[serde(default = "defaults::version::screens")]
    #[educe(Default = defaults::version::screens())]
    pub screens: PathBuf,

    /// Screen document extensions.
    #[serde(default = "defaults::version::extensions")]
    #[educe(Default = defaults::version::extensions())]
    pub extensions: Vec<String>,

    /// Version control command.
    #[serde(default = "defaults::version::vcs")]
    #[educe(Default = defaults::version::vcs())]
    pub vcs: Vec<String>,
}
