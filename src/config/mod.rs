//! Pipeline configuration management for `revstamp.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                          |
//! |--------------|--------------------------------------------------|
//! | `[build]`    | Static roots, gzip, optimizer commands per stage |
//! | `[version]`  | Revision map, look-back window, screens          |
//!
//! # Example
//!
//! ```toml
//! [build]
//! assets = "assets"
//! output = "assets.min"
//!
//! [build.styles]
//! commands = [["csso"]]
//!
//! [version]
//! map = "data/path_to_rev_map.json"
//! look_back = 6
//! ```

mod build;
pub mod defaults;
mod error;
mod version;

use build::BuildConfig;
use error::ConfigError;
use version::VersionConfig;

use crate::cli::Cli;
use anyhow::{Context, Result, bail};
use educe::Educe;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing revstamp.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Versioning settings
    #[serde(default)]
    pub version: VersionConfig,
}

impl Config {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::Toml)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content).with_context(|| format!("Failed to load `{}`", path.display()))
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf());
    }

    /// Source directory for a static subtree (`css`, `js`, ...).
    pub fn src_dir(&self, sub: impl AsRef<Path>) -> PathBuf {
        self.build.assets.join(sub)
    }

    /// Destination directory for a static subtree.
    pub fn dest_dir(&self, sub: impl AsRef<Path>) -> PathBuf {
        self.build.output.join(sub)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());
        let root = Self::normalize_path(&root);
        self.set_root(&root);
        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.update_path_with_root(&root);

        if let Some(look_back) = cli.look_back() {
            self.version.look_back = look_back;
        }
    }

    /// Resolve all paths against the root directory
    fn update_path_with_root(&mut self, root: &Path) {
        self.build.assets = Self::normalize_path(&root.join(&self.build.assets));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));

        let map = shellexpand::tilde(&self.version.map.to_string_lossy()).into_owned();
        self.version.map = Self::normalize_path(&root.join(map));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the current command
    pub fn validate(&self, cli: &Cli) -> Result<()> {
        if !self.config_path.exists() {
            bail!("Config file not found");
        }

        if self.version.look_back == 0 {
            bail!(ConfigError::Validation(
                "[version.look_back] must be at least 1".into()
            ));
        }

        if self.version.marker.is_empty() {
            bail!(ConfigError::Validation(
                "[version.marker] must not be empty".into()
            ));
        }

        Regex::new(&self.version.log_filter).map_err(|err| {
            ConfigError::Validation(format!("[version.log_filter] is not a valid regex: {err}"))
        })?;

        // Only the optimizers the selected command will run need to be installed
        let build = &self.build;
        if cli.needs_styles() {
            Self::check_chain_installed("[build.styles.commands]", &build.styles.commands)?;
        }
        if cli.needs_scripts() {
            Self::check_chain_installed("[build.scripts.commands]", &build.scripts.commands)?;
        }
        if cli.needs_images() {
            for (ext, chain) in &build.images.commands {
                Self::check_chain_installed(&format!("[build.images.commands.{ext}]"), chain)?;
            }
        }

        if cli.needs_vcs() {
            Self::check_command_installed("[version.vcs]", &self.version.vcs)?;
        }

        Ok(())
    }

    /// Every command of a chain must be installed; an empty chain is pass-through
    fn check_chain_installed(field: &str, chain: &[Vec<String>]) -> Result<()> {
        chain
            .iter()
            .try_for_each(|command| Self::check_command_installed(field, command))
    }

    /// Check if a command is installed and available
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        let Some(cmd) = command.first() else {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        };

        which::which(cmd)
            .with_context(|| format!("`{cmd}` not found. Please install it first."))?;

        Ok(())
    }
}
