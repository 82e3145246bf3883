//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// revstamp static asset pipeline CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root; relative config paths resolve against it
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: revstamp.toml)
    #[arg(short = 'C', long, default_value = "revstamp.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments shared by the optimizing stages
#[derive(clap::Args, Debug, Clone, Default)]
pub struct StageArgs {
    /// Process every file, even when the output is newer than the source
    #[arg(short, long)]
    pub force: bool,
}

/// Arguments for the versioning stage
#[derive(clap::Args, Debug, Clone, Default)]
pub struct VersionArgs {
    /// Number of revisions (ending at head) to re-scan
    #[arg(short, long = "look-back")]
    pub look_back: Option<u64>,

    /// Rewrite screens without persisting the updated revision map
    #[arg(long)]
    pub no_save: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run copy, styles, scripts, version and images in sequence
    Build {
        /// Delete optimized css/js/svg output before building
        #[arg(long)]
        clean: bool,

        #[command(flatten)]
        stage: StageArgs,

        #[command(flatten)]
        version: VersionArgs,
    },

    /// Copy files that no optimizer handles
    Copy {
        #[command(flatten)]
        stage: StageArgs,
    },

    /// Optimize and gzip stylesheets
    Styles {
        #[command(flatten)]
        stage: StageArgs,
    },

    /// Optimize and gzip scripts
    Scripts {
        #[command(flatten)]
        stage: StageArgs,
    },

    /// Optimize images
    Images {
        #[command(flatten)]
        stage: StageArgs,
    },

    /// Update the revision map from svn history and version screen references
    Version {
        #[command(flatten)]
        version: VersionArgs,
    },

    /// Delete optimized css/js/svg output
    Clean,
}

impl Cli {
    /// Whether the command needs the version control backend
    pub const fn needs_vcs(&self) -> bool {
        matches!(
            self.command,
            Commands::Build { .. } | Commands::Version { .. }
        )
    }

    /// Whether the command runs the stylesheet optimizers
    pub const fn needs_styles(&self) -> bool {
        matches!(self.command, Commands::Build { .. } | Commands::Styles { .. })
    }

    /// Whether the command runs the script optimizers
    pub const fn needs_scripts(&self) -> bool {
        matches!(self.command, Commands::Build { .. } | Commands::Scripts { .. })
    }

    /// Whether the command runs the image optimizers
    pub const fn needs_images(&self) -> bool {
        matches!(self.command, Commands::Build { .. } | Commands::Images { .. })
    }

    /// Stage arguments of the current command, if it takes any
    pub fn stage_args(&self) -> StageArgs {
        match &self.command {
            Commands::Build { stage, .. }
            | Commands::Copy { stage }
            | Commands::Styles { stage }
            | Commands::Scripts { stage }
            | Commands::Images { stage } => stage.clone(),
            Commands::Version { .. } | Commands::Clean => StageArgs::default(),
        }
    }

    /// Whether the updated revision map should stay in memory only
    pub const fn no_save(&self) -> bool {
        matches!(
            self.command,
            Commands::Version {
                version: VersionArgs { no_save: true, .. }
            }
        )
    }

    /// Look-back override from the command line
    pub fn look_back(&self) -> Option<u64> {
        match &self.command {
            Commands::Build { version, .. } | Commands::Version { version } => version.look_back,
            _ => None,
        }
    }
}
