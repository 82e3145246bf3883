//! Stage sequencing.
//!
//! ```text
//! build
//!   ├── clean    (--clean only)
//!   ├── copy
//!   ├── styles
//!   ├── scripts
//!   ├── version  ──► revision map + screens
//!   └── images
//! ```
//!
//! Each stage runs to completion before the next starts; the first fatal
//! error stops the sequence.

use crate::{
    cli::{Cli, Commands},
    config::Config,
    log, pipeline, version,
};
use anyhow::Result;

/// Run the stage(s) selected on the command line.
pub fn run(cli: &Cli, config: &Config) -> Result<()> {
    let force = cli.stage_args().force;

    match &cli.command {
        Commands::Build { clean, .. } => build_all(config, *clean, force),
        Commands::Copy { .. } => pipeline::copy(config, force).map(|_| ()),
        Commands::Styles { .. } => pipeline::styles(config, force).map(|_| ()),
        Commands::Scripts { .. } => pipeline::scripts(config, force).map(|_| ()),
        Commands::Images { .. } => pipeline::images(config, force).map(|_| ()),
        Commands::Version { .. } => version::run(config, cli.no_save()).map(|_| ()),
        Commands::Clean => pipeline::clean(config),
    }
}

/// Default sequence: copy, styles, scripts, version, images.
fn build_all(config: &Config, clean: bool, force: bool) -> Result<()> {
    if clean {
        pipeline::clean(config)?;
    }

    pipeline::copy(config, force)?;
    pipeline::styles(config, force)?;
    pipeline::scripts(config, force)?;
    let screens = version::run(config, false)?;
    let images = pipeline::images(config, force)?;

    if images.failed > 0 {
        log!("warn"; "{} images could not be optimized", images.failed);
    }
    log!("build"; "done, {} screens versioned", screens.len());
    Ok(())
}
