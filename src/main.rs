//! revstamp - static asset pipeline with svn-driven cache busting.

mod build;
mod cli;
mod config;
mod logger;
mod pipeline;
mod utils;
mod version;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use config::Config;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    build::run(&cli, &config)
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let root = cli.root.as_deref().unwrap_or(std::path::Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = Config::from_path(&config_path)?;
    config.update_with_cli(cli);
    config.validate(cli)?;

    Ok(config)
}
