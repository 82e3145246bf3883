//! Optimizing stages: styles, scripts and images.
//!
//! The optimizers themselves are external: a command reading the file on stdin
//! and writing the optimized bytes to stdout, or usvg for SVG. This module only
//! decides which files to feed them, gzips the result and accounts for size.

use super::{
    CSS_DIR, IMG_DIR, JS_DIR, SVG_DIR, collect_files, has_extension, is_up_to_date,
};
use crate::{
    config::Config,
    log,
    utils::{command, gzip, size::Savings},
};
use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, Ordering},
};

/// Bytes in, optimized bytes out.
pub trait Optimize: Sync {
    fn optimize(&self, path: &Path, input: &[u8]) -> Result<Vec<u8>>;
}

/// Pipes the file through external commands in sequence, each one reading the
/// previous one's output. An empty chain passes through.
#[derive(Debug, Clone, Default)]
pub struct CommandOptimizer {
    chain: Vec<Vec<String>>,
}

impl CommandOptimizer {
    pub fn new(chain: Vec<Vec<String>>) -> Self {
        Self { chain }
    }
}

impl Optimize for CommandOptimizer {
    fn optimize(&self, _path: &Path, input: &[u8]) -> Result<Vec<u8>> {
        let Some((first, rest)) = self.chain.split_first() else {
            return Ok(input.to_vec());
        };
        rest.iter()
            .try_fold(command::pipe(first, input)?, |bytes, cmd| {
                command::pipe(cmd, &bytes)
            })
    }
}

/// Re-serializes SVG through usvg: drops editor metadata, comments and
/// whitespace, resolves styles into attributes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvgOptimizer;

impl Optimize for SvgOptimizer {
    fn optimize(&self, _path: &Path, input: &[u8]) -> Result<Vec<u8>> {
        let tree = usvg::Tree::from_data(input, &usvg::Options::default())
            .context("Failed to parse SVG")?;
        let write_options = usvg::WriteOptions {
            indent: usvg::Indent::None,
            ..Default::default()
        };
        Ok(tree.to_string(&write_options).into_bytes())
    }
}

/// SVG through usvg, raster formats through the chain configured for their
/// extension. A format without a chain is written unchanged.
#[derive(Debug, Clone, Default)]
pub struct ImageOptimizer {
    raster: HashMap<String, CommandOptimizer>,
}

impl ImageOptimizer {
    /// `commands` is keyed by extension, matched case-insensitively.
    pub fn new(commands: &BTreeMap<String, Vec<Vec<String>>>) -> Self {
        let raster = commands
            .iter()
            .map(|(ext, chain)| (ext.to_ascii_lowercase(), CommandOptimizer::new(chain.clone())))
            .collect();
        Self { raster }
    }
}

impl Optimize for ImageOptimizer {
    fn optimize(&self, path: &Path, input: &[u8]) -> Result<Vec<u8>> {
        if has_extension(path, &["svg"]) {
            return SvgOptimizer.optimize(path, input);
        }
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match self.raster.get(&ext) {
            Some(optimizer) => optimizer.optimize(path, input),
            None => Ok(input.to_vec()),
        }
    }
}

/// One optimizing pass over a source subtree.
pub struct Stage<'a> {
    /// Log prefix.
    pub name: &'static str,
    pub src_dir: PathBuf,
    pub dest_dir: PathBuf,
    pub extensions: &'a [&'a str],
    pub optimizer: &'a dyn Optimize,
    /// Gzip the optimized bytes in place.
    pub gzip: bool,
    /// Log per-file failures and carry on instead of aborting.
    pub tolerant: bool,
}

/// Totals of a stage run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageReport {
    pub written: usize,
    pub skipped: usize,
    pub failed: usize,
    pub savings: Savings,
}

enum Outcome {
    Skipped,
    Written(Savings),
    Failed,
}

impl Stage<'_> {
    /// Optimize every matching file not already up to date (unless `force`).
    pub fn run(&self, force: bool) -> Result<StageReport> {
        let files: Vec<_> = collect_files(&self.src_dir)
            .into_iter()
            .filter(|path| has_extension(path, self.extensions))
            .collect();

        let has_error = AtomicBool::new(false);
        let outcomes = files
            .par_iter()
            .map(|path| {
                if !self.tolerant && has_error.load(Ordering::Relaxed) {
                    return Err(anyhow!("Aborted"));
                }
                match self.process(path, force) {
                    Ok(outcome) => Ok(outcome),
                    Err(e) if self.tolerant => {
                        log!("error"; "{}: {:#}", path.display(), e);
                        Ok(Outcome::Failed)
                    }
                    Err(e) => {
                        if !has_error.swap(true, Ordering::Relaxed) {
                            log!("error"; "{}: {:#}", path.display(), e);
                        }
                        Err(anyhow!("{} failed", self.name))
                    }
                }
            })
            .collect::<Result<Vec<_>>>()?;

        let mut report = StageReport::default();
        for outcome in outcomes {
            match outcome {
                Outcome::Skipped => report.skipped += 1,
                Outcome::Failed => report.failed += 1,
                Outcome::Written(savings) => {
                    report.written += 1;
                    report.savings += savings;
                }
            }
        }

        if report.written > 0 {
            log!(
                self.name;
                "{} files ({} up to date), total {}",
                report.written,
                report.skipped,
                report.savings
            );
        }
        Ok(report)
    }

    fn process(&self, source: &Path, force: bool) -> Result<Outcome> {
        let relative = source.strip_prefix(&self.src_dir)?;
        let dest = self.dest_dir.join(relative);

        if !force && is_up_to_date(source, &dest) {
            return Ok(Outcome::Skipped);
        }

        let input = fs::read(source)
            .with_context(|| format!("Failed to read {}", source.display()))?;
        let mut output = self.optimizer.optimize(source, &input)?;
        if self.gzip {
            output = gzip::compress_unless_growing(output)?;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&dest, &output)
            .with_context(|| format!("Failed to write {}", dest.display()))?;

        let savings = Savings::new(input.len(), output.len());
        log!(self.name; "{} {}", relative.display(), savings);
        Ok(Outcome::Written(savings))
    }
}

/// `styles` stage: `css/**/*.css`.
pub fn styles(config: &Config, force: bool) -> Result<StageReport> {
    let optimizer = CommandOptimizer::new(config.build.styles.commands.clone());
    Stage {
        name: "styles",
        src_dir: config.src_dir(CSS_DIR),
        dest_dir: config.dest_dir(CSS_DIR),
        extensions: &["css"],
        optimizer: &optimizer,
        gzip: config.build.gzip,
        tolerant: false,
    }
    .run(force)
}

/// `scripts` stage: `js/**/*.js`.
pub fn scripts(config: &Config, force: bool) -> Result<StageReport> {
    let optimizer = CommandOptimizer::new(config.build.scripts.commands.clone());
    Stage {
        name: "scripts",
        src_dir: config.src_dir(JS_DIR),
        dest_dir: config.dest_dir(JS_DIR),
        extensions: &["js"],
        optimizer: &optimizer,
        gzip: config.build.gzip,
        tolerant: false,
    }
    .run(force)
}

/// `images` stage: image extensions under `img/` (not gzipped) and
/// `svg/**/*.svg` (gzipped). A broken image is logged and skipped.
pub fn images(config: &Config, force: bool) -> Result<StageReport> {
    let optimizer = ImageOptimizer::new(&config.build.images.commands);
    let extensions: Vec<&str> = config
        .build
        .images
        .extensions
        .iter()
        .map(String::as_str)
        .collect();

    let mut report = Stage {
        name: "images",
        src_dir: config.src_dir(IMG_DIR),
        dest_dir: config.dest_dir(IMG_DIR),
        extensions: &extensions,
        optimizer: &optimizer,
        gzip: false,
        tolerant: true,
    }
    .run(force)?;

    let svg = Stage {
        name: "images",
        src_dir: config.src_dir(SVG_DIR),
        dest_dir: config.dest_dir(SVG_DIR),
        extensions: &["svg"],
        optimizer: &SvgOptimizer,
        gzip: config.build.gzip,
        tolerant: true,
    }
    .run(force)?;

    report.written += svg.written;
    report.skipped += svg.skipped;
    report.failed += svg.failed;
    report.savings += svg.savings;
    Ok(report)
}
