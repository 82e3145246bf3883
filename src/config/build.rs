//! `[build]` section configuration.
//!
//! Source/destination static roots and the optimizer commands per stage.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf};

/// `[build]` section in revstamp.toml.
///
/// # Example
/// ```toml
/// [build]
/// assets = "assets"
/// output = "assets.min"
///
/// [build.styles]
/// commands = [["postcss", "--no-map", "--use", "autoprefixer"], ["csso"]]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Source static root, holding `css/`, `js/`, `img/`, `svg/` and `screens/`.
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: PathBuf,

    /// Destination static root, mirroring `assets`.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Gzip optimized css, js and svg in place (same file name).
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub gzip: bool,

    /// Stylesheet optimizers.
    #[serde(default)]
    pub styles: StylesConfig,

    /// Script optimizers.
    #[serde(default)]
    pub scripts: ScriptsConfig,

    /// Image optimizers per format.
    #[serde(default)]
    pub images: ImagesConfig,
}

/// External commands piped one into the next: each reads the previous
/// command's stdout on stdin. An empty chain passes bytes through unchanged.
pub type CommandChain = Vec<Vec<String>>;

/// `[build.styles]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct StylesConfig {
    /// Stylesheet optimizers, e.g. autoprefixer then csso.
    #[serde(default = "defaults::build::styles::commands")]
    #[educe(Default = defaults::build::styles::commands())]
    pub commands: CommandChain,
}

/// `[build.scripts]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ScriptsConfig {
    /// Script optimizers.
    #[serde(default = "defaults::build::scripts::commands")]
    #[educe(Default = defaults::build::scripts::commands())]
    pub commands: CommandChain,
}

/// `[build.images]` section
///
/// ```toml
/// [build.images.commands]
/// gif = [["gifsicle", "--interlace", "-O3"]]
/// png = [["pngquant", "--speed", "1", "-"]]
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ImagesConfig {
    /// Raster optimizers keyed by lowercase extension. An extension without an
    /// entry is written unchanged; SVG always goes through usvg.
    #[serde(default = "defaults::build::images::commands")]
    #[educe(Default = defaults::build::images::commands())]
    pub commands: BTreeMap<String, CommandChain>,

    /// Extensions under `img/` treated as optimizable images; the rest is copied.
    #[serde(default = "defaults::build::images::extensions")]
    #[educe(Default = defaults::build::images::extensions())]
    pub extensions: Vec<String>,
}
