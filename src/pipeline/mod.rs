//! Asset stages: optimize, copy and clean.
//!
//! Every stage maps a source subtree of `[build].assets` onto the same subtree
//! of `[build].output`:
//!
//! ```text
//! assets/css/**/*.css  ──► styles  ──► assets.min/css/
//! assets/js/**/*.js    ──► scripts ──► assets.min/js/
//! assets/img, svg      ──► images  ──► assets.min/img, svg/
//! everything else      ──► copy    ──► assets.min/{css,js,img}/
//! ```
//!
//! Stages run one after another; files within a stage are processed in parallel.

pub mod clean;
pub mod copy;
pub mod optimize;

pub use clean::clean;
pub use copy::copy;
pub use optimize::{images, scripts, styles};

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub const CSS_DIR: &str = "css";
pub const JS_DIR: &str = "js";
pub const IMG_DIR: &str = "img";
pub const SVG_DIR: &str = "svg";

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Collect all files from a directory recursively.
///
/// A missing directory yields nothing.
pub fn collect_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Check if destination exists and is not older than the source.
pub fn is_up_to_date(src: &Path, dst: &Path) -> bool {
    let Ok(src_time) = src.metadata().and_then(|m| m.modified()) else {
        return false;
    };
    let Ok(dst_time) = dst.metadata().and_then(|m| m.modified()) else {
        return false;
    };
    src_time <= dst_time
}

/// Case-insensitive extension check against a list like `["gif", "png"]`.
pub fn has_extension<S: AsRef<str>>(path: &Path, extensions: &[S]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.iter().any(|e| e.as_ref().eq_ignore_ascii_case(ext)))
}
