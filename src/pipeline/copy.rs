//! Pass-through copy of files no optimizer handles.

use super::{CSS_DIR, IMG_DIR, JS_DIR, collect_files, has_extension, is_up_to_date};
use crate::{config::Config, log, utils::size::format_size};
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::{fs, path::Path};

/// Copy `css/`, `js/` and `img/` files whose extension their optimizing stage
/// does not claim. Returns the number of files copied.
pub fn copy(config: &Config, force: bool) -> Result<usize> {
    let image_exts = &config.build.images.extensions;

    let copied = copy_dir(
        &config.src_dir(JS_DIR),
        &config.dest_dir(JS_DIR),
        &["js".to_owned()],
        force,
    )? + copy_dir(
        &config.src_dir(CSS_DIR),
        &config.dest_dir(CSS_DIR),
        &["css".to_owned()],
        force,
    )? + copy_dir(
        &config.src_dir(IMG_DIR),
        &config.dest_dir(IMG_DIR),
        image_exts,
        force,
    )?;

    log!("copy"; "{copied} files");
    Ok(copied)
}

/// Mirror files of `src_dir` lacking any of `excluded` extensions into `dest_dir`.
fn copy_dir(src_dir: &Path, dest_dir: &Path, excluded: &[String], force: bool) -> Result<usize> {
    let files: Vec<_> = collect_files(src_dir)
        .into_iter()
        .filter(|path| !has_extension(path, excluded))
        .collect();

    let copied = files
        .par_iter()
        .map(|source| -> Result<usize> {
            let relative = source.strip_prefix(src_dir)?;
            let dest = dest_dir.join(relative);
            if !force && is_up_to_date(source, &dest) {
                return Ok(0);
            }
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            let bytes = fs::copy(source, &dest)
                .with_context(|| format!("Failed to copy {}", source.display()))?;
            log!("copy"; "{} {}", relative.display(), format_size(usize::try_from(bytes)?));
            Ok(1)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(copied.into_iter().sum())
}
