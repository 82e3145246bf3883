//! Removal of optimized output.

use super::{CSS_DIR, JS_DIR, SVG_DIR};
use crate::{config::Config, log};
use anyhow::{Context, Result};
use std::fs;

/// Delete the optimized `css/`, `js/` and `svg/` output directories.
///
/// Copied images and rewritten screens are left alone.
pub fn clean(config: &Config) -> Result<()> {
    for sub in [CSS_DIR, JS_DIR, SVG_DIR] {
        let dir = config.dest_dir(sub);
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("Failed to clear output directory: {}", dir.display()))?;
            log!("clean"; "{}", dir.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_clean_removes_optimized_dirs_only() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.build.output = dir.path().join("out");
        for sub in ["css", "js", "img", "screens"] {
            fs::create_dir_all(config.dest_dir(sub)).unwrap();
        }

        clean(&config).unwrap();
        assert!(!config.dest_dir("css").exists());
        assert!(!config.dest_dir("js").exists());
        assert!(config.dest_dir("img").exists());
        assert!(config.dest_dir("screens").exists());

        // Nothing left to clean is fine
        clean(&config).unwrap();
    }
}
