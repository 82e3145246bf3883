//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

pub fn r#true() -> bool {
    true
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn assets() -> PathBuf {
        "assets".into()
    }

    pub fn output() -> PathBuf {
        "assets.min".into()
    }

    pub mod styles {
        pub fn commands() -> Vec<Vec<String>> {
            vec![
                ["postcss", "--no-map", "--use", "autoprefixer"].map(String::from).to_vec(),
                vec!["csso".into()],
            ]
        }
    }

    pub mod scripts {
        pub fn commands() -> Vec<Vec<String>> {
            vec![["uglifyjs", "--compress", "--mangle"].map(String::from).to_vec()]
        }
    }

    pub mod images {
        use std::collections::BTreeMap;

        pub fn commands() -> BTreeMap<String, Vec<Vec<String>>> {
            [
                ("gif", vec!["gifsicle", "--interlace", "-O3"]),
                ("jpg", vec!["jpegtran", "-progressive", "-optimize"]),
                ("png", vec!["pngquant", "--speed", "1", "-"]),
            ]
            .into_iter()
            .map(|(ext, cmd)| (ext.to_owned(), vec![cmd.into_iter().map(String::from).collect()]))
            .collect()
        }

        pub fn extensions() -> Vec<String> {
            ["gif", "png", "jpg", "svg"].map(String::from).to_vec()
        }
    }
}

// ============================================================================
// [version] Section Defaults
// ============================================================================

pub mod version {
    use std::path::PathBuf;

    pub fn map() -> PathBuf {
        "data/path_to_rev_map.json".into()
    }

    pub fn look_back() -> u64 {
        6
    }

    pub fn marker() -> String {
        "/html/".into()
    }

    pub fn log_filter() -> String {
        r"assets/.*\.js|css".into()
    }

    pub fn screens() -> PathBuf {
        "screens".into()
    }

    pub fn extensions() -> Vec<String> {
        vec!["xml".into()]
    }

    pub fn vcs() -> Vec<String> {
        vec!["svn".into()]
    }
}
