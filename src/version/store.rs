//! Revision map types and persistence.
//!
//! The map is the only persisted state of the pipeline:
//!
//! ```json
//! {
//!   "/html/a/app.js": {
//!     "rev": 97,
//!     "lastUpdatedDate": "2024-02-01 10:00:00"
//!   }
//! }
//! ```

use super::{Revision, VersionError};
use crate::log;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::PathBuf,
    sync::Mutex,
};

/// Last known change of one asset path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionEntry {
    /// Highest revision seen touching the path.
    pub rev: Revision,
    /// Wall-clock time the entry was written.
    #[serde(rename = "lastUpdatedDate")]
    pub last_updated: String,
}

/// Asset path → last revision that changed it.
///
/// Keys are kept sorted so the persisted file diffs cleanly between runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionMap(BTreeMap<String, RevisionEntry>);

impl RevisionMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<&RevisionEntry> {
        self.0.get(path)
    }

    /// Record that `path` changed in `rev`.
    ///
    /// A stored revision is never lowered; an equal or newer one refreshes the
    /// entry. Returns whether the entry was written.
    pub fn record(&mut self, path: &str, rev: Revision, stamp: &str) -> bool {
        match self.0.get_mut(path) {
            Some(entry) if entry.rev > rev => false,
            Some(entry) => {
                entry.rev = rev;
                entry.last_updated = stamp.to_owned();
                true
            }
            None => {
                self.0.insert(
                    path.to_owned(),
                    RevisionEntry {
                        rev,
                        last_updated: stamp.to_owned(),
                    },
                );
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RevisionEntry)> {
        self.0.iter().map(|(path, entry)| (path.as_str(), entry))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Durable home of the revision map.
pub trait RevisionStore {
    /// Read the persisted map. A missing or unreadable map is fatal.
    fn load(&self) -> Result<RevisionMap>;

    /// Persist the whole map, replacing what was stored.
    fn save(&self, map: &RevisionMap) -> Result<()>;
}

/// Pretty-printed JSON file store.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RevisionStore for JsonStore {
    fn load(&self) -> Result<RevisionMap> {
        let content = fs::read_to_string(&self.path)
            .map_err(|err| VersionError::MapMissing(self.path.clone(), err))?;
        let map = serde_json::from_str(&content)
            .map_err(|err| VersionError::MapCorrupt(self.path.clone(), err))?;
        Ok(map)
    }

    fn save(&self, map: &RevisionMap) -> Result<()> {
        let content = serde_json::to_string_pretty(map)?;
        fs::write(&self.path, content)
            .with_context(|| format!("Failed to save revision map to {}", self.path.display()))?;
        log!("version"; "saved revision map to {}", self.path.display());
        Ok(())
    }
}

/// In-process store: updates land here instead of on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<Option<RevisionMap>>,
    saves: Mutex<usize>,
}

impl MemoryStore {
    /// A store holding `map`, as if it had been persisted earlier.
    pub fn with_map(map: RevisionMap) -> Self {
        Self {
            map: Mutex::new(Some(map)),
            saves: Mutex::new(0),
        }
    }

    /// A store with nothing persisted yet; `load` fails.
    #[cfg(test)]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Last saved (or initial) map.
    #[cfg(test)]
    pub fn snapshot(&self) -> Option<RevisionMap> {
        self.map.lock().ok().and_then(|map| map.clone())
    }

    /// Number of successful `save` calls.
    #[cfg(test)]
    pub fn saves(&self) -> usize {
        self.saves.lock().map(|n| *n).unwrap_or_default()
    }
}

impl RevisionStore for MemoryStore {
    fn load(&self) -> Result<RevisionMap> {
        let map = self.map.lock().ok().and_then(|map| map.clone());
        map.ok_or_else(|| {
            VersionError::MapMissing(
                PathBuf::from("<memory>"),
                std::io::Error::new(std::io::ErrorKind::NotFound, "nothing persisted"),
            )
            .into()
        })
    }

    fn save(&self, map: &RevisionMap) -> Result<()> {
        let mut stored = self
            .map
            .lock()
            .map_err(|_| anyhow::anyhow!("memory store poisoned"))?;
        *stored = Some(map.clone());
        if let Ok(mut saves) = self.saves.lock() {
            *saves += 1;
        }
        Ok(())
    }
}
