//! Revision tracking and cache-busting of asset references.
//!
//! # Flow
//!
//! ```text
//! RevisionStore::load() ──► RevisionMap
//!                               │
//! RevisionLog::head_revision()  │   fold over LogWindow (oldest → head)
//!       │                       ▼
//!       └──► log(rev) ──► PathExtractor ──► merge_revision()
//!                                               │
//!                          RevisionStore::save() ◄┤ (failure logged only)
//!                                               ▼
//!                          Rewriter ──► screens/**/*.xml with `?v=<rev>`
//! ```
//!
//! One update cycle loads the map, scans a fixed window of recent revisions,
//! persists the merged map and hands it straight to the rewriter.

mod error;
mod extract;
mod log;
mod rewrite;
mod store;

pub use error::VersionError;
pub use extract::PathExtractor;
pub use log::{RevisionLog, SvnLog};
pub use rewrite::{DocumentReport, Rewriter, rewrite_screens};
pub use store::{JsonStore, MemoryStore, RevisionEntry, RevisionMap, RevisionStore};

use crate::config::Config;
use anyhow::Result;
use chrono::Local;
use std::ops::RangeInclusive;

/// Source-control revision number.
pub type Revision = u64;

/// Format of `lastUpdatedDate`.
const STAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Fixed run of revisions ending at head, re-scanned every cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogWindow {
    pub head: Revision,
    pub look_back: u64,
}

impl LogWindow {
    pub fn new(head: Revision, look_back: u64) -> Result<Self, VersionError> {
        if look_back == 0 {
            return Err(VersionError::EmptyWindow);
        }
        Ok(Self { head, look_back })
    }

    /// Revisions to scan, oldest first.
    ///
    /// Clamped at revision 1: a young repository just has a shorter window.
    pub fn revisions(&self) -> RangeInclusive<Revision> {
        let start = self.head.saturating_sub(self.look_back - 1).max(1);
        start..=self.head
    }
}

/// Fold step: record every path touched by `rev`.
pub fn merge_revision<'p>(
    mut map: RevisionMap,
    rev: Revision,
    paths: impl IntoIterator<Item = &'p str>,
    stamp: &str,
) -> RevisionMap {
    for path in paths {
        map.record(path, rev, stamp);
    }
    map
}

/// Drives one update cycle over injected log and store backends.
pub struct Updater<'a, L, S> {
    log: &'a L,
    store: &'a S,
    extractor: PathExtractor,
    look_back: u64,
}

impl<'a, L: RevisionLog, S: RevisionStore> Updater<'a, L, S> {
    pub fn new(log: &'a L, store: &'a S, extractor: PathExtractor, look_back: u64) -> Self {
        Self {
            log,
            store,
            extractor,
            look_back,
        }
    }

    /// Merge the recent history into the stored map and persist it.
    ///
    /// The map is loaded before source control is queried, so a missing map
    /// aborts without touching the backend. A failed save is logged and the
    /// merged map is still returned for this run's rewrite.
    pub fn update(&self) -> Result<RevisionMap> {
        let map = self.store.load()?;
        let head = self.log.head_revision()?;
        let window = LogWindow::new(head, self.look_back)?;

        crate::log!("version"; "scanning r{} to r{}", window.revisions().start(), head);

        let map = window.revisions().fold(map, |map, rev| {
            let log = self.log.log(rev);
            let stamp = Local::now().format(STAMP_FORMAT).to_string();
            merge_revision(map, rev, self.extractor.extract(&log), &stamp)
        });

        if let Err(err) = self.store.save(&map) {
            crate::log!("error"; "{err:#}");
        }

        Ok(map)
    }
}

/// `version` stage: update the map from svn, then rewrite screens into the output.
///
/// With `no_save` the persisted map is read but never written back.
pub fn run(config: &Config, no_save: bool) -> Result<Vec<DocumentReport>> {
    let version = &config.version;
    let svn = SvnLog::new(version.vcs.clone(), config.get_root(), &version.log_filter)?;
    let store = JsonStore::new(&version.map);
    run_with(config, &svn, &store, no_save)
}

/// [`run`] over explicit backends.
pub fn run_with<L: RevisionLog, S: RevisionStore>(
    config: &Config,
    log: &L,
    store: &S,
    no_save: bool,
) -> Result<Vec<DocumentReport>> {
    let version = &config.version;
    let extractor = PathExtractor::new(version.marker.as_str());

    let map = if no_save {
        let scratch = MemoryStore::with_map(store.load()?);
        let map = Updater::new(log, &scratch, extractor, version.look_back).update()?;
        crate::log!("version"; "persisted revision map left untouched");
        map
    } else {
        Updater::new(log, store, extractor, version.look_back).update()?
    };

    if map.is_empty() {
        crate::log!("warn"; "revision map is empty, screens are copied unversioned");
    } else {
        crate::log!("version"; "{} tracked paths", map.len());
    }

    let rewriter = Rewriter::new(&map)?;
    rewrite_screens(
        &rewriter,
        &config.src_dir(&version.screens),
        &config.dest_dir(&version.screens),
        &version.extensions,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{cell::RefCell, collections::HashMap, fs, path::Path};
    use tempfile::TempDir;

    /// In-memory history: revision → log text.
    struct FakeLog {
        head: Revision,
        logs: HashMap<Revision, String>,
        queried: RefCell<Vec<Revision>>,
    }

    impl FakeLog {
        fn new(head: Revision, logs: &[(Revision, &str)]) -> Self {
            Self {
                head,
                logs: logs.iter().map(|(rev, log)| (*rev, (*log).to_owned())).collect(),
                queried: RefCell::new(Vec::new()),
            }
        }
    }

    impl RevisionLog for FakeLog {
        fn head_revision(&self) -> Result<Revision> {
            self.queried.borrow_mut().push(self.head);
            Ok(self.head)
        }

        fn log(&self, rev: Revision) -> String {
            self.queried.borrow_mut().push(rev);
            self.logs.get(&rev).cloned().unwrap_or_default()
        }
    }

    /// Store whose saves always fail.
    struct ReadOnlyStore(RevisionMap);

    impl RevisionStore for ReadOnlyStore {
        fn load(&self) -> Result<RevisionMap> {
            Ok(self.0.clone())
        }

        fn save(&self, _map: &RevisionMap) -> Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn extractor() -> PathExtractor {
        PathExtractor::new("/html/")
    }

    #[test]
    fn test_window_revisions() {
        let window = LogWindow::new(100, 6).unwrap();
        assert_eq!(window.revisions(), 95..=100);
        assert_eq!(LogWindow::new(100, 1).unwrap().revisions(), 100..=100);
    }

    #[test]
    fn test_window_clamped_at_first_revision() {
        assert_eq!(LogWindow::new(3, 6).unwrap().revisions(), 1..=3);
        assert_eq!(LogWindow::new(0, 6).unwrap().revisions().count(), 0);
    }

    #[test]
    fn test_window_rejects_zero_look_back() {
        assert!(matches!(LogWindow::new(100, 0), Err(VersionError::EmptyWindow)));
    }

    #[test]
    fn test_merge_revision_later_wins() {
        let map = merge_revision(RevisionMap::new(), 10, ["/html/p.js"], "t10");
        let map = merge_revision(map, 15, ["/html/p.js"], "t15");
        assert_eq!(map.get("/html/p.js").unwrap().rev, 15);
    }

    #[test]
    fn test_merge_revision_no_paths_is_noop() {
        let map = merge_revision(RevisionMap::new(), 10, ["/html/p.js"], "t");
        let merged = merge_revision(map.clone(), 11, std::iter::empty(), "t");
        assert_eq!(merged, map);
    }

    #[test]
    fn test_update_scenario_window() {
        let log = FakeLog::new(
            100,
            &[
                (97, "   M /html/trunk/html/a/app.js"),
                (99, "   M /html/trunk/html/b/style.css"),
            ],
        );
        let store = MemoryStore::with_map(RevisionMap::new());

        let map = Updater::new(&log, &store, extractor(), 6).update().unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map.get("/html/a/app.js").unwrap().rev, 97);
        assert_eq!(map.get("/html/b/style.css").unwrap().rev, 99);
        assert_eq!(store.snapshot(), Some(map));
        assert_eq!(*log.queried.borrow(), vec![100, 95, 96, 97, 98, 99, 100]);
    }

    #[test]
    fn test_update_largest_revision_in_window_wins() {
        let log = FakeLog::new(
            20,
            &[(10, "M /html/trunk/html/p.js"), (15, "M /html/trunk/html/p.js")],
        );
        let store = MemoryStore::with_map(RevisionMap::new());

        let map = Updater::new(&log, &store, extractor(), 12).update().unwrap();
        assert_eq!(map.get("/html/p.js").unwrap().rev, 15);
    }

    #[test]
    fn test_update_keeps_untouched_entries() {
        let mut existing = RevisionMap::new();
        existing.record("/html/old.css", 40, "earlier");
        let log = FakeLog::new(100, &[(100, "M /html/trunk/html/new.js")]);
        let store = MemoryStore::with_map(existing);

        let map = Updater::new(&log, &store, extractor(), 6).update().unwrap();
        assert_eq!(map.get("/html/old.css").unwrap().rev, 40);
        assert_eq!(map.get("/html/old.css").unwrap().last_updated, "earlier");
        assert_eq!(map.get("/html/new.js").unwrap().rev, 100);
    }

    #[test]
    fn test_update_never_regresses_stored_revision() {
        let mut existing = RevisionMap::new();
        existing.record("/html/p.js", 99, "earlier");
        // r99 not visible this time, only an older touch inside the window
        let log = FakeLog::new(100, &[(97, "M /html/trunk/html/p.js")]);
        let store = MemoryStore::with_map(existing);

        let map = Updater::new(&log, &store, extractor(), 6).update().unwrap();
        assert_eq!(map.get("/html/p.js").unwrap().rev, 99);
    }

    #[test]
    fn test_update_missing_map_aborts_before_backend() {
        let log = FakeLog::new(100, &[(100, "M /html/trunk/html/p.js")]);
        let store = MemoryStore::empty();

        let err = Updater::new(&log, &store, extractor(), 6).update().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<VersionError>(),
            Some(VersionError::MapMissing(..))
        ));
        assert!(log.queried.borrow().is_empty());
        assert_eq!(store.saves(), 0);
        assert_eq!(store.snapshot(), None);
    }

    #[test]
    fn test_update_without_changes_still_saves() {
        let mut existing = RevisionMap::new();
        existing.record("/html/p.js", 50, "earlier");
        let log = FakeLog::new(100, &[]);
        let store = MemoryStore::with_map(existing.clone());

        let map = Updater::new(&log, &store, extractor(), 6).update().unwrap();
        assert_eq!(map, existing);
        assert_eq!(store.saves(), 1);
    }

    #[test]
    fn test_update_save_failure_is_not_fatal() {
        let log = FakeLog::new(100, &[(100, "M /html/trunk/html/p.js")]);
        let store = ReadOnlyStore(RevisionMap::new());

        let map = Updater::new(&log, &store, extractor(), 6).update().unwrap();
        assert_eq!(map.get("/html/p.js").unwrap().rev, 100);
    }

    #[test]
    fn test_update_then_rewrite() {
        let log = FakeLog::new(
            100,
            &[
                (97, "   M /html/trunk/html/a/app.js"),
                (99, "   M /html/trunk/html/b/style.css"),
            ],
        );
        let store = MemoryStore::with_map(RevisionMap::new());
        let map = Updater::new(&log, &store, extractor(), 6).update().unwrap();

        let (out, _) = Rewriter::new(&map).unwrap().rewrite("<src>/html/a/app.js</src>");
        assert_eq!(out, "<src>/html/a/app.js?v=97</src>");
    }

    const SEED_MAP: &str = r#"{
  "/html/old.css": {
    "rev": 40,
    "lastUpdatedDate": "2024-01-01 09:00:00"
  }
}"#;

    /// Assets tree with one screen and a seeded map file.
    fn project(dir: &Path) -> Config {
        let mut config = Config::default();
        config.build.assets = dir.join("assets");
        config.build.output = dir.join("out");
        config.version.map = dir.join("map.json");

        fs::create_dir_all(config.src_dir("screens/home")).unwrap();
        fs::write(
            config.src_dir("screens/home/main.xml"),
            "<src>/html/a/app.js</src><link>/html/old.css</link>",
        )
        .unwrap();
        fs::write(&config.version.map, SEED_MAP).unwrap();
        config
    }

    fn history() -> FakeLog {
        FakeLog::new(100, &[(99, "   M /html/trunk/html/a/app.js")])
    }

    #[test]
    fn test_run_saves_then_rewrites() {
        let dir = TempDir::new().unwrap();
        let config = project(dir.path());
        let store = JsonStore::new(&config.version.map);

        let reports = run_with(&config, &history(), &store, false).unwrap();

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].replaced, 2);
        assert_eq!(
            fs::read_to_string(config.dest_dir("screens/home/main.xml")).unwrap(),
            "<src>/html/a/app.js?v=99</src><link>/html/old.css?v=40</link>"
        );
        let saved = store.load().unwrap();
        assert_eq!(saved.get("/html/a/app.js").unwrap().rev, 99);
        assert_eq!(saved.get("/html/old.css").unwrap().rev, 40);
    }

    #[test]
    fn test_run_no_save_leaves_map_file_untouched() {
        let dir = TempDir::new().unwrap();
        let config = project(dir.path());
        let store = JsonStore::new(&config.version.map);

        run_with(&config, &history(), &store, true).unwrap();

        assert_eq!(fs::read_to_string(&config.version.map).unwrap(), SEED_MAP);
        assert_eq!(
            fs::read_to_string(config.dest_dir("screens/home/main.xml")).unwrap(),
            "<src>/html/a/app.js?v=99</src><link>/html/old.css?v=40</link>"
        );
    }

    #[test]
    fn test_run_missing_map_writes_no_screens() {
        let dir = TempDir::new().unwrap();
        let config = project(dir.path());
        fs::remove_file(&config.version.map).unwrap();
        let log = history();

        let err = run_with(&config, &log, &JsonStore::new(&config.version.map), true).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<VersionError>(),
            Some(VersionError::MapMissing(..))
        ));
        assert!(log.queried.borrow().is_empty());
        assert!(!config.dest_dir("screens").exists());
    }
}
