/// The media discovery traverser.
///
/// Walks a folder tree looking for enough preview-able files to fill a
/// gallery grid. Every entry of a folder is handled before any of its
/// sub-folders is entered; sub-folders are then searched depth-first, one
/// complete subtree at a time.
///
/// # Bounding the work
///
/// Three rules from [`heuristics`](super::heuristics) keep a run cheap on
/// huge trees:
///
/// - a non-root folder stops being scanned once it has yielded
///   `level_cap` pictures;
/// - below the root, sub-folders are only entered when the folder itself had
///   no pictures;
/// - once a sub-folder two or more levels down yields pictures, its
///   remaining siblings are skipped.
///
/// # Failure policy
///
/// Only a root that cannot be listed fails the run, with
/// [`DiscoveryError::NotFound`]. Anything that goes wrong further down (a
/// folder that cannot be listed, a node whose type cannot be read, a file
/// whose attributes cannot be read) makes that node contribute nothing.
use super::heuristics::{level_is_full, should_abort_sibling_descent, should_descend};
use super::progress::DiscoveryProgress;
use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, StorageError};
use crate::model::{MediaRecord, MimeSet};
use crate::paths::PathMapper;
use crate::storage::{NodeKind, Storage};
use crossbeam_channel::Sender;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

/// Finds preview-able media below a folder.
///
/// Owns its storage backend and path mapper; both are consulted only
/// through their traits, so `&MemoryStorage`, `LocalStorage`, or an
/// embedder's own file cache all work.
#[derive(Debug, Clone)]
pub struct MediaDiscovery<S, M> {
    storage: S,
    mapper: M,
    config: DiscoveryConfig,
}

impl<S: Storage, M: PathMapper> MediaDiscovery<S, M> {
    /// Create a traverser with the default heuristics.
    pub fn new(storage: S, mapper: M) -> Self {
        Self {
            storage,
            mapper,
            config: DiscoveryConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn mapper(&self) -> &M {
        &self.mapper
    }

    /// Collect media files below `root` whose type is in `supported`.
    ///
    /// Records come back in discovery order. Fails with
    /// [`DiscoveryError::NotFound`] only when `root` itself cannot be listed;
    /// in that case no partial results are returned.
    pub fn discover(
        &self,
        root: &Path,
        supported: &MimeSet,
    ) -> Result<Vec<MediaRecord>, DiscoveryError> {
        self.discover_observed(root, supported, &Observer::default())
    }

    pub(crate) fn discover_observed(
        &self,
        root: &Path,
        supported: &MimeSet,
        observer: &Observer<'_>,
    ) -> Result<Vec<MediaRecord>, DiscoveryError> {
        let start = Instant::now();
        info!(
            "Starting media discovery in {} ({} supported types)",
            root.display(),
            supported.len()
        );

        let mut search = Search {
            discovery: self,
            supported,
            observer,
            records: Vec::new(),
        };
        search.search_folder(root, 0)?;

        let records = search.records;
        info!(
            "Discovery in {} found {} files in {:?}",
            root.display(),
            records.len(),
            start.elapsed()
        );
        Ok(records)
    }
}

/// Optional hooks for a run driven by a [`DiscoveryHandle`](super::DiscoveryHandle).
#[derive(Default)]
pub(crate) struct Observer<'a> {
    pub progress: Option<&'a Sender<DiscoveryProgress>>,
    pub cancel: Option<&'a AtomicBool>,
}

impl Observer<'_> {
    fn check_cancelled(&self) -> Result<(), DiscoveryError> {
        match self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(DiscoveryError::Cancelled),
            _ => Ok(()),
        }
    }

    fn folder_searched(&self, folder: &Path, depth: usize, found: usize) {
        if let Some(tx) = self.progress {
            // Lossy under back-pressure. The last slot is kept for the
            // terminal message.
            if tx.capacity().is_some_and(|cap| tx.len() + 1 >= cap) {
                return;
            }
            let _ = tx.try_send(DiscoveryProgress::FolderSearched {
                path: folder.to_string_lossy().into_owned(),
                depth,
                found,
            });
        }
    }
}

/// Outcome of reading a node's type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeClass {
    File,
    Dir,
    /// The type could not be read; the node is ignored.
    Unclassifiable,
}

/// Outcome of testing a file against the supported set.
#[derive(Debug)]
enum Qualification {
    Qualifies(MediaRecord),
    Skip,
}

/// State of one discovery run. `records` is the single accumulator shared
/// by every level of the search.
struct Search<'a, S, M> {
    discovery: &'a MediaDiscovery<S, M>,
    supported: &'a MimeSet,
    observer: &'a Observer<'a>,
    records: Vec<MediaRecord>,
}

impl<S: Storage, M: PathMapper> Search<'_, S, M> {
    /// Search `folder` and, when the heuristics allow, its sub-folders.
    ///
    /// Returns the number of qualifying files found directly in `folder`,
    /// not counting descendants.
    fn search_folder(&mut self, folder: &Path, depth: usize) -> Result<usize, DiscoveryError> {
        self.observer.check_cancelled()?;

        let config = &self.discovery.config;
        let nodes = self.list_nodes(folder, depth)?;
        let mut found = 0usize;
        let mut sub_folders: Vec<PathBuf> = Vec::new();

        for node in nodes {
            match self.classify(&node) {
                NodeClass::Dir => {
                    if self.is_excluded(&node) {
                        debug!("Skipping {} (contains {})", node.display(), config.sentinel);
                    } else {
                        sub_folders.push(node);
                    }
                }
                NodeClass::File => {
                    if let Qualification::Qualifies(record) = self.qualify(&node) {
                        self.records.push(record);
                        found += 1;
                        if level_is_full(depth, found, config.level_cap) {
                            debug!(
                                "{} reached {found} files, skipping its remaining entries",
                                folder.display()
                            );
                            break;
                        }
                    }
                }
                NodeClass::Unclassifiable => {}
            }
        }

        self.observer.folder_searched(folder, depth, found);

        if should_descend(depth, sub_folders.len(), found) {
            self.search_sub_folders(&sub_folders, depth + 1)?;
        }
        Ok(found)
    }

    fn search_sub_folders(
        &mut self,
        sub_folders: &[PathBuf],
        child_depth: usize,
    ) -> Result<(), DiscoveryError> {
        if let Some(max_depth) = self.discovery.config.max_depth {
            if child_depth > max_depth {
                debug!(
                    "Not descending past depth {max_depth} ({} folders skipped)",
                    sub_folders.len()
                );
                return Ok(());
            }
        }

        for (i, sub_folder) in sub_folders.iter().enumerate() {
            let found = self.search_folder(sub_folder, child_depth)?;
            if should_abort_sibling_descent(child_depth, found) {
                let skipped = sub_folders.len() - i - 1;
                if skipped > 0 {
                    debug!(
                        "{} yielded {found} files, skipping {skipped} sibling folders",
                        sub_folder.display()
                    );
                }
                break;
            }
        }
        Ok(())
    }

    /// Children of `folder`. A failure is fatal at the root and an empty
    /// listing everywhere else.
    fn list_nodes(&self, folder: &Path, depth: usize) -> Result<Vec<PathBuf>, DiscoveryError> {
        match self.discovery.storage.list_nodes(folder) {
            Ok(nodes) => Ok(nodes),
            Err(err) if depth == 0 => {
                warn!("Cannot search {}: {err}", folder.display());
                Err(DiscoveryError::NotFound {
                    path: folder.to_path_buf(),
                    message: err.to_string(),
                })
            }
            Err(err) => {
                debug!("Ignoring folder at depth {depth}: {err}");
                Ok(Vec::new())
            }
        }
    }

    fn classify(&self, node: &Path) -> NodeClass {
        match self.discovery.storage.node_kind(node) {
            Ok(NodeKind::File) => NodeClass::File,
            Ok(NodeKind::Dir) => NodeClass::Dir,
            Err(err) => {
                trace!("Ignoring unclassifiable node: {err}");
                NodeClass::Unclassifiable
            }
        }
    }

    fn is_excluded(&self, dir: &Path) -> bool {
        self.discovery
            .storage
            .node_exists(dir, &self.discovery.config.sentinel)
    }

    fn qualify(&self, file: &Path) -> Qualification {
        match self.media_record(file) {
            Ok(Some(record)) => Qualification::Qualifies(record),
            Ok(None) => Qualification::Skip,
            Err(err) => {
                trace!("Skipping file: {err}");
                Qualification::Skip
            }
        }
    }

    /// Build the record for `file` if it is local and of a supported type.
    fn media_record(&self, file: &Path) -> Result<Option<MediaRecord>, StorageError> {
        let storage = &self.discovery.storage;

        let mime_type = storage.mime_type(file)?;
        if !storage.is_local(file) || !self.supported.contains(&mime_type) {
            return Ok(None);
        }

        let Some(path) = self.discovery.mapper.to_virtual_path(file) else {
            trace!("No virtual path for {}", file.display());
            return Ok(None);
        };

        Ok(Some(MediaRecord {
            path,
            file_id: storage.file_id(file)?,
            mime_type,
            modified_time: storage.modified_time(file)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paths::RootRelativeMapper;
    use crate::storage::MemoryStorage;

    const JPEG: &str = "image/jpeg";
    const PNG: &str = "image/png";

    fn discovery(storage: &MemoryStorage) -> MediaDiscovery<&MemoryStorage, RootRelativeMapper> {
        MediaDiscovery::new(storage, RootRelativeMapper::new("/r"))
    }

    fn jpegs() -> MimeSet {
        [JPEG].into_iter().collect()
    }

    fn run(storage: &MemoryStorage) -> Vec<String> {
        discovery(storage)
            .discover(Path::new("/r"), &jpegs())
            .expect("root is listable")
            .into_iter()
            .map(|r| r.path)
            .collect()
    }

    fn add_jpegs(storage: &mut MemoryStorage, dir: &str, count: usize) {
        for i in 1..=count {
            storage.add_file(format!("{dir}/{i}.jpg"), JPEG);
        }
    }

    // ── Root behaviour ───────────────────────────────────────────────────

    /// Five pictures at the root: all are returned, in listing order.
    #[test]
    fn root_files_are_all_collected() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r", 5);

        assert_eq!(run(&storage), ["1.jpg", "2.jpg", "3.jpg", "4.jpg", "5.jpg"]);
    }

    #[test]
    fn root_scan_inspects_every_child_past_the_cap() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r", 6);

        assert_eq!(run(&storage).len(), 6);
        assert_eq!(storage.inspected().len(), 6);
    }

    /// A root with no pictures of its own descends into its only album.
    #[test]
    fn empty_root_descends_into_album() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r/Vacation", 2);

        assert_eq!(run(&storage), ["Vacation/1.jpg", "Vacation/2.jpg"]);
    }

    /// The root always descends, even when it has pictures itself; the
    /// sub-folder is then capped.
    #[test]
    fn root_with_cover_still_descends() {
        let mut storage = MemoryStorage::new();
        storage.add_file("/r/cover.jpg", JPEG);
        add_jpegs(&mut storage, "/r/Album", 5);

        assert_eq!(
            run(&storage),
            [
                "cover.jpg",
                "Album/1.jpg",
                "Album/2.jpg",
                "Album/3.jpg",
                "Album/4.jpg"
            ]
        );
    }

    #[test]
    fn unreadable_root_is_not_found() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r", 2);
        storage.mark_unreadable("/r");

        let err = discovery(&storage)
            .discover(Path::new("/r"), &jpegs())
            .unwrap_err();
        assert!(err.is_not_found(), "got {err:?}");
    }

    #[test]
    fn remote_root_is_not_found() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r", 2);
        storage.mark_remote("/r");

        let err = discovery(&storage)
            .discover(Path::new("/r"), &jpegs())
            .unwrap_err();
        assert!(err.is_not_found(), "got {err:?}");
    }

    #[test]
    fn root_listing_error_carries_its_message() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r", 1);
        storage.fail_listing("/r");

        match discovery(&storage).discover(Path::new("/r"), &jpegs()) {
            Err(DiscoveryError::NotFound { path, message }) => {
                assert_eq!(path, PathBuf::from("/r"));
                assert!(message.contains("injected"), "got {message}");
            }
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_root_is_not_found() {
        let storage = MemoryStorage::new();
        let err = discovery(&storage)
            .discover(Path::new("/nowhere"), &jpegs())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    // ── Filtering ────────────────────────────────────────────────────────

    #[test]
    fn sentinel_excludes_folder_at_any_depth() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r/Hidden", 3);
        storage.add_file("/r/Hidden/.nomedia", "application/octet-stream");
        add_jpegs(&mut storage, "/r/Shown/Inner", 1);
        storage.add_file("/r/Shown/Inner/.nomedia", "application/octet-stream");
        add_jpegs(&mut storage, "/r/Shown/Other", 1);

        assert_eq!(run(&storage), ["Shown/Other/1.jpg"]);
        assert!(storage
            .inspected()
            .iter()
            .all(|p| !p.starts_with("/r/Hidden") && !p.starts_with("/r/Shown/Inner")));
    }

    #[test]
    fn sentinel_name_comes_from_config() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r/A", 1);
        storage.add_file("/r/A/.noimages", "application/octet-stream");
        add_jpegs(&mut storage, "/r/B", 1);
        storage.add_file("/r/B/.nomedia", "application/octet-stream");

        let config = DiscoveryConfig {
            sentinel: ".noimages".into(),
            ..DiscoveryConfig::default()
        };
        let records = discovery(&storage)
            .with_config(config)
            .discover(Path::new("/r"), &jpegs())
            .unwrap();
        let paths: Vec<_> = records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, ["B/1.jpg"]);
    }

    #[test]
    fn only_local_supported_files_are_recorded() {
        let mut storage = MemoryStorage::new();
        storage.add_file("/r/a.jpg", JPEG);
        storage.add_file("/r/b.png", PNG);
        storage.add_file("/r/c.txt", "text/plain");
        storage.add_file("/r/d.jpg", JPEG);
        storage.mark_remote("/r/d.jpg");

        let records = discovery(&storage)
            .discover(Path::new("/r"), &jpegs())
            .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "a.jpg");
        assert_eq!(records[0].mime_type, JPEG);
    }

    #[test]
    fn empty_supported_set_yields_nothing() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r", 3);
        add_jpegs(&mut storage, "/r/sub", 3);

        let records = discovery(&storage)
            .discover(Path::new("/r"), &MimeSet::new())
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn record_carries_storage_attributes() {
        let mut storage = MemoryStorage::new();
        let id = storage.add_file_with("/r/a.jpg", JPEG, 1_650_000_000);

        let records = discovery(&storage)
            .discover(Path::new("/r"), &jpegs())
            .unwrap();
        assert_eq!(
            records,
            [MediaRecord {
                path: "a.jpg".into(),
                file_id: id,
                mime_type: JPEG.into(),
                modified_time: 1_650_000_000,
            }]
        );
    }

    #[test]
    fn unmappable_files_are_skipped() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r", 2);

        let records = MediaDiscovery::new(&storage, RootRelativeMapper::new("/elsewhere"))
            .discover(Path::new("/r"), &jpegs())
            .unwrap();
        assert!(records.is_empty());
    }

    // ── Level cap ────────────────────────────────────────────────────────

    #[test]
    fn sub_folder_stops_after_four_pictures() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r/Album", 7);

        assert_eq!(run(&storage).len(), 4);
        let inspected = storage.inspected();
        assert_eq!(inspected.len(), 4, "siblings after the cap must not be read");
        assert_eq!(inspected[3], PathBuf::from("/r/Album/4.jpg"));
    }

    #[test]
    fn unsupported_files_do_not_count_towards_the_cap() {
        let mut storage = MemoryStorage::new();
        storage.add_file("/r/Album/a.png", PNG);
        storage.add_file("/r/Album/b.png", PNG);
        add_jpegs(&mut storage, "/r/Album", 5);

        assert_eq!(run(&storage).len(), 4);
        assert_eq!(storage.inspected().len(), 6);
    }

    #[test]
    fn level_cap_is_configurable() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r/Album", 7);

        let capped = discovery(&storage)
            .with_config(DiscoveryConfig {
                level_cap: 2,
                ..DiscoveryConfig::default()
            })
            .discover(Path::new("/r"), &jpegs())
            .unwrap();
        assert_eq!(capped.len(), 2);

        let uncapped = discovery(&storage)
            .with_config(DiscoveryConfig {
                level_cap: 0,
                ..DiscoveryConfig::default()
            })
            .discover(Path::new("/r"), &jpegs())
            .unwrap();
        assert_eq!(uncapped.len(), 7);
    }

    // ── Descent rules ────────────────────────────────────────────────────

    #[test]
    fn folder_with_pictures_is_not_descended_below_root() {
        let mut storage = MemoryStorage::new();
        storage.add_file("/r/A/1.jpg", JPEG);
        add_jpegs(&mut storage, "/r/A/Deep", 3);

        assert_eq!(run(&storage), ["A/1.jpg"]);
    }

    #[test]
    fn empty_folder_keeps_drilling() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r/A/B/C", 2);

        assert_eq!(run(&storage), ["A/B/C/1.jpg", "A/B/C/2.jpg"]);
    }

    #[test]
    fn first_level_siblings_are_all_searched() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r/A", 1);
        add_jpegs(&mut storage, "/r/B", 1);
        add_jpegs(&mut storage, "/r/C", 1);

        assert_eq!(run(&storage), ["A/1.jpg", "B/1.jpg", "C/1.jpg"]);
    }

    #[test]
    fn deeper_siblings_are_skipped_after_a_hit() {
        let mut storage = MemoryStorage::new();
        storage.add_dir("/r/A/Empty");
        add_jpegs(&mut storage, "/r/A/First", 2);
        add_jpegs(&mut storage, "/r/A/Second", 2);

        assert_eq!(run(&storage), ["A/First/1.jpg", "A/First/2.jpg"]);
        assert!(storage
            .inspected()
            .iter()
            .all(|p| !p.starts_with("/r/A/Second")));
    }

    #[test]
    fn max_depth_stops_descent() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r/a/b/c", 1);

        let shallow = discovery(&storage)
            .with_config(DiscoveryConfig {
                max_depth: Some(2),
                ..DiscoveryConfig::default()
            })
            .discover(Path::new("/r"), &jpegs())
            .unwrap();
        assert!(shallow.is_empty());

        let unbounded = discovery(&storage)
            .with_config(DiscoveryConfig {
                max_depth: None,
                ..DiscoveryConfig::default()
            })
            .discover(Path::new("/r"), &jpegs())
            .unwrap();
        assert_eq!(unbounded.len(), 1);
    }

    // ── Recovery ─────────────────────────────────────────────────────────

    #[test]
    fn broken_sub_folders_contribute_nothing() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r/Flaky", 2);
        add_jpegs(&mut storage, "/r/Locked", 2);
        add_jpegs(&mut storage, "/r/Cloud", 2);
        add_jpegs(&mut storage, "/r/Good", 1);
        storage.fail_listing("/r/Flaky");
        storage.mark_unreadable("/r/Locked");
        storage.mark_remote("/r/Cloud");

        assert_eq!(run(&storage), ["Good/1.jpg"]);
    }

    #[test]
    fn unclassifiable_nodes_are_ignored() {
        let mut storage = MemoryStorage::new();
        storage.add_file("/r/bad.jpg", JPEG);
        add_jpegs(&mut storage, "/r/BadDir", 2);
        storage.add_file("/r/good.jpg", JPEG);
        storage.break_node("/r/bad.jpg");
        storage.break_node("/r/BadDir");

        assert_eq!(run(&storage), ["good.jpg"]);
    }

    #[test]
    fn repeated_runs_are_identical() {
        let mut storage = MemoryStorage::new();
        storage.add_file("/r/cover.jpg", JPEG);
        add_jpegs(&mut storage, "/r/A", 6);
        add_jpegs(&mut storage, "/r/B/C", 2);
        add_jpegs(&mut storage, "/r/B/D", 2);

        let engine = discovery(&storage);
        let first = engine.discover(Path::new("/r"), &jpegs()).unwrap();
        let second = engine.discover(Path::new("/r"), &jpegs()).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn cancelled_run_stops_with_cancelled() {
        let mut storage = MemoryStorage::new();
        add_jpegs(&mut storage, "/r", 2);

        let cancel = AtomicBool::new(true);
        let observer = Observer {
            progress: None,
            cancel: Some(&cancel),
        };
        let err = discovery(&storage)
            .discover_observed(Path::new("/r"), &jpegs(), &observer)
            .unwrap_err();
        assert!(matches!(err, DiscoveryError::Cancelled));
    }

    #[test]
    fn observer_reports_each_searched_folder() {
        let mut storage = MemoryStorage::new();
        storage.add_file("/r/cover.jpg", JPEG);
        add_jpegs(&mut storage, "/r/A", 2);

        let (tx, rx) = crossbeam_channel::unbounded();
        let observer = Observer {
            progress: Some(&tx),
            cancel: None,
        };
        discovery(&storage)
            .discover_observed(Path::new("/r"), &jpegs(), &observer)
            .unwrap();

        let events: Vec<DiscoveryProgress> = rx.try_iter().collect();
        assert_eq!(
            events,
            [
                DiscoveryProgress::FolderSearched {
                    path: "/r".into(),
                    depth: 0,
                    found: 1
                },
                DiscoveryProgress::FolderSearched {
                    path: "/r/A".into(),
                    depth: 1,
                    found: 2
                },
            ]
        );
    }
}
