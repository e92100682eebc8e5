/// Parallel previews for many albums at once.
///
/// Each album gets its own, fully independent discovery run with its own
/// accumulator; runs are spread over a rayon pool and the results are
/// gathered afterwards in input order.
use super::MediaDiscovery;
use crate::error::DiscoveryError;
use crate::model::{MediaRecord, MimeSet};
use crate::paths::PathMapper;
use crate::storage::{NodeKind, Storage};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Discovery result for one album root.
#[derive(Debug)]
pub struct AlbumPreview {
    pub root: PathBuf,
    pub result: Result<Vec<MediaRecord>, DiscoveryError>,
}

impl<S, M> MediaDiscovery<S, M>
where
    S: Storage + Sync,
    M: PathMapper + Sync,
{
    /// Run one discovery per entry of `roots`, in parallel.
    ///
    /// The pool has `worker_threads` threads (one per CPU by default).
    pub fn discover_albums(&self, roots: &[PathBuf], supported: &MimeSet) -> Vec<AlbumPreview> {
        let threads = self.config().worker_threads.unwrap_or_else(num_cpus::get);
        let run = || -> Vec<AlbumPreview> {
            roots
                .par_iter()
                .map(|root| AlbumPreview {
                    root: root.clone(),
                    result: self.discover(root, supported),
                })
                .collect()
        };

        match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("mediaprobe-album-{i}"))
            .build()
        {
            Ok(pool) => pool.install(run),
            Err(err) => {
                warn!("Could not build album pool ({err}); using the global pool");
                run()
            }
        }
    }
}

/// Immediate sub-folders of `root` that are not opted out via `sentinel`,
/// in listing order.
pub fn album_roots<S: Storage + ?Sized>(
    storage: &S,
    root: &Path,
    sentinel: &str,
) -> Result<Vec<PathBuf>, DiscoveryError> {
    let nodes = storage
        .list_nodes(root)
        .map_err(|err| DiscoveryError::NotFound {
            path: root.to_path_buf(),
            message: err.to_string(),
        })?;

    Ok(nodes
        .into_iter()
        .filter(|node| matches!(storage.node_kind(node), Ok(NodeKind::Dir)))
        .filter(|node| !storage.node_exists(node, sentinel))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiscoveryConfig;
    use crate::paths::RootRelativeMapper;
    use crate::storage::MemoryStorage;

    fn library() -> MemoryStorage {
        let mut storage = MemoryStorage::new();
        for album in ["Beach", "City", "Mountains"] {
            for i in 1..=3 {
                storage.add_file(format!("/lib/{album}/{i}.jpg"), "image/jpeg");
            }
        }
        storage.add_file("/lib/Private/1.jpg", "image/jpeg");
        storage.add_file("/lib/Private/.nomedia", "application/octet-stream");
        storage.add_file("/lib/readme.txt", "text/plain");
        storage
    }

    #[test]
    fn album_roots_skip_files_and_opted_out_folders() {
        let storage = library();
        let roots = album_roots(&storage, Path::new("/lib"), ".nomedia").unwrap();
        assert_eq!(
            roots,
            [
                PathBuf::from("/lib/Beach"),
                PathBuf::from("/lib/City"),
                PathBuf::from("/lib/Mountains")
            ]
        );
    }

    #[test]
    fn album_roots_of_missing_folder_is_not_found() {
        let storage = library();
        let err = album_roots(&storage, Path::new("/nope"), ".nomedia").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn previews_keep_input_order_and_isolate_failures() {
        let storage = library();
        let engine = MediaDiscovery::new(&storage, RootRelativeMapper::new("/lib")).with_config(
            DiscoveryConfig {
                worker_threads: Some(2),
                ..DiscoveryConfig::default()
            },
        );
        let roots = vec![
            PathBuf::from("/lib/Mountains"),
            PathBuf::from("/lib/Missing"),
            PathBuf::from("/lib/Beach"),
        ];
        let supported: MimeSet = ["image/jpeg"].into_iter().collect();

        let previews = engine.discover_albums(&roots, &supported);
        assert_eq!(previews.len(), 3);
        assert_eq!(previews[0].root, roots[0]);

        let mountains = previews[0].result.as_ref().unwrap();
        assert_eq!(mountains.len(), 3);
        assert_eq!(mountains[0].path, "Mountains/1.jpg");

        assert!(previews[1].result.as_ref().unwrap_err().is_not_found());

        let beach = previews[2].result.as_ref().unwrap();
        assert!(beach.iter().all(|r| r.path.starts_with("Beach/")));
    }
}
