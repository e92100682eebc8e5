/// Storage abstraction consumed by the discovery traverser.
///
/// The traverser never touches the filesystem directly. Everything it needs
/// (listing a folder, classifying a node, reading a file's attributes)
/// goes through [`Storage`], which keeps the search logic testable against
/// [`MemoryStorage`] and lets embedders plug in their own file cache.
pub mod local;
pub mod memory;

pub use local::LocalStorage;
pub use memory::MemoryStorage;

use crate::error::StorageError;
use crate::model::FileId;
use compact_str::CompactString;
use std::path::{Path, PathBuf};

/// What a node turned out to be when its type was read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    File,
    Dir,
}

/// Minimal, synchronous storage interface used by the traverser.
pub trait Storage {
    /// Whether `dir` may be listed.
    fn is_readable(&self, dir: &Path) -> bool;

    /// Whether `path` lives on local storage. Remote nodes are never scanned.
    fn is_local(&self, path: &Path) -> bool;

    /// Direct children of `dir`, in listing order.
    fn list_children(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError>;

    /// Whether `dir` contains an entry called `name`.
    fn node_exists(&self, dir: &Path, name: &str) -> bool;

    /// Read the type of a node.
    fn node_kind(&self, path: &Path) -> Result<NodeKind, StorageError>;

    /// Detected media type of a file.
    fn mime_type(&self, path: &Path) -> Result<CompactString, StorageError>;

    /// Stable identifier of a file.
    fn file_id(&self, path: &Path) -> Result<FileId, StorageError>;

    /// Last modification of a file, in seconds since the Unix epoch.
    fn modified_time(&self, path: &Path) -> Result<i64, StorageError>;

    /// List `dir` if it is readable and local.
    ///
    /// An unreadable or remote folder is reported as an error rather than an
    /// empty listing so the caller can tell "empty" from "unusable".
    fn list_nodes(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        if !self.is_readable(dir) {
            return Err(StorageError::Unreadable(dir.to_path_buf()));
        }
        if !self.is_local(dir) {
            return Err(StorageError::NotLocal(dir.to_path_buf()));
        }
        self.list_children(dir)
    }
}

impl<T: Storage + ?Sized> Storage for &T {
    fn is_readable(&self, dir: &Path) -> bool {
        (**self).is_readable(dir)
    }

    fn is_local(&self, path: &Path) -> bool {
        (**self).is_local(path)
    }

    fn list_children(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        (**self).list_children(dir)
    }

    fn node_exists(&self, dir: &Path, name: &str) -> bool {
        (**self).node_exists(dir, name)
    }

    fn node_kind(&self, path: &Path) -> Result<NodeKind, StorageError> {
        (**self).node_kind(path)
    }

    fn mime_type(&self, path: &Path) -> Result<CompactString, StorageError> {
        (**self).mime_type(path)
    }

    fn file_id(&self, path: &Path) -> Result<FileId, StorageError> {
        (**self).file_id(path)
    }

    fn modified_time(&self, path: &Path) -> Result<i64, StorageError> {
        (**self).modified_time(path)
    }

    fn list_nodes(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        (**self).list_nodes(dir)
    }
}
