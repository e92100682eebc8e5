/// In-memory storage for tests and embedders without a real filesystem.
///
/// Paths are treated literally; callers should use consistent absolute
/// paths. Children keep insertion order, which stands in for "directory
/// listing order". Failures can be injected per path, and every file whose
/// attributes the traverser inspects is logged so tests can observe how far
/// a scan went.
use super::{NodeKind, Storage};
use crate::error::StorageError;
use crate::model::FileId;
use compact_str::CompactString;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
enum MemNode {
    Dir {
        children: Vec<PathBuf>,
    },
    File {
        id: FileId,
        mime: CompactString,
        modified: i64,
    },
}

/// A tree of folders and files held entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    nodes: HashMap<PathBuf, MemNode>,
    next_id: u64,
    unreadable: HashSet<PathBuf>,
    remote: HashSet<PathBuf>,
    failing_listings: HashSet<PathBuf>,
    broken: HashSet<PathBuf>,
    inspected: Mutex<Vec<PathBuf>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a folder, creating missing ancestors.
    pub fn add_dir<P: Into<PathBuf>>(&mut self, path: P) {
        let path = path.into();
        if self.nodes.contains_key(&path) {
            return;
        }
        self.ensure_parent_link(&path);
        self.nodes.insert(
            path,
            MemNode::Dir {
                children: Vec::new(),
            },
        );
    }

    /// Add a file with the given media type, modified at the epoch.
    pub fn add_file<P: Into<PathBuf>>(&mut self, path: P, mime: &str) -> FileId {
        self.add_file_with(path, mime, 0)
    }

    /// Add a file with an explicit modification time.
    ///
    /// # Panics
    ///
    /// If `path` is already a folder.
    pub fn add_file_with<P: Into<PathBuf>>(
        &mut self,
        path: P,
        mime: &str,
        modified: i64,
    ) -> FileId {
        let path = path.into();
        assert!(
            !matches!(self.nodes.get(&path), Some(MemNode::Dir { .. })),
            "{} is already a folder",
            path.display()
        );
        self.next_id += 1;
        let id = FileId(self.next_id);
        self.ensure_parent_link(&path);
        self.nodes.insert(
            path,
            MemNode::File {
                id,
                mime: CompactString::new(mime),
                modified,
            },
        );
        id
    }

    /// The folder exists but refuses to be listed.
    pub fn mark_unreadable<P: Into<PathBuf>>(&mut self, path: P) {
        self.unreadable.insert(path.into());
    }

    /// Everything at or below `path` lives on remote storage.
    pub fn mark_remote<P: Into<PathBuf>>(&mut self, path: P) {
        self.remote.insert(path.into());
    }

    /// Listing `path` raises an I/O error even though it looks readable.
    pub fn fail_listing<P: Into<PathBuf>>(&mut self, path: P) {
        self.failing_listings.insert(path.into());
    }

    /// Every attribute read on `path` (type, mime, id, mtime) fails.
    pub fn break_node<P: Into<PathBuf>>(&mut self, path: P) {
        self.broken.insert(path.into());
    }

    /// Files whose media type was read, in the order they were inspected.
    pub fn inspected(&self) -> Vec<PathBuf> {
        self.inspected.lock().clone()
    }

    pub fn clear_inspected(&self) {
        self.inspected.lock().clear();
    }

    fn ensure_parent_link(&mut self, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        if parent.as_os_str().is_empty() {
            return;
        }
        if !self.nodes.contains_key(parent) {
            self.nodes.insert(
                parent.to_path_buf(),
                MemNode::Dir {
                    children: Vec::new(),
                },
            );
            self.ensure_parent_link(parent);
        }
        if let Some(MemNode::Dir { children }) = self.nodes.get_mut(parent) {
            if !children.iter().any(|p| p.as_path() == path) {
                children.push(path.to_path_buf());
            }
        }
    }

    fn check_broken(&self, path: &Path) -> Result<(), StorageError> {
        if self.broken.contains(path) {
            Err(injected(path))
        } else {
            Ok(())
        }
    }

    fn file(&self, path: &Path) -> Result<(FileId, &CompactString, i64), StorageError> {
        self.check_broken(path)?;
        match self.nodes.get(path) {
            Some(MemNode::File { id, mime, modified }) => Ok((*id, mime, *modified)),
            Some(MemNode::Dir { .. }) => Err(StorageError::Unsupported(path.to_path_buf())),
            None => Err(StorageError::Missing(path.to_path_buf())),
        }
    }
}

impl Storage for MemoryStorage {
    fn is_readable(&self, dir: &Path) -> bool {
        matches!(self.nodes.get(dir), Some(MemNode::Dir { .. })) && !self.unreadable.contains(dir)
    }

    fn is_local(&self, path: &Path) -> bool {
        !path.ancestors().any(|p| self.remote.contains(p))
    }

    fn list_children(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        if self.failing_listings.contains(dir) {
            return Err(injected(dir));
        }
        match self.nodes.get(dir) {
            Some(MemNode::Dir { children }) => Ok(children.clone()),
            Some(MemNode::File { .. }) => Err(StorageError::Unsupported(dir.to_path_buf())),
            None => Err(StorageError::Missing(dir.to_path_buf())),
        }
    }

    fn node_exists(&self, dir: &Path, name: &str) -> bool {
        self.nodes.contains_key(&dir.join(name))
    }

    fn node_kind(&self, path: &Path) -> Result<NodeKind, StorageError> {
        self.check_broken(path)?;
        match self.nodes.get(path) {
            Some(MemNode::Dir { .. }) => Ok(NodeKind::Dir),
            Some(MemNode::File { .. }) => Ok(NodeKind::File),
            None => Err(StorageError::Missing(path.to_path_buf())),
        }
    }

    fn mime_type(&self, path: &Path) -> Result<CompactString, StorageError> {
        self.inspected.lock().push(path.to_path_buf());
        self.file(path).map(|(_, mime, _)| mime.clone())
    }

    fn file_id(&self, path: &Path) -> Result<FileId, StorageError> {
        self.file(path).map(|(id, _, _)| id)
    }

    fn modified_time(&self, path: &Path) -> Result<i64, StorageError> {
        self.file(path).map(|(_, _, modified)| modified)
    }
}

fn injected(path: &Path) -> StorageError {
    StorageError::io(path, io::Error::other("injected storage failure"))
}
