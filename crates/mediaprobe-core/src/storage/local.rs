/// Real-filesystem storage backend built on `std::fs`.
///
/// Symlinks are never followed: they classify as unsupported nodes, which
/// keeps the traversal free of cycles. Listings are sorted by file name so
/// that two runs over an unmodified tree visit nodes in the same order.
use super::{NodeKind, Storage};
use crate::error::StorageError;
use crate::model::{mime_for_path, FileId};
use crate::platform::Locality;
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Storage backed by the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct LocalStorage {
    locality: Locality,
}

impl LocalStorage {
    /// Create a backend using the live mount table / drive layout.
    pub fn new() -> Self {
        Self::with_locality(Locality::detect())
    }

    /// Create a backend with an explicit locality snapshot.
    pub fn with_locality(locality: Locality) -> Self {
        Self { locality }
    }

    fn metadata(path: &Path) -> Result<fs::Metadata, StorageError> {
        fs::symlink_metadata(path).map_err(|err| map_io(path, err))
    }
}

impl Storage for LocalStorage {
    fn is_readable(&self, dir: &Path) -> bool {
        fs::read_dir(dir).is_ok()
    }

    fn is_local(&self, path: &Path) -> bool {
        if !self.locality.may_be_remote() {
            return true;
        }
        let absolute = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.locality.is_local(&absolute)
    }

    fn list_children(&self, dir: &Path) -> Result<Vec<PathBuf>, StorageError> {
        let entries = fs::read_dir(dir).map_err(|err| map_io(dir, err))?;

        let mut children = Vec::new();
        for entry in entries {
            match entry {
                Ok(entry) => children.push(entry.path()),
                Err(err) => trace!("Skipping unreadable entry in {}: {err}", dir.display()),
            }
        }
        children.sort_unstable_by(|a, b| a.file_name().cmp(&b.file_name()));
        Ok(children)
    }

    fn node_exists(&self, dir: &Path, name: &str) -> bool {
        fs::symlink_metadata(dir.join(name)).is_ok()
    }

    fn node_kind(&self, path: &Path) -> Result<NodeKind, StorageError> {
        let file_type = Self::metadata(path)?.file_type();
        if file_type.is_dir() {
            Ok(NodeKind::Dir)
        } else if file_type.is_file() {
            Ok(NodeKind::File)
        } else {
            Err(StorageError::Unsupported(path.to_path_buf()))
        }
    }

    fn mime_type(&self, path: &Path) -> Result<CompactString, StorageError> {
        Ok(CompactString::new(mime_for_path(path)))
    }

    fn file_id(&self, path: &Path) -> Result<FileId, StorageError> {
        let meta = Self::metadata(path)?;
        Ok(file_id_of(path, &meta))
    }

    fn modified_time(&self, path: &Path) -> Result<i64, StorageError> {
        let modified = Self::metadata(path)?
            .modified()
            .map_err(|err| StorageError::io(path, err))?;
        Ok(DateTime::<Utc>::from(modified).timestamp())
    }
}

#[cfg(unix)]
fn file_id_of(_path: &Path, meta: &fs::Metadata) -> FileId {
    use std::os::unix::fs::MetadataExt;
    FileId(meta.ino())
}

/// No stable inode on this platform: derive the id from the path.
#[cfg(not(unix))]
fn file_id_of(path: &Path, _meta: &fs::Metadata) -> FileId {
    FileId(path_digest(path))
}

/// First eight bytes of the SHA-256 of the path, little-endian.
#[cfg(not(unix))]
fn path_digest(path: &Path) -> u64 {
    use sha2::{Digest, Sha256};
    let digest = Sha256::digest(path.as_os_str().as_encoded_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(head)
}

fn map_io(path: &Path, err: io::Error) -> StorageError {
    if err.kind() == io::ErrorKind::NotFound {
        StorageError::Missing(path.to_path_buf())
    } else {
        StorageError::io(path, err)
    }
}
