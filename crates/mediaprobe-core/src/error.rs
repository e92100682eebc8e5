/// Error types for storage access, discovery, and configuration.
///
/// Storage errors are mostly recovered inside the traverser; only a failure
/// to list the discovery root escapes as [`DiscoveryError::NotFound`].
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A failure reported by a [`Storage`](crate::storage::Storage) backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An underlying I/O call failed.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The folder exists but cannot be listed.
    #[error("folder is not readable: {}", .0.display())]
    Unreadable(PathBuf),

    /// The folder lives on remote storage and is not scanned.
    #[error("folder is not on local storage: {}", .0.display())]
    NotLocal(PathBuf),

    /// No node exists at the path.
    #[error("no such node: {}", .0.display())]
    Missing(PathBuf),

    /// The node is neither a regular file nor a directory (e.g. a symlink).
    #[error("unsupported node type: {}", .0.display())]
    Unsupported(PathBuf),
}

impl StorageError {
    /// Wrap an `io::Error` together with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// A failure of a whole discovery run.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The discovery root could not be listed at all.
    #[error("folder not found: {}: {message}", .path.display())]
    NotFound { path: PathBuf, message: String },

    /// The run was cancelled through its handle.
    #[error("discovery was cancelled")]
    Cancelled,

    /// The background worker thread panicked before producing a result.
    #[error("discovery worker panicked")]
    WorkerPanicked,
}

impl DiscoveryError {
    /// `true` for the not-found kind raised when the root is unusable.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Configuration could not be loaded or is invalid.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] Box<figment::Error>),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}
