/// MediaProbe Core: media discovery, storage collaborators, and data model.
///
/// This crate contains all discovery logic with zero CLI dependencies.
/// It is designed to be embedded by gallery backends, thumbnailers, and
/// the `mediaprobe` command-line tool alike.
///
/// # Modules
///
/// - [`model`]: Discovered media records, file ids, and mime-type sets.
/// - [`storage`]: The storage abstraction plus local and in-memory backends.
/// - [`paths`]: Mapping absolute nodes to caller-relative virtual paths.
/// - [`platform`]: Local-vs-remote storage detection (mount table / drive type).
/// - [`discovery`]: The depth-bounded media discovery traverser.
/// - [`config`]: Layered configuration (defaults, TOML file, environment).
/// - [`error`]: Error types shared across modules.
pub mod config;
pub mod discovery;
pub mod error;
pub mod model;
pub mod paths;
pub mod platform;
pub mod storage;

pub use config::{Config, DiscoveryConfig, MediaConfig};
pub use discovery::{start_discovery, AlbumPreview, DiscoveryHandle, MediaDiscovery};
pub use error::{ConfigError, DiscoveryError, StorageError};
pub use model::{FileId, MediaRecord, MimeSet};
pub use paths::{PathMapper, RootRelativeMapper};
pub use storage::{LocalStorage, MemoryStorage, NodeKind, Storage};
