/// A single discovered media file, flattened for the caller.
///
/// Records carry no reference back to the storage layer: the path is the
/// caller-relative virtual path, and the id is whatever stable identifier
/// the storage backend hands out.
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// Opaque, stable identifier of a file within its storage.
///
/// Uses `u64` so it can hold an inode number directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub u64);

impl FileId {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// One entry per discovered file, in discovery order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    /// Caller-relative virtual path, produced by a [`PathMapper`](crate::paths::PathMapper).
    pub path: String,

    /// Storage-level identifier of the file.
    pub file_id: FileId,

    /// Detected media type. Always a member of the supported set used for
    /// the discovery run that produced this record.
    pub mime_type: CompactString,

    /// Last modification, in seconds since the Unix epoch.
    pub modified_time: i64,
}

impl MediaRecord {
    /// Modification time as a UTC timestamp, or `None` if out of range.
    pub fn modified_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.modified_time, 0)
    }
}
