/// Discovery progress reporting: lightweight messages sent from the
/// discovery thread to whoever holds the handle, via a crossbeam channel.
///
/// The records themselves are returned by `DiscoveryHandle::join`; these
/// messages carry only counters and status.
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryProgress {
    /// A folder's own entries have been searched.
    FolderSearched {
        path: String,
        depth: usize,
        /// Qualifying files found directly in this folder.
        found: usize,
    },
    /// Discovery completed; `records` files were collected.
    Complete { duration: Duration, records: usize },
    /// The root could not be searched.
    Failed { message: String },
    /// Discovery was cancelled through the handle.
    Cancelled,
}

impl DiscoveryProgress {
    /// Whether no further messages follow this one.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::FolderSearched { .. })
    }
}
