/// Discovery module. Finds preview-able media in a folder tree.
///
/// - [`traverser`] holds the search itself ([`MediaDiscovery::discover`]).
/// - [`heuristics`] holds the early-abort rules as pure functions.
/// - [`albums`] runs independent discoveries for many albums in parallel.
/// - [`start_discovery`] runs one discovery on a background thread and
///   reports progress through a crossbeam channel.
pub mod albums;
pub mod heuristics;
pub mod progress;
pub mod traverser;

pub use albums::{album_roots, AlbumPreview};
pub use progress::DiscoveryProgress;
pub use traverser::MediaDiscovery;

use crate::error::DiscoveryError;
use crate::model::{MediaRecord, MimeSet};
use crate::paths::PathMapper;
use crate::storage::Storage;
use crossbeam_channel::Receiver;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Instant;
use traverser::Observer;

/// Maximum number of progress messages that may queue up in the channel.
///
/// Messages beyond this are dropped rather than stalling the search; the
/// result returned by [`DiscoveryHandle::join`] is always complete.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 4_096;

/// Handle to a running or completed background discovery.
pub struct DiscoveryHandle {
    /// Receiver for progress updates from the discovery thread.
    pub progress_rx: Receiver<DiscoveryProgress>,
    cancel_flag: Arc<AtomicBool>,
    thread: thread::JoinHandle<Result<Vec<MediaRecord>, DiscoveryError>>,
}

impl DiscoveryHandle {
    /// Request the discovery to stop before it searches another folder.
    pub fn cancel(&self) {
        self.cancel_flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_flag.load(Ordering::Relaxed)
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the discovery to finish and take its result.
    pub fn join(self) -> Result<Vec<MediaRecord>, DiscoveryError> {
        self.thread
            .join()
            .unwrap_or(Err(DiscoveryError::WorkerPanicked))
    }
}

/// Start a discovery of `root` on a background thread.
///
/// The search itself stays single-threaded; this only moves it off the
/// caller's thread. Fails if the thread cannot be spawned.
pub fn start_discovery<S, M>(
    discovery: Arc<MediaDiscovery<S, M>>,
    root: PathBuf,
    supported: MimeSet,
) -> io::Result<DiscoveryHandle>
where
    S: Storage + Send + Sync + 'static,
    M: PathMapper + Send + Sync + 'static,
{
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<DiscoveryProgress>(PROGRESS_CHANNEL_CAPACITY);
    let cancel_flag = Arc::new(AtomicBool::new(false));
    let cancel_clone = cancel_flag.clone();

    let thread = thread::Builder::new()
        .name("mediaprobe-discovery".into())
        .spawn(move || {
            let start = Instant::now();
            let observer = Observer {
                progress: Some(&progress_tx),
                cancel: Some(&cancel_clone),
            };
            let result = discovery.discover_observed(&root, &supported, &observer);

            let last = match &result {
                Ok(records) => DiscoveryProgress::Complete {
                    duration: start.elapsed(),
                    records: records.len(),
                },
                Err(DiscoveryError::Cancelled) => DiscoveryProgress::Cancelled,
                Err(err) => DiscoveryProgress::Failed {
                    message: err.to_string(),
                },
            };
            // Progress never fills the final slot, so this cannot block.
            let _ = progress_tx.send(last);
            result
        })?;

    Ok(DiscoveryHandle {
        progress_rx,
        cancel_flag,
        thread,
    })
}
