/// Platform-specific functionality: deciding whether a path lives on
/// local storage.
///
/// Remote storage (network shares, cloud mounts) is never scanned for
/// previews; this module is where "remote" gets its concrete meaning.
#[cfg(windows)]
pub mod drives;
#[cfg(unix)]
pub mod mounts;

use std::path::Path;

/// Snapshot of the host's storage layout, taken once per backend.
#[derive(Debug, Clone, Default)]
pub struct Locality {
    #[cfg(unix)]
    mounts: mounts::MountTable,
}

impl Locality {
    /// Inspect the running system.
    pub fn detect() -> Self {
        Self {
            #[cfg(unix)]
            mounts: mounts::MountTable::load(),
        }
    }

    /// Whether this snapshot can ever report a path as remote.
    ///
    /// Lets callers skip path canonicalisation when nothing is remote.
    pub fn may_be_remote(&self) -> bool {
        #[cfg(unix)]
        {
            self.mounts.has_remote()
        }
        #[cfg(not(unix))]
        {
            true
        }
    }

    /// Whether `path` is on local storage. Expects an absolute path.
    pub fn is_local(&self, path: &Path) -> bool {
        #[cfg(unix)]
        {
            !self.mounts.is_remote(path)
        }
        #[cfg(windows)]
        {
            !drives::is_remote_path(path)
        }
        #[cfg(not(any(unix, windows)))]
        {
            let _ = path;
            true
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn default_locality_is_all_local() {
        let locality = Locality::default();
        assert!(!locality.may_be_remote());
        assert!(locality.is_local(Path::new("/srv/photos")));
    }

    #[test]
    fn remote_mounts_are_detected() {
        let locality = Locality {
            mounts: mounts::MountTable::parse(
                "/dev/sda1 / ext4 rw 0 0\nnas:/p /mnt/nas nfs rw 0 0\n",
            ),
        };
        assert!(locality.may_be_remote());
        assert!(!locality.is_local(Path::new("/mnt/nas/a.jpg")));
        assert!(locality.is_local(Path::new("/home/a.jpg")));
    }
}
