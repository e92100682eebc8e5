/// Mount table parsing for Unix-like systems.
///
/// Reads `/proc/mounts` once and answers "is this path on a network
/// filesystem?" by longest mount-point prefix match.
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Location of the kernel's mount table.
pub const PROC_MOUNTS: &str = "/proc/mounts";

/// Filesystem types that live on another machine.
pub const NETWORK_FILESYSTEMS: &[&str] = &[
    "nfs",
    "nfs4",
    "cifs",
    "smb3",
    "smbfs",
    "ncpfs",
    "afs",
    "ceph",
    "glusterfs",
    "9p",
    "lustre",
    "davfs",
    "fuse.sshfs",
    "fuse.rclone",
    "fuse.davfs2",
];

/// A single mounted filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountEntry {
    pub mount_point: PathBuf,
    pub fs_type: String,
}

impl MountEntry {
    pub fn is_remote(&self) -> bool {
        NETWORK_FILESYSTEMS.contains(&self.fs_type.as_str())
    }
}

/// Snapshot of the mount table, ordered so the deepest mount point that
/// contains a path is always found first.
#[derive(Debug, Clone, Default)]
pub struct MountTable {
    entries: Vec<MountEntry>,
}

impl MountTable {
    /// Load the live mount table. A missing or unreadable table yields an
    /// empty snapshot, in which every path counts as local.
    pub fn load() -> Self {
        match fs::read_to_string(PROC_MOUNTS) {
            Ok(text) => Self::parse(&text),
            Err(err) => {
                debug!("Mount table unavailable ({err}); treating all storage as local");
                Self::default()
            }
        }
    }

    /// Parse the `/proc/mounts` text format:
    /// `device mount_point fs_type options dump pass`.
    pub fn parse(text: &str) -> Self {
        let mut entries: Vec<MountEntry> = text
            .lines()
            .filter_map(|line| {
                let mut fields = line.split_whitespace();
                let _device = fields.next()?;
                let mount_point = fields.next()?;
                let fs_type = fields.next()?;
                Some(MountEntry {
                    mount_point: PathBuf::from(unescape(mount_point)),
                    fs_type: fs_type.to_string(),
                })
            })
            .collect();

        // Later mounts shadow earlier ones on the same mount point, so reverse
        // before the stable sort keeps the most recent first among equals.
        entries.reverse();
        entries.sort_by_key(|e| std::cmp::Reverse(e.mount_point.components().count()));
        Self { entries }
    }

    /// The mount that contains `path`, if any.
    pub fn entry_for(&self, path: &Path) -> Option<&MountEntry> {
        self.entries.iter().find(|e| path.starts_with(&e.mount_point))
    }

    /// Whether `path` sits on a network filesystem.
    pub fn is_remote(&self, path: &Path) -> bool {
        self.entry_for(path).is_some_and(MountEntry::is_remote)
    }

    /// Whether any network filesystem is mounted at all.
    pub fn has_remote(&self) -> bool {
        self.entries.iter().any(MountEntry::is_remote)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decode the octal escapes (`\040` for space, etc.) used in mount points.
fn unescape(field: &str) -> String {
    if !field.contains('\\') {
        return field.to_string();
    }
    let bytes = field.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'\\' && i + 3 < bytes.len() {
            let digits = &bytes[i + 1..i + 4];
            if digits.iter().all(|d| (b'0'..=b'7').contains(d)) {
                let value = digits
                    .iter()
                    .fold(0u32, |acc, d| acc * 8 + u32::from(d - b'0'));
                if let Ok(byte) = u8::try_from(value) {
                    out.push(byte);
                    i += 4;
                    continue;
                }
            }
        }
        out.push(bytes[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}
