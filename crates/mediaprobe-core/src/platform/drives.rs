/// Drive type lookup using the Windows API.
///
/// Paths on mapped network drives or UNC shares are remote storage.
use std::iter;
use std::path::{Component, Path, Prefix};
use windows::core::PCWSTR;
use windows::Win32::Storage::FileSystem::GetDriveTypeW;

// Drive type constant from the Windows API.
const DRIVE_REMOTE_VAL: u32 = 4;

/// Whether `path` lives on a network drive or UNC share.
///
/// Relative paths and paths whose drive cannot be determined are local.
pub fn is_remote_path(path: &Path) -> bool {
    let Some(Component::Prefix(prefix)) = path.components().next() else {
        return false;
    };

    match prefix.kind() {
        Prefix::UNC(..) | Prefix::VerbatimUNC(..) => return true,
        Prefix::Disk(_) | Prefix::VerbatimDisk(_) => {}
        _ => return false,
    }

    let mut root = prefix.as_os_str().to_string_lossy().into_owned();
    root.push('\\');
    let root_wide: Vec<u16> = root.encode_utf16().chain(iter::once(0)).collect();
    let raw_type = unsafe { GetDriveTypeW(PCWSTR(root_wide.as_ptr())) };

    raw_type == DRIVE_REMOTE_VAL
}
