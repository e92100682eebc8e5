/// Mapping absolute storage paths to caller-relative virtual paths.
///
/// A gallery shows paths relative to the folder the user opened (or to a
/// share root), never the server-side absolute location.
use std::path::{Component, Path, PathBuf};

/// Turns an absolute node into the path the caller should see.
pub trait PathMapper {
    /// `None` when the node cannot be expressed relative to the caller's
    /// view; such files are left out of the results.
    fn to_virtual_path(&self, path: &Path) -> Option<String>;
}

impl<T: PathMapper + ?Sized> PathMapper for &T {
    fn to_virtual_path(&self, path: &Path) -> Option<String> {
        (**self).to_virtual_path(path)
    }
}

/// Maps paths below `root` to `/`-separated relative paths, optionally
/// under a fixed prefix (e.g. a share name).
#[derive(Debug, Clone)]
pub struct RootRelativeMapper {
    root: PathBuf,
    prefix: String,
}

impl RootRelativeMapper {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            prefix: String::new(),
        }
    }

    /// Prepend `prefix` to every mapped path.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into().trim_matches('/').to_string();
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl PathMapper for RootRelativeMapper {
    fn to_virtual_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;

        let mut segments: Vec<&str> = Vec::new();
        if !self.prefix.is_empty() {
            segments.push(&self.prefix);
        }
        for component in relative.components() {
            match component {
                Component::Normal(name) => segments.push(name.to_str()?),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(segments.join("/"))
    }
}
