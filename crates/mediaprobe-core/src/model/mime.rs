/// Mime-type detection by file extension and the supported-type set.
///
/// Local storage has no content sniffing; the media type of a file is
/// derived from its extension, the same way a gallery backend's file cache
/// would record it.
use compact_str::CompactString;
use std::collections::HashSet;
use std::path::Path;

/// Mime type reported for files whose extension is not recognised.
pub const FALLBACK_MIME: &str = "application/octet-stream";

/// The image types a gallery preview grid can render out of the box.
pub const DEFAULT_IMAGE_MIMES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/gif",
    "image/webp",
    "image/bmp",
    "image/tiff",
    "image/heic",
    "image/heif",
    "image/x-xbitmap",
];

/// Map a file extension (without the dot) to its mime type.
///
/// Zero-heap-allocation hot path: extensions are lowercased into a
/// fixed-size stack buffer. Extensions longer than 16 bytes are unknown.
pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    let bytes = ext.as_bytes();
    if bytes.is_empty() || bytes.len() > 16 {
        return None;
    }

    let mut lower = [0u8; 16];
    for (dest, &src) in lower.iter_mut().zip(bytes.iter()) {
        *dest = src.to_ascii_lowercase();
    }
    let lower_str = std::str::from_utf8(&lower[..bytes.len()]).ok()?;

    let mime = match lower_str {
        // Images
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "xbm" => "image/x-xbitmap",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "psd" => "image/vnd.adobe.photoshop",
        "avif" => "image/avif",
        "cr2" => "image/x-canon-cr2",
        "nef" => "image/x-nikon-nef",
        "dng" => "image/x-adobe-dng",
        // Video
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        "mpg" | "mpeg" => "video/mpeg",
        "3gp" => "video/3gpp",
        // Audio
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        // Documents
        "pdf" => "application/pdf",
        "txt" | "md" => "text/plain",
        _ => return None,
    };
    Some(mime)
}

/// Mime type of a path, derived from its extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_for_extension)
        .unwrap_or(FALLBACK_MIME)
}

/// The caller-supplied set of media types a discovery run collects.
///
/// Membership is case-insensitive: entries are stored lowercased.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MimeSet {
    types: HashSet<CompactString>,
}

impl MimeSet {
    /// An empty set. Legal input: a discovery with it never matches.
    pub fn new() -> Self {
        Self::default()
    }

    /// The default gallery image types.
    pub fn default_images() -> Self {
        DEFAULT_IMAGE_MIMES.iter().copied().collect()
    }

    /// Add `mime`, ignoring case and surrounding whitespace.
    pub fn insert(&mut self, mime: &str) {
        self.types.insert(lowercase(mime.trim()));
    }

    /// Whether `mime` is one of the supported types.
    pub fn contains(&self, mime: &str) -> bool {
        if mime.bytes().any(|b| b.is_ascii_uppercase()) {
            self.types.contains(&lowercase(mime))
        } else {
            self.types.contains(mime)
        }
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Supported types in sorted order, for display and logging.
    pub fn sorted(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.types.iter().map(CompactString::as_str).collect();
        types.sort_unstable();
        types
    }
}

impl<S: AsRef<str>> FromIterator<S> for MimeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for mime in iter {
            set.insert(mime.as_ref());
        }
        set
    }
}

fn lowercase(mime: &str) -> CompactString {
    CompactString::new(mime.to_ascii_lowercase())
}
