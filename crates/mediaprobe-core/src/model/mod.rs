/// Data model for discovery results.
///
/// Re-exports the flat media record and the supported-type set.
pub mod media_record;
pub mod mime;

pub use media_record::{FileId, MediaRecord};
pub use mime::{mime_for_extension, mime_for_path, MimeSet};
