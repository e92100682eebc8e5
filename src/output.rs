//! Writing discovery results to stdout as JSON or CSV.

use anyhow::Result;
use mediaprobe_core::{AlbumPreview, MediaRecord};
use serde::Serialize;
use std::io::Write;

/// One CSV row; `album` is empty for a single-root discovery.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CsvRow<'a> {
    album: &'a str,
    path: &'a str,
    file_id: u64,
    mime_type: &'a str,
    modified_time: i64,
    modified: String,
}

impl<'a> CsvRow<'a> {
    fn new(album: &'a str, record: &'a MediaRecord) -> Self {
        Self {
            album,
            path: &record.path,
            file_id: record.file_id.get(),
            mime_type: &record.mime_type,
            modified_time: record.modified_time,
            modified: record
                .modified_at()
                .map(|at| at.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
struct AlbumJson<'a> {
    album: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    records: Option<&'a [MediaRecord]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn write_json<W: Write>(mut out: W, records: &[MediaRecord]) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, records)?;
    writeln!(out)?;
    Ok(())
}

pub fn write_csv<W: Write>(out: W, records: &[MediaRecord]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for record in records {
        writer.serialize(CsvRow::new("", record))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_albums_json<W: Write>(mut out: W, previews: &[AlbumPreview]) -> Result<()> {
    let albums: Vec<AlbumJson<'_>> = previews
        .iter()
        .map(|preview| {
            let album = album_name(preview);
            match &preview.result {
                Ok(records) => AlbumJson {
                    album,
                    records: Some(records.as_slice()),
                    error: None,
                },
                Err(err) => AlbumJson {
                    album,
                    records: None,
                    error: Some(err.to_string()),
                },
            }
        })
        .collect();
    serde_json::to_writer_pretty(&mut out, &albums)?;
    writeln!(out)?;
    Ok(())
}

/// Failed albums are logged rather than written, keeping every row uniform.
pub fn write_albums_csv<W: Write>(out: W, previews: &[AlbumPreview]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for preview in previews {
        let album = album_name(preview);
        match &preview.result {
            Ok(records) => {
                for record in records {
                    writer.serialize(CsvRow::new(&album, record))?;
                }
            }
            Err(err) => tracing::warn!("Album {album} skipped: {err}"),
        }
    }
    writer.flush()?;
    Ok(())
}

fn album_name(preview: &AlbumPreview) -> String {
    preview
        .root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| preview.root.display().to_string())
}
