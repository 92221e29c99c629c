//! ZIP archive builder.

use crate::error::SyncError;
use crate::sync::snapshot::ArchiveEntry;
use crate::sync::target::ArchiveBuilder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    #[default]
    Deflated,
    Stored,
}

impl From<ArchiveCompression> for CompressionMethod {
    fn from(value: ArchiveCompression) -> Self {
        match value {
            ArchiveCompression::Deflated => CompressionMethod::Deflated,
            ArchiveCompression::Stored => CompressionMethod::Stored,
        }
    }
}

/// Builds in-memory ZIP archives. Folders become directory entries so empty
/// ones survive the round trip; binary files are stored byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiveBuilder {
    compression: ArchiveCompression,
}

impl ZipArchiveBuilder {
    pub fn new(compression: ArchiveCompression) -> Self {
        Self { compression }
    }
}

impl ArchiveBuilder for ZipArchiveBuilder {
    fn build(&self, entries: &[ArchiveEntry]) -> Result<Vec<u8>, SyncError> {
        let zip_err = |e: zip::result::ZipError| SyncError::Archive(e.to_string());

        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let text_options = FileOptions::default()
            .compression_method(self.compression.into())
            .unix_permissions(0o644);
        // Binary payloads are stored uncompressed
        let binary_options = FileOptions::default()
            .compression_method(CompressionMethod::Stored)
            .unix_permissions(0o644);
        let dir_options = FileOptions::default().unix_permissions(0o755);

        for entry in entries {
            match entry {
                ArchiveEntry::Folder { path } => {
                    writer
                        .add_directory(path.as_str(), dir_options)
                        .map_err(zip_err)?;
                }
                ArchiveEntry::File {
                    path,
                    bytes,
                    is_binary,
                } => {
                    let options = if *is_binary {
                        binary_options
                    } else {
                        text_options
                    };
                    writer.start_file(path.as_str(), options).map_err(zip_err)?;
                    writer
                        .write_all(bytes)
                        .map_err(|e| SyncError::Archive(e.to_string()))?;
                }
            }
        }

        let cursor = writer.finish().map_err(zip_err)?;
        Ok(cursor.into_inner())
    }
}

/// `<project>_<base36 millis>.zip`
pub fn archive_file_name(project_name: &str, now: DateTime<Utc>) -> String {
    let stem: String = project_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '-'
            }
        })
        .collect();
    let stem = if stem.is_empty() { "project" } else { stem.as_str() };
    let millis = u64::try_from(now.timestamp_millis()).unwrap_or_default();
    format!("{}_{}.zip", stem, to_base36(millis))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    out.into_iter().map(char::from).collect()
}
