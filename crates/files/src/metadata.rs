//! Side-car metadata document.
//!
//! The whole record map lives in a single JSON object keyed by stored filename. It is always
//! read and written as a whole; there are no partial updates.

use crate::constants::UPLOAD_DATE_FORMAT;
use crate::{FilesError, FilesResult};
use chrono::{DateTime, Local};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Record map keyed by stored filename.
pub type Records = BTreeMap<String, FileRecord>;

/// Metadata for a stored file
///
/// Created once at upload time and never modified afterwards. `size_formatted` is cached at
/// creation and not recomputed on read.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct FileRecord {
    /// Filename exactly as the client sent it
    pub original_name: String,

    /// Size of the written file in bytes
    pub size: u64,

    /// Human-readable size, e.g. `12.3 KB`
    pub size_formatted: String,

    /// Local ISO 8601 timestamp of the upload
    pub upload_date: String,

    /// Path of the file relative to the storage root
    pub path: String,

    /// `YYYY/MM/DD` partition the file was written under
    pub date_folder: String,
}

impl FileRecord {
    /// Builds the record for a file of `size` bytes written under `date_folder`.
    pub fn new(
        original_name: impl Into<String>,
        size: u64,
        path: impl Into<String>,
        date_folder: impl Into<String>,
        uploaded_at: DateTime<Local>,
    ) -> Self {
        Self {
            original_name: original_name.into(),
            size,
            size_formatted: format_size(size),
            upload_date: upload_timestamp(uploaded_at),
            path: path.into(),
            date_folder: date_folder.into(),
        }
    }
}

/// Formats `at` the way `upload_date` is stored.
pub fn upload_timestamp(at: DateTime<Local>) -> String {
    at.format(UPLOAD_DATE_FORMAT).to_string()
}

/// Formats a byte count with one decimal place in B, KB, MB, GB or TB (base 1024).
pub fn format_size(size: u64) -> String {
    let mut size = size as f64;
    for unit in ["B", "KB", "MB", "GB"] {
        if size < 1024.0 {
            return format!("{size:.1} {unit}");
        }
        size /= 1024.0;
    }
    format!("{size:.1} TB")
}

/// Full-document JSON store for [`FileRecord`]s.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
}

impl MetadataStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the metadata document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads every record.
    ///
    /// A missing document is an empty store. A document that exists but does not parse is an
    /// error; it is never silently replaced.
    pub fn load(&self) -> FilesResult<Records> {
        if !self.path.exists() {
            return Ok(Records::new());
        }
        let content = fs::read_to_string(&self.path)?;
        serde_json::from_str(&content).map_err(FilesError::Deserialization)
    }

    /// Replaces the document with `records`.
    ///
    /// The JSON is written to a temporary sibling and renamed into place, so a concurrent
    /// reader sees either the old or the new document.
    pub fn save(&self, records: &Records) -> FilesResult<()> {
        let content = serde_json::to_string_pretty(records).map_err(FilesError::Serialization)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let tmp_file = dir.join(format!(".metadata-{}.tmp", uuid::Uuid::new_v4()));
        fs::write(&tmp_file, content)?;
        if let Err(e) = fs::rename(&tmp_file, &self.path) {
            let _ = fs::remove_file(&tmp_file);
            return Err(e.into());
        }
        Ok(())
    }
}
