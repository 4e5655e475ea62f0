//! JSON bodies exchanged over the filedrop API.
//!
//! Field names are part of the wire format and match the keys of the metadata document.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A stored file's record exactly as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileMetadataRes {
    /// Filename as supplied by the uploader
    pub original_name: String,
    /// Size in bytes
    pub size: u64,
    /// Human-readable size, e.g. `12.3 KB`
    pub size_formatted: String,
    /// Local ISO 8601 upload timestamp
    pub upload_date: String,
    /// Path relative to the storage root
    pub path: String,
    /// `YYYY/MM/DD` partition
    pub date_folder: String,
}

/// Response to a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UploadRes {
    pub message: String,
    /// Name the file was stored under; use it for retrieval, info and delete
    pub filename: String,
    pub metadata: FileMetadataRes,
}

/// One entry of `GET /list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct FileSummary {
    pub filename: String,
    pub original_name: String,
    pub size: u64,
    pub size_formatted: String,
    pub upload_date: String,
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MessageRes {
    pub message: String,
}

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    pub error: String,
}
