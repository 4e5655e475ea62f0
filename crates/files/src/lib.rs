//! filedrop File Storage
//!
//! This crate provides the storage layer of filedrop: where uploaded bytes land on disk and
//! how their records are persisted.
//!
//! ## Storage Layout
//!
//! ```text
//! <storage_root>/
//! └── 2024/
//!     └── 03/
//!         └── 05/          # one partition per local calendar day
//!             ├── report.txt
//!             └── report_20240305_143000.txt
//! metadata.json            # one JSON object keyed by stored filename
//! ```
//!
//! ## Components
//!
//! - [`MetadataStore`]: full-document load/save of the record map
//! - [`DatePartitioner`]: today's `YYYY/MM/DD` partition and its directory
//! - [`resolver`]: extension allow-list, filename sanitisation and collision handling
//! - [`StorageTree`]: path resolution, writes and removals confined to the storage root
//!
//! ## Example Usage
//!
//! ```no_run
//! use filedrop_files::{DatePartitioner, MetadataStore, StorageTree, SystemClock};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tree = StorageTree::new(Path::new("storage"))?;
//! let partitioner = DatePartitioner::new(tree.root(), Arc::new(SystemClock));
//! let store = MetadataStore::new("metadata.json");
//!
//! let dir = partitioner.ensure_partition_dir()?;
//! let records = store.load()?;
//! println!("{} records, writing into {}", records.len(), dir.display());
//! # Ok(())
//! # }
//! ```

mod clock;
mod constants;
mod files;
mod metadata;
mod partition;
pub mod resolver;

pub use clock::{Clock, FixedClock, SystemClock};
pub use constants::{
    ALLOWED_EXTENSIONS, COLLISION_TIMESTAMP_FORMAT, MAX_COLLISION_ATTEMPTS, PARTITION_FORMAT,
    UPLOAD_DATE_FORMAT,
};
pub use files::{media_type, StorageTree, StoredFile};
pub use filedrop_types::{StoredName, TextError};
pub use metadata::{format_size, upload_timestamp, FileRecord, MetadataStore, Records};
pub use partition::DatePartitioner;

/// Errors that can occur during file operations
#[derive(Debug, thiserror::Error)]
pub enum FilesError {
    /// Storage root could not be created or is not a directory
    #[error("Invalid root directory: {0}")]
    InvalidRootDirectory(String),

    /// Path validation failed (potential directory traversal or unsafe path)
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Filename extension is not in the allow-list
    #[error("File type not allowed: {0}")]
    DisallowedExtension(String),

    /// Client-supplied filename cannot be turned into a safe stored name
    #[error("Unsafe filename {name:?}: {reason}")]
    UnsafeFilename { name: String, reason: String },

    /// Every collision-free candidate name was already taken
    #[error("No free name left for {0}")]
    CollisionExhausted(String),

    /// Failed to read the metadata document
    #[error("failed to deserialize metadata: {0}")]
    Deserialization(serde_json::Error),

    /// Failed to write the metadata document
    #[error("failed to serialize metadata: {0}")]
    Serialization(serde_json::Error),

    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FilesResult<T> = std::result::Result<T, FilesError>;
