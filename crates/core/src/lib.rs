//! # filedrop Core
//!
//! Business logic of the filedrop file service:
//! - Upload with extension allow-list, filename sanitisation and collision handling
//! - Listing, lookup, retrieval and deletion driven by the metadata document
//! - Startup configuration
//!
//! **No API concerns**: HTTP routing, content negotiation and response rendering belong in
//! `api-rest`.

pub mod config;
pub mod constants;
mod error;
pub mod service;

pub use config::CoreConfig;
pub use constants::{
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_METADATA_FILE, DEFAULT_REST_ADDR, DEFAULT_STORAGE_DIR,
};
pub use error::{CoreError, CoreResult};
pub use filedrop_files::{FileRecord, StoredName};
pub use service::{
    DeletedFile, FileService, ListedFile, LocatedFile, Lookup, RetrievedFile, UploadedFile,
};
