//! Constants used throughout the filedrop core crate.
//!
//! Defaults for everything that can be overridden at startup.

/// Default address the REST server binds to.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:5000";

/// Default storage root when no explicit directory is configured.
pub const DEFAULT_STORAGE_DIR: &str = "storage";

/// Default location of the metadata document.
pub const DEFAULT_METADATA_FILE: &str = "metadata.json";

/// Default upper bound on an upload request body (100 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;
