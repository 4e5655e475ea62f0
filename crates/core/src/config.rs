//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Nothing in the core reads environment variables while handling a
//! request.

use crate::constants::{DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_METADATA_FILE, DEFAULT_STORAGE_DIR};
use crate::{CoreError, CoreResult};
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    storage_dir: PathBuf,
    metadata_file: PathBuf,
    max_upload_bytes: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    pub fn new(
        storage_dir: PathBuf,
        metadata_file: PathBuf,
        max_upload_bytes: usize,
    ) -> CoreResult<Self> {
        if storage_dir.as_os_str().is_empty() {
            return Err(CoreError::Config("storage directory cannot be empty".into()));
        }
        if metadata_file.as_os_str().is_empty() {
            return Err(CoreError::Config("metadata file cannot be empty".into()));
        }
        if max_upload_bytes == 0 {
            return Err(CoreError::Config(
                "maximum upload size must be greater than zero".into(),
            ));
        }

        Ok(Self {
            storage_dir,
            metadata_file,
            max_upload_bytes,
        })
    }

    /// Build a configuration from optional raw values, falling back to the defaults.
    ///
    /// Empty or whitespace-only values count as unset. Callers pass in whatever they read from
    /// the environment or the command line.
    pub fn from_env_values(
        storage_dir: Option<String>,
        metadata_file: Option<String>,
        max_upload_bytes: Option<String>,
    ) -> CoreResult<Self> {
        let storage_dir = non_blank(storage_dir).unwrap_or_else(|| DEFAULT_STORAGE_DIR.into());
        let metadata_file =
            non_blank(metadata_file).unwrap_or_else(|| DEFAULT_METADATA_FILE.into());
        let max_upload_bytes = max_upload_bytes_from_env_value(max_upload_bytes)?;

        Self::new(
            PathBuf::from(storage_dir),
            PathBuf::from(metadata_file),
            max_upload_bytes,
        )
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn metadata_file(&self) -> &Path {
        &self.metadata_file
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            metadata_file: PathBuf::from(DEFAULT_METADATA_FILE),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Parse the upload size limit from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_MAX_UPLOAD_BYTES`].
pub fn max_upload_bytes_from_env_value(value: Option<String>) -> CoreResult<usize> {
    match non_blank(value) {
        None => Ok(DEFAULT_MAX_UPLOAD_BYTES),
        Some(v) => v
            .parse::<usize>()
            .map_err(|e| CoreError::Config(format!("invalid maximum upload size {v:?}: {e}"))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
