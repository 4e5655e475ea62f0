//! Storage tree implementation
//!
//! This module provides [`StorageTree`], the only type in filedrop that touches uploaded bytes
//! on disk. Every path it resolves, writes or removes is derived from the storage root plus
//! components that have been checked to stay beneath it.
//!
//! # Storage Layout
//!
//! ```text
//! <storage_root>/
//! └── YYYY/MM/DD/<stored name>
//! ```
//!
//! Paths handed out to callers (and persisted in the metadata document) are relative to the
//! root and always use `/` as separator, e.g. `2024/03/05/report.txt`.
//!
//! # Security Model
//!
//! - The root is canonicalised once at construction
//! - New files are created with `create_new`, so an existing file is never overwritten
//! - Relative paths read back from metadata are accepted only if every component is a plain
//!   name; `..`, absolute paths and prefixes are rejected

use crate::{FilesError, FilesResult};
use filedrop_types::StoredName;
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Result of writing a file into the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Path relative to the storage root, `/`-separated
    pub relative_path: String,

    /// Size on disk after the write
    pub size_bytes: u64,
}

/// Read/write access to the files beneath one storage root.
#[derive(Debug, Clone)]
pub struct StorageTree {
    /// Canonicalised storage root
    root_directory: PathBuf,
}

impl StorageTree {
    /// Opens the storage tree rooted at `root_directory`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidRootDirectory` if:
    /// - the path exists but is not a directory
    /// - the directory cannot be created or canonicalised
    pub fn new(root_directory: &Path) -> FilesResult<Self> {
        if root_directory.exists() && !root_directory.is_dir() {
            return Err(FilesError::InvalidRootDirectory(format!(
                "Path is not a directory: {}",
                root_directory.display()
            )));
        }

        fs::create_dir_all(root_directory).map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot create directory {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        let root_directory = root_directory.canonicalize().map_err(|e| {
            FilesError::InvalidRootDirectory(format!(
                "Cannot canonicalize path {}: {}",
                root_directory.display(),
                e
            ))
        })?;

        Ok(Self { root_directory })
    }

    /// Returns the canonicalised storage root
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root_directory
    }

    /// Writes `bytes` as `name` inside `partition` (`YYYY/MM/DD`).
    ///
    /// The partition directory must already exist. The size reported is read back from the
    /// filesystem, not taken from `bytes`.
    ///
    /// # Errors
    ///
    /// Returns `FilesError` if:
    /// - `partition` is not a plain relative path
    /// - a file with that name already exists (`Io` with `AlreadyExists`)
    /// - the write or the stat fails (I/O)
    pub fn write(
        &self,
        partition: &str,
        name: &StoredName,
        bytes: &[u8],
    ) -> FilesResult<StoredFile> {
        let relative_path = format!("{}/{}", partition, name);
        let storage_path = self.resolve(&relative_path)?;

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&storage_path)
            .map_err(|e| {
                FilesError::Io(std::io::Error::new(
                    e.kind(),
                    format!("Failed to create {}: {}", storage_path.display(), e),
                ))
            })?;
        file.write_all(bytes)?;
        file.sync_all()?;

        let size_bytes = fs::metadata(&storage_path)?.len();

        Ok(StoredFile {
            relative_path,
            size_bytes,
        })
    }

    /// Whether a regular file exists at `relative_path`.
    ///
    /// An invalid path is reported as absent.
    pub fn exists(&self, relative_path: &str) -> bool {
        self.resolve(relative_path)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Removes the file at `relative_path` if present.
    ///
    /// Returns whether a file was removed. A file that is already gone is not an error.
    pub fn remove(&self, relative_path: &str) -> FilesResult<bool> {
        let storage_path = self.resolve(relative_path)?;
        match fs::remove_file(&storage_path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Converts a `/`-separated relative path into an absolute path beneath the root.
    ///
    /// # Errors
    ///
    /// Returns `FilesError::InvalidPath` if the path is empty or contains anything other than
    /// plain names (`..`, `.`, a root or a drive prefix).
    pub fn resolve(&self, relative_path: &str) -> FilesResult<PathBuf> {
        let relative = Path::new(relative_path);
        if relative_path.is_empty() || relative_path.contains('\\') {
            return Err(FilesError::InvalidPath(relative_path.to_owned()));
        }

        let mut resolved = self.root_directory.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                _ => return Err(FilesError::InvalidPath(relative_path.to_owned())),
            }
        }
        Ok(resolved)
    }
}

/// Best-effort media type of `bytes`, detected from their content.
///
/// Falls back to `application/octet-stream` when the content is not recognised.
pub fn media_type(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream")
}
