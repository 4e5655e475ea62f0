//! Upload, listing, retrieval and deletion of stored files.
//!
//! [`FileService`] owns the storage tree, the date partitioner and the metadata store. It is
//! meant to be created once per process and shared (for example behind an `Arc`).
//!
//! Mutating operations hold a process-wide write lock for their whole
//! load → mutate → save sequence, so concurrent uploads and deletes cannot lose each other's
//! records. Reads take no lock: the metadata document is replaced by rename, so a reader always
//! sees a complete document.

use crate::{CoreConfig, CoreError, CoreResult};
use filedrop_files::{
    resolver, Clock, DatePartitioner, FileRecord, FilesError, MetadataStore, StorageTree,
    StoredName, SystemClock,
};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

/// Rejection message for an upload without a filename.
pub const NO_SELECTED_FILE: &str = "No selected file";

/// Rejection message for an upload whose extension is not allowed.
pub const FILE_TYPE_NOT_ALLOWED: &str = "File type not allowed";

/// Outcome of looking a stored filename up in metadata and on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Record exists and its file is on disk at `path`
    Present { record: FileRecord, path: PathBuf },
    /// Record exists but its file is missing (or its recorded path is unusable)
    Orphaned { record: FileRecord },
    /// No record under this name
    Absent,
}

/// A successfully stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: StoredName,
    pub record: FileRecord,
}

/// One entry of a listing, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedFile {
    pub filename: String,
    pub record: FileRecord,
}

/// Absolute location of a stored file that was on disk at lookup time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedFile {
    pub original_name: String,
    pub path: PathBuf,
}

/// Bytes of a stored file together with the name the client uploaded it as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedFile {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

/// Result of a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedFile {
    pub filename: String,
    /// Whether a file was actually removed from disk
    pub removed_from_disk: bool,
}

/// Storage operations over one storage root and one metadata document.
#[derive(Debug)]
pub struct FileService {
    tree: StorageTree,
    partitioner: DatePartitioner,
    store: MetadataStore,
    write_lock: Mutex<()>,
}

impl FileService {
    /// Opens the service using the system clock.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage root cannot be created or is not a directory.
    pub fn new(cfg: &CoreConfig) -> CoreResult<Self> {
        Self::with_clock(cfg, Arc::new(SystemClock))
    }

    /// Opens the service with an explicit time source.
    pub fn with_clock(cfg: &CoreConfig, clock: Arc<dyn Clock>) -> CoreResult<Self> {
        let tree = StorageTree::new(cfg.storage_dir())?;
        let partitioner = DatePartitioner::new(tree.root(), clock);
        let store = MetadataStore::new(cfg.metadata_file());

        Ok(Self {
            tree,
            partitioner,
            store,
            write_lock: Mutex::new(()),
        })
    }

    pub fn storage_root(&self) -> &Path {
        self.tree.root()
    }

    pub fn metadata_path(&self) -> &Path {
        self.store.path()
    }

    /// Stores `bytes` uploaded under `original_name`.
    ///
    /// # Errors
    ///
    /// - `Validation` for an empty name, a disallowed extension or an unsafe name. Nothing is
    ///   written in that case.
    /// - `Conflict` if no free stored name could be found.
    /// - `Files` for I/O or serialisation failures. A failure after the bytes are written
    ///   leaves the file on disk without a record.
    pub fn upload(&self, original_name: &str, bytes: &[u8]) -> CoreResult<UploadedFile> {
        if original_name.is_empty() {
            return Err(CoreError::Validation(NO_SELECTED_FILE.into()));
        }
        if !resolver::is_allowed(original_name) {
            tracing::warn!(name = %original_name, "rejected upload with disallowed extension");
            return Err(CoreError::Validation(FILE_TYPE_NOT_ALLOWED.into()));
        }
        let sanitized = resolver::sanitize(original_name).map_err(|e| {
            tracing::warn!(name = %original_name, error = %e, "rejected unsafe filename");
            match e {
                FilesError::DisallowedExtension(_) => {
                    CoreError::Validation(FILE_TYPE_NOT_ALLOWED.into())
                }
                other => CoreError::Validation(other.to_string()),
            }
        })?;

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let now = self.partitioner.clock().now();
        let partition = DatePartitioner::partition_for(now);
        let dir = self.partitioner.ensure_partition_dir_at(now)?;

        let mut records = self.store.load()?;
        let filename = resolver::resolve_collision(&dir, sanitized, now, |candidate| {
            records.contains_key(candidate.as_str())
        })
        .map_err(|e| match e {
            FilesError::CollisionExhausted(name) => CoreError::Conflict(name),
            other => other.into(),
        })?;

        let stored = self
            .tree
            .write(&partition, &filename, bytes)
            .map_err(|e| match e {
                FilesError::Io(io) if io.kind() == ErrorKind::AlreadyExists => {
                    CoreError::Conflict(filename.to_string())
                }
                other => other.into(),
            })?;

        let record = FileRecord::new(
            original_name,
            stored.size_bytes,
            stored.relative_path,
            partition,
            now,
        );
        records.insert(filename.to_string(), record.clone());
        self.store.save(&records)?;

        tracing::info!(
            filename = %filename,
            original = %original_name,
            size = record.size,
            "stored upload"
        );

        Ok(UploadedFile { filename, record })
    }

    /// All records, newest `upload_date` first.
    pub fn list(&self) -> CoreResult<Vec<ListedFile>> {
        let mut files: Vec<ListedFile> = self
            .store
            .load()?
            .into_iter()
            .map(|(filename, record)| ListedFile { filename, record })
            .collect();
        files.sort_by(|a, b| b.record.upload_date.cmp(&a.record.upload_date));
        Ok(files)
    }

    /// Looks `filename` up in metadata and checks the disk.
    ///
    /// Names that are not valid stored names cannot be keys and are reported as `Absent`.
    pub fn lookup(&self, filename: &str) -> CoreResult<Lookup> {
        if StoredName::parse(filename).is_err() {
            return Ok(Lookup::Absent);
        }
        let Some(record) = self.store.load()?.remove(filename) else {
            return Ok(Lookup::Absent);
        };

        match self.tree.resolve(&record.path) {
            Ok(path) if path.is_file() => Ok(Lookup::Present { record, path }),
            Ok(_) => {
                tracing::warn!(filename = %filename, path = %record.path, "record has no file on disk");
                Ok(Lookup::Orphaned { record })
            }
            Err(e) => {
                tracing::warn!(filename = %filename, error = %e, "record has an unusable path");
                Ok(Lookup::Orphaned { record })
            }
        }
    }

    /// The stored record for `filename`.
    pub fn info(&self, filename: &str) -> CoreResult<FileRecord> {
        match self.lookup(filename)? {
            Lookup::Present { record, .. } | Lookup::Orphaned { record } => Ok(record),
            Lookup::Absent => Err(CoreError::NotFound(filename.to_owned())),
        }
    }

    /// Finds the file stored as `filename` on disk.
    ///
    /// # Errors
    ///
    /// `NotFound` without a record, `Orphaned` when the record's file is missing.
    pub fn locate(&self, filename: &str) -> CoreResult<LocatedFile> {
        match self.lookup(filename)? {
            Lookup::Present { record, path } => Ok(LocatedFile {
                original_name: record.original_name,
                path,
            }),
            Lookup::Orphaned { .. } => Err(CoreError::Orphaned(filename.to_owned())),
            Lookup::Absent => Err(CoreError::NotFound(filename.to_owned())),
        }
    }

    /// Reads the bytes of `filename`.
    ///
    /// # Errors
    ///
    /// As [`FileService::locate`]. A file that vanishes between lookup and read is reported as
    /// `Orphaned`.
    pub fn retrieve(&self, filename: &str) -> CoreResult<RetrievedFile> {
        let located = self.locate(filename)?;
        let bytes = fs::read(&located.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => CoreError::Orphaned(filename.to_owned()),
            _ => FilesError::from(e).into(),
        })?;
        Ok(RetrievedFile {
            original_name: located.original_name,
            bytes,
        })
    }

    /// Removes `filename` from disk (if present) and from metadata.
    ///
    /// There is no rollback: if the metadata save fails after the file was unlinked, the
    /// record stays behind as an orphan.
    pub fn delete(&self, filename: &str) -> CoreResult<DeletedFile> {
        if StoredName::parse(filename).is_err() {
            return Err(CoreError::NotFound(filename.to_owned()));
        }

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut records = self.store.load()?;
        let Some(record) = records.remove(filename) else {
            return Err(CoreError::NotFound(filename.to_owned()));
        };

        let removed_from_disk = match self.tree.remove(&record.path) {
            Ok(removed) => removed,
            Err(FilesError::InvalidPath(path)) => {
                tracing::warn!(filename = %filename, path = %path, "skipping unlink of unusable path");
                false
            }
            Err(e) => return Err(e.into()),
        };

        self.store.save(&records)?;
        tracing::info!(filename = %filename, removed_from_disk, "deleted file");

        Ok(DeletedFile {
            filename: filename.to_owned(),
            removed_from_disk,
        })
    }

    /// Records whose file is missing on disk.
    pub fn orphans(&self) -> CoreResult<Vec<ListedFile>> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|f| !self.tree.exists(&f.record.path))
            .collect())
    }
}
