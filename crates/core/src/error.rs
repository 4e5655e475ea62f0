use filedrop_files::FilesError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Client input was rejected (missing file, empty name, disallowed or unsafe name)
    #[error("{0}")]
    Validation(String),
    /// No record under this stored filename
    #[error("File not found")]
    NotFound(String),
    /// A record exists but its file is missing on disk
    #[error("File not found on disk")]
    Orphaned(String),
    /// No collision-free name could be found
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Files(#[from] FilesError),
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
