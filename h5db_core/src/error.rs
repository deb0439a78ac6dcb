use std::path::PathBuf;

use h5db_tools::ReadError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("please specify an input meta file")]
    MissingInput,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("context length {context_length} exceeds max time steps {max_time_steps}")]
    ContextTooLong {
        context_length: usize,
        max_time_steps: usize,
    },
    #[error("two-d and three-d layouts are mutually exclusive")]
    ConflictingLayouts,
    #[error("metadata index {path} has no data rows")]
    EmptyIndex { path: PathBuf },
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("{path}:{line}: missing column {column}")]
    MissingColumn {
        path: PathBuf,
        line: u64,
        column: usize,
    },
    #[error("{path}:{line}: label column {column} is not numeric: {value:?}")]
    InvalidLabel {
        path: PathBuf,
        line: u64,
        column: usize,
        value: String,
    },
    #[error("{path}:{line}: fold id column {column} is not an integer: {value:?}")]
    InvalidFoldId {
        path: PathBuf,
        line: u64,
        column: usize,
        value: String,
    },
    #[error("tensor shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
    #[error("failed to write {path}: {source}")]
    WriteNpz {
        path: PathBuf,
        source: ndarray_npy::WriteNpzError,
    },
    #[error("failed to write {path}: {source}")]
    Hdf5 { path: PathBuf, source: hdf5::Error },
    #[error("failed to write build report {path}: {source}")]
    Report {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Coarse failure classes of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected before any processing starts.
    Configuration,
    /// An input file could not be opened or read.
    Io,
    /// A metadata field or feature file could not be interpreted.
    Parse,
    /// The output artifact could not be produced.
    Write,
}

impl BuildError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BuildError::MissingInput
            | BuildError::InvalidConfig(_)
            | BuildError::ContextTooLong { .. }
            | BuildError::ConflictingLayouts => ErrorKind::Configuration,
            BuildError::Read(err) if err.is_unreadable() => ErrorKind::Io,
            BuildError::EmptyIndex { .. } | BuildError::Io { .. } => ErrorKind::Io,
            BuildError::Read(_)
            | BuildError::MissingColumn { .. }
            | BuildError::InvalidLabel { .. }
            | BuildError::InvalidFoldId { .. } => ErrorKind::Parse,
            BuildError::Shape(_)
            | BuildError::WriteNpz { .. }
            | BuildError::Hdf5 { .. }
            | BuildError::Report { .. } => ErrorKind::Write,
        }
    }
}
