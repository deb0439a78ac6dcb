use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed record in {path}: {source}")]
    Record { path: PathBuf, source: csv::Error },
    #[error("{path}:{line}: field {column} is not numeric: {value:?}")]
    NotNumeric {
        path: PathBuf,
        line: u64,
        column: usize,
        value: String,
    },
    #[error("{path}: values do not form a matrix: {source}")]
    Shape {
        path: PathBuf,
        source: ndarray::ShapeError,
    },
}

impl ReadError {
    /// True when the file itself could not be opened, as opposed to being
    /// readable but malformed.
    pub fn is_unreadable(&self) -> bool {
        matches!(self, ReadError::Open { .. })
    }
}
