use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;

use crate::{BuildError, LayoutMode, OutputFormat, folds::FoldOffsets};

/// A sample whose feature width disagreed with the run's dimensionality and
/// whose row was left zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedSample {
    /// Row in the output tensors, before any fold reordering.
    pub sample_index: usize,
    /// Line in the metadata index.
    pub line: u64,
    pub feature_path: PathBuf,
    pub expected_dim: usize,
    pub found_dim: usize,
}

/// JSON sidecar describing a finished build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub input: PathBuf,
    pub output: PathBuf,
    pub format: OutputFormat,
    pub layout: LayoutMode,
    pub n_samples: usize,
    pub n_labels: usize,
    pub feature_dim: usize,
    pub context_length: usize,
    pub max_steps: usize,
    pub feature_shape: Vec<usize>,
    pub label_shape: [usize; 2],
    pub folds: Option<FoldOffsets>,
    pub skipped: Vec<SkippedSample>,
}

impl BuildReport {
    pub fn write(&self, path: &Path) -> Result<(), BuildError> {
        let file = File::create(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self).map_err(|source| BuildError::Report {
            path: path.to_path_buf(),
            source,
        })?;
        writer.write_all(b"\n").map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        writer.flush().map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
