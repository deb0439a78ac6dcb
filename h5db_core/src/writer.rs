//! Persists a built dataset as one container of named arrays.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use ndarray::{Array1, ArrayView1, ArrayViewD};
use ndarray_npy::NpzWriter;

use crate::{BuildError, OutputFormat, pipeline::Dataset};

pub const FEATURES: &str = "feat";
pub const LABELS: &str = "label";
pub const FOLD_START: &str = "start_indice";
pub const FOLD_END: &str = "end_indice";

/// A container that accepts named arrays and persists them on `finish`.
pub trait ArrayContainer {
    fn add_f64(&mut self, name: &str, array: ArrayViewD<'_, f64>) -> Result<(), BuildError>;
    fn add_i64(&mut self, name: &str, array: ArrayView1<'_, i64>) -> Result<(), BuildError>;
    fn finish(self) -> Result<(), BuildError>;
}

/// Write `dataset` to `path`, replacing any existing file.
pub fn write_dataset(
    dataset: &Dataset,
    path: &Path,
    format: OutputFormat,
) -> Result<(), BuildError> {
    match format {
        OutputFormat::Npz => write_arrays(NpzContainer::create(path)?, dataset),
        OutputFormat::Hdf5 => write_arrays(Hdf5Container::create(path)?, dataset),
    }
}

/// Emit `feat`, `label` and, for fold-ordered datasets, the fold offsets.
pub fn write_arrays<C: ArrayContainer>(mut container: C, dataset: &Dataset) -> Result<(), BuildError> {
    container.add_f64(FEATURES, dataset.feature_view()?)?;
    container.add_f64(LABELS, dataset.labels.view().into_dyn())?;
    if let Some(folds) = &dataset.folds {
        let start: Array1<i64> = folds.start.iter().map(|&v| v as i64).collect();
        let end: Array1<i64> = folds.end.iter().map(|&v| v as i64).collect();
        container.add_i64(FOLD_START, start.view())?;
        container.add_i64(FOLD_END, end.view())?;
    }
    container.finish()
}

/// `.npz` archive with one `.npy` entry per array.
pub struct NpzContainer {
    path: PathBuf,
    npz: NpzWriter<BufWriter<File>>,
}

impl NpzContainer {
    pub fn create(path: &Path) -> Result<Self, BuildError> {
        let file = File::create(path).map_err(|source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            npz: NpzWriter::new(BufWriter::new(file)),
        })
    }

    fn npz_error(&self, source: ndarray_npy::WriteNpzError) -> BuildError {
        BuildError::WriteNpz {
            path: self.path.clone(),
            source,
        }
    }
}

impl ArrayContainer for NpzContainer {
    fn add_f64(&mut self, name: &str, array: ArrayViewD<'_, f64>) -> Result<(), BuildError> {
        self.npz
            .add_array(name, &array)
            .map_err(|source| self.npz_error(source))
    }

    fn add_i64(&mut self, name: &str, array: ArrayView1<'_, i64>) -> Result<(), BuildError> {
        self.npz
            .add_array(name, &array)
            .map_err(|source| self.npz_error(source))
    }

    fn finish(self) -> Result<(), BuildError> {
        let path = self.path;
        let mut writer = self.npz.finish().map_err(|source| BuildError::WriteNpz {
            path: path.clone(),
            source,
        })?;
        writer
            .flush()
            .map_err(|source| BuildError::Io { path, source })
    }
}

/// HDF5 file with one dataset per array.
pub struct Hdf5Container {
    path: PathBuf,
    file: hdf5::File,
}

impl Hdf5Container {
    pub fn create(path: &Path) -> Result<Self, BuildError> {
        let file = hdf5::File::create(path).map_err(|source| BuildError::Hdf5 {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            file,
        })
    }

    fn hdf5_error(&self, source: hdf5::Error) -> BuildError {
        BuildError::Hdf5 {
            path: self.path.clone(),
            source,
        }
    }
}

impl ArrayContainer for Hdf5Container {
    fn add_f64(&mut self, name: &str, array: ArrayViewD<'_, f64>) -> Result<(), BuildError> {
        self.file
            .new_dataset_builder()
            .with_data(array)
            .create(name)
            .map(|_| ())
            .map_err(|source| self.hdf5_error(source))
    }

    fn add_i64(&mut self, name: &str, array: ArrayView1<'_, i64>) -> Result<(), BuildError> {
        self.file
            .new_dataset_builder()
            .with_data(array)
            .create(name)
            .map(|_| ())
            .map_err(|source| self.hdf5_error(source))
    }

    fn finish(self) -> Result<(), BuildError> {
        self.file.flush().map_err(|source| self.hdf5_error(source))
    }
}
