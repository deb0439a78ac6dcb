//! Metadata index loading: one [`Sample`] per data line, plus the feature
//! dimensionality every feature file is expected to share.

use std::path::{Path, PathBuf};

use h5db_tools::{IndexRow, read_index, read_matrix};
use ndarray::Array2;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};

use crate::{BuildConfig, BuildError};

/// One line of the metadata index.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// 1-based line number in the index.
    pub line: u64,
    pub feature_path: PathBuf,
    /// Parsed only in fold mode.
    pub fold_id: Option<i64>,
    pub fields: Vec<String>,
}

impl Sample {
    fn from_row(row: IndexRow, config: &BuildConfig) -> Result<Self, BuildError> {
        let feature_field = column(&row, config.feat_idx, &config.input)?;
        let feature_path = config.feature_path(feature_field);

        let fold_id = if config.fold_mode() {
            let raw = column(&row, config.c_idx, &config.input)?;
            let id = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| BuildError::InvalidFoldId {
                    path: config.input.clone(),
                    line: row.line,
                    column: config.c_idx,
                    value: raw.to_owned(),
                })?;
            Some(id)
        } else {
            None
        };

        Ok(Self {
            line: row.line,
            feature_path,
            fold_id,
            fields: row.fields,
        })
    }

    pub fn field(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

fn column<'a>(row: &'a IndexRow, column: usize, path: &Path) -> Result<&'a str, BuildError> {
    row.field(column).ok_or_else(|| BuildError::MissingColumn {
        path: path.to_path_buf(),
        line: row.line,
        column,
    })
}

/// Samples in processing order and the shared feature dimensionality.
#[derive(Debug, Clone)]
pub struct MetadataIndex {
    pub samples: Vec<Sample>,
    pub feature_dim: usize,
    /// Matrix parsed to infer `feature_dim`, keyed by its index line.
    first_frames: Option<(u64, Array2<f64>)>,
}

impl MetadataIndex {
    /// Read the index named by `config.input`.
    ///
    /// The feature dimensionality comes from the first data line's feature
    /// file, before any shuffling. Outside fold mode the samples are then
    /// shuffled with `config.shuffle_seed`, if set.
    pub fn load(config: &BuildConfig) -> Result<Self, BuildError> {
        if config.input.as_os_str().is_empty() {
            return Err(BuildError::MissingInput);
        }

        let rows = read_index(&config.input)?;
        if rows.is_empty() {
            return Err(BuildError::EmptyIndex {
                path: config.input.clone(),
            });
        }

        let mut samples = rows
            .into_iter()
            .map(|row| Sample::from_row(row, config))
            .collect::<Result<Vec<_>, _>>()?;

        let first = read_matrix(&samples[0].feature_path, config.feature_format())?;
        let feature_dim = first.ncols();
        let first_frames = Some((samples[0].line, first));

        if let (false, Some(seed)) = (config.fold_mode(), config.shuffle_seed) {
            shuffle_samples(&mut samples, seed);
        }

        tracing::debug!(
            "Loaded {} samples from {}",
            samples.len(),
            config.input.display()
        );

        Ok(Self {
            samples,
            feature_dim,
            first_frames,
        })
    }

    /// Hand over the first line's already parsed feature matrix, once.
    pub fn take_first_frames(&mut self) -> Option<(u64, Array2<f64>)> {
        self.first_frames.take()
    }
}

/// Deterministic Fisher-Yates shuffle seeded from `seed`.
pub fn shuffle_samples<T>(samples: &mut [T], seed: u64) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_fixture(dir: &TempDir, index: &str, features: &[(&str, &str)]) -> PathBuf {
        for (name, body) in features {
            fs::write(dir.path().join(name), body).unwrap();
        }
        let path = dir.path().join("meta.tsv");
        fs::write(&path, index).unwrap();
        path
    }

    fn config_for(dir: &TempDir, input: PathBuf) -> BuildConfig {
        BuildConfig {
            feat_idx: 1,
            c_idx: 2,
            label_columns: vec![3],
            // trailing separator: the base dir is a plain prefix
            base_dir: Some(dir.path().join("")),
            shuffle_seed: None,
            ..BuildConfig::new(input)
        }
    }

    #[test]
    fn infers_dimension_from_first_row() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_fixture(
            &dir,
            "id\tfeat\tfold\tlabel\nu1\ta.csv\t0\t1\nu2\tb.csv\t1\t0\n",
            &[("a.csv", "x;y;z\n1;2;3\n4;5;6\n"), ("b.csv", "x\n1\n")],
        );
        let index = MetadataIndex::load(&config_for(&dir, input)).unwrap();
        assert_eq!(index.feature_dim, 3);
        assert_eq!(index.samples.len(), 2);
        assert_eq!(index.samples[1].feature_path, dir.path().join("b.csv"));
        assert_eq!(index.samples[1].line, 3);
    }

    #[test]
    fn first_matrix_is_kept_for_its_own_line() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_fixture(
            &dir,
            "id\tfeat\tfold\tlabel\nu1\ta.csv\t0\t1\nu2\tb.csv\t1\t0\n",
            &[("a.csv", "x;y\n1;2\n3;4\n"), ("b.csv", "x;y\n5;6\n")],
        );
        let config = BuildConfig {
            shuffle_seed: Some(7),
            ..config_for(&dir, input)
        };
        let mut index = MetadataIndex::load(&config).unwrap();

        let (line, frames) = index.take_first_frames().unwrap();
        assert_eq!(line, 2);
        assert_eq!(frames, ndarray::array![[1.0, 2.0], [3.0, 4.0]]);
        assert!(index.take_first_frames().is_none());
    }

    #[test]
    fn one_dimensional_first_file_gives_dimension_one() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_fixture(
            &dir,
            "id\tfeat\tfold\tlabel\nu1\ta.csv\t0\t1\n",
            &[("a.csv", "x\n1\n2\n3\n")],
        );
        let index = MetadataIndex::load(&config_for(&dir, input)).unwrap();
        assert_eq!(index.feature_dim, 1);
    }

    #[test]
    fn fold_ids_parsed_only_in_fold_mode() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_fixture(
            &dir,
            "id\tfeat\tfold\tlabel\nu1\ta.csv\tdev\t1\n",
            &[("a.csv", "x;y\n1;2\n")],
        );
        let mut config = config_for(&dir, input);
        let index = MetadataIndex::load(&config).unwrap();
        assert_eq!(index.samples[0].fold_id, None);

        config.n_folds = 2;
        let err = MetadataIndex::load(&config).unwrap_err();
        assert!(matches!(err, BuildError::InvalidFoldId { line: 2, column: 2, .. }));
    }

    #[test]
    fn fold_mode_keeps_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let mut index = String::from("id\tfeat\tfold\tlabel\n");
        for i in 0..20 {
            index.push_str(&format!("u{i}\ta.csv\t{i}\t1\n"));
        }
        let input = write_fixture(&dir, &index, &[("a.csv", "x;y\n1;2\n")]);
        let config = BuildConfig {
            n_folds: 20,
            shuffle_seed: Some(7),
            ..config_for(&dir, input)
        };
        let loaded = MetadataIndex::load(&config).unwrap();
        let ids: Vec<_> = loaded.samples.iter().filter_map(|s| s.fold_id).collect();
        assert_eq!(ids, (0..20).collect::<Vec<i64>>());
    }

    #[test]
    fn seeded_shuffle_is_reproducible() {
        let mut a: Vec<u32> = (0..50).collect();
        let mut b = a.clone();
        shuffle_samples(&mut a, 1337);
        shuffle_samples(&mut b, 1337);
        assert_eq!(a, b);
        assert_ne!(a, (0..50).collect::<Vec<u32>>());
    }

    #[test]
    fn missing_feature_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_fixture(&dir, "id\tfeat\nu1\n", &[]);
        let err = MetadataIndex::load(&config_for(&dir, input)).unwrap_err();
        assert!(matches!(err, BuildError::MissingColumn { line: 2, column: 1, .. }));
    }

    #[test]
    fn header_only_index_is_empty_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_fixture(&dir, "id\tfeat\tfold\tlabel\n", &[]);
        let err = MetadataIndex::load(&config_for(&dir, input)).unwrap_err();
        assert!(matches!(err, BuildError::EmptyIndex { .. }));
    }

    #[test]
    fn unreadable_feature_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_fixture(&dir, "id\tfeat\tfold\tlabel\nu1\tgone.csv\t0\t1\n", &[]);
        let err = MetadataIndex::load(&config_for(&dir, input)).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Io);
    }
}
