use std::path::Path;

use ndarray::Array2;

use crate::{BuildError, metadata::Sample};

/// Build the `(n_samples, n_labels)` label matrix from the index fields named
/// by `columns`, row `i` belonging to `samples[i]`.
///
/// Labels are never guessed: a missing column or a non-numeric field fails
/// the whole build.
pub fn extract_labels(
    samples: &[Sample],
    columns: &[usize],
    index_path: &Path,
) -> Result<Array2<f64>, BuildError> {
    let mut labels = Array2::zeros((samples.len(), columns.len()));
    for (idx, sample) in samples.iter().enumerate() {
        for (lab_idx, &column) in columns.iter().enumerate() {
            labels[[idx, lab_idx]] = parse_label(sample, column, index_path)?;
        }
    }
    Ok(labels)
}

fn parse_label(sample: &Sample, column: usize, index_path: &Path) -> Result<f64, BuildError> {
    let raw = sample
        .field(column)
        .ok_or_else(|| BuildError::MissingColumn {
            path: index_path.to_path_buf(),
            line: sample.line,
            column,
        })?;
    raw.trim()
        .parse::<f64>()
        .map_err(|_| BuildError::InvalidLabel {
            path: index_path.to_path_buf(),
            line: sample.line,
            column,
            value: raw.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ndarray::array;
    use std::path::PathBuf;

    fn sample(line: u64, fields: &[&str]) -> Sample {
        Sample {
            line,
            feature_path: PathBuf::from("f.csv"),
            fold_id: None,
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    #[test]
    fn copies_columns_in_configured_order() {
        let samples = vec![
            sample(2, &["u1", "0.5", "3", "-1"]),
            sample(3, &["u2", " 1.5 ", "4", "2e1"]),
        ];
        let labels = extract_labels(&samples, &[3, 1], Path::new("meta.tsv")).unwrap();
        assert_eq!(labels, array![[-1.0, 0.5], [20.0, 1.5]]);
    }

    #[test]
    fn non_numeric_label_is_fatal() {
        let samples = vec![sample(2, &["u1", "1"]), sample(3, &["u2", "happy"])];
        let err = extract_labels(&samples, &[1], Path::new("meta.tsv")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(matches!(
            err,
            BuildError::InvalidLabel { line: 3, column: 1, ref value, .. } if value == "happy"
        ));
    }

    #[test]
    fn out_of_range_column_is_fatal() {
        let samples = vec![sample(2, &["u1", "1"])];
        let err = extract_labels(&samples, &[1, 5], Path::new("meta.tsv")).unwrap_err();
        assert!(matches!(err, BuildError::MissingColumn { line: 2, column: 5, .. }));
    }
}
