use std::{fs::File, io::Read, path::Path};

use ndarray::Array2;

use crate::ReadError;

/// How a numeric feature file is laid out on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelimitedFormat {
    pub delimiter: u8,
    /// Skip the first non-comment line.
    pub has_header: bool,
}

impl Default for DelimitedFormat {
    fn default() -> Self {
        Self {
            delimiter: b';',
            has_header: true,
        }
    }
}

/// Read a delimited numeric text file into a `(frames, dims)` matrix.
///
/// One-dimensional data (a single column, or a single data row) comes back as
/// `(n_values, 1)`: every value is a frame of width one. Lines starting with
/// `#` are comments, fields are trimmed and an empty field reads as NaN.
pub fn read_matrix(path: &Path, format: DelimitedFormat) -> Result<Array2<f64>, ReadError> {
    let file = File::open(path).map_err(|source| ReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    parse_matrix(file, format, path)
}

fn parse_matrix<R: Read>(
    reader: R,
    format: DelimitedFormat,
    path: &Path,
) -> Result<Array2<f64>, ReadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(format.delimiter)
        .has_headers(format.has_header)
        .comment(Some(b'#'))
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(reader);

    let mut values = Vec::new();
    let mut rows = 0usize;
    let mut width = 0usize;

    for result in rdr.records() {
        let record = result.map_err(|source| ReadError::Record {
            path: path.to_path_buf(),
            source,
        })?;
        let line = record.position().map_or(0, |pos| pos.line());
        width = record.len();
        for (column, field) in record.iter().enumerate() {
            let value = parse_value(field).ok_or_else(|| ReadError::NotNumeric {
                path: path.to_path_buf(),
                line,
                column,
                value: field.to_owned(),
            })?;
            values.push(value);
        }
        rows += 1;
    }

    let shape = if rows <= 1 || width == 1 {
        (values.len(), 1)
    } else {
        (rows, width)
    };

    Array2::from_shape_vec(shape, values).map_err(|source| ReadError::Shape {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_value(field: &str) -> Option<f64> {
    if field.is_empty() {
        return Some(f64::NAN);
    }
    field.parse::<f64>().ok()
}
