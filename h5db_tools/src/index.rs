use std::{
    fs::File,
    path::{Path, PathBuf},
};

use crate::ReadError;

/// One data line of a tab-delimited metadata index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    /// 1-based line number in the index file.
    pub line: u64,
    pub fields: Vec<String>,
}

impl IndexRow {
    pub fn field(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// Read every data row of a metadata index.
///
/// The first line is a header and is dropped. Fields are split on tabs with
/// no quoting, rows may differ in width, and blank lines are skipped.
pub fn read_index(path: &Path) -> Result<Vec<IndexRow>, ReadError> {
    let file = File::open(path).map_err(|source| ReadError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .from_reader(file);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|source| record_error(path, source))?;
        let line = record.position().map_or(0, |pos| pos.line());
        rows.push(IndexRow {
            line,
            fields: record.iter().map(str::to_owned).collect(),
        });
    }

    Ok(rows)
}

fn record_error(path: &Path, source: csv::Error) -> ReadError {
    ReadError::Record {
        path: PathBuf::from(path),
        source,
    }
}
