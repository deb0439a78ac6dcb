use std::{ffi::OsString, fmt, path::PathBuf, str::FromStr};

use h5db_tools::DelimitedFormat;
use serde::Serialize;

use crate::BuildError;

/// Seed used for the sample shuffle when none is given.
pub const DEFAULT_SEED: u64 = 1337;

/// Shape of the feature tensor handed to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutMode {
    /// `(n, steps, context * dim)`
    #[default]
    Flat,
    /// `(n, steps, 1, context, dim)`
    TwoD,
    /// `(n, 1, steps, context, dim)`
    ThreeD,
}

impl LayoutMode {
    pub fn from_flags(two_d: bool, three_d: bool) -> Result<Self, BuildError> {
        match (two_d, three_d) {
            (true, true) => Err(BuildError::ConflictingLayouts),
            (true, false) => Ok(LayoutMode::TwoD),
            (false, true) => Ok(LayoutMode::ThreeD),
            (false, false) => Ok(LayoutMode::Flat),
        }
    }
}

impl fmt::Display for LayoutMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutMode::Flat => write!(f, "flat"),
            LayoutMode::TwoD => write!(f, "two-d"),
            LayoutMode::ThreeD => write!(f, "three-d"),
        }
    }
}

/// How fold reordering gets its output rows.
///
/// `Copy` gathers rows into a second tensor of the same size, so two full
/// tensors are resident at the peak. `InPlace` permutes the existing tensor
/// with a one-row scratch buffer. Both produce the same bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FoldStorage {
    #[default]
    Copy,
    InPlace,
}

impl FromStr for FoldStorage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "copy" => Ok(FoldStorage::Copy),
            "in-place" | "inplace" | "in_place" => Ok(FoldStorage::InPlace),
            _ => Err(format!(
                "Unknown fold storage: {s}. Valid values: copy, in-place"
            )),
        }
    }
}

impl fmt::Display for FoldStorage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FoldStorage::Copy => write!(f, "copy"),
            FoldStorage::InPlace => write!(f, "in-place"),
        }
    }
}

/// Container format of the output artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Npz,
    #[default]
    Hdf5,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Npz => "npz",
            OutputFormat::Hdf5 => "h5",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "npz" => Ok(OutputFormat::Npz),
            "h5" | "hdf5" => Ok(OutputFormat::Hdf5),
            _ => Err(format!("Unknown output format: {s}. Valid formats: npz, h5")),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Everything a dataset build needs, validated once before any file is read.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Tab-delimited metadata index.
    pub input: PathBuf,
    /// Index columns holding label values.
    pub label_columns: Vec<usize>,
    /// Index column holding the feature file path.
    pub feat_idx: usize,
    /// Index column holding the cross-validation fold id.
    pub c_idx: usize,
    /// Requested number of folds; 0 turns fold mode off.
    pub n_folds: usize,
    pub max_time_steps: usize,
    pub context_length: usize,
    /// Output path prefix; the container extension is appended.
    pub output: PathBuf,
    pub base_dir: Option<PathBuf>,
    pub feat_delim: u8,
    pub headerless: bool,
    pub layout: LayoutMode,
    /// Seed for the sample shuffle outside fold mode; `None` keeps file order.
    pub shuffle_seed: Option<u64>,
    pub fold_storage: FoldStorage,
    pub format: OutputFormat,
    pub write_report: bool,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::new(),
            label_columns: vec![3, 4, 5, 6, 7],
            feat_idx: 8,
            c_idx: 3,
            n_folds: 0,
            max_time_steps: 50,
            context_length: 1,
            output: PathBuf::from("./output"),
            base_dir: None,
            feat_delim: b';',
            headerless: false,
            layout: LayoutMode::Flat,
            shuffle_seed: Some(DEFAULT_SEED),
            fold_storage: FoldStorage::Copy,
            format: OutputFormat::Hdf5,
            write_report: true,
        }
    }
}

impl BuildConfig {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            ..Self::default()
        }
    }

    pub fn fold_mode(&self) -> bool {
        self.n_folds > 0
    }

    pub fn validate(&self) -> Result<(), BuildError> {
        if self.input.as_os_str().is_empty() {
            return Err(BuildError::MissingInput);
        }
        if self.context_length == 0 {
            return Err(BuildError::InvalidConfig(
                "context length must be at least 1".to_string(),
            ));
        }
        if self.context_length > self.max_time_steps {
            return Err(BuildError::ContextTooLong {
                context_length: self.context_length,
                max_time_steps: self.max_time_steps,
            });
        }
        if self.label_columns.is_empty() {
            return Err(BuildError::InvalidConfig(
                "at least one label column is required".to_string(),
            ));
        }
        Ok(())
    }

    pub fn feature_format(&self) -> DelimitedFormat {
        DelimitedFormat {
            delimiter: self.feat_delim,
            has_header: !self.headerless,
        }
    }

    /// Prefix a feature path field from the index with `base_dir`.
    ///
    /// The prefix is prepended as-is, so `feat_` + `a.csv` gives `feat_a.csv`;
    /// a directory prefix needs its trailing separator.
    pub fn feature_path(&self, field: &str) -> PathBuf {
        match &self.base_dir {
            Some(base) => {
                let mut path = OsString::from(base.as_os_str());
                path.push(field);
                PathBuf::from(path)
            }
            None => PathBuf::from(field),
        }
    }

    /// `<output>.<ext>` for the configured container format.
    pub fn output_path(&self) -> PathBuf {
        self.with_suffix(self.format.extension())
    }

    /// `<output>.json`
    pub fn report_path(&self) -> PathBuf {
        self.with_suffix("json")
    }

    fn with_suffix(&self, ext: &str) -> PathBuf {
        let mut name = OsString::from(self.output.as_os_str());
        name.push(".");
        name.push(ext);
        PathBuf::from(name)
    }
}

/// Parse a colon-separated list of label columns such as `3:4:5:6:7`.
pub fn parse_label_columns(spec: &str) -> Result<Vec<usize>, BuildError> {
    spec.split(':')
        .map(|part| {
            part.trim().parse::<usize>().map_err(|_| {
                BuildError::InvalidConfig(format!("invalid label column {part:?} in {spec:?}"))
            })
        })
        .collect()
}

/// Parse a single-byte field delimiter; `\t` is accepted as an escape.
pub fn parse_delimiter(spec: &str) -> Result<u8, BuildError> {
    match spec.as_bytes() {
        [byte] => Ok(*byte),
        b"\\t" => Ok(b'\t'),
        _ => Err(BuildError::InvalidConfig(format!(
            "feature delimiter must be a single byte, got {spec:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_columns_parse_in_order() {
        assert_eq!(parse_label_columns("3:4:5:6:7").unwrap(), vec![3, 4, 5, 6, 7]);
        assert_eq!(parse_label_columns("9").unwrap(), vec![9]);
    }

    #[test]
    fn label_columns_reject_gaps_and_text() {
        assert!(parse_label_columns("3::4").is_err());
        assert!(parse_label_columns("").is_err());
        assert!(parse_label_columns("a:1").is_err());
    }

    #[test]
    fn delimiter_accepts_single_bytes_and_tab_escape() {
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("\\t").unwrap(), b'\t');
        assert!(parse_delimiter(";;").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn layout_flags_are_exclusive() {
        assert_eq!(LayoutMode::from_flags(false, false).unwrap(), LayoutMode::Flat);
        assert_eq!(LayoutMode::from_flags(true, false).unwrap(), LayoutMode::TwoD);
        assert_eq!(LayoutMode::from_flags(false, true).unwrap(), LayoutMode::ThreeD);
        assert!(matches!(
            LayoutMode::from_flags(true, true),
            Err(BuildError::ConflictingLayouts)
        ));
    }

    #[test]
    fn validate_reports_missing_input_first() {
        let config = BuildConfig {
            context_length: 0,
            ..BuildConfig::default()
        };
        assert!(matches!(config.validate(), Err(BuildError::MissingInput)));
    }

    #[test]
    fn validate_rejects_context_longer_than_max_steps() {
        let config = BuildConfig {
            max_time_steps: 4,
            context_length: 5,
            ..BuildConfig::new("meta.tsv")
        };
        assert!(matches!(
            config.validate(),
            Err(BuildError::ContextTooLong {
                context_length: 5,
                max_time_steps: 4
            })
        ));
    }

    #[test]
    fn output_paths_append_extension() {
        let config = BuildConfig {
            output: PathBuf::from("runs/set.v2"),
            ..BuildConfig::new("meta.tsv")
        };
        assert_eq!(config.output_path(), PathBuf::from("runs/set.v2.h5"));
        assert_eq!(config.report_path(), PathBuf::from("runs/set.v2.json"));
    }

    #[test]
    fn feature_path_prefixes_base_dir() {
        let mut config = BuildConfig::new("meta.tsv");
        assert_eq!(config.feature_path("a/b.csv"), PathBuf::from("a/b.csv"));
        config.base_dir = Some(PathBuf::from("/data/feats/"));
        assert_eq!(
            config.feature_path("a/b.csv"),
            PathBuf::from("/data/feats/a/b.csv")
        );
    }

    #[test]
    fn base_dir_without_separator_is_a_plain_prefix() {
        let dir = tempfile::tempdir().unwrap();
        let config = BuildConfig {
            base_dir: Some(dir.path().join("feat_")),
            ..BuildConfig::new("meta.tsv")
        };
        assert_eq!(config.feature_path("a.csv"), dir.path().join("feat_a.csv"));
    }

    #[test]
    fn hdf5_is_the_default_container() {
        let config = BuildConfig::new("meta.tsv");
        assert_eq!(config.format, OutputFormat::Hdf5);
        assert_eq!(config.output_path(), PathBuf::from("./output.h5"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn enums_parse_from_cli_strings() {
        assert_eq!("in-place".parse::<FoldStorage>().unwrap(), FoldStorage::InPlace);
        assert_eq!("COPY".parse::<FoldStorage>().unwrap(), FoldStorage::Copy);
        assert_eq!("h5".parse::<OutputFormat>().unwrap(), OutputFormat::Hdf5);
        assert!("parquet".parse::<OutputFormat>().is_err());
    }
}
