use std::path::PathBuf;

use clap::{ArgAction, Parser};
use h5db_core::{
    BuildConfig, BuildError, DEFAULT_SEED, FoldStorage, LayoutMode, OutputFormat,
    config::{parse_delimiter, parse_label_columns},
};

/// Build a fixed-shape tensor dataset from per-utterance feature files.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "h5db", version)]
pub struct Args {
    /// Metadata file listing feature files and labels (tab-delimited, with header)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Label columns in the metadata file (idx:idx:..)
    #[arg(long, default_value = "3:4:5:6:7")]
    pub multitasks: String,

    /// Column holding the feature file path
    #[arg(long = "feat_idx", default_value_t = 8)]
    pub feat_idx: usize,

    /// Column holding the cross-validation fold id
    #[arg(long = "c_idx", default_value_t = 3)]
    pub c_idx: usize,

    /// Number of cross-validation folds; 0 disables fold ordering
    #[arg(long = "n_cc", default_value_t = 0)]
    pub n_cc: usize,

    /// Maximum time steps (frames) per utterance
    #[arg(long = "max_time_steps", default_value_t = 50)]
    pub max_time_steps: usize,

    /// Context window length in frames
    #[arg(long = "context_length", default_value_t = 1)]
    pub context_length: usize,

    /// Output path prefix; the container extension is appended
    #[arg(short, long, default_value = "./output")]
    pub output: PathBuf,

    /// Prefix prepended to every feature file path (include the trailing `/` for a directory)
    #[arg(long = "base_dir")]
    pub base_dir: Option<PathBuf>,

    /// Field delimiter of feature files
    #[arg(long = "feat_delim", default_value = ";")]
    pub feat_delim: String,

    /// Lay features out as (n, steps, 1, context, dim)
    #[arg(long = "two_d", conflicts_with = "three_d")]
    pub two_d: bool,

    /// Lay features out as (n, 1, steps, context, dim)
    #[arg(long = "three_d")]
    pub three_d: bool,

    /// Feature files have no header row
    #[arg(long)]
    pub headerless: bool,

    /// Seed for the sample shuffle outside fold mode
    #[arg(long, default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Keep metadata order instead of shuffling
    #[arg(long = "no-shuffle")]
    pub no_shuffle: bool,

    /// Fold reordering strategy: copy (two tensors in memory) or in-place
    #[arg(long = "fold-storage", default_value = "copy")]
    pub fold_storage: FoldStorage,

    /// Container format: h5 or npz
    #[arg(long, default_value = "h5")]
    pub format: OutputFormat,

    /// Skip the JSON build report
    #[arg(long = "no-report")]
    pub no_report: bool,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Args {
    pub fn into_config(self) -> Result<BuildConfig, BuildError> {
        let input = self.input.ok_or(BuildError::MissingInput)?;
        let config = BuildConfig {
            input,
            label_columns: parse_label_columns(&self.multitasks)?,
            feat_idx: self.feat_idx,
            c_idx: self.c_idx,
            n_folds: self.n_cc,
            max_time_steps: self.max_time_steps,
            context_length: self.context_length,
            output: self.output,
            base_dir: self.base_dir,
            feat_delim: parse_delimiter(&self.feat_delim)?,
            headerless: self.headerless,
            layout: LayoutMode::from_flags(self.two_d, self.three_d)?,
            shuffle_seed: (!self.no_shuffle).then_some(self.seed),
            fold_storage: self.fold_storage,
            format: self.format,
            write_report: !self.no_report,
        };
        config.validate()?;
        Ok(config)
    }
}
