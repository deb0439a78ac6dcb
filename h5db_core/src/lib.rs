//! Builds a fixed-shape tensor dataset from per-utterance feature files
//! listed in a tab-delimited metadata index.
//!
//! ```ignore
//! let config = BuildConfig {
//!     n_folds: 5,
//!     context_length: 3,
//!     ..BuildConfig::new("meta.tsv")
//! };
//! let report = h5db_core::build(&config)?;
//! ```

pub mod assemble;
pub mod config;
pub mod error;
pub mod folds;
pub mod labels;
pub mod metadata;
pub mod pipeline;
pub mod plan;
pub mod report;
pub mod writer;

pub use config::{BuildConfig, DEFAULT_SEED, FoldStorage, LayoutMode, OutputFormat};
pub use error::{BuildError, ErrorKind};
pub use pipeline::{Assembled, Dataset, assemble, build};
pub use report::BuildReport;
