//! Readers for the plain-text inputs of a dataset build: the tab-delimited
//! metadata index and delimited numeric feature files.

pub mod delimited;
pub mod error;
pub mod index;

pub use delimited::{DelimitedFormat, read_matrix};
pub use error::ReadError;
pub use index::{IndexRow, read_index};
