//! CSV boundary of the engine: load the five input collections from a directory and
//! export the derived tables with a fixed column order and rounding convention.

pub mod reader;
pub mod writer;

use std::path::PathBuf;

use thiserror::Error;

pub use reader::load_dataset;
pub use writer::{export_tables, write_date_dimension};

#[derive(Debug, Error)]
pub enum TableError {
    #[error("could not read `{path}`: {source}")]
    Read { path: PathBuf, source: csv::Error },
    #[error("required input file is missing: `{0}`")]
    MissingInput(PathBuf),
    #[error("could not create output directory `{path}`: {source}")]
    CreateDir { path: PathBuf, source: std::io::Error },
    #[error("could not write `{path}`: {source}")]
    Write { path: PathBuf, source: csv::Error },
}
