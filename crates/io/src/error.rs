use std::path::PathBuf;

use kvk_recon::{ReconError, Source};
use thiserror::Error;

/// Failures reading or writing a data file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{}: malformed CSV: {source}", .path.display())]
    Csv { path: PathBuf, source: ::csv::Error },

    /// Anything calamine or rust_xlsxwriter reports.
    #[error("{}: {message}", .path.display())]
    Excel { path: PathBuf, message: String },

    #[error("{}: workbook has no worksheets", .path.display())]
    NoSheets { path: PathBuf },

    #[error("{}: file has no header row", .path.display())]
    NoHeader { path: PathBuf },

    #[error("{}: unsupported file type '{extension}' (expected csv, tsv, txt, xlsx, xlsm, xls, xlsb or ods)", .path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// A persisted report whose rows do not form a valid report.
    #[error("{}: {source}", .path.display())]
    Report { path: PathBuf, source: ReconError },

    /// Wraps a failure with the dataset being loaded.
    #[error("{dataset} dataset: {source}")]
    Dataset {
        dataset: Source,
        source: Box<LoadError>,
    },
}

impl LoadError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }

    pub(crate) fn csv(path: &std::path::Path, source: ::csv::Error) -> Self {
        Self::Csv { path: path.to_path_buf(), source }
    }

    pub(crate) fn excel(path: &std::path::Path, message: impl std::fmt::Display) -> Self {
        Self::Excel { path: path.to_path_buf(), message: message.to_string() }
    }
}
