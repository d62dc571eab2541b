//! Error types for the sheetseek library.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias for sheetseek operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a workbook.
///
/// Document-level failures carry the path of the package they came from.
/// Row-level anomalies never surface here: a cell without a value or a
/// shared-string index out of range degrades to an empty string instead.
#[derive(Error, Debug)]
pub enum Error {
    /// The workbook file does not exist.
    #[error("Excel file '{}' not found", path.display())]
    FileNotFound { path: PathBuf },

    /// The file exists but the ZIP container cannot be opened.
    #[error("The file '{}' is not readable: {reason}", path.display())]
    NotReadable {
        path: PathBuf,
        reason: String,
        #[source]
        source: Option<zip::result::ZipError>,
    },

    /// A required part is missing, unparsable, or the package is not a workbook.
    #[error("Invalid format for '{}': {reason}{}", path.display(), format_mismatch(expected, detected))]
    InvalidFormat {
        path: PathBuf,
        reason: String,
        expected: Option<String>,
        detected: Option<String>,
    },

    /// A sheet points at a relationship id the workbook relationships do not declare.
    #[error("No relationship '{relationship_id}' for sheet '{sheet}' in '{}'", path.display())]
    MissingRelationship {
        path: PathBuf,
        sheet: String,
        relationship_id: String,
    },

    /// Copying a sheet part out of the archive failed.
    #[error("Cannot extract part '{part}' from '{}': {source}", path.display())]
    ExtractionFailure {
        path: PathBuf,
        part: String,
        #[source]
        source: io::Error,
    },

    /// No sheet with the requested name exists in the manifest.
    #[error("The sheet '{name}' is invalid: not declared in '{}'", path.display())]
    SheetNotFound { path: PathBuf, name: String },

    /// The scanned sheet has no row to use as a header.
    #[error("Header not found in '{}'", path.display())]
    HeaderNotFound { path: PathBuf },

    /// A header row was captured but contains no values.
    #[error("Header is empty")]
    HeaderEmpty,

    /// A `/…/` search rule is not a valid regular expression.
    #[error("Invalid pattern rule '{rule}': {source}")]
    InvalidPattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// I/O error outside of part extraction.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn format_mismatch(expected: &Option<String>, detected: &Option<String>) -> String {
    match (expected, detected) {
        (Some(expected), Some(detected)) => {
            format!(" (expected: {}, detected: {})", expected, detected)
        }
        _ => String::new(),
    }
}

impl Error {
    /// Build an `InvalidFormat` error without format details.
    pub(crate) fn invalid_format(path: &Path, reason: impl Into<String>) -> Self {
        Error::InvalidFormat {
            path: path.to_path_buf(),
            reason: reason.into(),
            expected: None,
            detected: None,
        }
    }

    /// Path of the package the error originated from, if any.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Error::FileNotFound { path }
            | Error::NotReadable { path, .. }
            | Error::InvalidFormat { path, .. }
            | Error::MissingRelationship { path, .. }
            | Error::ExtractionFailure { path, .. }
            | Error::SheetNotFound { path, .. }
            | Error::HeaderNotFound { path } => Some(path),
            Error::HeaderEmpty | Error::InvalidPattern { .. } | Error::Io(_) => None,
        }
    }
}
