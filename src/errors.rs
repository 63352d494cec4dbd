//! Errors and error-related utilities.

use std::{io, result};
use thiserror::Error;

/// The result type used throughout this library.
pub type Result<T> = result::Result<T, PlotError>;

/// Everything that can go wrong between reading a metric file and writing
/// the filled plot document.
#[derive(Debug, Error)]
pub enum PlotError {
    #[error("'{path}' - file type error, only json, yaml, csv and tsv types are supported")]
    UnsupportedFormat { path: String },

    #[error("failed to parse '{path}': {reason}")]
    Parse { path: String, reason: String },

    #[error("plot data extraction failed: {reason}")]
    Structure { reason: String },

    #[error("could not find fields: '{missing}' in '{present}'")]
    FieldNotFound { missing: String, present: String },

    /// Tolerated by the revision loader as long as other revisions still
    /// produce data.
    #[error("could not find '{path}' on revision '{revision}'")]
    NoMetricOnRevision { path: String, revision: String },

    #[error("could not find '{path}' on any of the revisions: '{revisions}'")]
    NoMetricInHistory { path: String, revisions: String },

    #[error(
        "unable to tell which of the data sources: '{sources}' should be replaced with '{datafile}'"
    )]
    TooManyDataSources { datafile: String, sources: String },

    #[error("template asks for data source '{source_name}' but no data was loaded for it")]
    MissingDataSource { source_name: String },

    #[error("datafile or template is not specified")]
    NoDataNorTemplate,

    #[error("template '{name}' not found")]
    TemplateNotFound { name: String },

    #[error("failed to read '{path}' at revision '{revision}': {reason}")]
    Storage {
        path: String,
        revision: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// A helper for constructing [PlotError::Structure].
pub fn structure(reason: impl Into<String>) -> PlotError {
    PlotError::Structure {
        reason: reason.into(),
    }
}

/// A helper for constructing [PlotError::Parse].
pub fn parse(path: &str, reason: impl ToString) -> PlotError {
    PlotError::Parse {
        path: path.to_owned(),
        reason: reason.to_string(),
    }
}
