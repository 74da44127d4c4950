//! Error taxonomy for the report pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Every failure the pipeline can surface. Each one aborts the whole run.
#[derive(Error, Debug)]
pub enum ReportError {
    /// A required column is missing from an input table.
    #[error("{table}: missing required column '{column}'")]
    Schema { table: String, column: String },

    /// The weight table maps one Filename to more than one row.
    #[error("weight table lists filename '{filename}' {count} times; the join would be ambiguous")]
    Join { filename: String, count: usize },

    /// Compound summaries disagree on their Sample ID groups.
    #[error("compound '{compound}' does not line up with '{reference}': {detail}")]
    Alignment {
        compound: String,
        reference: String,
        detail: String,
    },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot read spreadsheet {}: {source}", path.display())]
    Spreadsheet {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("cannot read delimited file {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("workbook writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("plot rendering failed for '{title}': {reason}")]
    Plot { title: String, reason: String },
}

impl ReportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ReportError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        ReportError::Schema {
            table: table.into(),
            column: column.into(),
        }
    }

    /// Process exit code for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            ReportError::Schema { .. } => 2,
            ReportError::Join { .. } => 3,
            ReportError::Alignment { .. } => 4,
            ReportError::Io { .. } => 5,
            ReportError::Config(_) => 6,
            ReportError::Spreadsheet { .. }
            | ReportError::Csv { .. }
            | ReportError::Xlsx(_)
            | ReportError::Plot { .. } => 1,
        }
    }
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, ReportError>;
