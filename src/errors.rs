//! Error types for loading, configuring and evaluating practice metrics.
//!
//! Two layers:
//!
//! - [`DataLoadError`] describes why one source table could not be loaded. It is
//!   fatal for that table only: the [`RecordStore`](crate::store::RecordStore)
//!   keeps it in the table's slot so downstream views can report the table as
//!   unavailable instead of empty.
//! - [`Error`] is the crate-level error for everything that is allowed to fail
//!   outright (configuration, validation of scenario inputs, exports).
//!
//! Per-row date failures, zero denominators and short forecast histories are not
//! errors at all; they are modelled as values (see
//! [`ParsedDate`](crate::core::dates::ParsedDate),
//! [`rate`](crate::aggregation::rate) and
//! [`ForecastOutcome`](crate::forecast::ForecastOutcome)).
//!
//! # Example
//!
//! ```rust
//! use dentalytics::errors::DataLoadError;
//! use dentalytics::store::TableKind;
//!
//! let err = DataLoadError::missing_columns(TableKind::Staff, "staff.csv", vec!["Staff_Role".into()]);
//! assert_eq!(err.table(), TableKind::Staff);
//! assert!(err.to_string().contains("Staff_Role"));
//! ```

use std::path::PathBuf;
use thiserror::Error;

use crate::store::TableKind;

/// Failure to load one source table.
#[derive(Debug, Error)]
pub enum DataLoadError {
    /// The source could not be opened or read
    #[error("{table} source {} could not be read: {source}", .path.display())]
    Io {
        table: TableKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source is not well-formed CSV
    #[error("{table} source {} is not valid CSV: {source}", .path.display())]
    Csv {
        table: TableKind,
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// The header row lacks columns the table cannot be interpreted without
    #[error("{table} source {} is missing required columns: {}", .path.display(), .missing.join(", "))]
    MissingColumns {
        table: TableKind,
        path: PathBuf,
        missing: Vec<String>,
    },

    /// The source has no header row at all
    #[error("{table} source {} is empty", .path.display())]
    Empty { table: TableKind, path: PathBuf },
}

impl DataLoadError {
    pub fn io(table: TableKind, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            table,
            path: path.into(),
            source,
        }
    }

    pub fn csv(table: TableKind, path: impl Into<PathBuf>, source: csv::Error) -> Self {
        Self::Csv {
            table,
            path: path.into(),
            source,
        }
    }

    pub fn empty(table: TableKind, path: impl Into<PathBuf>) -> Self {
        Self::Empty {
            table,
            path: path.into(),
        }
    }

    pub fn missing_columns(
        table: TableKind,
        path: impl Into<PathBuf>,
        missing: Vec<String>,
    ) -> Self {
        Self::MissingColumns {
            table,
            path: path.into(),
            missing,
        }
    }

    /// Table the failure belongs to.
    pub fn table(&self) -> TableKind {
        match self {
            Self::Io { table, .. }
            | Self::Csv { table, .. }
            | Self::MissingColumns { table, .. }
            | Self::Empty { table, .. } => *table,
        }
    }

    /// Source identifier (path) of the failed table.
    pub fn source_path(&self) -> &PathBuf {
        match self {
            Self::Io { path, .. }
            | Self::Csv { path, .. }
            | Self::MissingColumns { path, .. }
            | Self::Empty { path, .. } => path,
        }
    }
}

/// Crate-level error type
#[derive(Debug, Error)]
pub enum Error {
    /// A source table failed to load
    #[error(transparent)]
    DataLoad(#[from] DataLoadError),

    /// Configuration file or value errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid caller input (unknown scenario delta, out-of-range value, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Writing an export failed
    #[error("Export error: {0}")]
    Export(#[from] csv::Error),

    /// IO errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Get the error category name.
    pub fn category(&self) -> &'static str {
        match self {
            Self::DataLoad(_) => "DataLoad",
            Self::Configuration(_) => "Config",
            Self::Validation(_) => "Validation",
            Self::Export(_) => "Export",
            Self::Io(_) => "I/O",
            Self::Json(_) => "JSON",
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;
