//! Error types for the elskip data pipelines
//!
//! Errors are grouped by the concern that raises them. Per-source failures
//! (`SourceError`) are reported and counted by the pipelines without aborting
//! the run; the top-level `AppError` is what a command handler returns.
//!
//! Region lookup failures deliberately have no error type here: the lookup
//! client collapses every failure into `LookupOutcome::NotFound`. Building the
//! client is a configuration concern and fails with `ConfigError`.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or writing one source file
#[derive(Error, Debug)]
pub enum SourceError {
    /// File could not be read
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is not valid JSON
    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Document could not be serialized for writing
    #[error("Failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// File could not be written
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Atomic rename of the temporary file failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// Source directory is missing or unreadable
    #[error("Source directory not accessible: {path}")]
    DirectoryNotAccessible { path: PathBuf },
}

/// Errors raised while loading spreadsheet extracts
#[derive(Error, Debug)]
pub enum TabularError {
    /// Workbook could not be opened or parsed
    #[error("Failed to open workbook {path}: {reason}")]
    Workbook { path: PathBuf, reason: String },

    /// Workbook has no worksheets at all
    #[error("Workbook {path} contains no worksheets")]
    NoWorksheets { path: PathBuf },

    /// A dimension column is absent from the header row
    #[error("Extract {path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    /// No extracts were found in the source directory
    #[error("No spreadsheet extracts found in {path}")]
    NoExtracts { path: PathBuf },

    /// Background read of an extract did not complete
    #[error("Reading {path} was interrupted: {reason}")]
    Interrupted { path: PathBuf, reason: String },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Source file error
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Spreadsheet extract error
    #[error(transparent)]
    Tabular(#[from] TabularError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// One or more sources failed during a run that otherwise completed
    #[error("{failed} of {total} sources failed")]
    SourcesFailed { failed: usize, total: usize },

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Source(_) => "source",
            AppError::Tabular(_) => "tabular",
            AppError::Config(_) => "config",
            AppError::SourcesFailed { .. } => "partial",
            AppError::Generic { .. } => "generic",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Source file result type alias
pub type SourceResult<T> = std::result::Result<T, SourceError>;

/// Spreadsheet extract result type alias
pub type TabularResult<T> = std::result::Result<T, TabularError>;

/// Configuration result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
