//! Unified error hierarchy for ReadyRS
//!
//! Provides a structured error type system with per-subsystem error enums,
//! severity levels, and user-facing messages.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all ReadyRS operations
#[derive(Debug, Error)]
pub enum ReadyRsError {
    /// Training-log storage errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Import/export errors
    #[error("Import/Export error: {0}")]
    ImportExport(#[from] ImportExportError),

    /// Scoring calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Training-log storage errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Underlying SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Record not found
    #[error("Record not found: {table}.{id}")]
    NotFound { table: String, id: String },

    /// Duplicate entry rejected by content-hash check
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// Stored value could not be decoded into its domain type
    #[error("Corrupt value in {column}: {reason}")]
    CorruptValue { column: String, reason: String },

    /// Connection lock poisoned by a panicking writer
    #[error("Training log lock poisoned")]
    LockPoisoned,
}

/// Import and export errors
#[derive(Debug, Error)]
pub enum ImportExportError {
    /// File-level parse failure
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Missing required column or field
    #[error("Missing required data: {field}")]
    MissingData { field: String },

    /// A row failed validation
    #[error("Invalid row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    /// Export failed
    #[error("Export failed to {path}: {reason}")]
    ExportFailed { path: PathBuf, reason: String },

    /// IO failure while reading or writing a file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Scoring calculation errors
#[derive(Debug, Error)]
pub enum CalculationError {
    /// Invalid parameter
    #[error("Invalid parameter for {calculation}: {parameter}={value}")]
    InvalidParameter {
        calculation: String,
        parameter: String,
        value: String,
    },

    /// Invalid date range
    #[error("Invalid date range for {calculation}: {reason}")]
    InvalidDateRange { calculation: String, reason: String },
}

/// Result type alias for ReadyRS operations
pub type Result<T> = std::result::Result<T, ReadyRsError>;

impl ReadyRsError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReadyRsError::Io(_))
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ReadyRsError::Database(DatabaseError::NotFound { .. }) => ErrorSeverity::Warning,
            ReadyRsError::Database(DatabaseError::Duplicate(_)) => ErrorSeverity::Warning,
            ReadyRsError::Validation(_) => ErrorSeverity::Warning,
            ReadyRsError::Database(_) => ErrorSeverity::Error,
            ReadyRsError::Internal(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            ReadyRsError::Database(DatabaseError::Duplicate(what)) => {
                format!("Already logged: {}", what)
            }
            ReadyRsError::Database(DatabaseError::Sqlite(_)) => {
                "Unable to read the training log. Please check your data directory.".to_string()
            }
            ReadyRsError::ImportExport(ImportExportError::MissingData { field }) => {
                format!(
                    "The import file is missing a required column: {}. See `readyrs import --help` for the expected layout.",
                    field
                )
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical system error requiring immediate attention
    Critical,
    /// Error that prevents operation but system can continue
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = ReadyRsError::Database(DatabaseError::NotFound {
            table: "nutrition_plans".to_string(),
            id: "missing".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = ReadyRsError::Internal("test".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_error_retryable() {
        let err = ReadyRsError::Io(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "timeout",
        ));
        assert!(err.is_retryable());

        let err = ReadyRsError::Validation("test".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err = ReadyRsError::Database(DatabaseError::Duplicate(
            "Back Squat 5x100".to_string(),
        ));
        assert!(err.user_message().contains("Already logged"));

        let err = ReadyRsError::ImportExport(ImportExportError::MissingData {
            field: "reps".to_string(),
        });
        assert!(err.user_message().contains("reps"));
    }
}
