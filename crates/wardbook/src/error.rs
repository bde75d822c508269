//! Error types for wardbook.
//!
//! This module defines all error types used throughout the wardbook crate.
//! Storage faults are kept distinct from record-level conditions so the web
//! layer can show "not found" and "invalid input" to the operator while
//! reporting everything else as an internal error.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for wardbook operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Record Errors ===
    /// The requested staff record does not exist.
    #[error("staff not found: {key}")]
    StaffNotFound {
        /// The id or hospital number that was looked up.
        key: String,
    },

    /// A submitted field failed validation.
    #[error("invalid {field}: {message}")]
    InvalidInput {
        /// Name of the offending form field.
        field: &'static str,
        /// Description of the problem.
        message: String,
    },

    /// A visit outcome outside the fixed vocabulary.
    #[error("unknown visit outcome '{0}'")]
    UnknownOutcome(String),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to move an uploaded file into the uploads directory.
    #[error("failed to store upload at {path}: {source}")]
    UploadStore {
        /// Destination path of the upload.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for wardbook operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a staff-not-found error for the given lookup key.
    #[must_use]
    pub fn staff_not_found(key: impl ToString) -> Self {
        Self::StaffNotFound {
            key: key.to_string(),
        }
    }

    /// Create an invalid input error for a form field.
    #[must_use]
    pub fn invalid_input(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            message: message.into(),
        }
    }

    /// Check if this error means a record was missing.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::StaffNotFound { .. })
    }

    /// Check if this error was caused by operator input.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. } | Self::UnknownOutcome(_))
    }
}
