//! Error types for carshare.
//!
//! This module defines all error types used throughout the carshare crate.
//! Lifecycle errors (validation, authorization, invalid state) are recoverable
//! at the request boundary and carry a message meant for the acting user.

use std::path::PathBuf;

use thiserror::Error;

use crate::model::{RentalId, RentalStatus};

/// The main error type for carshare operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Lifecycle Errors ===
    /// A submitted field value is malformed or inconsistent.
    #[error("{field} {message}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The actor may not perform the requested action.
    #[error("not allowed to {action}: {reason}")]
    Authorization {
        /// The attempted action.
        action: &'static str,
        /// Why it was refused.
        reason: String,
    },

    /// The rental's current status does not allow the requested action.
    #[error("cannot {action} rental {rental} while it is {status}")]
    InvalidState {
        /// The rental that was acted on.
        rental: RentalId,
        /// Its status when the action was attempted.
        status: RentalStatus,
        /// The attempted action.
        action: &'static str,
    },

    /// A referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Kind of record (user, car, rental).
        entity: &'static str,
        /// Identifier that was looked up.
        id: String,
    },

    // === Identity Errors ===
    /// Credentials were missing or did not match.
    #[error("invalid username or password")]
    Unauthenticated,

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

    // === Server Errors ===
    /// The HTTP listener could not be bound.
    #[error("failed to bind {addr}: {source}")]
    ServerBind {
        /// Address that was requested.
        addr: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

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

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for carshare operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error for a field.
    #[must_use]
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Create an authorization error for an action.
    #[must_use]
    pub fn authorization(action: &'static str, reason: impl Into<String>) -> Self {
        Self::Authorization {
            action,
            reason: reason.into(),
        }
    }

    /// Create a not-found error.
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a field validation failure.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error is an authorization failure.
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization { .. })
    }

    /// Check if this error is an illegal status transition.
    #[must_use]
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    /// Check if this error is a missing record.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether the error should be shown to the acting user as-is.
    ///
    /// Everything else is an operational failure and is reported generically.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Authorization { .. }
                | Self::InvalidState { .. }
                | Self::NotFound { .. }
                | Self::Unauthenticated
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_display() {
        let err = Error::validation("price", "must not be negative");
        assert_eq!(err.to_string(), "price must not be negative");
        assert!(err.is_validation());
    }

    #[test]
    fn test_authorization_display() {
        let err = Error::authorization("reserve", "owners cannot rent their own listing");
        assert_eq!(
            err.to_string(),
            "not allowed to reserve: owners cannot rent their own listing"
        );
        assert!(err.is_authorization());
        assert!(!err.is_validation());
    }

    #[test]
    fn test_invalid_state_display() {
        let err = Error::InvalidState {
            rental: RentalId(7),
            status: RentalStatus::Canceled,
            action: "cancel",
        };
        assert_eq!(err.to_string(), "cannot cancel rental 7 while it is canceled");
        assert!(err.is_invalid_state());
    }

    #[test]
    fn test_not_found_display() {
        let err = Error::not_found("car", 42);
        assert_eq!(err.to_string(), "car 42 not found");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_user_facing() {
        assert!(Error::Unauthenticated.is_user_facing());
        assert!(Error::validation("terms", "is too long").is_user_facing());
        assert!(!Error::internal("boom").is_user_facing());
        assert!(!Error::DatabaseMigration {
            message: "x".to_string()
        }
        .is_user_facing());
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "page_size must be greater than 0".to_string(),
        };
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn test_server_bind_error_display() {
        let err = Error::ServerBind {
            addr: "127.0.0.1:80".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        let msg = err.to_string();
        assert!(msg.contains("127.0.0.1:80"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }
}
