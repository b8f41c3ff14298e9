//! Unified error types and result handling.
//!
//! Every fallible operation in the crate returns [`Result`]. Each variant maps onto one of the
//! reason codes exposed to callers through [`Error::code`].

use thiserror::Error;

/// Reason codes surfaced to callers of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// A required argument is missing or has an invalid value
    InvalidArgument,
    /// The caller is not authenticated
    Unauthenticated,
    /// The caller's role does not allow the operation
    PermissionDenied,
    /// The addressed user or record does not exist
    NotFound,
    /// Stored data prevents the operation (e.g. a malformed record under the reject policy)
    FailedPrecondition,
    /// Backend or infrastructure failure
    Internal,
}

impl ErrorCode {
    /// Wire form of the code, e.g. `"permission-denied"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "invalid-argument",
            Self::Unauthenticated => "unauthenticated",
            Self::PermissionDenied => "permission-denied",
            Self::NotFound => "not-found",
            Self::FailedPrecondition => "failed-precondition",
            Self::Internal => "internal",
        }
    }
}

/// Crate-wide error type.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum Error {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("User must be authenticated")]
    Unauthenticated,

    #[error("Permission denied: {message}")]
    PermissionDenied { message: String },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("{kind} not found: {id}")]
    RecordNotFound { kind: &'static str, id: String },

    #[error("Invalid record {record_id}: {reason}")]
    InvalidRecord { record_id: String, reason: String },
}

impl Error {
    /// Shorthand for [`Error::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for [`Error::PermissionDenied`].
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied {
            message: message.into(),
        }
    }

    /// The caller-facing reason code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            Self::Unauthenticated => ErrorCode::Unauthenticated,
            Self::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            Self::UserNotFound { .. } | Self::RecordNotFound { .. } => ErrorCode::NotFound,
            Self::InvalidRecord { .. } => ErrorCode::FailedPrecondition,
            Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_)
            | Self::EnvVar(_) => ErrorCode::Internal,
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
