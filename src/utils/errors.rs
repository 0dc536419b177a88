//! Error handling for FarmPool
//!
//! This module defines the main error types used throughout the application
//! and the normalisation of backend failures into user-facing messages.

use thiserror::Error;
use uuid::Uuid;

use crate::models::GroupStatus;

/// Fallback message when nothing more specific is known about a failure
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Known backend error codes and the message shown for each of them
const BACKEND_ERROR_MESSAGES: &[(&str, &str)] = &[
    ("23505", "This record already exists."),
    ("23503", "A referenced record does not exist."),
    ("23514", "The submitted values are out of the allowed range."),
    ("42501", "You do not have permission to perform this action."),
    ("40001", "The group changed while your request was processed. Please try again."),
    ("57014", "The request took too long and was cancelled."),
    ("08006", "Lost connection to the database. Please try again."),
];

/// Main error type for FarmPool
#[derive(Error, Debug)]
pub enum FarmPoolError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Backend error {code}: {message}")]
    Backend { code: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Group buy not found: {group_id}")]
    GroupNotFound { group_id: Uuid },

    #[error("No group buy uses invite code {code}")]
    InviteCodeNotFound { code: String },

    #[error("Group buy {group_id} is not accepting joins (status: {status})")]
    NotJoinable { group_id: Uuid, status: GroupStatus },

    #[error("Group buy {group_id} has passed its deadline")]
    GroupExpired { group_id: Uuid },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for FarmPool operations
pub type Result<T> = std::result::Result<T, FarmPoolError>;

impl FarmPoolError {
    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        match self {
            FarmPoolError::Database(_) => true,
            FarmPoolError::Migration(_) => false,
            FarmPoolError::Backend { code, .. } => matches!(code.as_str(), "40001" | "57014" | "08006"),
            FarmPoolError::Config(_) => false,
            FarmPoolError::GroupNotFound { .. } => false,
            FarmPoolError::InviteCodeNotFound { .. } => false,
            FarmPoolError::NotJoinable { .. } => false,
            FarmPoolError::GroupExpired { .. } => false,
            FarmPoolError::Validation(_) => false,
            FarmPoolError::Serialization(_) => false,
            FarmPoolError::Io(_) => true,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FarmPoolError::Migration(_) => ErrorSeverity::Critical,
            FarmPoolError::Config(_) => ErrorSeverity::Critical,
            FarmPoolError::Database(_) | FarmPoolError::Backend { .. } => ErrorSeverity::Error,
            FarmPoolError::GroupNotFound { .. }
            | FarmPoolError::InviteCodeNotFound { .. }
            | FarmPoolError::NotJoinable { .. }
            | FarmPoolError::GroupExpired { .. } => ErrorSeverity::Warning,
            FarmPoolError::Validation(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Backend error code attached to this error, if any
    pub fn backend_code(&self) -> Option<String> {
        match self {
            FarmPoolError::Backend { code, .. } => Some(code.clone()),
            FarmPoolError::Database(sqlx::Error::Database(db)) => db.code().map(|c| c.into_owned()),
            _ => None,
        }
    }

    /// True when the failure is a unique-constraint violation
    pub fn is_unique_violation(&self) -> bool {
        self.backend_code().as_deref() == Some("23505")
    }

    /// Human-readable description for display to end users
    ///
    /// Domain errors carry their own wording. Backend failures go through the
    /// known-code table, then the backend's raw message, then the generic text.
    pub fn user_message(&self) -> String {
        match self {
            FarmPoolError::GroupNotFound { .. } | FarmPoolError::InviteCodeNotFound { .. } => {
                "This group buy could not be found.".to_string()
            }
            FarmPoolError::NotJoinable { .. } => "This group buy is no longer accepting participants.".to_string(),
            FarmPoolError::GroupExpired { .. } => "This group buy has passed its deadline.".to_string(),
            FarmPoolError::Validation(message) => message.clone(),
            FarmPoolError::Backend { code, message } => normalize_backend_error(Some(code), Some(message)),
            FarmPoolError::Database(sqlx::Error::Database(db)) => {
                normalize_backend_error(db.code().as_deref(), Some(db.message()))
            }
            _ => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }
}

/// Map a backend code and raw message to the message shown to users
pub fn normalize_backend_error(code: Option<&str>, raw_message: Option<&str>) -> String {
    if let Some(code) = code {
        if let Some((_, message)) = BACKEND_ERROR_MESSAGES.iter().find(|(known, _)| *known == code) {
            return message.to_string();
        }
    }

    match raw_message {
        Some(message) if !message.trim().is_empty() => message.to_string(),
        _ => GENERIC_ERROR_MESSAGE.to_string(),
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}
