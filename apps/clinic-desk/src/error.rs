//! # API Error Type
//!
//! Unified error type for commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Clinic Desk                            │
//! │                                                                         │
//! │  clinic appointment schedule --patient 3 --doctor 1 ...                 │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Command Function                                                │  │
//! │  │  Result<T, ApiError>                                             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Form input bad?  ── ValidationError ─────────────┐              │  │
//! │  │  Clinic rule?     ── CoreError::DuplicateBooking ─┤              │  │
//! │  │  Database?        ── DbError::NotFound ───────────┴─► ApiError   │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  stderr: [DuplicateBooking] Double booking detected for this ...       │
//! │  --json: {"code":"DUPLICATE_BOOKING","message":"..."}                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;

use clinic_core::{CoreError, ValidationError};
use clinic_db::DbError;

use crate::state::ConfigError;

/// Error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "NOT_FOUND",
///   "message": "Patient not found: 12"
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Human-readable error message
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Record not found
    NotFound,

    /// Form input failed validation
    ValidationError,

    /// Username or invoice number already taken, or a restore collides
    Conflict,

    /// Record is still referenced elsewhere
    InUse,

    /// Doctor already booked in that slot
    DuplicateBooking,

    /// Not enough stock for a sale or withdrawal
    InsufficientStock,

    /// Wrong username or password
    Unauthorized,

    /// Database operation failed
    DatabaseError,

    /// Configuration could not be loaded
    ConfigError,

    /// Internal error
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: impl std::fmt::Display) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized() -> Self {
        ApiError::new(ErrorCode::Unauthorized, "Invalid username or password")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!("Foreign key violation: {}", message);
                ApiError::new(
                    ErrorCode::InUse,
                    "Record is referenced by other records or refers to a missing one",
                )
            }
            DbError::Domain(e) => ApiError::from(e),
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::DuplicateBooking { .. } => ErrorCode::DuplicateBooking,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::EmptySale | CoreError::Validation(_) => ErrorCode::ValidationError,
        };
        match err {
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
            other => ApiError::new(code, other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        ApiError::new(ErrorCode::ConfigError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_duplicate_booking_keeps_message() {
        let err: ApiError = DbError::Domain(CoreError::DuplicateBooking {
            doctor_id: 1,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        })
        .into();

        assert_eq!(err.code, ErrorCode::DuplicateBooking);
        assert!(err.message.starts_with("Double booking detected"));
    }

    #[test]
    fn test_not_found_and_conflict() {
        let err: ApiError = DbError::not_found("Patient", 12).into();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "Patient not found: 12");

        let err: ApiError = DbError::duplicate("username", "admin").into();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[test]
    fn test_validation_serializes_code() {
        let err: ApiError = ValidationError::required("surname").into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "surname is required");
    }
}
