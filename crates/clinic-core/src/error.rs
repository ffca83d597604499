//! # Error Types
//!
//! Domain-specific error types for clinic-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  clinic-core errors (this file)                                        │
//! │  ├── CoreError        - Clinic rule violations                         │
//! │  └── ValidationError  - Form field failures                            │
//! │                                                                         │
//! │  clinic-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  clinic-desk errors (app)                                              │
//! │  └── ApiError         - What the operator sees (serialized)            │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Operator     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Clinic rule violations.
///
/// Raised before anything is written; the database layer wraps these
/// in `DbError::Domain` so callers see a single error type per layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The doctor already has a scheduled appointment in this slot.
    ///
    /// ## When This Occurs
    /// ```text
    /// schedule(doctor 3, 2026-03-02, 09:00)
    ///      │
    ///      ▼
    /// existing Scheduled row for doctor 3 @ 2026-03-02 09:00?
    ///      │ yes
    ///      ▼
    /// DuplicateBooking
    /// ```
    /// A slot whose appointment is `Done` can be booked again.
    #[error("Double booking detected for this time slot (doctor {doctor_id}, {date} {time})")]
    DuplicateBooking {
        doctor_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    },

    /// A sale was submitted with no line items.
    #[error("A sale needs at least one item")]
    EmptySale,

    /// Not enough stock on hand to complete a sale line.
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        available: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These mirror the checks the registration and booking forms perform
/// before a manager is called.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} cannot be negative")]
    Negative { field: String },

    /// Invalid format (e.g., phone number, date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: &str) -> Self {
        ValidationError::Required {
            field: field.to_string(),
        }
    }

    /// Shorthand for [`ValidationError::InvalidFormat`].
    pub fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_booking_message() {
        let err = CoreError::DuplicateBooking {
            doctor_id: 3,
            date: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        };
        assert!(err
            .to_string()
            .starts_with("Double booking detected for this time slot"));
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("surname").to_string(),
            "surname is required"
        );

        let err = ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        };
        assert_eq!(err.to_string(), "password must be at least 8 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("contact").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
