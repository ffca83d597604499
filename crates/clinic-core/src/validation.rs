//! # Validation Module
//!
//! Form validation for Clinic Desk.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Command layer (clinic-desk)                                  │
//! │  ├── Parse operator input (dates, times, amounts)                      │
//! │  └── parse_date / parse_time / Money::parse                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Managers (clinic-db)                                         │
//! │  └── THIS MODULE: required fields, phone, email, age, ...              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL / CHECK constraints                                      │
//! │  ├── UNIQUE constraints (username, invoice number)                     │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use clinic_core::validation::{validate_phone, parse_time};
//!
//! assert!(validate_phone("(02) 555-1234").is_ok());
//! assert!(validate_phone("12-34").is_err());
//! assert_eq!(parse_time("9:30").unwrap().to_string(), "09:30:00");
//! ```

use chrono::{NaiveDate, NaiveTime};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{NewDoctor, NewPatient};
use crate::{MAX_PATIENT_AGE, MIN_PASSWORD_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest middle initial the forms accept.
const MAX_MIDDLE_INITIAL: usize = 10;

/// Minimum digits in a phone number once separators are removed.
const MIN_PHONE_DIGITS: usize = 7;

// =============================================================================
// String Validators
// =============================================================================

/// Checks a required text field and returns it trimmed.
///
/// ```rust
/// use clinic_core::validation::validate_required;
///
/// assert_eq!(validate_required("  Reyes ", "surname").unwrap(), "Reyes");
/// assert!(validate_required("   ", "surname").is_err());
/// ```
pub fn validate_required(value: &str, field: &str) -> ValidationResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::required(field));
    }
    Ok(value.to_string())
}

/// Trims an optional field; blank becomes `None`.
pub fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validates a phone number.
///
/// ## Rules
/// - Required
/// - After removing `-`, spaces and parentheses: digits only, at least 7
pub fn validate_phone(value: &str) -> ValidationResult<String> {
    let value = validate_required(value, "contact")?;

    let digits: String = value
        .chars()
        .filter(|c| !matches!(c, '-' | ' ' | '(' | ')'))
        .collect();

    if digits.len() < MIN_PHONE_DIGITS || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::invalid(
            "contact",
            "must be a valid phone number",
        ));
    }

    Ok(value)
}

/// Validates an optional email address (needs `@` and `.`).
pub fn validate_email(value: Option<&str>) -> ValidationResult<Option<String>> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(email) if email.contains('@') && email.contains('.') => Ok(Some(email.to_string())),
        Some(_) => Err(ValidationError::invalid("email", "format is invalid")),
    }
}

/// Validates an optional middle initial.
pub fn validate_middle_initial(value: Option<String>) -> ValidationResult<Option<String>> {
    let value = optional_text(value);
    if let Some(mi) = &value {
        if mi.chars().count() > MAX_MIDDLE_INITIAL {
            return Err(ValidationError::TooLong {
                field: "middle_initial".to_string(),
                max: MAX_MIDDLE_INITIAL,
            });
        }
    }
    Ok(value)
}

/// Validates a new account password.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    if password.is_empty() {
        return Err(ValidationError::required("password"));
    }
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: MIN_PASSWORD_LENGTH,
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a patient's age (0-150).
pub fn validate_age(age: i64) -> ValidationResult<i64> {
    if !(0..=MAX_PATIENT_AGE).contains(&age) {
        return Err(ValidationError::OutOfRange {
            field: "age".to_string(),
            min: 0,
            max: MAX_PATIENT_AGE,
        });
    }
    Ok(age)
}

/// Parses an age typed as text. Blank means "not given".
pub fn parse_age(value: &str) -> ValidationResult<Option<i64>> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    let age: i64 = value
        .parse()
        .map_err(|_| ValidationError::invalid("age", "must be a whole number"))?;
    validate_age(age).map(Some)
}

/// Validates an amount that may be zero but not negative.
pub fn validate_amount(amount: Money, field: &str) -> ValidationResult<()> {
    if amount.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }
    Ok(())
}

/// Validates a sale line quantity (must be positive).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates stock on hand (zero allowed).
pub fn validate_stock_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::Negative {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

/// Validates a follow-up interval in days.
pub fn validate_followup_days(days: i64) -> ValidationResult<i64> {
    if days < 0 {
        return Err(ValidationError::Negative {
            field: "followup_days".to_string(),
        });
    }
    Ok(days)
}

// =============================================================================
// Date / Time Parsing
// =============================================================================

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(value: &str) -> ValidationResult<NaiveDate> {
    let value = validate_required(value, "date")?;
    NaiveDate::parse_from_str(&value, "%Y-%m-%d")
        .map_err(|e| ValidationError::invalid("date", format!("expected YYYY-MM-DD ({})", e)))
}

/// Parses an `HH:MM` (or `HH:MM:SS`) time of day.
pub fn parse_time(value: &str) -> ValidationResult<NaiveTime> {
    let value = validate_required(value, "time")?;
    NaiveTime::parse_from_str(&value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(&value, "%H:%M:%S"))
        .map_err(|_| ValidationError::invalid("time", "expected HH:MM"))
}

// =============================================================================
// Form Validators
// =============================================================================

/// Validates and trims the patient registration form.
///
/// Surname, first name, gender and contact are required. The age group is
/// filled in from the age when the form leaves it empty.
pub fn validate_new_patient(form: NewPatient) -> ValidationResult<NewPatient> {
    let age_group = Some(form.resolved_age_group());
    let gender = form.gender.ok_or_else(|| ValidationError::required("gender"))?;

    Ok(NewPatient {
        surname: validate_required(&form.surname, "surname")?,
        first_name: validate_required(&form.first_name, "first_name")?,
        middle_initial: validate_middle_initial(form.middle_initial)?,
        age: form.age.map(validate_age).transpose()?,
        gender: Some(gender),
        age_group,
        address: optional_text(form.address),
        contact: validate_phone(&form.contact)?,
        email: validate_email(form.email.as_deref())?,
        medical_history: optional_text(form.medical_history),
    })
}

/// Validates and trims the doctor form.
pub fn validate_new_doctor(form: NewDoctor) -> ValidationResult<NewDoctor> {
    Ok(NewDoctor {
        surname: validate_required(&form.surname, "surname")?,
        first_name: validate_required(&form.first_name, "first_name")?,
        middle_initial: validate_middle_initial(form.middle_initial)?,
        license_number: validate_required(&form.license_number, "license_number")?,
        specialization: validate_required(&form.specialization, "specialization")?,
        contact: optional_text(form.contact),
        schedule: optional_text(form.schedule),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AgeGroup, Gender};

    fn patient_form() -> NewPatient {
        NewPatient {
            surname: " Dela Cruz ".to_string(),
            first_name: "Juan".to_string(),
            middle_initial: Some("".to_string()),
            age: Some(12),
            gender: Some(Gender::Male),
            contact: "0917 123 4567".to_string(),
            email: Some("  ".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("09171234567").is_ok());
        assert!(validate_phone("(02) 555-1234").is_ok());
        assert!(validate_phone("555-12").is_err());
        assert!(validate_phone("0917-ABC-4567").is_err());
        assert!(matches!(validate_phone("  "), Err(ValidationError::Required { .. })));
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email(None).unwrap(), None);
        assert_eq!(validate_email(Some("  ")).unwrap(), None);
        assert_eq!(
            validate_email(Some(" ana@clinic.ph ")).unwrap().as_deref(),
            Some("ana@clinic.ph")
        );
        assert!(validate_email(Some("ana.clinic.ph")).is_err());
        assert!(validate_email(Some("ana@clinic")).is_err());
    }

    #[test]
    fn test_validate_age() {
        assert!(validate_age(0).is_ok());
        assert!(validate_age(150).is_ok());
        assert!(validate_age(-1).is_err());
        assert!(validate_age(151).is_err());

        assert_eq!(parse_age("").unwrap(), None);
        assert_eq!(parse_age(" 42 ").unwrap(), Some(42));
        assert!(parse_age("forty").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("s3cretpass").is_ok());
        assert!(matches!(validate_password(""), Err(ValidationError::Required { .. })));
        assert!(matches!(
            validate_password("short"),
            Err(ValidationError::TooShort { min: 8, .. })
        ));
    }

    #[test]
    fn test_amounts_and_quantities() {
        assert!(validate_amount(Money::zero(), "amount").is_ok());
        assert!(validate_amount(Money::from_cents(-1), "amount").is_err());
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_stock_quantity(0).is_ok());
        assert!(validate_stock_quantity(-3).is_err());
        assert!(validate_tax_rate_bps(10_000).is_ok());
        assert!(validate_tax_rate_bps(10_001).is_err());
    }

    #[test]
    fn test_parse_date_and_time() {
        assert_eq!(
            parse_date("2026-03-02").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
        );
        assert!(parse_date("2026-02-30").is_err());
        assert!(parse_date("03/02/2026").is_err());

        assert_eq!(parse_time("14:05").unwrap(), NaiveTime::from_hms_opt(14, 5, 0).unwrap());
        assert_eq!(parse_time("14:05:30").unwrap(), NaiveTime::from_hms_opt(14, 5, 30).unwrap());
        assert!(parse_time("24:00").is_err());
        assert!(parse_time("").is_err());
    }

    #[test]
    fn test_validate_new_patient_trims_and_derives() {
        let form = validate_new_patient(patient_form()).unwrap();
        assert_eq!(form.surname, "Dela Cruz");
        assert_eq!(form.middle_initial, None);
        assert_eq!(form.email, None);
        assert_eq!(form.age_group, Some(AgeGroup::Kids));
    }

    #[test]
    fn test_validate_new_patient_requires_fields() {
        let mut form = patient_form();
        form.gender = None;
        assert!(matches!(
            validate_new_patient(form),
            Err(ValidationError::Required { field }) if field == "gender"
        ));

        let mut form = patient_form();
        form.first_name = " ".to_string();
        assert!(validate_new_patient(form).is_err());

        let mut form = patient_form();
        form.age = Some(200);
        assert!(validate_new_patient(form).is_err());
    }

    #[test]
    fn test_validate_new_doctor() {
        let form = NewDoctor {
            surname: "Reyes".to_string(),
            first_name: "Ana".to_string(),
            license_number: " PRC-0012345 ".to_string(),
            specialization: "Optometry".to_string(),
            contact: Some(" ".to_string()),
            ..Default::default()
        };
        let form = validate_new_doctor(form).unwrap();
        assert_eq!(form.license_number, "PRC-0012345");
        assert_eq!(form.contact, None);

        let missing = NewDoctor {
            surname: "Reyes".to_string(),
            first_name: "Ana".to_string(),
            ..Default::default()
        };
        assert!(validate_new_doctor(missing).is_err());
    }
}
