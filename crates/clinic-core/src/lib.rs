//! # clinic-core: Pure Domain Logic for Clinic Desk
//!
//! This crate holds the records, rules and money math of the clinic.
//! Nothing in here touches a database, a file or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Clinic Desk Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 clinic-desk (commands + CLI)                    │   │
//! │  │   register patient, book appointment, bill, invoice, archive   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ clinic-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐                  │   │
//! │  │   │   types   │  │   money   │  │ validation│                  │   │
//! │  │   │  Patient  │  │   Money   │  │  phone    │                  │   │
//! │  │   │  Invoice  │  │  TaxRate  │  │  email    │                  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘                  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 clinic-db (Database Layer)                      │   │
//! │  │          SQLite managers, migrations, archive/restore           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (Patient, Doctor, Appointment, Invoice, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`error`] - Domain error types
//! - [`validation`] - Form field validation
//!
//! ## Example Usage
//!
//! ```rust
//! use clinic_core::money::Money;
//! use clinic_core::types::{AgeGroup, TaxRate};
//!
//! // 12% invoice tax on ₱1,500.00
//! let total = Money::from_cents(150_000);
//! let tax = total.calculate_tax(TaxRate::from_bps(clinic_core::INVOICE_TAX_RATE_BPS));
//! assert_eq!(tax.cents(), 18_000);
//!
//! assert_eq!(AgeGroup::for_age(Some(12)), AgeGroup::Kids);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Tax applied when an invoice is generated from a sale (12% VAT).
pub const INVOICE_TAX_RATE_BPS: u32 = 1200;

/// How long a prescription stays valid after it is issued.
pub const PRESCRIPTION_VALIDITY_DAYS: i64 = 365;

/// Prescriptions expiring within this window are flagged for renewal.
pub const PRESCRIPTION_EXPIRY_WARNING_DAYS: i64 = 30;

/// Follow-up interval used when a medical record doesn't specify one.
pub const DEFAULT_FOLLOWUP_DAYS: i64 = 90;

/// Minimum length for staff account passwords.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Patients younger than this are in the Kids age group.
pub const ADULT_AGE: i64 = 18;

/// Upper bound accepted for a patient's age.
pub const MAX_PATIENT_AGE: i64 = 150;
