//! # Commands Module
//!
//! One function per screen action of the clinic front desk.
//!
//! ```text
//! commands/
//! ├── mod.rs          ◄─── You are here (exports, shared form helpers)
//! ├── auth.rs         ◄─── Staff accounts and login
//! ├── patient.rs      ◄─── Registration, search, history, archive
//! ├── doctor.rs       ◄─── Doctor records
//! ├── appointment.rs  ◄─── Booking and completion
//! ├── billing.rs      ◄─── Patient bills
//! ├── inventory.rs    ◄─── Clinic supplies
//! ├── sales.rs        ◄─── Retail catalogue and sales
//! ├── clinical.rs     ◄─── Prescriptions, medical records, procedures
//! ├── reminder.rs     ◄─── Appointment reminders
//! ├── invoice.rs      ◄─── Invoices for sales
//! ├── archive.rs      ◄─── Archive screen (list / restore)
//! └── report.rs       ◄─── Dashboard and reports
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CLI argument / form text                                               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  pub async fn register_patient(                                         │
//! │      db: &DbState,             ◄── Opened once in run()                 │
//! │      form: PatientForm,        ◄── Raw text, as typed                   │
//! │  ) -> Result<Patient, ApiError>                                         │
//! │         │                                                               │
//! │         ├── parse text fields (dates, money, enums)                    │
//! │         ├── call the manager(s) in clinic-db                           │
//! │         └── map DbError / ValidationError to ApiError                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Serializable result: printed as text, or as JSON with --json          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod appointment;
pub mod archive;
pub mod auth;
pub mod billing;
pub mod clinical;
pub mod doctor;
pub mod inventory;
pub mod invoice;
pub mod patient;
pub mod reminder;
pub mod report;
pub mod sales;

use std::str::FromStr;

use clinic_core::validation::optional_text;
use clinic_core::ValidationError;

/// Parses an optional choice field; blank counts as not given.
pub(crate) fn parse_choice<T>(value: Option<&str>) -> Result<Option<T>, ValidationError>
where
    T: FromStr<Err = ValidationError>,
{
    optional_text(value.map(str::to_string))
        .map(|v| v.parse())
        .transpose()
}

#[cfg(test)]
pub(crate) mod test_support {
    use clinic_core::{NewDoctor, Patient};

    use super::patient::{register_patient, PatientForm};
    use crate::state::DbState;

    pub async fn db() -> DbState {
        DbState::in_memory().await.unwrap()
    }

    pub fn patient_form(surname: &str, age: &str) -> PatientForm {
        PatientForm {
            surname: surname.to_string(),
            first_name: "Maria".to_string(),
            age: age.to_string(),
            gender: "female".to_string(),
            contact: "0917 555 0199".to_string(),
            ..Default::default()
        }
    }

    pub async fn patient(db: &DbState, surname: &str) -> Patient {
        register_patient(db, patient_form(surname, "34")).await.unwrap()
    }

    pub async fn doctor_id(db: &DbState) -> i64 {
        db.inner()
            .doctors()
            .add_doctor(NewDoctor {
                surname: "Reyes".to_string(),
                first_name: "Ana".to_string(),
                license_number: "PRC-0012345".to_string(),
                specialization: "Optometry".to_string(),
                ..Default::default()
            })
            .await
            .unwrap()
            .id
    }
}
