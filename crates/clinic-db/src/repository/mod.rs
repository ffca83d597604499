//! # Repository Module
//!
//! One manager per clinic entity.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  clinic-desk command                                                   │
//! │       │                                                                 │
//! │       │  db.patients().add_patient(form)                               │
//! │       ▼                                                                 │
//! │  PatientRepository                                                     │
//! │  ├── add_patient / list_patients / get_patient / update_patient        │
//! │  └── archive_patient / restore / list_archived ──► ArchiveTable<T>     │
//! │       │                                                                 │
//! │       │  Parameterized SQL                                              │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each repository holds a clone of the pool, so handles are cheap to
//! create per call (`db.patients()`).

pub mod appointment;
pub mod archive;
pub mod billing;
pub mod doctor;
pub mod inventory;
pub mod invoice;
pub mod medical_record;
pub mod patient;
pub mod prescription;
pub mod procedure;
pub mod reminder;
pub mod report;
pub mod sales;
pub mod user;

pub use appointment::AppointmentRepository;
pub use billing::BillingRepository;
pub use doctor::DoctorRepository;
pub use inventory::InventoryRepository;
pub use invoice::InvoiceRepository;
pub use medical_record::MedicalRecordRepository;
pub use patient::PatientRepository;
pub use prescription::PrescriptionRepository;
pub use procedure::ProcedureRepository;
pub use reminder::ReminderRepository;
pub use report::ReportRepository;
pub use sales::SalesRepository;
pub use user::UserRepository;

/// SQL expression for a patient's display name, `"Surname, FirstName M"`.
///
/// `$alias` is the patients table alias in the surrounding query.
macro_rules! patient_name_sql {
    ($alias:literal) => {
        concat!(
            $alias, ".surname || ', ' || ", $alias, ".first_name || ",
            "COALESCE(' ' || NULLIF(", $alias, ".middle_initial, ''), '')"
        )
    };
}

pub(crate) use patient_name_sql;
