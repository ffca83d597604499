//! # clinic-db: Database Layer for Clinic Desk
//!
//! SQLite storage for the clinic, accessed through one repository
//! ("manager") per entity.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Clinic Desk Data Flow                            │
//! │                                                                         │
//! │  clinic-desk command (schedule_appointment)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     clinic-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐ │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │ │   │
//! │  │   │   (pool.rs)   │    │                │    │  (embedded)  │ │   │
//! │  │   │               │    │ PatientRepo    │    │ 001_initial  │ │   │
//! │  │   │ SqlitePool    │◄───│ AppointmentRepo│    │ 002_archive  │ │   │
//! │  │   │               │    │ ...            │    │              │ │   │
//! │  │   └───────────────┘    └───────┬────────┘    └──────────────┘ │   │
//! │  │                                │                               │   │
//! │  │                        ┌───────▼────────┐                      │   │
//! │  │                        │ ArchiveTable<T>│  soft delete/restore │   │
//! │  │                        └────────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (platform data dir, or CLINIC_DB_PATH)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Managers plus the generic archive helper
//!
//! ## Usage
//!
//! ```rust,ignore
//! use clinic_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("clinic.db")).await?;
//! let appt = db.appointments().schedule(patient_id, doctor_id, date, time).await?;
//! db.appointments().mark_as_done(appt.id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::archive::{archive_in, restore_in, Archivable, ArchiveSpec, ArchiveTable, Archived};
pub use repository::{
    AppointmentRepository, BillingRepository, DoctorRepository, InventoryRepository,
    InvoiceRepository, MedicalRecordRepository, PatientRepository, PrescriptionRepository,
    ProcedureRepository, ReminderRepository, ReportRepository, SalesRepository, UserRepository,
};
