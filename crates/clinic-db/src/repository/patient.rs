//! # Patient Repository
//!
//! Registration, lookup and archiving of patients.
//!
//! ## Patient Lifecycle
//! ```text
//! add_patient ──► patients ──archive_patient──► archived_patients
//!                    ▲                                │
//!                    └────────────restore─────────────┘
//! ```
//! A patient with live appointments, bills or clinical records can't be
//! archived; the foreign keys reject it.

use chrono::{Local, NaiveDate};
use sqlx::SqlitePool;
use tracing::{debug, info};

use clinic_core::validation::validate_new_patient;
use clinic_core::{AgeGroup, NewPatient, Patient};

use crate::error::{DbError, DbResult};
use crate::repository::archive::{Archivable, ArchiveSpec, ArchiveTable, Archived};

impl Archivable for Patient {
    const SPEC: ArchiveSpec = ArchiveSpec {
        entity: "Patient",
        table: "patients",
        archive_table: "archived_patients",
        id_column: "id",
    };
}

/// Repository for patient database operations.
#[derive(Debug, Clone)]
pub struct PatientRepository {
    pool: SqlitePool,
}

impl PatientRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PatientRepository { pool }
    }

    /// Archive helper for patients.
    pub fn archive_table(&self) -> ArchiveTable<Patient> {
        ArchiveTable::new(self.pool.clone())
    }

    /// Registers a patient. Registration date is today.
    ///
    /// Surname, first name, gender and contact are required; the age group
    /// is derived from the age unless the form sets one.
    pub async fn add_patient(&self, form: NewPatient) -> DbResult<Patient> {
        let form = validate_new_patient(form)?;
        let age_group = form.resolved_age_group();
        let today = Local::now().date_naive();

        debug!(surname = %form.surname, first_name = %form.first_name, "Adding patient");

        let patient = sqlx::query_as::<_, Patient>(
            r#"
            INSERT INTO patients (
                surname, first_name, middle_initial, age, gender, age_group,
                address, contact, email, medical_history, registration_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            RETURNING *
            "#,
        )
        .bind(&form.surname)
        .bind(&form.first_name)
        .bind(&form.middle_initial)
        .bind(form.age)
        .bind(form.gender)
        .bind(age_group)
        .bind(&form.address)
        .bind(&form.contact)
        .bind(&form.email)
        .bind(&form.medical_history)
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        info!(id = patient.id, "Patient registered");
        Ok(patient)
    }

    /// All live patients, newest first.
    pub async fn list_patients(&self) -> DbResult<Vec<Patient>> {
        let patients = sqlx::query_as::<_, Patient>("SELECT * FROM patients ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(patients)
    }

    pub async fn get_patient(&self, id: i64) -> DbResult<Option<Patient>> {
        let patient = sqlx::query_as::<_, Patient>("SELECT * FROM patients WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(patient)
    }

    /// Case-insensitive search on surname, first name or contact number.
    pub async fn search_patients(&self, query: &str) -> DbResult<Vec<Patient>> {
        let pattern = format!("%{}%", query.trim());

        let patients = sqlx::query_as::<_, Patient>(
            r#"
            SELECT * FROM patients
            WHERE surname LIKE ?1 OR first_name LIKE ?1 OR contact LIKE ?1
            ORDER BY surname, first_name
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(patients)
    }

    /// Replaces a patient's details. The registration date is kept.
    pub async fn update_patient(&self, id: i64, form: NewPatient) -> DbResult<Patient> {
        let form = validate_new_patient(form)?;
        let age_group = form.resolved_age_group();

        debug!(id, "Updating patient");

        let patient = sqlx::query_as::<_, Patient>(
            r#"
            UPDATE patients SET
                surname = ?2, first_name = ?3, middle_initial = ?4, age = ?5,
                gender = ?6, age_group = ?7, address = ?8, contact = ?9,
                email = ?10, medical_history = ?11
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&form.surname)
        .bind(&form.first_name)
        .bind(&form.middle_initial)
        .bind(form.age)
        .bind(form.gender)
        .bind(age_group)
        .bind(&form.address)
        .bind(&form.contact)
        .bind(&form.email)
        .bind(&form.medical_history)
        .fetch_optional(&self.pool)
        .await?;

        patient.ok_or_else(|| DbError::not_found("Patient", id))
    }

    /// Patients registered on a given day.
    pub async fn count_registered_on(&self, date: NaiveDate) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM patients WHERE registration_date = ?1")
                .bind(date)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Patients registered today (dashboard counter).
    pub async fn count_patients_today(&self) -> DbResult<i64> {
        self.count_registered_on(Local::now().date_naive()).await
    }

    /// Counts per age group, `(kids, adults)`.
    pub async fn count_by_age_group(&self) -> DbResult<(i64, i64)> {
        let rows: Vec<(AgeGroup, i64)> =
            sqlx::query_as("SELECT age_group, COUNT(*) FROM patients GROUP BY age_group")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().fold((0, 0), |(kids, adults), (group, n)| match group {
            AgeGroup::Kids => (kids + n, adults),
            AgeGroup::Adult => (kids, adults + n),
        }))
    }

    // -------------------------------------------------------------------------
    // Archive
    // -------------------------------------------------------------------------

    /// Moves the patient to `archived_patients`.
    pub async fn archive_patient(&self, id: i64) -> DbResult<()> {
        self.archive_table().archive(id).await
    }

    /// Same as [`Self::archive_patient`]; patients are never hard-deleted.
    pub async fn delete_patient(&self, id: i64) -> DbResult<()> {
        self.archive_patient(id).await
    }

    pub async fn restore(&self, id: i64) -> DbResult<Patient> {
        self.archive_table().restore(id).await
    }

    pub async fn list_archived(&self) -> DbResult<Vec<Archived<Patient>>> {
        self.archive_table().list_archived().await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
