//! # Prescription Repository
//!
//! Eyeglass prescriptions. Each is valid for a year from issue; the
//! expiring list warns about those running out within the next month.

use chrono::{Duration, Local, NaiveDate};
use sqlx::SqlitePool;
use tracing::{debug, info};

use clinic_core::validation::optional_text;
use clinic_core::{
    LensPower, NewPrescription, Prescription, PrescriptionView, ValidationError,
    PRESCRIPTION_EXPIRY_WARNING_DAYS, PRESCRIPTION_VALIDITY_DAYS,
};

use crate::error::{DbError, DbResult};
use crate::repository::patient_name_sql;

const SELECT_VIEW: &str = concat!(
    "SELECT rx.*, ",
    patient_name_sql!("p"),
    " AS patient_name, d.name AS doctor_name, p.contact AS contact ",
    "FROM prescriptions rx ",
    "JOIN patients p ON p.id = rx.patient_id ",
    "JOIN doctors d ON d.id = rx.doctor_id "
);

#[derive(Debug, Clone)]
pub struct PrescriptionRepository {
    pool: SqlitePool,
}

impl PrescriptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PrescriptionRepository { pool }
    }

    /// Issues a prescription dated today, expiring a year later.
    pub async fn create_prescription(&self, form: NewPrescription) -> DbResult<Prescription> {
        require_people(form.patient_id, form.doctor_id)?;

        let issued = Local::now().date_naive();
        let expiry = expiry_for(issued);
        let right = trim_lens(form.right);
        let left = trim_lens(form.left);

        debug!(patient_id = form.patient_id, doctor_id = form.doctor_id, %expiry, "Issuing prescription");

        let prescription = sqlx::query_as::<_, Prescription>(
            r#"
            INSERT INTO prescriptions (
                patient_id, doctor_id, appointment_id, issued_date, expiry_date,
                od_sphere, od_cylinder, od_axis, od_add,
                os_sphere, os_cylinder, os_axis, os_add, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            RETURNING *
            "#,
        )
        .bind(form.patient_id)
        .bind(form.doctor_id)
        .bind(form.appointment_id)
        .bind(issued)
        .bind(expiry)
        .bind(&right.sphere)
        .bind(&right.cylinder)
        .bind(&right.axis)
        .bind(&right.add)
        .bind(&left.sphere)
        .bind(&left.cylinder)
        .bind(&left.axis)
        .bind(&left.add)
        .bind(optional_text(form.notes))
        .fetch_one(&self.pool)
        .await?;

        info!(id = prescription.id, "Prescription issued");
        Ok(prescription)
    }

    /// A patient's prescriptions, most recent first.
    pub async fn get_patient_prescriptions(&self, patient_id: i64) -> DbResult<Vec<PrescriptionView>> {
        let sql = format!("{SELECT_VIEW} WHERE rx.patient_id = ?1 ORDER BY rx.issued_date DESC, rx.id DESC");
        let rows = sqlx::query_as::<_, PrescriptionView>(&sql)
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// The most recent prescription that hasn't expired.
    pub async fn get_latest_prescription(&self, patient_id: i64) -> DbResult<Option<Prescription>> {
        let prescription = sqlx::query_as::<_, Prescription>(
            r#"
            SELECT * FROM prescriptions
            WHERE patient_id = ?1 AND expiry_date >= ?2
            ORDER BY issued_date DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(patient_id)
        .bind(Local::now().date_naive())
        .fetch_optional(&self.pool)
        .await?;
        Ok(prescription)
    }

    pub async fn get_all_prescriptions(&self) -> DbResult<Vec<PrescriptionView>> {
        let sql = format!("{SELECT_VIEW} ORDER BY rx.issued_date DESC, rx.id DESC");
        let rows = sqlx::query_as::<_, PrescriptionView>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_prescription(&self, id: i64) -> DbResult<Option<Prescription>> {
        let prescription = sqlx::query_as::<_, Prescription>("SELECT * FROM prescriptions WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(prescription)
    }

    /// Replaces the lens values and notes. Issue and expiry dates are kept.
    pub async fn update_prescription(
        &self,
        id: i64,
        right: LensPower,
        left: LensPower,
        notes: Option<String>,
    ) -> DbResult<Prescription> {
        let right = trim_lens(right);
        let left = trim_lens(left);

        let prescription = sqlx::query_as::<_, Prescription>(
            r#"
            UPDATE prescriptions SET
                od_sphere = ?2, od_cylinder = ?3, od_axis = ?4, od_add = ?5,
                os_sphere = ?6, os_cylinder = ?7, os_axis = ?8, os_add = ?9,
                notes = ?10
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&right.sphere)
        .bind(&right.cylinder)
        .bind(&right.axis)
        .bind(&right.add)
        .bind(&left.sphere)
        .bind(&left.cylinder)
        .bind(&left.axis)
        .bind(&left.add)
        .bind(optional_text(notes))
        .fetch_optional(&self.pool)
        .await?;

        prescription.ok_or_else(|| DbError::not_found("Prescription", id))
    }

    pub async fn delete_prescription(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM prescriptions WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Prescription", id));
        }
        info!(id, "Prescription deleted");
        Ok(())
    }

    /// Prescriptions expiring between today and 30 days from now.
    pub async fn check_expiring_prescriptions(&self) -> DbResult<Vec<PrescriptionView>> {
        self.expiring_between(Local::now().date_naive()).await
    }

    /// Prescriptions with `today <= expiry <= today + 30 days`, soonest first.
    pub async fn expiring_between(&self, today: NaiveDate) -> DbResult<Vec<PrescriptionView>> {
        let until = today + Duration::days(PRESCRIPTION_EXPIRY_WARNING_DAYS);
        let sql = format!(
            "{SELECT_VIEW} WHERE rx.expiry_date BETWEEN ?1 AND ?2 ORDER BY rx.expiry_date, rx.id"
        );
        let rows = sqlx::query_as::<_, PrescriptionView>(&sql)
            .bind(today)
            .bind(until)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}

fn expiry_for(issued: NaiveDate) -> NaiveDate {
    issued + Duration::days(PRESCRIPTION_VALIDITY_DAYS)
}

fn trim_lens(lens: LensPower) -> LensPower {
    LensPower {
        sphere: optional_text(lens.sphere),
        cylinder: optional_text(lens.cylinder),
        axis: optional_text(lens.axis),
        add: optional_text(lens.add),
    }
}

/// Patient and doctor ids come from pickers; 0 means nothing was picked.
pub(crate) fn require_people(patient_id: i64, doctor_id: i64) -> Result<(), ValidationError> {
    if patient_id <= 0 {
        return Err(ValidationError::required("patient"));
    }
    if doctor_id <= 0 {
        return Err(ValidationError::required("doctor"));
    }
    Ok(())
}
