//! # Medical Record Repository
//!
//! Visit findings with a follow-up interval. A record is due for follow-up
//! once `recorded_date + followup_days` has arrived.

use chrono::{Local, NaiveDate};
use sqlx::SqlitePool;
use tracing::{debug, info};

use clinic_core::validation::{optional_text, validate_followup_days, validate_required};
use clinic_core::{
    DueFollowup, MedicalRecord, MedicalRecordView, NewMedicalRecord, DEFAULT_FOLLOWUP_DAYS,
    DEFAULT_SEVERITY,
};

use crate::error::{DbError, DbResult};
use crate::repository::patient_name_sql;
use crate::repository::prescription::require_people;

const SELECT_VIEW: &str = concat!(
    "SELECT mr.*, ",
    patient_name_sql!("p"),
    " AS patient_name, d.name AS doctor_name ",
    "FROM medical_records mr ",
    "JOIN patients p ON p.id = mr.patient_id ",
    "JOIN doctors d ON d.id = mr.doctor_id "
);

/// Form values after defaults and trimming.
struct RecordFields {
    diagnosis: String,
    severity: String,
    clinical_notes: Option<String>,
    recommendations: Option<String>,
    followup_days: i64,
}

impl RecordFields {
    fn from_form(form: &NewMedicalRecord) -> DbResult<Self> {
        require_people(form.patient_id, form.doctor_id)?;

        Ok(RecordFields {
            diagnosis: validate_required(&form.diagnosis, "diagnosis")?,
            severity: optional_text(form.severity.clone()).unwrap_or_else(|| DEFAULT_SEVERITY.to_string()),
            clinical_notes: optional_text(form.clinical_notes.clone()),
            recommendations: optional_text(form.recommendations.clone()),
            followup_days: validate_followup_days(form.followup_days.unwrap_or(DEFAULT_FOLLOWUP_DAYS))?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct MedicalRecordRepository {
    pool: SqlitePool,
}

impl MedicalRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MedicalRecordRepository { pool }
    }

    /// Records a visit dated today. Severity defaults to `Normal`, follow-up
    /// to 90 days.
    pub async fn add_record(&self, form: NewMedicalRecord) -> DbResult<MedicalRecord> {
        let fields = RecordFields::from_form(&form)?;

        debug!(patient_id = form.patient_id, diagnosis = %fields.diagnosis, "Adding medical record");

        let record = sqlx::query_as::<_, MedicalRecord>(
            r#"
            INSERT INTO medical_records (
                patient_id, doctor_id, appointment_id, diagnosis, severity,
                clinical_notes, recommendations, followup_days, recorded_date
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING *
            "#,
        )
        .bind(form.patient_id)
        .bind(form.doctor_id)
        .bind(form.appointment_id)
        .bind(&fields.diagnosis)
        .bind(&fields.severity)
        .bind(&fields.clinical_notes)
        .bind(&fields.recommendations)
        .bind(fields.followup_days)
        .bind(Local::now().date_naive())
        .fetch_one(&self.pool)
        .await?;

        info!(id = record.id, "Medical record added");
        Ok(record)
    }

    /// A patient's records with the doctor's name, most recent first.
    pub async fn get_patient_records(&self, patient_id: i64) -> DbResult<Vec<MedicalRecordView>> {
        let sql = format!("{SELECT_VIEW} WHERE mr.patient_id = ?1 ORDER BY mr.recorded_date DESC, mr.id DESC");
        let rows = sqlx::query_as::<_, MedicalRecordView>(&sql)
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_all_records(&self) -> DbResult<Vec<MedicalRecordView>> {
        let sql = format!("{SELECT_VIEW} ORDER BY mr.recorded_date DESC, mr.id DESC");
        let rows = sqlx::query_as::<_, MedicalRecordView>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Replaces the findings. Patient, doctor and recorded date are kept.
    pub async fn update_record(&self, id: i64, form: NewMedicalRecord) -> DbResult<MedicalRecord> {
        let fields = RecordFields::from_form(&form)?;

        let record = sqlx::query_as::<_, MedicalRecord>(
            r#"
            UPDATE medical_records SET
                appointment_id = ?2, diagnosis = ?3, severity = ?4,
                clinical_notes = ?5, recommendations = ?6, followup_days = ?7
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(form.appointment_id)
        .bind(&fields.diagnosis)
        .bind(&fields.severity)
        .bind(&fields.clinical_notes)
        .bind(&fields.recommendations)
        .bind(fields.followup_days)
        .fetch_optional(&self.pool)
        .await?;

        record.ok_or_else(|| DbError::not_found("Medical record", id))
    }

    pub async fn delete_record(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM medical_records WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Medical record", id));
        }
        info!(id, "Medical record deleted");
        Ok(())
    }

    /// Records whose follow-up is due today or earlier.
    pub async fn check_due_followups(&self) -> DbResult<Vec<DueFollowup>> {
        self.followups_due_on(Local::now().date_naive()).await
    }

    /// Records with `recorded_date + followup_days <= day`, oldest due first.
    pub async fn followups_due_on(&self, day: NaiveDate) -> DbResult<Vec<DueFollowup>> {
        let rows = sqlx::query_as::<_, DueFollowup>(concat!(
            "SELECT mr.*, ",
            patient_name_sql!("p"),
            " AS patient_name, p.contact AS contact, p.email AS email ",
            "FROM medical_records mr ",
            "JOIN patients p ON p.id = mr.patient_id ",
            "WHERE date(mr.recorded_date, '+' || mr.followup_days || ' days') <= ?1 ",
            "ORDER BY date(mr.recorded_date, '+' || mr.followup_days || ' days'), mr.id"
        ))
        .bind(day)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
