//! # Clinical Commands
//!
//! Eye prescriptions, medical records and the procedure price list.
//!
//! ## Renewal and Follow-up Windows
//! ```text
//! prescription issued ─────────────── 365 days ───────────────► expiry
//!                                          │◄── 30 days ──►│
//!                                          expiring_prescriptions()
//!
//! medical record ──── followup_days (default 90) ────► due_followups()
//! ```

use serde::{Deserialize, Serialize};
use tracing::info;

use clinic_core::{
    DueFollowup, LensPower, MedicalRecord, MedicalRecordView, Money, NewMedicalRecord,
    NewPrescription, NewProcedure, Prescription, PrescriptionView, Procedure,
};

use crate::error::ApiError;
use crate::state::DbState;

// =============================================================================
// Prescriptions
// =============================================================================

/// Prescription form. `od` is the right eye, `os` the left.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionForm {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub appointment_id: Option<i64>,
    pub od: LensPower,
    pub os: LensPower,
    pub notes: Option<String>,
}

/// A patient's prescriptions and the one currently valid, if any.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionHistory {
    pub current: Option<Prescription>,
    pub history: Vec<PrescriptionView>,
}

pub async fn add_prescription(db: &DbState, form: PrescriptionForm) -> Result<Prescription, ApiError> {
    let prescription = db
        .inner()
        .prescriptions()
        .create_prescription(NewPrescription {
            patient_id: form.patient_id,
            doctor_id: form.doctor_id,
            appointment_id: form.appointment_id,
            right: form.od,
            left: form.os,
            notes: form.notes,
        })
        .await?;

    info!(
        id = prescription.id,
        expiry = %prescription.expiry_date,
        "Prescription issued"
    );
    Ok(prescription)
}

pub async fn list_prescriptions(db: &DbState) -> Result<Vec<PrescriptionView>, ApiError> {
    Ok(db.inner().prescriptions().get_all_prescriptions().await?)
}

pub async fn patient_prescriptions(db: &DbState, patient_id: i64) -> Result<PrescriptionHistory, ApiError> {
    let prescriptions = db.inner().prescriptions();
    Ok(PrescriptionHistory {
        current: prescriptions.get_latest_prescription(patient_id).await?,
        history: prescriptions.get_patient_prescriptions(patient_id).await?,
    })
}

/// Prescriptions that expire within the next 30 days.
pub async fn expiring_prescriptions(db: &DbState) -> Result<Vec<PrescriptionView>, ApiError> {
    Ok(db.inner().prescriptions().check_expiring_prescriptions().await?)
}

pub async fn delete_prescription(db: &DbState, id: i64) -> Result<(), ApiError> {
    Ok(db.inner().prescriptions().delete_prescription(id).await?)
}

// =============================================================================
// Medical Records
// =============================================================================

pub async fn add_record(db: &DbState, form: NewMedicalRecord) -> Result<MedicalRecord, ApiError> {
    let record = db.inner().medical_records().add_record(form).await?;
    info!(id = record.id, followup_due = %record.followup_due(), "Medical record added");
    Ok(record)
}

/// All records, or one patient's records when given.
pub async fn list_records(db: &DbState, patient_id: Option<i64>) -> Result<Vec<MedicalRecordView>, ApiError> {
    let records = db.inner().medical_records();
    match patient_id {
        Some(id) => Ok(records.get_patient_records(id).await?),
        None => Ok(records.get_all_records().await?),
    }
}

/// Patients whose follow-up date has arrived.
pub async fn due_followups(db: &DbState) -> Result<Vec<DueFollowup>, ApiError> {
    Ok(db.inner().medical_records().check_due_followups().await?)
}

// =============================================================================
// Procedures
// =============================================================================

pub async fn add_procedure(
    db: &DbState,
    name: &str,
    description: Option<String>,
    cost: &str,
) -> Result<Procedure, ApiError> {
    let form = NewProcedure {
        name: name.to_string(),
        description,
        cost: Money::parse(cost)?,
    };
    Ok(db.inner().procedures().add_procedure(form).await?)
}

pub async fn list_procedures(db: &DbState) -> Result<Vec<Procedure>, ApiError> {
    Ok(db.inner().procedures().get_all_procedures().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{db, doctor_id, patient};
    use crate::error::ErrorCode;
    use chrono::{Duration, Local};

    #[tokio::test]
    async fn test_prescription_history() {
        let db = db().await;
        let p = patient(&db, "Santos").await;
        let d = doctor_id(&db).await;

        let rx = add_prescription(
            &db,
            PrescriptionForm {
                patient_id: p.id,
                doctor_id: d,
                od: LensPower {
                    sphere: Some("-2.25".to_string()),
                    ..Default::default()
                },
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(rx.expiry_date, rx.issued_date + Duration::days(365));

        let history = patient_prescriptions(&db, p.id).await.unwrap();
        assert_eq!(history.current.map(|c| c.id), Some(rx.id));
        assert_eq!(history.history.len(), 1);
        assert!(expiring_prescriptions(&db).await.unwrap().is_empty());

        delete_prescription(&db, rx.id).await.unwrap();
        assert!(list_prescriptions(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_prescription_needs_people() {
        let db = db().await;
        let err = add_prescription(&db, PrescriptionForm::default()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_followup_due_immediately() {
        let db = db().await;
        let p = patient(&db, "Santos").await;
        let d = doctor_id(&db).await;

        let record = add_record(
            &db,
            NewMedicalRecord {
                patient_id: p.id,
                doctor_id: d,
                diagnosis: "Dry eye".to_string(),
                followup_days: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(record.severity, "Normal");
        assert_eq!(record.followup_due(), Local::now().date_naive());

        let due = due_followups(&db).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].patient_name, "Santos, Maria");
        assert_eq!(list_records(&db, Some(p.id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_procedures() {
        let db = db().await;
        add_procedure(&db, "Refraction", None, "500").await.unwrap();
        add_procedure(&db, "Eye Exam", Some("Comprehensive".to_string()), "1,200.00")
            .await
            .unwrap();

        let all = list_procedures(&db).await.unwrap();
        assert_eq!(all[0].name, "Eye Exam");
        assert_eq!(all[0].cost(), Money::from_cents(120_000));

        let err = add_procedure(&db, "Tonometry", None, "abc").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
