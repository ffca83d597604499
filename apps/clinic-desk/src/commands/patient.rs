//! # Patient Commands
//!
//! The registration screen: register, search, edit and archive patients,
//! plus the combined history shown when a patient is opened.
//!
//! ## Registration Flow
//! ```text
//! PatientForm (raw text)
//!      │  age "12" → Some(12), gender "female" → Female
//!      ▼
//! NewPatient ──► PatientRepository::add_patient
//!                  ├── required fields, phone, email
//!                  ├── age group derived from age (< 18 → Kids)
//!                  └── registration date = today
//! ```

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use clinic_core::validation::parse_age;
use clinic_core::{
    AgeGroup, Appointment, AppointmentView, Bill, Gender, InvoiceView, MedicalRecordView,
    NewPatient, Patient, PrescriptionView, ValidationError,
};
use clinic_db::Archived;

use super::parse_choice;
use crate::error::ApiError;
use crate::state::DbState;

/// Registration form as typed at the desk.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientForm {
    pub surname: String,
    pub first_name: String,
    pub middle_initial: Option<String>,
    /// Blank when unknown
    pub age: String,
    pub gender: String,
    /// Overrides the age-derived group when given
    pub age_group: Option<String>,
    pub address: Option<String>,
    pub contact: String,
    pub email: Option<String>,
    pub medical_history: Option<String>,
}

impl PatientForm {
    fn into_new_patient(self) -> Result<NewPatient, ValidationError> {
        Ok(NewPatient {
            surname: self.surname,
            first_name: self.first_name,
            middle_initial: self.middle_initial,
            age: parse_age(&self.age)?,
            gender: parse_choice::<Gender>(Some(&self.gender))?,
            age_group: parse_choice::<AgeGroup>(self.age_group.as_deref())?,
            address: self.address,
            contact: self.contact,
            email: self.email,
            medical_history: self.medical_history,
        })
    }
}

pub async fn register_patient(db: &DbState, form: PatientForm) -> Result<Patient, ApiError> {
    let form = form.into_new_patient()?;
    let patient = db.inner().patients().add_patient(form).await?;

    info!(id = patient.id, age_group = %patient.age_group, "Patient registered");
    Ok(patient)
}

/// Lists live patients, newest first, optionally filtered by name or contact.
pub async fn list_patients(db: &DbState, search: Option<&str>) -> Result<Vec<Patient>, ApiError> {
    let patients = db.inner().patients();
    let found = match search.map(str::trim).filter(|q| !q.is_empty()) {
        Some(query) => patients.search_patients(query).await?,
        None => patients.list_patients().await?,
    };

    debug!(count = found.len(), ?search, "list_patients");
    Ok(found)
}

pub async fn get_patient(db: &DbState, id: i64) -> Result<Patient, ApiError> {
    db.inner()
        .patients()
        .get_patient(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Patient", id))
}

pub async fn update_patient(db: &DbState, id: i64, form: PatientForm) -> Result<Patient, ApiError> {
    let form = form.into_new_patient()?;
    Ok(db.inner().patients().update_patient(id, form).await?)
}

/// Everything on file for one patient.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientHistory {
    pub patient: Patient,
    /// Live appointments, latest first
    pub appointments: Vec<AppointmentView>,
    /// Completed or archived appointments
    pub past_appointments: Vec<Archived<Appointment>>,
    pub prescriptions: Vec<PrescriptionView>,
    pub records: Vec<MedicalRecordView>,
    pub bills: Vec<Bill>,
    pub invoices: Vec<InvoiceView>,
}

pub async fn patient_history(db: &DbState, id: i64) -> Result<PatientHistory, ApiError> {
    let patient = get_patient(db, id).await?;
    let db = db.inner();

    let history = PatientHistory {
        appointments: db.appointments().get_patient_appointments(id).await?,
        past_appointments: db.appointments().get_patient_archived(id).await?,
        prescriptions: db.prescriptions().get_patient_prescriptions(id).await?,
        records: db.medical_records().get_patient_records(id).await?,
        bills: db.billing().get_patient_bills(id).await?,
        invoices: db.invoices().get_invoices_by_patient(id).await?,
        patient,
    };

    debug!(
        id,
        appointments = history.appointments.len(),
        past = history.past_appointments.len(),
        prescriptions = history.prescriptions.len(),
        records = history.records.len(),
        bills = history.bills.len(),
        invoices = history.invoices.len(),
        "patient_history"
    );
    Ok(history)
}

/// Moves a patient to the archive.
///
/// Patients with bills or appointments still on file are refused with
/// `IN_USE`.
pub async fn archive_patient(db: &DbState, id: i64) -> Result<(), ApiError> {
    db.inner().patients().archive_patient(id).await?;
    info!(id, "Patient archived");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{db, doctor_id, patient_form};
    use crate::error::ErrorCode;
    use chrono::{NaiveDate, NaiveTime};
    use clinic_core::{LensPower, Money, NewMedicalRecord, NewPrescription, PaymentMethod};

    #[tokio::test]
    async fn test_register_derives_age_group() {
        let db = db().await;

        let kid = register_patient(&db, patient_form("Flores", "9")).await.unwrap();
        assert_eq!(kid.age_group, AgeGroup::Kids);
        assert_eq!(kid.gender, Gender::Female);

        let adult = register_patient(&db, patient_form("Santos", "18")).await.unwrap();
        assert_eq!(adult.age_group, AgeGroup::Adult);

        let unknown = register_patient(&db, patient_form("Lim", "  ")).await.unwrap();
        assert_eq!(unknown.age, None);
        assert_eq!(unknown.age_group, AgeGroup::Kids);
    }

    #[tokio::test]
    async fn test_register_rejects_bad_input() {
        let db = db().await;

        let err = register_patient(&db, patient_form("Santos", "abc")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let mut form = patient_form("Santos", "30");
        form.gender = String::new();
        let err = register_patient(&db, form).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(err.message.contains("gender"));

        let mut form = patient_form("Santos", "30");
        form.gender = "unknown".to_string();
        let err = register_patient(&db, form).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_search_and_archive() {
        let db = db().await;
        let santos = register_patient(&db, patient_form("Santos", "34")).await.unwrap();
        register_patient(&db, patient_form("Lim", "27")).await.unwrap();

        let found = list_patients(&db, Some("sant")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, santos.id);
        assert_eq!(list_patients(&db, Some("  ")).await.unwrap().len(), 2);

        archive_patient(&db, santos.id).await.unwrap();
        assert_eq!(list_patients(&db, None).await.unwrap().len(), 1);

        let err = get_patient(&db, santos.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_history_collects_everything_for_one_patient() {
        let db = db().await;
        let santos = register_patient(&db, patient_form("Santos", "34")).await.unwrap();
        let lim = register_patient(&db, patient_form("Lim", "27")).await.unwrap();
        let doctor = doctor_id(&db).await;
        let clinic = db.inner();

        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let visit = clinic
            .appointments()
            .schedule(santos.id, doctor, date, NaiveTime::from_hms_opt(9, 0, 0).unwrap())
            .await
            .unwrap();
        clinic.appointments().mark_as_done(visit.id).await.unwrap();
        clinic
            .appointments()
            .schedule(santos.id, doctor, date, NaiveTime::from_hms_opt(15, 0, 0).unwrap())
            .await
            .unwrap();
        clinic
            .appointments()
            .schedule(lim.id, doctor, date, NaiveTime::from_hms_opt(10, 0, 0).unwrap())
            .await
            .unwrap();

        clinic
            .prescriptions()
            .create_prescription(NewPrescription {
                patient_id: santos.id,
                doctor_id: doctor,
                appointment_id: None,
                right: LensPower::default(),
                left: LensPower::default(),
                notes: None,
            })
            .await
            .unwrap();
        clinic
            .medical_records()
            .add_record(NewMedicalRecord {
                patient_id: santos.id,
                doctor_id: doctor,
                diagnosis: "Myopia".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        clinic
            .billing()
            .create_bill(santos.id, Money::from_cents(150_000), PaymentMethod::Cash)
            .await
            .unwrap();

        let history = patient_history(&db, santos.id).await.unwrap();
        assert_eq!(history.patient, santos);
        assert_eq!(history.appointments.len(), 1);
        assert_eq!(history.past_appointments.len(), 1);
        assert_eq!(history.past_appointments[0].record.id, visit.id);
        assert_eq!(history.prescriptions.len(), 1);
        assert_eq!(history.records.len(), 1);
        assert_eq!(history.bills.len(), 1);
        assert!(history.invoices.is_empty());

        let other = patient_history(&db, lim.id).await.unwrap();
        assert_eq!(other.appointments.len(), 1);
        assert!(other.prescriptions.is_empty() && other.bills.is_empty());

        let err = patient_history(&db, 999).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
