//! # Doctor Commands

use tracing::info;

use clinic_core::{Doctor, NewDoctor};

use crate::error::ApiError;
use crate::state::DbState;

pub async fn add_doctor(db: &DbState, form: NewDoctor) -> Result<Doctor, ApiError> {
    let doctor = db.inner().doctors().add_doctor(form).await?;
    info!(id = doctor.id, name = %doctor.name, "Doctor added");
    Ok(doctor)
}

pub async fn list_doctors(db: &DbState) -> Result<Vec<Doctor>, ApiError> {
    Ok(db.inner().doctors().list_doctors().await?)
}

pub async fn update_doctor(db: &DbState, id: i64, form: NewDoctor) -> Result<Doctor, ApiError> {
    Ok(db.inner().doctors().update_doctor(id, form).await?)
}

pub async fn archive_doctor(db: &DbState, id: i64) -> Result<(), ApiError> {
    db.inner().doctors().archive_doctor(id).await?;
    info!(id, "Doctor archived");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::db;
    use crate::error::ErrorCode;

    fn form(license: &str) -> NewDoctor {
        NewDoctor {
            surname: "Cruz".to_string(),
            first_name: "Jose".to_string(),
            middle_initial: Some("P".to_string()),
            license_number: license.to_string(),
            specialization: "Ophthalmology".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_formats_name() {
        let db = db().await;
        let doctor = add_doctor(&db, form("PRC-0099887")).await.unwrap();
        assert_eq!(doctor.name, "Cruz, Jose P.");

        let mut renamed = form("PRC-0099887");
        renamed.middle_initial = None;
        let doctor = update_doctor(&db, doctor.id, renamed).await.unwrap();
        assert_eq!(doctor.name, "Cruz, Jose");
    }

    #[tokio::test]
    async fn test_missing_license_and_unknown_doctor() {
        let db = db().await;
        let err = add_doctor(&db, form(" ")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = archive_doctor(&db, 99).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
