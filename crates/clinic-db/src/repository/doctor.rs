//! # Doctor Repository
//!
//! Doctor records. The stored `name` column is the formatted name used on
//! appointment lists, prescriptions and records.

use sqlx::SqlitePool;
use tracing::{debug, info};

use clinic_core::validation::validate_new_doctor;
use clinic_core::{format_doctor_name, Doctor, NewDoctor};

use crate::error::{DbError, DbResult};
use crate::repository::archive::{Archivable, ArchiveSpec, ArchiveTable, Archived};

impl Archivable for Doctor {
    const SPEC: ArchiveSpec = ArchiveSpec {
        entity: "Doctor",
        table: "doctors",
        archive_table: "archived_doctors",
        id_column: "id",
    };
}

#[derive(Debug, Clone)]
pub struct DoctorRepository {
    pool: SqlitePool,
}

impl DoctorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DoctorRepository { pool }
    }

    pub fn archive_table(&self) -> ArchiveTable<Doctor> {
        ArchiveTable::new(self.pool.clone())
    }

    /// Adds a doctor, storing the formatted `"Surname, FirstName M."` name.
    pub async fn add_doctor(&self, form: NewDoctor) -> DbResult<Doctor> {
        let form = validate_new_doctor(form)?;
        let name = format_doctor_name(&form.surname, &form.first_name, form.middle_initial.as_deref());

        debug!(name = %name, license = %form.license_number, "Adding doctor");

        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            INSERT INTO doctors (
                surname, first_name, middle_initial, name,
                license_number, specialization, contact, schedule
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            RETURNING *
            "#,
        )
        .bind(&form.surname)
        .bind(&form.first_name)
        .bind(&form.middle_initial)
        .bind(&name)
        .bind(&form.license_number)
        .bind(&form.specialization)
        .bind(&form.contact)
        .bind(&form.schedule)
        .fetch_one(&self.pool)
        .await?;

        info!(id = doctor.id, "Doctor added");
        Ok(doctor)
    }

    /// All live doctors, alphabetical.
    pub async fn list_doctors(&self) -> DbResult<Vec<Doctor>> {
        let doctors = sqlx::query_as::<_, Doctor>("SELECT * FROM doctors ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(doctors)
    }

    pub async fn get_doctor(&self, id: i64) -> DbResult<Option<Doctor>> {
        let doctor = sqlx::query_as::<_, Doctor>("SELECT * FROM doctors WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(doctor)
    }

    /// Replaces a doctor's details and reformats the stored name.
    pub async fn update_doctor(&self, id: i64, form: NewDoctor) -> DbResult<Doctor> {
        let form = validate_new_doctor(form)?;
        let name = format_doctor_name(&form.surname, &form.first_name, form.middle_initial.as_deref());

        let doctor = sqlx::query_as::<_, Doctor>(
            r#"
            UPDATE doctors SET
                surname = ?2, first_name = ?3, middle_initial = ?4, name = ?5,
                license_number = ?6, specialization = ?7, contact = ?8, schedule = ?9
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&form.surname)
        .bind(&form.first_name)
        .bind(&form.middle_initial)
        .bind(&name)
        .bind(&form.license_number)
        .bind(&form.specialization)
        .bind(&form.contact)
        .bind(&form.schedule)
        .fetch_optional(&self.pool)
        .await?;

        doctor.ok_or_else(|| DbError::not_found("Doctor", id))
    }

    pub async fn count_doctors(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM doctors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn archive_doctor(&self, id: i64) -> DbResult<()> {
        self.archive_table().archive(id).await
    }

    /// Same as [`Self::archive_doctor`].
    pub async fn delete_doctor(&self, id: i64) -> DbResult<()> {
        self.archive_doctor(id).await
    }

    pub async fn restore(&self, id: i64) -> DbResult<Doctor> {
        self.archive_table().restore(id).await
    }

    pub async fn list_archived(&self) -> DbResult<Vec<Archived<Doctor>>> {
        self.archive_table().list_archived().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    fn form(surname: &str, mi: Option<&str>) -> NewDoctor {
        NewDoctor {
            surname: surname.to_string(),
            first_name: "Ana".to_string(),
            middle_initial: mi.map(str::to_string),
            license_number: "PRC-0012345".to_string(),
            specialization: "Optometry".to_string(),
            contact: Some("0918 222 3344".to_string()),
            schedule: Some("Mon-Fri 9:00-17:00".to_string()),
        }
    }

    #[tokio::test]
    async fn test_add_doctor_formats_name() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.doctors();

        let with_mi = repo.add_doctor(form("Reyes", Some("B"))).await.unwrap();
        let without = repo.add_doctor(form("Cruz", None)).await.unwrap();

        assert_eq!(with_mi.name, "Reyes, Ana B.");
        assert_eq!(without.name, "Cruz, Ana");

        let names: Vec<String> = repo.list_doctors().await.unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Cruz, Ana", "Reyes, Ana B."]);
        assert_eq!(repo.count_doctors().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_add_doctor_requires_license() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut bad = form("Reyes", None);
        bad.license_number = "  ".to_string();

        assert!(db.doctors().add_doctor(bad).await.is_err());
    }

    #[tokio::test]
    async fn test_update_doctor() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.doctors();
        let doctor = repo.add_doctor(form("Reyes", None)).await.unwrap();

        let updated = repo.update_doctor(doctor.id, form("Reyes-Lim", Some("C"))).await.unwrap();
        assert_eq!(updated.name, "Reyes-Lim, Ana C.");
        assert!(repo.update_doctor(404, form("X", None)).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_archive_and_restore_doctor() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.doctors();
        let doctor = repo.add_doctor(form("Reyes", Some("B"))).await.unwrap();

        repo.archive_doctor(doctor.id).await.unwrap();
        assert!(repo.list_doctors().await.unwrap().is_empty());
        assert_eq!(repo.list_archived().await.unwrap()[0].record, doctor);

        assert_eq!(repo.restore(doctor.id).await.unwrap(), doctor);
    }
}
