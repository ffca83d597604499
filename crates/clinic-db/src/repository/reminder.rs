//! # Reminder Repository
//!
//! Appointment reminders. Deleting an appointment's live row (archive or
//! done) cascades to its reminders.

use chrono::{Local, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use clinic_core::{NewReminder, PendingReminder, Reminder, ReminderStatus};

use crate::error::{DbError, DbResult};
use crate::repository::patient_name_sql;

#[derive(Debug, Clone)]
pub struct ReminderRepository {
    pool: SqlitePool,
}

impl ReminderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReminderRepository { pool }
    }

    /// Creates a `Pending` reminder; contact method defaults to SMS.
    pub async fn create_reminder(&self, form: NewReminder) -> DbResult<Reminder> {
        let method = form.contact_method.unwrap_or_default();

        debug!(appointment_id = form.appointment_id, method = %method, "Creating reminder");

        let reminder = sqlx::query_as::<_, Reminder>(
            r#"
            INSERT INTO appointment_reminders (
                appointment_id, patient_id, reminder_date, reminder_time, contact_method, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING *
            "#,
        )
        .bind(form.appointment_id)
        .bind(form.patient_id)
        .bind(form.reminder_date)
        .bind(form.reminder_time)
        .bind(method)
        .bind(ReminderStatus::Pending)
        .fetch_one(&self.pool)
        .await?;

        info!(id = reminder.id, "Reminder created");
        Ok(reminder)
    }

    /// Pending reminders due today or earlier.
    pub async fn get_pending_reminders(&self) -> DbResult<Vec<PendingReminder>> {
        self.pending_as_of(Local::now().date_naive()).await
    }

    pub async fn pending_as_of(&self, day: NaiveDate) -> DbResult<Vec<PendingReminder>> {
        let rows = sqlx::query_as::<_, PendingReminder>(concat!(
            "SELECT r.*, ",
            patient_name_sql!("p"),
            " AS patient_name, p.contact AS contact, p.email AS email, ",
            "a.appointment_date AS appointment_date, a.appointment_time AS appointment_time ",
            "FROM appointment_reminders r ",
            "JOIN patients p ON p.id = r.patient_id ",
            "JOIN appointments a ON a.id = r.appointment_id ",
            "WHERE r.status = ?1 AND r.reminder_date <= ?2 ",
            "ORDER BY r.reminder_date, r.reminder_time, r.id"
        ))
        .bind(ReminderStatus::Pending)
        .bind(day)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn count_pending(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM appointment_reminders WHERE status = ?1")
                .bind(ReminderStatus::Pending)
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Marks a reminder `Sent`, stamped now.
    pub async fn mark_sent(&self, id: i64) -> DbResult<Reminder> {
        let reminder = sqlx::query_as::<_, Reminder>(
            "UPDATE appointment_reminders SET status = ?2, sent_at = ?3 WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .bind(ReminderStatus::Sent)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        let reminder = reminder.ok_or_else(|| DbError::not_found("Reminder", id))?;
        info!(id, "Reminder sent");
        Ok(reminder)
    }

    pub async fn get_appointment_reminders(&self, appointment_id: i64) -> DbResult<Vec<Reminder>> {
        let reminders = sqlx::query_as::<_, Reminder>(
            "SELECT * FROM appointment_reminders WHERE appointment_id = ?1 ORDER BY reminder_date, id",
        )
        .bind(appointment_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reminders)
    }

    pub async fn delete_reminder(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM appointment_reminders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Reminder", id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Duration, NaiveTime};
    use clinic_core::{Appointment, ContactMethod, Gender, NewDoctor, NewPatient};

    async fn setup() -> (Database, Appointment) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let patient = db
            .patients()
            .add_patient(NewPatient {
                surname: "Flores".to_string(),
                first_name: "Mia".to_string(),
                middle_initial: Some("C".to_string()),
                age: Some(12),
                gender: Some(Gender::Female),
                contact: "0917 000 1111".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let doctor = db
            .doctors()
            .add_doctor(NewDoctor {
                surname: "Reyes".to_string(),
                first_name: "Ana".to_string(),
                license_number: "PRC-0012345".to_string(),
                specialization: "Pediatric Optometry".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let date = Local::now().date_naive() + Duration::days(2);
        let appt = db
            .appointments()
            .schedule(patient.id, doctor.id, date, NaiveTime::from_hms_opt(14, 0, 0).unwrap())
            .await
            .unwrap();
        (db, appt)
    }

    fn reminder_for(appt: &Appointment, days_before: i64) -> NewReminder {
        NewReminder {
            appointment_id: appt.id,
            patient_id: appt.patient_id,
            reminder_date: appt.appointment_date - Duration::days(days_before),
            reminder_time: None,
            contact_method: None,
        }
    }

    #[tokio::test]
    async fn test_create_defaults_to_sms_pending() {
        let (db, appt) = setup().await;
        let reminder = db.reminders().create_reminder(reminder_for(&appt, 1)).await.unwrap();

        assert_eq!(reminder.contact_method, ContactMethod::Sms);
        assert_eq!(reminder.status, ReminderStatus::Pending);
        assert_eq!(reminder.sent_at, None);
    }

    #[tokio::test]
    async fn test_pending_only_when_due() {
        let (db, appt) = setup().await;
        let repo = db.reminders();

        let due = repo.create_reminder(reminder_for(&appt, 2)).await.unwrap();
        repo.create_reminder(reminder_for(&appt, 1)).await.unwrap();

        let pending = repo.get_pending_reminders().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].reminder.id, due.id);
        assert_eq!(pending[0].patient_name, "Flores, Mia C");
        assert_eq!(pending[0].appointment_time, appt.appointment_time);

        repo.mark_sent(due.id).await.unwrap();
        assert!(repo.get_pending_reminders().await.unwrap().is_empty());
        assert_eq!(repo.count_pending().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_mark_sent_stamps_time() {
        let (db, appt) = setup().await;
        let repo = db.reminders();
        let reminder = repo.create_reminder(reminder_for(&appt, 0)).await.unwrap();

        let sent = repo.mark_sent(reminder.id).await.unwrap();
        assert_eq!(sent.status, ReminderStatus::Sent);
        assert!(sent.sent_at.is_some());
        assert!(repo.mark_sent(999).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_reminders_follow_their_appointment() {
        let (db, appt) = setup().await;
        let repo = db.reminders();
        let reminder = repo.create_reminder(reminder_for(&appt, 1)).await.unwrap();
        assert_eq!(repo.get_appointment_reminders(appt.id).await.unwrap(), vec![reminder.clone()]);

        db.appointments().mark_as_done(appt.id).await.unwrap();
        assert!(repo.get_appointment_reminders(appt.id).await.unwrap().is_empty());
        assert!(repo.delete_reminder(reminder.id).await.unwrap_err().is_not_found());
    }
}
