//! # Appointment Repository
//!
//! Booking, listing and completing appointments.
//!
//! ## Appointment Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  schedule(patient, doctor, date, time)                                 │
//! │     │  BEGIN                                                           │
//! │     ├─ patient / doctor exist?            no → NotFound                │
//! │     ├─ Scheduled row for doctor+date+time? yes → DuplicateBooking      │
//! │     └─ INSERT status = 'Scheduled'        COMMIT                       │
//! │                                                                         │
//! │  mark_as_done(id)                                                      │
//! │     │  BEGIN                                                           │
//! │     ├─ UPDATE status = 'Done'                                          │
//! │     └─ archive_in(id) → archived_appointments   COMMIT                 │
//! │                                                                         │
//! │  A Done slot is free: the same doctor/date/time can be booked again.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, NaiveTime};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use clinic_core::{Appointment, AppointmentStatus, AppointmentView, CoreError};

use crate::error::{DbError, DbResult};
use crate::repository::archive::{archive_in, Archivable, ArchiveSpec, ArchiveTable, Archived};
use crate::repository::patient_name_sql;

impl Archivable for Appointment {
    const SPEC: ArchiveSpec = ArchiveSpec {
        entity: "Appointment",
        table: "appointments",
        archive_table: "archived_appointments",
        id_column: "id",
    };
}

const SELECT_VIEW: &str = concat!(
    "SELECT a.*, ",
    patient_name_sql!("p"),
    " AS patient_name, d.name AS doctor_name ",
    "FROM appointments a ",
    "JOIN patients p ON p.id = a.patient_id ",
    "JOIN doctors d ON d.id = a.doctor_id "
);

#[derive(Debug, Clone)]
pub struct AppointmentRepository {
    pool: SqlitePool,
}

impl AppointmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AppointmentRepository { pool }
    }

    pub fn archive_table(&self) -> ArchiveTable<Appointment> {
        ArchiveTable::new(self.pool.clone())
    }

    /// Books an appointment.
    ///
    /// ## Errors
    /// - `NotFound` when the patient or doctor doesn't exist
    /// - `Domain(DuplicateBooking)` when the doctor already has a
    ///   `Scheduled` appointment at that date and time
    pub async fn schedule(
        &self,
        patient_id: i64,
        doctor_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> DbResult<Appointment> {
        debug!(patient_id, doctor_id, %date, %time, "Scheduling appointment");

        let mut tx = self.pool.begin().await?;

        ensure_exists(&mut *tx, "patients", "Patient", patient_id).await?;
        ensure_exists(&mut *tx, "doctors", "Doctor", doctor_id).await?;

        let taken: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM appointments
            WHERE doctor_id = ?1 AND appointment_date = ?2 AND appointment_time = ?3
              AND status = ?4
            "#,
        )
        .bind(doctor_id)
        .bind(date)
        .bind(time)
        .bind(AppointmentStatus::Scheduled)
        .fetch_one(&mut *tx)
        .await?;

        let duplicate = || {
            warn!(doctor_id, %date, %time, "Double booking rejected");
            DbError::Domain(CoreError::DuplicateBooking {
                doctor_id,
                date,
                time,
            })
        };

        if taken > 0 {
            return Err(duplicate());
        }

        let appointment = sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (patient_id, doctor_id, appointment_date, appointment_time, status)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING *
            "#,
        )
        .bind(patient_id)
        .bind(doctor_id)
        .bind(date)
        .bind(time)
        .bind(AppointmentStatus::Scheduled)
        .fetch_one(&mut *tx)
        .await
        .map_err(DbError::from)
        .map_err(|e| match e {
            // The partial unique index catches a booking that raced us.
            DbError::UniqueViolation { .. } => duplicate(),
            other => other,
        })?;

        tx.commit().await?;

        info!(id = appointment.id, "Appointment scheduled");
        Ok(appointment)
    }

    /// All live appointments with patient and doctor names, latest first.
    pub async fn list_appointments(&self) -> DbResult<Vec<AppointmentView>> {
        let sql = format!(
            "{SELECT_VIEW} ORDER BY a.appointment_date DESC, a.appointment_time DESC, a.id DESC"
        );
        let rows = sqlx::query_as::<_, AppointmentView>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// One patient's live appointments, latest first.
    pub async fn get_patient_appointments(&self, patient_id: i64) -> DbResult<Vec<AppointmentView>> {
        let sql = format!(
            "{SELECT_VIEW} WHERE a.patient_id = ?1 \
             ORDER BY a.appointment_date DESC, a.appointment_time DESC, a.id DESC"
        );
        let rows = sqlx::query_as::<_, AppointmentView>(&sql)
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// One patient's archived appointments (completed visits included).
    pub async fn get_patient_archived(&self, patient_id: i64) -> DbResult<Vec<Archived<Appointment>>> {
        let rows = sqlx::query_as::<_, Archived<Appointment>>(
            r#"
            SELECT * FROM archived_appointments
            WHERE patient_id = ?1
            ORDER BY appointment_date DESC, appointment_time DESC, id DESC
            "#,
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Scheduled appointments on one day, in time order.
    pub async fn list_scheduled_on(&self, date: NaiveDate) -> DbResult<Vec<AppointmentView>> {
        let sql = format!(
            "{SELECT_VIEW} WHERE a.appointment_date = ?1 AND a.status = ?2 ORDER BY a.appointment_time"
        );
        let rows = sqlx::query_as::<_, AppointmentView>(&sql)
            .bind(date)
            .bind(AppointmentStatus::Scheduled)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    pub async fn get_appointment(&self, id: i64) -> DbResult<Option<Appointment>> {
        let appointment =
            sqlx::query_as::<_, Appointment>("SELECT * FROM appointments WHERE id = ?1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(appointment)
    }

    /// Marks the appointment `Done` and archives it, in one transaction.
    pub async fn mark_as_done(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query("UPDATE appointments SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(AppointmentStatus::Done)
            .execute(&mut *tx)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(DbError::not_found("Appointment", id));
        }

        archive_in::<Appointment>(&mut *tx, id).await?;
        tx.commit().await?;

        info!(id, "Appointment done and archived");
        Ok(())
    }

    pub async fn count_scheduled(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM appointments WHERE status = ?1")
            .bind(AppointmentStatus::Scheduled)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn archive_appointment(&self, id: i64) -> DbResult<()> {
        self.archive_table().archive(id).await
    }

    /// Moves an archived appointment back into the live table.
    ///
    /// A `Scheduled` appointment whose slot has since been rebooked fails
    /// with `Domain(DuplicateBooking)`, same as `schedule`.
    pub async fn restore(&self, id: i64) -> DbResult<Appointment> {
        let archive = self.archive_table();

        match archive.restore(id).await {
            Err(DbError::UniqueViolation { field, value }) => {
                let Some(Archived { record, .. }) = archive.get_archived(id).await? else {
                    return Err(DbError::UniqueViolation { field, value });
                };
                if record.status != AppointmentStatus::Scheduled {
                    return Err(DbError::UniqueViolation { field, value });
                }

                warn!(
                    id,
                    doctor_id = record.doctor_id,
                    date = %record.appointment_date,
                    time = %record.appointment_time,
                    "Restore rejected, slot already booked"
                );
                Err(DbError::Domain(CoreError::DuplicateBooking {
                    doctor_id: record.doctor_id,
                    date: record.appointment_date,
                    time: record.appointment_time,
                }))
            }
            other => other,
        }
    }

    pub async fn list_archived(&self) -> DbResult<Vec<Archived<Appointment>>> {
        self.archive_table().list_archived().await
    }
}

/// Fails with `NotFound` unless `table` has a row with this id.
async fn ensure_exists(
    conn: &mut SqliteConnection,
    table: &'static str,
    entity: &'static str,
    id: i64,
) -> DbResult<()> {
    let sql = format!("SELECT COUNT(*) FROM {table} WHERE id = ?1");
    let found: i64 = sqlx::query_scalar(&sql).bind(id).fetch_one(&mut *conn).await?;

    if found == 0 {
        return Err(DbError::not_found(entity, id));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
