//! # Archive / Restore
//!
//! Table-agnostic soft delete shared by every manager whose records can be
//! archived.
//!
//! ## How a Record Moves
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   archive(id)                           restore(id)                     │
//! │   ───────────                           ───────────                     │
//! │   BEGIN                                 BEGIN                           │
//! │   cols = live table columns             row in archive table? else      │
//! │   INSERT INTO archived_x                  NotFound                      │
//! │     (cols, deleted_on)                  cols = live table columns       │
//! │     SELECT cols, now FROM x             INSERT INTO x (cols)            │
//! │     WHERE id = ?                          SELECT cols FROM archived_x   │
//! │   0 rows? → NotFound                      WHERE id = ?                  │
//! │   DELETE FROM x WHERE id = ?            DELETE FROM archived_x          │
//! │   COMMIT                                  WHERE id = ?                  │
//! │                                         COMMIT                          │
//! │                                                                         │
//! │   patients ───────────► archived_patients ───────────► patients         │
//! │   (id 7)                (id 7, deleted_on)             (id 7 again)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Columns are read from `pragma_table_info` of the live table at call time
//! and copied by name, so the archive table only has to carry the same
//! column names plus `deleted_on`. Both moves run in one transaction; a
//! foreign-key or unique failure leaves both tables untouched.
//!
//! Callers that already hold a transaction use [`archive_in`] /
//! [`restore_in`] directly.

use std::marker::PhantomData;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Row, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

// =============================================================================
// Configuration
// =============================================================================

/// Where a record type lives and where it goes when archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveSpec {
    /// Human name used in errors and logs ("Patient").
    pub entity: &'static str,
    /// Live table.
    pub table: &'static str,
    /// Archive table: the live columns plus `deleted_on`.
    pub archive_table: &'static str,
    /// Primary key column, shared by both tables.
    pub id_column: &'static str,
}

/// A record that can be soft-deleted into an archive table.
///
/// The record must decode from a row of either table (the archive table's
/// extra `deleted_on` column is ignored by the record's `FromRow`).
pub trait Archivable: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const SPEC: ArchiveSpec;
}

/// An archived record with its deletion timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct Archived<T> {
    #[serde(flatten)]
    pub record: T,
    pub deleted_on: DateTime<Utc>,
}

impl<'r, T> FromRow<'r, SqliteRow> for Archived<T>
where
    T: FromRow<'r, SqliteRow>,
{
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Archived {
            record: T::from_row(row)?,
            deleted_on: row.try_get("deleted_on")?,
        })
    }
}

// =============================================================================
// Archive Table Handle
// =============================================================================

/// Archive operations for one record type.
///
/// ```rust,ignore
/// let archive = db.patients().archive_table();
/// archive.archive(7).await?;
/// let back: Patient = archive.restore(7).await?;
/// ```
#[derive(Debug)]
pub struct ArchiveTable<T> {
    pool: SqlitePool,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for ArchiveTable<T> {
    fn clone(&self) -> Self {
        ArchiveTable {
            pool: self.pool.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Archivable> ArchiveTable<T> {
    pub fn new(pool: SqlitePool) -> Self {
        ArchiveTable {
            pool,
            _record: PhantomData,
        }
    }

    /// Moves a live record into the archive table.
    pub async fn archive(&self, id: i64) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        archive_in::<T>(&mut *tx, id).await?;
        tx.commit().await?;

        info!(entity = T::SPEC.entity, id, "Record archived");
        Ok(())
    }

    /// Moves an archived record back into the live table and returns it.
    ///
    /// The original id is reused.
    pub async fn restore(&self, id: i64) -> DbResult<T> {
        let mut tx = self.pool.begin().await?;
        let record = restore_in::<T>(&mut *tx, id).await?;
        tx.commit().await?;

        info!(entity = T::SPEC.entity, id, "Record restored");
        Ok(record)
    }

    /// All archived records, most recently deleted first.
    pub async fn list_archived(&self) -> DbResult<Vec<Archived<T>>> {
        let spec = T::SPEC;
        let sql = format!(
            "SELECT * FROM {} ORDER BY deleted_on DESC, {} DESC",
            quote_ident(spec.archive_table),
            quote_ident(spec.id_column),
        );

        let rows = sqlx::query_as::<_, Archived<T>>(&sql)
            .fetch_all(&self.pool)
            .await?;

        debug!(entity = spec.entity, count = rows.len(), "Listed archived records");
        Ok(rows)
    }

    /// One archived record, if present.
    pub async fn get_archived(&self, id: i64) -> DbResult<Option<Archived<T>>> {
        let spec = T::SPEC;
        let sql = format!(
            "SELECT * FROM {} WHERE {} = ?1",
            quote_ident(spec.archive_table),
            quote_ident(spec.id_column),
        );

        let row = sqlx::query_as::<_, Archived<T>>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }
}

// =============================================================================
// Connection-Level Operations
// =============================================================================

/// Archives a record on an existing connection or transaction.
///
/// Does not commit; the caller owns the transaction.
pub async fn archive_in<T: Archivable>(conn: &mut SqliteConnection, id: i64) -> DbResult<()> {
    let spec = T::SPEC;
    let columns = column_list(conn, spec).await?;

    debug!(entity = spec.entity, id, "Archiving record");

    let copy = format!(
        "INSERT INTO {archive} ({cols}, deleted_on) SELECT {cols}, ?1 FROM {live} WHERE {id} = ?2",
        archive = quote_ident(spec.archive_table),
        live = quote_ident(spec.table),
        id = quote_ident(spec.id_column),
        cols = columns,
    );

    let copied = sqlx::query(&copy)
        .bind(Utc::now())
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if copied.rows_affected() == 0 {
        return Err(DbError::not_found(spec.entity, id));
    }

    let delete = format!(
        "DELETE FROM {} WHERE {} = ?1",
        quote_ident(spec.table),
        quote_ident(spec.id_column),
    );
    sqlx::query(&delete).bind(id).execute(&mut *conn).await?;

    Ok(())
}

/// Restores an archived record on an existing connection or transaction.
///
/// Does not commit; the caller owns the transaction.
pub async fn restore_in<T: Archivable>(conn: &mut SqliteConnection, id: i64) -> DbResult<T> {
    let spec = T::SPEC;
    let archive = quote_ident(spec.archive_table);
    let live = quote_ident(spec.table);
    let id_col = quote_ident(spec.id_column);

    let exists = sqlx::query_scalar::<_, i64>(&format!(
        "SELECT COUNT(*) FROM {archive} WHERE {id_col} = ?1"
    ))
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;

    if exists == 0 {
        return Err(DbError::not_found(format!("Archived {}", spec.entity), id));
    }

    // Live columns only: `deleted_on` stays behind.
    let columns = column_list(conn, spec).await?;

    debug!(entity = spec.entity, id, "Restoring record");

    let copy = format!(
        "INSERT INTO {live} ({columns}) SELECT {columns} FROM {archive} WHERE {id_col} = ?1"
    );
    sqlx::query(&copy).bind(id).execute(&mut *conn).await?;

    sqlx::query(&format!("DELETE FROM {archive} WHERE {id_col} = ?1"))
        .bind(id)
        .execute(&mut *conn)
        .await?;

    let record = sqlx::query_as::<_, T>(&format!("SELECT * FROM {live} WHERE {id_col} = ?1"))
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

    Ok(record)
}

// =============================================================================
// Helpers
// =============================================================================

/// Quoted, comma-separated column names of the live table.
async fn column_list(conn: &mut SqliteConnection, spec: ArchiveSpec) -> DbResult<String> {
    let names: Vec<String> =
        sqlx::query_scalar("SELECT name FROM pragma_table_info(?1) ORDER BY cid")
            .bind(spec.table)
            .fetch_all(&mut *conn)
            .await?;

    if names.is_empty() {
        return Err(DbError::Internal(format!(
            "table {} has no columns",
            spec.table
        )));
    }

    Ok(names
        .iter()
        .map(|name| quote_ident(name))
        .collect::<Vec<_>>()
        .join(", "))
}

/// Double-quotes an SQL identifier.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use clinic_core::{
        Appointment, Gender, InventoryItem, Money, NewDoctor, NewInventoryItem, NewPatient,
        Patient,
    };

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn add_patient(db: &Database) -> Patient {
        db.patients()
            .add_patient(NewPatient {
                surname: "Garcia".to_string(),
                first_name: "Lito".to_string(),
                middle_initial: Some("M".to_string()),
                age: Some(34),
                gender: Some(Gender::Male),
                contact: "0917-555-0101".to_string(),
                email: Some("lito@example.ph".to_string()),
                ..Default::default()
            })
            .await
            .unwrap()
    }

    async fn count(db: &Database, table: &str) -> i64 {
        sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("patients"), "\"patients\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }

    #[tokio::test]
    async fn test_archive_moves_row_with_timestamp() {
        let db = test_db().await;
        let patient = add_patient(&db).await;
        let archive = ArchiveTable::<Patient>::new(db.pool().clone());

        let before = Utc::now();
        archive.archive(patient.id).await.unwrap();

        assert_eq!(count(&db, "patients").await, 0);
        let archived = archive.get_archived(patient.id).await.unwrap().unwrap();
        assert_eq!(archived.record, patient);
        assert!(archived.deleted_on >= before - chrono::Duration::seconds(1));
    }

    #[tokio::test]
    async fn test_restore_reverses_archive_exactly() {
        let db = test_db().await;
        let patient = add_patient(&db).await;
        let archive = ArchiveTable::<Patient>::new(db.pool().clone());

        archive.archive(patient.id).await.unwrap();
        let restored = archive.restore(patient.id).await.unwrap();

        assert_eq!(restored, patient);
        assert_eq!(count(&db, "archived_patients").await, 0);
        assert_eq!(db.patients().get_patient(patient.id).await.unwrap(), Some(patient));
    }

    #[tokio::test]
    async fn test_archive_missing_row_is_not_found() {
        let db = test_db().await;
        let archive = ArchiveTable::<Patient>::new(db.pool().clone());

        let err = archive.archive(999).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let err = archive.restore(999).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_failed_archive_leaves_both_tables_untouched() {
        let db = test_db().await;
        let patient = add_patient(&db).await;
        let doctor = db
            .doctors()
            .add_doctor(NewDoctor {
                surname: "Reyes".to_string(),
                first_name: "Ana".to_string(),
                license_number: "PRC-0012345".to_string(),
                specialization: "Optometry".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        db.appointments()
            .schedule(
                patient.id,
                doctor.id,
                chrono::NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
                chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            )
            .await
            .unwrap();

        let err = ArchiveTable::<Patient>::new(db.pool().clone())
            .archive(patient.id)
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert_eq!(count(&db, "patients").await, 1);
        assert_eq!(count(&db, "archived_patients").await, 0);
    }

    #[tokio::test]
    async fn test_failed_restore_keeps_archived_row() {
        let db = test_db().await;
        let patient = add_patient(&db).await;
        let doctor = db
            .doctors()
            .add_doctor(NewDoctor {
                surname: "Santos".to_string(),
                first_name: "Mara".to_string(),
                license_number: "PRC-0054321".to_string(),
                specialization: "Ophthalmology".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        let appointment = db
            .appointments()
            .schedule(
                patient.id,
                doctor.id,
                chrono::NaiveDate::from_ymd_opt(2026, 7, 1).unwrap(),
                chrono::NaiveTime::from_hms_opt(14, 0, 0).unwrap(),
            )
            .await
            .unwrap();

        let appointments = ArchiveTable::<Appointment>::new(db.pool().clone());
        appointments.archive(appointment.id).await.unwrap();
        ArchiveTable::<Patient>::new(db.pool().clone())
            .archive(patient.id)
            .await
            .unwrap();

        // The patient is gone, so the insert back into appointments fails.
        let err = appointments.restore(appointment.id).await.unwrap_err();

        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert_eq!(count(&db, "appointments").await, 0);
        assert_eq!(count(&db, "archived_appointments").await, 1);
        let kept = appointments.get_archived(appointment.id).await.unwrap().unwrap();
        assert_eq!(kept.record, appointment);
    }

    #[tokio::test]
    async fn test_cloned_table_shares_pool() {
        let db = test_db().await;
        let patient = add_patient(&db).await;
        let archive = ArchiveTable::<Patient>::new(db.pool().clone());
        let cloned = archive.clone();

        cloned.archive(patient.id).await.unwrap();

        assert_eq!(archive.list_archived().await.unwrap().len(), 1);
        assert_eq!(cloned.restore(patient.id).await.unwrap(), patient);
    }

    #[tokio::test]
    async fn test_list_archived_returns_typed_records() {
        let db = test_db().await;
        let inventory = db.inventory();
        for name in ["Lens cloth", "Eye drops"] {
            inventory
                .add_item(NewInventoryItem {
                    item_name: name.to_string(),
                    category: "Consumables".to_string(),
                    quantity: 10,
                    unit_price: Money::from_cents(5_000),
                    supplier: None,
                })
                .await
                .unwrap();
        }

        let archive = ArchiveTable::<InventoryItem>::new(db.pool().clone());
        for item in inventory.list_items().await.unwrap() {
            archive.archive(item.id).await.unwrap();
        }

        let archived = archive.list_archived().await.unwrap();
        assert_eq!(archived.len(), 2);
        let mut names: Vec<_> = archived.iter().map(|a| a.record.item_name.as_str()).collect();
        names.sort();
        assert_eq!(names, ["Eye drops", "Lens cloth"]);
    }
}
