//! # Archive Commands
//!
//! The archive screen: pick a category, see what was deleted and when,
//! restore a record under its original id.
//!
//! ```text
//! ┌──────────────┬──────────────────────┬──────────────────────────────┐
//! │ Category     │ Live table           │ Archive table                │
//! ├──────────────┼──────────────────────┼──────────────────────────────┤
//! │ Patient      │ patients             │ archived_patients            │
//! │ Doctor       │ doctors              │ archived_doctors             │
//! │ Appointment  │ appointments         │ archived_appointments        │
//! │ Inventory    │ inventory            │ archived_inventory           │
//! └──────────────┴──────────────────────┴──────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use clinic_core::{Appointment, ArchiveCategory, Doctor, InventoryItem, Patient};
use clinic_db::Archived;

use crate::error::ApiError;
use crate::state::DbState;

/// One row of the archive list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedEntry {
    pub category: ArchiveCategory,
    pub id: i64,
    pub label: String,
    /// `None` for a record that was just restored
    pub deleted_on: Option<DateTime<Utc>>,
}

/// How a record is labelled on the archive screen.
trait ArchiveLabel {
    const CATEGORY: ArchiveCategory;
    fn id(&self) -> i64;
    fn label(&self) -> String;
}

impl ArchiveLabel for Patient {
    const CATEGORY: ArchiveCategory = ArchiveCategory::Patient;
    fn id(&self) -> i64 {
        self.id
    }
    fn label(&self) -> String {
        self.display_name()
    }
}

impl ArchiveLabel for Doctor {
    const CATEGORY: ArchiveCategory = ArchiveCategory::Doctor;
    fn id(&self) -> i64 {
        self.id
    }
    fn label(&self) -> String {
        self.name.clone()
    }
}

impl ArchiveLabel for Appointment {
    const CATEGORY: ArchiveCategory = ArchiveCategory::Appointment;
    fn id(&self) -> i64 {
        self.id
    }
    fn label(&self) -> String {
        format!(
            "{} {} (patient {}, doctor {}, {})",
            self.appointment_date,
            self.appointment_time.format("%H:%M"),
            self.patient_id,
            self.doctor_id,
            self.status
        )
    }
}

impl ArchiveLabel for InventoryItem {
    const CATEGORY: ArchiveCategory = ArchiveCategory::InventoryItem;
    fn id(&self) -> i64 {
        self.id
    }
    fn label(&self) -> String {
        format!("{} ({})", self.item_name, self.category)
    }
}

fn archived_entries<T: ArchiveLabel>(rows: Vec<Archived<T>>) -> Vec<ArchivedEntry> {
    rows.into_iter()
        .map(|row| ArchivedEntry {
            category: T::CATEGORY,
            id: row.record.id(),
            label: row.record.label(),
            deleted_on: Some(row.deleted_on),
        })
        .collect()
}

fn restored_entry<T: ArchiveLabel>(record: T) -> ArchivedEntry {
    ArchivedEntry {
        category: T::CATEGORY,
        id: record.id(),
        label: record.label(),
        deleted_on: None,
    }
}

pub async fn list_archived(db: &DbState, category: ArchiveCategory) -> Result<Vec<ArchivedEntry>, ApiError> {
    let db = db.inner();
    let entries = match category {
        ArchiveCategory::Patient => archived_entries(db.patients().list_archived().await?),
        ArchiveCategory::Doctor => archived_entries(db.doctors().list_archived().await?),
        ArchiveCategory::Appointment => archived_entries(db.appointments().list_archived().await?),
        ArchiveCategory::InventoryItem => archived_entries(db.inventory().list_archived().await?),
    };
    Ok(entries)
}

/// Moves an archived record back to its live table.
pub async fn restore(db: &DbState, category: ArchiveCategory, id: i64) -> Result<ArchivedEntry, ApiError> {
    let db = db.inner();
    let entry = match category {
        ArchiveCategory::Patient => restored_entry(db.patients().restore(id).await?),
        ArchiveCategory::Doctor => restored_entry(db.doctors().restore(id).await?),
        ArchiveCategory::Appointment => restored_entry(db.appointments().restore(id).await?),
        ArchiveCategory::InventoryItem => restored_entry(db.inventory().restore(id).await?),
    };

    info!(category = %category, id, "Record restored");
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::patient::{archive_patient, list_patients};
    use crate::commands::test_support::{db, patient};
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_archive_then_restore_patient() {
        let db = db().await;
        let p = patient(&db, "Santos").await;
        archive_patient(&db, p.id).await.unwrap();

        let archived = list_archived(&db, ArchiveCategory::Patient).await.unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].id, p.id);
        assert_eq!(archived[0].label, "Santos, Maria");
        assert!(archived[0].deleted_on.is_some());

        let restored = restore(&db, ArchiveCategory::Patient, p.id).await.unwrap();
        assert_eq!(restored.id, p.id);
        assert!(list_archived(&db, ArchiveCategory::Patient).await.unwrap().is_empty());
        assert_eq!(list_patients(&db, None).await.unwrap()[0].id, p.id);
    }

    #[tokio::test]
    async fn test_restore_missing_is_not_found() {
        let db = db().await;
        for category in ArchiveCategory::ALL {
            let err = restore(&db, *category, 77).await.unwrap_err();
            assert_eq!(err.code, ErrorCode::NotFound);
            assert!(list_archived(&db, *category).await.unwrap().is_empty());
        }
    }
}
