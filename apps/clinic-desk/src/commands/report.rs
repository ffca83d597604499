//! # Report Commands
//!
//! The dashboard and the reports screen.

use serde::Serialize;

use clinic_core::{DashboardStats, Demographics};

use crate::error::ApiError;
use crate::state::{AppConfig, DbState};

/// Dashboard counters plus the money still owed to the clinic.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub clinic_name: String,
    #[serde(flatten)]
    pub stats: DashboardStats,
    pub outstanding_bills: String,
    pub unpaid_invoices: String,
}

pub async fn dashboard(db: &DbState, config: &AppConfig) -> Result<Dashboard, ApiError> {
    let db = db.inner();
    Ok(Dashboard {
        clinic_name: config.clinic_name.clone(),
        stats: db.reports().dashboard_stats().await?,
        outstanding_bills: config.format_currency(db.billing().outstanding_total().await?),
        unpaid_invoices: config.format_currency(db.invoices().unpaid_total().await?),
    })
}

pub async fn demographics(db: &DbState) -> Result<Demographics, ApiError> {
    Ok(db.inner().reports().patient_demographics().await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::billing::{add_bill, BillForm};
    use crate::commands::patient::register_patient;
    use crate::commands::test_support::{db, patient_form};

    #[tokio::test]
    async fn test_dashboard() {
        let db = db().await;
        let config = AppConfig::default();
        let p = register_patient(&db, patient_form("Santos", "34")).await.unwrap();
        add_bill(
            &db,
            BillForm {
                patient_id: p.id,
                amount: "800".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        let dash = dashboard(&db, &config).await.unwrap();
        assert_eq!(dash.stats.total_patients, 1);
        assert_eq!(dash.stats.patients_today, 1);
        assert_eq!(dash.outstanding_bills, "₱800.00");
        assert_eq!(dash.unpaid_invoices, "₱0.00");

        let json = serde_json::to_value(&dash).unwrap();
        assert_eq!(json["clinicName"], "Clinic Desk");
        assert_eq!(json["total_patients"], 1);
    }

    #[tokio::test]
    async fn test_demographics() {
        let db = db().await;
        register_patient(&db, patient_form("Flores", "9")).await.unwrap();
        register_patient(&db, patient_form("Santos", "34")).await.unwrap();

        let demo = demographics(&db).await.unwrap();
        assert_eq!((demo.total, demo.kids, demo.adults), (2, 1, 1));
    }
}
