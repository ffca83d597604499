//! # Billing Commands
//!
//! Patient bills. Amounts are typed as text (`"1,500.50"`) and stored in
//! centavos.

use serde::{Deserialize, Serialize};
use tracing::info;

use clinic_core::validation::optional_text;
use clinic_core::{Bill, BillView, Money, NewBill, PaymentMethod, PaymentStatus, DEFAULT_BILL_SERVICE};

use super::parse_choice;
use crate::error::ApiError;
use crate::state::{AppConfig, DbState};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillForm {
    pub patient_id: i64,
    pub amount: String,
    /// Defaults to "General"
    pub service: Option<String>,
    /// Defaults to Cash
    pub payment_method: Option<String>,
    /// Defaults to Pending
    pub status: Option<String>,
}

/// Outstanding balance, formatted in the clinic currency.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutstandingDto {
    pub pending_cents: i64,
    pub pending: String,
}

pub async fn add_bill(db: &DbState, form: BillForm) -> Result<Bill, ApiError> {
    let bill = NewBill {
        patient_id: form.patient_id,
        amount: Money::parse(&form.amount)?,
        service: optional_text(form.service).unwrap_or_else(|| DEFAULT_BILL_SERVICE.to_string()),
        payment_method: parse_choice::<PaymentMethod>(form.payment_method.as_deref())?
            .unwrap_or_default(),
        status: parse_choice::<PaymentStatus>(form.status.as_deref())?.unwrap_or_default(),
    };

    let bill = db.inner().billing().add_billing(bill).await?;
    info!(id = bill.id, patient_id = bill.patient_id, "Bill recorded");
    Ok(bill)
}

/// All bills, or one patient's bills (with the patient name) when given.
pub async fn list_bills(db: &DbState, patient_id: Option<i64>) -> Result<Vec<BillView>, ApiError> {
    let bills = db.inner().billing().list_bills().await?;
    Ok(match patient_id {
        Some(id) => bills.into_iter().filter(|b| b.bill.patient_id == id).collect(),
        None => bills,
    })
}

pub async fn pay_bill(db: &DbState, id: i64) -> Result<Bill, ApiError> {
    Ok(db.inner().billing().mark_paid(id).await?)
}

pub async fn outstanding(db: &DbState, config: &AppConfig) -> Result<OutstandingDto, ApiError> {
    let pending = db.inner().billing().outstanding_total().await?;
    Ok(OutstandingDto {
        pending_cents: pending.cents(),
        pending: config.format_currency(pending),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{db, patient};
    use crate::error::ErrorCode;

    #[tokio::test]
    async fn test_bill_defaults_and_payment() {
        let db = db().await;
        let config = AppConfig::default();
        let p = patient(&db, "Santos").await;

        let bill = add_bill(
            &db,
            BillForm {
                patient_id: p.id,
                amount: "1,500.50".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(bill.amount(), Money::from_cents(150_050));
        assert_eq!(bill.service, "General");
        assert_eq!(bill.payment_method, PaymentMethod::Cash);
        assert_eq!(bill.status, PaymentStatus::Pending);

        assert_eq!(outstanding(&db, &config).await.unwrap().pending, "₱1,500.50");

        pay_bill(&db, bill.id).await.unwrap();
        assert_eq!(outstanding(&db, &config).await.unwrap().pending_cents, 0);
        assert_eq!(list_bills(&db, Some(p.id)).await.unwrap().len(), 1);
        assert!(list_bills(&db, Some(p.id + 1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_bad_amount_and_method() {
        let db = db().await;
        let p = patient(&db, "Santos").await;

        let form = BillForm {
            patient_id: p.id,
            amount: "-5".to_string(),
            ..Default::default()
        };
        assert_eq!(add_bill(&db, form).await.unwrap_err().code, ErrorCode::ValidationError);

        let form = BillForm {
            patient_id: p.id,
            amount: "5".to_string(),
            payment_method: Some("bitcoin".to_string()),
            ..Default::default()
        };
        assert_eq!(add_bill(&db, form).await.unwrap_err().code, ErrorCode::ValidationError);
    }
}
