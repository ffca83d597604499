//! # Invoice Commands
//!
//! Invoices are generated from a completed sale at the configured tax rate.
//!
//! ```text
//! Sale #12 total ₱3,041.00
//!      │  tax 12%  = ₱364.92
//!      ▼
//! INV-20260302-12   grand total ₱3,405.92   status Pending
//! ```

use serde::Serialize;
use tracing::info;

use clinic_core::{Invoice, InvoiceView, SaleItemDetail};

use crate::error::ApiError;
use crate::state::{AppConfig, DbState};

/// An invoice with the sale's line items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetails {
    pub clinic_name: String,
    pub invoice: InvoiceView,
    pub items: Vec<SaleItemDetail>,
    /// Grand total in the clinic currency
    pub amount_due: String,
}

pub async fn create_invoice(
    db: &DbState,
    config: &AppConfig,
    sale_id: i64,
    patient_id: Option<i64>,
    generated_by: &str,
) -> Result<Invoice, ApiError> {
    let invoice = db
        .inner()
        .invoices()
        .create_invoice_with_rate(sale_id, patient_id, generated_by, config.tax_rate())
        .await?;

    info!(
        number = %invoice.invoice_number,
        grand_total = %invoice.grand_total(),
        "Invoice generated"
    );
    Ok(invoice)
}

pub async fn invoice_details(db: &DbState, config: &AppConfig, id: i64) -> Result<InvoiceDetails, ApiError> {
    let invoices = db.inner().invoices();
    let invoice = invoices
        .get_invoice_details(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Invoice", id))?;
    let items = invoices.get_invoice_items(invoice.invoice.sale_id).await?;

    Ok(InvoiceDetails {
        clinic_name: config.clinic_name.clone(),
        amount_due: config.format_currency(invoice.invoice.grand_total()),
        invoice,
        items,
    })
}

/// All invoices, or one patient's when given.
pub async fn list_invoices(db: &DbState, patient_id: Option<i64>) -> Result<Vec<InvoiceView>, ApiError> {
    let invoices = db.inner().invoices();
    match patient_id {
        Some(id) => Ok(invoices.get_invoices_by_patient(id).await?),
        None => Ok(invoices.get_all_invoices().await?),
    }
}

pub async fn pay_invoice(db: &DbState, id: i64) -> Result<Invoice, ApiError> {
    Ok(db.inner().invoices().mark_invoice_paid(id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::sales::{add_product, create_sale, ProductForm, SaleItemInput};
    use crate::commands::test_support::{db, patient};
    use crate::error::ErrorCode;
    use clinic_core::{Money, PaymentStatus};

    async fn sale(db: &DbState) -> i64 {
        let product = add_product(
            db,
            ProductForm {
                name: "Progressive Lenses".to_string(),
                category: "Lenses".to_string(),
                price: "4,500".to_string(),
                quantity: 10,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        create_sale(db, "Walk-in", &[SaleItemInput { product_id: product.id, quantity: 1 }])
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_invoice_uses_configured_rate() {
        let db = db().await;
        let sale_id = sale(&db).await;
        let config = AppConfig {
            tax_rate_bps: 500,
            ..AppConfig::default()
        };

        let invoice = create_invoice(&db, &config, sale_id, None, "admin").await.unwrap();
        assert_eq!(invoice.tax(), Money::from_cents(22_500));
        assert_eq!(invoice.grand_total(), Money::from_cents(472_500));

        let details = invoice_details(&db, &config, invoice.id).await.unwrap();
        assert_eq!(details.amount_due, "₱4,725.00");
        assert_eq!(details.invoice.customer_name, "Walk-in");
        assert_eq!(details.items.len(), 1);

        let err = create_invoice(&db, &config, sale_id, None, "admin").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn test_patient_invoices_and_payment() {
        let db = db().await;
        let config = AppConfig::default();
        let p = patient(&db, "Santos").await;
        let sale_id = sale(&db).await;

        let invoice = create_invoice(&db, &config, sale_id, Some(p.id), "admin").await.unwrap();
        assert_eq!(invoice.tax(), Money::from_cents(54_000));

        let mine = list_invoices(&db, Some(p.id)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].patient_name.as_deref(), Some("Santos, Maria"));

        let paid = pay_invoice(&db, invoice.id).await.unwrap();
        assert_eq!(paid.status, PaymentStatus::Paid);

        let err = invoice_details(&db, &config, 999).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
