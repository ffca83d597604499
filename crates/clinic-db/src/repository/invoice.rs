//! # Invoice Repository
//!
//! Invoices generated from sales.
//!
//! ## Invoice Arithmetic
//! ```text
//! sale total ........ ₱3,041.00
//! tax (12%) ......... ₱  364.92    round-half-up on centavos
//! grand total ....... ₱3,405.92
//!
//! number: INV-<invoice date YYYYMMDD>-<sale id>
//! ```

use chrono::Local;
use sqlx::SqlitePool;
use tracing::{debug, info};

use clinic_core::validation::validate_required;
use clinic_core::{
    Invoice, InvoiceView, Money, PaymentStatus, Sale, SaleItemDetail, TaxRate, ValidationError,
};

use crate::error::{DbError, DbResult};
use crate::repository::patient_name_sql;
use crate::repository::sales::SalesRepository;

const SELECT_VIEW: &str = concat!(
    "SELECT i.*, s.customer_name AS customer_name, ",
    patient_name_sql!("p"),
    " AS patient_name ",
    "FROM invoices i ",
    "JOIN sales s ON s.id = i.sale_id ",
    "LEFT JOIN patients p ON p.id = i.patient_id "
);

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Invoices a sale at the standard 12% rate.
    pub async fn create_invoice(
        &self,
        sale_id: i64,
        patient_id: Option<i64>,
        generated_by: &str,
    ) -> DbResult<Invoice> {
        self.create_invoice_with_rate(sale_id, patient_id, generated_by, TaxRate::default())
            .await
    }

    /// Invoices a sale at the given tax rate.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown sale
    /// - `UniqueViolation` when the sale was already invoiced today
    pub async fn create_invoice_with_rate(
        &self,
        sale_id: i64,
        patient_id: Option<i64>,
        generated_by: &str,
        rate: TaxRate,
    ) -> DbResult<Invoice> {
        let generated_by = validate_required(generated_by, "generated_by")?;

        let mut tx = self.pool.begin().await?;

        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1")
            .bind(sale_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", sale_id))?;

        let today = Local::now().date_naive();
        let number = Invoice::number_for(today, sale.id);
        let total = sale.total();
        let tax = total.calculate_tax(rate);
        let grand_total = total
            .checked_add(tax)
            .ok_or_else(|| ValidationError::invalid("grand_total", "amount is too large"))?;

        debug!(sale_id, number = %number, total = %total, tax = %tax, "Generating invoice");

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                sale_id, patient_id, invoice_number, invoice_date,
                total_cents, tax_cents, grand_total_cents, generated_by, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING *
            "#,
        )
        .bind(sale.id)
        .bind(patient_id)
        .bind(&number)
        .bind(today)
        .bind(total.cents())
        .bind(tax.cents())
        .bind(grand_total.cents())
        .bind(&generated_by)
        .bind(PaymentStatus::Pending)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("invoice_number", number.clone()),
            other => other,
        })?;

        tx.commit().await?;

        info!(id = invoice.id, number = %invoice.invoice_number, "Invoice generated");
        Ok(invoice)
    }

    /// All invoices, newest first.
    pub async fn get_all_invoices(&self) -> DbResult<Vec<InvoiceView>> {
        let sql = format!("{SELECT_VIEW} ORDER BY i.invoice_date DESC, i.id DESC");
        let rows = sqlx::query_as::<_, InvoiceView>(&sql)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn get_invoice_details(&self, id: i64) -> DbResult<Option<InvoiceView>> {
        let sql = format!("{SELECT_VIEW} WHERE i.id = ?1");
        let row = sqlx::query_as::<_, InvoiceView>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Line items of the invoiced sale.
    pub async fn get_invoice_items(&self, sale_id: i64) -> DbResult<Vec<SaleItemDetail>> {
        SalesRepository::new(self.pool.clone()).get_sale_details(sale_id).await
    }

    pub async fn mark_invoice_paid(&self, id: i64) -> DbResult<Invoice> {
        let invoice =
            sqlx::query_as::<_, Invoice>("UPDATE invoices SET status = ?2 WHERE id = ?1 RETURNING *")
                .bind(id)
                .bind(PaymentStatus::Paid)
                .fetch_optional(&self.pool)
                .await?;

        let invoice = invoice.ok_or_else(|| DbError::not_found("Invoice", id))?;
        info!(id, "Invoice paid");
        Ok(invoice)
    }

    pub async fn get_invoices_by_patient(&self, patient_id: i64) -> DbResult<Vec<InvoiceView>> {
        let sql = format!("{SELECT_VIEW} WHERE i.patient_id = ?1 ORDER BY i.invoice_date DESC, i.id DESC");
        let rows = sqlx::query_as::<_, InvoiceView>(&sql)
            .bind(patient_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Sum of grand totals still `Pending`.
    pub async fn unpaid_total(&self) -> DbResult<Money> {
        let cents: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(grand_total_cents), 0) FROM invoices WHERE status = ?1",
        )
        .bind(PaymentStatus::Pending)
        .fetch_one(&self.pool)
        .await?;
        Ok(Money::from_cents(cents))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use clinic_core::{Gender, NewPatient, NewSalesProduct, SaleLine};

    async fn setup() -> (Database, Sale) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .sales()
            .add_product(NewSalesProduct {
                name: "Progressive Lenses".to_string(),
                category: "Lenses".to_string(),
                description: None,
                price: Money::from_cents(304_100),
                quantity: 5,
            })
            .await
            .unwrap();
        let sale = db
            .sales()
            .create_sale(
                "Grace Tan",
                &[SaleLine {
                    product_id: product.id,
                    quantity: 1,
                    unit_price: product.price(),
                }],
            )
            .await
            .unwrap();
        (db, sale)
    }

    #[tokio::test]
    async fn test_invoice_arithmetic_and_number() {
        let (db, sale) = setup().await;
        let invoice = db.invoices().create_invoice(sale.id, None, "admin").await.unwrap();

        assert_eq!(invoice.total_cents, 304_100);
        assert_eq!(invoice.tax_cents, 36_492);
        assert_eq!(invoice.grand_total_cents, 340_592);
        assert_eq!(invoice.status, PaymentStatus::Pending);
        assert_eq!(
            invoice.invoice_number,
            format!("INV-{}-{}", Local::now().format("%Y%m%d"), sale.id)
        );
    }

    #[tokio::test]
    async fn test_same_sale_twice_in_a_day_is_duplicate() {
        let (db, sale) = setup().await;
        db.invoices().create_invoice(sale.id, None, "admin").await.unwrap();

        let err = db.invoices().create_invoice(sale.id, None, "admin").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "invoice_number"));
    }

    #[tokio::test]
    async fn test_grand_total_overflow_is_rejected() {
        let (db, sale) = setup().await;
        sqlx::query("UPDATE sales SET total_cents = ?1 WHERE id = ?2")
            .bind(i64::MAX - 100)
            .bind(sale.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = db.invoices().create_invoice(sale.id, None, "admin").await.unwrap_err();
        assert!(matches!(err, DbError::Domain(clinic_core::CoreError::Validation(_))));
        assert!(db.invoices().get_all_invoices().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_sale() {
        let (db, _) = setup().await;
        assert!(db.invoices().create_invoice(404, None, "admin").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_views_items_and_payment() {
        let (db, sale) = setup().await;
        let patient = db
            .patients()
            .add_patient(NewPatient {
                surname: "Tan".to_string(),
                first_name: "Grace".to_string(),
                age: Some(62),
                gender: Some(Gender::Female),
                contact: "0920 111 2222".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();

        let repo = db.invoices();
        let invoice = repo.create_invoice(sale.id, Some(patient.id), "frontdesk").await.unwrap();

        let view = repo.get_invoice_details(invoice.id).await.unwrap().unwrap();
        assert_eq!(view.customer_name, "Grace Tan");
        assert_eq!(view.patient_name.as_deref(), Some("Tan, Grace"));
        assert_eq!(repo.get_invoices_by_patient(patient.id).await.unwrap().len(), 1);

        let items = repo.get_invoice_items(invoice.sale_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_name, "Progressive Lenses");

        assert_eq!(repo.unpaid_total().await.unwrap().cents(), 340_592);
        assert_eq!(repo.mark_invoice_paid(invoice.id).await.unwrap().status, PaymentStatus::Paid);
        assert!(repo.unpaid_total().await.unwrap().is_zero());
    }

    #[tokio::test]
    async fn test_walk_in_invoice_has_no_patient_name() {
        let (db, sale) = setup().await;
        db.invoices().create_invoice(sale.id, None, "admin").await.unwrap();

        let all = db.invoices().get_all_invoices().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].patient_name, None);
    }
}
