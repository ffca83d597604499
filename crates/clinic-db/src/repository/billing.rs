//! # Billing Repository
//!
//! Patient bills for clinic services. A quick bill is a `General` service
//! paid by the chosen method and left `Pending` until settled.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use clinic_core::validation::{validate_amount, validate_required};
use clinic_core::{
    Bill, BillView, Money, NewBill, PaymentMethod, PaymentStatus, DEFAULT_BILL_SERVICE,
};

use crate::error::{DbError, DbResult};
use crate::repository::patient_name_sql;

#[derive(Debug, Clone)]
pub struct BillingRepository {
    pool: SqlitePool,
}

impl BillingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BillingRepository { pool }
    }

    /// Creates a `Pending` bill for a `General` service.
    pub async fn create_bill(
        &self,
        patient_id: i64,
        amount: Money,
        payment_method: PaymentMethod,
    ) -> DbResult<Bill> {
        self.add_billing(NewBill {
            patient_id,
            amount,
            service: DEFAULT_BILL_SERVICE.to_string(),
            payment_method,
            status: PaymentStatus::Pending,
        })
        .await
    }

    /// Inserts a bill stamped with the current time.
    pub async fn add_billing(&self, form: NewBill) -> DbResult<Bill> {
        validate_amount(form.amount, "amount")?;
        let service = validate_required(&form.service, "service")?;

        debug!(patient_id = form.patient_id, amount = %form.amount, "Creating bill");

        let bill = sqlx::query_as::<_, Bill>(
            r#"
            INSERT INTO bills (patient_id, amount_cents, service, payment_method, status, billing_date)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            RETURNING *
            "#,
        )
        .bind(form.patient_id)
        .bind(form.amount.cents())
        .bind(&service)
        .bind(form.payment_method)
        .bind(form.status)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        info!(id = bill.id, "Bill created");
        Ok(bill)
    }

    /// Every bill with the patient's name, newest first.
    pub async fn list_bills(&self) -> DbResult<Vec<BillView>> {
        let bills = sqlx::query_as::<_, BillView>(concat!(
            "SELECT b.*, ",
            patient_name_sql!("p"),
            " AS patient_name FROM bills b ",
            "JOIN patients p ON p.id = b.patient_id ",
            "ORDER BY b.billing_date DESC, b.id DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    pub async fn get_patient_bills(&self, patient_id: i64) -> DbResult<Vec<Bill>> {
        let bills = sqlx::query_as::<_, Bill>(
            "SELECT * FROM bills WHERE patient_id = ?1 ORDER BY billing_date DESC, id DESC",
        )
        .bind(patient_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bills)
    }

    pub async fn mark_paid(&self, id: i64) -> DbResult<Bill> {
        let bill = sqlx::query_as::<_, Bill>("UPDATE bills SET status = ?2 WHERE id = ?1 RETURNING *")
            .bind(id)
            .bind(PaymentStatus::Paid)
            .fetch_optional(&self.pool)
            .await?;

        let bill = bill.ok_or_else(|| DbError::not_found("Bill", id))?;
        info!(id, "Bill paid");
        Ok(bill)
    }

    /// Sum of all `Pending` bills.
    pub async fn outstanding_total(&self) -> DbResult<Money> {
        let cents: i64 =
            sqlx::query_scalar("SELECT COALESCE(SUM(amount_cents), 0) FROM bills WHERE status = ?1")
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
    use clinic_core::{CoreError, Gender, NewPatient};

    async fn setup() -> (Database, i64) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let patient = db
            .patients()
            .add_patient(NewPatient {
                surname: "Garcia".to_string(),
                first_name: "Liza".to_string(),
                age: Some(45),
                gender: Some(Gender::Female),
                contact: "09171234567".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        (db, patient.id)
    }

    #[tokio::test]
    async fn test_create_bill_defaults() {
        let (db, patient_id) = setup().await;
        let repo = db.billing();

        let bill = repo
            .create_bill(patient_id, Money::from_cents(150_000), PaymentMethod::Card)
            .await
            .unwrap();
        assert_eq!(bill.service, "General");
        assert_eq!(bill.status, PaymentStatus::Pending);
        assert_eq!(bill.payment_method, PaymentMethod::Card);

        let list = repo.list_bills().await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].patient_name, "Garcia, Liza");
        assert_eq!(repo.outstanding_total().await.unwrap().cents(), 150_000);
    }

    #[tokio::test]
    async fn test_mark_paid() {
        let (db, patient_id) = setup().await;
        let repo = db.billing();
        let bill = repo
            .create_bill(patient_id, Money::from_cents(50_000), PaymentMethod::Cash)
            .await
            .unwrap();

        assert_eq!(repo.mark_paid(bill.id).await.unwrap().status, PaymentStatus::Paid);
        assert!(repo.outstanding_total().await.unwrap().is_zero());
        assert!(repo.mark_paid(404).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_negative_amount_rejected() {
        let (db, patient_id) = setup().await;
        let err = db
            .billing()
            .create_bill(patient_id, Money::from_cents(-1), PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_bill_for_unknown_patient() {
        let (db, _) = setup().await;
        let err = db
            .billing()
            .create_bill(999, Money::from_cents(100), PaymentMethod::Cash)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_billed_patient_cannot_be_archived() {
        let (db, patient_id) = setup().await;
        db.billing()
            .create_bill(patient_id, Money::from_cents(100), PaymentMethod::Cash)
            .await
            .unwrap();

        assert!(db.patients().archive_patient(patient_id).await.is_err());
        assert!(db.patients().get_patient(patient_id).await.unwrap().is_some());
        assert_eq!(db.billing().get_patient_bills(patient_id).await.unwrap().len(), 1);
    }
}
