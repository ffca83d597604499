//! # Report Repository
//!
//! Read-only aggregates for the dashboard and the demographics report.

use sqlx::SqlitePool;
use tracing::debug;

use clinic_core::{DashboardStats, Demographics, Gender, GenderCount};

use crate::error::DbResult;
use crate::repository::{
    AppointmentRepository, DoctorRepository, InventoryRepository, PatientRepository,
    ReminderRepository, SalesRepository,
};

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Dashboard counters.
    pub async fn dashboard_stats(&self) -> DbResult<DashboardStats> {
        let patients = PatientRepository::new(self.pool.clone());

        let stats = DashboardStats {
            patients_today: patients.count_patients_today().await?,
            total_patients: self.count_patients().await?,
            total_doctors: DoctorRepository::new(self.pool.clone()).count_doctors().await?,
            scheduled_appointments: AppointmentRepository::new(self.pool.clone())
                .count_scheduled()
                .await?,
            total_sales: SalesRepository::new(self.pool.clone()).count_sales().await?,
            inventory_items: InventoryRepository::new(self.pool.clone()).count_items().await?,
            pending_reminders: ReminderRepository::new(self.pool.clone()).count_pending().await?,
        };

        debug!(?stats, "Dashboard stats");
        Ok(stats)
    }

    /// Live patients by age group and gender. Every gender is listed, even
    /// with a zero count.
    pub async fn patient_demographics(&self) -> DbResult<Demographics> {
        let (kids, adults) = PatientRepository::new(self.pool.clone()).count_by_age_group().await?;

        let counted: Vec<(Gender, i64)> =
            sqlx::query_as("SELECT gender, COUNT(*) FROM patients GROUP BY gender")
                .fetch_all(&self.pool)
                .await?;

        let by_gender = Gender::ALL
            .iter()
            .map(|&gender| GenderCount {
                gender,
                count: counted
                    .iter()
                    .find(|(g, _)| *g == gender)
                    .map_or(0, |(_, n)| *n),
            })
            .collect();

        Ok(Demographics {
            total: kids + adults,
            kids,
            adults,
            by_gender,
        })
    }

    async fn count_patients(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM patients")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::{Local, NaiveTime};
    use clinic_core::{Money, NewDoctor, NewInventoryItem, NewPatient};

    fn patient(surname: &str, age: i64, gender: Gender) -> NewPatient {
        NewPatient {
            surname: surname.to_string(),
            first_name: "Test".to_string(),
            age: Some(age),
            gender: Some(gender),
            contact: "0917 123 4567".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_empty_dashboard() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert_eq!(db.reports().dashboard_stats().await.unwrap(), DashboardStats::default());
    }

    #[tokio::test]
    async fn test_dashboard_counts() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let p = db.patients().add_patient(patient("Santos", 30, Gender::Female)).await.unwrap();
        db.patients().add_patient(patient("Lim", 8, Gender::Male)).await.unwrap();
        let d = db
            .doctors()
            .add_doctor(NewDoctor {
                surname: "Reyes".to_string(),
                first_name: "Ana".to_string(),
                license_number: "PRC-1".to_string(),
                specialization: "Optometry".to_string(),
                ..Default::default()
            })
            .await
            .unwrap();
        db.appointments()
            .schedule(p.id, d.id, Local::now().date_naive(), NaiveTime::from_hms_opt(9, 0, 0).unwrap())
            .await
            .unwrap();
        db.inventory()
            .add_item(NewInventoryItem {
                item_name: "Trial Lens Set".to_string(),
                category: "Equipment".to_string(),
                quantity: 1,
                unit_price: Money::from_cents(0),
                supplier: None,
            })
            .await
            .unwrap();

        let stats = db.reports().dashboard_stats().await.unwrap();
        assert_eq!(stats.patients_today, 2);
        assert_eq!(stats.total_patients, 2);
        assert_eq!(stats.total_doctors, 1);
        assert_eq!(stats.scheduled_appointments, 1);
        assert_eq!(stats.inventory_items, 1);
        assert_eq!(stats.total_sales, 0);
        assert_eq!(stats.pending_reminders, 0);
    }

    #[tokio::test]
    async fn test_demographics() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.patients();
        repo.add_patient(patient("A", 5, Gender::Female)).await.unwrap();
        repo.add_patient(patient("B", 17, Gender::Male)).await.unwrap();
        repo.add_patient(patient("C", 18, Gender::Female)).await.unwrap();

        let demo = db.reports().patient_demographics().await.unwrap();
        assert_eq!(demo.total, 3);
        assert_eq!(demo.kids, 2);
        assert_eq!(demo.adults, 1);
        assert_eq!(
            demo.by_gender,
            vec![
                GenderCount { gender: Gender::Male, count: 1 },
                GenderCount { gender: Gender::Female, count: 2 },
                GenderCount { gender: Gender::Other, count: 0 },
            ]
        );
    }
}
