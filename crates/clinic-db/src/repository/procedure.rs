//! # Procedure Repository
//!
//! Price list of clinic procedures (eye exam, tonometry, fitting).

use sqlx::SqlitePool;
use tracing::{debug, info};

use clinic_core::validation::{optional_text, validate_amount, validate_required};
use clinic_core::{NewProcedure, Procedure};

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct ProcedureRepository {
    pool: SqlitePool,
}

impl ProcedureRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProcedureRepository { pool }
    }

    pub async fn add_procedure(&self, form: NewProcedure) -> DbResult<Procedure> {
        let name = validate_required(&form.name, "name")?;
        validate_amount(form.cost, "cost")?;

        debug!(name = %name, cost = %form.cost, "Adding procedure");

        let procedure = sqlx::query_as::<_, Procedure>(
            "INSERT INTO procedures (name, description, cost_cents) VALUES (?1, ?2, ?3) RETURNING *",
        )
        .bind(&name)
        .bind(optional_text(form.description))
        .bind(form.cost.cents())
        .fetch_one(&self.pool)
        .await?;

        info!(id = procedure.id, "Procedure added");
        Ok(procedure)
    }

    /// All procedures by name.
    pub async fn get_all_procedures(&self) -> DbResult<Vec<Procedure>> {
        let procedures = sqlx::query_as::<_, Procedure>("SELECT * FROM procedures ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(procedures)
    }

    pub async fn update_procedure(&self, id: i64, form: NewProcedure) -> DbResult<Procedure> {
        let name = validate_required(&form.name, "name")?;
        validate_amount(form.cost, "cost")?;

        let procedure = sqlx::query_as::<_, Procedure>(
            r#"
            UPDATE procedures SET name = ?2, description = ?3, cost_cents = ?4
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(optional_text(form.description))
        .bind(form.cost.cents())
        .fetch_optional(&self.pool)
        .await?;

        procedure.ok_or_else(|| DbError::not_found("Procedure", id))
    }

    pub async fn delete_procedure(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM procedures WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Procedure", id));
        }

        info!(id, "Procedure deleted");
        Ok(())
    }
}
