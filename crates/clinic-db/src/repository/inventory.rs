//! # Inventory Repository
//!
//! Clinic stock: consumables, lens blanks, drops. Items are archived rather
//! than deleted.

use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use clinic_core::validation::{validate_amount, validate_required, validate_stock_quantity};
use clinic_core::{CoreError, InventoryItem, NewInventoryItem, ValidationError};

use crate::error::{DbError, DbResult};
use crate::repository::archive::{Archivable, ArchiveSpec, ArchiveTable, Archived};

impl Archivable for InventoryItem {
    const SPEC: ArchiveSpec = ArchiveSpec {
        entity: "Inventory item",
        table: "inventory",
        archive_table: "archived_inventory",
        id_column: "id",
    };
}

#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    pub fn archive_table(&self) -> ArchiveTable<InventoryItem> {
        ArchiveTable::new(self.pool.clone())
    }

    pub async fn add_item(&self, form: NewInventoryItem) -> DbResult<InventoryItem> {
        let item_name = validate_required(&form.item_name, "item_name")?;
        let category = validate_required(&form.category, "category")?;
        validate_stock_quantity(form.quantity)?;
        validate_amount(form.unit_price, "unit_price")?;

        debug!(item = %item_name, quantity = form.quantity, "Adding inventory item");

        let item = sqlx::query_as::<_, InventoryItem>(
            r#"
            INSERT INTO inventory (item_name, category, quantity, unit_price_cents, supplier)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING *
            "#,
        )
        .bind(&item_name)
        .bind(&category)
        .bind(form.quantity)
        .bind(form.unit_price.cents())
        .bind(&form.supplier)
        .fetch_one(&self.pool)
        .await?;

        info!(id = item.id, "Inventory item added");
        Ok(item)
    }

    /// All live items, newest first.
    pub async fn list_items(&self) -> DbResult<Vec<InventoryItem>> {
        let items = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory ORDER BY id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Same as [`Self::list_items`].
    pub async fn view_all_products(&self) -> DbResult<Vec<InventoryItem>> {
        self.list_items().await
    }

    pub async fn get_item(&self, id: i64) -> DbResult<Option<InventoryItem>> {
        let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(item)
    }

    /// Adds `delta` (negative to consume) to an item's quantity.
    ///
    /// Stock never goes below zero; a larger withdrawal fails with
    /// `InsufficientStock` and changes nothing.
    pub async fn adjust_quantity(&self, id: i64, delta: i64) -> DbResult<InventoryItem> {
        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<_, InventoryItem>("SELECT * FROM inventory WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory item", id))?;

        let quantity = item
            .quantity
            .checked_add(delta)
            .ok_or_else(|| ValidationError::invalid("quantity", "quantity is too large"))?;

        if quantity < 0 {
            warn!(id, available = item.quantity, delta, "Stock adjustment rejected");
            return Err(CoreError::InsufficientStock {
                product: item.item_name,
                available: item.quantity,
                requested: delta.saturating_neg(),
            }
            .into());
        }

        let updated = sqlx::query_as::<_, InventoryItem>(
            "UPDATE inventory SET quantity = ?2 WHERE id = ?1 RETURNING *",
        )
        .bind(id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(id, quantity = updated.quantity, "Stock adjusted");
        Ok(updated)
    }

    pub async fn count_items(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM inventory")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn archive_item(&self, id: i64) -> DbResult<()> {
        self.archive_table().archive(id).await
    }

    pub async fn restore(&self, id: i64) -> DbResult<InventoryItem> {
        self.archive_table().restore(id).await
    }

    pub async fn list_archived(&self) -> DbResult<Vec<Archived<InventoryItem>>> {
        self.archive_table().list_archived().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use clinic_core::Money;

    fn drops(quantity: i64) -> NewInventoryItem {
        NewInventoryItem {
            item_name: "Lubricating Eye Drops 10ml".to_string(),
            category: "Eye Care Products".to_string(),
            quantity,
            unit_price: Money::from_cents(18_500),
            supplier: Some("Visionline Supply".to_string()),
        }
    }

    #[tokio::test]
    async fn test_add_and_list_items() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.inventory();

        let item = repo.add_item(drops(12)).await.unwrap();
        assert_eq!(item.stock_value().cents(), 222_000);

        let all = repo.view_all_products().await.unwrap();
        assert_eq!(all, vec![item.clone()]);
        assert_eq!(repo.count_items().await.unwrap(), 1);
        assert_eq!(repo.get_item(item.id).await.unwrap(), Some(item));
    }

    #[tokio::test]
    async fn test_add_item_rejects_negative_stock() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let err = db.inventory().add_item(drops(-1)).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_adjust_quantity_never_below_zero() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.inventory();
        let item = repo.add_item(drops(5)).await.unwrap();

        assert_eq!(repo.adjust_quantity(item.id, -3).await.unwrap().quantity, 2);
        assert_eq!(repo.adjust_quantity(item.id, 10).await.unwrap().quantity, 12);

        let err = repo.adjust_quantity(item.id, -13).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 12, requested: 13, .. })
        ));
        assert_eq!(repo.get_item(item.id).await.unwrap().unwrap().quantity, 12);

        assert!(repo.adjust_quantity(999, 1).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_adjust_quantity_at_i64_bounds() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.inventory();
        let item = repo.add_item(drops(5)).await.unwrap();

        let err = repo.adjust_quantity(item.id, i64::MAX).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::Validation(ValidationError::InvalidFormat { ref field, .. }))
                if field == "quantity"
        ));

        let err = repo.adjust_quantity(item.id, i64::MIN).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { available: 5, requested: i64::MAX, .. })
        ));

        assert_eq!(repo.get_item(item.id).await.unwrap().unwrap().quantity, 5);
    }

    #[tokio::test]
    async fn test_archive_and_restore_item() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.inventory();
        let item = repo.add_item(drops(4)).await.unwrap();

        repo.archive_item(item.id).await.unwrap();
        assert!(repo.list_items().await.unwrap().is_empty());
        assert_eq!(repo.list_archived().await.unwrap().len(), 1);

        assert_eq!(repo.restore(item.id).await.unwrap(), item);
        assert!(repo.restore(item.id).await.unwrap_err().is_not_found());
    }
}
