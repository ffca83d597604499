//! # Inventory Commands
//!
//! Clinic supplies and equipment (not the retail catalogue, see
//! [`super::sales`]).

use serde::Deserialize;
use tracing::info;

use clinic_core::{InventoryItem, Money, NewInventoryItem};

use crate::error::ApiError;
use crate::state::DbState;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemForm {
    pub item_name: String,
    pub category: String,
    pub quantity: i64,
    pub unit_price: String,
    pub supplier: Option<String>,
}

pub async fn add_item(db: &DbState, form: ItemForm) -> Result<InventoryItem, ApiError> {
    let item = NewInventoryItem {
        item_name: form.item_name,
        category: form.category,
        quantity: form.quantity,
        unit_price: Money::parse(&form.unit_price)?,
        supplier: form.supplier,
    };

    let item = db.inner().inventory().add_item(item).await?;
    info!(id = item.id, item = %item.item_name, "Inventory item added");
    Ok(item)
}

pub async fn list_items(db: &DbState) -> Result<Vec<InventoryItem>, ApiError> {
    Ok(db.inner().inventory().view_all_products().await?)
}

/// Receives (`delta > 0`) or withdraws (`delta < 0`) stock.
pub async fn adjust_stock(db: &DbState, id: i64, delta: i64) -> Result<InventoryItem, ApiError> {
    if delta == 0 {
        return Err(ApiError::validation("Stock adjustment cannot be zero"));
    }
    let item = db.inner().inventory().adjust_quantity(id, delta).await?;
    info!(id, delta, quantity = item.quantity, "Stock adjusted");
    Ok(item)
}

pub async fn archive_item(db: &DbState, id: i64) -> Result<(), ApiError> {
    db.inner().inventory().archive_item(id).await?;
    info!(id, "Inventory item archived");
    Ok(())
}
