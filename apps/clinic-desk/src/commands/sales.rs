//! # Sales Commands
//!
//! The retail counter: optical products and walk-in sales.
//!
//! ## Sale Flow
//! ```text
//! clinic sale create --customer "Walk-in" --item 3:1 --item 9:2
//!      │
//!      ▼
//! look up each product's current price ──► SaleLine { id, qty, price }
//!      │
//!      ▼
//! SalesRepository::create_sale (one transaction)
//!      ├── sale row, total = Σ qty × price
//!      ├── sale_items rows
//!      └── stock decrement (INSUFFICIENT_STOCK rolls everything back)
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use clinic_core::validation::validate_quantity;
use clinic_core::{
    CategorySalesSummary, Money, NewSalesProduct, Sale, SaleItemDetail, SaleLine, SalesProduct,
    ValidationError,
};

use crate::error::ApiError;
use crate::state::DbState;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductForm {
    pub name: String,
    pub category: String,
    pub description: Option<String>,
    pub price: String,
    pub quantity: i64,
}

/// One line of a sale as entered: product and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemInput {
    pub product_id: i64,
    pub quantity: i64,
}

/// `"<product id>:<quantity>"`, or a bare product id for quantity 1.
impl FromStr for SaleItemInput {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, qty) = s.trim().split_once(':').unwrap_or((s.trim(), "1"));
        let product_id = id
            .trim()
            .parse()
            .map_err(|_| ValidationError::invalid("product_id", format!("'{}' is not an id", id)))?;
        let quantity = qty
            .trim()
            .parse()
            .map_err(|_| ValidationError::invalid("quantity", format!("'{}' is not a number", qty)))?;
        validate_quantity(quantity)?;
        Ok(SaleItemInput { product_id, quantity })
    }
}

/// A sale with its line items, as shown on the receipt.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleReceipt {
    pub sale: Sale,
    pub items: Vec<SaleItemDetail>,
}

pub async fn add_product(db: &DbState, form: ProductForm) -> Result<SalesProduct, ApiError> {
    let product = NewSalesProduct {
        name: form.name,
        category: form.category,
        description: form.description,
        price: Money::parse(&form.price)?,
        quantity: form.quantity,
    };
    Ok(db.inner().sales().add_product(product).await?)
}

pub async fn list_products(db: &DbState, category: Option<&str>) -> Result<Vec<SalesProduct>, ApiError> {
    let sales = db.inner().sales();
    match category {
        Some(category) => Ok(sales.get_products_by_category(category).await?),
        None => Ok(sales.get_all_products().await?),
    }
}

/// Sells products at their current catalogue price.
pub async fn create_sale(
    db: &DbState,
    customer_name: &str,
    items: &[SaleItemInput],
) -> Result<Sale, ApiError> {
    let sales = db.inner().sales();

    let mut lines = Vec::with_capacity(items.len());
    for item in items {
        let product = sales
            .get_product(item.product_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Product", item.product_id))?;
        lines.push(SaleLine {
            product_id: product.id,
            quantity: item.quantity,
            unit_price: product.price(),
        });
    }

    debug!(customer = %customer_name, lines = lines.len(), "create_sale command");
    let sale = sales.create_sale(customer_name, &lines).await?;
    info!(id = sale.id, total = %sale.total(), "Sale completed");
    Ok(sale)
}

pub async fn list_sales(db: &DbState) -> Result<Vec<Sale>, ApiError> {
    Ok(db.inner().sales().get_all_sales().await?)
}

pub async fn sale_receipt(db: &DbState, id: i64) -> Result<SaleReceipt, ApiError> {
    let sales = db.inner().sales();
    let sale = sales
        .get_sale(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", id))?;
    let items = sales.get_sale_details(id).await?;
    Ok(SaleReceipt { sale, items })
}

pub async fn sales_report(db: &DbState) -> Result<Vec<CategorySalesSummary>, ApiError> {
    Ok(db.inner().sales().get_sales_report().await?)
}
