//! # Sales Repository
//!
//! Over-the-counter retail: the optical product catalogue, sales and the
//! per-category sales report.
//!
//! ## Sale Creation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  create_sale("Walk-in", [line, line, ...])                             │
//! │       │                                                                 │
//! │       │  customer required, ≥ 1 line, quantities > 0                    │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    INSERT sales (total = Σ qty × unit price)                            │
//! │    for each line:                                                       │
//! │      stock ≥ qty?  no → InsufficientStock (rolled back)                 │
//! │      INSERT sale_items                                                  │
//! │      UPDATE sales_products SET quantity = quantity - qty                │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use clinic_core::validation::{
    optional_text, validate_amount, validate_quantity, validate_required, validate_stock_quantity,
};
use clinic_core::{
    sale_total, CategorySalesSummary, CoreError, NewSalesProduct, Sale, SaleItemDetail, SaleLine,
    SalesProduct,
};

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct SalesRepository {
    pool: SqlitePool,
}

impl SalesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SalesRepository { pool }
    }

    // -------------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------------

    pub async fn add_product(&self, form: NewSalesProduct) -> DbResult<SalesProduct> {
        let (name, category) = validate_product(&form)?;

        debug!(name = %name, category = %category, "Adding product");

        let product = sqlx::query_as::<_, SalesProduct>(
            r#"
            INSERT INTO sales_products (name, category, description, price_cents, quantity)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING *
            "#,
        )
        .bind(&name)
        .bind(&category)
        .bind(optional_text(form.description))
        .bind(form.price.cents())
        .bind(form.quantity)
        .fetch_one(&self.pool)
        .await?;

        info!(id = product.id, "Product added");
        Ok(product)
    }

    /// Whole catalogue by category, then name.
    pub async fn get_all_products(&self) -> DbResult<Vec<SalesProduct>> {
        let products =
            sqlx::query_as::<_, SalesProduct>("SELECT * FROM sales_products ORDER BY category, name")
                .fetch_all(&self.pool)
                .await?;
        Ok(products)
    }

    /// Same as [`Self::get_all_products`].
    pub async fn list_products(&self) -> DbResult<Vec<SalesProduct>> {
        self.get_all_products().await
    }

    pub async fn get_product(&self, id: i64) -> DbResult<Option<SalesProduct>> {
        let product = sqlx::query_as::<_, SalesProduct>("SELECT * FROM sales_products WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    pub async fn get_products_by_category(&self, category: &str) -> DbResult<Vec<SalesProduct>> {
        let products = sqlx::query_as::<_, SalesProduct>(
            "SELECT * FROM sales_products WHERE category = ?1 ORDER BY name",
        )
        .bind(category.trim())
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    pub async fn update_product(&self, id: i64, form: NewSalesProduct) -> DbResult<SalesProduct> {
        let (name, category) = validate_product(&form)?;

        let product = sqlx::query_as::<_, SalesProduct>(
            r#"
            UPDATE sales_products SET
                name = ?2, category = ?3, description = ?4, price_cents = ?5, quantity = ?6
            WHERE id = ?1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&name)
        .bind(&category)
        .bind(optional_text(form.description))
        .bind(form.price.cents())
        .bind(form.quantity)
        .fetch_optional(&self.pool)
        .await?;

        product.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product. Products that appear on a sale can't be deleted.
    pub async fn delete_product(&self, id: i64) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM sales_products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id, "Product deleted");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Sales
    // -------------------------------------------------------------------------

    /// Records a sale, its items and the stock decrement atomically.
    pub async fn create_sale(&self, customer_name: &str, lines: &[SaleLine]) -> DbResult<Sale> {
        let customer_name = validate_required(customer_name, "customer_name")?;

        if lines.is_empty() {
            return Err(CoreError::EmptySale.into());
        }
        for line in lines {
            validate_quantity(line.quantity)?;
            validate_amount(line.unit_price, "unit_price")?;
        }

        let total = sale_total(lines)?;
        debug!(customer = %customer_name, lines = lines.len(), total = %total, "Creating sale");

        let mut tx = self.pool.begin().await?;

        let sale = sqlx::query_as::<_, Sale>(
            "INSERT INTO sales (customer_name, total_cents, sale_date) VALUES (?1, ?2, ?3) RETURNING *",
        )
        .bind(&customer_name)
        .bind(total.cents())
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await?;

        for line in lines {
            let product = sqlx::query_as::<_, SalesProduct>("SELECT * FROM sales_products WHERE id = ?1")
                .bind(line.product_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("Product", line.product_id))?;

            if product.quantity < line.quantity {
                warn!(
                    product_id = product.id,
                    available = product.quantity,
                    requested = line.quantity,
                    "Sale rejected: insufficient stock"
                );
                return Err(CoreError::InsufficientStock {
                    product: product.name,
                    available: product.quantity,
                    requested: line.quantity,
                }
                .into());
            }

            sqlx::query(
                r#"
                INSERT INTO sale_items (sale_id, product_id, quantity, unit_price_cents)
                VALUES (?1, ?2, ?3, ?4)
                "#,
            )
            .bind(sale.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price.cents())
            .execute(&mut *tx)
            .await?;

            sqlx::query("UPDATE sales_products SET quantity = quantity - ?2 WHERE id = ?1")
                .bind(line.product_id)
                .bind(line.quantity)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        info!(id = sale.id, total = %total, "Sale recorded");
        Ok(sale)
    }

    /// All sales, newest first.
    pub async fn get_all_sales(&self) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>("SELECT * FROM sales ORDER BY sale_date DESC, id DESC")
            .fetch_all(&self.pool)
            .await?;
        Ok(sales)
    }

    pub async fn get_sale(&self, id: i64) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sale)
    }

    /// Items of a sale with product names.
    pub async fn get_sale_details(&self, sale_id: i64) -> DbResult<Vec<SaleItemDetail>> {
        let items = sqlx::query_as::<_, SaleItemDetail>(
            r#"
            SELECT si.*, sp.name AS product_name
            FROM sale_items si
            JOIN sales_products sp ON sp.id = si.product_id
            WHERE si.sale_id = ?1
            ORDER BY si.id
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn count_sales(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Catalogue summary per category: products, units on hand, average price.
    pub async fn get_sales_report(&self) -> DbResult<Vec<CategorySalesSummary>> {
        let rows = sqlx::query_as::<_, CategorySalesSummary>(
            r#"
            SELECT
                category,
                COUNT(*) AS product_count,
                COALESCE(SUM(quantity), 0) AS total_quantity,
                CAST(ROUND(AVG(price_cents)) AS INTEGER) AS average_price_cents
            FROM sales_products
            GROUP BY category
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

fn validate_product(form: &NewSalesProduct) -> DbResult<(String, String)> {
    let name = validate_required(&form.name, "name")?;
    let category = validate_required(&form.category, "category")?;
    validate_amount(form.price, "price")?;
    validate_stock_quantity(form.quantity)?;
    Ok((name, category))
}
