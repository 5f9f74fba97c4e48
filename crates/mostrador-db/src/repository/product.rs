//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Stock Movements
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OPERATION            SQL                                    CALLER     │
//! │  ─────────────────    ────────────────────────────────────   ────────   │
//! │  decrement_stock      SET stock = stock - ?                  sale line  │
//! │                       WHERE ... AND stock >= ?                          │
//! │  increment_stock      SET stock = stock + ?                  sale edit  │
//! │  receive_purchase     SET stock = stock + ?, cost = landed   purchase   │
//! │  adjust_stock         SET stock = stock + delta              admin      │
//! │                       WHERE ... AND stock + delta >= 0                  │
//! │                                                                         │
//! │  The WHERE guard makes each decrement atomic against concurrent sales; │
//! │  the CHECK (stock >= 0) constraint backs it up.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use mostrador_core::{CatalogEntry, Money, Product};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{new_id, now};
use crate::error::{DbError, DbResult};

/// Columns selected for [`CatalogEntry`].
const CATALOG_SELECT: &str = r#"
    SELECT
        p.id, p.tenant_id, p.name, p.cost_cents, p.stock, p.category_id,
        p.image_url, p.created_at, p.updated_at,
        c.name AS category_name,
        c.profit_margin_bps AS category_margin_bps
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id
"#;

// =============================================================================
// Inputs
// =============================================================================

/// Fields for a new product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub cost: Money,
    pub stock: i64,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
}

/// Partial update; `None` leaves a field untouched.
///
/// The nested options on `category_id`/`image_url` distinguish "leave
/// alone" (`None`) from "clear" (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub cost: Option<Money>,
    pub stock: Option<i64>,
    pub category_id: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
}

/// Catalog listing filter.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
    pub category_id: Option<String>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl ProductRepository {
    /// Creates a new ProductRepository scoped to a tenant.
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        ProductRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    /// Lists products with their category name and margin.
    pub async fn list(&self, filter: &ProductFilter) -> DbResult<Vec<CatalogEntry>> {
        let search = filter
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));

        debug!(search = ?search, category = ?filter.category_id, "Listing products");

        let sql = format!(
            "{CATALOG_SELECT}
            WHERE p.tenant_id = ?1
              AND (?2 IS NULL OR lower(p.name) LIKE ?2)
              AND (?3 IS NULL OR p.category_id = ?3)
            ORDER BY p.name"
        );
        let products = sqlx::query_as::<_, CatalogEntry>(&sql)
            .bind(&self.tenant_id)
            .bind(search)
            .bind(filter.category_id.as_deref())
            .fetch_all(&self.pool)
            .await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product with its category fields.
    pub async fn get(&self, id: &str) -> DbResult<Option<CatalogEntry>> {
        let sql = format!("{CATALOG_SELECT} WHERE p.tenant_id = ?1 AND p.id = ?2");
        let entry = sqlx::query_as::<_, CatalogEntry>(&sql)
            .bind(&self.tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(entry)
    }

    /// Finds a product by exact name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, tenant_id, name, cost_cents, stock, category_id, image_url,
                   created_at, updated_at
            FROM products
            WHERE tenant_id = ?1 AND name = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Current stock level, `None` if the product doesn't exist.
    pub async fn stock_of(&self, id: &str) -> DbResult<Option<i64>> {
        let stock = sqlx::query_scalar::<_, i64>(
            "SELECT stock FROM products WHERE tenant_id = ?1 AND id = ?2",
        )
        .bind(&self.tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stock)
    }

    /// Creates a product.
    ///
    /// ## Errors
    /// - `UniqueViolation { field: "name" }` when the name is taken
    /// - `ForeignKeyViolation` when `category_id` doesn't exist
    pub async fn create(&self, new: &NewProduct) -> DbResult<Product> {
        let ts = now();
        let product = Product {
            id: new_id(),
            tenant_id: self.tenant_id.clone(),
            name: new.name.clone(),
            cost: new.cost,
            stock: new.stock,
            category_id: new.category_id.clone(),
            image_url: new.image_url.clone(),
            created_at: ts,
            updated_at: ts,
        };

        sqlx::query(
            r#"
            INSERT INTO products
                (id, tenant_id, name, cost_cents, stock, category_id, image_url, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.name)
        .bind(product.cost)
        .bind(product.stock)
        .bind(&product.category_id)
        .bind(&product.image_url)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("name", &new.name))?;

        info!(id = %product.id, name = %product.name, "Product created");
        Ok(product)
    }

    /// Applies a partial update and returns the fresh row.
    pub async fn update(&self, id: &str, changes: &ProductUpdate) -> DbResult<CatalogEntry> {
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?
            .product;

        let name = changes.name.clone().unwrap_or(current.name);
        let cost = changes.cost.unwrap_or(current.cost);
        let stock = changes.stock.unwrap_or(current.stock);
        let category_id = changes.category_id.clone().unwrap_or(current.category_id);
        let image_url = changes.image_url.clone().unwrap_or(current.image_url);

        sqlx::query(
            r#"
            UPDATE products
            SET name = ?3, cost_cents = ?4, stock = ?5, category_id = ?6, image_url = ?7,
                updated_at = ?8
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(id)
        .bind(&name)
        .bind(cost)
        .bind(stock)
        .bind(&category_id)
        .bind(&image_url)
        .bind(now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("name", &name))?;

        info!(id = %id, "Product updated");
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// ## Errors
    /// - `ForeignKeyViolation` when sale items still reference it
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE tenant_id = ?1 AND id = ?2")
            .bind(&self.tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(id = %id, "Product deleted");
        Ok(())
    }

    // =========================================================================
    // Stock
    // =========================================================================

    /// Takes `qty` units out of stock if at least that many remain.
    ///
    /// ## Returns
    /// * `Ok(true)` - Stock decremented
    /// * `Ok(false)` - Not enough stock (or no such product); nothing changed
    pub async fn decrement_stock(&self, id: &str, qty: i64) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?3, updated_at = ?4
            WHERE tenant_id = ?1 AND id = ?2 AND stock >= ?3
            "#,
        )
        .bind(&self.tenant_id)
        .bind(id)
        .bind(qty)
        .bind(now())
        .execute(&self.pool)
        .await?;

        let applied = result.rows_affected() == 1;
        debug!(id = %id, qty, applied, "Decrement stock");
        Ok(applied)
    }

    /// Puts `qty` units back into stock.
    pub async fn increment_stock(&self, id: &str, qty: i64) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?3, updated_at = ?4
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(id)
        .bind(qty)
        .bind(now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        debug!(id = %id, qty, "Increment stock");
        Ok(())
    }

    /// Applies a signed manual adjustment.
    ///
    /// ## Returns
    /// * `Ok(true)` - Applied
    /// * `Ok(false)` - Would drive stock below zero; nothing changed
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?3, updated_at = ?4
            WHERE tenant_id = ?1 AND id = ?2 AND stock + ?3 >= 0
            "#,
        )
        .bind(&self.tenant_id)
        .bind(id)
        .bind(delta)
        .bind(now())
        .execute(&self.pool)
        .await?;

        let applied = result.rows_affected() == 1;
        info!(id = %id, delta, applied, "Stock adjusted");
        Ok(applied)
    }

    /// Records received goods: adds stock, sets the landed cost and, when
    /// given, the category.
    pub async fn receive_purchase(
        &self,
        id: &str,
        qty: i64,
        landed_cost: Money,
        category_id: Option<&str>,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?3,
                cost_cents = ?4,
                category_id = COALESCE(?5, category_id),
                updated_at = ?6
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(id)
        .bind(qty)
        .bind(landed_cost)
        .bind(category_id)
        .bind(now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        debug!(id = %id, qty, cost = landed_cost.cents(), "Purchase received");
        Ok(())
    }

    /// Products with `stock <= threshold`, lowest first.
    pub async fn low_stock(&self, threshold: i64) -> DbResult<Vec<CatalogEntry>> {
        let sql = format!(
            "{CATALOG_SELECT} WHERE p.tenant_id = ?1 AND p.stock <= ?2 ORDER BY p.stock, p.name"
        );
        let products = sqlx::query_as::<_, CatalogEntry>(&sql)
            .bind(&self.tenant_id)
            .bind(threshold)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Number of products in the tenant's catalog.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE tenant_id = ?1")
            .bind(&self.tenant_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::super::test_support::{test_db, TENANT};
    use super::*;
    use mostrador_core::Margin;

    fn new_product(name: &str, cents: i64, stock: i64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            cost: Money::from_cents(cents),
            stock,
            category_id: None,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_with_category() {
        let db = test_db().await;
        let cat = db
            .categories(TENANT)
            .create("Infusiones", Some(Margin::from_bps(2500)))
            .await
            .unwrap();

        let mut new = new_product("Yerba 1kg", 350, 10);
        new.category_id = Some(cat.id.clone());
        let product = db.products(TENANT).create(&new).await.unwrap();

        let entry = db.products(TENANT).get(&product.id).await.unwrap().unwrap();
        assert_eq!(entry.product.cost, Money::from_cents(350));
        assert_eq!(entry.category_name.as_deref(), Some("Infusiones"));
        assert_eq!(entry.category_margin, Some(Margin::from_bps(2500)));
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;
        let repo = db.products(TENANT);
        repo.create(&new_product("Yerba 1kg", 350, 1)).await.unwrap();

        let err = repo.create(&new_product("Yerba 1kg", 400, 1)).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;
        let repo = db.products(TENANT);
        repo.create(&new_product("Yerba 1kg", 350, 1)).await.unwrap();
        repo.create(&new_product("Yerba 500g", 200, 1)).await.unwrap();
        repo.create(&new_product("Azúcar", 100, 1)).await.unwrap();

        let filter = ProductFilter {
            search: Some("yerba".to_string()),
            ..Default::default()
        };
        assert_eq!(repo.list(&filter).await.unwrap().len(), 2);
        assert_eq!(repo.list(&ProductFilter::default()).await.unwrap().len(), 3);
        assert_eq!(repo.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = test_db().await;
        let repo = db.products(TENANT);
        let p = repo.create(&new_product("Yerba 1kg", 350, 4)).await.unwrap();

        let updated = repo
            .update(
                &p.id,
                &ProductUpdate {
                    cost: Some(Money::from_cents(400)),
                    image_url: Some(Some("yerba.png".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.product.name, "Yerba 1kg");
        assert_eq!(updated.product.cost.cents(), 400);
        assert_eq!(updated.product.stock, 4);
        assert_eq!(updated.product.image_url.as_deref(), Some("yerba.png"));

        assert!(matches!(
            repo.update("missing", &ProductUpdate::default()).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_decrement_is_conditional() {
        let db = test_db().await;
        let repo = db.products(TENANT);
        let p = repo.create(&new_product("Yerba 1kg", 350, 3)).await.unwrap();

        assert!(repo.decrement_stock(&p.id, 2).await.unwrap());
        assert!(!repo.decrement_stock(&p.id, 2).await.unwrap());
        assert_eq!(repo.stock_of(&p.id).await.unwrap(), Some(1));

        assert!(repo.decrement_stock(&p.id, 1).await.unwrap());
        assert_eq!(repo.stock_of(&p.id).await.unwrap(), Some(0));
        assert!(!repo.decrement_stock("missing", 1).await.unwrap());
    }

    #[tokio::test]
    async fn test_increment_and_adjust() {
        let db = test_db().await;
        let repo = db.products(TENANT);
        let p = repo.create(&new_product("Yerba 1kg", 350, 3)).await.unwrap();

        repo.increment_stock(&p.id, 5).await.unwrap();
        assert_eq!(repo.stock_of(&p.id).await.unwrap(), Some(8));

        assert!(repo.adjust_stock(&p.id, -8).await.unwrap());
        assert!(!repo.adjust_stock(&p.id, -1).await.unwrap());
        assert_eq!(repo.stock_of(&p.id).await.unwrap(), Some(0));

        assert!(matches!(
            repo.increment_stock("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_negative_stock_blocked_by_constraint() {
        let db = test_db().await;
        let repo = db.products(TENANT);
        let p = repo.create(&new_product("Yerba 1kg", 350, 1)).await.unwrap();

        let err = repo
            .update(
                &p.id,
                &ProductUpdate {
                    stock: Some(-1),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_receive_purchase_and_low_stock() {
        let db = test_db().await;
        let repo = db.products(TENANT);
        let a = repo.create(&new_product("Yerba 1kg", 350, 0)).await.unwrap();
        repo.create(&new_product("Azúcar", 100, 20)).await.unwrap();

        let low = repo.low_stock(5).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].product.id, a.id);

        repo.receive_purchase(&a.id, 10, Money::from_cents(420), None)
            .await
            .unwrap();
        let entry = repo.get(&a.id).await.unwrap().unwrap();
        assert_eq!(entry.product.stock, 10);
        assert_eq!(entry.product.cost.cents(), 420);
        assert!(repo.low_stock(5).await.unwrap().is_empty());
    }
}
