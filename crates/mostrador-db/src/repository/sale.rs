//! # Sale Repository
//!
//! Database operations for sales and sale items.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE                                                             │
//! │     └── (service decrements stock line by line)                        │
//! │     └── insert() → sale row + items in one transaction                 │
//! │                                                                         │
//! │  2. UPDATE                                                             │
//! │     └── (service restores stock for the old items)                     │
//! │     └── delete_items()                                                 │
//! │     └── (service re-runs the line loop)                                │
//! │     └── save_update() → header + new items in one transaction          │
//! │                                                                         │
//! │  3. DELETE                                                             │
//! │     └── delete_restoring_stock() → ONE transaction:                    │
//! │         load sale + items, stock += quantity per item, delete sale     │
//! │         (items cascade). 15 s acquire budget, 15 s body budget.        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use mostrador_core::{Sale, SaleItem, SaleWithItems};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};

const SALE_COLUMNS: &str = "id, tenant_id, total_cents, total_ars, payment_method, customer_id, \
                            user_id, exchange_rate_centi, created_at, updated_at";

const ITEM_COLUMNS: &str =
    "id, sale_id, product_id, product_name, quantity, selling_price_cents, ars_price";

/// Sale listing filter; all bounds optional.
#[derive(Debug, Clone, Default)]
pub struct SaleFilter {
    /// Inclusive lower bound on `created_at`.
    pub from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub to: Option<DateTime<Utc>>,
    pub customer_id: Option<String>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl SaleRepository {
    /// Creates a new SaleRepository scoped to a tenant.
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        SaleRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets a sale header by id.
    pub async fn get_sale(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE tenant_id = ?1 AND id = ?2");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(&self.tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets the items of a sale in insertion order.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid");
        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    /// Gets a sale with its items.
    pub async fn get(&self, id: &str) -> DbResult<Option<SaleWithItems>> {
        let Some(sale) = self.get_sale(id).await? else {
            return Ok(None);
        };
        let items = self.items(id).await?;
        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Lists sales newest first, with items.
    pub async fn list(&self, filter: &SaleFilter) -> DbResult<Vec<SaleWithItems>> {
        const WHERE: &str = "s.tenant_id = ?1
              AND (?2 IS NULL OR s.created_at >= ?2)
              AND (?3 IS NULL OR s.created_at < ?3)
              AND (?4 IS NULL OR s.customer_id = ?4)";

        let sales_sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales s WHERE {WHERE} ORDER BY s.created_at DESC"
        );
        let sales = sqlx::query_as::<_, Sale>(&sales_sql)
            .bind(&self.tenant_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.customer_id.as_deref())
            .fetch_all(&self.pool)
            .await?;

        let items_sql = format!(
            "SELECT si.id, si.sale_id, si.product_id, si.product_name, si.quantity,
                    si.selling_price_cents, si.ars_price
             FROM sale_items si
             JOIN sales s ON s.id = si.sale_id
             WHERE {WHERE}
             ORDER BY si.rowid"
        );
        let items = sqlx::query_as::<_, SaleItem>(&items_sql)
            .bind(&self.tenant_id)
            .bind(filter.from)
            .bind(filter.to)
            .bind(filter.customer_id.as_deref())
            .fetch_all(&self.pool)
            .await?;

        let mut by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id.clone()).or_default().push(item);
        }

        debug!(count = sales.len(), "Listed sales");
        Ok(sales
            .into_iter()
            .map(|sale| {
                let items = by_sale.remove(&sale.id).unwrap_or_default();
                SaleWithItems { sale, items }
            })
            .collect())
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Inserts a sale and its items in one transaction.
    pub async fn insert(&self, sale: &SaleWithItems) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        insert_header(&mut tx, &sale.sale).await?;
        insert_items(&mut tx, &sale.items).await?;
        tx.commit().await?;

        info!(
            id = %sale.sale.id,
            items = sale.items.len(),
            total_cents = sale.sale.total.cents(),
            "Sale created"
        );
        Ok(())
    }

    /// Removes every item of a sale (stock is the caller's concern).
    pub async fn delete_items(&self, sale_id: &str) -> DbResult<u64> {
        let result = sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Persists an edited sale: header fields and the new item set.
    pub async fn save_update(&self, sale: &SaleWithItems) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE sales
            SET total_cents = ?3, total_ars = ?4, payment_method = ?5, customer_id = ?6,
                exchange_rate_centi = ?7, updated_at = ?8
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(&sale.sale.id)
        .bind(sale.sale.total)
        .bind(sale.sale.total_ars)
        .bind(sale.sale.payment_method)
        .bind(&sale.sale.customer_id)
        .bind(sale.sale.exchange_rate)
        .bind(sale.sale.updated_at)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Sale", &sale.sale.id));
        }

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(&sale.sale.id)
            .execute(&mut *tx)
            .await?;
        insert_items(&mut tx, &sale.items).await?;
        tx.commit().await?;

        info!(id = %sale.sale.id, items = sale.items.len(), "Sale updated");
        Ok(())
    }

    /// Deletes a sale and restores stock for all its items, atomically.
    ///
    /// ## Arguments
    /// * `acquire_timeout` - Maximum wait for a connection to start the transaction
    /// * `timeout` - Maximum duration of the transaction body
    ///
    /// ## Returns
    /// The deleted sale, as it was before deletion.
    ///
    /// ## Errors
    /// - `NotFound` - No such sale; nothing changed
    /// - `Timeout` - Budget exceeded; the transaction is rolled back
    pub async fn delete_restoring_stock(
        &self,
        id: &str,
        acquire_timeout: Duration,
        timeout: Duration,
    ) -> DbResult<SaleWithItems> {
        let tx = tokio::time::timeout(acquire_timeout, self.pool.begin())
            .await
            .map_err(|_| DbError::Timeout(acquire_timeout))??;

        match tokio::time::timeout(timeout, self.delete_in_tx(tx, id)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(id = %id, "Sale deletion timed out; rolled back");
                Err(DbError::Timeout(timeout))
            }
        }
    }

    async fn delete_in_tx(&self, mut tx: Transaction<'_, Sqlite>, id: &str) -> DbResult<SaleWithItems> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE tenant_id = ?1 AND id = ?2");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(&self.tenant_id)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        let sql = format!("SELECT {ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY rowid");
        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(id)
            .fetch_all(&mut *tx)
            .await?;

        for item in &items {
            sqlx::query(
                "UPDATE products SET stock = stock + ?3, updated_at = ?4
                 WHERE tenant_id = ?1 AND id = ?2",
            )
            .bind(&self.tenant_id)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(Utc::now())
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("DELETE FROM sales WHERE tenant_id = ?1 AND id = ?2")
            .bind(&self.tenant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, items = items.len(), "Sale deleted, stock restored");
        Ok(SaleWithItems { sale, items })
    }
}

async fn insert_header(tx: &mut Transaction<'_, Sqlite>, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales
            (id, tenant_id, total_cents, total_ars, payment_method, customer_id, user_id,
             exchange_rate_centi, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.tenant_id)
    .bind(sale.total)
    .bind(sale.total_ars)
    .bind(sale.payment_method)
    .bind(&sale.customer_id)
    .bind(&sale.user_id)
    .bind(sale.exchange_rate)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_items(tx: &mut Transaction<'_, Sqlite>, items: &[SaleItem]) -> DbResult<()> {
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO sale_items
                (id, sale_id, product_id, product_name, quantity, selling_price_cents, ars_price)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item.id)
        .bind(&item.sale_id)
        .bind(&item.product_id)
        .bind(&item.product_name)
        .bind(item.quantity)
        .bind(item.selling_price)
        .bind(item.ars_price)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::super::test_support::{test_db, TENANT};
    use super::*;
    use crate::repository::product::NewProduct;
    use crate::Database;
    use mostrador_core::{ExchangeRate, Money, PaymentMethod, Pesos};
    use uuid::Uuid;

    async fn product(db: &Database, name: &str, stock: i64) -> String {
        db.products(TENANT)
            .create(&NewProduct {
                name: name.to_string(),
                cost: Money::from_cents(1000),
                stock,
                category_id: None,
                image_url: None,
            })
            .await
            .unwrap()
            .id
    }

    fn sale_with(items: &[(&str, i64)]) -> SaleWithItems {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let items: Vec<SaleItem> = items
            .iter()
            .map(|(product_id, qty)| SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: id.clone(),
                product_id: product_id.to_string(),
                product_name: "x".to_string(),
                quantity: *qty,
                selling_price: Money::from_cents(1200),
                ars_price: Pesos::new(15_000),
            })
            .collect();
        SaleWithItems {
            sale: Sale {
                id,
                tenant_id: TENANT.to_string(),
                total: items.iter().map(|i| i.line_total()).sum(),
                total_ars: items.iter().map(|i| i.line_total_ars()).sum(),
                payment_method: PaymentMethod::Efectivo,
                customer_id: None,
                user_id: Some("user-1".to_string()),
                exchange_rate: Some(ExchangeRate::from_hundredths(125_000)),
                created_at: now,
                updated_at: now,
            },
            items,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let p = product(&db, "Yerba", 5).await;
        let sale = sale_with(&[(&p, 2)]);

        db.sales(TENANT).insert(&sale).await.unwrap();

        let fetched = db.sales(TENANT).get(&sale.sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(fetched.sale.total.cents(), 2400);
        assert_eq!(fetched.sale.total_ars.amount(), 30_000);
        assert_eq!(fetched.sale.payment_method, PaymentMethod::Efectivo);
        assert_eq!(
            fetched.sale.exchange_rate,
            Some(ExchangeRate::from_hundredths(125_000))
        );
    }

    #[tokio::test]
    async fn test_other_tenant_cannot_see_sale() {
        let db = test_db().await;
        let p = product(&db, "Yerba", 5).await;
        let sale = sale_with(&[(&p, 1)]);
        db.sales(TENANT).insert(&sale).await.unwrap();

        assert!(db.sales("tenant-b").get(&sale.sale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filters_and_groups_items() {
        let db = test_db().await;
        let a = product(&db, "Yerba", 10).await;
        let b = product(&db, "Azúcar", 10).await;

        let first = sale_with(&[(&a, 1), (&b, 2)]);
        db.sales(TENANT).insert(&first).await.unwrap();
        let mut second = sale_with(&[(&b, 1)]);
        second.sale.created_at = first.sale.created_at + chrono::Duration::hours(1);
        db.sales(TENANT).insert(&second).await.unwrap();

        let all = db.sales(TENANT).list(&SaleFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].sale.id, second.sale.id);
        assert_eq!(all[1].items.len(), 2);

        let later = db
            .sales(TENANT)
            .list(&SaleFilter {
                from: Some(first.sale.created_at + chrono::Duration::minutes(30)),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(later.len(), 1);
        assert_eq!(later[0].items.len(), 1);
    }

    #[tokio::test]
    async fn test_save_update_replaces_items() {
        let db = test_db().await;
        let a = product(&db, "Yerba", 10).await;
        let b = product(&db, "Azúcar", 10).await;
        let mut sale = sale_with(&[(&a, 1), (&b, 1)]);
        db.sales(TENANT).insert(&sale).await.unwrap();

        let replacement = sale_with(&[(&b, 3)]);
        sale.items = replacement
            .items
            .into_iter()
            .map(|mut i| {
                i.sale_id = sale.sale.id.clone();
                i
            })
            .collect();
        sale.sale.total = Money::from_cents(3600);
        sale.sale.payment_method = PaymentMethod::Transferencia;
        db.sales(TENANT).save_update(&sale).await.unwrap();

        let fetched = db.sales(TENANT).get(&sale.sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.items.len(), 1);
        assert_eq!(fetched.items[0].quantity, 3);
        assert_eq!(fetched.sale.total.cents(), 3600);
        assert_eq!(fetched.sale.payment_method, PaymentMethod::Transferencia);
    }

    #[tokio::test]
    async fn test_delete_restores_stock_and_cascades() {
        let db = test_db().await;
        let a = product(&db, "Yerba", 3).await;
        let sale = sale_with(&[(&a, 2)]);
        db.sales(TENANT).insert(&sale).await.unwrap();

        let deleted = db
            .sales(TENANT)
            .delete_restoring_stock(&sale.sale.id, Duration::from_secs(15), Duration::from_secs(15))
            .await
            .unwrap();
        assert_eq!(deleted.items.len(), 1);

        assert_eq!(db.products(TENANT).stock_of(&a).await.unwrap(), Some(5));
        assert!(db.sales(TENANT).get(&sale.sale.id).await.unwrap().is_none());
        assert!(db.sales(TENANT).items(&sale.sale.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_missing_sale_is_not_found() {
        let db = test_db().await;
        let err = db
            .sales(TENANT)
            .delete_restoring_stock("missing", Duration::from_secs(1), Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_product_in_sale_cannot_be_deleted() {
        let db = test_db().await;
        let a = product(&db, "Yerba", 3).await;
        db.sales(TENANT).insert(&sale_with(&[(&a, 1)])).await.unwrap();

        let err = db.products(TENANT).delete(&a).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
