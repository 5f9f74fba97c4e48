//! # Order Repository
//!
//! Purchase order records. One row per received purchase line; the stock
//! and cost side effects live on [`ProductRepository::receive_purchase`].
//!
//! [`ProductRepository::receive_purchase`]: crate::ProductRepository::receive_purchase

use mostrador_core::PurchaseOrder;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};

const ORDER_COLUMNS: &str = "id, tenant_id, product_id, product_name, quantity, supplier, \
                             shipping_cost_cents, unit_cost_cents, landed_unit_cost_cents, created_at";

/// Repository for purchase order records.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        OrderRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    /// Stores a purchase order record.
    pub async fn insert(&self, order: &PurchaseOrder) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders
                (id, tenant_id, product_id, product_name, quantity, supplier,
                 shipping_cost_cents, unit_cost_cents, landed_unit_cost_cents, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&order.id)
        .bind(&order.tenant_id)
        .bind(&order.product_id)
        .bind(&order.product_name)
        .bind(order.quantity)
        .bind(&order.supplier)
        .bind(order.shipping_cost)
        .bind(order.unit_cost)
        .bind(order.landed_unit_cost)
        .bind(order.created_at)
        .execute(&self.pool)
        .await?;

        info!(
            id = %order.id,
            product = %order.product_name,
            qty = order.quantity,
            "Purchase order recorded"
        );
        Ok(())
    }

    /// Lists orders newest first.
    pub async fn list(&self) -> DbResult<Vec<PurchaseOrder>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = ?1 ORDER BY created_at DESC, rowid DESC"
        );
        let orders = sqlx::query_as::<_, PurchaseOrder>(&sql)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(orders)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<PurchaseOrder>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = ?1 AND id = ?2");
        let order = sqlx::query_as::<_, PurchaseOrder>(&sql)
            .bind(&self.tenant_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(order)
    }

    /// Deletes an order record and takes its quantity back out of stock.
    ///
    /// The stock decrement is conditional: if the goods were already sold
    /// the record is still removed and stock is left untouched.
    ///
    /// ## Returns
    /// The deleted order and whether stock was reduced.
    pub async fn delete_with_stock(&self, id: &str) -> DbResult<(PurchaseOrder, bool)> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE tenant_id = ?1 AND id = ?2");
        let order = sqlx::query_as::<_, PurchaseOrder>(&sql)
            .bind(&self.tenant_id)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))?;

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?3, updated_at = ?4
            WHERE tenant_id = ?1 AND id = ?2 AND stock >= ?3
            "#,
        )
        .bind(&self.tenant_id)
        .bind(&order.product_id)
        .bind(order.quantity)
        .bind(super::now())
        .execute(&mut *tx)
        .await?;
        let subtracted = result.rows_affected() == 1;

        sqlx::query("DELETE FROM orders WHERE tenant_id = ?1 AND id = ?2")
            .bind(&self.tenant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if !subtracted {
            warn!(id = %id, product = %order.product_id, "Order deleted without stock reversal");
        }
        info!(id = %id, subtracted, "Purchase order deleted");
        Ok((order, subtracted))
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{test_db, TENANT};
    use super::*;
    use crate::repository::product::NewProduct;
    use chrono::Utc;
    use mostrador_core::Money;

    async fn setup(stock: i64) -> (crate::Database, PurchaseOrder) {
        let db = test_db().await;
        let product = db
            .products(TENANT)
            .create(&NewProduct {
                name: "Yerba 1kg".to_string(),
                cost: Money::from_cents(300),
                stock,
                category_id: None,
                image_url: None,
            })
            .await
            .unwrap();
        let order = PurchaseOrder {
            id: uuid::Uuid::new_v4().to_string(),
            tenant_id: TENANT.to_string(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            quantity: 4,
            supplier: Some("Distribuidora Sur".to_string()),
            shipping_cost: Money::from_cents(200),
            unit_cost: Money::from_cents(300),
            landed_unit_cost: Money::from_cents(350),
            created_at: Utc::now(),
        };
        db.orders(TENANT).insert(&order).await.unwrap();
        (db, order)
    }

    #[tokio::test]
    async fn test_insert_list_get() {
        let (db, order) = setup(4).await;
        let all = db.orders(TENANT).list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].landed_unit_cost.cents(), 350);

        let fetched = db.orders(TENANT).get(&order.id).await.unwrap().unwrap();
        assert_eq!(fetched.supplier.as_deref(), Some("Distribuidora Sur"));
        assert!(db.orders("tenant-b").get(&order.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_subtracts_stock() {
        let (db, order) = setup(10).await;
        let (_, subtracted) = db.orders(TENANT).delete_with_stock(&order.id).await.unwrap();
        assert!(subtracted);
        assert_eq!(db.products(TENANT).stock_of(&order.product_id).await.unwrap(), Some(6));
        assert!(db.orders(TENANT).list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_keeps_stock_when_already_sold() {
        let (db, order) = setup(1).await;
        let (_, subtracted) = db.orders(TENANT).delete_with_stock(&order.id).await.unwrap();
        assert!(!subtracted);
        assert_eq!(db.products(TENANT).stock_of(&order.product_id).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_delete_missing() {
        let db = test_db().await;
        assert!(matches!(
            db.orders(TENANT).delete_with_stock("nope").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
