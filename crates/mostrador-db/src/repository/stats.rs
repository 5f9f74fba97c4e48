//! # Stats Repository
//!
//! Read-only reporting aggregates.
//!
//! ```text
//! sales ──┬── COUNT(*), SUM(total_cents), SUM(total_ars)  ──► revenue
//!         │
//!         └── sale_items ── products.cost_cents
//!                 SUM(quantity), SUM(quantity × cost)     ──► cost of goods
//! ```
//!
//! Cost of goods uses each product's *current* cost; no historical cost
//! snapshot is kept on sale items.

use chrono::{DateTime, Utc};
use mostrador_core::{Money, Pesos, ProductSales, SalesSummary};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Optional `[from, to)` bounds on `sales.created_at`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

/// Repository for reporting queries.
#[derive(Debug, Clone)]
pub struct StatsRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl StatsRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        StatsRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    /// Totals over the sales in `range`.
    pub async fn summary(&self, range: &DateRange) -> DbResult<SalesSummary> {
        let (sale_count, revenue, revenue_ars): (i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*), COALESCE(SUM(total_cents), 0), COALESCE(SUM(total_ars), 0)
            FROM sales
            WHERE tenant_id = ?1
              AND (?2 IS NULL OR created_at >= ?2)
              AND (?3 IS NULL OR created_at < ?3)
            "#,
        )
        .bind(&self.tenant_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_one(&self.pool)
        .await?;

        let (units_sold, cost_of_goods): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(si.quantity), 0),
                   COALESCE(SUM(si.quantity * p.cost_cents), 0)
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            JOIN products p ON p.id = si.product_id
            WHERE s.tenant_id = ?1
              AND (?2 IS NULL OR s.created_at >= ?2)
              AND (?3 IS NULL OR s.created_at < ?3)
            "#,
        )
        .bind(&self.tenant_id)
        .bind(range.from)
        .bind(range.to)
        .fetch_one(&self.pool)
        .await?;

        let revenue = Money::from_cents(revenue);
        let cost_of_goods = Money::from_cents(cost_of_goods);

        debug!(sale_count, units_sold, "Computed sales summary");
        Ok(SalesSummary {
            sale_count,
            revenue,
            revenue_ars: Pesos::new(revenue_ars),
            units_sold,
            cost_of_goods,
            gross_profit: revenue - cost_of_goods,
        })
    }

    /// Best sellers by units, ties broken by revenue then name.
    pub async fn top_products(&self, range: &DateRange, limit: i64) -> DbResult<Vec<ProductSales>> {
        let rows = sqlx::query_as::<_, ProductSales>(
            r#"
            SELECT si.product_id AS product_id,
                   MAX(si.product_name) AS product_name,
                   SUM(si.quantity) AS units_sold,
                   SUM(si.quantity * si.selling_price_cents) AS revenue_cents
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.tenant_id = ?1
              AND (?2 IS NULL OR s.created_at >= ?2)
              AND (?3 IS NULL OR s.created_at < ?3)
            GROUP BY si.product_id
            ORDER BY units_sold DESC, revenue_cents DESC, product_name
            LIMIT ?4
            "#,
        )
        .bind(&self.tenant_id)
        .bind(range.from)
        .bind(range.to)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
