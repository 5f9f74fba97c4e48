//! # Reports API
//!
//! Routes (admin):
//! - GET /api/stats/summary        `?from=&to=`
//! - GET /api/stats/top-products   `?from=&to=&limit=` (default 10, max 100)
//! - GET /api/stats/low-stock      `?threshold=` (default 5)

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use mostrador_core::{CatalogEntry, ProductSales, SalesSummary};
use mostrador_db::DateRange;
use serde::Deserialize;

use super::DateQuery;
use crate::auth::Caller;
use crate::error::ApiResult;
use crate::state::AppState;

pub const DEFAULT_TOP_LIMIT: i64 = 10;
pub const MAX_TOP_LIMIT: i64 = 100;
pub const DEFAULT_LOW_STOCK: i64 = 5;

#[derive(Debug, Default, Deserialize)]
pub struct TopQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stats/summary", get(summary))
        .route("/stats/top-products", get(top_products))
        .route("/stats/low-stock", get(low_stock))
}

async fn summary(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<DateQuery>,
) -> ApiResult<Json<SalesSummary>> {
    caller.require_admin()?;
    let (from, to) = query.bounds()?;
    let summary = state
        .db
        .stats(&caller.tenant_id)
        .summary(&DateRange { from, to })
        .await?;
    Ok(Json(summary))
}

async fn top_products(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<TopQuery>,
) -> ApiResult<Json<Vec<ProductSales>>> {
    caller.require_admin()?;
    let dates = DateQuery {
        from: query.from,
        to: query.to,
    };
    let (from, to) = dates.bounds()?;
    let limit = query
        .limit
        .unwrap_or(DEFAULT_TOP_LIMIT)
        .clamp(1, MAX_TOP_LIMIT);

    let top = state
        .db
        .stats(&caller.tenant_id)
        .top_products(&DateRange { from, to }, limit)
        .await?;
    Ok(Json(top))
}

async fn low_stock(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<LowStockQuery>,
) -> ApiResult<Json<Vec<CatalogEntry>>> {
    caller.require_admin()?;
    let threshold = query.threshold.unwrap_or(DEFAULT_LOW_STOCK).max(0);
    let products = state
        .db
        .products(&caller.tenant_id)
        .low_stock(threshold)
        .await?;
    Ok(Json(products))
}
