//! # Sales API
//!
//! Routes:
//! - GET    /api/sales        `?from=&to=&customer_id=`, newest first
//! - POST   /api/sales        create, decrements stock line by line
//! - GET    /api/sales/{id}
//! - PUT    /api/sales/{id}   restore stock, then re-apply the new lines
//! - DELETE /api/sales/{id}   restore stock in one transaction (admin)
//!
//! The stock bookkeeping lives in [`crate::services::sales`].

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use mostrador_core::validation::normalize_optional;
use mostrador_core::{CoreError, SaleWithItems};
use mostrador_db::SaleFilter;
use serde::Deserialize;

use crate::auth::Caller;
use crate::error::{extract_json, ApiResult};
use crate::services::sales::{SaleRequest, SaleService};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub from: Option<String>,
    pub to: Option<String>,
    pub customer_id: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route(
            "/sales/{id}",
            get(get_sale).put(update_sale).delete(delete_sale),
        )
}

async fn list_sales(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<SaleWithItems>>> {
    caller.require_staff()?;
    let dates = super::DateQuery {
        from: query.from,
        to: query.to,
    };
    let (from, to) = dates.bounds()?;
    let filter = SaleFilter {
        from,
        to,
        customer_id: normalize_optional(query.customer_id.as_deref()),
    };

    let sales = state.db.sales(&caller.tenant_id).list(&filter).await?;
    Ok(Json(sales))
}

async fn create_sale(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<SaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaleWithItems>)> {
    caller.require_staff()?;
    let req = extract_json(body)?;
    let sale = SaleService::new(&state, &caller.tenant_id)
        .create(&req, &caller)
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

async fn get_sale(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleWithItems>> {
    caller.require_staff()?;
    let sale = state
        .db
        .sales(&caller.tenant_id)
        .get(&id)
        .await?
        .ok_or(CoreError::SaleNotFound(id))?;
    Ok(Json(sale))
}

async fn update_sale(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<SaleRequest>, JsonRejection>,
) -> ApiResult<Json<SaleWithItems>> {
    caller.require_staff()?;
    let req = extract_json(body)?;
    let sale = SaleService::new(&state, &caller.tenant_id)
        .update(&id, &req, &caller)
        .await?;
    Ok(Json(sale))
}

async fn delete_sale(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    caller.require_admin()?;
    SaleService::new(&state, &caller.tenant_id).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
