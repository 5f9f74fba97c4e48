//! # Purchase Orders API
//!
//! Routes (admin):
//! - GET    /api/orders           purchase records, newest first
//! - POST   /api/orders           receive an order (see [`crate::services::purchases`])
//! - POST   /api/orders/preview   proration only, nothing is written
//! - DELETE /api/orders/{id}      remove a record, taking its units back out of stock

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use mostrador_core::PurchaseOrder;
use serde::Serialize;

use crate::auth::Caller;
use crate::error::{extract_json, ApiResult};
use crate::services::purchases::{
    PurchasePreview, PurchaseReceipt, PurchaseRequest, PurchaseService,
};
use crate::state::AppState;

/// Result of deleting a purchase record.
#[derive(Debug, Serialize)]
pub struct DeletedOrder {
    pub order: PurchaseOrder,
    /// False when current stock was below the order quantity, in which case
    /// stock was left untouched.
    pub stock_subtracted: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_orders).post(receive_order))
        .route("/orders/preview", post(preview_order))
        .route("/orders/{id}", delete(delete_order))
}

async fn list_orders(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<PurchaseOrder>>> {
    caller.require_admin()?;
    let orders = state.db.orders(&caller.tenant_id).list().await?;
    Ok(Json(orders))
}

async fn receive_order(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<PurchaseRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<PurchaseReceipt>)> {
    caller.require_admin()?;
    let req = extract_json(body)?;
    let receipt = PurchaseService::new(&state, &caller.tenant_id)
        .receive(&req)
        .await?;
    Ok((StatusCode::CREATED, Json(receipt)))
}

async fn preview_order(
    caller: Caller,
    body: Result<Json<PurchaseRequest>, JsonRejection>,
) -> ApiResult<Json<PurchasePreview>> {
    caller.require_admin()?;
    let req = extract_json(body)?;
    Ok(Json(PurchaseService::preview(&req)?))
}

async fn delete_order(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<DeletedOrder>> {
    caller.require_admin()?;
    let (order, stock_subtracted) = state
        .db
        .orders(&caller.tenant_id)
        .delete_with_stock(&id)
        .await?;
    Ok(Json(DeletedOrder {
        order,
        stock_subtracted,
    }))
}
