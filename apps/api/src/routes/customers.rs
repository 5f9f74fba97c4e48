//! # Customers API
//!
//! Routes (admin or vendedor):
//! - GET    /api/customers        `?search=` matches name or any handle
//! - POST   /api/customers
//! - GET    /api/customers/{id}
//! - PUT    /api/customers/{id}   replaces all contact fields
//! - DELETE /api/customers/{id}

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use mostrador_core::validation::{normalize_optional, validate_name};
use mostrador_core::{CoreError, Customer, NewCustomer};
use serde::Deserialize;

use crate::auth::Caller;
use crate::error::{extract_json, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
}

fn clean(req: NewCustomer) -> ApiResult<NewCustomer> {
    let name = validate_name("name", &req.name)?.to_string();
    Ok(NewCustomer {
        name,
        whatsapp: normalize_optional(req.whatsapp.as_deref()),
        instagram: normalize_optional(req.instagram.as_deref()),
        facebook: normalize_optional(req.facebook.as_deref()),
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}

async fn list_customers(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Customer>>> {
    caller.require_staff()?;
    let customers = state
        .db
        .customers(&caller.tenant_id)
        .list(query.search.as_deref())
        .await?;
    Ok(Json(customers))
}

async fn create_customer(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<NewCustomer>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    caller.require_staff()?;
    let req = clean(extract_json(body)?)?;
    let customer = state.db.customers(&caller.tenant_id).create(&req).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

async fn get_customer(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Customer>> {
    caller.require_staff()?;
    let customer = state
        .db
        .customers(&caller.tenant_id)
        .get(&id)
        .await?
        .ok_or(CoreError::CustomerNotFound(id))?;
    Ok(Json(customer))
}

async fn update_customer(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<NewCustomer>, JsonRejection>,
) -> ApiResult<Json<Customer>> {
    caller.require_staff()?;
    let req = clean(extract_json(body)?)?;
    let customer = state
        .db
        .customers(&caller.tenant_id)
        .update(&id, &req)
        .await?;
    Ok(Json(customer))
}

async fn delete_customer(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    caller.require_staff()?;
    state.db.customers(&caller.tenant_id).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
