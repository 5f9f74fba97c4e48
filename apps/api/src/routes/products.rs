//! # Products API
//!
//! Routes:
//! - GET    /api/products              catalog, `?search=&category_id=`
//! - POST   /api/products              create (admin)
//! - GET    /api/products/{id}
//! - PUT    /api/products/{id}         partial update (admin)
//! - DELETE /api/products/{id}         409 while sales reference it (admin)
//! - POST   /api/products/{id}/stock   signed stock adjustment (admin)
//! - GET    /api/products/{id}/price   margin, USD and ARS sale prices
//!
//! Numbers in bodies may be JSON numbers or strings in either `1234.56`
//! or `1.234,56` form.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use mostrador_core::lenient::{try_integer, try_money};
use mostrador_core::pricing::{margin_for, price_breakdown, PriceBreakdown};
use mostrador_core::validation::{
    normalize_optional, validate_name, validate_non_negative, validate_required_name,
    validate_stock,
};
use mostrador_core::{CatalogEntry, CoreError, ValidationError};
use mostrador_db::{Database, NewProduct, ProductFilter, ProductUpdate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::double_option;
use crate::auth::Caller;
use crate::error::{extract_json, ApiResult};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: Option<String>,
    pub cost: Option<Value>,
    pub stock: Option<Value>,
    pub category_id: Option<String>,
    pub image_url: Option<String>,
}

/// Absent fields are left alone; `null` clears `category_id`/`image_url`.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub cost: Option<Value>,
    pub stock: Option<Value>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustment {
    /// Units to add (positive) or remove (negative).
    pub delta: Option<Value>,
}

/// Response of `GET /api/products/{id}/price`.
#[derive(Debug, Serialize)]
pub struct ProductPrice {
    pub product_id: String,
    pub name: String,
    #[serde(flatten)]
    pub breakdown: PriceBreakdown,
}

// =============================================================================
// Router
// =============================================================================

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/products/{id}/stock", post(adjust_stock))
        .route("/products/{id}/price", get(product_price))
}

async fn ensure_category(db: &Database, tenant_id: &str, id: Option<&str>) -> ApiResult<()> {
    if let Some(id) = id {
        if db.categories(tenant_id).get(id).await?.is_none() {
            return Err(CoreError::CategoryNotFound(id.to_string()).into());
        }
    }
    Ok(())
}

async fn load(state: &AppState, tenant_id: &str, id: &str) -> ApiResult<CatalogEntry> {
    let entry = state
        .db
        .products(tenant_id)
        .get(id)
        .await?
        .ok_or_else(|| CoreError::ProductNotFound(id.to_string()))?;
    Ok(entry)
}

// =============================================================================
// Handlers
// =============================================================================

async fn list_products(
    State(state): State<AppState>,
    caller: Caller,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<CatalogEntry>>> {
    caller.require_staff()?;
    let filter = ProductFilter {
        search: normalize_optional(query.search.as_deref()),
        category_id: normalize_optional(query.category_id.as_deref()),
    };
    let products = state.db.products(&caller.tenant_id).list(&filter).await?;
    Ok(Json(products))
}

async fn create_product(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<CreateProductRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<CatalogEntry>)> {
    caller.require_admin()?;
    let req = extract_json(body)?;

    let name = validate_required_name("name", req.name.as_deref())?;
    let cost = try_money("cost", req.cost.as_ref())?.unwrap_or_default();
    validate_non_negative("cost", cost)?;
    let stock = try_integer("stock", req.stock.as_ref())?.unwrap_or(0);
    validate_stock("stock", stock)?;
    let category_id = normalize_optional(req.category_id.as_deref());
    ensure_category(&state.db, &caller.tenant_id, category_id.as_deref()).await?;

    let products = state.db.products(&caller.tenant_id);
    let product = products
        .create(&NewProduct {
            name: name.to_string(),
            cost,
            stock,
            category_id,
            image_url: normalize_optional(req.image_url.as_deref()),
        })
        .await?;

    let entry = load(&state, &caller.tenant_id, &product.id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn get_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<CatalogEntry>> {
    caller.require_staff()?;
    Ok(Json(load(&state, &caller.tenant_id, &id).await?))
}

async fn update_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> ApiResult<Json<CatalogEntry>> {
    caller.require_admin()?;
    let req = extract_json(body)?;

    let name = match req.name.as_deref() {
        Some(name) => Some(validate_name("name", name)?.to_string()),
        None => None,
    };
    let cost = try_money("cost", req.cost.as_ref())?;
    if let Some(cost) = cost {
        validate_non_negative("cost", cost)?;
    }
    let stock = try_integer("stock", req.stock.as_ref())?;
    if let Some(stock) = stock {
        validate_stock("stock", stock)?;
    }
    let category_id = req
        .category_id
        .map(|c| normalize_optional(c.as_deref()));
    if let Some(Some(category_id)) = &category_id {
        ensure_category(&state.db, &caller.tenant_id, Some(category_id)).await?;
    }

    let changes = ProductUpdate {
        name,
        cost,
        stock,
        category_id,
        image_url: req.image_url.map(|u| normalize_optional(u.as_deref())),
    };
    let entry = state
        .db
        .products(&caller.tenant_id)
        .update(&id, &changes)
        .await?;
    Ok(Json(entry))
}

async fn delete_product(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    caller.require_admin()?;
    state.db.products(&caller.tenant_id).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn adjust_stock(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<StockAdjustment>, JsonRejection>,
) -> ApiResult<Json<CatalogEntry>> {
    caller.require_admin()?;
    let req = extract_json(body)?;
    let delta = try_integer("delta", req.delta.as_ref())?
        .ok_or_else(|| ValidationError::required("delta"))?;

    let entry = load(&state, &caller.tenant_id, &id).await?;
    let applied = state
        .db
        .products(&caller.tenant_id)
        .adjust_stock(&id, delta)
        .await?;
    if !applied {
        return Err(CoreError::InsufficientStock {
            product: entry.product.name,
            available: entry.product.stock,
            requested: -delta,
        }
        .into());
    }

    Ok(Json(load(&state, &caller.tenant_id, &id).await?))
}

async fn product_price(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<ProductPrice>> {
    caller.require_staff()?;
    let entry = load(&state, &caller.tenant_id, &id).await?;
    let default_margin = state
        .db
        .settings(&caller.tenant_id)
        .default_margin()
        .await?;
    let margin = margin_for(entry.category_margin, default_margin);
    let rate = state.rates.sell_rate().await;
    let breakdown = price_breakdown(entry.product.cost, margin, rate);
    debug!(id = %id, usd = %breakdown.usd_price, ars = %breakdown.ars_price, "Priced product");

    Ok(Json(ProductPrice {
        product_id: entry.product.id,
        name: entry.product.name,
        breakdown,
    }))
}
