//! # Categories API
//!
//! Routes:
//! - GET    /api/categories       list, by name
//! - POST   /api/categories       create (admin)
//! - GET    /api/categories/{id}
//! - PUT    /api/categories/{id}  replace name and margin (admin)
//! - DELETE /api/categories/{id}  products are detached, not deleted (admin)

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use mostrador_core::lenient::try_margin;
use mostrador_core::validation::validate_required_name;
use mostrador_core::{Category, CoreError, Margin};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::Caller;
use crate::error::{extract_json, ApiResult};
use crate::state::AppState;

/// Body for create and update. `profit_margin` is a fraction in `[0, 1]`;
/// absent or null means "use the global default".
#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: Option<String>,
    pub profit_margin: Option<Value>,
}

impl CategoryRequest {
    fn validate(&self) -> ApiResult<(&str, Option<Margin>)> {
        let name = validate_required_name("name", self.name.as_deref())?;
        let margin = try_margin("profit_margin", self.profit_margin.as_ref())?;
        Ok((name, margin))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category).put(update_category).delete(delete_category),
        )
}

async fn list_categories(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<Category>>> {
    caller.require_staff()?;
    let categories = state.db.categories(&caller.tenant_id).list().await?;
    Ok(Json(categories))
}

async fn create_category(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<CategoryRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    caller.require_admin()?;
    let req = extract_json(body)?;
    let (name, margin) = req.validate()?;

    let category = state
        .db
        .categories(&caller.tenant_id)
        .create(name, margin)
        .await?;
    Ok((StatusCode::CREATED, Json(category)))
}

async fn get_category(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    caller.require_staff()?;
    let category = state
        .db
        .categories(&caller.tenant_id)
        .get(&id)
        .await?
        .ok_or(CoreError::CategoryNotFound(id))?;
    Ok(Json(category))
}

async fn update_category(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<CategoryRequest>, JsonRejection>,
) -> ApiResult<Json<Category>> {
    caller.require_admin()?;
    let req = extract_json(body)?;
    let (name, margin) = req.validate()?;

    let category = state
        .db
        .categories(&caller.tenant_id)
        .update(&id, name, margin)
        .await?;
    Ok(Json(category))
}

async fn delete_category(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    caller.require_admin()?;
    state.db.categories(&caller.tenant_id).delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
