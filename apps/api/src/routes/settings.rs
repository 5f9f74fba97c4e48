//! # Settings API
//!
//! - GET /api/settings   current global default margin (staff)
//! - PUT /api/settings   set it (admin)

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use mostrador_core::lenient::try_margin;
use mostrador_core::{Settings, ValidationError};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::Caller;
use crate::error::{extract_json, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SettingsRequest {
    /// Fraction in `[0, 1]`.
    pub default_margin: Option<Value>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/settings", get(get_settings).put(update_settings))
}

async fn get_settings(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Settings>> {
    caller.require_staff()?;
    Ok(Json(state.db.settings(&caller.tenant_id).get().await?))
}

async fn update_settings(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<SettingsRequest>, JsonRejection>,
) -> ApiResult<Json<Settings>> {
    caller.require_admin()?;
    let req = extract_json(body)?;
    let margin = try_margin("default_margin", req.default_margin.as_ref())?
        .ok_or_else(|| ValidationError::required("default_margin"))?;

    let settings = state
        .db
        .settings(&caller.tenant_id)
        .set_default_margin(margin)
        .await?;
    Ok(Json(settings))
}
