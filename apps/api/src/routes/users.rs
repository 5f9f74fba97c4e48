//! # Users API
//!
//! Users are mirrored from the identity provider the first time they record
//! a sale. Admins can list them and change their role.
//!
//! - GET /api/users
//! - PUT /api/users/{id}/role   `{ "role": "admin" | "vendedor" | "anonimo" }`

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};
use mostrador_core::{Role, User, ValidationError};
use serde::Deserialize;
use tracing::info;

use crate::auth::Caller;
use crate::error::{extract_json, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    pub role: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}/role", put(set_role))
}

async fn list_users(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<Vec<User>>> {
    caller.require_admin()?;
    Ok(Json(state.db.users(&caller.tenant_id).list().await?))
}

async fn set_role(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<RoleRequest>, JsonRejection>,
) -> ApiResult<Json<User>> {
    caller.require_admin()?;
    let req = extract_json(body)?;
    let raw = req
        .role
        .as_deref()
        .ok_or_else(|| ValidationError::required("role"))?;
    let role = Role::parse(raw).ok_or_else(|| ValidationError::NotAllowed {
        field: "role".to_string(),
        allowed: [Role::Admin, Role::Vendedor, Role::Anonimo]
            .iter()
            .map(|r| r.as_str().to_string())
            .collect(),
    })?;

    let user = state.db.users(&caller.tenant_id).set_role(&id, role).await?;
    info!(user = %id, role = role.as_str(), by = ?caller.user_id, "Role changed");
    Ok(Json(user))
}
