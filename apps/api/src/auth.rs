//! # Caller Identity
//!
//! Authentication happens upstream: the fronting auth proxy validates the
//! session and forwards the result as headers.
//!
//! ```text
//! x-user-id:    identity provider user id      (optional)
//! x-user-role:  admin | vendedor | anonimo     (missing/unknown → anonimo)
//! x-tenant-id:  tenant                         (missing → default tenant)
//! ```
//!
//! Handlers take a [`Caller`] and call one of the role checks before doing
//! any work.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use mostrador_core::{Role, DEFAULT_TENANT_ID};

use crate::error::{ApiError, ApiResult};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLE_HEADER: &str = "x-user-role";
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// Who is calling, as forwarded by the auth proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Option<String>,
    pub role: Role,
    pub tenant_id: String,
}

impl Caller {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        Caller {
            user_id: header(USER_ID_HEADER),
            role: header(USER_ROLE_HEADER)
                .map(|r| Role::from_claim(&r))
                .unwrap_or_default(),
            tenant_id: header(TENANT_ID_HEADER).unwrap_or_else(|| DEFAULT_TENANT_ID.to_string()),
        }
    }

    /// Fails with 403 unless the caller holds one of `allowed`.
    pub fn require(&self, allowed: &[Role]) -> ApiResult<()> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            tracing::debug!(role = self.role.as_str(), "Role check failed");
            Err(ApiError::forbidden(format!(
                "role '{}' may not perform this action",
                self.role.as_str()
            )))
        }
    }

    /// Admin or vendedor.
    pub fn require_staff(&self) -> ApiResult<()> {
        self.require(&[Role::Admin, Role::Vendedor])
    }

    pub fn require_admin(&self) -> ApiResult<()> {
        self.require(&[Role::Admin])
    }
}

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(caller) = parts.extensions.get::<Caller>() {
            return Ok(caller.clone());
        }
        let caller = Caller::from_headers(&parts.headers);
        parts.extensions.insert(caller.clone());
        Ok(caller)
    }
}
