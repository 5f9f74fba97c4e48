//! # User Repository
//!
//! Users are owned by the identity provider; this table only mirrors the
//! ones seen by the back-office so admins can list them and assign roles.

use mostrador_core::{Role, User};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::now;
use crate::error::DbResult;

/// Repository for known users.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl UserRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        UserRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, tenant_id, name, email, role, created_at, updated_at
            FROM users
            WHERE tenant_id = ?1
            ORDER BY created_at
            "#,
        )
        .bind(&self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, tenant_id, name, email, role, created_at, updated_at
            FROM users
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Records a user the first time they act; an existing row is untouched.
    pub async fn ensure_exists(&self, id: &str, role: Role) -> DbResult<()> {
        let ts = now();
        let result = sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, name, email, role, created_at, updated_at)
            VALUES (?1, ?2, NULL, NULL, ?3, ?4, ?4)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(id)
        .bind(&self.tenant_id)
        .bind(role)
        .bind(ts)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            debug!(id = %id, role = role.as_str(), "User registered");
        }
        Ok(())
    }

    /// Assigns a role, creating the user row if needed.
    pub async fn set_role(&self, id: &str, role: Role) -> DbResult<User> {
        let ts = now();
        sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, name, email, role, created_at, updated_at)
            VALUES (?1, ?2, NULL, NULL, ?3, ?4, ?4)
            ON CONFLICT(id) DO UPDATE
            SET role = excluded.role, updated_at = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(&self.tenant_id)
        .bind(role)
        .bind(ts)
        .execute(&self.pool)
        .await?;

        info!(id = %id, role = role.as_str(), "User role set");
        let user = self.get(id).await?;
        user.ok_or_else(|| crate::DbError::not_found("User", id))
    }
}
