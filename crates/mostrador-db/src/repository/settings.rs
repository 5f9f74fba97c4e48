//! # Settings Repository
//!
//! One row per tenant holding the global default margin. The migration
//! seeds the default tenant; other tenants fall back to
//! [`DEFAULT_MARGIN_BPS`] until their first write.

use mostrador_core::{Margin, Settings, DEFAULT_MARGIN_BPS};
use sqlx::SqlitePool;
use tracing::info;

use super::now;
use crate::error::DbResult;

/// Repository for the per-tenant settings row.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        SettingsRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    /// Returns the tenant's settings, or the defaults if never written.
    pub async fn get(&self) -> DbResult<Settings> {
        let settings = sqlx::query_as::<_, Settings>(
            "SELECT tenant_id, default_margin_bps, updated_at FROM settings WHERE tenant_id = ?1",
        )
        .bind(&self.tenant_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(settings.unwrap_or_else(|| Settings {
            tenant_id: self.tenant_id.clone(),
            default_margin: Margin::from_bps(DEFAULT_MARGIN_BPS),
            updated_at: now(),
        }))
    }

    /// Shortcut for the margin pricing needs.
    pub async fn default_margin(&self) -> DbResult<Margin> {
        Ok(self.get().await?.default_margin)
    }

    /// Sets the global default margin.
    pub async fn set_default_margin(&self, margin: Margin) -> DbResult<Settings> {
        let ts = now();
        sqlx::query(
            r#"
            INSERT INTO settings (tenant_id, default_margin_bps, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(tenant_id) DO UPDATE
            SET default_margin_bps = excluded.default_margin_bps,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.tenant_id)
        .bind(margin)
        .bind(ts)
        .execute(&self.pool)
        .await?;

        info!(margin_bps = margin.bps(), "Default margin updated");
        Ok(Settings {
            tenant_id: self.tenant_id.clone(),
            default_margin: margin,
            updated_at: ts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{test_db, TENANT};
    use super::*;

    #[tokio::test]
    async fn test_seeded_default_margin() {
        let db = test_db().await;
        let settings = db.settings(TENANT).get().await.unwrap();
        assert_eq!(settings.default_margin, Margin::from_bps(3000));
    }

    #[tokio::test]
    async fn test_unknown_tenant_gets_default() {
        let db = test_db().await;
        let margin = db.settings("tenant-b").default_margin().await.unwrap();
        assert_eq!(margin.bps(), DEFAULT_MARGIN_BPS);
    }

    #[tokio::test]
    async fn test_set_default_margin_upserts() {
        let db = test_db().await;
        db.settings(TENANT)
            .set_default_margin(Margin::from_bps(4500))
            .await
            .unwrap();
        db.settings("tenant-b")
            .set_default_margin(Margin::from_bps(1000))
            .await
            .unwrap();

        assert_eq!(db.settings(TENANT).default_margin().await.unwrap().bps(), 4500);
        assert_eq!(db.settings("tenant-b").default_margin().await.unwrap().bps(), 1000);
    }
}
