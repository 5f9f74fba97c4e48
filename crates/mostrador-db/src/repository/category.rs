//! # Category Repository
//!
//! Categories carry the optional margin override used by pricing.
//!
//! ## Lookup-or-Create
//! ```text
//! purchase line ──► CategoryRef::ById(id)      ──► get(id) or NotFound
//!               └─► CategoryRef::ByName(name)  ──► find_by_name(name)
//!                                                    │
//!                                                    └─ none? create(name, None)
//! ```

use mostrador_core::{Category, CategoryRef, Margin};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{new_id, now};
use crate::error::{DbError, DbResult};

/// Repository for category database operations.
#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl CategoryRepository {
    /// Creates a new CategoryRepository scoped to a tenant.
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        CategoryRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    /// Lists all categories ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, tenant_id, name, profit_margin_bps, created_at, updated_at
            FROM categories
            WHERE tenant_id = ?1
            ORDER BY name
            "#,
        )
        .bind(&self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = categories.len(), "Listed categories");
        Ok(categories)
    }

    /// Gets a category by id.
    pub async fn get(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, tenant_id, name, profit_margin_bps, created_at, updated_at
            FROM categories
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Finds a category by exact name.
    pub async fn find_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, tenant_id, name, profit_margin_bps, created_at, updated_at
            FROM categories
            WHERE tenant_id = ?1 AND name = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Creates a category.
    ///
    /// ## Errors
    /// - `UniqueViolation { field: "name" }` when the name is taken
    pub async fn create(&self, name: &str, profit_margin: Option<Margin>) -> DbResult<Category> {
        let ts = now();
        let category = Category {
            id: new_id(),
            tenant_id: self.tenant_id.clone(),
            name: name.to_string(),
            profit_margin,
            created_at: ts,
            updated_at: ts,
        };

        sqlx::query(
            r#"
            INSERT INTO categories (id, tenant_id, name, profit_margin_bps, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&category.id)
        .bind(&category.tenant_id)
        .bind(&category.name)
        .bind(category.profit_margin)
        .bind(category.created_at)
        .bind(category.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("name", name))?;

        info!(id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Replaces a category's name and margin.
    pub async fn update(
        &self,
        id: &str,
        name: &str,
        profit_margin: Option<Margin>,
    ) -> DbResult<Category> {
        let result = sqlx::query(
            r#"
            UPDATE categories
            SET name = ?3, profit_margin_bps = ?4, updated_at = ?5
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(id)
        .bind(name)
        .bind(profit_margin)
        .bind(now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).on_duplicate("name", name))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        info!(id = %id, "Category updated");
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// Deletes a category. Products in it are detached (`ON DELETE SET NULL`).
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE tenant_id = ?1 AND id = ?2")
            .bind(&self.tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        info!(id = %id, "Category deleted");
        Ok(())
    }

    /// Resolves a purchase line's category, creating it by name if needed.
    pub async fn resolve(&self, category: &CategoryRef) -> DbResult<Category> {
        match category {
            CategoryRef::ById(id) => self
                .get(id)
                .await?
                .ok_or_else(|| DbError::not_found("Category", id)),
            CategoryRef::ByName(name) => {
                if let Some(existing) = self.find_by_name(name).await? {
                    return Ok(existing);
                }
                debug!(name = %name, "Creating category from purchase line");
                self.create(name, None).await
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::super::test_support::{test_db, TENANT};
    use super::*;
    use crate::repository::product::NewProduct;
    use mostrador_core::Money;

    #[tokio::test]
    async fn test_create_and_list() {
        let db = test_db().await;
        let repo = db.categories(TENANT);

        repo.create("Bebidas", Some(Margin::from_bps(2000))).await.unwrap();
        repo.create("Almacén", None).await.unwrap();

        let all = repo.list().await.unwrap();
        let names: Vec<&str> = all.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Almacén", "Bebidas"]);
        assert_eq!(all[1].profit_margin, Some(Margin::from_bps(2000)));
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = test_db().await;
        let repo = db.categories(TENANT);

        repo.create("Bebidas", None).await.unwrap();
        let err = repo.create("Bebidas", None).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "name"));
    }

    #[tokio::test]
    async fn test_same_name_in_other_tenant_allowed() {
        let db = test_db().await;
        db.categories(TENANT).create("Bebidas", None).await.unwrap();
        db.categories("tenant-b").create("Bebidas", None).await.unwrap();

        assert_eq!(db.categories("tenant-b").list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;
        let repo = db.categories(TENANT);
        let cat = repo.create("Bebidas", None).await.unwrap();

        let updated = repo
            .update(&cat.id, "Bebidas frías", Some(Margin::from_bps(4000)))
            .await
            .unwrap();
        assert_eq!(updated.name, "Bebidas frías");
        assert_eq!(updated.profit_margin, Some(Margin::from_bps(4000)));

        repo.delete(&cat.id).await.unwrap();
        assert!(repo.get(&cat.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&cat.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_detaches_products() {
        let db = test_db().await;
        let cat = db.categories(TENANT).create("Bebidas", None).await.unwrap();
        let product = db
            .products(TENANT)
            .create(&NewProduct {
                name: "Agua 500ml".to_string(),
                cost: Money::from_cents(100),
                stock: 3,
                category_id: Some(cat.id.clone()),
                image_url: None,
            })
            .await
            .unwrap();

        db.categories(TENANT).delete(&cat.id).await.unwrap();

        let entry = db.products(TENANT).get(&product.id).await.unwrap().unwrap();
        assert_eq!(entry.product.category_id, None);
    }

    #[tokio::test]
    async fn test_resolve_by_name_creates_once() {
        let db = test_db().await;
        let repo = db.categories(TENANT);

        let first = repo
            .resolve(&CategoryRef::ByName("Limpieza".to_string()))
            .await
            .unwrap();
        let second = repo
            .resolve(&CategoryRef::ByName("Limpieza".to_string()))
            .await
            .unwrap();
        assert_eq!(first.id, second.id);

        let by_id = repo.resolve(&CategoryRef::ById(first.id.clone())).await.unwrap();
        assert_eq!(by_id.name, "Limpieza");

        assert!(matches!(
            repo.resolve(&CategoryRef::ById("missing".to_string())).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
