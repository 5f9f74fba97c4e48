//! # Customer Repository
//!
//! Customer CRUD plus the first-purchase stamp set by sales.

use chrono::{DateTime, Utc};
use mostrador_core::{Customer, NewCustomer};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::{new_id, now};
use crate::error::{DbError, DbResult};

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool, tenant_id: &str) -> Self {
        CustomerRepository {
            pool,
            tenant_id: tenant_id.to_string(),
        }
    }

    /// Lists customers ordered by name, optionally filtered by a
    /// case-insensitive substring of the name or any handle.
    pub async fn list(&self, search: Option<&str>) -> DbResult<Vec<Customer>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| format!("%{}%", s.to_lowercase()));

        let customers = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, tenant_id, name, whatsapp, instagram, facebook, first_purchase_date,
                   created_at, updated_at
            FROM customers
            WHERE tenant_id = ?1
              AND (?2 IS NULL
                   OR lower(name) LIKE ?2
                   OR lower(COALESCE(whatsapp, '')) LIKE ?2
                   OR lower(COALESCE(instagram, '')) LIKE ?2
                   OR lower(COALESCE(facebook, '')) LIKE ?2)
            ORDER BY name
            "#,
        )
        .bind(&self.tenant_id)
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = customers.len(), "Listed customers");
        Ok(customers)
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, tenant_id, name, whatsapp, instagram, facebook, first_purchase_date,
                   created_at, updated_at
            FROM customers
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Creates a customer. Fields are stored as given; callers validate.
    pub async fn create(&self, new: &NewCustomer) -> DbResult<Customer> {
        let ts = now();
        let customer = Customer {
            id: new_id(),
            tenant_id: self.tenant_id.clone(),
            name: new.name.clone(),
            whatsapp: new.whatsapp.clone(),
            instagram: new.instagram.clone(),
            facebook: new.facebook.clone(),
            first_purchase_date: None,
            created_at: ts,
            updated_at: ts,
        };

        sqlx::query(
            r#"
            INSERT INTO customers
                (id, tenant_id, name, whatsapp, instagram, facebook, first_purchase_date,
                 created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL, ?7, ?8)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.tenant_id)
        .bind(&customer.name)
        .bind(&customer.whatsapp)
        .bind(&customer.instagram)
        .bind(&customer.facebook)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Replaces the contact fields of a customer.
    pub async fn update(&self, id: &str, data: &NewCustomer) -> DbResult<Customer> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET name = ?3, whatsapp = ?4, instagram = ?5, facebook = ?6, updated_at = ?7
            WHERE tenant_id = ?1 AND id = ?2
            "#,
        )
        .bind(&self.tenant_id)
        .bind(id)
        .bind(&data.name)
        .bind(&data.whatsapp)
        .bind(&data.instagram)
        .bind(&data.facebook)
        .bind(now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(id = %id, "Customer updated");
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Deletes a customer. Their sales keep existing with no customer.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM customers WHERE tenant_id = ?1 AND id = ?2")
            .bind(&self.tenant_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        info!(id = %id, "Customer deleted");
        Ok(())
    }

    /// Sets `first_purchase_date` unless it is already set.
    ///
    /// ## Returns
    /// `true` when this call set it.
    pub async fn mark_first_purchase(&self, id: &str, at: DateTime<Utc>) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE customers
            SET first_purchase_date = ?3, updated_at = ?3
            WHERE tenant_id = ?1 AND id = ?2 AND first_purchase_date IS NULL
            "#,
        )
        .bind(&self.tenant_id)
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }
}
