//! # Repository Module
//!
//! Database repository implementations for Mostrador.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Handler / service                                                     │
//! │       │                                                                 │
//! │       │  db.products(&tenant).decrement_stock(id, 2)                   │
//! │       ▼                                                                 │
//! │  ProductRepository { pool, tenant_id }                                 │
//! │  ├── list / get / find_by_name                                         │
//! │  ├── create / update / delete                                          │
//! │  └── decrement_stock / increment_stock / adjust_stock                  │
//! │       │                                                                 │
//! │       │  SQL (always filtered by tenant_id)                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`category::CategoryRepository`] - Categories and lookup-or-create
//! - [`product::ProductRepository`] - Catalog CRUD and stock movements
//! - [`customer::CustomerRepository`] - Customer CRUD
//! - [`sale::SaleRepository`] - Sales with items, transactional delete
//! - [`order::OrderRepository`] - Purchase records
//! - [`settings::SettingsRepository`] - Global default margin
//! - [`user::UserRepository`] - Known users and roles
//! - [`stats::StatsRepository`] - Reporting aggregates

pub mod category;
pub mod customer;
pub mod order;
pub mod product;
pub mod sale;
pub mod settings;
pub mod stats;
pub mod user;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Fresh UUID v4 string id.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current UTC time; one call per write so related rows share a timestamp.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Test helpers shared by repository test modules.
#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Database, DbConfig};
    use mostrador_core::DEFAULT_TENANT_ID;

    pub const TENANT: &str = DEFAULT_TENANT_ID;

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }
}
