//! # mostrador-db: Database Layer for Mostrador
//!
//! This crate provides database access for the Mostrador back-office.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Mostrador Data Flow                              │
//! │                                                                         │
//! │  HTTP handler / service (POST /api/sales)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   mostrador-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ Category      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ Product       │    │ 001_init.sql │  │   │
//! │  │   │               │    │ Customer      │    │              │  │   │
//! │  │   │               │    │ Sale / Order  │    │              │  │   │
//! │  │   │               │    │ Settings/User │    │              │  │   │
//! │  │   │               │    │ Stats         │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (DATABASE_PATH)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mostrador_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./mostrador.db")).await?;
//! let low = db.products(DEFAULT_TENANT_ID).low_stock(5).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::customer::CustomerRepository;
pub use repository::order::OrderRepository;
pub use repository::product::{NewProduct, ProductFilter, ProductRepository, ProductUpdate};
pub use repository::sale::{SaleFilter, SaleRepository};
pub use repository::settings::SettingsRepository;
pub use repository::stats::{DateRange, StatsRepository};
pub use repository::user::UserRepository;
