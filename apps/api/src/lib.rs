//! # Mostrador API
//!
//! JSON back-office for a small retail shop: catalog, customers, purchase
//! orders and dual-currency (USD / ARS) sales.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  auth proxy ──► TraceLayer ──► CorsLayer ──► /api/<resource> handler    │
//! │  (x-user-*)                                        │                    │
//! │                                     Caller role check (403)             │
//! │                                                    │                    │
//! │                        ┌───────────────────────────┼──────────────┐     │
//! │                        ▼                           ▼              ▼     │
//! │                 services::sales         services::purchases   plain CRUD│
//! │                        │                           │              │     │
//! │                        └──────────► mostrador-db ◄─┴──────────────┘     │
//! │                                          │                              │
//! │                               ExchangeRateProvider (cached)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Builds the application router with every resource under `/api`.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::health::router())
        .merge(routes::categories::router())
        .merge(routes::products::router())
        .merge(routes::customers::router())
        .merge(routes::sales::router())
        .merge(routes::orders::router())
        .merge(routes::settings::router())
        .merge(routes::users::router())
        .merge(routes::stats::router())
        .merge(routes::rates::router());

    Router::new()
        .nest("/api", api)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
