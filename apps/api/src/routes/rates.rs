//! # Exchange Rate API
//!
//! - GET  /api/exchange-rate           current quote, never fails (any caller)
//! - POST /api/exchange-rate/refresh   drop the cache and fetch again (admin)
//!
//! When the upstream is down the quote carries the built-in defaults with
//! `success: false`.

use axum::extract::State;
use axum::http::header::CACHE_CONTROL;
use axum::http::HeaderValue;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use mostrador_rates::RateQuote;
use tracing::info;

use crate::auth::Caller;
use crate::error::ApiResult;
use crate::state::AppState;

/// Browsers and the UI may reuse a quote for an hour.
pub const RATE_CACHE_CONTROL: &str = "public, max-age=3600";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/exchange-rate", get(current_rate))
        .route("/exchange-rate/refresh", post(refresh_rate))
}

async fn current_rate(State(state): State<AppState>) -> impl IntoResponse {
    let quote = state.rates.current().await;
    (
        [(CACHE_CONTROL, HeaderValue::from_static(RATE_CACHE_CONTROL))],
        Json(quote),
    )
}

async fn refresh_rate(State(state): State<AppState>, caller: Caller) -> ApiResult<Json<RateQuote>> {
    caller.require_admin()?;
    state.rates.invalidate().await;
    let quote = state.rates.current().await;
    info!(success = quote.success, sell = %quote.sell, "Exchange rate refreshed");
    Ok(Json(quote))
}
