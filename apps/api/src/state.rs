//! Shared application state.

use std::sync::Arc;
use std::time::Duration;

use mostrador_db::Database;
use mostrador_rates::ExchangeRateProvider;

/// Budget for the sale-deletion transaction: connection wait, then body.
pub const SALE_DELETE_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(15);
pub const SALE_DELETE_TIMEOUT: Duration = Duration::from_secs(15);

/// State handed to every handler. Cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub rates: Arc<ExchangeRateProvider>,
}

impl AppState {
    pub fn new(db: Database, rates: Arc<ExchangeRateProvider>) -> Self {
        AppState { db, rates }
    }
}
