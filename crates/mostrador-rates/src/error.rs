//! Error types for rate fetching and parsing.
//!
//! None of these reach HTTP clients: the provider logs them and falls back
//! to the default quote.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RatesError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate source returned status {0}")]
    Status(u16),

    #[error("Unexpected payload shape: {0}")]
    InvalidPayload(String),

    #[error("No quote matching '{target}' or '{fallback}'")]
    QuoteNotFound { target: String, fallback: String },

    #[error("Invalid {field} value: {value}")]
    InvalidNumber { field: String, value: String },
}
