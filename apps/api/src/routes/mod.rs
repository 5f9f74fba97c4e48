//! # Route Modules
//!
//! One Axum router per resource, all mounted under `/api` by [`crate::app`].
//!
//! | Module        | Paths                                   | Roles                         |
//! |---------------|-----------------------------------------|-------------------------------|
//! | `categories`  | `/categories`, `/categories/{id}`       | read: staff, write: admin     |
//! | `products`    | `/products/**`                          | read: staff, write: admin     |
//! | `customers`   | `/customers`, `/customers/{id}`         | staff                         |
//! | `sales`       | `/sales`, `/sales/{id}`                 | staff, delete: admin          |
//! | `orders`      | `/orders/**`                            | admin                         |
//! | `settings`    | `/settings`                             | read: staff, write: admin     |
//! | `users`       | `/users`, `/users/{id}/role`            | admin                         |
//! | `stats`       | `/stats/**`                             | admin                         |
//! | `rates`       | `/exchange-rate`, `/exchange-rate/refresh` | any, refresh: admin        |
//! | `health`      | `/health`                               | none                          |
//!
//! "staff" is admin or vendedor.

pub mod categories;
pub mod customers;
pub mod health;
pub mod orders;
pub mod products;
pub mod rates;
pub mod sales;
pub mod settings;
pub mod stats;
pub mod users;

use chrono::{DateTime, Days, NaiveDate, Utc};
use mostrador_core::ValidationError;
use serde::{Deserialize, Deserializer};

/// Query-string date range shared by listings and reports.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateQuery {
    pub from: Option<String>,
    pub to: Option<String>,
}

impl DateQuery {
    /// Parses both bounds. A bare `to` date includes that whole day.
    pub fn bounds(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), ValidationError> {
        let from = parse_bound("from", self.from.as_deref(), false)?;
        let to = parse_bound("to", self.to.as_deref(), true)?;
        Ok((from, to))
    }
}

/// Accepts RFC 3339 timestamps or `YYYY-MM-DD` dates (UTC midnight).
fn parse_bound(
    field: &str,
    value: Option<&str>,
    end_of_day: bool,
) -> Result<Option<DateTime<Utc>>, ValidationError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }

    let invalid = || ValidationError::InvalidFormat {
        field: field.to_string(),
        reason: "expected YYYY-MM-DD or an RFC 3339 timestamp".to_string(),
    };
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| invalid())?;
    let date = if end_of_day {
        date.checked_add_days(Days::new(1)).ok_or_else(invalid)?
    } else {
        date
    };
    Ok(date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc()))
}

/// Distinguishes a missing field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates.
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
