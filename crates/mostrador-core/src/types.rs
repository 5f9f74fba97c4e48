//! # Domain Types
//!
//! Core domain types used throughout Mostrador.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Category     │◄──│    Product      │◄──│    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  name (unique)  │   │  name (unique)  │   │  quantity       │       │
//! │  │  profit_margin? │   │  cost (USD)     │   │  selling_price  │       │
//! │  └─────────────────┘   │  stock >= 0     │   │  ars_price      │       │
//! │                        └────────▲────────┘   └────────┬────────┘       │
//! │  ┌─────────────────┐            │                     │ cascade        │
//! │  │    Settings     │   ┌────────┴────────┐   ┌────────▼────────┐       │
//! │  │  default_margin │   │  PurchaseOrder  │   │      Sale       │       │
//! │  └─────────────────┘   │  qty, shipping  │   │  total, ARS     │──► Customer
//! │                        └─────────────────┘   │  rate snapshot  │       │
//! │                                              └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every persisted entity carries `tenant_id`. Ids are UUID v4 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{ExchangeRate, Margin, Money, Pesos};

// =============================================================================
// Category
// =============================================================================

/// A product grouping with an optional margin override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub tenant_id: String,
    pub name: String,

    /// `None` means "use the global default margin".
    #[cfg_attr(feature = "sqlx", sqlx(rename = "profit_margin_bps"))]
    pub profit_margin: Option<Margin>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// How a purchase line names its category.
///
/// The intake form either picks an existing category or types a new name.
/// Both are resolved by a single lookup-or-create in the category
/// repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryRef {
    ById(String),
    ByName(String),
}

impl CategoryRef {
    /// Builds a reference from the two optional form fields.
    ///
    /// A non-blank id wins over a name; blank values count as absent.
    ///
    /// ## Example
    /// ```rust
    /// use mostrador_core::types::CategoryRef;
    ///
    /// assert_eq!(
    ///     CategoryRef::from_parts(Some("c-1"), Some("Bebidas")),
    ///     Some(CategoryRef::ById("c-1".to_string()))
    /// );
    /// assert_eq!(
    ///     CategoryRef::from_parts(Some("  "), Some(" Bebidas ")),
    ///     Some(CategoryRef::ByName("Bebidas".to_string()))
    /// );
    /// assert_eq!(CategoryRef::from_parts(None, Some("")), None);
    /// ```
    pub fn from_parts(id: Option<&str>, name: Option<&str>) -> Option<Self> {
        fn non_blank(s: Option<&str>) -> Option<&str> {
            s.map(str::trim).filter(|s| !s.is_empty())
        }

        if let Some(id) = non_blank(id) {
            return Some(CategoryRef::ById(id.to_string()));
        }
        non_blank(name).map(|n| CategoryRef::ByName(n.to_string()))
    }
}

// =============================================================================
// Settings
// =============================================================================

/// Per-tenant singleton holding the global default margin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Settings {
    pub tenant_id: String,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "default_margin_bps"))]
    pub default_margin: Margin,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A catalog product.
///
/// `stock` only moves through sales, purchase orders and explicit
/// adjustments, and never goes below zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub tenant_id: String,
    pub name: String,

    /// Base cost in USD. Purchase intake overwrites it with the landed
    /// unit cost.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "cost_cents"))]
    pub cost: Money,

    #[ts(type = "number")]
    pub stock: i64,

    pub category_id: Option<String>,

    /// Opaque image reference; no storage is integrated.
    pub image_url: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A product joined with the category fields pricing needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CatalogEntry {
    #[serde(flatten)]
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    pub product: Product,

    pub category_name: Option<String>,

    #[cfg_attr(feature = "sqlx", sqlx(rename = "category_margin_bps"))]
    pub category_margin: Option<Margin>,
}

// =============================================================================
// Customer
// =============================================================================

/// A customer, reachable through any of the optional social handles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub whatsapp: Option<String>,
    pub instagram: Option<String>,
    pub facebook: Option<String>,

    /// Set by the first sale associated with this customer.
    #[ts(as = "Option<String>")]
    pub first_purchase_date: Option<DateTime<Utc>>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Contact data for a customer created inline with a sale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
}

/// Which customer a sale belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CustomerRef {
    /// An existing customer id.
    Existing(String),
    /// Create this customer first, then attach the sale.
    New(NewCustomer),
}

// =============================================================================
// Sale
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
pub enum PaymentMethod {
    /// Cash.
    Efectivo,
    /// Bank transfer.
    Transferencia,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 2] = [PaymentMethod::Efectivo, PaymentMethod::Transferencia];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Efectivo => "efectivo",
            PaymentMethod::Transferencia => "transferencia",
        }
    }

    /// Case-insensitive parse of the wire name.
    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(value.trim()))
    }
}

/// A completed point-of-sale sale.
///
/// ## Lifecycle
/// ```text
/// {none} ──create──► created ──update──► updated ──update──► ...
///                       │                   │
///                       └──────delete───────┴──► deleted (stock restored)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,

    /// Σ quantity × selling_price.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "total_cents"))]
    pub total: Money,

    /// Σ quantity × ars_price.
    pub total_ars: Pesos,

    pub payment_method: PaymentMethod,
    pub customer_id: Option<String>,
    pub user_id: Option<String>,

    /// Sell rate captured when the sale was created.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "exchange_rate_centi"))]
    pub exchange_rate: Option<ExchangeRate>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// One line of a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,

    /// Product name at the time of sale.
    pub product_name: String,

    #[ts(type = "number")]
    pub quantity: i64,

    /// USD unit price, possibly operator-entered.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "selling_price_cents"))]
    pub selling_price: Money,

    /// ARS unit price, possibly operator-entered.
    pub ars_price: Pesos,
}

impl SaleItem {
    pub fn line_total(&self) -> Money {
        self.selling_price.multiply_quantity(self.quantity)
    }

    pub fn line_total_ars(&self) -> Pesos {
        self.ars_price.multiply_quantity(self.quantity)
    }
}

/// A sale together with its lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleWithItems {
    #[serde(flatten)]
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

// =============================================================================
// Purchase Order
// =============================================================================

/// One received purchase line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct PurchaseOrder {
    pub id: String,
    pub tenant_id: String,
    pub product_id: String,
    pub product_name: String,

    #[ts(type = "number")]
    pub quantity: i64,

    pub supplier: Option<String>,

    /// Shipping attributed to this line: `(landed - unit) × quantity`.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "shipping_cost_cents"))]
    pub shipping_cost: Money,

    /// Unit cost before shipping.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "unit_cost_cents"))]
    pub unit_cost: Money,

    /// Unit cost including the prorated shipping share.
    #[cfg_attr(feature = "sqlx", sqlx(rename = "landed_unit_cost_cents"))]
    pub landed_unit_cost: Money,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Users & Roles
// =============================================================================

/// Authorization role carried by the identity provider's role claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
pub enum Role {
    Admin,
    Vendedor,
    #[default]
    Anonimo,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Vendedor => "vendedor",
            Role::Anonimo => "anonimo",
        }
    }

    /// Maps a role claim to a role. Unknown claims are anonymous.
    ///
    /// ## Example
    /// ```rust
    /// use mostrador_core::types::Role;
    ///
    /// assert_eq!(Role::from_claim("ADMIN"), Role::Admin);
    /// assert_eq!(Role::from_claim("superuser"), Role::Anonimo);
    /// ```
    pub fn from_claim(claim: &str) -> Self {
        match claim.trim().to_ascii_lowercase().as_str() {
            "admin" => Role::Admin,
            "vendedor" => Role::Vendedor,
            _ => Role::Anonimo,
        }
    }

    /// Strict parse, for role assignment requests.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "vendedor" => Some(Role::Vendedor),
            "anonimo" => Some(Role::Anonimo),
            _ => None,
        }
    }
}

/// A known back-office user, mirrored from the identity provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub tenant_id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Role,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Reporting
// =============================================================================

/// Aggregates over the sales in a date range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesSummary {
    #[ts(type = "number")]
    pub sale_count: i64,
    pub revenue: Money,
    pub revenue_ars: Pesos,
    #[ts(type = "number")]
    pub units_sold: i64,
    /// Σ quantity × current product cost.
    pub cost_of_goods: Money,
    /// `revenue - cost_of_goods`.
    pub gross_profit: Money,
}

/// Units and revenue for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductSales {
    pub product_id: String,
    pub product_name: String,
    #[ts(type = "number")]
    pub units_sold: i64,
    #[cfg_attr(feature = "sqlx", sqlx(rename = "revenue_cents"))]
    pub revenue: Money,
}

// =============================================================================
// Unit Tests
// =============================================================================
