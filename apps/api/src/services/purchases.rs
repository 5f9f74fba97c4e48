//! # Purchase Service
//!
//! Receives a supplier order: spreads the shared shipping cost over the
//! lines, then books each line against the catalog.
//!
//! ```text
//! ┌──────────────┐   validate all   ┌──────────────┐   prorate   ┌──────────────────┐
//! │ PurchaseReq  │ ───────────────► │ PurchaseLine │ ──────────► │  ProratedLine    │
//! │ (lenient)    │   (400 on any)   │ (typed)      │  (422 if 0) │  landed cost     │
//! └──────────────┘                  └──────────────┘             └────────┬─────────┘
//!                                                                         │
//!            per line, in order, each step committed on its own           ▼
//!   category (id | name, created on demand) → product (by exact name, created with
//!   stock 0) → purchase record → stock += qty, cost = landed, category updated
//! ```

use chrono::Utc;
use mostrador_core::lenient::{money_or_zero, try_integer, try_money};
use mostrador_core::proration::{prorate, ProratedLine, ProrationLine};
use mostrador_core::validation::{
    normalize_optional, validate_line_count, validate_required_name, validate_non_negative,
    validate_quantity,
};
use mostrador_core::{CategoryRef, Money, PurchaseOrder, ValidationError};
use mostrador_db::{Database, NewProduct};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::state::AppState;

// =============================================================================
// Request / Response
// =============================================================================

/// Body of `POST /api/orders`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseRequest {
    #[serde(default)]
    pub items: Vec<PurchaseLineRequest>,
    /// Shared shipping cost for the whole order, in USD.
    pub shipping_cost: Option<Value>,
    /// Default supplier for lines that do not name one.
    pub supplier: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseLineRequest {
    pub name: Option<String>,
    pub quantity: Option<Value>,
    /// Unit cost in USD before shipping.
    pub cost: Option<Value>,
    pub supplier: Option<String>,
    pub category_id: Option<String>,
    pub category_name: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
struct PurchaseLine {
    name: String,
    quantity: i64,
    cost: Money,
    supplier: Option<String>,
    category: Option<CategoryRef>,
    image_url: Option<String>,
}

/// Proration result for one line, as returned by the preview endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewLine {
    pub name: String,
    pub quantity: i64,
    pub cost: Money,
    pub line_cost: Money,
    pub prorated_shipping: Money,
    pub total_cost: Money,
    pub unit_cost_with_shipping: Money,
}

/// Order-level totals plus per-line proration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchasePreview {
    pub total_product_cost: Money,
    pub shipping_cost: Money,
    pub total_cost: Money,
    pub lines: Vec<PreviewLine>,
}

/// What `POST /api/orders` returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurchaseReceipt {
    pub total_product_cost: Money,
    pub shipping_cost: Money,
    pub total_cost: Money,
    pub orders: Vec<PurchaseOrder>,
}

fn parse_lines(req: &PurchaseRequest) -> Result<Vec<PurchaseLine>, ValidationError> {
    validate_line_count("items", req.items.len())?;
    let default_supplier = normalize_optional(req.supplier.as_deref());

    req.items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let field = |name: &str| format!("items[{idx}].{name}");

            let name = validate_required_name(&field("name"), item.name.as_deref())?;

            let quantity = try_integer(&field("quantity"), item.quantity.as_ref())?
                .ok_or_else(|| ValidationError::required(field("quantity")))?;
            validate_quantity(&field("quantity"), quantity)?;

            let cost = try_money(&field("cost"), item.cost.as_ref())?.unwrap_or_default();
            validate_non_negative(&field("cost"), cost)?;

            Ok(PurchaseLine {
                name: name.to_string(),
                quantity,
                cost,
                supplier: normalize_optional(item.supplier.as_deref())
                    .or_else(|| default_supplier.clone()),
                category: CategoryRef::from_parts(
                    item.category_id.as_deref(),
                    item.category_name.as_deref(),
                ),
                image_url: normalize_optional(item.image_url.as_deref()),
            })
        })
        .collect()
}

fn prorate_lines(lines: &[PurchaseLine], shipping: Money) -> ApiResult<Vec<ProratedLine>> {
    let input: Vec<ProrationLine> = lines
        .iter()
        .map(|l| ProrationLine::new(l.quantity, l.cost))
        .collect();
    Ok(prorate(&input, shipping)?)
}

fn totals(prorated: &[ProratedLine], shipping: Money) -> (Money, Money) {
    let product_cost: Money = prorated.iter().map(|p| p.line_cost).sum();
    (product_cost, product_cost + shipping)
}

/// Order-level shipping; garbage is zero, negatives are rejected.
fn shipping_cost(req: &PurchaseRequest) -> ApiResult<Money> {
    let shipping = money_or_zero(req.shipping_cost.as_ref());
    validate_non_negative("shipping_cost", shipping)?;
    Ok(shipping)
}

// =============================================================================
// Service
// =============================================================================

#[derive(Debug, Clone)]
pub struct PurchaseService {
    db: Database,
    tenant_id: String,
}

impl PurchaseService {
    pub fn new(state: &AppState, tenant_id: &str) -> Self {
        PurchaseService {
            db: state.db.clone(),
            tenant_id: tenant_id.to_string(),
        }
    }

    /// Runs validation and proration without touching the database.
    pub fn preview(req: &PurchaseRequest) -> ApiResult<PurchasePreview> {
        let lines = parse_lines(req)?;
        let shipping = shipping_cost(req)?;
        let prorated = prorate_lines(&lines, shipping)?;
        let (total_product_cost, total_cost) = totals(&prorated, shipping);

        Ok(PurchasePreview {
            total_product_cost,
            shipping_cost: shipping,
            total_cost,
            lines: lines
                .into_iter()
                .zip(prorated)
                .map(|(line, p)| PreviewLine {
                    name: line.name,
                    quantity: line.quantity,
                    cost: line.cost,
                    line_cost: p.line_cost,
                    prorated_shipping: p.prorated_shipping,
                    total_cost: p.total_cost,
                    unit_cost_with_shipping: p.unit_cost_with_shipping,
                })
                .collect(),
        })
    }

    /// Books a received order. Lines are applied one after another; a
    /// failure leaves earlier lines in place.
    pub async fn receive(&self, req: &PurchaseRequest) -> ApiResult<PurchaseReceipt> {
        let lines = parse_lines(req)?;
        let shipping = shipping_cost(req)?;
        let prorated = prorate_lines(&lines, shipping)?;

        let categories = self.db.categories(&self.tenant_id);
        let products = self.db.products(&self.tenant_id);
        let orders_repo = self.db.orders(&self.tenant_id);

        let mut orders = Vec::with_capacity(lines.len());
        for (line, share) in lines.iter().zip(&prorated) {
            let category_id = match &line.category {
                Some(category) => Some(categories.resolve(category).await?.id),
                None => None,
            };

            let landed = share.unit_cost_with_shipping;
            let product = match products.find_by_name(&line.name).await? {
                Some(existing) => existing,
                None => {
                    debug!(name = %line.name, "Creating product from purchase line");
                    products
                        .create(&NewProduct {
                            name: line.name.clone(),
                            cost: landed,
                            stock: 0,
                            category_id: category_id.clone(),
                            image_url: line.image_url.clone(),
                        })
                        .await?
                }
            };

            let order = PurchaseOrder {
                id: Uuid::new_v4().to_string(),
                tenant_id: self.tenant_id.clone(),
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                quantity: line.quantity,
                supplier: line.supplier.clone(),
                shipping_cost: share.shipping_delta,
                unit_cost: line.cost,
                landed_unit_cost: landed,
                created_at: Utc::now(),
            };
            orders_repo.insert(&order).await?;

            products
                .receive_purchase(&product.id, line.quantity, landed, category_id.as_deref())
                .await?;

            orders.push(order);
        }

        let (total_product_cost, total_cost) = totals(&prorated, shipping);
        info!(
            lines = orders.len(),
            total_product_cost = %total_product_cost,
            shipping = %shipping,
            "Purchase order received"
        );

        Ok(PurchaseReceipt {
            total_product_cost,
            shipping_cost: shipping,
            total_cost,
            orders,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
