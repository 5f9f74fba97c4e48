//! # Sale Service
//!
//! Sale creation, editing and deletion with stock reconciliation.
//!
//! ## Create
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. validate: items non-empty, payment method, every line parses        │
//! │  2. resolve customer: existing id | inline new customer | none          │
//! │  3. sell rate from the ExchangeRateProvider                             │
//! │  4. for each line, in order:                                            │
//! │       load product ──── missing ──► 404                                 │
//! │       stock < qty ───────────────► 409, earlier lines stay committed    │
//! │       USD = override or usd_sale_price(cost, margin)                    │
//! │       ARS = override or ars_sale_price(USD, rate)                       │
//! │       UPDATE stock WHERE stock >= qty   (committed immediately)         │
//! │  5. insert sale + items with the rate snapshot                          │
//! │  6. stamp the customer's first purchase                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Update
//! Restores stock for every current item, drops the items, then re-runs
//! the create loop against the new lines. The stored rate is reused; a sale
//! without one gets the current rate.
//!
//! ## Delete
//! One transaction: stock back for every item, then the sale goes.
//!
//! Create and update are not atomic across lines. Only delete is.

use chrono::Utc;
use mostrador_core::lenient::{try_integer, try_money, try_pesos};
use mostrador_core::pricing::{ars_sale_price, margin_for, usd_sale_price, PriceSource};
use mostrador_core::validation::{
    normalize_optional, validate_line_count, validate_name, validate_non_negative,
    validate_payment_method, validate_quantity,
};
use mostrador_core::{
    CoreError, CustomerRef, ExchangeRate, Margin, Money, NewCustomer, Pesos, Sale, SaleItem,
    SaleWithItems, ValidationError,
};
use mostrador_db::Database;
use mostrador_rates::ExchangeRateProvider;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::Caller;
use crate::error::ApiResult;
use crate::state::{AppState, SALE_DELETE_ACQUIRE_TIMEOUT, SALE_DELETE_TIMEOUT};

// =============================================================================
// Request Types
// =============================================================================

/// Body of `POST /api/sales` and `PUT /api/sales/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleRequest {
    #[serde(default)]
    pub items: Vec<SaleLineRequest>,
    pub payment_method: Option<String>,
    pub customer_id: Option<String>,
    pub new_customer: Option<NewCustomer>,
}

/// One requested line. Numbers may arrive as JSON numbers or strings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SaleLineRequest {
    pub product_id: Option<String>,
    pub quantity: Option<Value>,
    /// Operator USD unit price; computed when absent.
    pub selling_price: Option<Value>,
    /// Operator ARS unit price; computed when absent.
    #[serde(alias = "ars_price")]
    pub price_ars: Option<Value>,
}

/// A line after validation.
#[derive(Debug, Clone, PartialEq)]
struct SaleLine {
    product_id: String,
    quantity: i64,
    usd: PriceSource<Money>,
    ars: PriceSource<Pesos>,
}

fn parse_lines(items: &[SaleLineRequest]) -> Result<Vec<SaleLine>, ValidationError> {
    validate_line_count("items", items.len())?;

    items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let field = |name: &str| format!("items[{idx}].{name}");

            let product_id = normalize_optional(item.product_id.as_deref())
                .ok_or_else(|| ValidationError::required(field("product_id")))?;

            let quantity = try_integer(&field("quantity"), item.quantity.as_ref())?
                .ok_or_else(|| ValidationError::required(field("quantity")))?;
            validate_quantity(&field("quantity"), quantity)?;

            let usd = try_money(&field("selling_price"), item.selling_price.as_ref())?;
            if let Some(price) = usd {
                validate_non_negative(&field("selling_price"), price)?;
            }

            let ars = try_pesos(&field("price_ars"), item.price_ars.as_ref())?;
            if ars.is_some_and(|p| p.amount() < 0) {
                return Err(ValidationError::OutOfRange {
                    field: field("price_ars"),
                    min: 0,
                    max: i64::MAX,
                });
            }

            Ok(SaleLine {
                product_id,
                quantity,
                usd: PriceSource::from_override(usd),
                ars: PriceSource::from_override(ars),
            })
        })
        .collect()
}

fn customer_ref(req: &SaleRequest) -> Result<Option<CustomerRef>, ValidationError> {
    if let Some(id) = normalize_optional(req.customer_id.as_deref()) {
        return Ok(Some(CustomerRef::Existing(id)));
    }

    match &req.new_customer {
        Some(new) => {
            let name = validate_name("new_customer.name", &new.name)?;
            Ok(Some(CustomerRef::New(NewCustomer {
                name: name.to_string(),
                whatsapp: normalize_optional(new.whatsapp.as_deref()),
                instagram: normalize_optional(new.instagram.as_deref()),
                facebook: normalize_optional(new.facebook.as_deref()),
            })))
        }
        None => Ok(None),
    }
}

// =============================================================================
// Service
// =============================================================================

/// Sale flows for one tenant.
#[derive(Debug, Clone)]
pub struct SaleService {
    db: Database,
    rates: Arc<ExchangeRateProvider>,
    tenant_id: String,
}

impl SaleService {
    pub fn new(state: &AppState, tenant_id: &str) -> Self {
        SaleService {
            db: state.db.clone(),
            rates: state.rates.clone(),
            tenant_id: tenant_id.to_string(),
        }
    }

    /// Creates a sale, decrementing stock line by line.
    pub async fn create(&self, req: &SaleRequest, caller: &Caller) -> ApiResult<SaleWithItems> {
        let lines = parse_lines(&req.items)?;
        let payment_method = validate_payment_method(req.payment_method.as_deref())?;
        let customer = customer_ref(req)?;

        let customer_id = self.resolve_customer(customer).await?;
        let rate = self.rates.sell_rate().await;

        let sale_id = Uuid::new_v4().to_string();
        let items = self.apply_lines(&sale_id, &lines, rate).await?;

        let now = Utc::now();
        let sale = SaleWithItems {
            sale: Sale {
                id: sale_id,
                tenant_id: self.tenant_id.clone(),
                total: items.iter().map(SaleItem::line_total).sum(),
                total_ars: items.iter().map(SaleItem::line_total_ars).sum(),
                payment_method,
                customer_id: customer_id.clone(),
                user_id: caller.user_id.clone(),
                exchange_rate: Some(rate),
                created_at: now,
                updated_at: now,
            },
            items,
        };

        self.db.sales(&self.tenant_id).insert(&sale).await?;
        self.after_write(&sale, caller).await?;

        info!(
            id = %sale.sale.id,
            total = %sale.sale.total,
            total_ars = %sale.sale.total_ars,
            "Sale recorded"
        );
        Ok(sale)
    }

    /// Replaces a sale's lines, payment method and customer.
    pub async fn update(
        &self,
        id: &str,
        req: &SaleRequest,
        caller: &Caller,
    ) -> ApiResult<SaleWithItems> {
        let lines = parse_lines(&req.items)?;
        let payment_method = validate_payment_method(req.payment_method.as_deref())?;
        let customer = customer_ref(req)?;

        let sales = self.db.sales(&self.tenant_id);
        let existing = sales
            .get(id)
            .await?
            .ok_or_else(|| CoreError::SaleNotFound(id.to_string()))?;

        let products = self.db.products(&self.tenant_id);
        for item in &existing.items {
            products.increment_stock(&item.product_id, item.quantity).await?;
        }
        sales.delete_items(id).await?;
        debug!(id = %id, restored = existing.items.len(), "Stock restored for edit");

        let customer_id = self.resolve_customer(customer).await?;
        let rate = match existing.sale.exchange_rate {
            Some(rate) => rate,
            None => self.rates.sell_rate().await,
        };

        let items = self.apply_lines(id, &lines, rate).await?;

        let sale = SaleWithItems {
            sale: Sale {
                total: items.iter().map(SaleItem::line_total).sum(),
                total_ars: items.iter().map(SaleItem::line_total_ars).sum(),
                payment_method,
                customer_id,
                exchange_rate: Some(rate),
                updated_at: Utc::now(),
                ..existing.sale
            },
            items,
        };

        sales.save_update(&sale).await?;
        self.after_write(&sale, caller).await?;

        info!(id = %id, total = %sale.sale.total, "Sale updated");
        Ok(sale)
    }

    /// Deletes a sale and restores its stock, all or nothing.
    pub async fn delete(&self, id: &str) -> ApiResult<SaleWithItems> {
        let deleted = self
            .db
            .sales(&self.tenant_id)
            .delete_restoring_stock(id, SALE_DELETE_ACQUIRE_TIMEOUT, SALE_DELETE_TIMEOUT)
            .await?;
        Ok(deleted)
    }

    // =========================================================================
    // Steps
    // =========================================================================

    async fn resolve_customer(&self, customer: Option<CustomerRef>) -> ApiResult<Option<String>> {
        let customers = self.db.customers(&self.tenant_id);
        match customer {
            None => Ok(None),
            Some(CustomerRef::Existing(id)) => {
                if customers.get(&id).await?.is_none() {
                    return Err(CoreError::CustomerNotFound(id).into());
                }
                Ok(Some(id))
            }
            Some(CustomerRef::New(new)) => {
                let created = customers.create(&new).await?;
                Ok(Some(created.id))
            }
        }
    }

    /// Prices each line and takes its stock. Stops at the first failure;
    /// stock already taken for earlier lines is not given back.
    async fn apply_lines(
        &self,
        sale_id: &str,
        lines: &[SaleLine],
        rate: ExchangeRate,
    ) -> ApiResult<Vec<SaleItem>> {
        let products = self.db.products(&self.tenant_id);
        let default_margin = self.db.settings(&self.tenant_id).default_margin().await?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let entry = products
                .get(&line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;
            let product = &entry.product;

            if product.stock < line.quantity {
                return Err(insufficient(&product.name, product.stock, line.quantity).into());
            }

            let margin: Margin = margin_for(entry.category_margin, default_margin);
            let usd = line.usd.resolve(usd_sale_price(product.cost, margin));
            let ars = line.ars.resolve(ars_sale_price(usd, rate));

            if !products.decrement_stock(&product.id, line.quantity).await? {
                let available = products.stock_of(&product.id).await?.unwrap_or(0);
                return Err(insufficient(&product.name, available, line.quantity).into());
            }

            debug!(
                product = %product.name,
                qty = line.quantity,
                usd = %usd,
                ars = %ars,
                usd_overridden = line.usd.is_overridden(),
                "Sale line applied"
            );

            items.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.to_string(),
                product_id: product.id.clone(),
                product_name: product.name.clone(),
                quantity: line.quantity,
                selling_price: usd,
                ars_price: ars,
            });
        }

        Ok(items)
    }

    async fn after_write(&self, sale: &SaleWithItems, caller: &Caller) -> ApiResult<()> {
        if let Some(customer_id) = &sale.sale.customer_id {
            self.db
                .customers(&self.tenant_id)
                .mark_first_purchase(customer_id, sale.sale.updated_at)
                .await?;
        }
        if let Some(user_id) = &caller.user_id {
            self.db
                .users(&self.tenant_id)
                .ensure_exists(user_id, caller.role)
                .await?;
        }
        Ok(())
    }
}

fn insufficient(product: &str, available: i64, requested: i64) -> CoreError {
    CoreError::InsufficientStock {
        product: product.to_string(),
        available,
        requested,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::services::test_support::test_state;
    use mostrador_core::{PaymentMethod, Role, DEFAULT_TENANT_ID};
    use mostrador_db::NewProduct;
    use serde_json::json;

    const TENANT: &str = DEFAULT_TENANT_ID;

    fn seller() -> Caller {
        Caller {
            user_id: Some("seller-1".to_string()),
            role: Role::Vendedor,
            tenant_id: TENANT.to_string(),
        }
    }

    async fn product(state: &AppState, name: &str, cost_cents: i64, stock: i64) -> String {
        state
            .db
            .products(TENANT)
            .create(&NewProduct {
                name: name.to_string(),
                cost: Money::from_cents(cost_cents),
                stock,
                category_id: None,
                image_url: None,
            })
            .await
            .unwrap()
            .id
    }

    fn line(product_id: &str, qty: i64) -> SaleLineRequest {
        SaleLineRequest {
            product_id: Some(product_id.to_string()),
            quantity: Some(json!(qty)),
            ..Default::default()
        }
    }

    fn request(items: Vec<SaleLineRequest>) -> SaleRequest {
        SaleRequest {
            items,
            payment_method: Some("efectivo".to_string()),
            ..Default::default()
        }
    }

    async fn stock(state: &AppState, id: &str) -> i64 {
        state.db.products(TENANT).stock_of(id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_create_prices_and_decrements() {
        let state = test_state().await;
        let cat = state
            .db
            .categories(TENANT)
            .create("Almacén", Some(Margin::from_bps(2000)))
            .await
            .unwrap();
        let id = state
            .db
            .products(TENANT)
            .create(&NewProduct {
                name: "Yerba".to_string(),
                cost: Money::from_cents(1000),
                stock: 5,
                category_id: Some(cat.id),
                image_url: None,
            })
            .await
            .unwrap()
            .id;

        let service = SaleService::new(&state, TENANT);
        let sale = service.create(&request(vec![line(&id, 2)]), &seller()).await.unwrap();

        assert_eq!(sale.items[0].selling_price.cents(), 1200);
        assert_eq!(sale.items[0].ars_price.amount(), 15_000);
        assert_eq!(sale.sale.total.cents(), 2400);
        assert_eq!(sale.sale.total_ars.amount(), 30_000);
        assert_eq!(sale.sale.exchange_rate, Some(ExchangeRate::from_hundredths(125_000)));
        assert_eq!(sale.sale.user_id.as_deref(), Some("seller-1"));
        assert_eq!(stock(&state, &id).await, 3);

        let users = state.db.users(TENANT).list().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].role, Role::Vendedor);
    }

    #[tokio::test]
    async fn test_operator_overrides_are_taken_verbatim() {
        let state = test_state().await;
        let id = product(&state, "Mate", 1000, 5).await;

        let mut item = line(&id, 1);
        item.selling_price = Some(json!("9.99"));
        item.price_ars = Some(json!(11_111));

        let sale = SaleService::new(&state, TENANT)
            .create(&request(vec![item]), &seller())
            .await
            .unwrap();
        assert_eq!(sale.items[0].selling_price.cents(), 999);
        assert_eq!(sale.items[0].ars_price.amount(), 11_111);
    }

    #[tokio::test]
    async fn test_usd_override_feeds_ars_price() {
        let state = test_state().await;
        let id = product(&state, "Mate", 1000, 5).await;

        let mut item = line(&id, 1);
        item.selling_price = Some(json!(20));

        let sale = SaleService::new(&state, TENANT)
            .create(&request(vec![item]), &seller())
            .await
            .unwrap();
        assert_eq!(sale.items[0].ars_price.amount(), 25_000);
    }

    #[tokio::test]
    async fn test_oversell_keeps_earlier_lines_committed() {
        let state = test_state().await;
        let a = product(&state, "Yerba", 1000, 5).await;
        let b = product(&state, "Azúcar", 500, 1).await;

        let err = SaleService::new(&state, TENANT)
            .create(&request(vec![line(&a, 2), line(&b, 3)]), &seller())
            .await
            .unwrap_err();

        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert!(err.message.contains("Azúcar"));
        assert_eq!(stock(&state, &a).await, 3);
        assert_eq!(stock(&state, &b).await, 1);
        assert!(state
            .db
            .sales(TENANT)
            .list(&Default::default())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_validation_happens_before_any_write() {
        let state = test_state().await;
        let a = product(&state, "Yerba", 1000, 5).await;

        let mut bad = line(&a, 1);
        bad.quantity = Some(json!("dos"));
        let err = SaleService::new(&state, TENANT)
            .create(&request(vec![line(&a, 2), bad]), &seller())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(stock(&state, &a).await, 5);

        let mut req = request(vec![line(&a, 1)]);
        req.payment_method = Some("tarjeta".to_string());
        let err = SaleService::new(&state, TENANT).create(&req, &seller()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = SaleService::new(&state, TENANT)
            .create(&request(vec![]), &seller())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let state = test_state().await;
        let err = SaleService::new(&state, TENANT)
            .create(&request(vec![line("nope", 1)]), &seller())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_inline_customer_created_and_stamped() {
        let state = test_state().await;
        let a = product(&state, "Yerba", 1000, 5).await;

        let mut req = request(vec![line(&a, 1)]);
        req.new_customer = Some(NewCustomer {
            name: "  Ana ".to_string(),
            instagram: Some("@ana".to_string()),
            ..Default::default()
        });

        let sale = SaleService::new(&state, TENANT).create(&req, &seller()).await.unwrap();
        let customer_id = sale.sale.customer_id.unwrap();
        let customer = state.db.customers(TENANT).get(&customer_id).await.unwrap().unwrap();
        assert_eq!(customer.name, "Ana");
        assert!(customer.first_purchase_date.is_some());
    }

    #[tokio::test]
    async fn test_missing_existing_customer() {
        let state = test_state().await;
        let a = product(&state, "Yerba", 1000, 5).await;

        let mut req = request(vec![line(&a, 1)]);
        req.customer_id = Some("ghost".to_string());
        let err = SaleService::new(&state, TENANT).create(&req, &seller()).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(stock(&state, &a).await, 5);
    }

    #[tokio::test]
    async fn test_update_restores_then_reapplies() {
        let state = test_state().await;
        let a = product(&state, "Yerba", 1000, 5).await;
        let b = product(&state, "Azúcar", 500, 5).await;
        let service = SaleService::new(&state, TENANT);

        let sale = service.create(&request(vec![line(&a, 3)]), &seller()).await.unwrap();
        assert_eq!(stock(&state, &a).await, 2);

        let mut req = request(vec![line(&a, 1), line(&b, 2)]);
        req.payment_method = Some("transferencia".to_string());
        let updated = service.update(&sale.sale.id, &req, &seller()).await.unwrap();

        assert_eq!(stock(&state, &a).await, 4);
        assert_eq!(stock(&state, &b).await, 3);
        assert_eq!(updated.items.len(), 2);
        assert_eq!(updated.sale.payment_method, PaymentMethod::Transferencia);
        assert_eq!(updated.sale.exchange_rate, sale.sale.exchange_rate);
        assert_eq!(updated.sale.created_at, sale.sale.created_at);

        let stored = state.db.sales(TENANT).get(&sale.sale.id).await.unwrap().unwrap();
        assert_eq!(stored.items.len(), 2);
        assert_eq!(stored.sale.total, updated.sale.total);
    }

    #[tokio::test]
    async fn test_update_can_reuse_restored_stock() {
        let state = test_state().await;
        let a = product(&state, "Yerba", 1000, 3).await;
        let service = SaleService::new(&state, TENANT);

        let sale = service.create(&request(vec![line(&a, 3)]), &seller()).await.unwrap();
        assert_eq!(stock(&state, &a).await, 0);

        service
            .update(&sale.sale.id, &request(vec![line(&a, 3)]), &seller())
            .await
            .unwrap();
        assert_eq!(stock(&state, &a).await, 0);
    }

    /// A sale as recorded before rate snapshots were kept, one unit of
    /// `product_id` taken out of stock.
    async fn recorded_sale(
        state: &AppState,
        product_id: &str,
        rate: Option<ExchangeRate>,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let item = SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: id.clone(),
            product_id: product_id.to_string(),
            product_name: "Yerba".to_string(),
            quantity: 1,
            selling_price: Money::from_cents(1300),
            ars_price: Pesos::new(13_000),
        };
        let sale = SaleWithItems {
            sale: Sale {
                id: id.clone(),
                tenant_id: TENANT.to_string(),
                total: item.line_total(),
                total_ars: item.line_total_ars(),
                payment_method: PaymentMethod::Efectivo,
                customer_id: None,
                user_id: None,
                exchange_rate: rate,
                created_at: now,
                updated_at: now,
            },
            items: vec![item],
        };
        state.db.sales(TENANT).insert(&sale).await.unwrap();
        assert!(state.db.products(TENANT).decrement_stock(product_id, 1).await.unwrap());
        id
    }

    #[tokio::test]
    async fn test_update_without_stored_rate_takes_current_sell_rate() {
        let state = test_state().await;
        let a = product(&state, "Yerba", 1000, 5).await;
        let id = recorded_sale(&state, &a, None).await;
        assert_eq!(stock(&state, &a).await, 4);

        let service = SaleService::new(&state, TENANT);
        let updated = service.update(&id, &request(vec![line(&a, 2)]), &seller()).await.unwrap();

        assert_eq!(updated.sale.exchange_rate, Some(ExchangeRate::from_hundredths(125_000)));
        assert_eq!(updated.items[0].ars_price.amount(), 16_500);
        assert_eq!(stock(&state, &a).await, 3);

        let stored = state.db.sales(TENANT).get(&id).await.unwrap().unwrap();
        assert_eq!(stored.sale.exchange_rate, Some(ExchangeRate::from_hundredths(125_000)));
        assert_eq!(stored.sale.total_ars.amount(), 33_000);
    }

    #[tokio::test]
    async fn test_update_keeps_stored_rate() {
        let state = test_state().await;
        let a = product(&state, "Yerba", 1000, 5).await;
        let id = recorded_sale(&state, &a, Some(ExchangeRate::from_hundredths(100_000))).await;

        let service = SaleService::new(&state, TENANT);
        let updated = service.update(&id, &request(vec![line(&a, 1)]), &seller()).await.unwrap();

        assert_eq!(updated.sale.exchange_rate, Some(ExchangeRate::from_hundredths(100_000)));
        assert_eq!(updated.items[0].ars_price.amount(), 13_000);
    }

    #[tokio::test]
    async fn test_update_missing_sale() {
        let state = test_state().await;
        let a = product(&state, "Yerba", 1000, 3).await;
        let err = SaleService::new(&state, TENANT)
            .update("ghost", &request(vec![line(&a, 1)]), &seller())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_delete_restores_stock() {
        let state = test_state().await;
        let a = product(&state, "Yerba", 1000, 5).await;
        let b = product(&state, "Azúcar", 500, 5).await;
        let c = product(&state, "Mate", 800, 5).await;
        let service = SaleService::new(&state, TENANT);

        let sale = service
            .create(&request(vec![line(&a, 1), line(&b, 2), line(&c, 3)]), &seller())
            .await
            .unwrap();
        assert_eq!(stock(&state, &c).await, 2);

        let deleted = service.delete(&sale.sale.id).await.unwrap();
        assert_eq!(deleted.items.len(), 3);

        for id in [&a, &b, &c] {
            assert_eq!(stock(&state, id).await, 5);
        }
        assert_eq!(
            service.delete(&sale.sale.id).await.unwrap_err().code,
            ErrorCode::NotFound
        );
    }
}
