//! # Services
//!
//! Multi-step business flows that span several repositories. Plain CRUD
//! stays in the route handlers.
//!
//! - [`sales::SaleService`] - Sale create/update/delete with stock reconciliation
//! - [`purchases::PurchaseService`] - Purchase order intake with shipping proration

pub mod purchases;
pub mod sales;
