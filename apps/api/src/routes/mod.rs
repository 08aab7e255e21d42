//! Route handlers organized by resource.
//!
//! Each module exposes `router()` with paths relative to `/api`.

pub mod auth;
pub mod cash_drawers;
pub mod customers;
pub mod email;
pub mod employees;
pub mod health;
pub mod inventory;
pub mod loyalty;
pub mod products;
pub mod purchase_orders;
pub mod reports;
pub mod sales;
pub mod suppliers;

use serde::Serialize;
use storehub_core::Page;

/// Envelope for list endpoints.
#[derive(Debug, Serialize)]
pub struct Listing<T> {
    pub items: Vec<T>,
    pub limit: i64,
    pub offset: i64,
}

impl<T> Listing<T> {
    pub fn new(items: Vec<T>, page: Page) -> Self {
        Listing {
            items,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

/// Trims an optional query parameter; blank means absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
