//! Order list filtering and backend query construction.
//!
//! The workbench owns one `OrderFilter`; quick status chips and the
//! advanced filter panel both write the same fields. The filter is passed
//! verbatim to the backend on every fetch, after empty values are
//! stripped.

use chrono::NaiveDate;

use crate::models::{OrderStatus, OrderType};

/// The admin's current query parameters. Every field is optional; `page`
/// is 1-based and `page_size` maps to the backend's `limit`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub order_type: Option<OrderType>,
    /// Inclusive lower bound on the order creation date.
    pub from: Option<NaiveDate>,
    /// Inclusive upper bound on the order creation date.
    pub to: Option<NaiveDate>,
    pub q: Option<String>,
    pub page: u32,
    pub page_size: u32,
}

impl OrderFilter {
    /// First page of the newest orders, as the notification poller fetches
    /// them.
    pub fn recent(limit: u32) -> Self {
        OrderFilter {
            page: 1,
            page_size: limit,
            ..OrderFilter::default()
        }
    }

    /// Query pairs for the backend. Unset and empty values are stripped;
    /// whatever remains is forwarded untouched.
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query: Vec<(String, String)> = Vec::new();
        if let Some(status) = self.status {
            query.push(("status".to_string(), status.to_string()));
        }
        if let Some(order_type) = self.order_type {
            query.push(("orderType".to_string(), order_type.to_string()));
        }
        if let Some(from) = self.from {
            query.push(("from".to_string(), from.format("%Y-%m-%d").to_string()));
        }
        if let Some(to) = self.to {
            query.push(("to".to_string(), to.format("%Y-%m-%d").to_string()));
        }
        if let Some(q) = self.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            query.push(("q".to_string(), q.to_string()));
        }
        if self.page > 0 {
            query.push(("page".to_string(), self.page.to_string()));
        }
        if self.page_size > 0 {
            query.push(("limit".to_string(), self.page_size.to_string()));
        }
        query
    }
}
