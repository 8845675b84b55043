//! Dashboard aggregation over the fetched order set.
//!
//! The dashboard tiles are pure projections of whatever order slice the
//! shell has on hand (typically today's page); nothing here talks to the
//! backend or holds state.

use serde::Serialize;

use crate::models::{Order, OrderStatus, OrderType};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardMetrics {
    pub total_orders: usize,
    pub pending: usize,
    /// Confirmed, Preparing, Ready or Out for Delivery.
    pub in_progress: usize,
    pub delivered: usize,
    /// Cancelled plus Rejected.
    pub closed_without_sale: usize,
    pub delivery_orders: usize,
    pub takeout_orders: usize,
    /// Sum of `total_amt` over delivered orders.
    pub gross_revenue: f64,
    /// Mean delivered order value; zero when nothing is delivered yet.
    pub average_order_value: f64,
}

impl DashboardMetrics {
    pub fn from_orders(orders: &[Order]) -> Self {
        let mut metrics = DashboardMetrics {
            total_orders: orders.len(),
            ..DashboardMetrics::default()
        };

        for order in orders {
            match order.status {
                OrderStatus::Pending => metrics.pending += 1,
                OrderStatus::Confirmed
                | OrderStatus::Preparing
                | OrderStatus::Ready
                | OrderStatus::OutForDelivery => metrics.in_progress += 1,
                OrderStatus::Delivered => {
                    metrics.delivered += 1;
                    metrics.gross_revenue += order.total_amt;
                }
                OrderStatus::Cancelled | OrderStatus::Rejected => {
                    metrics.closed_without_sale += 1
                }
            }
            match order.order_type {
                OrderType::Delivery => metrics.delivery_orders += 1,
                OrderType::Takeout => metrics.takeout_orders += 1,
            }
        }

        if metrics.delivered > 0 {
            metrics.average_order_value = metrics.gross_revenue / metrics.delivered as f64;
        }
        metrics
    }
}
