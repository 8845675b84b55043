//! Wire and domain models for the admin console core.
//!
//! Orders arrive from the admin backend as camelCase JSON inside a
//! `{ "data": ... }` envelope; snake_case aliases are accepted because the
//! backend has emitted both shapes across versions. Notifications are
//! client-local and never leave the process.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Order status / type / staff role enums
// ---------------------------------------------------------------------------

/// Fulfilment status of an order. Wire strings are the human-facing forms
/// the backend stores (`"Out for Delivery"`, not an identifier).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Preparing,
    Ready,
    #[serde(rename = "Out for Delivery")]
    OutForDelivery,
    Delivered,
    Cancelled,
    Rejected,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "Pending",
            OrderStatus::Confirmed => "Confirmed",
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready",
            OrderStatus::OutForDelivery => "Out for Delivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
            OrderStatus::Rejected => "Rejected",
        }
    }

    /// `Delivered`, `Cancelled` and `Rejected` accept no further
    /// transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Rejected
        )
    }

    /// Parse a status string the way older backend versions and free-form
    /// UI inputs spell it ("canceled", "approved", mixed case).
    pub fn parse_lenient(raw: &str) -> Option<OrderStatus> {
        match raw.trim().to_lowercase().as_str() {
            "pending" => Some(OrderStatus::Pending),
            "confirmed" | "approved" => Some(OrderStatus::Confirmed),
            "preparing" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "out for delivery" | "out_for_delivery" => Some(OrderStatus::OutForDelivery),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" | "canceled" => Some(OrderStatus::Cancelled),
            "rejected" | "declined" => Some(OrderStatus::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the customer receives the order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderType {
    Delivery,
    Takeout,
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OrderType::Delivery => "Delivery",
            OrderType::Takeout => "Takeout",
        })
    }
}

/// Roles that can be attached to an order via personnel assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaffRole {
    Delivery,
    Picker,
    Manager,
    Cashier,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// One ordered line item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub name: String,
    pub quantity: u32,
    pub price: f64,
}

impl OrderItem {
    pub fn line_total(&self) -> f64 {
        self.price * f64::from(self.quantity)
    }
}

/// One append-only tracking log entry. Entries on an order are
/// non-decreasing by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingEntry {
    pub status: OrderStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A staff member attached to an order for fulfilment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffAssignment {
    pub name: String,
    pub role: StaffRole,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
}

/// A customer purchase tracked through the fulfilment lifecycle.
///
/// `total_amt = sub_total_amt - total_discount` is backend-enforced; the
/// console displays the totals it receives and never recomputes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Internal identifier, stable and immutable. The poller's cursor.
    pub id: String,
    /// Human-facing number used in URLs, mutations and display.
    #[serde(alias = "order_number")]
    pub order_number: String,
    pub status: OrderStatus,
    #[serde(alias = "order_type")]
    pub order_type: OrderType,
    #[serde(default, alias = "sub_total_amt")]
    pub sub_total_amt: f64,
    #[serde(default, alias = "total_discount")]
    pub total_discount: f64,
    #[serde(default, alias = "total_amt")]
    pub total_amt: f64,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, alias = "delivery_address", skip_serializing_if = "Option::is_none")]
    pub delivery_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking: Option<Vec<TrackingEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff: Option<Vec<StaffAssignment>>,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Order,
    System,
}

/// A client-local, ephemeral record of something the admin should see.
/// Created by the poller (or by the shell for system messages), destroyed
/// on clear or process exit; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub kind: NotificationKind,
    /// Human-facing number of the source order, for navigation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
}
