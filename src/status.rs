//! Order fulfilment state machine.
//!
//! Forward path: Pending -> Confirmed -> Preparing -> Ready ->
//! Out for Delivery -> Delivered, with the Ready fork depending on order
//! type (takeout orders are handed over as Delivered, delivery orders go
//! out first). Cancel is offered from every non-terminal state; Rejected
//! is reached only by the backend declining an order, never offered here.

use crate::models::{OrderStatus, OrderType};

/// An action the console may offer the admin for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    /// Move the order forward to the given status via the status endpoint.
    Advance(OrderStatus),
    /// Terminal cancellation via the dedicated cancel endpoint.
    Cancel,
}

impl OrderAction {
    /// The status the order lands in when the action succeeds.
    pub fn target(&self) -> OrderStatus {
        match self {
            OrderAction::Advance(status) => *status,
            OrderAction::Cancel => OrderStatus::Cancelled,
        }
    }
}

/// The actions offered for an order in `status` of type `order_type`,
/// forward transitions first, Cancel last. Terminal states offer nothing.
pub fn offered_actions(status: OrderStatus, order_type: OrderType) -> Vec<OrderAction> {
    use OrderStatus::*;

    let mut actions = Vec::new();
    match status {
        Pending => actions.push(OrderAction::Advance(Confirmed)),
        Confirmed => {
            actions.push(OrderAction::Advance(Preparing));
            // Express path: a delivery order can skip straight to dispatch.
            if order_type == OrderType::Delivery {
                actions.push(OrderAction::Advance(OutForDelivery));
            }
        }
        Preparing => actions.push(OrderAction::Advance(Ready)),
        Ready => {
            if order_type == OrderType::Delivery {
                actions.push(OrderAction::Advance(OutForDelivery));
            } else {
                actions.push(OrderAction::Advance(Delivered));
            }
        }
        OutForDelivery => actions.push(OrderAction::Advance(Delivered)),
        Delivered | Cancelled | Rejected => {}
    }
    if !status.is_terminal() {
        actions.push(OrderAction::Cancel);
    }
    actions
}

/// Whether moving `from -> to` is among the offered actions. `to ==
/// Cancelled` matches the Cancel action.
pub fn is_transition_offered(from: OrderStatus, to: OrderStatus, order_type: OrderType) -> bool {
    offered_actions(from, order_type)
        .iter()
        .any(|action| action.target() == to)
}
