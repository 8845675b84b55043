//! The admin's order working set.
//!
//! Owns the active filter and the fetched page, and orchestrates every
//! mutation. The backend is the single source of truth: a mutation is a
//! backend call followed by a refetch of the current page, never a local
//! edit. Rapid filter changes can resolve out of order, so every fetch
//! carries a generation ticket and a response is applied only while its
//! ticket is still current.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::api::OrderBackend;
use crate::config::ConsoleConfig;
use crate::error::{ApiError, ConsoleError};
use crate::filters::OrderFilter;
use crate::models::{Order, OrderStatus, OrderType, StaffAssignment};
use crate::status;

struct WorkbenchState {
    filter: OrderFilter,
    /// Last applied (non-stale) page.
    orders: Vec<Order>,
    /// Ticket of the most recently issued fetch.
    fetch_generation: u64,
    /// Ticket of the most recent search keystroke.
    search_epoch: u64,
}

pub struct Workbench {
    backend: Arc<dyn OrderBackend>,
    state: Mutex<WorkbenchState>,
    search_debounce: Duration,
}

impl Workbench {
    pub fn new(backend: Arc<dyn OrderBackend>, config: &ConsoleConfig) -> Self {
        Self {
            backend,
            state: Mutex::new(WorkbenchState {
                filter: OrderFilter {
                    page: 1,
                    page_size: config.page_size,
                    ..OrderFilter::default()
                },
                orders: Vec::new(),
                fetch_generation: 0,
                search_epoch: 0,
            }),
            search_debounce: config.search_debounce,
        }
    }

    /// Snapshot of the active filter.
    pub fn filter(&self) -> OrderFilter {
        self.state.lock().unwrap().filter.clone()
    }

    /// Snapshot of the current page.
    pub fn orders(&self) -> Vec<Order> {
        self.state.lock().unwrap().orders.clone()
    }

    // -----------------------------------------------------------------------
    // Fetching
    // -----------------------------------------------------------------------

    fn begin_fetch(&self) -> (u64, OrderFilter) {
        let mut state = self.state.lock().unwrap();
        state.fetch_generation += 1;
        (state.fetch_generation, state.filter.clone())
    }

    fn apply_page(&self, ticket: u64, page: Vec<Order>) -> bool {
        let mut state = self.state.lock().unwrap();
        if state.fetch_generation != ticket {
            debug!(ticket, current = state.fetch_generation, "discarding stale order page");
            return false;
        }
        state.orders = page;
        true
    }

    /// Fetch the current filtered page. The response is applied only if no
    /// newer fetch was issued while it was in flight.
    pub async fn refresh(&self) -> Result<(), ConsoleError> {
        let (ticket, filter) = self.begin_fetch();
        let page = self.backend.list_orders(&filter).await?;
        self.apply_page(ticket, page);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Filter edits
    // -----------------------------------------------------------------------

    /// Any filter edit other than the page number itself jumps back to
    /// page 1.
    fn edit_filter(&self, edit: impl FnOnce(&mut OrderFilter)) {
        let mut state = self.state.lock().unwrap();
        edit(&mut state.filter);
        state.filter.page = 1;
    }

    /// Status filter. Quick chips and the advanced panel both land here.
    pub async fn set_status(&self, status: Option<OrderStatus>) -> Result<(), ConsoleError> {
        self.edit_filter(|f| f.status = status);
        self.refresh().await
    }

    pub async fn set_order_type(&self, order_type: Option<OrderType>) -> Result<(), ConsoleError> {
        self.edit_filter(|f| f.order_type = order_type);
        self.refresh().await
    }

    /// Inclusive creation-date bounds.
    pub async fn set_date_range(
        &self,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<(), ConsoleError> {
        self.edit_filter(|f| {
            f.from = from;
            f.to = to;
        });
        self.refresh().await
    }

    pub async fn set_page(&self, page: u32) -> Result<(), ConsoleError> {
        {
            let mut state = self.state.lock().unwrap();
            state.filter.page = page.max(1);
        }
        self.refresh().await
    }

    /// Debounced free-text search. Call once per keystroke; each call
    /// supersedes the pending one, and only the call still current when
    /// the quiet window closes applies its text and fetches. Returns
    /// whether this call was the one that fired.
    pub async fn set_search(&self, q: impl Into<String>) -> Result<bool, ConsoleError> {
        let q = q.into();
        let ticket = {
            let mut state = self.state.lock().unwrap();
            state.search_epoch += 1;
            state.search_epoch
        };

        tokio::time::sleep(self.search_debounce).await;

        {
            let mut state = self.state.lock().unwrap();
            if state.search_epoch != ticket {
                return Ok(false);
            }
            let trimmed = q.trim();
            state.filter.q = if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            };
            state.filter.page = 1;
        }
        self.refresh().await.map(|_| true)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Load one order for the detail view. A missing or malformed order is
    /// an empty state, not an error.
    pub async fn load_order(&self, order_number: &str) -> Result<Option<Order>, ConsoleError> {
        match self.backend.get_order(order_number).await {
            Ok(order) => Ok(Some(order)),
            Err(ApiError::NotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply a forward status transition. The transition must be offered
    /// by the state machine for the order's current state and type; the
    /// local list only changes through the refetch after the backend
    /// confirms.
    pub async fn advance_status(
        &self,
        order: &Order,
        to: OrderStatus,
    ) -> Result<(), ConsoleError> {
        if !status::is_transition_offered(order.status, to, order.order_type) {
            return Err(ConsoleError::TransitionNotOffered {
                from: order.status,
                to,
            });
        }
        self.backend
            .update_status(&order.order_number, to)
            .await?;
        info!(order_number = %order.order_number, status = %to, "order status updated");
        self.refresh().await
    }

    /// Terminal cancellation via the dedicated endpoint.
    pub async fn cancel(&self, order: &Order) -> Result<(), ConsoleError> {
        if order.status.is_terminal() {
            return Err(ConsoleError::TransitionNotOffered {
                from: order.status,
                to: OrderStatus::Cancelled,
            });
        }
        self.backend.cancel_order(&order.order_number).await?;
        info!(order_number = %order.order_number, "order cancelled");
        self.refresh().await
    }

    /// Attach a staff member to an order. Independent of the status
    /// machine; never changes order status.
    pub async fn assign_staff(
        &self,
        order: &Order,
        assignment: StaffAssignment,
    ) -> Result<(), ConsoleError> {
        if assignment.name.trim().is_empty() {
            return Err(ConsoleError::MissingStaffName);
        }
        self.backend
            .assign_staff(&order.order_number, &assignment)
            .await?;
        info!(
            order_number = %order.order_number,
            staff = %assignment.name,
            "staff assigned"
        );
        self.refresh().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiResult;
    use crate::models::StaffRole;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;

    fn order(number: &str, status: OrderStatus, order_type: OrderType) -> Order {
        Order {
            id: format!("id-{number}"),
            order_number: number.to_string(),
            status,
            order_type,
            sub_total_amt: 100.0,
            total_discount: 0.0,
            total_amt: 100.0,
            created_at: Utc::now(),
            items: Vec::new(),
            delivery_address: None,
            tracking: None,
            staff: None,
        }
    }

    struct ScriptedPage {
        delay: Duration,
        orders: Vec<Order>,
    }

    /// Pages are keyed by the status filter so tests can give different
    /// filters different latencies (the stale-response scenario).
    #[derive(Default)]
    struct FakeBackend {
        pages: Mutex<HashMap<String, ScriptedPage>>,
        detail: Mutex<Option<Order>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        fn page_for(&self, status: Option<OrderStatus>, delay: Duration, orders: Vec<Order>) {
            let key = status.map(|s| s.to_string()).unwrap_or_else(|| "*".to_string());
            self.pages
                .lock()
                .unwrap()
                .insert(key, ScriptedPage { delay, orders });
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OrderBackend for FakeBackend {
        async fn list_orders(&self, filter: &OrderFilter) -> ApiResult<Vec<Order>> {
            let key = filter
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "*".to_string());
            self.calls
                .lock()
                .unwrap()
                .push(format!("list:{key}:page={}", filter.page));
            let (delay, orders) = {
                let pages = self.pages.lock().unwrap();
                match pages.get(&key) {
                    Some(page) => (page.delay, page.orders.clone()),
                    None => (Duration::ZERO, Vec::new()),
                }
            };
            tokio::time::sleep(delay).await;
            Ok(orders)
        }

        async fn get_order(&self, order_number: &str) -> ApiResult<Order> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("get:{order_number}"));
            self.detail
                .lock()
                .unwrap()
                .clone()
                .ok_or(ApiError::NotFound)
        }

        async fn update_status(&self, order_number: &str, status: OrderStatus) -> ApiResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("status:{order_number}:{status}"));
            Ok(())
        }

        async fn cancel_order(&self, order_number: &str) -> ApiResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("cancel:{order_number}"));
            Ok(())
        }

        async fn assign_staff(
            &self,
            order_number: &str,
            assignment: &StaffAssignment,
        ) -> ApiResult<()> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("assign:{order_number}:{}", assignment.name));
            Ok(())
        }
    }

    fn workbench(backend: Arc<FakeBackend>) -> Arc<Workbench> {
        let config = ConsoleConfig::new("https://admin.kirana.store");
        Arc::new(Workbench::new(backend, &config))
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_is_discarded() {
        let backend = FakeBackend::new();
        backend.page_for(
            None,
            Duration::from_millis(500),
            vec![order("KA-1", OrderStatus::Confirmed, OrderType::Takeout)],
        );
        backend.page_for(
            Some(OrderStatus::Pending),
            Duration::ZERO,
            vec![order("KA-2", OrderStatus::Pending, OrderType::Delivery)],
        );
        let wb = workbench(backend);

        // F1: unfiltered fetch, slow.
        let slow = {
            let wb = wb.clone();
            tokio::spawn(async move { wb.refresh().await })
        };
        tokio::task::yield_now().await;

        // F2: status filter applied while F1 is in flight; resolves first.
        wb.set_status(Some(OrderStatus::Pending)).await.unwrap();
        assert_eq!(wb.orders()[0].order_number, "KA-2");

        // F1 resolves late and must not regress the list.
        slow.await.unwrap().unwrap();
        assert_eq!(wb.orders().len(), 1);
        assert_eq!(wb.orders()[0].order_number, "KA-2");
    }

    #[tokio::test(start_paused = true)]
    async fn rapid_search_edits_collapse_to_last() {
        let backend = FakeBackend::new();
        let wb = workbench(backend.clone());

        let first = {
            let wb = wb.clone();
            tokio::spawn(async move { wb.set_search("ri").await })
        };
        tokio::task::yield_now().await;

        let second_fired = wb.set_search("rice").await.unwrap();
        assert!(second_fired);
        assert!(!first.await.unwrap().unwrap(), "superseded keystroke must not fire");

        assert_eq!(wb.filter().q.as_deref(), Some("rice"));
        // Exactly one fetch: the superseded keystroke never reached the
        // backend.
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn search_strips_to_none_and_resets_page() {
        let backend = FakeBackend::new();
        let wb = workbench(backend.clone());
        wb.set_page(4).await.unwrap();
        assert_eq!(wb.filter().page, 4);

        wb.set_search("   ").await.unwrap();
        assert_eq!(wb.filter().q, None);
        assert_eq!(wb.filter().page, 1);
    }

    #[tokio::test]
    async fn filter_edits_reset_page_but_page_moves_alone() {
        let backend = FakeBackend::new();
        let wb = workbench(backend.clone());

        wb.set_page(3).await.unwrap();
        wb.set_status(Some(OrderStatus::Pending)).await.unwrap();
        assert_eq!(wb.filter().page, 1, "filter edit resets to page 1");

        wb.set_page(2).await.unwrap();
        assert_eq!(wb.filter().status, Some(OrderStatus::Pending));
        assert_eq!(wb.filter().page, 2, "page moves without touching filters");

        let calls = backend.calls();
        assert_eq!(
            calls,
            vec![
                "list:*:page=3",
                "list:Pending:page=1",
                "list:Pending:page=2",
            ]
        );
    }

    #[tokio::test]
    async fn advance_confirms_with_backend_then_refetches() {
        let backend = FakeBackend::new();
        backend.page_for(
            None,
            Duration::ZERO,
            vec![order("KA-1", OrderStatus::Confirmed, OrderType::Takeout)],
        );
        let wb = workbench(backend.clone());

        let pending = order("KA-1", OrderStatus::Pending, OrderType::Takeout);
        wb.advance_status(&pending, OrderStatus::Confirmed)
            .await
            .unwrap();

        assert_eq!(
            backend.calls(),
            vec!["status:KA-1:Confirmed", "list:*:page=1"]
        );
        // The list reflects refetched server state, not a local edit.
        assert_eq!(wb.orders()[0].status, OrderStatus::Confirmed);
    }

    #[tokio::test]
    async fn illegal_transition_fails_locally_without_a_call() {
        let backend = FakeBackend::new();
        let wb = workbench(backend.clone());

        let ready_takeout = order("KA-9", OrderStatus::Ready, OrderType::Takeout);
        let err = wb
            .advance_status(&ready_takeout, OrderStatus::OutForDelivery)
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::TransitionNotOffered { .. }));
        assert!(backend.calls().is_empty());

        // Same state, Delivery type: dispatch is the offered path.
        let ready_delivery = order("KA-10", OrderStatus::Ready, OrderType::Delivery);
        wb.advance_status(&ready_delivery, OrderStatus::OutForDelivery)
            .await
            .unwrap();
        assert_eq!(backend.calls()[0], "status:KA-10:Out for Delivery");
    }

    #[tokio::test]
    async fn cancel_uses_dedicated_endpoint_and_rejects_terminal_orders() {
        let backend = FakeBackend::new();
        let wb = workbench(backend.clone());

        wb.cancel(&order("KA-3", OrderStatus::Preparing, OrderType::Delivery))
            .await
            .unwrap();
        assert_eq!(backend.calls()[0], "cancel:KA-3");

        let err = wb
            .cancel(&order("KA-4", OrderStatus::Delivered, OrderType::Delivery))
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::TransitionNotOffered { .. }));
    }

    #[tokio::test]
    async fn assign_requires_a_name_and_never_touches_status() {
        let backend = FakeBackend::new();
        let wb = workbench(backend.clone());
        let target = order("KA-5", OrderStatus::Confirmed, OrderType::Delivery);

        let err = wb
            .assign_staff(
                &target,
                StaffAssignment {
                    name: "  ".to_string(),
                    role: StaffRole::Delivery,
                    contact: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ConsoleError::MissingStaffName));
        assert!(backend.calls().is_empty(), "validation failed before any call");

        wb.assign_staff(
            &target,
            StaffAssignment {
                name: "Ravi".to_string(),
                role: StaffRole::Delivery,
                contact: Some("98450-11111".to_string()),
            },
        )
        .await
        .unwrap();
        assert_eq!(
            backend.calls(),
            vec!["assign:KA-5:Ravi", "list:*:page=1"]
        );
    }

    #[tokio::test]
    async fn missing_order_is_an_empty_state() {
        let backend = FakeBackend::new();
        let wb = workbench(backend.clone());
        assert!(wb.load_order("KA-404").await.unwrap().is_none());

        *backend.detail.lock().unwrap() =
            Some(order("KA-6", OrderStatus::Pending, OrderType::Takeout));
        let loaded = wb.load_order("KA-6").await.unwrap().expect("order");
        assert_eq!(loaded.order_number, "KA-6");
    }
}
