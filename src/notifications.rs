//! New-order detection and the in-memory notification centre.
//!
//! The admin backend has no push channel, so a session-scoped background
//! task polls the most recent order page on a fixed cadence and diffs it
//! against the last seen order id. Newly arrived `Pending` orders become
//! notifications: a transient toast on the broadcast channel plus a
//! persistent unread entry at the head of the list. The centre owns the
//! cursor and the list exclusively; collaborators only read snapshots and
//! call `mark_all_read` / `clear`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::OrderFeed;
use crate::config::ConsoleConfig;
use crate::models::{Notification, NotificationKind, Order, OrderStatus};

/// Buffered toasts before slow subscribers start losing the oldest.
const TOAST_CHANNEL_CAPACITY: usize = 32;

// ---------------------------------------------------------------------------
// Detection
// ---------------------------------------------------------------------------

/// Orders in `fetched` (newest first) that arrived after `last_seen`.
///
/// When `last_seen` is absent from the page entirely, the whole page is
/// treated as new. If more than a page's worth of orders arrives between
/// polls this both misses orders beyond the page boundary and may
/// re-announce ones near it; whether to tighten the page size or cadence
/// instead is a product call (`ConsoleConfig::poll_page_size` /
/// `poll_interval`), not one this function makes.
fn orders_after<'a>(last_seen: &str, fetched: &'a [Order]) -> &'a [Order] {
    match fetched.iter().position(|order| order.id == last_seen) {
        Some(idx) => &fetched[..idx],
        None => fetched,
    }
}

fn notification_for(order: &Order) -> Notification {
    Notification {
        id: Uuid::new_v4(),
        title: "New order received".to_string(),
        message: format!(
            "Order #{} is waiting for confirmation ({} item(s))",
            order.order_number,
            order.items.len()
        ),
        created_at: Utc::now(),
        read: false,
        kind: NotificationKind::Order,
        order_number: Some(order.order_number.clone()),
    }
}

// ---------------------------------------------------------------------------
// Notification centre
// ---------------------------------------------------------------------------

struct CenterState {
    /// Id of the most recently seen order, or `None` before the baseline
    /// poll. A failed poll never touches this.
    last_seen_order_id: Option<String>,
    /// Newest first.
    notifications: VecDeque<Notification>,
}

pub struct NotificationCenter {
    state: Mutex<CenterState>,
    toasts: broadcast::Sender<Notification>,
    cap: usize,
}

impl NotificationCenter {
    pub fn new(cap: usize) -> Self {
        let (toasts, _) = broadcast::channel(TOAST_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(CenterState {
                last_seen_order_id: None,
                notifications: VecDeque::new(),
            }),
            toasts,
            cap,
        }
    }

    /// Transient toast stream. Subscribers joining late only see toasts
    /// emitted after they subscribe; the persistent list is the catch-up
    /// surface.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.toasts.subscribe()
    }

    /// Fold one polled page (newest first) into the centre. Returns how
    /// many notifications were emitted.
    ///
    /// The first non-empty page only establishes the baseline so orders
    /// that existed before the admin started watching stay silent. The
    /// cursor always advances to the newest fetched order, found-new or
    /// not, so a page is never reprocessed.
    pub fn observe_page(&self, fetched: &[Order]) -> usize {
        if fetched.is_empty() {
            return 0;
        }

        let mut state = self.state.lock().unwrap();
        let previous = state.last_seen_order_id.take();
        state.last_seen_order_id = Some(fetched[0].id.clone());

        let Some(previous) = previous else {
            debug!(order_id = %fetched[0].id, "notification baseline established");
            return 0;
        };
        if previous == fetched[0].id {
            return 0;
        }

        let fresh = orders_after(&previous, fetched);
        if fresh.len() == fetched.len() {
            warn!(
                page_len = fetched.len(),
                last_seen = %previous,
                "last seen order not in page; treating entire page as new"
            );
        }

        let announced: Vec<Notification> = fresh
            .iter()
            .filter(|order| order.status == OrderStatus::Pending)
            .map(notification_for)
            .collect();

        // Toasts fire newest first; the block lands at the head of the
        // list in the same order.
        for notification in &announced {
            let _ = self.toasts.send(notification.clone());
        }
        for notification in announced.iter().rev() {
            state.notifications.push_front(notification.clone());
        }
        while state.notifications.len() > self.cap {
            state.notifications.pop_back();
        }

        announced.len()
    }

    /// Store a system notice (and toast it). Used by the shell for
    /// non-order events; detection state is untouched.
    pub fn push_system(&self, title: impl Into<String>, message: impl Into<String>) {
        let notification = Notification {
            id: Uuid::new_v4(),
            title: title.into(),
            message: message.into(),
            created_at: Utc::now(),
            read: false,
            kind: NotificationKind::System,
            order_number: None,
        };
        let _ = self.toasts.send(notification.clone());
        let mut state = self.state.lock().unwrap();
        state.notifications.push_front(notification);
        while state.notifications.len() > self.cap {
            state.notifications.pop_back();
        }
    }

    /// Snapshot of the list, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.state
            .lock()
            .unwrap()
            .notifications
            .iter()
            .cloned()
            .collect()
    }

    pub fn unread_count(&self) -> usize {
        self.state
            .lock()
            .unwrap()
            .notifications
            .iter()
            .filter(|n| !n.read)
            .count()
    }

    /// Mark every notification read. Idempotent; never changes the count.
    pub fn mark_all_read(&self) {
        let mut state = self.state.lock().unwrap();
        for notification in state.notifications.iter_mut() {
            notification.read = true;
        }
    }

    /// Empty the list. The detection cursor survives so cleared orders are
    /// not re-announced.
    pub fn clear(&self) {
        self.state.lock().unwrap().notifications.clear();
    }
}

// ---------------------------------------------------------------------------
// Poller loop
// ---------------------------------------------------------------------------

/// Start the order poller. Spawns a session-scoped task that fetches the
/// most recent order page immediately and then on every interval tick
/// until `shutdown` fires. The loop body is strictly sequential and missed
/// ticks are skipped, so two polls never race the cursor.
pub fn spawn_poller(
    feed: Arc<dyn OrderFeed>,
    center: Arc<NotificationCenter>,
    config: &ConsoleConfig,
    shutdown: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    let interval = config.poll_interval;
    let page_size = config.poll_page_size;

    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "order poller started");
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("order poller stopped");
                    break;
                }
                _ = ticker.tick() => {}
            }

            match feed.recent_orders(page_size).await {
                Ok(page) => {
                    let emitted = center.observe_page(&page);
                    if emitted > 0 {
                        info!(new_orders = emitted, "new orders detected");
                    }
                }
                // Transient by policy: skip the tick, keep the cursor,
                // retry on the next one.
                Err(e) => warn!(error = %e, "order poll failed; will retry next tick"),
            }
        }
    })
}
