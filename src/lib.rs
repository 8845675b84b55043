//! Kirana Admin Console — headless core.
//!
//! The admin console shell (pages, forms, tables) is a thin layer over
//! this crate: it renders what the workbench and notification centre
//! expose and forwards user actions back in. Almost all state lives
//! server-side; what this crate owns is the order notification poller,
//! the order workbench (filters, pagination, status transitions) and the
//! dashboard aggregation derived from fetched orders.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod filters;
pub mod models;
pub mod notifications;
pub mod session;
pub mod status;
pub mod workbench;

pub use api::{normalize_base_url, ApiClient, OrderBackend, OrderFeed};
pub use config::ConsoleConfig;
pub use dashboard::DashboardMetrics;
pub use error::{ApiError, ApiResult, ConsoleError};
pub use filters::OrderFilter;
pub use models::{
    Notification, NotificationKind, Order, OrderItem, OrderStatus, OrderType, StaffAssignment,
    StaffRole, TrackingEntry,
};
pub use notifications::{spawn_poller, NotificationCenter};
pub use session::Session;
pub use status::{is_transition_offered, offered_actions, OrderAction};
pub use workbench::Workbench;

/// Initialize structured logging (console, plus a rolling daily file when
/// a log directory is given).
pub fn init_tracing(log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kirana_admin=debug"));

    let console_layer = fmt::layer().with_target(true);

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create log dir {}", dir.display()))?;
            let file_appender = tracing_appender::rolling::daily(dir, "kirana-admin");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let file_layer = fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true);
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .with(file_layer)
                .try_init()?;
            // Dropping the guard flushes the file writer; the subscriber
            // lives until process exit, so leak it.
            std::mem::forget(guard);
        }
        None => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(console_layer)
                .try_init()?;
        }
    }
    Ok(())
}

/// One authenticated admin session: API client, workbench, notification
/// centre and the background poller, torn down together on logout or
/// session invalidation.
pub struct AdminConsole {
    session: Session,
    workbench: Arc<Workbench>,
    notifications: Arc<NotificationCenter>,
    poller: tokio::task::JoinHandle<()>,
}

impl AdminConsole {
    /// Wire up a session with the given bearer token and start the order
    /// poller. Must run inside a tokio runtime.
    pub fn connect(config: ConsoleConfig, token: impl Into<String>) -> Result<Self, ConsoleError> {
        let session = Session::new(token);
        let client = Arc::new(ApiClient::new(&config, session.clone())?);
        let notifications = Arc::new(NotificationCenter::new(config.notification_cap));
        let poller = notifications::spawn_poller(
            client.clone(),
            notifications.clone(),
            &config,
            session.child_token(),
        );
        let workbench = Arc::new(Workbench::new(client, &config));
        info!(base_url = %config.base_url, "admin console connected");
        Ok(Self {
            session,
            workbench,
            notifications,
            poller,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn workbench(&self) -> &Arc<Workbench> {
        &self.workbench
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    /// End the session and wait for the poller to wind down.
    pub async fn shutdown(self) {
        self.session.invalidate();
        let _ = self.poller.await;
    }
}
