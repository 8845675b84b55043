//! Console configuration.
//!
//! One explicit struct instead of scattered constants; the shell builds it
//! at login time (optionally from environment variables) and hands it to
//! `AdminConsole::connect`. Cadence and page sizes are configurable so
//! product owners can tighten the polling precision trade-off without a
//! code change.

use anyhow::Context;
use std::time::Duration;

use crate::api::normalize_base_url;

/// How often the notification poller asks for the most recent orders.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);
/// Page size of the poller's recent-orders fetch. Arrivals beyond one page
/// between polls hit the whole-page fallback in detection.
pub const DEFAULT_POLL_PAGE_SIZE: u32 = 10;
/// Quiet window after the last keystroke before a search fetch fires.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(420);
/// Workbench page size.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Retained notification bound; oldest entries are evicted beyond it.
pub const DEFAULT_NOTIFICATION_CAP: usize = 100;

#[derive(Debug, Clone)]
pub struct ConsoleConfig {
    /// Normalised backend base URL (scheme ensured, trailing `/` and
    /// trailing `/api` stripped).
    pub base_url: String,
    pub poll_interval: Duration,
    pub poll_page_size: u32,
    pub search_debounce: Duration,
    pub page_size: u32,
    pub notification_cap: usize,
}

impl ConsoleConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            poll_interval: DEFAULT_POLL_INTERVAL,
            poll_page_size: DEFAULT_POLL_PAGE_SIZE,
            search_debounce: DEFAULT_SEARCH_DEBOUNCE,
            page_size: DEFAULT_PAGE_SIZE,
            notification_cap: DEFAULT_NOTIFICATION_CAP,
        }
    }

    /// Read configuration from the environment: `KIRANA_API_URL`
    /// (required), `KIRANA_POLL_INTERVAL_SECS` and `KIRANA_PAGE_SIZE`
    /// (optional overrides).
    pub fn from_env() -> anyhow::Result<Self> {
        let base_url =
            std::env::var("KIRANA_API_URL").context("KIRANA_API_URL is not set")?;
        let mut config = Self::new(&base_url);

        if let Ok(raw) = std::env::var("KIRANA_POLL_INTERVAL_SECS") {
            let secs: u64 = raw
                .parse()
                .with_context(|| format!("invalid KIRANA_POLL_INTERVAL_SECS: {raw}"))?;
            config.poll_interval = Duration::from_secs(secs.max(1));
        }
        if let Ok(raw) = std::env::var("KIRANA_PAGE_SIZE") {
            let size: u32 = raw
                .parse()
                .with_context(|| format!("invalid KIRANA_PAGE_SIZE: {raw}"))?;
            config.page_size = size.max(1);
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_product_cadence() {
        let config = ConsoleConfig::new("https://admin.kirana.store");
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.poll_page_size, 10);
        assert!(config.search_debounce >= Duration::from_millis(400));
        assert!(config.search_debounce <= Duration::from_millis(450));
        assert_eq!(config.notification_cap, 100);
    }

    #[test]
    fn base_url_is_normalized_on_construction() {
        let config = ConsoleConfig::new("admin.kirana.store/api/");
        assert_eq!(config.base_url, "https://admin.kirana.store");
    }
}
