//! Session-scoped authentication state.
//!
//! The shell performs login and hands this crate a bearer token; the core
//! never refreshes or re-acquires it. A 401 from any backend call
//! invalidates the session, which also cancels everything scoped to it
//! (the notification poller in particular). Cheap to clone; clones share
//! one session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    token: String,
    authenticated: AtomicBool,
    shutdown: CancellationToken,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                token: token.into(),
                authenticated: AtomicBool::new(true),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    pub fn bearer_token(&self) -> &str {
        &self.inner.token
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.authenticated.load(Ordering::SeqCst)
    }

    /// A token that is cancelled when the session ends. Background tasks
    /// scoped to the session (the poller) select on a child of this.
    pub fn child_token(&self) -> CancellationToken {
        self.inner.shutdown.child_token()
    }

    /// End the session: flips the authenticated flag and cancels all
    /// session-scoped tasks. Idempotent. Called on explicit logout and on
    /// a 401 from the backend.
    pub fn invalidate(&self) {
        if self
            .inner
            .authenticated
            .swap(false, Ordering::SeqCst)
        {
            info!("session invalidated");
            self.inner.shutdown.cancel();
        }
    }

    /// Explicit logout; same teardown path as backend-driven invalidation.
    pub fn logout(&self) {
        self.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidate_is_idempotent_and_cancels_children() {
        let session = Session::new("tok-1");
        let child = session.child_token();
        assert!(session.is_authenticated());
        assert!(!child.is_cancelled());

        session.invalidate();
        assert!(!session.is_authenticated());
        assert!(child.is_cancelled());

        // Second call is a no-op.
        session.invalidate();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn clones_share_one_session() {
        let session = Session::new("tok-2");
        let clone = session.clone();
        clone.logout();
        assert!(!session.is_authenticated());
    }
}
