use std::sync::Arc;

use tracing::debug;

use super::store::{StoreError, TokenStore};
use crate::routes::ENTRY_VIEW;

/// Outcome of an admission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Render the requested view.
    Allow(String),
    /// Go to the redirect target instead.
    Deny(String),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow(_))
    }
}

/// The two session states. There is no terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Unauthenticated,
    Authenticated,
}

/// Admission control for protected views.
///
/// Holds no state of its own: every decision reads the store afresh, since
/// a failed call can clear it between any two checks.
#[derive(Clone)]
pub struct SessionGate {
    store: Arc<dyn TokenStore>,
}

impl SessionGate {
    pub fn new(store: Arc<dyn TokenStore>) -> Self {
        Self { store }
    }

    pub fn state(&self) -> Result<SessionState, StoreError> {
        if self.store.is_authenticated()? {
            Ok(SessionState::Authenticated)
        } else {
            Ok(SessionState::Unauthenticated)
        }
    }

    /// Allow the view iff a token is held; otherwise deny towards the entry view.
    pub fn admit(&self, requested_view: &str) -> Result<Decision, StoreError> {
        let decision = match self.state()? {
            SessionState::Authenticated => Decision::Allow(requested_view.to_string()),
            SessionState::Unauthenticated => Decision::Deny(ENTRY_VIEW.to_string()),
        };
        debug!(view = requested_view, ?decision, "Admission check");
        Ok(decision)
    }
}
