//! Route table and navigation.
//!
//! Three rules: `/` is the public login view, `/dashboard` is protected by
//! the `SessionGate`, and every other path redirects to `/`.

use tracing::debug;

use crate::auth::{Decision, SessionGate, StoreError};

/// The fixed unauthenticated entry view.
pub const ENTRY_VIEW: &str = "/";

/// Landing view after a successful login.
pub const DASHBOARD_VIEW: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Dashboard,
}

impl Route {
    pub fn from_path(path: &str) -> Option<Self> {
        match path {
            ENTRY_VIEW => Some(Route::Login),
            DASHBOARD_VIEW => Some(Route::Dashboard),
            _ => None,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => ENTRY_VIEW,
            Route::Dashboard => DASHBOARD_VIEW,
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard)
    }
}

/// What the view layer should do for a requested path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Render(Route),
    /// Replace the requested path with this route.
    Redirect(Route),
}

impl Navigation {
    /// The route that ends up on screen
    pub fn route(&self) -> Route {
        match self {
            Navigation::Render(route) | Navigation::Redirect(route) => *route,
        }
    }
}

#[derive(Clone)]
pub struct Router {
    gate: SessionGate,
}

impl Router {
    pub fn new(gate: SessionGate) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &SessionGate {
        &self.gate
    }

    pub fn navigate(&self, path: &str) -> Result<Navigation, StoreError> {
        let Some(route) = Route::from_path(path) else {
            debug!(path, "Unknown path, redirecting to entry view");
            return Ok(Navigation::Redirect(Route::Login));
        };

        if !route.is_protected() {
            return Ok(Navigation::Render(route));
        }

        match self.gate.admit(route.path())? {
            Decision::Allow(_) => Ok(Navigation::Render(route)),
            Decision::Deny(target) => Ok(Navigation::Redirect(
                Route::from_path(&target).unwrap_or(Route::Login),
            )),
        }
    }

    /// Where to go once a login succeeded
    pub fn after_login(&self) -> Result<Navigation, StoreError> {
        self.navigate(DASHBOARD_VIEW)
    }

    /// Where to go after a logout or a forced logout
    pub fn after_logout(&self) -> Result<Navigation, StoreError> {
        self.navigate(ENTRY_VIEW)
    }
}
