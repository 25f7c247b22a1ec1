//! Application state and screen handling.
//!
//! `App` plays the part of the view router and credential form: it asks the
//! `Router` where a path leads, renders the login or dashboard screen, and
//! follows redirects, including the one back to `/` after a forced logout.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use gagnons_core::config::{ENV_PASSWORD, ENV_USERNAME};
use gagnons_core::{
    AuthorizedClient, CallResult, Config, Navigation, Route, Router, SessionGate,
    SessionState, StoreError, TokenStore,
};
use tracing::{debug, warn};

// ============================================================================
// Constants
// ============================================================================

/// Maximum username length accepted at the prompt
const MAX_USERNAME_LENGTH: usize = 150;

/// Maximum password length accepted at the prompt
const MAX_PASSWORD_LENGTH: usize = 128;

/// Login screens shown per run before giving up
const MAX_LOGIN_ATTEMPTS: usize = 3;

pub struct App {
    config: Config,
    client: AuthorizedClient,
    router: Router,
    /// Password from the environment, offered to the first login screen only
    preset_password: Option<String>,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let store: Arc<dyn TokenStore> = config.open_store()?;
        let client = config.client(store.clone())?;
        let preset_password = std::env::var(ENV_PASSWORD).ok().filter(|p| !p.is_empty());
        debug!(backend = ?config.token_backend, base_url = %config.base_url, "App initialized");

        Ok(Self::from_parts(config, client, store, preset_password))
    }

    fn from_parts(
        config: Config,
        client: AuthorizedClient,
        store: Arc<dyn TokenStore>,
        preset_password: Option<String>,
    ) -> Self {
        Self {
            config,
            client,
            router: Router::new(SessionGate::new(store)),
            preset_password,
        }
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Navigate to a path and render whatever screen it resolves to
    pub async fn open(&mut self, path: &str) -> Result<()> {
        let navigation = self.router.navigate(path)?;
        if let Navigation::Redirect(route) = navigation {
            debug!(from = path, to = route.path(), "Redirected");
        }
        self.render(navigation).await
    }

    /// Show the login screen, then the dashboard on success
    pub async fn login(&mut self, username: Option<String>) -> Result<()> {
        if self.login_screen(username).await? {
            let navigation = self.router.after_login()?;
            self.render(navigation).await
        } else {
            Ok(())
        }
    }

    pub fn logout(&mut self) -> Result<()> {
        self.client.logout()?;
        let navigation = self.router.after_logout()?;
        debug!(to = navigation.route().path(), "Navigating after logout");
        println!("Logged out.");
        Ok(())
    }

    pub fn status(&self) -> Result<()> {
        match self.router.gate().state()? {
            SessionState::Authenticated => println!("authenticated"),
            SessionState::Unauthenticated => println!("unauthenticated"),
        }
        Ok(())
    }

    // =========================================================================
    // Screens
    // =========================================================================

    async fn render(&mut self, mut navigation: Navigation) -> Result<()> {
        let mut attempts = LoginAttempts::new(MAX_LOGIN_ATTEMPTS);

        loop {
            navigation = match navigation.route() {
                Route::Login => {
                    if !attempts.try_take() {
                        println!("Too many failed login attempts.");
                        return Ok(());
                    }
                    if !self.login_screen(None).await? {
                        continue;
                    }
                    self.router.after_login()?
                }
                Route::Dashboard => match self.dashboard_screen().await? {
                    Some(next) => next,
                    None => return Ok(()),
                },
            };
        }
    }

    /// Show the greeting. Returns where to go next, `None` when done.
    async fn dashboard_screen(&self) -> Result<Option<Navigation>> {
        let result = self.client.hello().await?;
        match result {
            CallResult::Success(ref greeting) => {
                println!("\n=== Tableau de bord ===\n");
                println!("{}", greeting.message);
            }
            CallResult::Failure { .. } => println!("Session expired, please log in again."),
        }
        Ok(next_after_dashboard(&self.router, &result)?)
    }

    /// Prompt for credentials and attempt a login. Returns true on success.
    async fn login_screen(&mut self, username: Option<String>) -> Result<bool> {
        println!("\n=== Gagnons Login ===\n");

        let username = match username {
            Some(username) => username,
            None => self.prompt_username()?,
        };
        let password = match self.take_preset_password() {
            Some(password) => password,
            None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
        };

        if let Some(problem) = check_credentials(&username, &password) {
            println!("{}", problem);
            return Ok(false);
        }

        println!("\nAuthenticating...");

        let result = self.client.login(&username, &password).await?;
        match result.into_result() {
            Ok(()) => {
                self.config.last_username = Some(username);
                if let Err(e) = self.config.save() {
                    warn!(error = %e, "Failed to save config");
                }
                println!("Login successful!");
                Ok(true)
            }
            Err(e) => {
                println!("{}", e);
                Ok(false)
            }
        }
    }

    /// A rejected preset password is not resubmitted; later screens prompt.
    fn take_preset_password(&mut self) -> Option<String> {
        self.preset_password.take()
    }

    fn prompt_username(&self) -> Result<String> {
        let default = std::env::var(ENV_USERNAME)
            .ok()
            .filter(|u| !u.is_empty())
            .or_else(|| self.config.last_username.clone());

        match default {
            Some(ref last_user) => print!("Username [{}]: ", last_user),
            None => print!("Username: "),
        }
        io::stdout().flush()?;

        let mut input = String::new();
        let read = io::stdin().read_line(&mut input)?;
        if read == 0 {
            return Err(anyhow::anyhow!("No input available for the login prompt"));
        }

        let input = input.trim();
        if input.is_empty() {
            Ok(default.unwrap_or_default())
        } else {
            Ok(input.to_string())
        }
    }
}

// ============================================================================
// Navigation helpers
// ============================================================================

/// Where the dashboard leads after its protected call: nowhere on success,
/// back to the entry view once the session was torn down.
fn next_after_dashboard<T>(
    router: &Router,
    result: &CallResult<T>,
) -> Result<Option<Navigation>, StoreError> {
    match result {
        CallResult::Success(_) => Ok(None),
        CallResult::Failure { .. } => router.after_logout().map(Some),
    }
}

/// Budget of login screens for one run
struct LoginAttempts {
    remaining: usize,
}

impl LoginAttempts {
    fn new(max: usize) -> Self {
        Self { remaining: max }
    }

    fn try_take(&mut self) -> bool {
        if self.remaining == 0 {
            return false;
        }
        self.remaining -= 1;
        true
    }
}

// ============================================================================
// Input validation helpers
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

fn is_acceptable(input: &str, max_len: usize) -> bool {
    input.chars().count() <= max_len && input.chars().all(is_valid_input_char)
}

/// Reason the entered credentials cannot be submitted, if any
pub fn check_credentials(username: &str, password: &str) -> Option<&'static str> {
    if username.is_empty() || password.is_empty() {
        Some("Username and password required")
    } else if !is_acceptable(username, MAX_USERNAME_LENGTH) {
        Some("Username is too long or contains control characters")
    } else if !is_acceptable(password, MAX_PASSWORD_LENGTH) {
        Some("Password is too long or contains control characters")
    } else {
        None
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use gagnons_core::api::{ApiError, ApiRequest, ApiResponse, Transport};
    use gagnons_core::auth::MemoryTokenStore;
    use gagnons_core::{AccessToken, TokenBackend};
    use reqwest::StatusCode;

    use super::*;

    /// Answers every request with the same canned response
    struct CannedTransport {
        status: StatusCode,
        body: &'static str,
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn send(&self, _request: ApiRequest) -> Result<ApiResponse, ApiError> {
            Ok(ApiResponse::new(self.status, self.body))
        }
    }

    fn app_with(
        status: StatusCode,
        body: &'static str,
        preset_password: Option<&str>,
    ) -> (Arc<MemoryTokenStore>, App) {
        let store = Arc::new(MemoryTokenStore::with_token(AccessToken::new("tok1").unwrap()));
        let transport = Arc::new(CannedTransport {
            status,
            body,
        });
        let client = AuthorizedClient::new(transport, store.clone());
        let config = Config {
            token_backend: TokenBackend::Memory,
            ..Config::default()
        };
        let app = App::from_parts(
            config,
            client,
            store.clone(),
            preset_password.map(str::to_string),
        );
        (store, app)
    }

    #[tokio::test]
    async fn test_rejected_dashboard_call_returns_to_login() {
        let (store, app) = app_with(
            StatusCode::UNAUTHORIZED,
            r#"{"detail":"Given token not valid"}"#,
            None,
        );

        let next = app.dashboard_screen().await.unwrap();

        let navigation = next.expect("a forced logout must navigate somewhere");
        assert_eq!(navigation.route(), Route::Login);
        assert!(!store.is_authenticated().unwrap());
        assert_eq!(
            app.router.navigate("/dashboard").unwrap(),
            Navigation::Redirect(Route::Login)
        );
    }

    #[tokio::test]
    async fn test_dashboard_success_ends_navigation() {
        let (store, app) = app_with(StatusCode::OK, r#"{"message":"Bonjour"}"#, None);

        assert_eq!(app.dashboard_screen().await.unwrap(), None);
        assert!(store.is_authenticated().unwrap());
    }

    #[test]
    fn test_next_after_dashboard() {
        let store: Arc<dyn TokenStore> = Arc::new(MemoryTokenStore::new());
        let router = Router::new(SessionGate::new(store));

        let done: CallResult<()> = CallResult::Success(());
        assert_eq!(next_after_dashboard(&router, &done).unwrap(), None);

        let expired: CallResult<()> = CallResult::Failure {
            forced_logout: true,
        };
        let next = next_after_dashboard(&router, &expired).unwrap().unwrap();
        assert_eq!(next.route(), Route::Login);
    }

    #[test]
    fn test_login_attempts_are_capped() {
        let mut attempts = LoginAttempts::new(MAX_LOGIN_ATTEMPTS);
        for _ in 0..MAX_LOGIN_ATTEMPTS {
            assert!(attempts.try_take());
        }
        assert!(!attempts.try_take());
        assert!(!attempts.try_take());
    }

    #[test]
    fn test_preset_password_offered_once() {
        let (_store, mut app) = app_with(StatusCode::OK, "{}", Some("hunter2"));

        assert_eq!(app.take_preset_password().as_deref(), Some("hunter2"));
        assert_eq!(app.take_preset_password(), None);
    }

    #[test]
    fn test_check_credentials_accepts_normal_input() {
        assert_eq!(check_credentials("alice", "s3cret!"), None);
        assert_eq!(check_credentials("émile", "mot de passe"), None);
        assert_eq!(check_credentials(&"u".repeat(150), &"p".repeat(128)), None);
    }

    #[test]
    fn test_check_credentials_requires_both_fields() {
        assert!(check_credentials("", "p").is_some());
        assert!(check_credentials("u", "").is_some());
    }

    #[test]
    fn test_check_credentials_length_limits() {
        assert!(check_credentials(&"u".repeat(151), "p").is_some());
        assert!(check_credentials("u", &"p".repeat(129)).is_some());
    }

    #[test]
    fn test_check_credentials_rejects_control_chars() {
        assert!(check_credentials("al\nice", "p").is_some());
        assert!(check_credentials("alice", "pa\x00ss").is_some());
        assert!(check_credentials("alice", "pa\tss").is_some());
    }

    #[test]
    fn test_app_starts_unauthenticated_with_memory_backend() {
        let config = Config {
            token_backend: gagnons_core::TokenBackend::Memory,
            ..Config::default()
        };
        let app = App::new(config).unwrap();
        assert_eq!(
            app.router.gate().state().unwrap(),
            SessionState::Unauthenticated
        );
        assert_eq!(
            app.router.navigate("/dashboard").unwrap(),
            Navigation::Redirect(Route::Login)
        );
    }
}
