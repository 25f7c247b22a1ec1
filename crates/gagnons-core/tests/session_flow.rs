//! End-to-end session scenarios over a file-backed token store.
//!
//! The remote service is replaced by a scripted transport that answers the
//! login and greeting endpoints the way the real service does.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use tempfile::tempdir;

use gagnons_core::api::{ApiError, ApiRequest, ApiResponse, Transport, HELLO_PATH, LOGIN_PATH};
use gagnons_core::auth::FileTokenStore;
use gagnons_core::{
    AuthorizedClient, CallResult, Decision, LoginFailure, LoginResult, Navigation, Route, Router,
    SessionGate, TokenStore,
};

/// Accepts one password and one token, like the real service.
struct FakeService {
    password: &'static str,
    token: &'static str,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeService {
    fn new(password: &'static str, token: &'static str) -> Arc<Self> {
        Arc::new(Self {
            password,
            token,
            requests: Mutex::new(Vec::new()),
        })
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for FakeService {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());

        match request.path.as_str() {
            LOGIN_PATH => {
                let body = request.body.unwrap_or_default();
                if body["password"] == self.password {
                    Ok(ApiResponse::new(
                        StatusCode::OK,
                        format!(r#"{{"access":"{}","refresh":"r-{}"}}"#, self.token, self.token),
                    ))
                } else {
                    Ok(ApiResponse::new(
                        StatusCode::UNAUTHORIZED,
                        r#"{"detail":"No active account found with the given credentials"}"#,
                    ))
                }
            }
            HELLO_PATH => {
                if request.bearer.as_deref() == Some(self.token) {
                    Ok(ApiResponse::new(StatusCode::OK, r#"{"message":"Hello!"}"#))
                } else {
                    Ok(ApiResponse::new(
                        StatusCode::UNAUTHORIZED,
                        r#"{"detail":"Given token not valid for any token type"}"#,
                    ))
                }
            }
            _ => Ok(ApiResponse::new(StatusCode::NOT_FOUND, "")),
        }
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    store: Arc<FileTokenStore>,
    service: Arc<FakeService>,
    client: AuthorizedClient,
    gate: SessionGate,
}

fn harness(token: &'static str) -> Harness {
    let dir = tempdir().expect("Failed to create temp directory");
    let store = Arc::new(FileTokenStore::new(dir.path()));
    let service = FakeService::new("rightpass", token);
    let client = AuthorizedClient::new(service.clone(), store.clone());
    let gate = SessionGate::new(store.clone());
    Harness {
        _dir: dir,
        store,
        service,
        client,
        gate,
    }
}

fn deny_to_entry() -> Decision {
    Decision::Deny("/".to_string())
}

#[test]
fn test_empty_store_is_denied() {
    let h = harness("tok1");
    assert_eq!(h.gate.admit("/dashboard").unwrap(), deny_to_entry());
}

#[tokio::test]
async fn test_wrong_password_keeps_session_closed() {
    let h = harness("tok1");

    let result = h.client.login("u", "wrongpass").await.unwrap();

    assert_eq!(result, LoginResult::Failure(LoginFailure::Rejected));
    assert!(h.store.get().unwrap().is_none());
    assert_eq!(h.gate.admit("/dashboard").unwrap(), deny_to_entry());
}

#[tokio::test]
async fn test_right_password_opens_dashboard() {
    let h = harness("tok1");

    let result = h.client.login("u", "rightpass").await.unwrap();

    assert!(result.is_success());
    assert_eq!(h.store.get().unwrap().unwrap().as_str(), "tok1");
    assert_eq!(
        h.gate.admit("/dashboard").unwrap(),
        Decision::Allow("/dashboard".to_string())
    );

    let greeting = h.client.hello().await.unwrap().into_result().unwrap();
    assert_eq!(greeting.message, "Hello!");
}

#[tokio::test]
async fn test_rejected_token_forces_logout() {
    let h = harness("tok1");
    h.client.login("u", "rightpass").await.unwrap();

    // The service rotated its secret; our token no longer verifies
    let stale = harness("tok2");
    let stale_client = AuthorizedClient::new(stale.service.clone(), h.store.clone());

    let result = stale_client.hello().await.unwrap();

    assert_eq!(result, CallResult::Failure { forced_logout: true });
    assert!(!h.store.is_authenticated().unwrap());
    assert_eq!(h.gate.admit("/dashboard").unwrap(), deny_to_entry());
}

#[tokio::test]
async fn test_logout_issues_no_request() {
    let h = harness("tok1");
    h.client.login("u", "rightpass").await.unwrap();
    let before = h.service.request_count();

    h.client.logout().unwrap();

    assert!(h.store.get().unwrap().is_none());
    assert_eq!(h.service.request_count(), before);
}

#[tokio::test]
async fn test_session_survives_reload() {
    let h = harness("tok1");
    h.client.login("u", "rightpass").await.unwrap();

    // A fresh process sees the same directory
    let reloaded: Arc<dyn TokenStore> = Arc::new(FileTokenStore::new(h.store.path().parent().unwrap()));
    let router = Router::new(SessionGate::new(reloaded.clone()));
    assert_eq!(
        router.navigate("/dashboard").unwrap(),
        Navigation::Render(Route::Dashboard)
    );

    let client = AuthorizedClient::new(h.service.clone(), reloaded);
    assert!(matches!(client.hello().await.unwrap(), CallResult::Success(_)));
}

#[tokio::test]
async fn test_full_navigation_cycle() {
    let h = harness("tok1");
    let router = Router::new(h.gate.clone());

    assert_eq!(router.navigate("/dashboard").unwrap(), Navigation::Redirect(Route::Login));

    h.client.login("u", "rightpass").await.unwrap();
    assert_eq!(router.after_login().unwrap(), Navigation::Render(Route::Dashboard));

    h.client.logout().unwrap();
    assert_eq!(router.navigate("/dashboard").unwrap(), Navigation::Redirect(Route::Login));
    assert_eq!(router.navigate("/anything").unwrap(), Navigation::Redirect(Route::Login));
}
