// Session bootstrap, login and logout against a mocked backend.
use gsa_portal::client::ApiClient;
use gsa_portal::context::TestContext;
use gsa_portal::session::{
    LOGIN_FALLBACK_MESSAGE, RouteGate, SessionManager, SessionSnapshot, SessionState, User,
};
use gsa_portal::storage::{LocalStorage, TOKEN_KEY};
use mockito::{Matcher, Server, ServerGuard};
use std::sync::Arc;
use std::time::Duration;

fn manager(server: &ServerGuard) -> (Arc<TestContext>, LocalStorage, SessionManager) {
    let ctx = Arc::new(TestContext::new());
    let storage = LocalStorage::new(ctx.clone());
    let client = ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap();
    let session = SessionManager::new(client, storage.clone());
    (ctx, storage, session)
}

async fn no_calls(server: &mut ServerGuard) -> Vec<mockito::Mock> {
    let mut mocks = Vec::new();
    for method in ["GET", "POST", "PUT", "DELETE"] {
        mocks.push(
            server
                .mock(method, Matcher::Any)
                .expect(0)
                .create_async()
                .await,
        );
    }
    mocks
}

#[tokio::test]
async fn test_bootstrap_without_token_makes_no_calls() {
    let mut server = Server::new_async().await;
    let guards = no_calls(&mut server).await;
    let (_ctx, _storage, session) = manager(&server);

    assert_eq!(session.gate_admin(), RouteGate::Pending);
    assert_eq!(session.bootstrap().await, SessionState::Anonymous);
    assert_eq!(
        session.snapshot(),
        SessionSnapshot {
            is_authenticated: false,
            user: None,
            loading: false,
        }
    );
    assert_eq!(session.gate_admin(), RouteGate::RedirectToLogin);

    for m in guards {
        m.assert_async().await;
    }
}

#[tokio::test]
async fn test_bootstrap_restores_valid_token() {
    let mut server = Server::new_async().await;
    let verify = server
        .mock("GET", "/api/auth/verify")
        .match_header("authorization", "Bearer stored-token")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"valid": true, "username": "admin"}"#)
        .expect(1)
        .create_async()
        .await;

    let (_ctx, storage, session) = manager(&server);
    storage.set_item(TOKEN_KEY, "stored-token").unwrap();

    session.bootstrap().await;
    assert_eq!(
        session.snapshot(),
        SessionSnapshot {
            is_authenticated: true,
            user: Some(User {
                username: "admin".to_string()
            }),
            loading: false,
        }
    );
    assert_eq!(session.token().as_deref(), Some("stored-token"));
    assert_eq!(session.gate_admin(), RouteGate::Allowed);

    // Already bootstrapped: no second verification.
    session.bootstrap().await;
    verify.assert_async().await;
}

#[tokio::test]
async fn test_bootstrap_clears_token_rejected_as_invalid() {
    let mut server = Server::new_async().await;
    let _mock1 = server
        .mock("GET", "/api/auth/verify")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"valid": false}"#)
        .create_async()
        .await;

    let (_ctx, storage, session) = manager(&server);
    storage.set_item(TOKEN_KEY, "old").unwrap();

    assert_eq!(session.bootstrap().await, SessionState::Anonymous);
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_bootstrap_swallows_verification_errors() {
    let mut server = Server::new_async().await;
    let _mock2 = server
        .mock("GET", "/api/auth/verify")
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Token expired"}"#)
        .create_async()
        .await;

    let (_ctx, storage, session) = manager(&server);
    storage.set_item(TOKEN_KEY, "expired").unwrap();

    assert_eq!(session.bootstrap().await, SessionState::Anonymous);
    assert!(!session.snapshot().loading);
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_bootstrap_unreachable_backend_is_anonymous() {
    let ctx = Arc::new(TestContext::new());
    let storage = LocalStorage::new(ctx.clone());
    storage.set_item(TOKEN_KEY, "whatever").unwrap();
    // Port 9 (discard) is not served on the loopback interface in CI.
    let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let session = SessionManager::new(client, storage.clone());

    assert_eq!(session.bootstrap().await, SessionState::Anonymous);
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_login_rejected_keeps_state_and_surfaces_detail() {
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/api/auth/login")
        .match_body(Matcher::Json(serde_json::json!({
            "username": "admin",
            "password": "wrong"
        })))
        .with_status(401)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "Invalid credentials"}"#)
        .expect(1)
        .create_async()
        .await;

    let (_ctx, storage, session) = manager(&server);
    session.bootstrap().await;

    let err = session.login("admin", "wrong").await.unwrap_err();
    assert_eq!(err.message(), "Invalid credentials");
    assert_eq!(session.state(), SessionState::Anonymous);
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    login.assert_async().await;
}

#[tokio::test]
async fn test_login_error_without_detail_uses_fallback() {
    let mut server = Server::new_async().await;
    let _mock3 = server
        .mock("POST", "/api/auth/login")
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let (_ctx, _storage, session) = manager(&server);
    session.bootstrap().await;

    let err = session.login("admin", "pw").await.unwrap_err();
    assert_eq!(err.message(), LOGIN_FALLBACK_MESSAGE);
}

#[tokio::test]
async fn test_login_then_logout() {
    let mut server = Server::new_async().await;
    let login = server
        .mock("POST", "/api/auth/login")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"token": "jwt.abc.def", "username": "admin"}"#)
        .expect(1)
        .create_async()
        .await;

    let (_ctx, storage, session) = manager(&server);
    session.bootstrap().await;

    let resp = session.login("admin", "admin123").await.unwrap();
    assert_eq!(resp.username, "admin");
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("jwt.abc.def"));
    assert_eq!(
        session.state(),
        SessionState::Authenticated(User {
            username: "admin".to_string()
        })
    );
    login.assert_async().await;

    // Logout must not reach the backend.
    let guards = no_calls(&mut server).await;
    session.logout();
    let snap = session.snapshot();
    assert!(!snap.is_authenticated);
    assert_eq!(snap.user, None);
    assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
    for m in guards {
        m.assert_async().await;
    }
}
