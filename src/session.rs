// File: src/session.rs
//! Authentication state for the running client.
//!
//! A `SessionManager` is constructed once at startup and handed to whatever
//! needs identity (the admin dashboard, the CLI). It moves from `Unknown`
//! (loading) to `Authenticated` or `Anonymous` during `bootstrap`, and later
//! transitions only through `login` and `logout`.
//!
//! Bootstrap and a concurrent login are not serialized. Each applies its
//! result to the in-memory state when its own round trip completes, so the
//! last one to finish wins. Login is user-initiated and bootstrap runs once
//! at startup, so this race is accepted.
use crate::client::{ApiClient, ApiError, LoginResponse};
use crate::storage::{LocalStorage, TOKEN_KEY};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;

/// Shown when a failed login carries no backend message.
pub const LOGIN_FALLBACK_MESSAGE: &str = "Invalid credentials. Please try again.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Bootstrap has not finished.
    Unknown,
    Authenticated(User),
    Anonymous,
}

/// Flat view of the session as consumed by pages and routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub user: Option<User>,
    pub loading: bool,
}

/// Outcome of checking a gated route against the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteGate {
    /// Bootstrap still running; render a neutral placeholder.
    Pending,
    Allowed,
    RedirectToLogin,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("failed to persist session token: {0}")]
    Storage(#[source] anyhow::Error),
}

impl SessionError {
    /// Message to show after a failed login.
    pub fn message(&self) -> String {
        match self {
            SessionError::Api(e) => e.user_message(LOGIN_FALLBACK_MESSAGE),
            SessionError::Storage(_) => LOGIN_FALLBACK_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug)]
struct Inner {
    user: Option<User>,
    loading: bool,
}

#[derive(Debug)]
pub struct SessionManager {
    client: ApiClient,
    storage: LocalStorage,
    inner: Mutex<Inner>,
}

impl SessionManager {
    pub fn new(client: ApiClient, storage: LocalStorage) -> Self {
        Self {
            client,
            storage,
            inner: Mutex::new(Inner {
                user: None,
                loading: true,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The guarded data is plain values; a poisoned lock is still consistent.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Establishes identity from the stored token.
    ///
    /// Never fails: any verification problem demotes the session to
    /// `Anonymous` and clears the stored token. Calling it again after it
    /// has completed does nothing.
    pub async fn bootstrap(&self) -> SessionState {
        if !self.lock().loading {
            return self.state();
        }

        let user = match self.stored_token() {
            None => {
                log::debug!("No stored token; starting anonymous");
                None
            }
            Some(token) => match self.client.verify(&token).await {
                Ok(resp) if resp.valid => {
                    let username = resp.username.unwrap_or_default();
                    log::info!("Restored session for '{}'", username);
                    Some(User { username })
                }
                Ok(_) => {
                    log::warn!("Stored token was rejected by the backend");
                    self.clear_token();
                    None
                }
                Err(e) => {
                    log::warn!("Token verification failed: {}", e);
                    self.clear_token();
                    None
                }
            },
        };

        {
            let mut inner = self.lock();
            inner.user = user;
            inner.loading = false;
        }
        self.state()
    }

    /// Exchanges credentials for a token and persists it.
    ///
    /// On failure the session is left exactly as it was.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, SessionError> {
        let resp = self.client.login(username, password).await?;
        self.storage
            .set_item(TOKEN_KEY, &resp.token)
            .map_err(SessionError::Storage)?;

        log::info!("Logged in as '{}'", resp.username);
        let mut inner = self.lock();
        inner.user = Some(User {
            username: resp.username.clone(),
        });
        drop(inner);
        Ok(resp)
    }

    /// Forgets the session locally. The token stays valid server-side until it expires.
    pub fn logout(&self) {
        self.clear_token();
        self.lock().user = None;
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Token as persisted right now, if any.
    pub fn token(&self) -> Option<String> {
        self.stored_token()
    }

    pub fn user(&self) -> Option<User> {
        self.lock().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.lock().user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let inner = self.lock();
        SessionSnapshot {
            is_authenticated: inner.user.is_some(),
            user: inner.user.clone(),
            loading: inner.loading,
        }
    }

    pub fn state(&self) -> SessionState {
        let inner = self.lock();
        match (&inner.user, inner.loading) {
            (Some(user), _) => SessionState::Authenticated(user.clone()),
            (None, true) => SessionState::Unknown,
            (None, false) => SessionState::Anonymous,
        }
    }

    /// Gate for the admin surface. Decided by authentication, never redirects while loading.
    pub fn gate_admin(&self) -> RouteGate {
        let inner = self.lock();
        if inner.user.is_some() {
            RouteGate::Allowed
        } else if inner.loading {
            RouteGate::Pending
        } else {
            RouteGate::RedirectToLogin
        }
    }

    fn stored_token(&self) -> Option<String> {
        match self.storage.get_item(TOKEN_KEY) {
            Ok(token) => token.filter(|t| !t.trim().is_empty()),
            Err(e) => {
                log::warn!("Could not read stored token: {:#}", e);
                None
            }
        }
    }

    fn clear_token(&self) {
        if let Err(e) = self.storage.remove_item(TOKEN_KEY) {
            log::warn!("Could not clear stored token: {:#}", e);
        }
    }
}
