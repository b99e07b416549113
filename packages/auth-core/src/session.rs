//! Session store: the single source of truth for "is a user logged in,
//! and as whom", synchronized with durable storage so state survives app
//! restarts.
//!
//! A session is all-or-nothing: memory holds either a complete [`Session`]
//! or `None`. Partial persisted state (a token without user data, or the
//! reverse) is treated as logged out and cleared on bootstrap.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{info, warn};

use dacsan_api::{ApiClient, User};

use crate::storage::{keys, KeyValueStore, StorageError};

/// Errors from session persistence.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("failed to serialize user data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// The authenticated-identity context held between login and logout.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: String,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub user: User,
}

/// Receives the Bearer token whenever the session changes, so the HTTP
/// client's auth header always matches the persisted session.
pub trait TokenSink: Send + Sync {
    fn set_auth_token(&self, token: Option<String>);
}

impl TokenSink for ApiClient {
    fn set_auth_token(&self, token: Option<String>) {
        ApiClient::set_auth_token(self, token)
    }
}

/// No-op sink for callers that manage the auth header themselves.
pub struct NullTokenSink;

impl TokenSink for NullTokenSink {
    fn set_auth_token(&self, _token: Option<String>) {}
}

/// Owns the in-memory session and keeps it in sync with the key-value
/// store. The sole writer of the session storage keys.
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    sink: Arc<dyn TokenSink>,
    state: Mutex<Option<Session>>,
}

impl SessionStore {
    pub fn new(store: Arc<dyn KeyValueStore>, sink: Arc<dyn TokenSink>) -> Self {
        Self {
            store,
            sink,
            state: Mutex::new(None),
        }
    }

    fn state(&self) -> MutexGuard<'_, Option<Session>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the current session, if logged in.
    pub fn current_session(&self) -> Option<Session> {
        self.state().clone()
    }

    /// The logged-in user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.state().as_ref().map(|s| s.user.clone())
    }

    pub fn is_logged_in(&self) -> bool {
        self.state().is_some()
    }

    /// Record a fresh login: persist every session key, propagate the
    /// token, then flip the in-memory state.
    ///
    /// All-or-nothing: if any write fails, memory is left untouched (still
    /// logged out, or whatever the prior state was) and the error is
    /// returned. A partially written store is then repaired by the next
    /// `bootstrap`.
    pub async fn login(
        &self,
        session_id: String,
        user: User,
        access_token: Option<String>,
        refresh_token: Option<String>,
    ) -> Result<(), SessionError> {
        let user_json = serde_json::to_string(&user)?;

        self.store.set(keys::SESSION_ID, &session_id).await?;
        self.store.set(keys::USER_DATA, &user_json).await?;
        if let Some(token) = &access_token {
            self.store.set(keys::ACCESS_TOKEN, token).await?;
            self.store.set(keys::USER_TOKEN, token).await?;
        }
        if let Some(token) = &refresh_token {
            self.store.set(keys::REFRESH_TOKEN, token).await?;
        }

        self.sink.set_auth_token(access_token.clone());
        *self.state() = Some(Session {
            session_id,
            access_token,
            refresh_token,
            user: user.clone(),
        });
        info!(user = %user.username, "Session persisted");
        Ok(())
    }

    /// Clear the session everywhere. Idempotent: logging out while already
    /// logged out succeeds silently.
    pub async fn logout(&self) -> Result<(), SessionError> {
        for key in keys::SESSION_KEYS {
            self.store.remove(key).await?;
        }
        self.sink.set_auth_token(None);
        *self.state() = None;
        info!("Session cleared");
        Ok(())
    }

    /// Restore a persisted session at process start.
    ///
    /// Logged-in state is restored only when both the access token and a
    /// deserializable user record are present; anything partial forces
    /// logged-out and clears the leftover keys. Returns whether a session
    /// was restored.
    pub async fn bootstrap(&self) -> Result<bool, SessionError> {
        let access_token = self.store.get(keys::ACCESS_TOKEN).await?;
        let user_json = self.store.get(keys::USER_DATA).await?;

        let (Some(access_token), Some(user_json)) = (access_token, user_json) else {
            self.logout().await?;
            return Ok(false);
        };

        let user: User = match serde_json::from_str(&user_json) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Persisted user data unreadable, forcing logout");
                self.logout().await?;
                return Ok(false);
            }
        };

        let session_id = self.store.get(keys::SESSION_ID).await?.unwrap_or_default();
        let refresh_token = self.store.get(keys::REFRESH_TOKEN).await?;

        self.sink.set_auth_token(Some(access_token.clone()));
        *self.state() = Some(Session {
            session_id,
            access_token: Some(access_token),
            refresh_token,
            user: user.clone(),
        });
        info!(user = %user.username, "Session restored from storage");
        Ok(true)
    }

    /// Replace the cached user in memory and storage. Tokens and session
    /// id are untouched.
    pub async fn update_user(&self, user: User) -> Result<(), SessionError> {
        let user_json = serde_json::to_string(&user)?;
        self.store.set(keys::USER_DATA, &user_json).await?;
        if let Some(session) = self.state().as_mut() {
            session.user = user;
        }
        Ok(())
    }
}
