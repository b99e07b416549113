//! Session and OTP flow core for the DacSan mobile client.
//!
//! The UI layer above this crate is plain screens; everything stateful
//! lives here:
//!
//! - [`SessionStore`] — the single source of truth for the logged-in user,
//!   synchronized with a durable [`KeyValueStore`].
//! - [`OtpFlow`] — the send/verify controller for email and phone changes,
//!   with an owned resend countdown.
//! - [`AccountService`] / [`ProfileService`] — high-level flows combining
//!   the REST client with the session store.
//! - [`validation`] — the local form checks that run before any request.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use dacsan_api::ApiClient;
//! use dacsan_auth::{AccountService, MemoryStore, SessionStore};
//!
//! let api = Arc::new(ApiClient::new("http://10.0.187.144:3001/api")?);
//! let session = Arc::new(SessionStore::new(Arc::new(MemoryStore::new()), api.clone()));
//! session.bootstrap().await?;
//!
//! let account = AccountService::new(api, session);
//! let response = account.login("anh@example.com", "secret").await?;
//! ```

pub mod account;
pub mod otp;
pub mod profile;
pub mod session;
pub mod storage;
pub mod validation;

pub use account::AccountService;
pub use otp::{
    OtpChannel, OtpFlow, OtpState, OtpStep, PendingTarget, ProfileOtpApi, OTP_RESEND_WINDOW_SECS,
};
pub use profile::ProfileService;
pub use session::{NullTokenSink, Session, SessionError, SessionStore, TokenSink};
pub use storage::{keys, KeyValueStore, MemoryStore, StorageError, StorageResult};

pub use dacsan_api as api;
