//! Key-value persistence boundary.
//!
//! The app persists its session under a handful of fixed string keys. The
//! actual backend (device storage, a file, an in-memory map in tests) sits
//! behind [`KeyValueStore`]; the session layer is the only writer of these
//! keys.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use thiserror::Error;

/// Fixed storage keys for session data.
pub mod keys {
    pub const SESSION_ID: &str = "sessionId";
    pub const USER_DATA: &str = "userData";
    pub const ACCESS_TOKEN: &str = "accessToken";
    pub const REFRESH_TOKEN: &str = "refreshToken";
    /// Legacy alias of `accessToken`; older builds read this key, so both
    /// are written in sync.
    pub const USER_TOKEN: &str = "userToken";

    /// Every key the session layer owns, in clear order.
    pub const SESSION_KEYS: [&str; 5] = [
        SESSION_ID,
        USER_DATA,
        ACCESS_TOKEN,
        REFRESH_TOKEN,
        USER_TOKEN,
    ];
}

/// Result type for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Storage backend errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Asynchronous string-keyed durable store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;
    async fn remove(&self, key: &str) -> StorageResult<()>;
    async fn clear(&self) -> StorageResult<()>;
}

/// In-process store. Used by tests and as a default backend when the host
/// platform wires in nothing else.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> StorageResult<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Backend("store mutex poisoned".into()))
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries()?.remove(key);
        Ok(())
    }

    async fn clear(&self) -> StorageResult<()> {
        self.entries()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_round_trips() {
        let store = MemoryStore::new();
        assert!(store.get("missing").await.unwrap().is_none());

        store.set(keys::ACCESS_TOKEN, "abc").await.unwrap();
        assert_eq!(
            store.get(keys::ACCESS_TOKEN).await.unwrap().as_deref(),
            Some("abc")
        );

        store.remove(keys::ACCESS_TOKEN).await.unwrap();
        assert!(store.get(keys::ACCESS_TOKEN).await.unwrap().is_none());

        store.set("a", "1").await.unwrap();
        store.set("b", "2").await.unwrap();
        store.clear().await.unwrap();
        assert!(store.get("a").await.unwrap().is_none());
        assert!(store.get("b").await.unwrap().is_none());
    }
}
