//! Session store persistence tests over an in-memory key-value store.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;

use dacsan_api::{User, UserRole};
use dacsan_auth::{
    keys, KeyValueStore, MemoryStore, SessionStore, StorageError, StorageResult, TokenSink,
};

fn make_user(id: i64, full_name: &str) -> User {
    User {
        id,
        username: format!("user{id}"),
        email: format!("user{id}@example.com"),
        full_name: full_name.to_string(),
        phone_number: Some("0912345678".to_string()),
        avatar_url: None,
        role: UserRole::User,
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Records every token pushed at it.
#[derive(Default)]
struct RecordingSink {
    tokens: Mutex<Vec<Option<String>>>,
}

impl RecordingSink {
    fn last(&self) -> Option<Option<String>> {
        self.tokens.lock().unwrap().last().cloned()
    }

    fn pushes(&self) -> usize {
        self.tokens.lock().unwrap().len()
    }
}

impl TokenSink for RecordingSink {
    fn set_auth_token(&self, token: Option<String>) {
        self.tokens.lock().unwrap().push(token);
    }
}

/// Counts writes so tests can assert that an operation touched storage
/// exactly as promised.
#[derive(Default)]
struct CountingStore {
    inner: MemoryStore,
    sets: AtomicUsize,
    removes: AtomicUsize,
}

#[async_trait]
impl KeyValueStore for CountingStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.removes.fetch_add(1, Ordering::SeqCst);
        self.inner.remove(key).await
    }

    async fn clear(&self) -> StorageResult<()> {
        self.inner.clear().await
    }
}

/// Fails every write to one specific key.
struct FailingStore {
    inner: MemoryStore,
    fail_key: &'static str,
}

#[async_trait]
impl KeyValueStore for FailingStore {
    async fn get(&self, key: &str) -> StorageResult<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        if key == self.fail_key {
            return Err(StorageError::Backend("disk full".into()));
        }
        self.inner.set(key, value).await
    }

    async fn remove(&self, key: &str) -> StorageResult<()> {
        self.inner.remove(key).await
    }

    async fn clear(&self) -> StorageResult<()> {
        self.inner.clear().await
    }
}

#[tokio::test]
async fn bootstrap_restores_a_full_session() {
    let store = Arc::new(MemoryStore::new());
    let user = make_user(1, "Ngọc Anh");
    store.set(keys::SESSION_ID, "S1").await.unwrap();
    store
        .set(keys::USER_DATA, &serde_json::to_string(&user).unwrap())
        .await
        .unwrap();
    store.set(keys::ACCESS_TOKEN, "abc").await.unwrap();
    store.set(keys::USER_TOKEN, "abc").await.unwrap();
    store.set(keys::REFRESH_TOKEN, "r1").await.unwrap();

    let sink = Arc::new(RecordingSink::default());
    let session = SessionStore::new(store, sink.clone());

    assert!(session.bootstrap().await.unwrap());
    assert!(session.is_logged_in());

    let restored = session.current_session().unwrap();
    assert_eq!(restored.session_id, "S1");
    assert_eq!(restored.access_token.as_deref(), Some("abc"));
    assert_eq!(restored.refresh_token.as_deref(), Some("r1"));
    assert_eq!(restored.user, user);
    assert_eq!(sink.last(), Some(Some("abc".to_string())));
}

#[tokio::test]
async fn bootstrap_rejects_a_token_without_user_data() {
    let store = Arc::new(MemoryStore::new());
    store.set(keys::ACCESS_TOKEN, "abc").await.unwrap();

    let sink = Arc::new(RecordingSink::default());
    let session = SessionStore::new(store.clone(), sink.clone());

    assert!(!session.bootstrap().await.unwrap());
    assert!(!session.is_logged_in());
    assert!(session.current_user().is_none());

    // The stale partial state is swept, not left behind.
    assert!(store.get(keys::ACCESS_TOKEN).await.unwrap().is_none());
    assert_eq!(sink.last(), Some(None));
}

#[tokio::test]
async fn bootstrap_rejects_unreadable_user_data() {
    let store = Arc::new(MemoryStore::new());
    store.set(keys::ACCESS_TOKEN, "abc").await.unwrap();
    store.set(keys::USER_DATA, "{not json").await.unwrap();

    let session = SessionStore::new(store.clone(), Arc::new(RecordingSink::default()));

    assert!(!session.bootstrap().await.unwrap());
    assert!(!session.is_logged_in());
    assert!(store.get(keys::USER_DATA).await.unwrap().is_none());
}

#[tokio::test]
async fn logout_is_idempotent() {
    let store = Arc::new(CountingStore::default());
    let sink = Arc::new(RecordingSink::default());
    let session = SessionStore::new(store.clone(), sink.clone());

    session
        .login(
            "S1".into(),
            make_user(1, "Ngọc Anh"),
            Some("abc".into()),
            Some("r1".into()),
        )
        .await
        .unwrap();
    assert_eq!(store.sets.load(Ordering::SeqCst), 5);
    assert!(session.is_logged_in());

    session.logout().await.unwrap();
    assert!(!session.is_logged_in());
    assert!(session.current_user().is_none());
    assert_eq!(sink.last(), Some(None));

    let removes_after_first = store.removes.load(Ordering::SeqCst);
    session.logout().await.unwrap();
    assert!(!session.is_logged_in());

    // The second logout re-clears the same keys and writes nothing new.
    assert_eq!(store.sets.load(Ordering::SeqCst), 5);
    assert_eq!(
        store.removes.load(Ordering::SeqCst),
        removes_after_first * 2
    );
    assert!(store.get(keys::ACCESS_TOKEN).await.unwrap().is_none());
    assert!(store.get(keys::USER_DATA).await.unwrap().is_none());
}

#[tokio::test]
async fn login_is_all_or_nothing() {
    let store = Arc::new(FailingStore {
        inner: MemoryStore::new(),
        fail_key: keys::REFRESH_TOKEN,
    });
    let sink = Arc::new(RecordingSink::default());
    let session = SessionStore::new(store, sink.clone());

    let result = session
        .login(
            "S1".into(),
            make_user(1, "Ngọc Anh"),
            Some("abc".into()),
            Some("r1".into()),
        )
        .await;

    assert!(result.is_err());
    assert!(!session.is_logged_in());
    assert!(session.current_user().is_none());
    // The token never reaches the HTTP client on a failed login.
    assert_eq!(sink.pushes(), 0);
}

#[tokio::test]
async fn update_user_replaces_the_cached_copy() {
    let store = Arc::new(MemoryStore::new());
    let session = SessionStore::new(store.clone(), Arc::new(RecordingSink::default()));

    session
        .login(
            "S1".into(),
            make_user(1, "Ngọc Anh"),
            Some("abc".into()),
            None,
        )
        .await
        .unwrap();

    let mut updated = make_user(1, "Ngọc Anh Trần");
    updated.avatar_url = Some("https://cdn.example.com/a.png".into());
    session.update_user(updated.clone()).await.unwrap();

    assert_eq!(session.current_user(), Some(updated.clone()));
    let persisted: User =
        serde_json::from_str(&store.get(keys::USER_DATA).await.unwrap().unwrap()).unwrap();
    assert_eq!(persisted, updated);

    // Tokens are untouched by a user update.
    let current = session.current_session().unwrap();
    assert_eq!(current.access_token.as_deref(), Some("abc"));
    assert_eq!(
        store.get(keys::ACCESS_TOKEN).await.unwrap().as_deref(),
        Some("abc")
    );
}

#[tokio::test]
async fn tokenless_login_is_not_restored_after_restart() {
    let store = Arc::new(MemoryStore::new());
    let session = SessionStore::new(store.clone(), Arc::new(RecordingSink::default()));

    session
        .login("S1".into(), make_user(1, "Ngọc Anh"), None, None)
        .await
        .unwrap();
    assert!(session.is_logged_in());

    // Simulated restart: a fresh store over the same persisted data.
    let restarted = SessionStore::new(store, Arc::new(RecordingSink::default()));
    assert!(!restarted.bootstrap().await.unwrap());
    assert!(!restarted.is_logged_in());
}
