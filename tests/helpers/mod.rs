//! Shared fixtures for the integration suite.
#![allow(dead_code)] // each test binary uses a different subset

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use amity::store_memory::MemoryStore;
use amity::{PostId, PostRecord, RecordStore, RecordWrite, Revision, StoreError, UserRecord, Versioned};

pub fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn user(uid: &str) -> UserRecord {
    UserRecord::new(uid, format!("User {uid}"), format!("{uid}@example.test"))
}

pub fn private_user(uid: &str) -> UserRecord {
    let mut rec = user(uid);
    rec.is_private = true;
    rec
}

pub async fn seeded_store(users: Vec<UserRecord>) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    for rec in &users {
        store.insert_user(rec).await.unwrap();
    }
    store
}

/// How `FlakyStore` fails a commit.
#[derive(Clone, Copy, Debug)]
pub enum FailureMode {
    /// Revision conflict, which the engines treat as retryable.
    Conflict,
    /// Transport failure. Terminal.
    Transport,
    /// Commit-time abort. Terminal.
    Abort,
}

/// Wraps a `MemoryStore` and fails the first N commits, then behaves
/// normally. Reads and inserts always pass through.
pub struct FlakyStore {
    inner: MemoryStore,
    failures_left: AtomicU32,
    mode: FailureMode,
}

impl FlakyStore {
    pub fn new(failures: u32, mode: FailureMode) -> Self {
        Self {
            inner: MemoryStore::new(),
            failures_left: AtomicU32::new(failures),
            mode,
        }
    }

    fn should_fail(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl RecordStore for FlakyStore {
    async fn get_user(&self, uid: &str) -> Result<Option<Versioned<UserRecord>>, StoreError> {
        self.inner.get_user(uid).await
    }

    async fn insert_user(&self, record: &UserRecord) -> Result<Revision, StoreError> {
        self.inner.insert_user(record).await
    }

    async fn get_post(&self, post_id: PostId) -> Result<Option<Versioned<PostRecord>>, StoreError> {
        self.inner.get_post(post_id).await
    }

    async fn insert_post(&self, record: &PostRecord) -> Result<Revision, StoreError> {
        self.inner.insert_post(record).await
    }

    async fn list_posts(&self) -> Result<Vec<Versioned<PostRecord>>, StoreError> {
        self.inner.list_posts().await
    }

    async fn commit(&self, writes: &[RecordWrite]) -> Result<(), StoreError> {
        if self.should_fail() {
            return Err(match self.mode {
                FailureMode::Conflict => StoreError::RevisionConflict {
                    record: writes[0].target(),
                },
                FailureMode::Transport => StoreError::Transport {
                    reason: "injected transport failure".to_string(),
                },
                FailureMode::Abort => StoreError::TransactionAborted {
                    reason: "injected commit abort".to_string(),
                },
            });
        }
        self.inner.commit(writes).await
    }
}
