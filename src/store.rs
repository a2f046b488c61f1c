use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::records::{PostId, PostRecord, RecordRef, Revision, UserRecord};

// ─── Versioned reads ──────────────────────────────────────────

/// A record paired with the store revision it was read at. Every write
/// derived from this record must name the revision as its precondition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    pub revision: Revision,
    pub record: T,
}

// ─── Guarded writes ───────────────────────────────────────────

/// One guarded write inside a commit batch. `expected` is the revision the
/// new state was computed from; the whole batch aborts if any named
/// document has moved past it.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordWrite {
    PutUser {
        expected: Revision,
        record: UserRecord,
    },
    PutPost {
        expected: Revision,
        record: PostRecord,
    },
    DeletePost {
        expected: Revision,
        post_id: PostId,
    },
}

impl RecordWrite {
    /// The document this write targets.
    pub fn target(&self) -> RecordRef {
        match self {
            RecordWrite::PutUser { record, .. } => RecordRef::User(record.uid.clone()),
            RecordWrite::PutPost { record, .. } => RecordRef::Post(record.post_id),
            RecordWrite::DeletePost { post_id, .. } => RecordRef::Post(*post_id),
        }
    }
}

// ─── Failures ─────────────────────────────────────────────────

/// Failure modes of the persistence seam.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// A guarded write named a revision that is no longer current, or an
    /// insert hit an existing document. Nothing was applied.
    #[error("revision conflict on {record}")]
    RevisionConflict { record: RecordRef },

    /// The backend refused the batch at commit time.
    #[error("transaction aborted: {reason}")]
    TransactionAborted { reason: String },

    /// Transport-level failure talking to the backend.
    #[error("transport failure: {reason}")]
    Transport { reason: String },

    /// A document failed to encode or decode.
    #[error("codec failure on {record}: {reason}")]
    Codec { record: RecordRef, reason: String },
}

// ─── RecordStore ──────────────────────────────────────────────

/// Persistence seam for all social records.
///
/// Engines operate exclusively through this trait, enabling pluggable
/// backends (`MemoryStore` in-process, the managed document database in
/// production). Reads return the revision the record was at; all mutation
/// goes through `commit`, guarded by those revisions; an unguarded
/// read-modify-write is not expressible here.
#[async_trait]
pub trait RecordStore: Send + Sync {
    // ── Users ──

    async fn get_user(&self, uid: &str) -> Result<Option<Versioned<UserRecord>>, StoreError>;

    /// Create a user document. Fails with `RevisionConflict` if one
    /// already exists for this uid.
    async fn insert_user(&self, record: &UserRecord) -> Result<Revision, StoreError>;

    // ── Posts ──

    async fn get_post(&self, post_id: PostId) -> Result<Option<Versioned<PostRecord>>, StoreError>;

    /// Create a post document. Fails with `RevisionConflict` if the id is
    /// already taken.
    async fn insert_post(&self, record: &PostRecord) -> Result<Revision, StoreError>;

    /// All posts in creation order. Feed assembly only; mutation goes
    /// through `get_post` + `commit`.
    async fn list_posts(&self) -> Result<Vec<Versioned<PostRecord>>, StoreError>;

    // ── Commit ──

    /// Apply a batch of guarded writes atomically. Every precondition is
    /// re-checked at commit time; either all writes apply or none do.
    async fn commit(&self, writes: &[RecordWrite]) -> Result<(), StoreError>;
}
