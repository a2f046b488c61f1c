//! Typed failure model for every engine operation.
//!
//! Each failure mode maps to exactly one `EngineError` variant, serialized
//! with a stable `error_kind` tag so the caller (UI layer) can branch on it
//! without string matching.
//!
//! ## Rules
//!
//! - `thiserror` for enum derivation, no manual `Display` impls.
//! - No `.unwrap()` in this module.
//! - All variants must be constructible (test enforced).

use serde::{Deserialize, Serialize};

use crate::records::{PostId, RecordRef, Uid};
use crate::store::StoreError;

// ---------------------------------------------------------------------------
// EngineError
// ---------------------------------------------------------------------------

/// Discriminated failure surfaced by the relationship, engagement, and
/// account operations. Never wraps a free-form error at the API boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
#[serde(tag = "error_kind", rename_all = "snake_case")]
pub enum EngineError {
    /// A referenced record is absent from the store.
    #[error("{record} not found")]
    NotFound { record: RecordRef },

    /// A user tried to befriend or request themselves.
    #[error("{uid} cannot befriend themselves")]
    SelfReference { uid: Uid },

    /// The pair is already connected; nothing was written.
    #[error("{actor} and {target} are already friends")]
    AlreadyFriends { actor: Uid, target: Uid },

    /// The actor already has a request pending on the target's record.
    #[error("{actor} already has a pending request to {target}")]
    DuplicateRequest { actor: Uid, target: Uid },

    /// Accept was called for a request that is not pending.
    #[error("no pending request from {requester}")]
    NoSuchRequest { requester: Uid },

    /// The uid is already in the post's like set; state is unchanged.
    #[error("post {post_id} already liked by {uid}")]
    AlreadyLiked { post_id: PostId, uid: Uid },

    /// Title or comment text was empty after trimming.
    #[error("content must not be empty")]
    EmptyContent,

    /// Comment index past the end of the post's comment list.
    #[error("comment index {index} out of range (post has {len} comments)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Edit or delete attempted by someone other than the post's author.
    #[error("{actor} is not the author of post {post_id}")]
    NotAuthor { post_id: PostId, actor: Uid },

    /// The record kept moving under us; retries were exhausted.
    #[error("{record} was concurrently modified; gave up after {attempts} attempts")]
    ConcurrentModification { record: RecordRef, attempts: u32 },

    /// The store refused the commit batch.
    #[error("transaction aborted: {reason}")]
    TransactionAborted { reason: String },

    /// Transport or codec failure talking to the store.
    #[error("store failure: {reason}")]
    Store { reason: String },
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            // Engines intercept conflicts for their retry loop; one that
            // reaches this conversion was not retryable (e.g. an insert),
            // so it surfaces as a single exhausted attempt.
            StoreError::RevisionConflict { record } => {
                EngineError::ConcurrentModification {
                    record,
                    attempts: 1,
                }
            }
            StoreError::TransactionAborted { reason } => {
                EngineError::TransactionAborted { reason }
            }
            StoreError::Transport { reason } => EngineError::Store { reason },
            StoreError::Codec { record, reason } => EngineError::Store {
                reason: format!("codec failure on {record}: {reason}"),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
