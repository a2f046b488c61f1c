//! In-process reference backend.
//!
//! Documents live as schemaless JSON bodies behind one mutex, with a
//! per-document revision bumped on every applied write, the same contract
//! the managed document database provides remotely. Commits are two-phase:
//! every precondition is checked (and every body encoded) before the first
//! mutation, so a mid-batch failure leaves the store untouched.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::records::{PostId, PostRecord, RecordRef, Revision, Uid, UserRecord};
use crate::store::{RecordStore, RecordWrite, StoreError, Versioned};

struct Doc {
    revision: Revision,
    /// Insertion sequence, so listings come back in creation order.
    seq: u64,
    body: Value,
}

#[derive(Default)]
struct Collections {
    users: BTreeMap<Uid, Doc>,
    posts: BTreeMap<PostId, Doc>,
    next_seq: u64,
}

impl Collections {
    fn bump_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }
}

/// In-memory `RecordStore` for tests and POC wiring.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Transport {
            reason: "store lock poisoned".to_string(),
        })
    }
}

fn encode<T: Serialize>(record: &T, target: RecordRef) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|e| StoreError::Codec {
        record: target,
        reason: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(doc: &Doc, target: RecordRef) -> Result<Versioned<T>, StoreError> {
    let record = serde_json::from_value(doc.body.clone()).map_err(|e| StoreError::Codec {
        record: target,
        reason: e.to_string(),
    })?;
    Ok(Versioned {
        revision: doc.revision,
        record,
    })
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get_user(&self, uid: &str) -> Result<Option<Versioned<UserRecord>>, StoreError> {
        let inner = self.lock()?;
        inner
            .users
            .get(uid)
            .map(|doc| decode(doc, RecordRef::User(uid.to_string())))
            .transpose()
    }

    async fn insert_user(&self, record: &UserRecord) -> Result<Revision, StoreError> {
        let target = RecordRef::User(record.uid.clone());
        let body = encode(record, target.clone())?;
        let mut inner = self.lock()?;
        if inner.users.contains_key(&record.uid) {
            return Err(StoreError::RevisionConflict { record: target });
        }
        let seq = inner.bump_seq();
        inner.users.insert(
            record.uid.clone(),
            Doc {
                revision: 1,
                seq,
                body,
            },
        );
        Ok(1)
    }

    async fn get_post(&self, post_id: PostId) -> Result<Option<Versioned<PostRecord>>, StoreError> {
        let inner = self.lock()?;
        inner
            .posts
            .get(&post_id)
            .map(|doc| decode(doc, RecordRef::Post(post_id)))
            .transpose()
    }

    async fn insert_post(&self, record: &PostRecord) -> Result<Revision, StoreError> {
        let target = RecordRef::Post(record.post_id);
        let body = encode(record, target.clone())?;
        let mut inner = self.lock()?;
        if inner.posts.contains_key(&record.post_id) {
            return Err(StoreError::RevisionConflict { record: target });
        }
        let seq = inner.bump_seq();
        inner.posts.insert(
            record.post_id,
            Doc {
                revision: 1,
                seq,
                body,
            },
        );
        Ok(1)
    }

    async fn list_posts(&self) -> Result<Vec<Versioned<PostRecord>>, StoreError> {
        let inner = self.lock()?;
        let mut docs: Vec<(&PostId, &Doc)> = inner.posts.iter().collect();
        docs.sort_by_key(|(_, doc)| doc.seq);
        docs.into_iter()
            .map(|(post_id, doc)| decode(doc, RecordRef::Post(*post_id)))
            .collect()
    }

    async fn commit(&self, writes: &[RecordWrite]) -> Result<(), StoreError> {
        let mut inner = self.lock()?;

        // Phase 1: validate every precondition and encode every body.
        // Nothing is mutated until the whole batch has passed.
        let mut staged: Vec<(&RecordWrite, Option<Value>)> = Vec::with_capacity(writes.len());
        for write in writes {
            let target = write.target();
            let (current, expected) = match write {
                RecordWrite::PutUser { expected, record } => {
                    (inner.users.get(&record.uid).map(|d| d.revision), *expected)
                }
                RecordWrite::PutPost { expected, record } => (
                    inner.posts.get(&record.post_id).map(|d| d.revision),
                    *expected,
                ),
                RecordWrite::DeletePost { expected, post_id } => {
                    (inner.posts.get(post_id).map(|d| d.revision), *expected)
                }
            };
            if current != Some(expected) {
                return Err(StoreError::RevisionConflict { record: target });
            }
            let body = match write {
                RecordWrite::PutUser { record, .. } => Some(encode(record, target)?),
                RecordWrite::PutPost { record, .. } => Some(encode(record, target)?),
                RecordWrite::DeletePost { .. } => None,
            };
            staged.push((write, body));
        }

        // Phase 2: apply. Puts replace an existing doc (phase 1 proved it
        // exists at the expected revision), so the insertion seq carries over.
        for (write, body) in staged {
            match write {
                RecordWrite::PutUser { expected, record } => {
                    if let Some(doc) = inner.users.get_mut(&record.uid) {
                        doc.revision = expected + 1;
                        doc.body = body.unwrap_or(Value::Null);
                    }
                }
                RecordWrite::PutPost { expected, record } => {
                    if let Some(doc) = inner.posts.get_mut(&record.post_id) {
                        doc.revision = expected + 1;
                        doc.body = body.unwrap_or(Value::Null);
                    }
                }
                RecordWrite::DeletePost { post_id, .. } => {
                    inner.posts.remove(post_id);
                }
            }
        }
        Ok(())
    }
}
