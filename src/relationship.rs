//! Friend-request / friendship state machine.
//!
//! Per ordered (actor, target) pair the states are
//! `Strangers → PendingRequest → Friends`, with a direct
//! `Strangers → Friends` edge when the target profile is public and
//! `PendingRequest → Strangers` via decline. There is no unfriend
//! transition.
//!
//! Both sides of a friendship are written in one commit batch, so the
//! symmetric `friends` sets can never diverge through this engine.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::EngineError;
use crate::records::{RecordRef, Uid, UserRecord};
use crate::retry::{gave_up, try_commit, CommitAttempt, MAX_COMMIT_RETRIES};
use crate::store::{RecordStore, RecordWrite, Versioned};

/// Result of `request_or_befriend`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Target profile is public: both sides are friends, effective
    /// immediately.
    Befriended,
    /// Target profile is private: a pending request was placed on their
    /// record.
    RequestSent,
}

/// Executes relationship transitions against a `RecordStore`.
pub struct RelationshipEngine {
    store: Arc<dyn RecordStore>,
}

impl RelationshipEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    async fn load_user(&self, uid: &str) -> Result<Versioned<UserRecord>, EngineError> {
        self.store
            .get_user(uid)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                record: RecordRef::User(uid.to_string()),
            })
    }

    /// One-directional "add friend" action.
    ///
    /// A public target becomes a friend immediately (both records written
    /// in one commit); a private target receives a pending request that
    /// must be accepted via [`accept_request`](Self::accept_request).
    pub async fn request_or_befriend(
        &self,
        actor: &str,
        target: &str,
    ) -> Result<RequestOutcome, EngineError> {
        if actor == target {
            return Err(EngineError::SelfReference {
                uid: actor.to_string(),
            });
        }

        for attempt in 1..=MAX_COMMIT_RETRIES {
            let actor_doc = self.load_user(actor).await?;
            let target_doc = self.load_user(target).await?;

            if actor_doc.record.friends.contains(target) {
                return Err(EngineError::AlreadyFriends {
                    actor: actor.to_string(),
                    target: target.to_string(),
                });
            }

            let (writes, outcome) = if target_doc.record.is_private {
                if target_doc.record.friend_requests.contains(actor) {
                    return Err(EngineError::DuplicateRequest {
                        actor: actor.to_string(),
                        target: target.to_string(),
                    });
                }
                let mut target_rec = target_doc.record;
                target_rec.friend_requests.insert(actor.to_string());
                (
                    vec![RecordWrite::PutUser {
                        expected: target_doc.revision,
                        record: target_rec,
                    }],
                    RequestOutcome::RequestSent,
                )
            } else {
                let mut actor_rec = actor_doc.record;
                let mut target_rec = target_doc.record;
                actor_rec.friends.insert(target.to_string());
                target_rec.friends.insert(actor.to_string());
                // A pending request in either direction is consumed by the
                // new friendship (friends ∩ friend_requests must stay empty).
                actor_rec.friend_requests.remove(target);
                target_rec.friend_requests.remove(actor);
                (
                    vec![
                        RecordWrite::PutUser {
                            expected: actor_doc.revision,
                            record: actor_rec,
                        },
                        RecordWrite::PutUser {
                            expected: target_doc.revision,
                            record: target_rec,
                        },
                    ],
                    RequestOutcome::Befriended,
                )
            };

            if let CommitAttempt::Applied =
                try_commit(self.store.as_ref(), &writes, attempt).await?
            {
                tracing::info!(actor, target, ?outcome, "relationship updated");
                return Ok(outcome);
            }
        }
        Err(gave_up(RecordRef::User(target.to_string())))
    }

    /// Accept a pending request: the request is removed and both `friends`
    /// sets gain the other side, all in one commit.
    ///
    /// Returns the owner's updated friend set.
    pub async fn accept_request(
        &self,
        owner: &str,
        requester: &str,
    ) -> Result<BTreeSet<Uid>, EngineError> {
        for attempt in 1..=MAX_COMMIT_RETRIES {
            let owner_doc = self.load_user(owner).await?;
            if !owner_doc.record.friend_requests.contains(requester) {
                return Err(EngineError::NoSuchRequest {
                    requester: requester.to_string(),
                });
            }
            let requester_doc = self.load_user(requester).await?;

            let mut owner_rec = owner_doc.record;
            let mut requester_rec = requester_doc.record;
            owner_rec.friend_requests.remove(requester);
            owner_rec.friends.insert(requester.to_string());
            requester_rec.friends.insert(owner.to_string());
            // If the owner had also requested the other side, the new
            // friendship consumes that request too.
            requester_rec.friend_requests.remove(owner);

            let friends = owner_rec.friends.clone();
            let writes = vec![
                RecordWrite::PutUser {
                    expected: owner_doc.revision,
                    record: owner_rec,
                },
                RecordWrite::PutUser {
                    expected: requester_doc.revision,
                    record: requester_rec,
                },
            ];

            if let CommitAttempt::Applied =
                try_commit(self.store.as_ref(), &writes, attempt).await?
            {
                tracing::info!(owner, requester, "friend request accepted");
                return Ok(friends);
            }
        }
        Err(gave_up(RecordRef::User(owner.to_string())))
    }

    /// Decline a pending request. Idempotent: declining a request that is
    /// not pending is a no-op, not an error.
    pub async fn decline_request(&self, owner: &str, requester: &str) -> Result<(), EngineError> {
        for attempt in 1..=MAX_COMMIT_RETRIES {
            let owner_doc = self.load_user(owner).await?;
            if !owner_doc.record.friend_requests.contains(requester) {
                return Ok(());
            }

            let mut owner_rec = owner_doc.record;
            owner_rec.friend_requests.remove(requester);
            let writes = vec![RecordWrite::PutUser {
                expected: owner_doc.revision,
                record: owner_rec,
            }];

            if let CommitAttempt::Applied =
                try_commit(self.store.as_ref(), &writes, attempt).await?
            {
                tracing::info!(owner, requester, "friend request declined");
                return Ok(());
            }
        }
        Err(gave_up(RecordRef::User(owner.to_string())))
    }
}
