//! User-record provisioning and profile settings.
//!
//! The auth provider owns identity; this service only guarantees that a
//! signed-in user has a document in the users collection.

use std::sync::Arc;

use crate::error::EngineError;
use crate::records::{RecordRef, UserRecord};
use crate::retry::{gave_up, try_commit, CommitAttempt, MAX_COMMIT_RETRIES};
use crate::store::{RecordStore, RecordWrite, StoreError};

pub struct AccountService {
    store: Arc<dyn RecordStore>,
}

impl AccountService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Make sure a user document exists for this uid, creating a fresh one
    /// (public, no relationships) on first sign-in. Losing a concurrent
    /// create race is not an error: the winner's document is authoritative
    /// and is returned instead.
    pub async fn ensure_user(
        &self,
        uid: &str,
        display_name: &str,
        email: &str,
    ) -> Result<UserRecord, EngineError> {
        if let Some(doc) = self.store.get_user(uid).await? {
            return Ok(doc.record);
        }

        let record = UserRecord::new(uid, display_name, email);
        match self.store.insert_user(&record).await {
            Ok(_) => {
                tracing::info!(uid, "user record created");
                Ok(record)
            }
            Err(StoreError::RevisionConflict { .. }) => {
                let doc =
                    self.store
                        .get_user(uid)
                        .await?
                        .ok_or(EngineError::NotFound {
                            record: RecordRef::User(uid.to_string()),
                        })?;
                Ok(doc.record)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Flip the profile privacy flag. Succeeds (idempotently) whenever the
    /// record exists.
    pub async fn set_profile_privacy(
        &self,
        uid: &str,
        is_private: bool,
    ) -> Result<(), EngineError> {
        for attempt in 1..=MAX_COMMIT_RETRIES {
            let doc = self
                .store
                .get_user(uid)
                .await?
                .ok_or(EngineError::NotFound {
                    record: RecordRef::User(uid.to_string()),
                })?;

            let mut rec = doc.record;
            rec.is_private = is_private;
            let writes = vec![RecordWrite::PutUser {
                expected: doc.revision,
                record: rec,
            }];
            if let CommitAttempt::Applied =
                try_commit(self.store.as_ref(), &writes, attempt).await?
            {
                tracing::info!(uid, is_private, "profile privacy updated");
                return Ok(());
            }
        }
        Err(gave_up(RecordRef::User(uid.to_string())))
    }
}
