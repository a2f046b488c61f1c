//! Bounded optimistic-commit policy shared by the engines.
//!
//! Every mutator re-reads, re-validates, and commits guarded by the
//! revisions it read. A conflicted commit backs off and the caller's loop
//! runs the next attempt against fresh state; exhaustion surfaces as
//! `ConcurrentModification`.

use std::time::Duration;

use crate::error::EngineError;
use crate::records::RecordRef;
use crate::store::{RecordStore, RecordWrite, StoreError};

/// Attempts per operation before surfacing `ConcurrentModification`.
pub(crate) const MAX_COMMIT_RETRIES: u32 = 3;

/// Linear backoff step between attempts.
const RETRY_BACKOFF: Duration = Duration::from_millis(10);

pub(crate) enum CommitAttempt {
    Applied,
    Conflicted,
}

/// Run one guarded commit. Conflicts back off and report `Conflicted` so
/// the caller can rebuild its writes from fresh reads; every other store
/// failure is terminal.
pub(crate) async fn try_commit(
    store: &dyn RecordStore,
    writes: &[RecordWrite],
    attempt: u32,
) -> Result<CommitAttempt, EngineError> {
    match store.commit(writes).await {
        Ok(()) => Ok(CommitAttempt::Applied),
        Err(StoreError::RevisionConflict { record }) => {
            tracing::debug!(%record, attempt, "commit conflicted, backing off");
            tokio::time::sleep(RETRY_BACKOFF * attempt).await;
            Ok(CommitAttempt::Conflicted)
        }
        Err(err) => Err(err.into()),
    }
}

pub(crate) fn gave_up(record: RecordRef) -> EngineError {
    EngineError::ConcurrentModification {
        record,
        attempts: MAX_COMMIT_RETRIES,
    }
}
