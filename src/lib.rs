//! Relationship and engagement core for a document-store social app.
//!
//! The UI layer calls the engines here; the engines load current record
//! state through the [`store::RecordStore`] seam, validate, and write back
//! with revision-guarded, all-or-nothing commits. Nothing in this crate
//! caches record state.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use amity::accounts::AccountService;
//! use amity::relationship::{RelationshipEngine, RequestOutcome};
//! use amity::store_memory::MemoryStore;
//!
//! # async fn demo() -> Result<(), amity::EngineError> {
//! let store = Arc::new(MemoryStore::new());
//! let accounts = AccountService::new(store.clone());
//! let relationships = RelationshipEngine::new(store);
//!
//! accounts.ensure_user("alice", "Alice", "alice@example.test").await?;
//! accounts.ensure_user("bob", "Bob", "bob@example.test").await?;
//!
//! // Bob's profile is public, so this is an immediate friendship.
//! let outcome = relationships.request_or_befriend("alice", "bob").await?;
//! assert_eq!(outcome, RequestOutcome::Befriended);
//! # Ok(())
//! # }
//! ```

// Typed failure model
pub mod error;

// Domain records
pub mod records;

// Persistence seam and in-process backend
pub mod store;
pub mod store_memory;

// Engines
pub mod accounts;
pub mod engagement;
pub mod relationship;

// Derived feed views
pub mod feed;

// Shared optimistic-commit policy
mod retry;

pub use error::EngineError;
pub use records::{Comment, PostId, PostRecord, RecordRef, Revision, Uid, UserRecord};
pub use relationship::RequestOutcome;
pub use store::{RecordStore, RecordWrite, StoreError, Versioned};
