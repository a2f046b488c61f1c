use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

// ─── Scalar aliases ───────────────────────────────────────────

/// Opaque user id issued by the external auth provider.
pub type Uid = String;

/// Post document id (UUIDv7, time-ordered).
pub type PostId = Uuid;

/// Per-document revision counter for optimistic concurrency.
pub type Revision = u64;

// ─── RecordRef ────────────────────────────────────────────────

/// Which document a store or engine failure refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RecordRef {
    User(Uid),
    Post(PostId),
}

impl fmt::Display for RecordRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRef::User(uid) => write!(f, "user {uid}"),
            RecordRef::Post(post_id) => write!(f, "post {post_id}"),
        }
    }
}

// ─── UserRecord ───────────────────────────────────────────────

/// One document in the users collection.
///
/// `friends` is symmetric across documents (if `a` lists `b` then `b`
/// lists `a`) and disjoint from `friend_requests`. The relationship
/// engine maintains both; nothing else writes these fields.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub uid: Uid,
    pub display_name: String,
    pub email: String,
    pub is_private: bool,
    pub friends: BTreeSet<Uid>,
    /// Inbound pending requests: a uid listed here has asked the owner to
    /// connect and the owner has not yet decided.
    pub friend_requests: BTreeSet<Uid>,
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Fresh record for a first sign-in: public profile, no friends, no
    /// pending requests.
    pub fn new(
        uid: impl Into<Uid>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            uid: uid.into(),
            display_name: display_name.into(),
            email: email.into(),
            is_private: false,
            friends: BTreeSet::new(),
            friend_requests: BTreeSet::new(),
            created_at: Utc::now(),
        }
    }
}

// ─── PostRecord ───────────────────────────────────────────────

/// One document in the posts collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub post_id: PostId,
    pub author_id: Uid,
    /// Author email denormalized onto the post for feed rendering.
    pub author_email: String,
    pub title: String,
    pub media_url: Option<String>,
    pub is_private: bool,
    /// Always equals `liked_by.len()`. Recomputed from the set on every
    /// mutation, never incremented independently.
    pub like_count: u32,
    pub liked_by: BTreeSet<Uid>,
    /// Insertion order. Display ordering is a derived view and is never
    /// written back.
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
}

impl PostRecord {
    /// Fresh post with zero engagement.
    pub fn new(
        author_id: impl Into<Uid>,
        author_email: impl Into<String>,
        title: impl Into<String>,
        media_url: Option<String>,
    ) -> Self {
        Self {
            post_id: Uuid::now_v7(),
            author_id: author_id.into(),
            author_email: author_email.into(),
            title: title.into(),
            media_url,
            is_private: false,
            like_count: 0,
            liked_by: BTreeSet::new(),
            comments: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Re-derive the stored count from the like set.
    pub(crate) fn sync_like_count(&mut self) {
        self.like_count = self.liked_by.len() as u32;
    }
}

/// A comment on a post. Comment likes are a bare counter; per-user
/// de-duplication is intentionally not tracked here, unlike post likes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub author_id: Uid,
    pub text: String,
    pub like_count: u32,
}
