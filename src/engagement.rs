//! Post authoring and engagement mutators.
//!
//! Engagement fields (`liked_by`, `like_count`, `comments`) are open to any
//! authenticated user; title, media, and deletion belong to the author.
//! Every mutator re-reads the post and commits guarded by the revision it
//! read, so concurrent likes or comments are never silently dropped.

use std::sync::Arc;

use crate::error::EngineError;
use crate::records::{Comment, PostId, PostRecord, RecordRef};
use crate::retry::{gave_up, try_commit, CommitAttempt, MAX_COMMIT_RETRIES};
use crate::store::{RecordStore, RecordWrite, Versioned};

/// Executes post mutations against a `RecordStore`.
pub struct PostEngagementEngine {
    store: Arc<dyn RecordStore>,
}

impl PostEngagementEngine {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    async fn load_post(&self, post_id: PostId) -> Result<Versioned<PostRecord>, EngineError> {
        self.store
            .get_post(post_id)
            .await?
            .ok_or(EngineError::NotFound {
                record: RecordRef::Post(post_id),
            })
    }

    /// Publish a new post. The title must be non-empty after trimming.
    pub async fn create_post(
        &self,
        author_id: &str,
        author_email: &str,
        title: &str,
        media_url: Option<String>,
    ) -> Result<PostRecord, EngineError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(EngineError::EmptyContent);
        }
        let record = PostRecord::new(author_id, author_email, title, media_url);
        self.store.insert_post(&record).await?;
        tracing::info!(author_id, post_id = %record.post_id, "post created");
        Ok(record)
    }

    /// Update title and, optionally, media. Author only. Passing `None`
    /// for `media_url` keeps the existing media.
    pub async fn edit_post(
        &self,
        post_id: PostId,
        editor: &str,
        title: &str,
        media_url: Option<String>,
    ) -> Result<(), EngineError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(EngineError::EmptyContent);
        }

        for attempt in 1..=MAX_COMMIT_RETRIES {
            let doc = self.load_post(post_id).await?;
            if doc.record.author_id != editor {
                return Err(EngineError::NotAuthor {
                    post_id,
                    actor: editor.to_string(),
                });
            }

            let mut rec = doc.record;
            rec.title = title.to_string();
            if let Some(url) = media_url.clone() {
                rec.media_url = Some(url);
            }
            let writes = vec![RecordWrite::PutPost {
                expected: doc.revision,
                record: rec,
            }];
            if let CommitAttempt::Applied =
                try_commit(self.store.as_ref(), &writes, attempt).await?
            {
                return Ok(());
            }
        }
        Err(gave_up(RecordRef::Post(post_id)))
    }

    /// Delete a post. Author only.
    pub async fn delete_post(&self, post_id: PostId, actor: &str) -> Result<(), EngineError> {
        for attempt in 1..=MAX_COMMIT_RETRIES {
            let doc = self.load_post(post_id).await?;
            if doc.record.author_id != actor {
                return Err(EngineError::NotAuthor {
                    post_id,
                    actor: actor.to_string(),
                });
            }

            let writes = vec![RecordWrite::DeletePost {
                expected: doc.revision,
                post_id,
            }];
            if let CommitAttempt::Applied =
                try_commit(self.store.as_ref(), &writes, attempt).await?
            {
                tracing::info!(actor, %post_id, "post deleted");
                return Ok(());
            }
        }
        Err(gave_up(RecordRef::Post(post_id)))
    }

    /// Like a post. Each uid may like a post at most once; the stored
    /// count is re-derived from the like set, never incremented blindly.
    ///
    /// Returns the new like count.
    pub async fn like(&self, post_id: PostId, uid: &str) -> Result<u32, EngineError> {
        for attempt in 1..=MAX_COMMIT_RETRIES {
            let doc = self.load_post(post_id).await?;
            if doc.record.liked_by.contains(uid) {
                return Err(EngineError::AlreadyLiked {
                    post_id,
                    uid: uid.to_string(),
                });
            }

            let mut rec = doc.record;
            rec.liked_by.insert(uid.to_string());
            rec.sync_like_count();
            let count = rec.like_count;
            let writes = vec![RecordWrite::PutPost {
                expected: doc.revision,
                record: rec,
            }];
            if let CommitAttempt::Applied =
                try_commit(self.store.as_ref(), &writes, attempt).await?
            {
                return Ok(count);
            }
        }
        Err(gave_up(RecordRef::Post(post_id)))
    }

    /// Append a comment. Any authenticated user may comment; the text must
    /// be non-empty after trimming.
    ///
    /// Returns the index of the new comment.
    pub async fn add_comment(
        &self,
        post_id: PostId,
        uid: &str,
        text: &str,
    ) -> Result<usize, EngineError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(EngineError::EmptyContent);
        }

        for attempt in 1..=MAX_COMMIT_RETRIES {
            let doc = self.load_post(post_id).await?;
            let mut rec = doc.record;
            rec.comments.push(Comment {
                author_id: uid.to_string(),
                text: text.to_string(),
                like_count: 0,
            });
            let index = rec.comments.len() - 1;
            let writes = vec![RecordWrite::PutPost {
                expected: doc.revision,
                record: rec,
            }];
            if let CommitAttempt::Applied =
                try_commit(self.store.as_ref(), &writes, attempt).await?
            {
                return Ok(index);
            }
        }
        Err(gave_up(RecordRef::Post(post_id)))
    }

    /// Like a comment by its index in the post's comment list.
    ///
    /// Comment likes are a bare counter: the same user liking twice counts
    /// twice. Deliberately weaker than the post-like rule (see DESIGN.md).
    ///
    /// Returns the comment's new like count.
    pub async fn like_comment(
        &self,
        post_id: PostId,
        comment_index: usize,
    ) -> Result<u32, EngineError> {
        for attempt in 1..=MAX_COMMIT_RETRIES {
            let doc = self.load_post(post_id).await?;
            let mut rec = doc.record;
            let len = rec.comments.len();
            let comment = rec
                .comments
                .get_mut(comment_index)
                .ok_or(EngineError::IndexOutOfRange {
                    index: comment_index,
                    len,
                })?;
            comment.like_count += 1;
            let count = comment.like_count;
            let writes = vec![RecordWrite::PutPost {
                expected: doc.revision,
                record: rec,
            }];
            if let CommitAttempt::Applied =
                try_commit(self.store.as_ref(), &writes, attempt).await?
            {
                return Ok(count);
            }
        }
        Err(gave_up(RecordRef::Post(post_id)))
    }

    /// Flip the post's privacy flag. Succeeds whenever the record exists.
    pub async fn set_post_privacy(
        &self,
        post_id: PostId,
        is_private: bool,
    ) -> Result<(), EngineError> {
        for attempt in 1..=MAX_COMMIT_RETRIES {
            let doc = self.load_post(post_id).await?;
            let mut rec = doc.record;
            rec.is_private = is_private;
            let writes = vec![RecordWrite::PutPost {
                expected: doc.revision,
                record: rec,
            }];
            if let CommitAttempt::Applied =
                try_commit(self.store.as_ref(), &writes, attempt).await?
            {
                return Ok(());
            }
        }
        Err(gave_up(RecordRef::Post(post_id)))
    }
}
