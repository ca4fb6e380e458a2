//! Comments and replies for one community post.
//!
//! DESIGN
//! ======
//! The store is a plain in-memory tree: comments in server order, replies in
//! the order they were added. Every mutation goes to the server first and the
//! local tree changes only after it confirms, so a failed call leaves the tree
//! exactly as it was. New items are appended, never re-sorted.
//!
//! ERROR HANDLING
//! ==============
//! Updating an item that is not in the tree fails locally without a network
//! call. Deleting one is a no-op, and a 404 from the server on delete counts
//! as already deleted.

use std::sync::Arc;

use async_trait::async_trait;

use crate::net::error::ApiError;
use crate::net::types::{Comment, CommentUpdate, NewComment, NewReply, Reply, ReplyUpdate};

/// Server operations the store depends on. Implemented by
/// [`crate::net::api::ApiClient`].
#[async_trait]
pub trait CommentService: Send + Sync {
    async fn list_comments(&self, post_id: i64) -> Result<Vec<Comment>, ApiError>;
    async fn create_comment(&self, post_id: i64, body: &NewComment) -> Result<Comment, ApiError>;
    async fn update_comment(&self, comment_id: i64, body: &CommentUpdate) -> Result<(), ApiError>;
    async fn delete_comment(&self, comment_id: i64) -> Result<(), ApiError>;
    async fn create_reply(&self, comment_id: i64, body: &NewReply) -> Result<Reply, ApiError>;
    async fn update_reply(
        &self,
        comment_id: i64,
        reply_id: i64,
        body: &ReplyUpdate,
    ) -> Result<(), ApiError>;
    async fn delete_reply(&self, comment_id: i64, reply_id: i64) -> Result<(), ApiError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CommentError {
    #[error("comment {0} not found")]
    CommentNotFound(i64),
    #[error("reply {reply_id} not found under comment {comment_id}")]
    ReplyNotFound { comment_id: i64, reply_id: i64 },
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CommentError {
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::CommentNotFound(_) => "댓글을 찾을 수 없습니다.".to_owned(),
            Self::ReplyNotFound { .. } => "답글을 찾을 수 없습니다.".to_owned(),
            Self::Api(e) => e.user_message(),
        }
    }
}

/// Comment tree for the post last fetched.
pub struct CommentStore {
    service: Arc<dyn CommentService>,
    post_id: Option<i64>,
    comments: Vec<Comment>,
    loading: bool,
    error: Option<String>,
}

impl CommentStore {
    #[must_use]
    pub fn new(service: Arc<dyn CommentService>) -> Self {
        Self { service, post_id: None, comments: Vec::new(), loading: false, error: None }
    }

    #[must_use]
    pub fn comments(&self) -> &[Comment] {
        &self.comments
    }

    #[must_use]
    pub fn comment(&self, comment_id: i64) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    #[must_use]
    pub fn post_id(&self) -> Option<i64> {
        self.post_id
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Message from the last failed operation, cleared on the next success.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Drop everything, e.g. on logout.
    pub fn reset(&mut self) {
        self.post_id = None;
        self.comments.clear();
        self.loading = false;
        self.error = None;
    }

    fn record<T>(&mut self, result: Result<T, CommentError>) -> Result<T, CommentError> {
        match &result {
            Ok(_) => self.error = None,
            Err(e) => {
                tracing::warn!(error = %e, "comment operation failed");
                self.error = Some(e.user_message());
            }
        }
        result
    }

    // =========================================================================
    // COMMENTS
    // =========================================================================

    /// Replace the tree with the server's list for `post_id`. On failure the
    /// previous list is kept.
    pub async fn fetch_comments(&mut self, post_id: i64) -> Result<(), CommentError> {
        self.loading = true;
        let result = self.service.list_comments(post_id).await;
        self.loading = false;
        match result {
            Ok(comments) => {
                tracing::debug!(post_id, count = comments.len(), "comments loaded");
                self.post_id = Some(post_id);
                self.comments = comments;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                let message = match &e {
                    ApiError::Transport(_) => e.user_message(),
                    _ => "댓글을 불러오지 못했습니다.".to_owned(),
                };
                self.error = Some(message);
                tracing::warn!(post_id, error = %e, "comment fetch failed");
                Err(e.into())
            }
        }
    }

    /// Create a comment and return the server's copy. The tree only changes
    /// when `post_id` is the post it holds.
    pub async fn add_comment(&mut self, post_id: i64, body: &NewComment) -> Result<Comment, CommentError> {
        let created = match self.service.create_comment(post_id, body).await {
            Ok(c) => c,
            Err(e) => return self.record(Err(e.into())),
        };
        self.error = None;
        if self.post_id != Some(post_id) {
            tracing::debug!(post_id, held = ?self.post_id, "comment created for another post");
            return Ok(created);
        }
        match self.comments.iter_mut().find(|c| c.id == created.id) {
            Some(existing) => existing.clone_from(&created),
            None => self.comments.push(created.clone()),
        }
        Ok(created)
    }

    pub async fn update_comment(&mut self, comment_id: i64, body: &CommentUpdate) -> Result<(), CommentError> {
        let Some(index) = self.comments.iter().position(|c| c.id == comment_id) else {
            return self.record(Err(CommentError::CommentNotFound(comment_id)));
        };
        if let Err(e) = self.service.update_comment(comment_id, body).await {
            return self.record(Err(e.into()));
        }
        self.comments[index].content.clone_from(&body.content);
        self.record(Ok(()))
    }

    pub async fn delete_comment(&mut self, comment_id: i64) -> Result<(), CommentError> {
        if self.comment(comment_id).is_none() {
            return Ok(());
        }
        match self.service.delete_comment(comment_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(comment_id, "comment already deleted on server");
            }
            Err(e) => return self.record(Err(e.into())),
        }
        self.comments.retain(|c| c.id != comment_id);
        self.record(Ok(()))
    }

    // =========================================================================
    // REPLIES
    // =========================================================================

    /// Create a reply and append it to its parent.
    pub async fn add_reply(&mut self, comment_id: i64, body: &NewReply) -> Result<(), CommentError> {
        if self.comment(comment_id).is_none() {
            return self.record(Err(CommentError::CommentNotFound(comment_id)));
        }
        let reply = match self.service.create_reply(comment_id, body).await {
            Ok(r) => r,
            Err(e) => return self.record(Err(e.into())),
        };
        if let Some(parent) = self.comments.iter_mut().find(|c| c.id == comment_id) {
            parent.replies.retain(|r| r.id != reply.id);
            parent.replies.push(reply);
        }
        self.record(Ok(()))
    }

    pub async fn update_reply(
        &mut self,
        comment_id: i64,
        reply_id: i64,
        body: &ReplyUpdate,
    ) -> Result<(), CommentError> {
        if self.reply(comment_id, reply_id).is_none() {
            let missing = self.missing_reply(comment_id, reply_id);
            return self.record(Err(missing));
        }
        if let Err(e) = self.service.update_reply(comment_id, reply_id, body).await {
            return self.record(Err(e.into()));
        }
        if let Some(reply) = self.reply_mut(comment_id, reply_id) {
            reply.content.clone_from(&body.content);
        }
        self.record(Ok(()))
    }

    pub async fn delete_reply(&mut self, comment_id: i64, reply_id: i64) -> Result<(), CommentError> {
        if self.reply(comment_id, reply_id).is_none() {
            return Ok(());
        }
        match self.service.delete_reply(comment_id, reply_id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(comment_id, reply_id, "reply already deleted on server");
            }
            Err(e) => return self.record(Err(e.into())),
        }
        if let Some(parent) = self.comments.iter_mut().find(|c| c.id == comment_id) {
            parent.replies.retain(|r| r.id != reply_id);
        }
        self.record(Ok(()))
    }

    fn reply(&self, comment_id: i64, reply_id: i64) -> Option<&Reply> {
        self.comment(comment_id)?
            .replies
            .iter()
            .find(|r| r.id == reply_id)
    }

    fn reply_mut(&mut self, comment_id: i64, reply_id: i64) -> Option<&mut Reply> {
        self.comments
            .iter_mut()
            .find(|c| c.id == comment_id)?
            .replies
            .iter_mut()
            .find(|r| r.id == reply_id)
    }

    fn missing_reply(&self, comment_id: i64, reply_id: i64) -> CommentError {
        if self.comment(comment_id).is_some() {
            CommentError::ReplyNotFound { comment_id, reply_id }
        } else {
            CommentError::CommentNotFound(comment_id)
        }
    }
}

impl std::fmt::Debug for CommentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommentStore")
            .field("post_id", &self.post_id)
            .field("comments", &self.comments.len())
            .field("loading", &self.loading)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "comments_test.rs"]
mod tests;
