//! Collaborator contracts
//!
//! The engine talks to the outside world exclusively through these traits.
//! Implementations live at the application edge (HTTP clients, websockets);
//! tests use the mocks in `murmur-testkit`.

use async_trait::async_trait;
use std::collections::BTreeSet;

use crate::errors::Result;
use crate::identifiers::{ActorId, PostId, Username};
use crate::records::PostRecord;

/// A request for one page of historical posts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    /// Maximum number of records to return
    pub limit: usize,
    /// Return records strictly older than this post. `None` requests the
    /// most recent records the backend has.
    pub older_than: Option<PostId>,
}

impl PageRequest {
    /// Request the most recent `limit` records.
    pub fn newest(limit: usize) -> Self {
        Self {
            limit,
            older_than: None,
        }
    }

    /// Request `limit` records strictly older than `cursor`.
    pub fn older_than(cursor: PostId, limit: usize) -> Self {
        Self {
            limit,
            older_than: Some(cursor),
        }
    }
}

/// Paginated historical loads.
///
/// Pages are expected in feed order (newest first); the store re-sorts
/// defensively either way. Fails with [`FeedError::Transport`] on
/// network/HTTP failure and must be side-effect free when it fails.
///
/// [`FeedError::Transport`]: crate::errors::FeedError::Transport
#[async_trait]
pub trait HistoryFetcher: Send + Sync {
    /// Fetch one page of posts.
    async fn fetch_page(&self, request: PageRequest) -> Result<Vec<PostRecord>>;
}

/// Submission of actor-initiated mutations.
///
/// The server is authoritative for created entities; creation calls return
/// no record and the engine re-fetches instead of fabricating one locally.
#[async_trait]
pub trait MutationSubmitter: Send + Sync {
    /// Record a like by `actor` on `post_id`.
    async fn like(&self, post_id: &PostId, actor: &ActorId) -> Result<()>;

    /// Remove a like by `actor` on `post_id`.
    async fn unlike(&self, post_id: &PostId, actor: &ActorId) -> Result<()>;

    /// Create a new post with the given content.
    async fn create_post(&self, content: &str) -> Result<()>;

    /// Create a comment under `post_id`.
    async fn create_comment(&self, post_id: &PostId, content: &str) -> Result<()>;
}

/// Best-effort lookup of usernames mentioned by a post.
#[async_trait]
pub trait MentionLookup: Send + Sync {
    /// Resolve the mentions for one post.
    async fn fetch_mentions(&self, post_id: &PostId) -> Result<BTreeSet<Username>>;
}
