//! Feed record types
//!
//! `PostRecord` is the unit the reconciliation engine orders, merges, and
//! patches. Like counts are derived from the `liked_by` set rather than
//! stored as an independent counter, so concurrent local and remote toggles
//! cannot drift the count away from the set.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::identifiers::{ActorId, CommentId, PostId, Username};

/// A post as held in the local feed window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostRecord {
    /// Server-generated identity
    pub id: PostId,
    /// Author of the post
    pub author: ActorId,
    /// Post body
    pub content: String,
    /// Creation time, unix epoch milliseconds
    pub created_at_ms: u64,
    /// Actors who currently like this post
    #[serde(default)]
    pub liked_by: BTreeSet<ActorId>,
    /// Number of comments on this post
    #[serde(default)]
    pub comment_count: u32,
    /// Mentioned usernames, absent until enrichment has run for this record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mentions: Option<BTreeSet<Username>>,
}

impl PostRecord {
    /// Create a record with no likes, comments, or mentions.
    pub fn new(
        id: PostId,
        author: ActorId,
        content: impl Into<String>,
        created_at_ms: u64,
    ) -> Self {
        Self {
            id,
            author,
            content: content.into(),
            created_at_ms,
            liked_by: BTreeSet::new(),
            comment_count: 0,
            mentions: None,
        }
    }

    /// Number of likes, derived from the like set.
    pub fn like_count(&self) -> usize {
        self.liked_by.len()
    }

    /// Whether the given actor currently likes this post.
    pub fn liked_by_actor(&self, actor: &ActorId) -> bool {
        self.liked_by.contains(actor)
    }

    /// Sort key for the feed window: strictly decreasing creation time,
    /// id as tie-break.
    pub fn window_key(&self) -> (u64, &PostId) {
        (self.created_at_ms, &self.id)
    }
}

/// A comment on a post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentRecord {
    /// Server-generated identity
    pub id: CommentId,
    /// Post this comment belongs to
    pub post_id: PostId,
    /// Author of the comment
    pub author: ActorId,
    /// Comment body
    pub content: String,
    /// Actors who currently like this comment
    #[serde(default)]
    pub liked_by: BTreeSet<ActorId>,
}

impl CommentRecord {
    /// Number of likes, derived from the like set.
    pub fn like_count(&self) -> usize {
        self.liked_by.len()
    }
}
