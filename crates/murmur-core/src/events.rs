//! Real-time event types
//!
//! The realtime channel delivers at-least-once JSON envelopes. An envelope
//! is decoded into a typed [`FeedEvent`] before reconciliation; envelopes
//! with an unknown kind or a missing target decode to `None` and are dropped
//! by the reconciler rather than surfaced as errors.

use serde::{Deserialize, Serialize};

use crate::identifiers::{ActorId, CommentId, PostId};

/// Wire form of a realtime event, as delivered by the channel.
///
/// All fields other than `kind` are optional on the wire; which ones are
/// required depends on the kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Event kind discriminator, e.g. `"like-created"`
    pub kind: String,
    /// Target post, when the kind addresses a post
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_id: Option<PostId>,
    /// Actor that caused the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<ActorId>,
    /// Comment identity, for comment events
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<CommentId>,
}

impl EventEnvelope {
    /// Decode the envelope into a typed event.
    ///
    /// Returns `None` for unknown kinds or envelopes missing the fields
    /// their kind requires. Malformed traffic is a fact of life on an
    /// at-least-once transport and never an error.
    pub fn decode(&self) -> Option<FeedEvent> {
        match self.kind.as_str() {
            "like-created" => Some(FeedEvent::LikeCreated {
                post_id: self.post_id.clone()?,
                actor: self.actor.clone()?,
            }),
            "like-deleted" => Some(FeedEvent::LikeDeleted {
                post_id: self.post_id.clone()?,
                actor: self.actor.clone()?,
            }),
            "comment-created" => Some(FeedEvent::CommentCreated {
                post_id: self.post_id.clone()?,
                comment_id: self.comment_id.clone()?,
            }),
            "post-created" => Some(FeedEvent::PostCreated {
                post_id: self.post_id.clone()?,
                actor: self.actor.clone()?,
            }),
            _ => None,
        }
    }
}

/// A decoded realtime event describing a mutation performed elsewhere
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// An actor liked a post
    LikeCreated {
        /// Target post
        post_id: PostId,
        /// Actor who liked
        actor: ActorId,
    },
    /// An actor removed a like
    LikeDeleted {
        /// Target post
        post_id: PostId,
        /// Actor who unliked
        actor: ActorId,
    },
    /// A comment was created on a post
    CommentCreated {
        /// Parent post
        post_id: PostId,
        /// Identity of the new comment, used for duplicate-delivery rejection
        comment_id: CommentId,
    },
    /// A new post was created
    PostCreated {
        /// The new post
        post_id: PostId,
        /// Author of the post
        actor: ActorId,
    },
}

/// Connection state of the realtime channel.
///
/// Reconnect and backoff are owned by the transport; the engine only
/// receives discrete state-change notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelStatus {
    /// Channel is up and delivering events
    Connected,
    /// Channel dropped and the transport is re-establishing it
    Reconnecting,
    /// Channel is down
    Disconnected,
}
