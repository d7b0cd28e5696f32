//! Murmur Core - Shared feed domain types
//!
//! This crate holds the types the reconciliation engine and its
//! collaborators agree on:
//!
//! - Identifiers: `PostId`, `CommentId`, `ActorId`, `Username`
//! - Records: `PostRecord`, `CommentRecord`
//! - Events: `EventEnvelope`, `FeedEvent`, `ChannelStatus`
//! - Errors: `FeedError` and the crate `Result` alias
//! - Collaborator contracts: `HistoryFetcher`, `MutationSubmitter`,
//!   `MentionLookup`
//!
//! No engine logic lives here; the engine itself is `murmur-feed`.

pub mod collaborators;
pub mod errors;
pub mod events;
pub mod identifiers;
pub mod records;

pub use collaborators::{HistoryFetcher, MentionLookup, MutationSubmitter, PageRequest};
pub use errors::{FeedError, Result};
pub use events::{ChannelStatus, EventEnvelope, FeedEvent};
pub use identifiers::{ActorId, CommentId, PostId, Username};
pub use records::{CommentRecord, PostRecord};
