//! Typed engine notifications
//!
//! In-process publish/subscribe channel owned by the engine. Consumers
//! (view layers) subscribe for discrete notifications instead of listening
//! on a platform-global event bus or polling connection state.

use murmur_core::{ChannelStatus, FeedError};

/// A notification published by the engine to its subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedSignal {
    /// The visible window changed (merge, patch, or rollback); re-render
    WindowChanged,
    /// Newer posts were announced but not merged; show an indicator
    NewItemsAvailable {
        /// Current pending-new count
        count: usize,
    },
    /// A caller-visible operation failed
    OperationFailed(FeedError),
    /// The realtime channel changed connection state
    ConnectionChanged(ChannelStatus),
}
