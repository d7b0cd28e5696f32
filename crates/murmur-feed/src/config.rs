//! Engine configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for a feed engine session.
///
/// All values have working defaults; construct with struct-update syntax to
/// override individual fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Page size for the initial load and `load_older`
    pub page_size: usize,
    /// Size of the bounded recent window fetched by the new-items merge.
    /// If more than this many posts arrived since the last sync, the
    /// oldest of them are missed (known approximation of the backend's
    /// "most recent N" endpoint).
    pub newer_window: usize,
    /// Time budget for one batch of mention enrichment, milliseconds
    pub mention_budget_ms: u64,
    /// Capacity of the recently-seen comment-id set used to reject
    /// duplicate delivery of comment events
    pub comment_dedup_capacity: usize,
    /// Optional cap on the loaded window; `None` leaves the window
    /// unbounded and growth is the caller's concern
    pub window_cap: Option<usize>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            newer_window: 20,
            mention_budget_ms: 1_500,
            comment_dedup_capacity: 512,
            window_cap: None,
        }
    }
}

impl FeedConfig {
    /// Mention enrichment budget as a [`Duration`].
    pub fn mention_budget(&self) -> Duration {
        Duration::from_millis(self.mention_budget_ms)
    }
}
