//! New-items gate
//!
//! Buffers the count of not-yet-merged newer posts. The gate never touches
//! the window itself; the actual prepend-merge runs only when the caller
//! explicitly triggers it (user at top of view, indicator clicked), so a
//! scrolled-away reader is never disrupted by background arrivals.

/// Counter of newer posts announced by the realtime channel but not yet
/// merged into the visible window.
#[derive(Debug, Default)]
pub struct NewItemsGate {
    pending: usize,
}

impl NewItemsGate {
    /// Create a gate with nothing pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of announced-but-unmerged posts.
    pub fn pending_new_count(&self) -> usize {
        self.pending
    }

    /// Note one `post-created` announcement from another actor.
    pub fn note_post_created(&mut self) {
        self.pending += 1;
    }

    /// Reset the counter; called exactly when a merge is triggered.
    pub fn reset(&mut self) {
        self.pending = 0;
    }
}
