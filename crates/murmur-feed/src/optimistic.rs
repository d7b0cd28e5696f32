//! Optimistic mutation ledger
//!
//! Applies a local like/unlike to the store immediately, journals how to
//! undo it, and reconciles with the eventual authoritative outcome. The
//! ledger itself is synchronous; the engine performs the network await
//! between [`OptimisticMutator::begin_toggle`] and the matching resolve
//! call, so every store mutation happens between suspension points.
//!
//! Rollback restores the acting actor's membership in the like set to the
//! state recorded before the first uncommitted toggle. Because the like
//! count is derived from the set, likes contributed by other actors while
//! the request was in flight survive the rollback.

use std::collections::HashMap;
use std::time::Instant;

use murmur_core::{ActorId, PostId};

use crate::store::FeedStore;

/// The request a toggle owes to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeIntent {
    /// Submit a like
    Like,
    /// Submit an unlike
    Unlike,
}

/// Like state of a post for the acting actor, captured at issue time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviousLikeState {
    /// Whether the actor liked the post
    pub liked: bool,
    /// Like count at capture time, for diagnostics
    pub count: usize,
}

/// Journal entry for one outstanding optimistic mutation.
///
/// At most one entry exists per target; a second toggle before the first
/// resolves overwrites the entry (coalescing) while keeping the original
/// `previous`, so rollback always restores true server-confirmed state.
#[derive(Debug, Clone)]
pub struct PendingMutation {
    /// Post being toggled
    pub target: PostId,
    /// Request currently owed to the server
    pub intent: LikeIntent,
    /// State before the first uncommitted toggle
    pub previous: PreviousLikeState,
    /// When the first uncommitted toggle was issued
    pub issued_at: Instant,
    /// Bumped on coalesce; a resolution with a stale generation is ignored
    generation: u64,
}

/// Handle identifying one submitted toggle for later resolution.
#[derive(Debug, Clone)]
pub struct ToggleTicket {
    /// Post the toggle addressed
    pub target: PostId,
    /// What was submitted
    pub intent: LikeIntent,
    generation: u64,
}

/// Ledger of outstanding optimistic mutations for the session actor.
#[derive(Debug, Default)]
pub struct OptimisticMutator {
    pending: HashMap<PostId, PendingMutation>,
}

impl OptimisticMutator {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of unresolved mutations.
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Whether `post_id` has an unresolved mutation.
    pub fn is_pending(&self, post_id: &PostId) -> bool {
        self.pending.contains_key(post_id)
    }

    /// Flip the actor's like on `post_id` in the store and journal the undo.
    ///
    /// Returns `None` when the post is not in the loaded window (it may have
    /// scrolled out); stale targets are a no-op, not a fault.
    pub fn begin_toggle(
        &mut self,
        store: &mut FeedStore,
        actor: &ActorId,
        post_id: &PostId,
    ) -> Option<ToggleTicket> {
        let record = store.get(post_id)?;
        let current = PreviousLikeState {
            liked: record.liked_by_actor(actor),
            count: record.like_count(),
        };
        let now_liked = !current.liked;

        let entry = self
            .pending
            .entry(post_id.clone())
            .and_modify(|p| {
                // Coalesce: the user toggled again before the network
                // replied. Keep the original `previous`, bump the
                // generation so the earlier request's resolution is
                // discarded.
                p.generation += 1;
            })
            .or_insert_with(|| PendingMutation {
                target: post_id.clone(),
                intent: LikeIntent::Like,
                previous: current,
                issued_at: Instant::now(),
                generation: 0,
            });
        entry.intent = if now_liked {
            LikeIntent::Like
        } else {
            LikeIntent::Unlike
        };
        let ticket = ToggleTicket {
            target: post_id.clone(),
            intent: entry.intent,
            generation: entry.generation,
        };

        store.patch(post_id, |rec| {
            if now_liked {
                rec.liked_by.insert(actor.clone());
            } else {
                rec.liked_by.remove(actor);
            }
        });

        Some(ticket)
    }

    /// Confirm a toggle: drop its journal entry.
    ///
    /// Returns `false` when the resolution was stale (a newer coalesced
    /// toggle owns the entry) and was ignored.
    pub fn resolve_success(&mut self, ticket: &ToggleTicket) -> bool {
        match self.pending.get(&ticket.target) {
            Some(p) if p.generation == ticket.generation => {
                self.pending.remove(&ticket.target);
                true
            }
            _ => {
                tracing::debug!(target = %ticket.target, "stale toggle confirmation ignored");
                false
            }
        }
    }

    /// Roll back a failed toggle.
    ///
    /// Restores the actor's like-set membership to the journaled previous
    /// state rather than re-flipping, so intervening remote likes are not
    /// lost. Returns `false` when the resolution was stale.
    pub fn resolve_failure(
        &mut self,
        store: &mut FeedStore,
        actor: &ActorId,
        ticket: &ToggleTicket,
    ) -> bool {
        let stale = !matches!(
            self.pending.get(&ticket.target),
            Some(p) if p.generation == ticket.generation
        );
        if stale {
            tracing::debug!(target = %ticket.target, "stale toggle failure ignored");
            return false;
        }
        let Some(entry) = self.pending.remove(&ticket.target) else {
            return false;
        };
        Self::restore(store, actor, &entry);
        true
    }

    /// Roll back every unresolved mutation.
    ///
    /// Called on engine teardown so no journal entry survives unresolved.
    pub fn rollback_all(&mut self, store: &mut FeedStore, actor: &ActorId) {
        for entry in std::mem::take(&mut self.pending).into_values() {
            tracing::debug!(target = %entry.target, "rolling back unresolved mutation on teardown");
            Self::restore(store, actor, &entry);
        }
    }

    fn restore(store: &mut FeedStore, actor: &ActorId, entry: &PendingMutation) {
        let previously_liked = entry.previous.liked;
        store.patch(&entry.target, |rec| {
            if previously_liked {
                rec.liked_by.insert(actor.clone());
            } else {
                rec.liked_by.remove(actor);
            }
        });
    }
}
