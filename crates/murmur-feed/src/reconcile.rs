//! Real-time event reconciliation
//!
//! Applies idempotent deltas from the realtime channel to the store, in
//! arrival order with no re-ordering buffer. Every operation is a
//! commutative set operation (add/remove on the like set, increment with
//! comment-id dedup), so final state is order-independent even when two
//! events for the same target arrive out of causal order.
//!
//! Events caused by the session actor are echoes of actions this session
//! already applied optimistically and are suppressed here; the optimistic
//! ledger owns those state transitions.

use std::collections::{HashSet, VecDeque};

use murmur_core::{ActorId, CommentId, EventEnvelope, FeedEvent};

use crate::gate::NewItemsGate;
use crate::store::FeedStore;

/// What the reconciler did with one envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    /// A store delta was applied
    Applied,
    /// A new post was announced to the gate
    Announced,
    /// The event was the server's echo of this session's own action
    EchoSuppressed,
    /// Duplicate delivery, already seen
    Duplicate,
    /// Malformed or unknown envelope, dropped
    Dropped,
    /// Target post not in the loaded window
    Unloaded,
}

/// Consumes realtime events and applies idempotent deltas to the store.
#[derive(Debug)]
pub struct EventReconciler {
    /// The session actor, for echo suppression
    actor: ActorId,
    /// Recently-seen comment ids, bounded FIFO for at-least-once transports
    seen_comments: HashSet<CommentId>,
    seen_order: VecDeque<CommentId>,
    dedup_capacity: usize,
}

impl EventReconciler {
    /// Create a reconciler for the given session actor.
    pub fn new(actor: ActorId, dedup_capacity: usize) -> Self {
        Self {
            actor,
            seen_comments: HashSet::new(),
            seen_order: VecDeque::new(),
            dedup_capacity: dedup_capacity.max(1),
        }
    }

    /// Decode and apply one wire envelope.
    ///
    /// Malformed envelopes are dropped and logged; they never surface as
    /// errors to the caller.
    pub fn apply_envelope(
        &mut self,
        store: &mut FeedStore,
        gate: &mut NewItemsGate,
        envelope: &EventEnvelope,
    ) -> Reconciliation {
        match envelope.decode() {
            Some(event) => self.apply(store, gate, event),
            None => {
                tracing::warn!(kind = %envelope.kind, "dropping malformed realtime event");
                Reconciliation::Dropped
            }
        }
    }

    /// Apply one decoded event.
    pub fn apply(
        &mut self,
        store: &mut FeedStore,
        gate: &mut NewItemsGate,
        event: FeedEvent,
    ) -> Reconciliation {
        match event {
            FeedEvent::LikeCreated { post_id, actor } => {
                if actor == self.actor {
                    return Reconciliation::EchoSuppressed;
                }
                let patched = store.patch(&post_id, |rec| {
                    rec.liked_by.insert(actor.clone());
                });
                if patched {
                    Reconciliation::Applied
                } else {
                    Reconciliation::Unloaded
                }
            }
            FeedEvent::LikeDeleted { post_id, actor } => {
                if actor == self.actor {
                    return Reconciliation::EchoSuppressed;
                }
                let patched = store.patch(&post_id, |rec| {
                    rec.liked_by.remove(&actor);
                });
                if patched {
                    Reconciliation::Applied
                } else {
                    Reconciliation::Unloaded
                }
            }
            FeedEvent::CommentCreated {
                post_id,
                comment_id,
            } => {
                if !self.first_sighting(comment_id) {
                    return Reconciliation::Duplicate;
                }
                let patched = store.patch(&post_id, |rec| {
                    rec.comment_count += 1;
                });
                if patched {
                    Reconciliation::Applied
                } else {
                    Reconciliation::Unloaded
                }
            }
            FeedEvent::PostCreated { post_id, actor } => {
                if actor == self.actor {
                    // Own posts surface through the creation flow
                    return Reconciliation::EchoSuppressed;
                }
                if store.contains(&post_id) {
                    return Reconciliation::Duplicate;
                }
                gate.note_post_created();
                Reconciliation::Announced
            }
        }
    }

    /// Record a comment id; returns whether this was its first delivery.
    fn first_sighting(&mut self, comment_id: CommentId) -> bool {
        if self.seen_comments.contains(&comment_id) {
            return false;
        }
        if self.seen_order.len() == self.dedup_capacity {
            if let Some(evicted) = self.seen_order.pop_front() {
                self.seen_comments.remove(&evicted);
            }
        }
        self.seen_order.push_back(comment_id.clone());
        self.seen_comments.insert(comment_id);
        true
    }
}
