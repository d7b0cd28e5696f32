//! Feed engine - the per-session reconciliation context
//!
//! One `FeedEngine` is constructed per session and passed to every
//! consumer; nothing about it is ambient or global. It owns the store, the
//! optimistic ledger, the reconciler, the pagination cursors, and the
//! new-items gate, and coordinates them around the suspension points of its
//! collaborators.
//!
//! All internal state lives behind one mutex that is never held across an
//! await, so every store mutation runs synchronously between suspension
//! points and no two mutations interleave mid-operation.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;

use murmur_core::{
    ActorId, ChannelStatus, EventEnvelope, FeedError, HistoryFetcher, MentionLookup,
    MutationSubmitter, PostId, PostRecord, Result,
};

use crate::config::FeedConfig;
use crate::gate::NewItemsGate;
use crate::mentions::MentionEnricher;
use crate::optimistic::{LikeIntent, OptimisticMutator};
use crate::pagination::{PageOutcome, PaginationController};
use crate::reconcile::{EventReconciler, Reconciliation};
use crate::signal::FeedSignal;
use crate::store::FeedStore;

const SIGNAL_CAPACITY: usize = 64;

struct EngineState {
    store: FeedStore,
    mutator: OptimisticMutator,
    reconciler: EventReconciler,
    gate: NewItemsGate,
    pagination: PaginationController,
    last_error: Option<FeedError>,
    connection: ChannelStatus,
    started: bool,
}

/// The feed reconciliation engine for one session.
pub struct FeedEngine {
    actor: ActorId,
    config: FeedConfig,
    fetcher: Arc<dyn HistoryFetcher>,
    submitter: Arc<dyn MutationSubmitter>,
    enricher: MentionEnricher,
    state: Mutex<EngineState>,
    signals: broadcast::Sender<FeedSignal>,
}

impl FeedEngine {
    /// Construct an engine for `actor` over the given collaborators.
    pub fn new(
        config: FeedConfig,
        actor: ActorId,
        fetcher: Arc<dyn HistoryFetcher>,
        submitter: Arc<dyn MutationSubmitter>,
        mentions: Arc<dyn MentionLookup>,
    ) -> Self {
        let (signals, _) = broadcast::channel(SIGNAL_CAPACITY);
        let state = EngineState {
            store: FeedStore::new(),
            mutator: OptimisticMutator::new(),
            reconciler: EventReconciler::new(actor.clone(), config.comment_dedup_capacity),
            gate: NewItemsGate::new(),
            pagination: PaginationController::new(config.page_size, config.newer_window),
            last_error: None,
            connection: ChannelStatus::Disconnected,
            started: false,
        };
        let enricher = MentionEnricher::new(mentions, config.mention_budget());
        Self {
            actor,
            config,
            fetcher,
            submitter,
            enricher,
            state: Mutex::new(state),
            signals,
        }
    }

    /// Subscribe to engine notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<FeedSignal> {
        self.signals.subscribe()
    }

    /// The session actor this engine reconciles for.
    pub fn actor(&self) -> &ActorId {
        &self.actor
    }

    /// Seed the window with the initial historical load.
    ///
    /// Idempotent: a second `start` on a running engine is a no-op.
    pub async fn start(&self) -> Result<()> {
        let ticket = {
            let mut state = self.state.lock();
            if state.started {
                return Ok(());
            }
            match state.pagination.begin_initial() {
                Some(ticket) => ticket,
                None => return Ok(()),
            }
        };

        let fetched = self.fetch_enriched(ticket.request.clone()).await;
        let mut state = self.state.lock();
        let (store, pagination) = state_store_pagination(&mut state);
        match pagination.finish_initial(store, &ticket, fetched) {
            Ok(PageOutcome::Applied(count)) => {
                state.started = true;
                state.last_error = None;
                drop(state);
                tracing::info!(count, "feed seeded");
                self.publish(FeedSignal::WindowChanged);
                Ok(())
            }
            Ok(PageOutcome::Superseded) => Ok(()),
            Err(err) => {
                state.last_error = Some(err.clone());
                drop(state);
                self.publish(FeedSignal::OperationFailed(err.clone()));
                Err(err)
            }
        }
    }

    /// Tear the session down, rolling back every unresolved optimistic
    /// mutation and discarding straggling pagination results.
    pub fn stop(&self) {
        let rolled_back = {
            let mut state = self.state.lock();
            let (store, mutator) = state_store_mutator(&mut state);
            let outstanding = mutator.outstanding();
            mutator.rollback_all(store, &self.actor);
            state.pagination.reset_inflight();
            state.started = false;
            outstanding
        };
        if rolled_back > 0 {
            tracing::info!(rolled_back, "rolled back unresolved mutations on stop");
            self.publish(FeedSignal::WindowChanged);
        }
    }

    /// Read-only ordered view of the current window.
    pub fn snapshot(&self) -> Vec<PostRecord> {
        self.state.lock().store.snapshot()
    }

    /// Number of announced-but-unmerged newer posts.
    pub fn pending_new_count(&self) -> usize {
        self.state.lock().gate.pending_new_count()
    }

    /// Whether the backend may hold records older than the loaded tail.
    pub fn has_more(&self) -> bool {
        self.state.lock().pagination.has_more()
    }

    /// Error from the most recent failed operation, retained until the next
    /// successful operation or explicit dismissal.
    pub fn last_error(&self) -> Option<FeedError> {
        self.state.lock().last_error.clone()
    }

    /// Dismiss the retained error.
    pub fn clear_error(&self) {
        self.state.lock().last_error = None;
    }

    /// Current realtime channel state as last reported by the transport.
    pub fn connection_status(&self) -> ChannelStatus {
        self.state.lock().connection
    }

    /// Append the next page of older posts to the window tail.
    ///
    /// Returns the number of appended records; `0` when the end of the
    /// stream was reached or a load is already in flight.
    pub async fn load_older(&self) -> Result<usize> {
        let ticket = {
            let mut state = self.state.lock();
            let tail = state.store.tail_cursor();
            match state.pagination.begin_older(tail) {
                Some(ticket) => ticket,
                None => return Ok(0),
            }
        };

        let fetched = self.fetch_enriched(ticket.request.clone()).await;
        let mut state = self.state.lock();
        let (store, pagination) = state_store_pagination(&mut state);
        match pagination.finish_older(store, &ticket, fetched) {
            Ok(PageOutcome::Applied(count)) => {
                state.last_error = None;
                drop(state);
                self.publish(FeedSignal::WindowChanged);
                Ok(count)
            }
            Ok(PageOutcome::Superseded) => Ok(0),
            Err(err) => {
                state.last_error = Some(err.clone());
                drop(state);
                self.publish(FeedSignal::OperationFailed(err.clone()));
                Err(err)
            }
        }
    }

    /// Merge announced newer posts into the visible window.
    ///
    /// Pull-only: nothing merges until this is called, so a scrolled-away
    /// reader is never disrupted (the caller decides when, e.g. the user is
    /// at the top of the view or clicked the indicator). Returns the number
    /// of genuinely-new records prepended.
    pub async fn merge_new_items(&self) -> Result<usize> {
        let ticket = {
            let mut state = self.state.lock();
            // The counter resets exactly when the merge is invoked
            state.gate.reset();
            match state.pagination.begin_newer() {
                Some(ticket) => ticket,
                None => return Ok(0),
            }
        };

        let fetched = self.fetch_enriched(ticket.request.clone()).await;
        let mut state = self.state.lock();
        let (store, pagination) = state_store_pagination(&mut state);
        match pagination.finish_newer(store, &ticket, fetched) {
            Ok(PageOutcome::Applied(count)) => {
                if let Some(cap) = self.config.window_cap {
                    state.store.evict_tail(cap);
                }
                state.last_error = None;
                drop(state);
                tracing::debug!(count, "merged new items");
                self.publish(FeedSignal::WindowChanged);
                Ok(count)
            }
            Ok(PageOutcome::Superseded) => Ok(0),
            Err(err) => {
                state.last_error = Some(err.clone());
                drop(state);
                self.publish(FeedSignal::OperationFailed(err.clone()));
                Err(err)
            }
        }
    }

    /// Toggle the session actor's like on a post.
    ///
    /// The flip is applied to the window immediately; on submission failure
    /// it is rolled back to the journaled previous state before the error
    /// surfaces, so no inconsistent intermediate state is ever observable.
    /// A post no longer in the window is a silent no-op.
    pub async fn toggle_like(&self, post_id: &PostId) -> Result<()> {
        let ticket = {
            let mut state = self.state.lock();
            let (store, mutator) = state_store_mutator(&mut state);
            match mutator.begin_toggle(store, &self.actor, post_id) {
                Some(ticket) => ticket,
                // Stale target: the record scrolled out of the window
                None => return Ok(()),
            }
        };
        self.publish(FeedSignal::WindowChanged);

        let submitted = match ticket.intent {
            LikeIntent::Like => self.submitter.like(post_id, &self.actor).await,
            LikeIntent::Unlike => self.submitter.unlike(post_id, &self.actor).await,
        };

        let mut state = self.state.lock();
        match submitted {
            Ok(()) => {
                state.mutator.resolve_success(&ticket);
                state.last_error = None;
                Ok(())
            }
            Err(err) => {
                let (store, mutator) = state_store_mutator(&mut state);
                let rolled_back = mutator.resolve_failure(store, &self.actor, &ticket);
                state.last_error = Some(err.clone());
                drop(state);
                if rolled_back {
                    self.publish(FeedSignal::WindowChanged);
                }
                self.publish(FeedSignal::OperationFailed(err.clone()));
                Err(err)
            }
        }
    }

    /// Create a new post.
    ///
    /// The post is not optimistically inserted; the server is authoritative
    /// for the generated id and content normalization. On success a bounded
    /// newer-merge surfaces the post without reloading the window.
    pub async fn create_post(&self, content: &str) -> Result<usize> {
        self.validate_content(content)?;
        if let Err(err) = self.submitter.create_post(content.trim()).await {
            self.record_failure(err.clone());
            return Err(err);
        }
        self.merge_new_items().await
    }

    /// Create a comment under a post.
    ///
    /// The local comment count is not bumped here; the server's
    /// `comment-created` event carries the authoritative comment id and the
    /// reconciler applies it exactly once.
    pub async fn create_comment(&self, post_id: &PostId, content: &str) -> Result<()> {
        self.validate_content(content)?;
        match self.submitter.create_comment(post_id, content.trim()).await {
            Ok(()) => {
                self.state.lock().last_error = None;
                Ok(())
            }
            Err(err) => {
                self.record_failure(err.clone());
                Err(err)
            }
        }
    }

    /// Feed one realtime envelope into reconciliation.
    pub fn handle_event(&self, envelope: &EventEnvelope) {
        let (outcome, pending) = {
            let mut state = self.state.lock();
            let EngineState {
                store,
                reconciler,
                gate,
                ..
            } = &mut *state;
            let outcome = reconciler.apply_envelope(store, gate, envelope);
            (outcome, state.gate.pending_new_count())
        };
        match outcome {
            Reconciliation::Applied => self.publish(FeedSignal::WindowChanged),
            Reconciliation::Announced => {
                self.publish(FeedSignal::NewItemsAvailable { count: pending });
            }
            Reconciliation::EchoSuppressed
            | Reconciliation::Duplicate
            | Reconciliation::Dropped
            | Reconciliation::Unloaded => {}
        }
    }

    /// Record a connection-state change reported by the transport.
    pub fn connection_changed(&self, status: ChannelStatus) {
        let changed = {
            let mut state = self.state.lock();
            let changed = state.connection != status;
            state.connection = status;
            changed
        };
        if changed {
            tracing::debug!(?status, "realtime channel state changed");
            self.publish(FeedSignal::ConnectionChanged(status));
        }
    }

    async fn fetch_enriched(
        &self,
        request: murmur_core::PageRequest,
    ) -> Result<Vec<PostRecord>> {
        let page = self.fetcher.fetch_page(request).await?;
        Ok(self.enricher.enrich(page).await)
    }

    fn validate_content(&self, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            let err = FeedError::validation("content must not be empty");
            self.record_failure(err.clone());
            return Err(err);
        }
        Ok(())
    }

    fn record_failure(&self, err: FeedError) {
        self.state.lock().last_error = Some(err.clone());
        self.publish(FeedSignal::OperationFailed(err));
    }

    fn publish(&self, signal: FeedSignal) {
        // No subscribers is fine
        let _ = self.signals.send(signal);
    }
}

// Split borrows of EngineState fields so components can be driven together
// without tripping the borrow checker on the mutex guard.

fn state_store_mutator(state: &mut EngineState) -> (&mut FeedStore, &mut OptimisticMutator) {
    (&mut state.store, &mut state.mutator)
}

fn state_store_pagination(state: &mut EngineState) -> (&mut FeedStore, &mut PaginationController) {
    (&mut state.store, &mut state.pagination)
}
