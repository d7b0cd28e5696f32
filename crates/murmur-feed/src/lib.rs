//! Murmur Feed - Feed reconciliation engine
//!
//! Keeps a locally held, ordered view of posts consistent across three
//! concurrent input streams: paginated historical loads, optimistic local
//! mutations by the session actor, and realtime events describing other
//! actors' mutations.
//!
//! # Architecture
//!
//! - [`store::FeedStore`] - ordered window of posts, single source of truth
//! - [`optimistic::OptimisticMutator`] - apply-now/journal-undo mutations
//! - [`reconcile::EventReconciler`] - idempotent deltas from realtime events
//! - [`pagination::PaginationController`] - older/newer cursors and loads
//! - [`gate::NewItemsGate`] - explicit, pull-only merge of newer posts
//! - [`mentions::MentionEnricher`] - bounded best-effort metadata decoration
//! - [`engine::FeedEngine`] - the per-session context wiring it all together
//!
//! # Example
//!
//! ```ignore
//! use murmur_feed::{FeedConfig, FeedEngine};
//!
//! let engine = FeedEngine::new(FeedConfig::default(), actor, fetcher, submitter, mentions);
//! engine.start().await?;
//! let posts = engine.snapshot();
//! engine.toggle_like(&posts[0].id).await?;
//! ```

pub mod config;
pub mod engine;
pub mod gate;
pub mod mentions;
pub mod optimistic;
pub mod pagination;
pub mod reconcile;
pub mod signal;
pub mod store;

pub use config::FeedConfig;
pub use engine::FeedEngine;
pub use gate::NewItemsGate;
pub use mentions::MentionEnricher;
pub use optimistic::{LikeIntent, OptimisticMutator, PendingMutation, ToggleTicket};
pub use pagination::{Direction, LoadTicket, PageOutcome, PaginationController};
pub use reconcile::{EventReconciler, Reconciliation};
pub use signal::FeedSignal;
pub use store::FeedStore;
