//! Mention enrichment
//!
//! Best-effort decorator that race-attaches mention metadata to a batch of
//! posts within a fixed time budget. Whichever lookups have resolved when
//! the budget expires are attached; the rest of the batch passes through
//! unenriched. A single failed lookup never fails the batch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use murmur_core::{MentionLookup, PostRecord};

/// Attaches mentions to post batches within a bounded time budget.
pub struct MentionEnricher {
    lookup: Arc<dyn MentionLookup>,
    budget: Duration,
}

impl MentionEnricher {
    /// Create an enricher over the given lookup collaborator.
    pub fn new(lookup: Arc<dyn MentionLookup>, budget: Duration) -> Self {
        Self { lookup, budget }
    }

    /// Enrich a batch of posts.
    ///
    /// Fires one independent lookup per post that does not already carry
    /// mentions, and races the batch against the budget. Order and length
    /// of the batch are preserved.
    pub async fn enrich(&self, mut posts: Vec<PostRecord>) -> Vec<PostRecord> {
        let mut lookups: FuturesUnordered<_> = posts
            .iter()
            .filter(|p| p.mentions.is_none())
            .map(|p| {
                let lookup = Arc::clone(&self.lookup);
                let id = p.id.clone();
                async move {
                    let result = lookup.fetch_mentions(&id).await;
                    (id, result)
                }
            })
            .collect();

        if lookups.is_empty() {
            return posts;
        }

        let mut resolved = HashMap::new();
        let deadline = tokio::time::sleep(self.budget);
        tokio::pin!(deadline);
        loop {
            tokio::select! {
                () = &mut deadline => {
                    tracing::debug!(
                        unresolved = lookups.len(),
                        "mention budget expired, returning batch partially enriched"
                    );
                    break;
                }
                next = lookups.next() => match next {
                    Some((id, Ok(mentions))) => {
                        resolved.insert(id, mentions);
                    }
                    Some((id, Err(err))) => {
                        // Failure of one lookup means "no mentions for this post"
                        tracing::debug!(post = %id, %err, "mention lookup failed");
                    }
                    None => break,
                },
            }
        }

        for post in &mut posts {
            if let Some(mentions) = resolved.remove(&post.id) {
                post.mentions = Some(mentions);
            }
        }
        posts
    }
}
