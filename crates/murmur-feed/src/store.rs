//! Feed store - the ordered window of loaded posts
//!
//! Single source of truth for what the UI renders. The window is kept
//! strictly decreasing by `(created_at_ms, id)` with no duplicate ids (I1).
//! The head marker only advances through [`FeedStore::seed`] and
//! [`FeedStore::prepend_merge`]; background reconciliation never moves it,
//! so the visible list cannot shift under a reading user.

use std::collections::HashMap;

use murmur_core::{PostId, PostRecord};

/// Ordered collection of post records keyed by identity.
#[derive(Debug, Default)]
pub struct FeedStore {
    /// Window contents, newest first
    posts: Vec<PostRecord>,
    /// Position of each id in `posts`, rebuilt on structural change
    index: HashMap<PostId, usize>,
    /// Newest record currently merged into the visible window
    head: Option<PostId>,
}

impl FeedStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of posts in the window.
    pub fn len(&self) -> usize {
        self.posts.len()
    }

    /// Whether the window is empty.
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    /// Whether the window currently holds `id`.
    pub fn contains(&self, id: &PostId) -> bool {
        self.index.contains_key(id)
    }

    /// Clone of one record, if loaded.
    pub fn get(&self, id: &PostId) -> Option<PostRecord> {
        self.index.get(id).map(|&i| self.posts[i].clone())
    }

    /// Id of the oldest loaded record, the cursor for "load older".
    pub fn tail_cursor(&self) -> Option<PostId> {
        self.posts.last().map(|p| p.id.clone())
    }

    /// Id of the newest record merged into the visible window.
    pub fn head_id(&self) -> Option<PostId> {
        self.head.clone()
    }

    /// Read-only view of the current window for rendering.
    ///
    /// Returns an owned clone; callers can never reach the store's internal
    /// state through it, so invariants cannot be bypassed from outside.
    pub fn snapshot(&self) -> Vec<PostRecord> {
        self.posts.clone()
    }

    /// Merge records into the window by id, preserving sort order and
    /// uniqueness.
    ///
    /// For an id already present the incoming record wins, except that an
    /// existing mention enrichment survives an incoming record that has
    /// none. The head marker is not touched.
    pub fn upsert_many(&mut self, records: Vec<PostRecord>) {
        for mut incoming in records {
            match self.index.get(&incoming.id) {
                Some(&i) => {
                    if incoming.mentions.is_none() {
                        incoming.mentions = self.posts[i].mentions.take();
                    }
                    self.posts[i] = incoming;
                }
                None => {
                    // Record the position immediately so a duplicate id later
                    // in the same batch merges instead of duplicating.
                    self.index.insert(incoming.id.clone(), self.posts.len());
                    self.posts.push(incoming);
                }
            }
        }
        self.restore_order();
    }

    /// Seed the window from the initial historical load and set the head.
    pub fn seed(&mut self, records: Vec<PostRecord>) {
        self.upsert_many(records);
        self.head = self.posts.first().map(|p| p.id.clone());
    }

    /// Merge genuinely-new records at the head of the window, advancing the
    /// head marker. Returns how many records were actually new.
    ///
    /// This is the only merge entry point that advances the head; it is
    /// driven by the new-items gate, never by background events (I3).
    pub fn prepend_merge(&mut self, records: Vec<PostRecord>) -> usize {
        let mut seen = std::collections::HashSet::new();
        let fresh: Vec<PostRecord> = records
            .into_iter()
            .filter(|r| !self.index.contains_key(&r.id) && seen.insert(r.id.clone()))
            .collect();
        let count = fresh.len();
        if count > 0 {
            self.upsert_many(fresh);
        }
        self.head = self.posts.first().map(|p| p.id.clone());
        count
    }

    /// Apply a transformation to one record's mutable fields.
    ///
    /// An unknown id is a silent no-op (the record may have scrolled out of
    /// the loaded window), never an error. Returns whether a record was
    /// patched.
    pub fn patch<F>(&mut self, id: &PostId, f: F) -> bool
    where
        F: FnOnce(&mut PostRecord),
    {
        match self.index.get(id) {
            Some(&i) => {
                f(&mut self.posts[i]);
                true
            }
            None => false,
        }
    }

    /// Drop the oldest records beyond `cap`.
    ///
    /// Explicit eviction policy hook; nothing in the engine calls this on
    /// its own unless a window cap is configured.
    pub fn evict_tail(&mut self, cap: usize) {
        if self.posts.len() > cap {
            self.posts.truncate(cap);
            self.rebuild_index();
        }
    }

    fn restore_order(&mut self) {
        self.posts
            .sort_by(|a, b| b.window_key().cmp(&a.window_key()));
        self.posts.dedup_by(|a, b| a.id == b.id);
        self.rebuild_index();
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .posts
            .iter()
            .enumerate()
            .map(|(i, p)| (p.id.clone(), i))
            .collect();
    }
}
