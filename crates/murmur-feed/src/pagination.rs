//! Pagination control
//!
//! Manages the "older" (append) and "newer" (prepend-candidate) cursors.
//! Loads are direction-exclusive: a request while one is already in flight
//! for the same direction is ignored, not queued. Superseded requests are
//! not cancelled at the transport level; their results are discarded by a
//! monotonic per-direction generation token. Failed fetches mutate nothing,
//! so retry always starts from a consistent state.

use murmur_core::{PageRequest, PostRecord, Result};

use crate::store::FeedStore;

/// Load direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// First fill of an empty window
    Initial,
    /// Append past the tail cursor
    Older,
    /// Bounded recent window for the new-items merge
    Newer,
}

/// Handle for one issued load, consumed by the matching `finish_*` call.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    /// Direction this load was issued for
    pub direction: Direction,
    /// The page request to hand to the fetcher
    pub request: PageRequest,
    generation: u64,
}

/// How a completed page was disposed of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    /// The page was merged; holds the number of records that were new
    Applied(usize),
    /// A newer request for the same direction started since; page discarded
    Superseded,
}

/// Cursor and in-flight state for historical loads.
#[derive(Debug)]
pub struct PaginationController {
    page_size: usize,
    newer_window: usize,
    has_more: bool,
    loading: [bool; 3],
    generation: [u64; 3],
}

impl PaginationController {
    /// Create a controller for the given page sizes.
    pub fn new(page_size: usize, newer_window: usize) -> Self {
        Self {
            page_size,
            newer_window,
            has_more: true,
            loading: [false; 3],
            generation: [0; 3],
        }
    }

    /// Whether the backend may still hold records older than the tail.
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether a load is in flight for `direction`.
    pub fn is_loading(&self, direction: Direction) -> bool {
        self.loading[Self::slot(direction)]
    }

    /// Issue the initial load. `None` when one is already in flight.
    pub fn begin_initial(&mut self) -> Option<LoadTicket> {
        self.begin(Direction::Initial, PageRequest::newest(self.page_size))
    }

    /// Issue an older-direction load past the current tail.
    ///
    /// `None` when a load is already in flight, when the end of the stream
    /// was reached, or when the window is empty (use the initial load).
    pub fn begin_older(&mut self, tail: Option<murmur_core::PostId>) -> Option<LoadTicket> {
        if !self.has_more {
            return None;
        }
        let cursor = tail?;
        self.begin(
            Direction::Older,
            PageRequest::older_than(cursor, self.page_size),
        )
    }

    /// Issue a newer-direction load of the bounded recent window.
    pub fn begin_newer(&mut self) -> Option<LoadTicket> {
        self.begin(Direction::Newer, PageRequest::newest(self.newer_window))
    }

    /// Complete the initial load, seeding the window and the head marker.
    pub fn finish_initial(
        &mut self,
        store: &mut FeedStore,
        ticket: &LoadTicket,
        result: Result<Vec<PostRecord>>,
    ) -> Result<PageOutcome> {
        let Some(page) = self.take_page(ticket, result)? else {
            return Ok(PageOutcome::Superseded);
        };
        if page.len() < ticket.request.limit {
            self.has_more = false;
        }
        let count = page.len();
        store.seed(page);
        Ok(PageOutcome::Applied(count))
    }

    /// Complete an older-direction load, appending past the tail.
    ///
    /// A page shorter than requested is the end-of-stream signal; no
    /// explicit total count is trusted.
    pub fn finish_older(
        &mut self,
        store: &mut FeedStore,
        ticket: &LoadTicket,
        result: Result<Vec<PostRecord>>,
    ) -> Result<PageOutcome> {
        let Some(page) = self.take_page(ticket, result)? else {
            return Ok(PageOutcome::Superseded);
        };
        if page.len() < ticket.request.limit {
            self.has_more = false;
        }
        let count = page.len();
        store.upsert_many(page);
        Ok(PageOutcome::Applied(count))
    }

    /// Complete a newer-direction load.
    ///
    /// The fetched window is a "most recent N" approximation, not a true
    /// delta since the head: the page is diffed locally against the loaded
    /// window and only the genuinely-new prefix is merged. If more than N
    /// posts arrived since the last sync the oldest of them are silently
    /// missed.
    pub fn finish_newer(
        &mut self,
        store: &mut FeedStore,
        ticket: &LoadTicket,
        result: Result<Vec<PostRecord>>,
    ) -> Result<PageOutcome> {
        let Some(page) = self.take_page(ticket, result)? else {
            return Ok(PageOutcome::Superseded);
        };
        Ok(PageOutcome::Applied(store.prepend_merge(page)))
    }

    fn begin(&mut self, direction: Direction, request: PageRequest) -> Option<LoadTicket> {
        let slot = Self::slot(direction);
        if self.loading[slot] {
            tracing::debug!(?direction, "load already in flight, ignoring request");
            return None;
        }
        self.loading[slot] = true;
        self.generation[slot] += 1;
        Some(LoadTicket {
            direction,
            request,
            generation: self.generation[slot],
        })
    }

    /// Claim a completed page. `Ok(None)` means the ticket was superseded
    /// and the page must be discarded.
    fn take_page(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Vec<PostRecord>>,
    ) -> Result<Option<Vec<PostRecord>>> {
        let slot = Self::slot(ticket.direction);
        if self.generation[slot] != ticket.generation {
            tracing::debug!(direction = ?ticket.direction, "discarding superseded page");
            return Ok(None);
        }
        self.loading[slot] = false;
        // Failure mutates neither window nor cursors
        Ok(Some(result?))
    }

    /// Forget in-flight state so any straggling results are discarded.
    pub fn reset_inflight(&mut self) {
        for slot in 0..self.loading.len() {
            if self.loading[slot] {
                self.generation[slot] += 1;
                self.loading[slot] = false;
            }
        }
    }

    fn slot(direction: Direction) -> usize {
        match direction {
            Direction::Initial => 0,
            Direction::Older => 1,
            Direction::Newer => 2,
        }
    }
}
