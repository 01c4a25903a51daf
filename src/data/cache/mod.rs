//! Client-side page merge/dedup cache
//!
//! Accumulates paginated span fetches into one deduplicated collection in
//! start-time-descending order (most recent first) — the single
//! authoritative order for display and for re-feeding the hierarchy builder
//! per trace group.
//!
//! The host event loop owns one [`PageCache`] per active view. Fetches are
//! stamped with the filter generation current when they were issued; a
//! filter change resets the cache and bumps the generation, so completions
//! from the old filter are detected and dropped instead of merged.
//! Pagination is serialized through [`FetchTicket`]: a new page may only be
//! requested once the outstanding one has completed.

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::data::types::Span;

// ============================================================================
// MERGE
// ============================================================================

/// Merge an incoming batch into an existing collection.
///
/// Duplicates (by span id) keep the first occurrence — an incoming duplicate
/// of an already-cached span is discarded, not overwritten, to avoid UI
/// flicker on re-render. The result is re-sorted by start time descending
/// with a stable sort.
///
/// Idempotent: `merge(x, [])` == `x`, and re-merging the same batch changes
/// nothing.
pub fn merge(existing: Vec<Span>, incoming: Vec<Span>) -> Vec<Span> {
    let mut seen: FxHashSet<String> = FxHashSet::default();
    let mut merged: Vec<Span> = Vec::with_capacity(existing.len() + incoming.len());

    for span in existing.into_iter().chain(incoming) {
        if seen.insert(span.id.clone()) {
            merged.push(span);
        }
    }

    merged.sort_by(|a, b| b.start_time.cmp(&a.start_time));
    merged
}

// ============================================================================
// PAGE CACHE
// ============================================================================

/// Cache lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheState {
    /// No spans held (initial, or just reset by a filter change)
    Empty,
    /// At least one page has been merged
    Populated,
}

/// Proof that a page fetch was issued against a specific filter generation.
/// Returned by [`PageCache::begin_fetch`] and redeemed on completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    page: u32,
}

impl FetchTicket {
    pub fn page(&self) -> u32 {
        self.page
    }
}

/// Owned, re-sorted collection of spans accumulated across paginated
/// fetches. Single logical writer; hosts sharing it across threads wrap the
/// merge step in a mutex.
#[derive(Debug, Default, Serialize)]
pub struct PageCache {
    spans: Vec<Span>,
    /// Filter generation; bumped on every reset
    generation: u64,
    /// Page number of the outstanding fetch, if any
    #[serde(skip)]
    in_flight: Option<u32>,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the merged collection, start-time descending
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    pub fn state(&self) -> CacheState {
        if self.spans.is_empty() {
            CacheState::Empty
        } else {
            CacheState::Populated
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Reset for a filter change: drop all spans, abandon any outstanding
    /// fetch, and bump the generation so late completions are detectable.
    pub fn reset(&mut self) {
        self.spans.clear();
        self.in_flight = None;
        self.generation += 1;
    }

    /// Register an outgoing page fetch. Returns `None` while another fetch
    /// is outstanding — pagination is serialized, so the caller must wait
    /// for the prior page to resolve before requesting the next.
    pub fn begin_fetch(&mut self, page: u32) -> Option<FetchTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        self.in_flight = Some(page);
        Some(FetchTicket {
            generation: self.generation,
            page,
        })
    }

    /// Complete a fetch: merge the batch if the ticket's generation is still
    /// current, otherwise drop it. Returns whether the batch was merged.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, incoming: Vec<Span>) -> bool {
        if ticket.generation != self.generation {
            tracing::trace!(
                page = ticket.page,
                stale = ticket.generation,
                current = self.generation,
                "Dropping stale fetch result"
            );
            return false;
        }

        self.in_flight = None;
        self.spans = merge(std::mem::take(&mut self.spans), incoming);
        true
    }
}
