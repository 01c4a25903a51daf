//! Trace assembly core for the TraceDeck LLM telemetry dashboard.
//!
//! This crate is the in-memory transform layer between the dashboard's
//! data-fetch boundary and its rendering boundary:
//!
//! - `domain::traces::normalize` - raw span records → normalized [`Span`]s
//! - `domain::traces::hierarchy` - interval-containment forest per trace
//! - `domain::traces::layout` - proportional timeline coordinates
//! - `domain::pricing` - token usage → monetary cost
//! - `data::cache` - merge/dedup of paginated fetches
//!
//! All computations are pure and synchronous; the crate owns no network or
//! file I/O. Malformed telemetry (bad timestamps, bad attribute JSON,
//! missing token counts) is recovered locally with safe defaults and never
//! aborts a batch.

pub mod core;
pub mod data;
pub mod domain;
pub mod utils;

pub use data::cache::{CacheState, FetchTicket, PageCache, merge};
pub use data::types::{
    FetchPage, PageMetadata, RawSpan, Span, SpanAttributes, SpanStatus, TokenUsage,
};
pub use domain::pricing::{
    CostBreakdown, MatchType, PricingEntry, PricingError, PricingTable, SpanCost, TraceCost,
    aggregate, span_cost,
};
pub use domain::traces::group_by_trace;
pub use domain::traces::hierarchy::TraceForest;
pub use domain::traces::layout::{SpanLayout, layout};
pub use domain::traces::normalize::{normalize, normalize_page};
