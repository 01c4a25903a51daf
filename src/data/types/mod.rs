//! Data models for trace assembly
//!
//! `raw` holds the fetch-boundary payload shapes exactly as the data API
//! delivers them; `span` holds the normalized in-memory form everything
//! downstream (hierarchy, layout, cost) operates on.

mod enums;
mod raw;
mod span;

pub use enums::SpanStatus;
pub use raw::{FetchPage, PageMetadata, RawSpan};
pub use span::{Span, SpanAttributes, TokenUsage};
