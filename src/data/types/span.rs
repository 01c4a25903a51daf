//! Normalized span model
//!
//! The in-memory form of a span after timestamp parsing and attribute
//! extraction. This is what the hierarchy builder, timeline mapper, cost
//! aggregator, and page cache all operate on; the raw attribute string is
//! parsed exactly once upstream and never re-parsed here.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

use super::SpanStatus;

// ============================================================================
// SPAN
// ============================================================================

/// One recorded timed operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Span {
    pub id: String,
    pub name: String,
    pub trace_id: Option<String>,
    /// Invariant: `start_time <= end_time` (enforced during normalization)
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub status: SpanStatus,
    pub attributes: SpanAttributes,
}

impl Span {
    pub fn duration(&self) -> Duration {
        self.end_time - self.start_time
    }
}

// ============================================================================
// TYPED ATTRIBUTES
// ============================================================================

/// Attributes consumed by the assembly core, extracted once from the raw
/// JSON bag. Keys the core does not recognize land in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SpanAttributes {
    /// LLM/VectorDB/framework provider identifier (e.g. "openai")
    pub vendor: Option<String>,
    /// Model identifier as reported by the producer
    pub model: Option<String>,
    /// Token usage in whichever of its two historical shapes was present
    pub usage: TokenUsage,
    /// Truncated prompt preview
    pub input_content: Option<String>,
    /// Truncated response preview
    pub output_content: Option<String>,
    /// Unrecognized attributes, preserved for the detail view
    pub extra: Map<String, JsonValue>,
}

/// Token usage attributes appear in two historical shapes: a combined usage
/// object (one JSON value holding all counters) and discrete per-counter
/// attributes. The shape is kept so consumers can tell them apart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum TokenUsage {
    /// Combined usage object, e.g. `gen_ai.usage = {"input_tokens": ...}`
    Combined { input: i64, output: i64, total: i64 },
    /// Discrete counter attributes, e.g. `gen_ai.usage.input_tokens`
    Counters { input: i64, output: i64 },
    /// No usage attributes on this span (non-LLM operation)
    #[default]
    Absent,
}

impl TokenUsage {
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn input_tokens(&self) -> i64 {
        match *self {
            Self::Combined { input, .. } | Self::Counters { input, .. } => input,
            Self::Absent => 0,
        }
    }

    pub fn output_tokens(&self) -> i64 {
        match *self {
            Self::Combined { output, .. } | Self::Counters { output, .. } => output,
            Self::Absent => 0,
        }
    }

    pub fn total_tokens(&self) -> i64 {
        match *self {
            Self::Combined { total, .. } => total,
            Self::Counters { input, output } => input + output,
            Self::Absent => 0,
        }
    }
}
