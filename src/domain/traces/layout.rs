//! Timeline layout (Stage 3)
//!
//! Maps every span of a forest onto one shared horizontal axis: offsets and
//! lengths are proportional to wall-clock time, scaled into the fixed
//! `LAYOUT_WIDTH` coordinate system. The total duration is computed once
//! across the whole trace (not per subtree) so siblings and cousins are
//! directly comparable.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::core::constants::{LAYOUT_WIDTH, MIN_SPAN_LENGTH};

use super::hierarchy::TraceForest;

/// Horizontal placement of one span, in layout units
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpanLayout {
    pub offset: f64,
    pub length: f64,
}

/// Compute per-span placements for a forest, keyed by span id.
///
/// Zero-length spans get a `MIN_SPAN_LENGTH` floor so they stay visible and
/// clickable; a trace whose spans all share one instant collapses to floored
/// spans at offset zero.
pub fn layout(forest: &TraceForest) -> FxHashMap<String, SpanLayout> {
    layout_with_width(forest, LAYOUT_WIDTH)
}

/// Same as [`layout`] with an explicit coordinate width.
pub fn layout_with_width(forest: &TraceForest, width: f64) -> FxHashMap<String, SpanLayout> {
    let mut slots = FxHashMap::default();
    let Some(trace_start) = forest.spans().iter().map(|s| s.start_time).min() else {
        return slots;
    };
    let Some(trace_end) = forest.spans().iter().map(|s| s.end_time).max() else {
        return slots;
    };

    let total_micros = (trace_end - trace_start).num_microseconds().unwrap_or(i64::MAX);
    let scale = if total_micros > 0 {
        width / total_micros as f64
    } else {
        0.0
    };

    for span in forest.spans() {
        let start_micros = (span.start_time - trace_start)
            .num_microseconds()
            .unwrap_or(i64::MAX);
        let dur_micros = span.duration().num_microseconds().unwrap_or(i64::MAX);

        let offset = start_micros as f64 * scale;
        let length = (dur_micros as f64 * scale).max(MIN_SPAN_LENGTH);

        slots.insert(span.id.clone(), SpanLayout { offset, length });
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{Span, SpanAttributes, SpanStatus};
    use chrono::DateTime;

    fn span(id: &str, start_ms: i64, end_ms: i64) -> Span {
        Span {
            id: id.to_string(),
            name: format!("op.{id}"),
            trace_id: None,
            start_time: DateTime::from_timestamp_millis(start_ms).unwrap(),
            end_time: DateTime::from_timestamp_millis(end_ms).unwrap(),
            status: SpanStatus::Unset,
            attributes: SpanAttributes::default(),
        }
    }

    #[test]
    fn test_proportional_layout() {
        // Trace spans [0, 100]ms; B sits in the middle half
        let forest = TraceForest::build(vec![span("A", 0, 100), span("B", 25, 75)]);
        let slots = layout_with_width(&forest, 1000.0);

        let a = &slots["A"];
        let b = &slots["B"];
        assert_eq!(a.offset, 0.0);
        assert_eq!(a.length, 1000.0);
        assert_eq!(b.offset, 250.0);
        assert_eq!(b.length, 500.0);
    }

    #[test]
    fn test_default_width_constant() {
        let forest = TraceForest::build(vec![span("A", 0, 100)]);
        let slots = layout(&forest);
        assert_eq!(slots["A"].length, LAYOUT_WIDTH);
    }

    #[test]
    fn test_zero_length_span_gets_floor() {
        let forest = TraceForest::build(vec![span("A", 0, 100), span("P", 40, 40)]);
        let slots = layout_with_width(&forest, 1000.0);

        assert_eq!(slots["P"].length, MIN_SPAN_LENGTH);
        assert_eq!(slots["P"].offset, 400.0);
    }

    #[test]
    fn test_zero_duration_trace() {
        // Every span at the same instant: offsets collapse to zero, lengths
        // keep the visibility floor
        let forest = TraceForest::build(vec![span("A", 50, 50), span("B", 50, 50)]);
        let slots = layout_with_width(&forest, 1000.0);

        for slot in slots.values() {
            assert_eq!(slot.offset, 0.0);
            assert_eq!(slot.length, MIN_SPAN_LENGTH);
        }
    }

    #[test]
    fn test_offset_monotonic_in_start_time() {
        let forest = TraceForest::build(vec![
            span("A", 0, 300),
            span("B", 10, 50),
            span("C", 40, 200),
            span("D", 250, 300),
        ]);
        let slots = layout_with_width(&forest, 1000.0);

        let mut ordered: Vec<&Span> = forest.spans().iter().collect();
        ordered.sort_by_key(|s| s.start_time);
        for pair in ordered.windows(2) {
            assert!(slots[&pair[0].id].offset <= slots[&pair[1].id].offset);
        }
    }

    #[test]
    fn test_empty_forest() {
        let forest = TraceForest::build(Vec::new());
        assert!(layout(&forest).is_empty());
    }
}
