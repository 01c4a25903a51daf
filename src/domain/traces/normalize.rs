//! Span normalization (Stage 1)
//!
//! Converts fetch-boundary [`RawSpan`] records into normalized [`Span`]s.
//! Normalization never fails: timestamps fall through a lenient format
//! chain, a malformed attribute bag yields empty attributes, and spans whose
//! end precedes their start are clamped to zero length at the start. A
//! single malformed record must not blank out a whole page.

use serde_json::Value as JsonValue;

use crate::data::types::{FetchPage, RawSpan, Span, SpanAttributes, SpanStatus};
use crate::utils::time::parse_timestamp;

use super::extract::extract_attributes;

/// Normalize one raw span record. Pure transform; never fails.
pub fn normalize(raw: &RawSpan) -> Span {
    let start_time = parse_timestamp(&raw.start_time);
    let mut end_time = parse_timestamp(&raw.end_time);

    if end_time < start_time {
        tracing::warn!(
            span_id = %raw.id,
            "Span ends before it starts, clamping to zero length"
        );
        end_time = start_time;
    }

    Span {
        id: raw.id.clone(),
        name: raw.name.clone(),
        trace_id: raw.trace_id.clone(),
        start_time,
        end_time,
        status: SpanStatus::from_code(&raw.status_code),
        attributes: parse_attribute_bag(raw),
    }
}

/// Normalize every span in a fetched page.
pub fn normalize_page(page: &FetchPage) -> Vec<Span> {
    page.result.iter().map(normalize).collect()
}

/// Parse the JSON-encoded attribute bag and extract typed attributes.
/// Malformed or absent JSON yields empty attributes, never an error.
fn parse_attribute_bag(raw: &RawSpan) -> SpanAttributes {
    let trimmed = raw.attributes.trim();
    if trimmed.is_empty() {
        return SpanAttributes::default();
    }

    match serde_json::from_str::<JsonValue>(trimmed) {
        Ok(JsonValue::Object(map)) => extract_attributes(&map),
        Ok(_) => {
            tracing::warn!(span_id = %raw.id, "Attribute bag is not a JSON object, ignoring");
            SpanAttributes::default()
        }
        Err(error) => {
            tracing::warn!(span_id = %raw.id, %error, "Malformed attribute JSON, ignoring");
            SpanAttributes::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::TokenUsage;
    use crate::utils::time::format_timestamp;
    use chrono::DateTime;

    fn raw(id: &str) -> RawSpan {
        RawSpan {
            id: id.to_string(),
            name: "llm.call".to_string(),
            trace_id: Some("t1".to_string()),
            start_time: "2024-01-15T10:30:00Z".to_string(),
            end_time: "2024-01-15T10:30:01Z".to_string(),
            status_code: "OK".to_string(),
            attributes: String::new(),
        }
    }

    #[test]
    fn test_normalize_well_formed() {
        let mut input = raw("s1");
        input.attributes =
            r#"{"gen_ai.system":"openai","gen_ai.usage.input_tokens":100}"#.to_string();

        let span = normalize(&input);
        assert_eq!(span.id, "s1");
        assert_eq!(span.status, SpanStatus::Ok);
        assert_eq!(span.attributes.vendor.as_deref(), Some("openai"));
        assert_eq!(span.attributes.usage.input_tokens(), 100);
        assert_eq!(span.duration().num_seconds(), 1);
    }

    #[test]
    fn test_normalize_round_trips_timestamps() {
        let input = RawSpan {
            start_time: "2024-01-15T10:30:00.123456Z".to_string(),
            end_time: "2024-01-15T10:30:01.654321Z".to_string(),
            ..raw("s1")
        };

        let span = normalize(&input);
        assert_eq!(format_timestamp(span.start_time), input.start_time);
        assert_eq!(format_timestamp(span.end_time), input.end_time);
    }

    #[test]
    fn test_normalize_clamps_inverted_interval() {
        let input = RawSpan {
            start_time: "2024-01-15T10:30:05Z".to_string(),
            end_time: "2024-01-15T10:30:00Z".to_string(),
            ..raw("s1")
        };

        let span = normalize(&input);
        assert_eq!(span.end_time, span.start_time);
        assert_eq!(span.duration().num_milliseconds(), 0);
    }

    #[test]
    fn test_normalize_bad_timestamps_fall_back() {
        let input = RawSpan {
            start_time: "garbage".to_string(),
            end_time: String::new(),
            ..raw("s1")
        };

        let span = normalize(&input);
        assert_eq!(span.start_time, DateTime::UNIX_EPOCH);
        assert_eq!(span.end_time, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_normalize_malformed_attribute_json() {
        let input = RawSpan {
            attributes: "{not valid json".to_string(),
            ..raw("s1")
        };

        let span = normalize(&input);
        assert_eq!(span.attributes, SpanAttributes::default());
        assert!(span.attributes.usage.is_absent());
    }

    #[test]
    fn test_normalize_non_object_attribute_json() {
        let input = RawSpan {
            attributes: "[1, 2, 3]".to_string(),
            ..raw("s1")
        };

        assert_eq!(normalize(&input).attributes, SpanAttributes::default());
    }

    #[test]
    fn test_normalize_page_keeps_malformed_records() {
        let page = FetchPage {
            result: vec![
                raw("s1"),
                RawSpan {
                    start_time: "garbage".to_string(),
                    attributes: "also garbage".to_string(),
                    ..raw("s2")
                },
            ],
            metadata: crate::data::types::PageMetadata {
                page: 1,
                total_pages: 1,
            },
        };

        let spans = normalize_page(&page);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].id, "s2");
    }

    #[test]
    fn test_normalize_combined_usage_shape() {
        let input = RawSpan {
            attributes: r#"{"gen_ai.usage":{"input_tokens":10,"output_tokens":5}}"#.to_string(),
            ..raw("s1")
        };

        let span = normalize(&input);
        assert_eq!(
            span.attributes.usage,
            TokenUsage::Combined {
                input: 10,
                output: 5,
                total: 15
            }
        );
    }
}
