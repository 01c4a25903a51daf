//! Trace assembly pipeline
//!
//! - `normalize` - Stage 1: parse raw span records into normalized [`Span`]s
//! - `extract` - typed attribute extraction used by Stage 1
//! - `hierarchy` - Stage 2: interval-containment forest per trace
//! - `layout` - Stage 3: proportional timeline coordinates
//!
//! Cost aggregation over the same span set lives in `domain::pricing`.

pub mod extract;
pub mod hierarchy;
pub mod layout;
pub mod normalize;

use rustc_hash::FxHashMap;

use crate::data::types::Span;

/// Group normalized spans by trace id, preserving the order in which each
/// trace first appears. Spans without a trace id are grouped under an empty
/// key so malformed records still render somewhere.
pub fn group_by_trace(spans: Vec<Span>) -> Vec<(String, Vec<Span>)> {
    let mut groups: Vec<(String, Vec<Span>)> = Vec::new();
    let mut index: FxHashMap<String, usize> = FxHashMap::default();

    for span in spans {
        let key = span.trace_id.clone().unwrap_or_default();
        match index.get(&key) {
            Some(&i) => groups[i].1.push(span),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![span]));
            }
        }
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{SpanAttributes, SpanStatus};
    use chrono::DateTime;

    fn span(id: &str, trace_id: Option<&str>) -> Span {
        Span {
            id: id.to_string(),
            name: "op".to_string(),
            trace_id: trace_id.map(str::to_string),
            start_time: DateTime::UNIX_EPOCH,
            end_time: DateTime::UNIX_EPOCH,
            status: SpanStatus::Unset,
            attributes: SpanAttributes::default(),
        }
    }

    #[test]
    fn test_group_by_trace_preserves_first_appearance_order() {
        let spans = vec![
            span("s1", Some("t2")),
            span("s2", Some("t1")),
            span("s3", Some("t2")),
        ];

        let groups = group_by_trace(spans);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "t2");
        assert_eq!(groups[0].1.len(), 2);
        assert_eq!(groups[1].0, "t1");
    }

    #[test]
    fn test_group_by_trace_missing_id_bucket() {
        let spans = vec![span("s1", None), span("s2", Some("t1")), span("s3", None)];

        let groups = group_by_trace(spans);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].0, "");
        assert_eq!(groups[0].1.len(), 2);
    }

    #[test]
    fn test_group_by_trace_empty() {
        assert!(group_by_trace(Vec::new()).is_empty());
    }

    // === End-to-end assembly ===

    #[test]
    fn test_full_assembly_pipeline() {
        use crate::data::cache::PageCache;
        use crate::data::types::FetchPage;
        use crate::domain::pricing::{self, PricingTable};
        use crate::domain::traces::{hierarchy::TraceForest, layout, normalize};

        let page: FetchPage = serde_json::from_str(
            r#"{
                "result": [
                    {
                        "id": "child",
                        "name": "llm.call",
                        "trace_id": "t1",
                        "start_time": "2024-01-15T10:30:00.100Z",
                        "end_time": "2024-01-15T10:30:00.600Z",
                        "status_code": "OK",
                        "attributes": "{\"gen_ai.system\":\"openai\",\"gen_ai.request.model\":\"gpt-4o\",\"gen_ai.usage.input_tokens\":1000,\"gen_ai.usage.output_tokens\":500}"
                    },
                    {
                        "id": "root",
                        "name": "agent.run",
                        "trace_id": "t1",
                        "start_time": "2024-01-15T10:30:00Z",
                        "end_time": "2024-01-15T10:30:01Z",
                        "status_code": "OK",
                        "attributes": ""
                    }
                ],
                "metadata": { "page": 1, "total_pages": 1 }
            }"#,
        )
        .unwrap();

        let table =
            PricingTable::from_json_str(r#"{"openai/gpt-4o": {"input_rate": 1e-6, "output_rate": 2e-6}}"#)
                .unwrap();

        let mut cache = PageCache::new();
        let ticket = cache.begin_fetch(page.metadata.page).unwrap();
        assert!(cache.complete_fetch(ticket, normalize::normalize_page(&page)));

        let groups = group_by_trace(cache.spans().to_vec());
        assert_eq!(groups.len(), 1);
        let (trace_id, spans) = groups.into_iter().next().unwrap();
        assert_eq!(trace_id, "t1");

        let cost = pricing::aggregate(&spans, &table);
        assert!((cost.breakdown.total - (1000.0 * 1e-6 + 500.0 * 2e-6)).abs() < 1e-12);
        assert!(cost.unpriced.is_empty());

        let forest = TraceForest::build(spans);
        let root = forest.index_of("root").unwrap();
        let child = forest.index_of("child").unwrap();
        assert_eq!(forest.roots(), &[root]);
        assert_eq!(forest.children_of(root), &[child]);

        let slots = layout::layout_with_width(&forest, 1000.0);
        assert_eq!(slots["root"].offset, 0.0);
        assert_eq!(slots["root"].length, 1000.0);
        assert_eq!(slots["child"].offset, 100.0);
        assert_eq!(slots["child"].length, 500.0);
    }
}
