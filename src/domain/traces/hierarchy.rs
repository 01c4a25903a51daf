//! Hierarchy assembly (Stage 2)
//!
//! Telemetry spans commonly arrive without explicit parent pointers, so
//! nesting is inferred purely from time-interval containment: sort by start
//! time (ties broken by later end first, so the outer span sorts ahead of
//! the children it opened with), then run one pass with a stack of open
//! candidate parents. O(n log n), dominated by the sort.
//!
//! The forest is an arena: spans live in one vector and edges are index
//! lists, which keeps ownership flat and makes the result trivially
//! serializable for the rendering layer.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::data::types::Span;

/// A trace's spans assembled into a containment forest.
///
/// Normally one root; malformed data (clock skew, dropped root span) can
/// yield several. That is tolerated, not reported.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TraceForest {
    spans: Vec<Span>,
    /// Direct children of each span, in sorted (temporal) order
    children: Vec<Vec<usize>>,
    /// Parent lookup, kept for debugging only
    parent: Vec<Option<usize>>,
    /// Root indices in temporal order of first appearance
    roots: Vec<usize>,
    /// Span id → arena index (first occurrence wins on duplicate ids)
    #[serde(skip)]
    by_id: FxHashMap<String, usize>,
}

impl TraceForest {
    /// Build the forest from one trace's spans. Input order is irrelevant;
    /// empty input yields an empty forest.
    pub fn build(mut spans: Vec<Span>) -> Self {
        // Ties on start sort the later-ending span first: among spans opened
        // at the same instant, the one that closes last is assumed to be the
        // parent. Equal intervals keep encounter order (stable sort).
        spans.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then(b.end_time.cmp(&a.end_time))
        });

        let n = spans.len();
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut parent: Vec<Option<usize>> = vec![None; n];
        let mut roots: Vec<usize> = Vec::new();
        let mut open: Vec<usize> = Vec::new();

        for i in 0..n {
            // Pop spans that closed before this one started; they cannot be
            // ancestors of it or of anything after it.
            while let Some(&top) = open.last() {
                if spans[top].end_time <= spans[i].start_time {
                    open.pop();
                } else {
                    break;
                }
            }

            match open.last() {
                Some(&p) => {
                    parent[i] = Some(p);
                    children[p].push(i);
                }
                None => roots.push(i),
            }
            open.push(i);
        }

        let mut by_id = FxHashMap::default();
        for (i, span) in spans.iter().enumerate() {
            by_id.entry(span.id.clone()).or_insert(i);
        }

        Self {
            spans,
            children,
            parent,
            roots,
            by_id,
        }
    }

    pub fn len(&self) -> usize {
        self.spans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// All spans in sorted (temporal) arena order
    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn span(&self, index: usize) -> &Span {
        &self.spans[index]
    }

    /// Root indices in temporal order
    pub fn roots(&self) -> &[usize] {
        &self.roots
    }

    /// Direct children of a span, in temporal order
    pub fn children_of(&self, index: usize) -> &[usize] {
        &self.children[index]
    }

    /// Parent of a span, if any. Debug lookup only; rendering walks down
    /// from the roots.
    pub fn parent_of(&self, index: usize) -> Option<usize> {
        self.parent[index]
    }

    /// Arena index for a span id
    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.by_id.get(id).copied()
    }
}
