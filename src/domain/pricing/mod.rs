//! Pricing table and cost aggregation
//!
//! Turns per-span token usage into monetary cost:
//! - Pricing table parsed from a JSON document, keyed by (vendor, model)
//! - Multi-strategy model lookup (exact → vendor-prefixed → alias → family)
//! - Per-span costs and order-independent trace totals
//!
//! Pricing tables are necessarily incomplete (new models ship faster than
//! pricing metadata), so an unknown vendor/model contributes zero cost and
//! is reported in the aggregate's `unpriced` list instead of failing.

use std::sync::OnceLock;

use regex::Regex;
use rustc_hash::FxHashMap;
use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::data::types::Span;

// ============================================================================
// ERROR TYPE
// ============================================================================

#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Failed to parse pricing data: {0}")]
    Parse(String),
}

// ============================================================================
// PRICING DATA STRUCTURES
// ============================================================================

/// Per-token rates for one (vendor, model) pair, in USD
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PricingEntry {
    pub input_rate_per_token: f64,
    pub output_rate_per_token: f64,
}

/// How a model was matched in the pricing table.
///
/// Exposed on per-span cost results so the UI can show cost confidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    /// Exact (vendor, model) or bare-model key match
    Exact,
    /// Matched a vendor-prefixed key, e.g. "openai/gpt-4o"
    VendorPrefix,
    /// Matched after stripping a "-latest"/":latest" suffix
    Alias,
    /// Matched the base model family after stripping a version date
    Family,
    /// No match found; cost is zero
    #[default]
    NotFound,
}

impl MatchType {
    /// Confidence level (0.0-1.0) for this match quality
    pub fn confidence(self) -> f64 {
        match self {
            MatchType::Exact => 1.0,
            MatchType::VendorPrefix => 0.95,
            MatchType::Alias => 0.85,
            MatchType::Family => 0.70,
            MatchType::NotFound => 0.0,
        }
    }
}

// ============================================================================
// PRICING TABLE
// ============================================================================

/// Immutable, case-insensitive pricing lookup table.
///
/// Read-only after construction; safe to share across threads.
#[derive(Debug, Default)]
pub struct PricingTable {
    /// Canonical lookup: lowercase "vendor/model" or bare "model" → rates
    models: FxHashMap<String, PricingEntry>,
    /// Bare model name → canonical vendor-prefixed key, so spans that carry
    /// no vendor attribute can still reach prefixed entries. First vendor to
    /// claim a model name wins.
    by_model: FxHashMap<String, String>,
    /// Number of entries, for logging and sanity checks
    pub model_count: usize,
}

impl PricingTable {
    /// Parse a pricing document from JSON.
    ///
    /// Two document shapes are accepted:
    /// - Flat: `{"openai/gpt-4o": {"input_rate": ..., "output_rate": ...}}`
    /// - Nested: `{"openai": {"gpt-4o": {"input_rate": ..., ...}}}`
    ///
    /// Individual bad entries (negative or missing rates) are skipped with a
    /// warning; only a wholly unusable document is an error.
    pub fn from_json_str(json: &str) -> Result<Self, PricingError> {
        let raw: JsonValue =
            serde_json::from_str(json).map_err(|e| PricingError::Parse(e.to_string()))?;

        let obj = raw
            .as_object()
            .ok_or_else(|| PricingError::Parse("Expected JSON object".into()))?;

        let mut models = FxHashMap::default();
        let mut by_model = FxHashMap::default();

        for (key, value) in obj {
            let Some(entry) = value.as_object() else {
                continue;
            };

            if let Some(rates) = parse_rates(entry) {
                insert_entry(&mut models, &mut by_model, &key.to_lowercase(), rates);
            } else {
                // Nested shape: vendor → model → rates
                for (model, rates_value) in entry {
                    let Some(rates_obj) = rates_value.as_object() else {
                        continue;
                    };
                    let Some(rates) = parse_rates(rates_obj) else {
                        continue;
                    };
                    let canonical = format!("{}/{}", key.to_lowercase(), model.to_lowercase());
                    insert_entry(&mut models, &mut by_model, &canonical, rates);
                }
            }
        }

        let model_count = models.len();
        tracing::debug!(model_count, "Loaded pricing table");

        Ok(Self {
            models,
            by_model,
            model_count,
        })
    }

    /// Look up pricing for a model with multi-strategy fallback.
    ///
    /// Lookup order:
    /// 1. Vendor-prefixed key ("vendor/model") → `VendorPrefix`; for spans
    ///    without a vendor, the bare-model index reaches prefixed entries
    /// 2. Bare model key → `Exact`
    /// 3. Alias: "-latest" / ":latest" suffix stripped
    /// 4. Family: trailing version date stripped ("gpt-4o-2024-11-20" → "gpt-4o")
    pub fn lookup(&self, vendor: Option<&str>, model: &str) -> Option<(PricingEntry, MatchType)> {
        let model_lower = model.to_lowercase();
        let vendor_lower = vendor
            .map(str::to_lowercase)
            .filter(|v| !v.trim().is_empty());

        // Strategy 1 & 2: direct match; the match type records which key route hit
        if let Some(hit) = self.get(vendor_lower.as_deref(), &model_lower) {
            return Some(hit);
        }

        // Strategy 3: alias suffixes added by some frameworks
        let normalized = normalize_model_name(&model_lower);
        if normalized != model_lower
            && let Some((entry, _)) = self.get(vendor_lower.as_deref(), normalized)
        {
            return Some((entry, MatchType::Alias));
        }

        // Strategy 4: base model family without the version date (last resort)
        let family = strip_date_suffix(normalized);
        if family != normalized
            && let Some((entry, _)) = self.get(vendor_lower.as_deref(), &family)
        {
            return Some((entry, MatchType::Family));
        }

        None
    }

    /// Resolve one model name against the table. The vendor-prefixed key is
    /// tried first and reported as `VendorPrefix`; the bare model key is the
    /// only route reported as `Exact`. A span carrying no vendor falls back
    /// to the bare-model index so prefixed-only entries are still reachable.
    fn get(&self, vendor: Option<&str>, model: &str) -> Option<(PricingEntry, MatchType)> {
        if let Some(vendor) = vendor {
            let prefixed = format!("{vendor}/{model}");
            if let Some(entry) = self.models.get(&prefixed) {
                return Some((*entry, MatchType::VendorPrefix));
            }
        }

        if let Some(entry) = self.models.get(model) {
            return Some((*entry, MatchType::Exact));
        }

        // A stated-but-wrong vendor stays unmatched: falling back across
        // vendors would price a span against another vendor's rates.
        if vendor.is_none()
            && let Some(canonical) = self.by_model.get(model)
            && let Some(entry) = self.models.get(canonical)
        {
            return Some((*entry, MatchType::VendorPrefix));
        }

        None
    }
}

/// Read rates from an entry object. Accepts both this crate's field names
/// and the per-token names used by public pricing feeds.
fn parse_rates(entry: &serde_json::Map<String, JsonValue>) -> Option<PricingEntry> {
    let input = entry
        .get("input_rate")
        .or_else(|| entry.get("input_cost_per_token"))
        .and_then(JsonValue::as_f64)?;
    let output = entry
        .get("output_rate")
        .or_else(|| entry.get("output_cost_per_token"))
        .and_then(JsonValue::as_f64)?;

    Some(PricingEntry {
        input_rate_per_token: input,
        output_rate_per_token: output,
    })
}

fn insert_entry(
    models: &mut FxHashMap<String, PricingEntry>,
    by_model: &mut FxHashMap<String, String>,
    key: &str,
    rates: PricingEntry,
) {
    // Negative rates indicate data corruption
    if rates.input_rate_per_token < 0.0 || rates.output_rate_per_token < 0.0 {
        tracing::warn!(model = key, "Skipping pricing entry with negative rate");
        return;
    }
    if let Some((_, model)) = key.split_once('/')
        && !model.is_empty()
    {
        by_model
            .entry(model.to_string())
            .or_insert_with(|| key.to_string());
    }
    models.insert(key.to_string(), rates);
}

// ============================================================================
// MODEL NAME NORMALIZATION
// ============================================================================

/// Strip "-latest" / ":latest" suffixes. Assumes input is already lowercase.
fn normalize_model_name(model: &str) -> &str {
    model
        .trim_end_matches("-latest")
        .trim_end_matches(":latest")
}

/// Strip trailing version dates from model names (last-resort fallback).
///
/// - "claude-3-5-sonnet-20241022" → "claude-3-5-sonnet"
/// - "gpt-4o-2024-11-20" → "gpt-4o"
fn strip_date_suffix(model: &str) -> String {
    static RE_COMPACT: OnceLock<Regex> = OnceLock::new();
    static RE_DASHED: OnceLock<Regex> = OnceLock::new();

    let re_compact = RE_COMPACT.get_or_init(|| Regex::new(r"-\d{8}$").expect("Invalid regex"));
    let re_dashed =
        RE_DASHED.get_or_init(|| Regex::new(r"-\d{4}-\d{2}-\d{2}$").expect("Invalid regex"));

    let result = re_compact.replace(model, "");
    let result = re_dashed.replace(&result, "");
    result.to_string()
}

// ============================================================================
// COST TYPES
// ============================================================================

/// Monetary cost split by direction, in USD.
///
/// Invariant: `total == input + output` within float tolerance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub total: f64,
    pub input: f64,
    pub output: f64,
}

impl CostBreakdown {
    pub fn add(&mut self, other: CostBreakdown) {
        self.total += other.total;
        self.input += other.input;
        self.output += other.output;
    }
}

/// Cost and token counts for one span
#[derive(Debug, Clone, Default, Serialize)]
pub struct SpanCost {
    pub span_id: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
    pub cost: CostBreakdown,
    pub match_type: MatchType,
}

/// Aggregated cost for one trace (or any span batch)
#[derive(Debug, Clone, Default, Serialize)]
pub struct TraceCost {
    pub breakdown: CostBreakdown,
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
    /// One entry per span that carried token usage
    pub per_span: Vec<SpanCost>,
    /// Span ids that carried usage but matched no pricing entry.
    /// Exposed so the UI can decide whether to surface it.
    pub unpriced: Vec<String>,
}

// ============================================================================
// COST CALCULATION
// ============================================================================

/// Calculate cost for a single span's token usage.
///
/// Fail-safe: spans without usage, without a model, or with an unknown
/// (vendor, model) pair yield zero cost rather than an error. Token counts
/// are clamped at zero to keep corrupted data from producing negative cost.
pub fn span_cost(span: &Span, table: &PricingTable) -> SpanCost {
    let usage = &span.attributes.usage;
    let input_tokens = usage.input_tokens().max(0);
    let output_tokens = usage.output_tokens().max(0);
    let total_tokens = usage.total_tokens().max(0);

    let mut result = SpanCost {
        span_id: span.id.clone(),
        input_tokens,
        output_tokens,
        total_tokens,
        cost: CostBreakdown::default(),
        match_type: MatchType::NotFound,
    };

    let Some(model) = span.attributes.model.as_deref().filter(|m| !m.is_empty()) else {
        return result;
    };

    match table.lookup(span.attributes.vendor.as_deref(), model) {
        Some((entry, match_type)) => {
            let input = input_tokens as f64 * entry.input_rate_per_token;
            let output = output_tokens as f64 * entry.output_rate_per_token;
            result.cost = CostBreakdown {
                total: input + output,
                input,
                output,
            };
            result.match_type = match_type;
        }
        None => {
            tracing::trace!(
                model,
                vendor = span.attributes.vendor.as_deref().unwrap_or("none"),
                "No pricing found for model"
            );
        }
    }

    result
}

/// Aggregate usage and cost across a span batch.
///
/// Only spans carrying token usage contribute entries; accumulation is a
/// plain sum, so processing order never affects the result (pages merge
/// incrementally as they arrive).
pub fn aggregate(spans: &[Span], table: &PricingTable) -> TraceCost {
    let mut trace = TraceCost::default();

    for span in spans {
        if span.attributes.usage.is_absent() {
            continue;
        }

        let cost = span_cost(span, table);
        trace.breakdown.add(cost.cost);
        trace.input_tokens += cost.input_tokens;
        trace.output_tokens += cost.output_tokens;
        trace.total_tokens += cost.total_tokens;
        if cost.match_type == MatchType::NotFound {
            trace.unpriced.push(cost.span_id.clone());
        }
        trace.per_span.push(cost);
    }

    trace
}
