//! Typed attribute extraction
//!
//! Converts a parsed attribute bag into [`SpanAttributes`] in a single pass.
//! Attribute conventions differ between instrumentation SDKs, so every
//! logical field is resolved through a chain of known keys; token usage
//! additionally supports two historical shapes (a combined usage object and
//! discrete counter attributes). Unrecognized keys are preserved in the
//! `extra` bucket rather than discarded.

use serde_json::{Map, Value as JsonValue};

use crate::core::constants::PREVIEW_MAX_LENGTH;
use crate::data::types::{SpanAttributes, TokenUsage};
use crate::utils::string::truncate_preview;

// ============================================================================
// ATTRIBUTE KEYS
// ============================================================================

mod keys {
    /// Vendor identifier, in priority order
    pub const VENDOR: &[&str] = &["gen_ai.system", "llm.vendor", "llm.provider"];

    /// Model identifier; response model wins over request model
    pub const MODEL: &[&str] = &[
        "gen_ai.response.model",
        "gen_ai.request.model",
        "llm.model_name",
        "llm.model",
    ];

    /// Combined usage object (shape 1)
    pub const USAGE_OBJECT: &[&str] = &["gen_ai.usage", "llm.token_count", "usage"];

    /// Discrete input-token counters (shape 2)
    pub const INPUT_TOKENS: &[&str] = &[
        "gen_ai.usage.input_tokens",
        "gen_ai.usage.prompt_tokens",
        "llm.usage.prompt_tokens",
        "llm.token_count.prompt",
    ];

    /// Discrete output-token counters (shape 2)
    pub const OUTPUT_TOKENS: &[&str] = &[
        "gen_ai.usage.output_tokens",
        "gen_ai.usage.completion_tokens",
        "llm.usage.completion_tokens",
        "llm.token_count.completion",
    ];

    /// Free-form prompt content
    pub const INPUT_CONTENT: &[&str] = &["gen_ai.prompt", "input.value", "llm.prompts"];

    /// Free-form response content
    pub const OUTPUT_CONTENT: &[&str] = &["gen_ai.completion", "output.value"];

    /// Field names inside a combined usage object
    pub const OBJ_INPUT: &[&str] = &["input_tokens", "prompt_tokens"];
    pub const OBJ_OUTPUT: &[&str] = &["output_tokens", "completion_tokens"];
    pub const OBJ_TOTAL: &[&str] = &["total_tokens"];
}

/// Every key consumed into a typed field; anything else goes to `extra`
const CONSUMED_KEYS: &[&[&str]] = &[
    keys::VENDOR,
    keys::MODEL,
    keys::USAGE_OBJECT,
    keys::INPUT_TOKENS,
    keys::OUTPUT_TOKENS,
    keys::INPUT_CONTENT,
    keys::OUTPUT_CONTENT,
];

// ============================================================================
// VALUE COERCION
// ============================================================================

/// Coerce an attribute value to an integer. Producers emit both JSON numbers
/// and stringified numbers for the same counters.
fn value_as_i64(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_string(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

/// First non-empty string among the given keys
fn get_first_string(attrs: &Map<String, JsonValue>, candidates: &[&str]) -> Option<String> {
    candidates.iter().find_map(|k| attrs.get(*k).and_then(value_as_string))
}

/// First integer value among the given keys
fn get_first_i64(attrs: &Map<String, JsonValue>, candidates: &[&str]) -> Option<i64> {
    candidates.iter().find_map(|k| attrs.get(*k).and_then(value_as_i64))
}

// ============================================================================
// TOKEN USAGE
// ============================================================================

/// Parse a combined usage object. The value may be an inline JSON object or
/// a JSON-encoded string holding one (both occur in the wild).
fn parse_usage_object(value: &JsonValue) -> Option<TokenUsage> {
    let parsed;
    let obj = match value {
        JsonValue::Object(map) => map,
        JsonValue::String(s) => match serde_json::from_str::<JsonValue>(s) {
            Ok(JsonValue::Object(map)) => {
                parsed = map;
                &parsed
            }
            _ => return None,
        },
        _ => return None,
    };

    let input = get_first_i64(obj, keys::OBJ_INPUT);
    let output = get_first_i64(obj, keys::OBJ_OUTPUT);
    let total = get_first_i64(obj, keys::OBJ_TOTAL);

    if input.is_none() && output.is_none() && total.is_none() {
        return None;
    }

    let input = input.unwrap_or(0);
    let output = output.unwrap_or(0);
    Some(TokenUsage::Combined {
        input,
        output,
        total: total.unwrap_or(input + output),
    })
}

/// Resolve token usage, preferring the combined object when both shapes are
/// present on the same span.
fn extract_usage(attrs: &Map<String, JsonValue>) -> TokenUsage {
    for key in keys::USAGE_OBJECT {
        if let Some(value) = attrs.get(*key)
            && let Some(usage) = parse_usage_object(value)
        {
            return usage;
        }
    }

    let input = get_first_i64(attrs, keys::INPUT_TOKENS);
    let output = get_first_i64(attrs, keys::OUTPUT_TOKENS);
    if input.is_none() && output.is_none() {
        return TokenUsage::Absent;
    }

    TokenUsage::Counters {
        input: input.unwrap_or(0),
        output: output.unwrap_or(0),
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

/// Extract typed attributes from a parsed bag in one pass.
pub fn extract_attributes(attrs: &Map<String, JsonValue>) -> SpanAttributes {
    let vendor = get_first_string(attrs, keys::VENDOR);
    let model = get_first_string(attrs, keys::MODEL);
    let usage = extract_usage(attrs);

    let input_content = get_first_string(attrs, keys::INPUT_CONTENT)
        .map(|s| truncate_preview(&s, PREVIEW_MAX_LENGTH));
    let output_content = get_first_string(attrs, keys::OUTPUT_CONTENT)
        .map(|s| truncate_preview(&s, PREVIEW_MAX_LENGTH));

    let extra: Map<String, JsonValue> = attrs
        .iter()
        .filter(|(k, _)| !CONSUMED_KEYS.iter().any(|set| set.contains(&k.as_str())))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    SpanAttributes {
        vendor,
        model,
        usage,
        input_content,
        output_content,
        extra,
    }
}
