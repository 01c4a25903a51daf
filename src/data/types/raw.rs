//! Fetch-boundary payload types
//!
//! These mirror the data API's paged response shape. Every field beyond the
//! span id and name is defaulted: telemetry producers are third-party SDKs
//! and a missing field must not fail deserialization of the whole page.

use serde::Deserialize;

/// One span record as delivered by the data-fetch API, prior to
/// normalization. Timestamps and the attribute bag are still strings.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSpan {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub trace_id: Option<String>,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub status_code: String,
    /// JSON-encoded attribute bag; parsed once during normalization
    #[serde(default)]
    pub attributes: String,
}

/// Pagination metadata accompanying a fetch result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageMetadata {
    pub page: u32,
    pub total_pages: u32,
}

impl PageMetadata {
    /// Whether another page can be requested after this one (pages are 1-based)
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// One paged fetch result from the data API
#[derive(Debug, Clone, Deserialize)]
pub struct FetchPage {
    pub result: Vec<RawSpan>,
    pub metadata: PageMetadata,
}
