// =============================================================================
// Timeline Layout
// =============================================================================

/// Width of the timeline coordinate system, in layout units.
///
/// All span offsets and lengths are scaled into `0..LAYOUT_WIDTH` so the
/// renderer can map them to pixels with a single multiplication.
pub const LAYOUT_WIDTH: f64 = 1000.0;

/// Minimum rendered length for a span, in layout units.
///
/// Zero-length spans (instantaneous events, clamped bad intervals) are given
/// this floor so they remain visible and clickable.
pub const MIN_SPAN_LENGTH: f64 = 2.0;

// =============================================================================
// Content Previews
// =============================================================================

/// Maximum length for prompt/response preview text (in characters)
pub const PREVIEW_MAX_LENGTH: usize = 200;
