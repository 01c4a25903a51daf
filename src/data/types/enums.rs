//! Classification enums for span data

use serde::{Deserialize, Serialize};

/// Span status as recorded by the instrumentation SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum SpanStatus {
    Ok,
    Error,
    #[default]
    Unset,
}

impl SpanStatus {
    /// Decode a raw `status_code` string.
    ///
    /// Accepts both the short form (`OK`) and the OTLP enum name
    /// (`STATUS_CODE_OK`), case-insensitively. Anything else is `Unset`.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim();
        let code = code
            .strip_prefix("STATUS_CODE_")
            .or_else(|| code.strip_prefix("status_code_"))
            .unwrap_or(code);
        if code.eq_ignore_ascii_case("ok") {
            Self::Ok
        } else if code.eq_ignore_ascii_case("error") {
            Self::Error
        } else {
            Self::Unset
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::Error => "ERROR",
            Self::Unset => "UNSET",
        }
    }
}
