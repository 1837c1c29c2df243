//! Outbound request body

use base64::Engine as _;
use serde::Serialize;

/// Content type sent upstream when the caller did not declare one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// JSON body posted to every provider.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeRequest<'a> {
    /// Base64 (standard alphabet, padded) of the raw asset bytes.
    pub content: String,
    pub content_type: &'a str,
}

impl<'a> AnalyzeRequest<'a> {
    /// Encode `payload`, defaulting a missing or blank content type.
    pub fn new(payload: &[u8], content_type: Option<&'a str>) -> Self {
        Self {
            content: base64::engine::general_purpose::STANDARD.encode(payload),
            content_type: content_type
                .filter(|ct| !ct.trim().is_empty())
                .unwrap_or(DEFAULT_CONTENT_TYPE),
        }
    }
}
