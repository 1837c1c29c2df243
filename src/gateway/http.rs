//! Outbound HTTP plumbing: client construction and response classification.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response};
use serde_json::Value;

use crate::config::Settings;
use crate::version;
use crate::{DetectorError, Result};

/// Longest upstream error body echoed into a rejection message.
const MAX_ERROR_BODY: usize = 256;

/// Build the pooled client for one gateway.
///
/// The provider's auth header is installed as a sensitive default header, so
/// it never shows up in `Debug` output of requests.
pub(super) fn build_client(settings: &Settings) -> Result<Client> {
    let (name, value) = settings.profile().auth.header(&settings.api_key);
    let mut value = HeaderValue::from_str(&value)
        .map_err(|e| DetectorError::Configuration(format!("invalid API key: {e}")))?;
    value.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(HeaderName::from_static(name), value);

    Client::builder()
        .default_headers(headers)
        .user_agent(version::user_agent())
        .timeout(settings.timeout)
        .build()
        .map_err(|e| DetectorError::Configuration(format!("failed to build HTTP client: {e}")))
}

/// Map a failed `send()` to a gateway error.
pub(super) fn transport_error(err: reqwest::Error) -> DetectorError {
    if err.is_timeout() {
        DetectorError::Timeout
    } else {
        DetectorError::Network(err.to_string())
    }
}

/// Turn an upstream response into its JSON body or a classified error.
pub(super) async fn read_response(response: Response) -> Result<Value> {
    let status = response.status();

    if status.is_success() {
        let bytes = response.bytes().await.map_err(transport_error)?;
        return serde_json::from_slice(&bytes)
            .map_err(|e| DetectorError::InvalidResponse(format!("body is not JSON: {e}")));
    }

    match status.as_u16() {
        429 => Err(DetectorError::RateLimited {
            retry_after: retry_after(&response),
        }),
        code if code >= 500 => Err(DetectorError::UpstreamStatus { status: code }),
        code => {
            // Best effort; a body we cannot read still leaves the status.
            let body = response.text().await.unwrap_or_default();
            Err(DetectorError::FatalUpstreamRejection {
                status: code,
                message: truncate(body.trim(), MAX_ERROR_BODY),
            })
        }
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

fn truncate(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
