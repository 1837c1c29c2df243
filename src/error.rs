//! Detector gateway error types

use std::time::Duration;

/// Detector gateway error types
#[derive(Debug, thiserror::Error)]
pub enum DetectorError {
    // Caller errors
    #[error("empty payload")]
    EmptyPayload,

    // Breaker errors
    #[error("circuit breaker is open")]
    CircuitOpen,

    /// Breaker denial as seen by callers of `analyze`. No upstream call was made.
    #[error("{provider} detector unavailable: circuit breaker is open")]
    DetectorUnavailable { provider: String },

    // Transient upstream errors
    #[error("upstream timed out")]
    Timeout,

    #[error("upstream server error ({status})")]
    UpstreamStatus { status: u16 },

    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    /// Retries exhausted; wraps the last transient error.
    #[error("{provider} request failed after {attempts} attempt(s): {source}")]
    UpstreamFailure {
        provider: String,
        attempts: u32,
        #[source]
        source: Box<DetectorError>,
    },

    // Fatal upstream errors
    #[error("upstream rejected request ({status}): {message}")]
    FatalUpstreamRejection { status: u16, message: String },

    #[error("invalid upstream response: {0}")]
    InvalidResponse(String),

    #[error("network error: {0}")]
    Network(String),

    // Lifecycle / configuration errors
    #[error("gateway has been closed")]
    GatewayClosed,

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DetectorError {
    /// Whether the error is worth retrying with backoff.
    ///
    /// Timeouts, 5xx responses and rate limiting are transient. Everything
    /// else (4xx rejections, transport failures, malformed bodies) is not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::UpstreamStatus { .. } | Self::RateLimited { .. }
        )
    }

    /// Whether this failure should be recorded on the circuit breaker.
    ///
    /// Rate limiting is a provider policy signal and transport errors are
    /// local network conditions; neither says anything about upstream health.
    pub fn counts_against_breaker(&self) -> bool {
        matches!(
            self,
            Self::Timeout
                | Self::UpstreamStatus { .. }
                | Self::FatalUpstreamRejection { .. }
                | Self::InvalidResponse(_)
        )
    }

    /// HTTP status the request-handling layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::EmptyPayload => 400,
            _ => 502,
        }
    }
}

/// Result type alias for detector gateway operations
pub type Result<T> = std::result::Result<T, DetectorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_maps_to_client_error() {
        assert_eq!(DetectorError::EmptyPayload.status_code(), 400);
    }

    #[test]
    fn upstream_errors_map_to_bad_gateway() {
        let errors = [
            DetectorError::DetectorUnavailable {
                provider: "sensity".into(),
            },
            DetectorError::Network("connection refused".into()),
            DetectorError::UpstreamFailure {
                provider: "sensity".into(),
                attempts: 3,
                source: Box::new(DetectorError::Timeout),
            },
            DetectorError::FatalUpstreamRejection {
                status: 422,
                message: "bad media".into(),
            },
        ];
        for err in errors {
            assert_eq!(err.status_code(), 502, "{err}");
        }
    }

    #[test]
    fn rate_limit_is_transient_but_not_a_health_signal() {
        let err = DetectorError::RateLimited { retry_after: None };
        assert!(err.is_transient());
        assert!(!err.counts_against_breaker());
    }

    #[test]
    fn rejection_counts_against_breaker_without_retry() {
        let err = DetectorError::FatalUpstreamRejection {
            status: 400,
            message: String::new(),
        };
        assert!(!err.is_transient());
        assert!(err.counts_against_breaker());
    }

    #[test]
    fn network_error_bypasses_breaker() {
        let err = DetectorError::Network("dns".into());
        assert!(!err.is_transient());
        assert!(!err.counts_against_breaker());
    }

    #[test]
    fn upstream_failure_mentions_attempts_and_cause() {
        let err = DetectorError::UpstreamFailure {
            provider: "reality-defender".into(),
            attempts: 2,
            source: Box::new(DetectorError::UpstreamStatus { status: 504 }),
        };
        let msg = err.to_string();
        assert!(msg.contains("2 attempt(s)"));
        assert!(msg.contains("504"));
    }
}
