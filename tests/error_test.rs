use std::error::Error as _;
use std::time::Duration;

use detector_gateway::{AnalyzeResult, DetectorError, ErrorBody, HealthResponse, Result};

#[test]
fn test_error_display() {
    let err = DetectorError::DetectorUnavailable {
        provider: "sensity".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "sensity detector unavailable: circuit breaker is open"
    );
}

#[test]
fn test_result_alias() {
    fn returns_error() -> Result<()> {
        Err(DetectorError::EmptyPayload)
    }
    assert!(returns_error().is_err());
}

#[test]
fn upstream_failure_exposes_source() {
    let err = DetectorError::UpstreamFailure {
        provider: "reality-defender".into(),
        attempts: 3,
        source: Box::new(DetectorError::RateLimited {
            retry_after: Some(Duration::from_secs(2)),
        }),
    };
    let source = err.source().expect("wrapped cause");
    assert!(source.to_string().contains("rate limited"));
}

// ============================================================================
// Transient error classification
// ============================================================================

#[test]
fn transient_errors() {
    assert!(DetectorError::Timeout.is_transient());
    assert!(DetectorError::UpstreamStatus { status: 500 }.is_transient());
    assert!(DetectorError::UpstreamStatus { status: 504 }.is_transient());
    assert!(DetectorError::RateLimited { retry_after: None }.is_transient());
}

#[test]
fn permanent_errors() {
    assert!(!DetectorError::EmptyPayload.is_transient());
    assert!(!DetectorError::Network("refused".into()).is_transient());
    assert!(!DetectorError::InvalidResponse("html".into()).is_transient());
    assert!(!DetectorError::GatewayClosed.is_transient());
    assert!(
        !DetectorError::FatalUpstreamRejection {
            status: 401,
            message: "bad key".into()
        }
        .is_transient()
    );
}

// ============================================================================
// Boundary mapping
// ============================================================================

#[test]
fn error_body_carries_display_text() {
    let err = DetectorError::EmptyPayload;
    let body = serde_json::to_value(ErrorBody::from(&err)).unwrap();
    assert_eq!(body, serde_json::json!({"detail": "empty payload"}));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn health_body_is_ok() {
    let body = serde_json::to_value(HealthResponse::default()).unwrap();
    assert_eq!(body, serde_json::json!({"status": "ok"}));
}

#[test]
fn result_serializes_in_camel_case() {
    let result = AnalyzeResult::new("fake", 1.7, vec!["blur".into()], "v3");
    let body = serde_json::to_value(&result).unwrap();
    assert_eq!(
        body,
        serde_json::json!({
            "label": "fake",
            "score": 1.0,
            "reasons": ["blur"],
            "modelVersion": "v3",
        })
    );
}
