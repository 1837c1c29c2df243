//! Telemetry metric name constants.
//!
//! Centralised metric names for detector gateway operations. Consumers
//! install their own `metrics` recorder (e.g. prometheus, statsd); without
//! a recorder installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `detector_gateway_`. Counters end in
//! `_total`, histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `provider`: provider name (e.g. "sensity", "reality-defender")
//! - `status`: outcome: "ok" or "error"

/// Total `analyze` calls that reached the upstream dispatch stage.
///
/// Cache hits are not counted here. Labels: `provider`, `status`.
pub const REQUESTS_TOTAL: &str = "detector_gateway_requests_total";

/// Duration of `analyze` calls from first attempt to final outcome.
///
/// Labels: `provider`.
pub const REQUEST_DURATION_SECONDS: &str = "detector_gateway_request_duration_seconds";

/// Total retry attempts (not counting the initial request).
///
/// Labels: `provider`.
pub const RETRIES_TOTAL: &str = "detector_gateway_retries_total";

/// Total response cache hits.
///
/// Labels: `provider`.
pub const CACHE_HITS_TOTAL: &str = "detector_gateway_cache_hits_total";

/// Total response cache misses.
///
/// Labels: `provider`.
pub const CACHE_MISSES_TOTAL: &str = "detector_gateway_cache_misses_total";

/// Times a failure left the circuit breaker open.
///
/// Labels: `provider`.
pub const BREAKER_OPENED_TOTAL: &str = "detector_gateway_breaker_opened_total";

/// Attempts denied by an open circuit breaker.
///
/// Labels: `provider`.
pub const BREAKER_REJECTIONS_TOTAL: &str = "detector_gateway_breaker_rejections_total";
