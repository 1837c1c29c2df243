//! detector-gateway - resilient gateway for deepfake detection APIs
//!
//! This crate turns third-party detection providers (Reality Defender,
//! Sensity) into one dependable local operation: hand it the raw bytes of a
//! media asset and get back a normalized [`AnalyzeResult`]. Each provider
//! sits behind its own [`DetectorGateway`], which combines:
//!
//! - a circuit breaker that stops calling a failing upstream for a while
//! - linear-backoff retries for timeouts, 5xx and rate limiting
//! - an optional content-addressed response cache with TTL expiry
//! - a tolerant normalizer for the provider's response shape
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use detector_gateway::{Detector, DetectorGateway, ProviderKind, Settings};
//!
//! #[tokio::main]
//! async fn main() -> detector_gateway::Result<()> {
//!     let settings = Settings::for_provider(ProviderKind::RealityDefender)
//!         .api_key("rd-key")
//!         .max_retries(2);
//!     let detector: Arc<dyn Detector> = Arc::new(DetectorGateway::new(settings)?);
//!
//!     let bytes = std::fs::read("clip.mp4").unwrap_or_default();
//!     let result = detector.analyze(&bytes, Some("video/mp4")).await?;
//!     println!("{}: {:.2} ({})", result.label, result.score, result.model_version);
//!     Ok(())
//! }
//! ```
//!
//! Errors map onto an HTTP boundary through [`DetectorError::status_code()`]
//! and [`ErrorBody`]: empty payloads are client errors (400), everything else
//! is an upstream failure (502).

pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod telemetry;
pub mod traits;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use cache::{CacheConfig, ResponseCache};
pub use config::{Config, ProviderConfig, Settings};
pub use error::{DetectorError, Result};
pub use gateway::DetectorGateway;
pub use providers::{BreakerSnapshot, CircuitState, ProviderKind, RetryPolicy};
pub use traits::Detector;
pub use types::{AnalyzeRequest, AnalyzeResult, ErrorBody, HealthResponse};
