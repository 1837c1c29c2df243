//! Detector gateway: one resilient client per upstream provider.
//!
//! A [`DetectorGateway`] owns everything one provider needs: the pooled
//! HTTP client, a circuit breaker, the retry policy and (for providers that
//! cache) a response cache. Build it once at startup and share it, usually
//! as `Arc<dyn Detector>`.
//!
//! ```rust,no_run
//! # async fn example() -> detector_gateway::Result<()> {
//! use detector_gateway::{DetectorGateway, ProviderKind, Settings};
//!
//! let gateway = DetectorGateway::new(Settings::from_env(ProviderKind::Sensity)?)?;
//! let result = gateway.analyze(b"...", Some("image/png")).await?;
//! println!("{} ({:.2})", result.label, result.score);
//! gateway.close().await;
//! # Ok(())
//! # }
//! ```

mod dispatch;
mod http;

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::cache::ResponseCache;
use crate::config::Settings;
use crate::providers::{BreakerSnapshot, CircuitBreaker, RetryPolicy};
use crate::traits::Detector;
use crate::{AnalyzeResult, DetectorError, Result};

/// Resilient gateway to a single deepfake-detection provider.
pub struct DetectorGateway {
    settings: Settings,
    endpoint: String,
    http: RwLock<Option<Client>>,
    breaker: CircuitBreaker,
    retry: RetryPolicy,
    cache: Option<ResponseCache>,
}

impl DetectorGateway {
    /// Validate the settings and build the gateway.
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;
        let http = http::build_client(&settings)?;
        Ok(Self {
            endpoint: settings.endpoint(),
            http: RwLock::new(Some(http)),
            breaker: CircuitBreaker::new(settings.breaker_config()),
            retry: settings.retry_policy(),
            cache: settings.cache.as_ref().map(ResponseCache::new),
            settings,
        })
    }

    /// Settings the gateway was built with.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Full URL analysis requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current circuit breaker state.
    pub fn breaker_snapshot(&self) -> BreakerSnapshot {
        self.breaker.snapshot()
    }

    /// Number of cached results, or `None` when caching is disabled.
    pub fn cache_len(&self) -> Option<usize> {
        self.cache.as_ref().map(ResponseCache::len)
    }

    /// Release the connection pool.
    ///
    /// Idempotent. Calls already in flight keep their own client handle and
    /// finish normally; later calls fail with [`DetectorError::GatewayClosed`].
    pub async fn close(&self) {
        let released = self
            .http
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if released.is_some() {
            info!(provider = self.settings.provider.name(), "detector gateway closed");
        }
    }

    /// Whether `close()` has run.
    pub fn is_closed(&self) -> bool {
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }

    fn client(&self) -> Result<Client> {
        self.http
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(DetectorError::GatewayClosed)
    }
}

#[async_trait]
impl Detector for DetectorGateway {
    fn name(&self) -> &str {
        self.settings.provider.name()
    }

    async fn analyze(&self, payload: &[u8], content_type: Option<&str>) -> Result<AnalyzeResult> {
        DetectorGateway::analyze(self, payload, content_type).await
    }
}
