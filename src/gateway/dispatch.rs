//! The `analyze` flow: cache, breaker, retry, classify, normalize.

use reqwest::Client;
use tokio::time::Instant;
use tracing::{debug, warn};

use super::{DetectorGateway, http};
use crate::cache::content_digest;
use crate::providers::normalize;
use crate::providers::retry::with_retry;
use crate::telemetry;
use crate::types::AnalyzeRequest;
use crate::{AnalyzeResult, DetectorError, Result};

impl DetectorGateway {
    /// Analyze one media asset.
    ///
    /// Fails with [`DetectorError::EmptyPayload`] for empty input before any
    /// other work, [`DetectorError::DetectorUnavailable`] when the breaker
    /// denies an attempt, [`DetectorError::UpstreamFailure`] once transient
    /// failures exhaust `max_retries`, and [`DetectorError::Network`] or
    /// [`DetectorError::FatalUpstreamRejection`] immediately.
    pub async fn analyze(
        &self,
        payload: &[u8],
        content_type: Option<&str>,
    ) -> Result<AnalyzeResult> {
        if payload.is_empty() {
            return Err(DetectorError::EmptyPayload);
        }
        let client = self.client()?;
        let provider = self.settings.provider.name();

        let digest = match &self.cache {
            Some(cache) => {
                let digest = content_digest(payload);
                if let Some(hit) = cache.get(&digest) {
                    metrics::counter!(telemetry::CACHE_HITS_TOTAL, "provider" => provider)
                        .increment(1);
                    debug!(provider, digest = %digest, "cache hit");
                    return Ok(hit);
                }
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL, "provider" => provider)
                    .increment(1);
                Some(digest)
            }
            None => None,
        };

        let body = AnalyzeRequest::new(payload, content_type);
        let (client, body) = (&client, &body);
        let start = Instant::now();
        let outcome = with_retry(&self.retry, provider, move |attempt| {
            self.attempt(client, body, attempt)
        })
        .await;

        let status = if outcome.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::REQUESTS_TOTAL, "provider" => provider, "status" => status)
            .increment(1);
        metrics::histogram!(telemetry::REQUEST_DURATION_SECONDS, "provider" => provider)
            .record(start.elapsed().as_secs_f64());

        let result = outcome?;
        if let (Some(cache), Some(digest)) = (&self.cache, digest) {
            cache.insert(digest, result.clone());
        }
        Ok(result)
    }

    /// One breaker-gated upstream call.
    async fn attempt(
        &self,
        client: &Client,
        body: &AnalyzeRequest<'_>,
        attempt: u32,
    ) -> Result<AnalyzeResult> {
        let provider = self.settings.provider.name();
        if self.breaker.allow().is_err() {
            metrics::counter!(telemetry::BREAKER_REJECTIONS_TOTAL, "provider" => provider)
                .increment(1);
            debug!(provider, attempt, "circuit breaker denied attempt");
            return Err(DetectorError::DetectorUnavailable {
                provider: provider.to_owned(),
            });
        }

        debug!(provider, attempt, endpoint = %self.endpoint, "sending analysis request");
        let outcome = match client.post(&self.endpoint).json(body).send().await {
            Ok(response) => http::read_response(response).await,
            Err(e) => Err(http::transport_error(e)),
        };

        match outcome {
            Ok(payload) => {
                self.breaker.record_success();
                Ok(normalize(&payload, &self.settings.profile().fields))
            }
            Err(e) => {
                if e.counts_against_breaker() {
                    self.record_failure(&e);
                }
                if let DetectorError::RateLimited {
                    retry_after: Some(hint),
                } = &e
                {
                    debug!(
                        provider,
                        attempt,
                        retry_after_secs = hint.as_secs(),
                        "upstream rate limited"
                    );
                }
                Err(e)
            }
        }
    }

    fn record_failure(&self, err: &DetectorError) {
        if self.breaker.record_failure().opened() {
            let provider = self.settings.provider.name();
            metrics::counter!(telemetry::BREAKER_OPENED_TOTAL, "provider" => provider)
                .increment(1);
            warn!(
                provider,
                failures = self.breaker.failure_count(),
                recovery_secs = self.breaker.config().recovery.as_secs_f64(),
                error = %err,
                "circuit breaker opened"
            );
        }
    }
}
