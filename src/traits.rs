//! Core Detector trait

use async_trait::async_trait;

use crate::{AnalyzeResult, Result};

/// The operation the request-handling layer depends on.
///
/// Construct one implementation per provider at startup and hand it to the
/// handlers as `Arc<dyn Detector>`; there is no global registry.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Provider name for logging/debugging.
    fn name(&self) -> &str;

    /// Analyze one media asset.
    ///
    /// `content_type` is forwarded upstream as declared, defaulting to
    /// `application/octet-stream`.
    async fn analyze(&self, payload: &[u8], content_type: Option<&str>) -> Result<AnalyzeResult>;
}
