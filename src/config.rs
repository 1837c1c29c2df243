//! Gateway settings and configuration loading.
//!
//! [`Settings`] is the immutable per-gateway configuration. It is built in
//! three layers, later layers winning:
//!
//! 1. Provider defaults ([`Settings::for_provider`])
//! 2. An optional TOML file ([`Config::load`]), one `[providers.<name>]`
//!    table per provider
//! 3. Environment variables prefixed with the provider's `env_prefix`
//!    (`READEF_*`, `SENSITY_*`)
//!
//! API keys are only ever read from the environment, never from the file.
//!
//! Config file resolution order:
//! 1. `--config <path>` (CLI flag, must exist)
//! 2. `~/.detector-gateway/config.toml` (user)
//! 3. `/etc/detector-gateway/config.toml` (system)
//!
//! With no explicit path and no file in the standard locations, an empty
//! config is used.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::Instant;

use crate::cache::CacheConfig;
use crate::providers::{BreakerConfig, ProviderKind, ProviderProfile, RetryPolicy};
use crate::{DetectorError, Result};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_FACTOR: f64 = 0.5;

/// Immutable configuration for one detector gateway.
#[derive(Clone, PartialEq)]
pub struct Settings {
    pub provider: ProviderKind,
    pub api_key: String,
    pub base_url: String,
    /// Per-attempt HTTP timeout.
    pub timeout: Duration,
    /// Total attempts per `analyze` call (≥ 1).
    pub max_retries: u32,
    /// Linear backoff step, in seconds (≥ 0).
    pub backoff_factor: f64,
    pub failure_threshold: u32,
    pub recovery: Duration,
    /// Response cache settings; `None` disables caching.
    pub cache: Option<CacheConfig>,
}

impl Settings {
    /// Provider defaults with an empty API key.
    pub fn for_provider(provider: ProviderKind) -> Self {
        let profile = provider.profile();
        let breaker = BreakerConfig::default();
        Self {
            provider,
            api_key: String::new(),
            base_url: profile.default_base_url.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
            failure_threshold: breaker.failure_threshold,
            recovery: breaker.recovery,
            cache: profile.caches_responses.then(CacheConfig::default),
        }
    }

    /// Provider defaults overridden by the process environment.
    pub fn from_env(provider: ProviderKind) -> Result<Self> {
        let settings = Self::for_provider(provider).apply_env(|key| std::env::var(key).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Apply `<PREFIX>_*` overrides read through `lookup`.
    ///
    /// Recognised suffixes: `API_KEY`, `BASE_URL`, `TIMEOUT` (seconds),
    /// `MAX_RETRIES`, `BACKOFF` (seconds), `FAILURE_THRESHOLD`,
    /// `RECOVERY_SECONDS`, `CACHE_TTL` (seconds), `CACHE_SIZE`.
    /// Cache overrides enable the cache for providers that default to none.
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let prefix = self.profile().env_prefix;
        let var = |suffix: &str| {
            let key = format!("{prefix}_{suffix}");
            lookup(&key).map(|value| (key, value))
        };

        if let Some((_, key)) = var("API_KEY") {
            self.api_key = key;
        }
        if let Some((_, url)) = var("BASE_URL") {
            self.base_url = url;
        }
        if let Some(secs) = parse_var::<f64>(var("TIMEOUT"))? {
            self.timeout = secs_to_duration("TIMEOUT", secs)?;
        }
        if let Some(n) = parse_var(var("MAX_RETRIES"))? {
            self.max_retries = n;
        }
        if let Some(factor) = parse_var(var("BACKOFF"))? {
            self.backoff_factor = factor;
        }
        if let Some(n) = parse_var(var("FAILURE_THRESHOLD"))? {
            self.failure_threshold = n;
        }
        if let Some(secs) = parse_var::<f64>(var("RECOVERY_SECONDS"))? {
            self.recovery = secs_to_duration("RECOVERY_SECONDS", secs)?;
        }
        let ttl = parse_var::<u64>(var("CACHE_TTL"))?;
        let size = parse_var::<usize>(var("CACHE_SIZE"))?;
        if ttl.is_some() || size.is_some() {
            let mut cache = self.cache.take().unwrap_or_default();
            if let Some(ttl) = ttl {
                cache.ttl = Duration::from_secs(ttl);
            }
            if let Some(size) = size {
                cache.max_entries = size;
            }
            self.cache = Some(cache);
        }
        Ok(self)
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = key.into();
        self
    }

    /// Set the provider base URL (trailing slashes are ignored).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the per-attempt HTTP timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the total attempts per call.
    pub fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = n;
        self
    }

    /// Set the linear backoff step, in seconds.
    pub fn backoff_factor(mut self, secs: f64) -> Self {
        self.backoff_factor = secs;
        self
    }

    /// Set the consecutive failures that open the breaker.
    pub fn failure_threshold(mut self, n: u32) -> Self {
        self.failure_threshold = n;
        self
    }

    /// Set how long the breaker stays open.
    pub fn recovery(mut self, recovery: Duration) -> Self {
        self.recovery = recovery;
        self
    }

    /// Enable the response cache with the given settings.
    pub fn cache(mut self, config: CacheConfig) -> Self {
        self.cache = Some(config);
        self
    }

    /// Disable the response cache.
    pub fn without_cache(mut self) -> Self {
        self.cache = None;
        self
    }

    /// Static wire details of the configured provider.
    pub fn profile(&self) -> &'static ProviderProfile {
        self.provider.profile()
    }

    /// Full URL of the provider's analysis endpoint.
    pub fn endpoint(&self) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.profile().path
        )
    }

    /// Retry policy derived from `max_retries` and `backoff_factor`.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new()
            .max_attempts(self.max_retries)
            .backoff(backoff_step(self.backoff_factor))
    }

    /// Breaker tuning derived from the threshold and recovery window.
    pub fn breaker_config(&self) -> BreakerConfig {
        BreakerConfig::new()
            .failure_threshold(self.failure_threshold)
            .recovery(self.recovery)
    }

    /// Check bounds. Called by the gateway before it is built.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| {
            Err(DetectorError::Configuration(format!(
                "{}: {msg}",
                self.provider
            )))
        };
        if self.api_key.trim().is_empty() {
            return invalid("API key is not set");
        }
        if self.base_url.trim().is_empty() {
            return invalid("base URL is empty");
        }
        if self.max_retries == 0 {
            return invalid("max_retries must be at least 1");
        }
        // Also rejects negative, non-finite and out-of-range values.
        if Duration::try_from_secs_f64(self.backoff_factor).is_err() {
            return invalid("backoff factor must be a non-negative number of seconds");
        }
        if self.failure_threshold == 0 {
            return invalid("failure threshold must be at least 1");
        }
        if self.timeout.is_zero() {
            return invalid("timeout must be positive");
        }
        if !fits_deadline(self.timeout) {
            return invalid("timeout is too large");
        }
        if let Some(cache) = &self.cache {
            if cache.max_entries == 0 {
                return invalid("cache size must be at least 1");
            }
            if !fits_deadline(cache.ttl) {
                return invalid("cache TTL is too large");
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("backoff_factor", &self.backoff_factor)
            .field("failure_threshold", &self.failure_threshold)
            .field("recovery", &self.recovery)
            .field("cache", &self.cache)
            .finish()
    }
}

fn parse_var<T: FromStr>(var: Option<(String, String)>) -> Result<Option<T>>
where
    T::Err: fmt::Display,
{
    var.map(|(key, value)| {
        value.trim().parse().map_err(|e| {
            DetectorError::Configuration(format!("invalid value {value:?} for {key}: {e}"))
        })
    })
    .transpose()
}

fn backoff_step(secs: f64) -> Duration {
    if secs > 0.0 {
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    } else {
        Duration::ZERO
    }
}

/// Whether `now + d` is representable, so deadlines built from it cannot overflow.
fn fits_deadline(d: Duration) -> bool {
    Instant::now().checked_add(d).is_some()
}

fn secs_to_duration(name: &str, secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .map_err(|e| DetectorError::Configuration(format!("invalid {name} {secs}: {e}")))
}

/// File configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub providers: ProvidersConfig,
}

/// Per-provider file overrides.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ProvidersConfig {
    #[serde(default)]
    pub reality_defender: Option<ProviderConfig>,
    #[serde(default)]
    pub sensity: Option<ProviderConfig>,
}

/// Optional overrides for one provider. Unset fields keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<f64>,
    #[serde(default)]
    pub max_retries: Option<u32>,
    #[serde(default)]
    pub backoff_factor: Option<f64>,
    #[serde(default)]
    pub failure_threshold: Option<u32>,
    #[serde(default)]
    pub recovery_secs: Option<f64>,
    /// Force the response cache on or off.
    #[serde(default)]
    pub cache: Option<bool>,
    #[serde(default)]
    pub cache_ttl_secs: Option<u64>,
    #[serde(default)]
    pub cache_max_entries: Option<usize>,
}

impl ProviderConfig {
    fn apply(&self, mut settings: Settings) -> Result<Settings> {
        if let Some(url) = &self.base_url {
            settings.base_url = url.clone();
        }
        if let Some(secs) = self.timeout_secs {
            settings.timeout = secs_to_duration("timeout_secs", secs)?;
        }
        if let Some(n) = self.max_retries {
            settings.max_retries = n;
        }
        if let Some(factor) = self.backoff_factor {
            settings.backoff_factor = factor;
        }
        if let Some(n) = self.failure_threshold {
            settings.failure_threshold = n;
        }
        if let Some(secs) = self.recovery_secs {
            settings.recovery = secs_to_duration("recovery_secs", secs)?;
        }

        let wants_cache = self.cache.unwrap_or(
            settings.cache.is_some()
                || self.cache_ttl_secs.is_some()
                || self.cache_max_entries.is_some(),
        );
        settings.cache = if wants_cache {
            let mut cache = settings.cache.take().unwrap_or_default();
            if let Some(ttl) = self.cache_ttl_secs {
                cache.ttl = Duration::from_secs(ttl);
            }
            if let Some(n) = self.cache_max_entries {
                cache.max_entries = n;
            }
            Some(cache)
        } else {
            None
        };
        Ok(settings)
    }
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided; must exist)
    /// 2. `~/.detector-gateway/config.toml`
    /// 3. `/etc/detector-gateway/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            DetectorError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            DetectorError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(DetectorError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".detector-gateway").join("config.toml");
            if user_config.exists() {
                return Ok(Some(user_config));
            }
        }

        let system_config = PathBuf::from("/etc/detector-gateway/config.toml");
        if system_config.exists() {
            return Ok(Some(system_config));
        }

        Ok(None)
    }

    /// File overrides for a provider, if any.
    pub fn provider(&self, kind: ProviderKind) -> Option<&ProviderConfig> {
        match kind {
            ProviderKind::RealityDefender => self.providers.reality_defender.as_ref(),
            ProviderKind::Sensity => self.providers.sensity.as_ref(),
        }
    }

    /// Resolve settings for a provider: defaults, then file, then `lookup`.
    pub fn settings_with<F>(&self, kind: ProviderKind, lookup: F) -> Result<Settings>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Settings::for_provider(kind);
        if let Some(overrides) = self.provider(kind) {
            settings = overrides.apply(settings)?;
        }
        let settings = settings.apply_env(lookup)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Resolve settings for a provider using the process environment.
    pub fn settings(&self, kind: ProviderKind) -> Result<Settings> {
        self.settings_with(kind, |key| std::env::var(key).ok())
    }
}
