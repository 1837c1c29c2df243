//! Building blocks shared by every detector provider.
//!
//! - [`profile`]: per-provider wire details and response field tables
//! - [`normalize`]: tolerant JSON → [`AnalyzeResult`](crate::AnalyzeResult) mapping
//! - [`breaker`]: circuit breaker gating upstream calls
//! - [`retry`]: linear-backoff retry policy and loop

pub mod breaker;
pub mod normalize;
pub mod profile;
pub mod retry;

pub use breaker::{BreakerConfig, BreakerSnapshot, CircuitBreaker, CircuitState, Transition};
pub use normalize::normalize;
pub use profile::{
    AuthScheme, FieldTable, ProviderKind, ProviderProfile, REALITY_DEFENDER, SENSITY,
};
pub use retry::RetryPolicy;
