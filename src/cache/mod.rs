//! Caching subsystem.
//!
//! [`response::ResponseCache`] memoizes normalized detector results keyed
//! on a content digest of the uploaded bytes. It is enabled per provider
//! (on by default for providers whose calls are expensive or tightly
//! rate limited) through [`Settings::cache`](crate::Settings::cache).
//! State lives in memory only and resets on restart.

pub mod response;

pub use response::{CacheConfig, ResponseCache, content_digest};
