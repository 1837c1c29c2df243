//! Per-provider wire details.
//!
//! Every upstream speaks the same request body but differs in endpoint
//! path, auth header, default settings and the field names of its
//! response. A [`ProviderProfile`] captures all of that as data, so
//! supporting another provider means adding one more profile (and its
//! [`FieldTable`]) rather than another code path.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DetectorError;

/// How the API key is attached to outbound requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// Raw key in a dedicated header (lowercase header name).
    Header(&'static str),
    /// `Authorization: Bearer <key>`.
    Bearer,
}

impl AuthScheme {
    /// Header name and value for the given key.
    pub fn header(&self, api_key: &str) -> (&'static str, String) {
        match self {
            Self::Header(name) => (name, api_key.to_string()),
            Self::Bearer => ("authorization", format!("Bearer {api_key}")),
        }
    }
}

/// Ordered candidate field names for each normalized attribute.
///
/// Candidates are tried front to back; the first usable value wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldTable {
    pub label: &'static [&'static str],
    pub score: &'static [&'static str],
    pub reasons: &'static [&'static str],
    pub model_version: &'static [&'static str],
}

/// Static description of one upstream detection API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderProfile {
    /// Stable identifier used in logs, metrics and config.
    pub name: &'static str,
    /// Path appended to the base URL for analysis requests.
    pub path: &'static str,
    pub auth: AuthScheme,
    pub fields: FieldTable,
    /// Prefix for environment variables (`<PREFIX>_API_KEY`, ...).
    pub env_prefix: &'static str,
    pub default_base_url: &'static str,
    /// Whether the response cache is enabled unless configured otherwise.
    pub caches_responses: bool,
}

pub static REALITY_DEFENDER: ProviderProfile = ProviderProfile {
    name: "reality-defender",
    path: "/deepfake",
    auth: AuthScheme::Header("x-api-key"),
    fields: FieldTable {
        label: &["label", "verdict"],
        score: &["score", "confidence"],
        reasons: &["reasons", "notes"],
        model_version: &["modelVersion", "model_version"],
    },
    env_prefix: "READEF",
    default_base_url: "https://api.realitydefender.com/v1",
    caches_responses: false,
};

pub static SENSITY: ProviderProfile = ProviderProfile {
    name: "sensity",
    path: "/deepfake-detection",
    auth: AuthScheme::Bearer,
    fields: FieldTable {
        label: &["label", "verdict"],
        score: &["score", "confidence"],
        reasons: &["reasons", "explanations"],
        model_version: &["modelVersion", "model_version", "model"],
    },
    env_prefix: "SENSITY",
    default_base_url: "https://api.sensity.ai/v2",
    caches_responses: true,
};

/// Supported upstream providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ProviderKind {
    RealityDefender,
    Sensity,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 2] = [ProviderKind::RealityDefender, ProviderKind::Sensity];

    /// Static wire details for this provider.
    pub fn profile(self) -> &'static ProviderProfile {
        match self {
            Self::RealityDefender => &REALITY_DEFENDER,
            Self::Sensity => &SENSITY,
        }
    }

    /// Stable provider identifier.
    pub fn name(self) -> &'static str {
        self.profile().name
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProviderKind {
    type Err = DetectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == s)
            .ok_or_else(|| DetectorError::Configuration(format!("unknown provider: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_headers() {
        assert_eq!(
            REALITY_DEFENDER.auth.header("k"),
            ("x-api-key", "k".to_string())
        );
        assert_eq!(
            SENSITY.auth.header("k"),
            ("authorization", "Bearer k".to_string())
        );
    }

    #[test]
    fn kind_round_trips_through_name() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.name().parse::<ProviderKind>().unwrap(), kind);
        }
        assert!("hive".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn only_sensity_caches_by_default() {
        assert!(!ProviderKind::RealityDefender.profile().caches_responses);
        assert!(ProviderKind::Sensity.profile().caches_responses);
    }
}
