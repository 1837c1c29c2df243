//! Canonical analysis result

use serde::{Deserialize, Serialize};

/// Placeholder used for missing label and model version fields.
pub const UNKNOWN: &str = "unknown";

/// Normalized verdict returned by every detector, regardless of provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeResult {
    pub label: String,
    /// Confidence in `[0.0, 1.0]`.
    pub score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
    pub model_version: String,
}

impl AnalyzeResult {
    /// Create a result, clamping `score` into `[0.0, 1.0]`.
    ///
    /// Non-finite scores become `0.0`.
    pub fn new(
        label: impl Into<String>,
        score: f64,
        reasons: Vec<String>,
        model_version: impl Into<String>,
    ) -> Self {
        Self {
            label: label.into(),
            score: clamp_score(score),
            reasons,
            model_version: model_version.into(),
        }
    }
}

impl Default for AnalyzeResult {
    fn default() -> Self {
        Self {
            label: UNKNOWN.to_string(),
            score: 0.0,
            reasons: Vec::new(),
            model_version: UNKNOWN.to_string(),
        }
    }
}

pub(crate) fn clamp_score(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_model_version() {
        let result = AnalyzeResult::new("real", 0.1, vec!["lighting".into()], "rd-1");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "label": "real",
                "score": 0.1,
                "reasons": ["lighting"],
                "modelVersion": "rd-1",
            })
        );
    }

    #[test]
    fn score_is_clamped() {
        assert_eq!(AnalyzeResult::new("x", 1.7, vec![], "v").score, 1.0);
        assert_eq!(AnalyzeResult::new("x", -0.2, vec![], "v").score, 0.0);
        assert_eq!(AnalyzeResult::new("x", f64::NAN, vec![], "v").score, 0.0);
    }

    #[test]
    fn default_is_unknown() {
        let result = AnalyzeResult::default();
        assert_eq!(result.label, "unknown");
        assert_eq!(result.model_version, "unknown");
        assert!(result.reasons.is_empty());
    }
}
