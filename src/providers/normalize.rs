//! Tolerant mapping from provider JSON to [`AnalyzeResult`].
//!
//! Providers evolve their response shapes on their own schedule, so the
//! normalizer never fails: it looks for a nested `result` object (falling
//! back to the top level), then resolves each attribute from the
//! provider's [`FieldTable`], first usable candidate wins.
//!
//! A candidate is usable when it is present, non-null and meaningful for
//! its attribute: non-blank strings for label and model version, numbers
//! (or numeric strings) for the score, non-empty lists (or a single
//! non-blank string) for reasons.

use serde_json::Value;

use super::profile::FieldTable;
use crate::types::{AnalyzeResult, UNKNOWN};

/// Normalize an upstream payload using the given candidate table.
pub fn normalize(payload: &Value, fields: &FieldTable) -> AnalyzeResult {
    let source = match payload.get("result") {
        Some(nested @ Value::Object(_)) => nested,
        _ => payload,
    };

    let label = first_usable(source, fields.label, as_text).unwrap_or_else(|| UNKNOWN.into());
    let score = first_usable(source, fields.score, as_score).unwrap_or(0.0);
    let reasons = first_usable(source, fields.reasons, as_reasons).unwrap_or_default();
    let model_version =
        first_usable(source, fields.model_version, as_text).unwrap_or_else(|| UNKNOWN.into());

    AnalyzeResult::new(label, score, reasons, model_version)
}

fn first_usable<T>(
    source: &Value,
    candidates: &[&str],
    extract: fn(&Value) -> Option<T>,
) -> Option<T> {
    candidates
        .iter()
        .filter_map(|name| source.get(name))
        .find_map(extract)
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_score(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_reasons(value: &Value) -> Option<Vec<String>> {
    let reasons: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s.clone()],
        _ => return None,
    };
    (!reasons.is_empty()).then_some(reasons)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::providers::profile::{REALITY_DEFENDER, SENSITY};

    #[test]
    fn nested_result_with_defaults() {
        let result = normalize(
            &json!({"result": {"label": "fake", "score": 0.9}}),
            &SENSITY.fields,
        );
        assert_eq!(result.label, "fake");
        assert_eq!(result.score, 0.9);
        assert!(result.reasons.is_empty());
        assert_eq!(result.model_version, "unknown");
    }

    #[test]
    fn top_level_alternate_names() {
        let result = normalize(
            &json!({"verdict": "real", "confidence": 0.3, "model_version": "v9"}),
            &REALITY_DEFENDER.fields,
        );
        assert_eq!(result.label, "real");
        assert_eq!(result.score, 0.3);
        assert_eq!(result.model_version, "v9");
    }

    #[test]
    fn primary_name_beats_alternate() {
        let result = normalize(
            &json!({"label": "fake", "verdict": "real", "modelVersion": "a", "model_version": "b"}),
            &SENSITY.fields,
        );
        assert_eq!(result.label, "fake");
        assert_eq!(result.model_version, "a");
    }

    #[test]
    fn provider_specific_alternates() {
        let payload = json!({
            "notes": ["noise"],
            "explanations": ["eyes"],
            "model": "sense-3",
        });
        let rd = normalize(&payload, &REALITY_DEFENDER.fields);
        assert_eq!(rd.reasons, vec!["noise"]);
        assert_eq!(rd.model_version, "unknown");

        let sensity = normalize(&payload, &SENSITY.fields);
        assert_eq!(sensity.reasons, vec!["eyes"]);
        assert_eq!(sensity.model_version, "sense-3");
    }

    #[test]
    fn null_and_blank_values_fall_through() {
        let result = normalize(
            &json!({
                "label": null,
                "verdict": "manipulated",
                "modelVersion": "  ",
                "model_version": "rd-2",
            }),
            &REALITY_DEFENDER.fields,
        );
        assert_eq!(result.label, "manipulated");
        assert_eq!(result.model_version, "rd-2");
    }

    #[test]
    fn zero_score_is_kept() {
        let result = normalize(&json!({"score": 0, "confidence": 0.8}), &SENSITY.fields);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn numeric_string_score_is_parsed_and_clamped() {
        assert_eq!(normalize(&json!({"score": "0.42"}), &SENSITY.fields).score, 0.42);
        assert_eq!(normalize(&json!({"score": 7}), &SENSITY.fields).score, 1.0);
        assert_eq!(normalize(&json!({"score": "high"}), &SENSITY.fields).score, 0.0);
    }

    #[test]
    fn reasons_skip_non_text_items() {
        let result = normalize(
            &json!({"reasons": ["lips", null, {"k": 1}, 3, ""]}),
            &SENSITY.fields,
        );
        assert_eq!(result.reasons, vec!["lips", "3"]);
    }

    #[test]
    fn single_string_reason_is_wrapped() {
        let result = normalize(&json!({"reasons": "blending"}), &SENSITY.fields);
        assert_eq!(result.reasons, vec!["blending"]);
    }

    #[test]
    fn non_object_result_is_ignored() {
        let result = normalize(&json!({"result": "pending", "label": "real"}), &SENSITY.fields);
        assert_eq!(result.label, "real");
    }

    #[test]
    fn non_object_payloads_yield_defaults() {
        for payload in [json!(null), json!([1, 2]), json!("fake"), json!(3.5)] {
            assert_eq!(normalize(&payload, &SENSITY.fields), AnalyzeResult::default());
        }
    }
}
