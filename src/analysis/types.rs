//! Result types returned to the controller, with defensive normalization.
//!
//! The upstream payload is model-generated JSON: any field can be missing
//! or mistyped. Each field is normalized independently; a bad field falls
//! back to its default and never aborts normalization of the rest.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How many strengths survive normalization.
pub const MAX_STRENGTHS: usize = 5;
/// How many improvements survive normalization.
pub const MAX_IMPROVEMENTS: usize = 3;

/// The three billable operations. Part of the cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Analyze,
    Tailor,
    Rewrite,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            OperationKind::Analyze => "analyze",
            OperationKind::Tailor => "tailor",
            OperationKind::Rewrite => "rewrite",
        }
    }
}

/// Base resume analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// ATS score clamped to 0..=100.
    pub score: u8,
    pub summary: String,
    pub strengths: Vec<String>,
    pub improvements: Vec<Improvement>,
    pub missing_keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Improvement {
    pub title: String,
    pub why: String,
    pub how: String,
}

/// Resume-vs-job tailoring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TailorResult {
    /// Fit score clamped to 0..=100.
    pub fit_score: u8,
    pub missing_keywords: Vec<String>,
    pub quick_fixes: Vec<String>,
    pub rewritten_bullets: Vec<RewrittenBullet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewrittenBullet {
    pub before: String,
    pub after: String,
}

impl AnalysisResult {
    /// Normalize an extracted JSON object into a strictly-typed result.
    pub fn from_value(obj: &Value) -> Self {
        Self {
            score: clamped_score(obj.get("ats_score")),
            summary: string_field(obj.get("summary")),
            strengths: string_list(obj.get("strengths"), Some(MAX_STRENGTHS)),
            improvements: improvement_list(obj.get("improvements")),
            missing_keywords: string_list(obj.get("missing_keywords"), None),
        }
    }
}

impl TailorResult {
    pub fn from_value(obj: &Value) -> Self {
        Self {
            fit_score: clamped_score(obj.get("fit_score")),
            missing_keywords: string_list(obj.get("missing_keywords"), None),
            quick_fixes: string_list(obj.get("quick_fixes"), None),
            rewritten_bullets: bullet_list(obj.get("rewritten_bullets")),
        }
    }
}

/// Integer score clamped to 0..=100. Accepts integer or float payloads;
/// anything else scores 0.
fn clamped_score(value: Option<&Value>) -> u8 {
    let raw = match value {
        Some(v) => v
            .as_i64()
            .or_else(|| v.as_f64().map(|f| f.round() as i64))
            .unwrap_or(0),
        None => 0,
    };
    raw.clamp(0, 100) as u8
}

fn string_field(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

/// A list of strings. Scalar non-strings are coerced; objects, arrays, and
/// empties are dropped. A non-list payload yields an empty list.
fn string_list(value: Option<&Value>, cap: Option<usize>) -> Vec<String> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    let coerced = items.iter().filter_map(coerce_scalar);
    match cap {
        Some(n) => coerced.take(n).collect(),
        None => coerced.collect(),
    }
}

fn coerce_scalar(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn improvement_list(value: Option<&Value>) -> Vec<Improvement> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::Object(_) => Some(Improvement {
                title: string_field(item.get("title")),
                why: string_field(item.get("why")),
                how: string_field(item.get("how")),
            }),
            // models sometimes flatten improvements to bare strings
            Value::String(s) if !s.trim().is_empty() => Some(Improvement {
                title: s.trim().to_string(),
                why: String::new(),
                how: String::new(),
            }),
            _ => None,
        })
        .take(MAX_IMPROVEMENTS)
        .collect()
}

fn bullet_list(value: Option<&Value>) -> Vec<RewrittenBullet> {
    let Some(items) = value.and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| {
            item.as_object().map(|_| RewrittenBullet {
                before: string_field(item.get("before")),
                after: string_field(item.get("after")),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn score_clamps_high_and_low() {
        assert_eq!(clamped_score(Some(&json!(150))), 100);
        assert_eq!(clamped_score(Some(&json!(-5))), 0);
        assert_eq!(clamped_score(Some(&json!(70))), 70);
        assert_eq!(clamped_score(Some(&json!(71.6))), 72);
    }

    #[test]
    fn score_defaults_to_zero_on_bad_payload() {
        assert_eq!(clamped_score(None), 0);
        assert_eq!(clamped_score(Some(&json!("seventy"))), 0);
        assert_eq!(clamped_score(Some(&json!(null))), 0);
    }

    #[test]
    fn analysis_normalizes_complete_payload() {
        let obj = json!({
            "ats_score": 82,
            "summary": "  Solid backend resume.  ",
            "strengths": ["Rust", "Kubernetes", "Mentoring"],
            "improvements": [
                {"title": "Add metrics", "why": "Impact is invisible", "how": "Quantify results"},
            ],
            "missing_keywords": ["gRPC", "Terraform"],
        });

        let result = AnalysisResult::from_value(&obj);
        assert_eq!(result.score, 82);
        assert_eq!(result.summary, "Solid backend resume.");
        assert_eq!(result.strengths.len(), 3);
        assert_eq!(result.improvements[0].title, "Add metrics");
        assert_eq!(result.missing_keywords, vec!["gRPC", "Terraform"]);
    }

    #[test]
    fn mistyped_fields_default_without_aborting_the_rest() {
        let obj = json!({
            "ats_score": 90,
            "summary": 12,
            "strengths": "not a list",
            "improvements": {"title": "not a list"},
            "missing_keywords": null,
        });

        let result = AnalysisResult::from_value(&obj);
        assert_eq!(result.score, 90);
        assert!(result.summary.is_empty());
        assert!(result.strengths.is_empty());
        assert!(result.improvements.is_empty());
        assert!(result.missing_keywords.is_empty());
    }

    #[test]
    fn strengths_capped_at_five_improvements_at_three() {
        let obj = json!({
            "strengths": ["a", "b", "c", "d", "e", "f", "g"],
            "improvements": [
                {"title": "1"}, {"title": "2"}, {"title": "3"}, {"title": "4"},
            ],
        });

        let result = AnalysisResult::from_value(&obj);
        assert_eq!(result.strengths.len(), MAX_STRENGTHS);
        assert_eq!(result.improvements.len(), MAX_IMPROVEMENTS);
    }

    #[test]
    fn scalar_list_items_are_coerced_and_junk_dropped() {
        let obj = json!({
            "strengths": [7, true, "real", "", {"nested": 1}, ["list"]],
        });
        let result = AnalysisResult::from_value(&obj);
        assert_eq!(result.strengths, vec!["7", "true", "real"]);
    }

    #[test]
    fn string_improvements_are_accepted() {
        let obj = json!({"improvements": ["Tighten the summary", "  "]});
        let result = AnalysisResult::from_value(&obj);
        assert_eq!(result.improvements.len(), 1);
        assert_eq!(result.improvements[0].title, "Tighten the summary");
        assert!(result.improvements[0].why.is_empty());
    }

    #[test]
    fn tailor_normalizes_payload() {
        let obj = json!({
            "fit_score": 130,
            "missing_keywords": ["SQL"],
            "quick_fixes": ["Reorder sections"],
            "rewritten_bullets": [
                {"before": "did stuff", "after": "Cut deploy time 40%"},
                "not an object",
            ],
        });

        let result = TailorResult::from_value(&obj);
        assert_eq!(result.fit_score, 100);
        assert_eq!(result.quick_fixes, vec!["Reorder sections"]);
        assert_eq!(result.rewritten_bullets.len(), 1);
        assert_eq!(result.rewritten_bullets[0].after, "Cut deploy time 40%");
    }

    #[test]
    fn empty_object_yields_all_defaults() {
        let result = TailorResult::from_value(&json!({}));
        assert_eq!(result.fit_score, 0);
        assert!(result.missing_keywords.is_empty());
        assert!(result.quick_fixes.is_empty());
        assert!(result.rewritten_bullets.is_empty());
    }
}
