//! Layered extraction of a JSON object from noisy model output.
//!
//! The model is not contractually guaranteed to emit clean JSON: it wraps
//! objects in prose or markdown fences and truncates near the output-token
//! budget. Recovery is an ordered list of pure text transforms; each is
//! attempted only when the previous parse failed, and the first transform
//! whose output parses as an object wins.

use serde_json::Value;

use super::error::AnalysisError;

/// Candidate transforms, in order. `None` means the transform does not
/// apply to this text and the attempt is skipped.
const TRANSFORMS: &[(&str, fn(&str) -> Option<String>)] = &[
    ("direct", |raw| Some(raw.to_string())),
    ("strip-fences", strip_code_fences),
    ("brace-span", brace_span),
    ("repair", repaired_span),
];

/// Extract a JSON object from raw model text.
pub fn extract_object(text: &str) -> Result<Value, AnalysisError> {
    let raw = text.trim();
    if raw.is_empty() {
        tracing::warn!("empty model response");
        return Err(AnalysisError::ParseFailure);
    }

    for (name, transform) in TRANSFORMS {
        let Some(candidate) = transform(raw) else {
            continue;
        };
        match serde_json::from_str::<Value>(&candidate) {
            Ok(value @ Value::Object(_)) => {
                if *name != "direct" {
                    tracing::debug!(strategy = name, "recovered JSON object");
                }
                return Ok(value);
            }
            Ok(_) => continue, // parsed, but not an object
            Err(err) => {
                tracing::trace!(strategy = name, error = %err, "parse attempt failed");
            }
        }
    }

    tracing::warn!(
        response_chars = raw.chars().count(),
        "all parse strategies exhausted"
    );
    Err(AnalysisError::ParseFailure)
}

/// Drop leading/trailing markdown fences, with an optional language tag on
/// the opening fence. Returns `None` when no fence is present.
fn strip_code_fences(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    let had_leading = trimmed.starts_with("```");
    let had_trailing = trimmed.ends_with("```") && trimmed.len() > 3;
    if !had_leading && !had_trailing {
        return None;
    }

    let mut body = trimmed;
    if had_leading {
        body = &body[3..];
        if let Some((tag, rest)) = body.split_once('\n') {
            if tag.trim().chars().all(|c| c.is_ascii_alphanumeric()) {
                body = rest;
            }
        }
    }
    if had_trailing && body.ends_with("```") {
        body = &body[..body.len() - 3];
    }
    Some(body.trim().to_string())
}

/// The span from the first `{` to the last `}`, greedy. Catches objects
/// wrapped in prose.
fn brace_span(raw: &str) -> Option<String> {
    let base = strip_code_fences(raw).unwrap_or_else(|| raw.to_string());
    let start = base.find('{')?;
    let end = base.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(base[start..=end].to_string())
}

/// Truncation repair: take everything from the first `{`, strip a trailing
/// comma, and close still-open delimiters in the order needed to balance.
fn repaired_span(raw: &str) -> Option<String> {
    let base = strip_code_fences(raw).unwrap_or_else(|| raw.to_string());
    let start = base.find('{')?;
    Some(repair_delimiters(&base[start..]))
}

fn repair_delimiters(span: &str) -> String {
    let mut open_stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for ch in span.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' | '[' => open_stack.push(ch),
            '}' => {
                if open_stack.last() == Some(&'{') {
                    open_stack.pop();
                }
            }
            ']' => {
                if open_stack.last() == Some(&'[') {
                    open_stack.pop();
                }
            }
            _ => {}
        }
    }

    let mut fixed = span.trim_end().to_string();
    if !in_string {
        if let Some(rest) = fixed.strip_suffix(',') {
            fixed = rest.trim_end().to_string();
        }
    }
    for open in open_stack.iter().rev() {
        fixed.push(if *open == '{' { '}' } else { ']' });
    }
    fixed
}
