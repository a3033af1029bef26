//! Google Gemini `generateContent` client.
//!
//! Retry policy: up to [`MAX_ATTEMPTS`] attempts. A 429 whose body marks
//! quota exhaustion fails immediately; any other 429 waits a flat 60 s.
//! Every other HTTP error and network error burns through the fixed
//! [`BACKOFF_MS`] schedule before surfacing a generic failure. Responses
//! are validated before the text is returned: the candidate envelope must
//! be present and must not be cut at the token budget.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::sanitize_api_error;
use super::traits::TextGenerator;
use crate::analysis::error::AnalysisError;
use crate::config::GeminiConfig;

/// Total attempts per call, first try included.
const MAX_ATTEMPTS: usize = 3;
/// Fixed waits between attempts. Not exponential: the schedule already
/// outlasts most transient upstream blips.
const BACKOFF_MS: [u64; 3] = [700, 1500, 3000];
/// Flat wait after a transient 429 before the next attempt.
const RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

// ── API request/response types ────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    temperature: f64,
    #[serde(rename = "topP")]
    top_p: f64,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

/// All four harm categories relaxed: resumes legitimately discuss topics
/// (security work, law enforcement, medical roles) that default thresholds
/// intercept.
const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
    #[serde(rename = "finishReason", default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<ResponsePart>>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

// ── Client ────────────────────────────────────────────────────────────────

pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
    top_p: f64,
}

impl GeminiClient {
    /// Build a client over the shared HTTP client. Fails when no API key is
    /// configured (config file or `GEMINI_API_KEY`/`GOOGLE_API_KEY` env,
    /// resolved at config load).
    pub fn new(client: Client, config: &GeminiConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Gemini API key not found. Set GEMINI_API_KEY, or api_key under [gemini] \
                     in the config file. Keys: https://aistudio.google.com/app/apikey"
                )
            })?
            .to_string();

        Ok(Self {
            client,
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            top_p: config.top_p,
        })
    }

    fn generate_content_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn build_request(&self, prompt: &str, max_output_tokens: u32) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens,
                temperature: self.temperature,
                top_p: self.top_p,
            },
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_NONE",
                })
                .collect(),
        }
    }

    async fn attempt(
        &self,
        request: &GenerateContentRequest,
    ) -> Result<reqwest::Response, reqwest::Error> {
        self.client
            .post(self.generate_content_url())
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(
        &self,
        prompt: &str,
        max_output_tokens: u32,
    ) -> Result<String, AnalysisError> {
        let request = self.build_request(prompt, max_output_tokens);

        for attempt in 0..MAX_ATTEMPTS {
            let last_attempt = attempt + 1 == MAX_ATTEMPTS;

            let response = match self.attempt(&request).await {
                Ok(response) => response,
                Err(err) => {
                    tracing::warn!(attempt, error = %err, "Gemini request failed before a response");
                    if last_attempt {
                        return Err(AnalysisError::UpstreamFailure);
                    }
                    tokio::time::sleep(Duration::from_millis(BACKOFF_MS[attempt])).await;
                    continue;
                }
            };

            let status = response.status();
            if status.is_success() {
                let body = response.text().await.map_err(|err| {
                    tracing::warn!(error = %err, "failed to read Gemini response body");
                    AnalysisError::UpstreamFailure
                })?;
                return parse_success_body(&body);
            }

            let body = response.text().await.unwrap_or_default();

            if status == StatusCode::TOO_MANY_REQUESTS {
                if body_marks_quota_exhaustion(&body) {
                    tracing::error!(
                        body = %sanitize_api_error(&body),
                        "Gemini quota exhausted; check the API key's tier and daily limits"
                    );
                    return Err(AnalysisError::QuotaExhaustedUpstream);
                }
                if last_attempt {
                    return Err(AnalysisError::RateLimited);
                }
                tracing::warn!(
                    attempt,
                    wait_secs = RATE_LIMIT_WAIT.as_secs(),
                    "Gemini rate limited, waiting before retry"
                );
                tokio::time::sleep(RATE_LIMIT_WAIT).await;
                continue;
            }

            // Everything else burns through the retry budget with the
            // fixed backoff schedule before surfacing a generic failure.
            if is_transient_status(status) {
                tracing::warn!(
                    attempt,
                    status = %status,
                    body = %sanitize_api_error(&body),
                    "transient Gemini error"
                );
            } else {
                tracing::error!(
                    attempt,
                    status = %status,
                    body = %sanitize_api_error(&body),
                    "unexpected Gemini error"
                );
            }
            if last_attempt {
                return Err(AnalysisError::UpstreamFailure);
            }
            tokio::time::sleep(Duration::from_millis(BACKOFF_MS[attempt])).await;
        }

        Err(AnalysisError::UpstreamFailure)
    }
}

// ── Response validation ───────────────────────────────────────────────────

fn parse_success_body(body: &str) -> Result<String, AnalysisError> {
    if body.trim().is_empty() {
        tracing::warn!("empty Gemini response body");
        return Err(AnalysisError::UpstreamFailure);
    }
    let envelope: GenerateContentResponse = serde_json::from_str(body).map_err(|err| {
        tracing::warn!(error = %err, "Gemini response is not the expected envelope");
        AnalysisError::UpstreamFailure
    })?;
    extract_candidate_text(envelope)
}

fn extract_candidate_text(response: GenerateContentResponse) -> Result<String, AnalysisError> {
    let Some(candidate) = response.candidates.and_then(|c| c.into_iter().next()) else {
        tracing::warn!("Gemini response carried no candidates");
        return Err(AnalysisError::UpstreamFailure);
    };

    // Authoritative truncation signal.
    if candidate.finish_reason.as_deref() == Some("MAX_TOKENS") {
        tracing::warn!("Gemini response cut at the output token budget");
        return Err(AnalysisError::Truncated);
    }

    let finish_reason = candidate.finish_reason.clone();
    let text = candidate
        .content
        .and_then(|c| c.parts)
        .and_then(|parts| parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or_else(|| {
            tracing::warn!(?finish_reason, "Gemini candidate carried no text");
            AnalysisError::UpstreamFailure
        })?;

    // Secondary heuristic; finishReason above is the source of truth. Can
    // false-positive on brace-heavy prose, which costs a refunded retry.
    if looks_truncated(&text) {
        tracing::warn!(
            chars = text.chars().count(),
            ?finish_reason,
            "unbalanced braces suggest a truncated response"
        );
        return Err(AnalysisError::Truncated);
    }

    Ok(text)
}

fn looks_truncated(text: &str) -> bool {
    if text.trim_end().ends_with('}') {
        return false;
    }
    let open = text.matches('{').count();
    let close = text.matches('}').count();
    open > close
}

/// Statuses that routinely self-heal. Others still retry (the budget is
/// cheap) but log at error level since they usually mean a broken request
/// or key.
fn is_transient_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// A 429 carrying these markers is the provider's own quota running dry -
/// retrying cannot help.
fn body_marks_quota_exhaustion(body: &str) -> bool {
    body.to_lowercase().contains("quota") || body.contains("limit: 0")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_key() -> GeminiConfig {
        GeminiConfig {
            api_key: Some("test-key".into()),
            ..GeminiConfig::default()
        }
    }

    #[test]
    fn client_requires_an_api_key() {
        let config = GeminiConfig {
            api_key: None,
            ..GeminiConfig::default()
        };
        assert!(GeminiClient::new(Client::new(), &config).is_err());

        let config = GeminiConfig {
            api_key: Some("   ".into()),
            ..GeminiConfig::default()
        };
        assert!(GeminiClient::new(Client::new(), &config).is_err());
    }

    #[test]
    fn url_joins_base_model_and_method() {
        let client = GeminiClient::new(Client::new(), &config_with_key()).unwrap();
        assert_eq!(
            client.generate_content_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn request_serializes_camel_case_and_safety_settings() {
        let client = GeminiClient::new(Client::new(), &config_with_key()).unwrap();
        let request = client.build_request("analyze this", 4000);
        let json = serde_json::to_string(&request).unwrap();

        assert!(json.contains("\"maxOutputTokens\":4000"));
        assert!(json.contains("\"topP\":0.95"));
        assert!(json.contains("\"temperature\":0.7"));
        assert!(json.contains("\"generationConfig\""));
        assert!(json.contains("\"safetySettings\""));
        assert!(json.contains("\"BLOCK_NONE\""));
        assert!(json.contains("HARM_CATEGORY_DANGEROUS_CONTENT"));
        assert!(json.contains("\"text\":\"analyze this\""));
    }

    #[test]
    fn candidate_text_is_extracted() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "{\"ats_score\": 70}"}]},
                "finishReason": "STOP"
            }]
        }"#;
        assert_eq!(parse_success_body(body).unwrap(), "{\"ats_score\": 70}");
    }

    #[test]
    fn max_tokens_finish_reason_is_truncated() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "{\"partial\": "}]},
                "finishReason": "MAX_TOKENS"
            }]
        }"#;
        assert_eq!(parse_success_body(body), Err(AnalysisError::Truncated));
    }

    #[test]
    fn unbalanced_braces_are_flagged_truncated() {
        let body = r#"{
            "candidates": [{
                "content": {"parts": [{"text": "{\"ats_score\": 70, \"summary\": \"cut"}]},
                "finishReason": "STOP"
            }]
        }"#;
        assert_eq!(parse_success_body(body), Err(AnalysisError::Truncated));
    }

    #[test]
    fn missing_candidates_is_upstream_failure() {
        assert_eq!(
            parse_success_body(r#"{"candidates": []}"#),
            Err(AnalysisError::UpstreamFailure)
        );
        assert_eq!(
            parse_success_body(r#"{"promptFeedback": {}}"#),
            Err(AnalysisError::UpstreamFailure)
        );
    }

    #[test]
    fn garbage_body_is_upstream_failure() {
        assert_eq!(
            parse_success_body("<html>bad gateway</html>"),
            Err(AnalysisError::UpstreamFailure)
        );
        assert_eq!(parse_success_body(""), Err(AnalysisError::UpstreamFailure));
    }

    #[test]
    fn heuristic_accepts_balanced_json() {
        assert!(!looks_truncated("{\"a\": 1}"));
        assert!(!looks_truncated("{\"a\": {\"b\": 2}}\n"));
        // plain prose without braces is not "truncated"
        assert!(!looks_truncated("Rewritten resume text."));
    }

    #[test]
    fn heuristic_flags_unclosed_objects() {
        assert!(looks_truncated("{\"a\": {\"b\": 2}"));
        assert!(looks_truncated("{\"a\": [1, 2"));
    }

    #[test]
    fn transient_status_classification() {
        for code in [429u16, 500, 502, 503, 504] {
            assert!(is_transient_status(StatusCode::from_u16(code).unwrap()));
        }
        for code in [400u16, 401, 403, 404] {
            assert!(!is_transient_status(StatusCode::from_u16(code).unwrap()));
        }
    }

    #[test]
    fn quota_exhaustion_markers() {
        assert!(body_marks_quota_exhaustion(
            r#"{"error": {"message": "Quota exceeded for quota metric"}}"#
        ));
        assert!(body_marks_quota_exhaustion("rate limit: 0 per day"));
        assert!(!body_marks_quota_exhaustion(
            r#"{"error": {"message": "Resource has been exhausted"}}"#
        ));
    }

    #[test]
    fn backoff_schedule_matches_policy() {
        assert_eq!(MAX_ATTEMPTS, 3);
        assert_eq!(BACKOFF_MS, [700, 1500, 3000]);
        assert_eq!(RATE_LIMIT_WAIT.as_secs(), 60);
    }
}
