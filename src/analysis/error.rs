//! Error taxonomy for analysis operations.
//!
//! Every variant renders to a user-safe string; raw upstream payloads never
//! reach the caller. Full detail goes to the logs, keyed by the correlation
//! id the controller attaches.

/// Failure modes surfaced by [`AnalysisService`](super::AnalysisService)
/// and the model gateway beneath it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalysisError {
    /// The identity spent its free daily quota. Nothing was consumed.
    #[error("daily free limit of {limit} reached")]
    LimitReached { limit: u32 },

    /// Caller-side validation failed before any quota or cache interaction.
    #[error("input shorter than {minimum} characters")]
    InputTooShort { minimum: usize },

    /// The model provider's own quota is exhausted. Not retried; needs
    /// operator action, not user patience.
    #[error("model provider quota exhausted")]
    QuotaExhaustedUpstream,

    /// Transient provider overload survived all internal retries.
    #[error("model provider rate limited")]
    RateLimited,

    /// The model output was cut at the token budget; partial text is never
    /// returned or cached.
    #[error("model response truncated")]
    Truncated,

    /// No recovery strategy produced a well-formed object.
    #[error("could not parse model response")]
    ParseFailure,

    /// Network or HTTP failure after retries were exhausted.
    #[error("model request failed")]
    UpstreamFailure,
}

impl AnalysisError {
    /// Whether the failure is something the user can act on directly
    /// (as opposed to an internal fault worth a correlation id).
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            AnalysisError::LimitReached { .. } | AnalysisError::InputTooShort { .. }
        )
    }

    /// Short, safe message shown in chat.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::LimitReached { limit } => format!(
                "🚫 You've used all {limit} free analyses for today.\n\n\
                 💎 Premium removes the daily limit → /premium"
            ),
            AnalysisError::InputTooShort { minimum } => format!(
                "❌ That text is too short. Please send at least {minimum} characters."
            ),
            AnalysisError::QuotaExhaustedUpstream => {
                "😔 The analysis engine is out of capacity right now. \
                 The team has been notified — please try again later."
                    .to_string()
            }
            AnalysisError::RateLimited => {
                "⏳ The analysis engine is busy. Please try again in a minute.".to_string()
            }
            AnalysisError::Truncated => {
                "😔 The analysis came back incomplete. \
                 Try a shorter resume or try again in a moment."
                    .to_string()
            }
            AnalysisError::ParseFailure => {
                "😔 I couldn't process the analysis result. Please send the resume again."
                    .to_string()
            }
            AnalysisError::UpstreamFailure => {
                "😔 I couldn't reach the analysis engine. Please try again later.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_message_carries_the_limit() {
        let err = AnalysisError::LimitReached { limit: 3 };
        assert!(err.user_message().contains('3'));
        assert!(err.user_message().contains("/premium"));
    }

    #[test]
    fn user_actionable_classification() {
        assert!(AnalysisError::LimitReached { limit: 3 }.is_user_actionable());
        assert!(AnalysisError::InputTooShort { minimum: 80 }.is_user_actionable());
        assert!(!AnalysisError::Truncated.is_user_actionable());
        assert!(!AnalysisError::UpstreamFailure.is_user_actionable());
    }

    #[test]
    fn messages_never_leak_internals() {
        for err in [
            AnalysisError::QuotaExhaustedUpstream,
            AnalysisError::RateLimited,
            AnalysisError::Truncated,
            AnalysisError::ParseFailure,
            AnalysisError::UpstreamFailure,
        ] {
            let msg = err.user_message();
            assert!(!msg.to_lowercase().contains("http"));
            assert!(!msg.contains("gemini"));
        }
    }
}
