//! Trait seam between the analysis service and the model backend.

use async_trait::async_trait;

use crate::analysis::error::AnalysisError;

/// A remote text-generation backend. The production implementation is
/// [`GeminiClient`](super::gemini::GeminiClient); tests script the
/// responses.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for `prompt`, bounded by `max_output_tokens`.
    /// Returns validated, non-truncated raw text.
    async fn generate(&self, prompt: &str, max_output_tokens: u32)
        -> Result<String, AnalysisError>;
}
