//! Resume-analysis orchestration.
//!
//! Every operation follows the same sequence: quota check, cache lookup,
//! atomic consume, model call + parse, then either cache-and-return or
//! refund-and-propagate. A billed attempt that fails for any reason after
//! the consume is refunded before the error reaches the caller - failed
//! attempts are free.

pub mod error;
pub mod parser;
pub mod prompts;
pub mod types;

pub use error::AnalysisError;
pub use types::{
    AnalysisResult, Improvement, OperationKind, RewrittenBullet, TailorResult,
};

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use crate::analytics::AnalyticsSink;
use crate::cache::{fingerprint, CacheKey, ResponseCache};
use crate::config::LimitsConfig;
use crate::providers::TextGenerator;
use crate::quota::{Identity, QuotaLedger, UsageState};
use crate::util::truncate_chars_with_marker;

/// Marker appended when input is cut to its character budget. Part of the
/// fingerprinted text, so truncated and full inputs cache independently.
const TRUNCATION_MARKER: &str = "\n...[text truncated]";

/// One cached operation result.
#[derive(Debug, Clone)]
enum CachedResult {
    Analysis(AnalysisResult),
    Tailor(TailorResult),
    Rewrite(String),
}

pub struct AnalysisService {
    generator: Arc<dyn TextGenerator>,
    ledger: QuotaLedger,
    cache: ResponseCache<CacheKey, CachedResult>,
    analytics: Arc<AnalyticsSink>,
    limits: LimitsConfig,
    cache_ttl: Duration,
    max_output_tokens: u32,
}

impl AnalysisService {
    pub fn new(
        generator: Arc<dyn TextGenerator>,
        ledger: QuotaLedger,
        analytics: Arc<AnalyticsSink>,
        limits: LimitsConfig,
        cache_ttl: Duration,
        max_output_tokens: u32,
    ) -> Self {
        Self {
            generator,
            ledger,
            cache: ResponseCache::new(),
            analytics,
            limits,
            cache_ttl,
            max_output_tokens,
        }
    }

    /// Base resume analysis.
    pub async fn analyze(
        &self,
        identity: Identity,
        resume_text: &str,
    ) -> Result<AnalysisResult, AnalysisError> {
        let resume = self.normalized_resume(resume_text);
        self.check_limit(identity)?;

        let key = CacheKey::new(OperationKind::Analyze, identity, fingerprint(&resume));
        if let Some(CachedResult::Analysis(hit)) = self.cache.get(&key) {
            tracing::debug!(identity, "analysis served from cache");
            return Ok(hit);
        }

        self.reserve_slot(identity)?;
        match self.run_analysis(&resume).await {
            Ok(result) => {
                self.cache
                    .set(key, CachedResult::Analysis(result.clone()), self.cache_ttl);
                self.analytics.record(
                    "resume_analyzed",
                    identity,
                    json!({
                        "resume_chars": resume.chars().count(),
                        "score": result.score,
                    }),
                );
                Ok(result)
            }
            Err(err) => self.refund_and_propagate(identity, OperationKind::Analyze, err),
        }
    }

    /// Resume-vs-job tailoring. Validates the job text length before any
    /// quota or cache interaction.
    pub async fn tailor(
        &self,
        identity: Identity,
        resume_text: &str,
        job_text: &str,
    ) -> Result<TailorResult, AnalysisError> {
        let job_trimmed = job_text.trim();
        if job_trimmed.chars().count() < self.limits.min_job_chars {
            return Err(AnalysisError::InputTooShort {
                minimum: self.limits.min_job_chars,
            });
        }

        let resume = self.normalized_resume(resume_text);
        let job = truncate_chars_with_marker(
            job_trimmed,
            self.limits.max_job_chars,
            TRUNCATION_MARKER,
        );
        self.check_limit(identity)?;

        let key = CacheKey::new(
            OperationKind::Tailor,
            identity,
            format!("{}:{}", fingerprint(&resume), fingerprint(&job)),
        );
        if let Some(CachedResult::Tailor(hit)) = self.cache.get(&key) {
            tracing::debug!(identity, "tailor result served from cache");
            return Ok(hit);
        }

        self.reserve_slot(identity)?;
        match self.run_tailor(&resume, &job).await {
            Ok(result) => {
                self.cache
                    .set(key, CachedResult::Tailor(result.clone()), self.cache_ttl);
                self.analytics.record(
                    "tailor_completed",
                    identity,
                    json!({
                        "resume_chars": resume.chars().count(),
                        "job_chars": job.chars().count(),
                        "fit_score": result.fit_score,
                    }),
                );
                Ok(result)
            }
            Err(err) => self.refund_and_propagate(identity, OperationKind::Tailor, err),
        }
    }

    /// Rewrite the resume as a plain-text draft. No structured parsing:
    /// the model's text is only trimmed.
    pub async fn rewrite(
        &self,
        identity: Identity,
        resume_text: &str,
    ) -> Result<String, AnalysisError> {
        let resume = self.normalized_resume(resume_text);
        self.check_limit(identity)?;

        let key = CacheKey::new(OperationKind::Rewrite, identity, fingerprint(&resume));
        if let Some(CachedResult::Rewrite(hit)) = self.cache.get(&key) {
            tracing::debug!(identity, "rewrite served from cache");
            return Ok(hit);
        }

        self.reserve_slot(identity)?;
        let prompt = prompts::render_rewrite(&resume);
        match self.generator.generate(&prompt, self.max_output_tokens).await {
            Ok(raw) => {
                let draft = raw.trim().to_string();
                self.cache
                    .set(key, CachedResult::Rewrite(draft.clone()), self.cache_ttl);
                self.analytics.record(
                    "rewrite_completed",
                    identity,
                    json!({
                        "resume_chars": resume.chars().count(),
                        "draft_chars": draft.chars().count(),
                    }),
                );
                Ok(draft)
            }
            Err(err) => self.refund_and_propagate(identity, OperationKind::Rewrite, err),
        }
    }

    pub fn is_unlimited(&self, identity: Identity) -> bool {
        self.ledger.is_unlimited(identity)
    }

    pub fn grant_subscription(&self, identity: Identity, days: u32) {
        self.ledger.grant_subscription(identity, days);
    }

    pub fn remaining_quota(&self, identity: Identity) -> u32 {
        self.ledger.remaining(identity)
    }

    pub fn usage(&self, identity: Identity) -> UsageState {
        self.ledger.usage(identity)
    }

    pub fn free_daily_limit(&self) -> u32 {
        self.limits.free_daily_limit
    }

    async fn run_analysis(&self, resume: &str) -> Result<AnalysisResult, AnalysisError> {
        let prompt = prompts::render_analysis(resume);
        let raw = self.generator.generate(&prompt, self.max_output_tokens).await?;
        let object = parser::extract_object(&raw)?;
        Ok(AnalysisResult::from_value(&object))
    }

    async fn run_tailor(&self, resume: &str, job: &str) -> Result<TailorResult, AnalysisError> {
        let prompt = prompts::render_tailor(resume, job);
        let raw = self.generator.generate(&prompt, self.max_output_tokens).await?;
        let object = parser::extract_object(&raw)?;
        Ok(TailorResult::from_value(&object))
    }

    fn normalized_resume(&self, resume_text: &str) -> String {
        truncate_chars_with_marker(
            resume_text.trim(),
            self.limits.max_resume_chars,
            TRUNCATION_MARKER,
        )
    }

    /// Fast-fail limit check. Performs no mutation; the slot itself is
    /// reserved by [`Self::reserve_slot`] after the cache miss.
    fn check_limit(&self, identity: Identity) -> Result<(), AnalysisError> {
        if self.ledger.check(identity) {
            Ok(())
        } else {
            Err(AnalysisError::LimitReached {
                limit: self.limits.free_daily_limit,
            })
        }
    }

    /// Atomic check-and-consume. Two interleaved requests at the limit
    /// boundary serialize here: exactly one gets the last slot.
    fn reserve_slot(&self, identity: Identity) -> Result<(), AnalysisError> {
        if self.ledger.try_consume(identity) {
            Ok(())
        } else {
            Err(AnalysisError::LimitReached {
                limit: self.limits.free_daily_limit,
            })
        }
    }

    fn refund_and_propagate<T>(
        &self,
        identity: Identity,
        operation: OperationKind,
        err: AnalysisError,
    ) -> Result<T, AnalysisError> {
        self.ledger.refund(identity);
        tracing::warn!(
            identity,
            operation = operation.as_str(),
            error = %err,
            "billed attempt failed, quota refunded"
        );
        self.analytics.record(
            "error_occurred",
            identity,
            json!({
                "operation": operation.as_str(),
                "error": err.to_string(),
            }),
        );
        Err(err)
    }
}
