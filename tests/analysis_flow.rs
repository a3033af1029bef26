//! End-to-end scenarios through the analysis service with a scripted
//! model backend: quota lifecycle, caching, refunds, and the subscription
//! bypass.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use careerlens::analysis::{AnalysisError, AnalysisService};
use careerlens::analytics::AnalyticsSink;
use careerlens::config::LimitsConfig;
use careerlens::providers::TextGenerator;
use careerlens::quota::QuotaLedger;

const VALID_ANALYSIS: &str = concat!(
    r#"{"ats_score": 70, "summary": "ok", "strengths": ["a", "b"], "#,
    r#""improvements": [{"title": "t", "why": "w", "how": "h"}], "#,
    r#""missing_keywords": ["x", "y"]}"#,
);

/// Scripted backend: pops pre-seeded responses, repeats the fallback when
/// the script runs dry. Optionally sleeps to force request interleaving.
struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String, AnalysisError>>>,
    fallback: Result<String, AnalysisError>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedGenerator {
    fn ok() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Ok(VALID_ANALYSIS.to_string()),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::ok()
        }
    }

    fn push(&self, response: Result<String, AnalysisError>) {
        self.script.lock().push_back(response);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _max_output_tokens: u32,
    ) -> Result<String, AnalysisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

fn service(generator: Arc<ScriptedGenerator>, free_daily_limit: u32) -> AnalysisService {
    let limits = LimitsConfig {
        free_daily_limit,
        ..LimitsConfig::default()
    };
    AnalysisService::new(
        generator,
        QuotaLedger::new(free_daily_limit),
        Arc::new(AnalyticsSink::new()),
        limits,
        Duration::from_secs(6 * 3600),
        4000,
    )
}

fn resume(tag: &str) -> String {
    format!(
        "{tag}: Staff engineer. Led a platform team of six, moved the deploy \
         pipeline to trunk-based delivery, cut lead time from days to hours."
    )
}

#[tokio::test]
async fn free_tier_allows_exactly_three_then_denies() {
    let generator = Arc::new(ScriptedGenerator::ok());
    let service = service(generator.clone(), 3);

    for i in 0..3 {
        let result = service.analyze(42, &resume(&format!("v{i}"))).await;
        assert!(result.is_ok(), "submission {i} should pass");
        assert_eq!(service.remaining_quota(42), 3 - (i as u32 + 1));
    }

    let err = service.analyze(42, &resume("v3")).await.unwrap_err();
    assert_eq!(err, AnalysisError::LimitReached { limit: 3 });
    // denial leaves the counter at the limit and never hits the gateway
    assert_eq!(service.remaining_quota(42), 0);
    assert_eq!(generator.calls(), 3);
}

#[tokio::test]
async fn active_subscription_bypasses_the_quota() {
    let generator = Arc::new(ScriptedGenerator::ok());
    let service = service(generator.clone(), 3);

    service.grant_subscription(7, 1);
    assert!(service.is_unlimited(7));

    for i in 0..10 {
        let result = service.analyze(7, &resume(&format!("v{i}"))).await;
        assert!(result.is_ok(), "unlimited submission {i} should pass");
    }
    assert_eq!(generator.calls(), 10);
}

#[tokio::test]
async fn identical_text_within_ttl_bills_and_calls_once() {
    let generator = Arc::new(ScriptedGenerator::ok());
    let service = service(generator.clone(), 3);
    let text = resume("same");

    let first = service.analyze(42, &text).await.unwrap();
    let second = service.analyze(42, &text).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(generator.calls(), 1);
    assert_eq!(service.remaining_quota(42), 2);
}

#[tokio::test]
async fn truncated_response_is_refunded_and_not_cached() {
    let generator = Arc::new(ScriptedGenerator::ok());
    generator.push(Err(AnalysisError::Truncated));
    let service = service(generator.clone(), 3);
    let text = resume("r");

    let err = service.analyze(42, &text).await.unwrap_err();
    assert_eq!(err, AnalysisError::Truncated);
    assert_eq!(service.remaining_quota(42), 3);

    // same text again: a fresh gateway call, not a cached partial
    let result = service.analyze(42, &text).await.unwrap();
    assert_eq!(result.score, 70);
    assert_eq!(generator.calls(), 2);
    assert_eq!(service.remaining_quota(42), 2);
}

#[tokio::test]
async fn upstream_failure_chain_refunds_every_attempt() {
    let generator = Arc::new(ScriptedGenerator::ok());
    generator.push(Err(AnalysisError::UpstreamFailure));
    generator.push(Err(AnalysisError::RateLimited));
    generator.push(Err(AnalysisError::QuotaExhaustedUpstream));
    let service = service(generator.clone(), 3);

    for expected in [
        AnalysisError::UpstreamFailure,
        AnalysisError::RateLimited,
        AnalysisError::QuotaExhaustedUpstream,
    ] {
        let err = service.analyze(42, &resume("r")).await.unwrap_err();
        assert_eq!(err, expected);
    }
    // three failed attempts, three refunds: the full quota is intact
    assert_eq!(service.remaining_quota(42), 3);
}

#[tokio::test]
async fn last_free_slot_is_granted_to_exactly_one_of_two_racers() {
    let generator = Arc::new(ScriptedGenerator::with_delay(Duration::from_millis(50)));
    let service = Arc::new(service(generator.clone(), 3));

    // burn two of three slots
    service.analyze(42, &resume("a")).await.unwrap();
    service.analyze(42, &resume("b")).await.unwrap();
    assert_eq!(service.remaining_quota(42), 1);

    let left = {
        let service = service.clone();
        tokio::spawn(async move { service.analyze(42, &resume("left")).await })
    };
    let right = {
        let service = service.clone();
        tokio::spawn(async move { service.analyze(42, &resume("right")).await })
    };

    let (left, right) = (left.await.unwrap(), right.await.unwrap());
    let successes = [&left, &right].iter().filter(|r| r.is_ok()).count();
    let limit_hits = [&left, &right]
        .iter()
        .filter(|r| matches!(r, Err(AnalysisError::LimitReached { .. })))
        .count();

    assert_eq!(successes, 1, "exactly one racer may take the last slot");
    assert_eq!(limit_hits, 1);
    assert_eq!(service.remaining_quota(42), 0);
}

#[tokio::test]
async fn tailor_requires_a_substantial_job_posting() {
    let generator = Arc::new(ScriptedGenerator::ok());
    let service = service(generator.clone(), 3);

    let err = service
        .tailor(42, &resume("r"), "short posting")
        .await
        .unwrap_err();
    assert_eq!(err, AnalysisError::InputTooShort { minimum: 80 });
    // validation happens before quota and cache: nothing consumed, no call
    assert_eq!(service.remaining_quota(42), 3);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn operations_bill_independently_against_one_quota() {
    let generator = Arc::new(ScriptedGenerator::ok());
    generator.push(Ok(VALID_ANALYSIS.to_string()));
    generator.push(Ok(
        r#"{"fit_score": 60, "missing_keywords": [], "quick_fixes": [], "rewritten_bullets": []}"#
            .to_string(),
    ));
    generator.push(Ok("A cleaner resume draft.".to_string()));
    let service = service(generator.clone(), 3);
    let job = "j".repeat(100);

    service.analyze(42, &resume("r")).await.unwrap();
    service.tailor(42, &resume("r"), &job).await.unwrap();
    let draft = service.rewrite(42, &resume("r")).await.unwrap();

    assert_eq!(draft, "A cleaner resume draft.");
    assert_eq!(service.remaining_quota(42), 0);
    assert_eq!(generator.calls(), 3);

    let err = service.analyze(42, &resume("r2")).await.unwrap_err();
    assert_eq!(err, AnalysisError::LimitReached { limit: 3 });
}
