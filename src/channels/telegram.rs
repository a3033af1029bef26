//! Telegram controller: long-poll loop, command dispatch, rendering.
//!
//! Thin glue over the analysis service. Each update is handled under a
//! deadline derived from the platform's webhook response window; an update
//! that exceeds it is logged and abandoned (the in-flight model call races
//! the HTTP client's own timeout, no explicit cancellation).

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use super::traits::Channel;
use crate::analysis::{AnalysisError, AnalysisResult, AnalysisService, Improvement, TailorResult};
use crate::analytics::AnalyticsSink;
use crate::config::{Config, LimitsConfig, PremiumConfig, TelegramConfig};
use crate::extract::{self, ExtractError};
use crate::util::{escape_html, truncate_for_chat};

/// Headroom under Telegram's hard 4096-character message cap.
const CHAT_MESSAGE_LIMIT: usize = 3900;
/// Keywords shown in chat are capped to keep the message scannable.
const MAX_KEYWORDS_SHOWN: usize = 25;
const MAX_QUICK_FIXES_SHOWN: usize = 8;
const INVOICE_PAYLOAD_PREFIX: &str = "premium_";

const PRIVACY_TEXT: &str = "🔒 <b>Privacy</b>\n\n\
• Resume text is used only for the analysis and is never published.\n\
• Counters and results live in server memory and may reset.\n\
• Don't send sensitive data (ID numbers, bank details).";

/// What the next free-text message from a user means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SessionMode {
    #[default]
    Idle,
    AwaitingJob,
}

#[derive(Debug, Default)]
struct SessionCtx {
    mode: SessionMode,
    last_resume: Option<String>,
}

pub struct TelegramChannel {
    client: reqwest::Client,
    telegram: TelegramConfig,
    premium: PremiumConfig,
    limits: LimitsConfig,
    service: Arc<AnalysisService>,
    analytics: Arc<AnalyticsSink>,
    sessions: Mutex<HashMap<i64, SessionCtx>>,
}

impl TelegramChannel {
    pub fn new(
        client: reqwest::Client,
        config: &Config,
        service: Arc<AnalysisService>,
        analytics: Arc<AnalyticsSink>,
    ) -> Self {
        Self {
            client,
            telegram: config.telegram.clone(),
            premium: config.premium.clone(),
            limits: config.limits.clone(),
            service,
            analytics,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    // ── Bot API plumbing ──────────────────────────────────────────────

    fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.telegram.api_base.trim_end_matches('/'),
            self.telegram.bot_token
        )
    }

    async fn call(&self, method: &str, payload: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.api_url(method))
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("telegram {method} request"))?;

        let status = response.status();
        let body: Value = response
            .json()
            .await
            .with_context(|| format!("telegram {method} response body"))?;

        if !status.is_success() || body.get("ok").and_then(Value::as_bool) != Some(true) {
            let description = body
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            anyhow::bail!("telegram {method} failed ({status}): {description}");
        }
        Ok(body.get("result").cloned().unwrap_or(Value::Null))
    }

    async fn send_text(&self, chat_id: i64, text: &str) -> Result<()> {
        self.call(
            "sendMessage",
            json!({
                "chat_id": chat_id,
                "text": truncate_for_chat(text, CHAT_MESSAGE_LIMIT),
                "parse_mode": "HTML",
            }),
        )
        .await?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) {
        let result = self
            .call(
                "sendChatAction",
                json!({"chat_id": chat_id, "action": "typing"}),
            )
            .await;
        if let Err(err) = result {
            tracing::debug!(error = %err, "typing indicator failed");
        }
    }

    async fn send_document(
        &self,
        chat_id: i64,
        file_name: &str,
        bytes: Vec<u8>,
        caption: &str,
    ) -> Result<()> {
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", part);

        let response = self
            .client
            .post(self.api_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .context("telegram sendDocument request")?;
        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("telegram sendDocument failed ({status})");
        }
        Ok(())
    }

    async fn download_document(&self, document: &Value) -> Result<Vec<u8>, ExtractError> {
        let size = document
            .get("file_size")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        if size > self.telegram.max_file_bytes {
            return Err(ExtractError::TooLarge {
                size,
                limit: self.telegram.max_file_bytes,
            });
        }

        let file_id = document
            .get("file_id")
            .and_then(Value::as_str)
            .ok_or_else(|| ExtractError::Corrupt("attachment carries no file_id".into()))?;

        let file = self
            .call("getFile", json!({"file_id": file_id}))
            .await
            .map_err(|err| ExtractError::Corrupt(err.to_string()))?;
        let file_path = file
            .get("file_path")
            .and_then(Value::as_str)
            .ok_or_else(|| ExtractError::Corrupt("getFile returned no file_path".into()))?;

        let url = format!(
            "{}/file/bot{}/{file_path}",
            self.telegram.api_base.trim_end_matches('/'),
            self.telegram.bot_token
        );
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| ExtractError::Corrupt(err.to_string()))?;
        let bytes = response
            .bytes()
            .await
            .map_err(|err| ExtractError::Corrupt(err.to_string()))?;
        Ok(bytes.to_vec())
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Value>> {
        let result = self
            .call(
                "getUpdates",
                json!({
                    "offset": offset,
                    "timeout": self.telegram.poll_timeout_secs,
                    "allowed_updates": ["message", "pre_checkout_query"],
                }),
            )
            .await?;
        Ok(result.as_array().cloned().unwrap_or_default())
    }

    // ── Update dispatch ───────────────────────────────────────────────

    async fn handle_update(&self, update: &Value) {
        if let Some(pre_checkout) = update.get("pre_checkout_query") {
            self.handle_pre_checkout(pre_checkout).await;
            return;
        }
        let Some(message) = update.get("message") else {
            return;
        };
        let Some(user_id) = message.pointer("/from/id").and_then(Value::as_i64) else {
            return;
        };
        let Some(chat_id) = message.pointer("/chat/id").and_then(Value::as_i64) else {
            return;
        };

        if let Some(payment) = message.get("successful_payment") {
            self.handle_successful_payment(chat_id, user_id, payment)
                .await;
            return;
        }

        let text = message.get("text").and_then(Value::as_str).unwrap_or("");
        if let Some(command) = text.strip_prefix('/') {
            self.handle_command(chat_id, user_id, command).await;
            return;
        }

        self.handle_input(chat_id, user_id, message).await;
    }

    async fn handle_command(&self, chat_id: i64, user_id: i64, command: &str) {
        let command = command
            .split_whitespace()
            .next()
            .unwrap_or("")
            .split('@')
            .next()
            .unwrap_or("");

        let outcome = match command {
            "start" => {
                self.analytics.record("user_started", user_id, Value::Null);
                self.send_text(chat_id, &self.welcome_text()).await
            }
            "help" => self.send_text(chat_id, &self.help_text()).await,
            "privacy" => self.send_text(chat_id, PRIVACY_TEXT).await,
            "stats" => self.send_stats(chat_id, user_id).await,
            "premium" => self.send_premium(chat_id, user_id).await,
            "tailor" => self.start_tailor(chat_id, user_id).await,
            "rewrite" => self.run_rewrite(chat_id, user_id).await,
            _ => {
                self.send_text(chat_id, "Unknown command. Try /help.")
                    .await
            }
        };

        if let Err(err) = outcome {
            tracing::warn!(command, error = %err, "command handling failed");
        }
    }

    /// Free text or a document: either the job description a /tailor flow
    /// is waiting for, or a resume to analyze.
    async fn handle_input(&self, chat_id: i64, user_id: i64, message: &Value) {
        let text = message.get("text").and_then(Value::as_str).unwrap_or("");

        let awaiting_job =
            self.sessions.lock().entry(user_id).or_default().mode == SessionMode::AwaitingJob;
        if awaiting_job && !text.is_empty() {
            self.finish_tailor(chat_id, user_id, text).await;
            return;
        }

        let resume_text = if let Some(document) = message.get("document") {
            match self.extract_attachment(document).await {
                Ok(text) => text,
                Err(err) => {
                    tracing::info!(identity = user_id, error = %err, "attachment rejected");
                    let _ = self
                        .send_text(chat_id, &format!("❌ {}", escape_html(&err.to_string())))
                        .await;
                    return;
                }
            }
        } else {
            text.to_string()
        };

        if resume_text.trim().chars().count() < self.limits.min_resume_chars {
            let _ = self
                .send_text(
                    chat_id,
                    &format!(
                        "❌ That resume looks too short.\n\nPlease send the full text \
                         (at least {} characters) or attach a PDF/DOCX/TXT file.",
                        self.limits.min_resume_chars
                    ),
                )
                .await;
            return;
        }

        self.send_typing(chat_id).await;
        match self.service.analyze(user_id, &resume_text).await {
            Ok(result) => {
                {
                    let mut sessions = self.sessions.lock();
                    let ctx = sessions.entry(user_id).or_default();
                    ctx.last_resume = Some(resume_text);
                    ctx.mode = SessionMode::Idle;
                }
                let remaining = self.remaining_label(user_id);
                let _ = self
                    .send_text(chat_id, &format_analysis(&result, &remaining))
                    .await;
            }
            Err(err) => self.report_failure(chat_id, user_id, "analyze", &err).await,
        }
    }

    async fn extract_attachment(&self, document: &Value) -> Result<String, ExtractError> {
        let file_name = document
            .get("file_name")
            .and_then(Value::as_str)
            .unwrap_or("");
        let mime = document.get("mime_type").and_then(Value::as_str);
        let bytes = self.download_document(document).await?;
        extract::extract_text(file_name, mime, &bytes, self.telegram.max_file_bytes)
    }

    // ── Operation flows ───────────────────────────────────────────────

    async fn start_tailor(&self, chat_id: i64, user_id: i64) -> Result<()> {
        self.analytics.record("tailor_started", user_id, Value::Null);
        let has_resume = self
            .sessions
            .lock()
            .get(&user_id)
            .is_some_and(|ctx| ctx.last_resume.is_some());
        if !has_resume {
            return self
                .send_text(
                    chat_id,
                    "Send me your resume first (text or file), then use /tailor.",
                )
                .await;
        }
        self.sessions.lock().entry(user_id).or_default().mode = SessionMode::AwaitingJob;
        self.send_text(
            chat_id,
            &format!(
                "🎯 Now send the <b>job posting text</b>.\n\n\
                 I'll find the missing keywords and quick ATS fixes.\n\
                 <i>At least {} characters.</i>",
                self.limits.min_job_chars
            ),
        )
        .await
    }

    async fn finish_tailor(&self, chat_id: i64, user_id: i64, job_text: &str) {
        let resume = self
            .sessions
            .lock()
            .get(&user_id)
            .and_then(|ctx| ctx.last_resume.clone());
        let Some(resume) = resume else {
            self.sessions.lock().entry(user_id).or_default().mode = SessionMode::Idle;
            let _ = self
                .send_text(chat_id, "Send me your resume first, then use /tailor.")
                .await;
            return;
        };

        self.send_typing(chat_id).await;
        match self.service.tailor(user_id, &resume, job_text).await {
            Ok(result) => {
                self.sessions.lock().entry(user_id).or_default().mode = SessionMode::Idle;
                let remaining = self.remaining_label(user_id);
                let _ = self
                    .send_text(chat_id, &format_tailor(&result, &remaining))
                    .await;
            }
            Err(err @ AnalysisError::InputTooShort { .. }) => {
                // stay in AwaitingJob so the user can resend a longer posting
                let _ = self.send_text(chat_id, &err.user_message()).await;
            }
            Err(err) => {
                self.sessions.lock().entry(user_id).or_default().mode = SessionMode::Idle;
                self.report_failure(chat_id, user_id, "tailor", &err).await;
            }
        }
    }

    async fn run_rewrite(&self, chat_id: i64, user_id: i64) -> Result<()> {
        self.analytics
            .record("rewrite_started", user_id, Value::Null);
        let resume = self
            .sessions
            .lock()
            .get(&user_id)
            .and_then(|ctx| ctx.last_resume.clone());
        let Some(resume) = resume else {
            return self
                .send_text(
                    chat_id,
                    "Send me your resume first (text or file), then use /rewrite.",
                )
                .await;
        };

        self.send_typing(chat_id).await;
        match self.service.rewrite(user_id, &resume).await {
            Ok(draft) => {
                // drafts routinely exceed the message cap; deliver as a file
                self.send_document(
                    chat_id,
                    "resume_draft.txt",
                    draft.into_bytes(),
                    "📝 Draft ready. Double-check facts and figures, then make it yours.",
                )
                .await?;
                self.send_text(
                    chat_id,
                    "Want it matched to a specific opening? Use /tailor and send the job posting.",
                )
                .await
            }
            Err(err) => {
                self.report_failure(chat_id, user_id, "rewrite", &err).await;
                Ok(())
            }
        }
    }

    // ── Payments ──────────────────────────────────────────────────────

    async fn send_premium(&self, chat_id: i64, user_id: i64) -> Result<()> {
        self.analytics
            .record("premium_clicked", user_id, Value::Null);

        if self.service.is_unlimited(user_id) {
            return self
                .send_text(
                    chat_id,
                    "🎉 <b>Your premium subscription is active.</b> Analyses are unlimited.",
                )
                .await;
        }

        if self.premium.provider_token.is_empty() {
            return self
                .send_text(
                    chat_id,
                    "💎 <b>CareerLens Premium</b>\n\n\
                     ✅ Unlimited resume analyses\n\
                     ✅ Unlimited drafts and job tailoring\n\n\
                     <i>Payments aren't live yet - check back soon.</i>",
                )
                .await;
        }

        let payload = format!("{INVOICE_PAYLOAD_PREFIX}{user_id}_{}", correlation_id());
        self.call(
            "sendInvoice",
            json!({
                "chat_id": chat_id,
                "title": "CareerLens Premium",
                "description": format!(
                    "Premium subscription for {} days: unlimited analyses, drafts, and job tailoring.",
                    self.premium.days
                ),
                "payload": payload,
                "provider_token": self.premium.provider_token,
                "currency": self.premium.currency,
                "prices": [{"label": "Premium subscription", "amount": self.premium.price_minor_units}],
            }),
        )
        .await?;
        Ok(())
    }

    /// Telegram gives ~10 s to confirm a pre-checkout; always answer.
    async fn handle_pre_checkout(&self, pre_checkout: &Value) {
        let Some(query_id) = pre_checkout.get("id").and_then(Value::as_str) else {
            return;
        };
        let payload = pre_checkout
            .get("invoice_payload")
            .and_then(Value::as_str)
            .unwrap_or("");
        let ok = payload.starts_with(INVOICE_PAYLOAD_PREFIX);

        let mut answer = json!({"pre_checkout_query_id": query_id, "ok": ok});
        if !ok {
            tracing::warn!(payload, "rejecting unknown pre-checkout payload");
            answer["error_message"] =
                Value::String("Unknown invoice. Use /premium to get a fresh one.".into());
        }
        if let Err(err) = self.call("answerPreCheckoutQuery", answer).await {
            tracing::error!(error = %err, "failed to answer pre-checkout query");
        }
    }

    async fn handle_successful_payment(&self, chat_id: i64, user_id: i64, payment: &Value) {
        let payload = payment
            .get("invoice_payload")
            .and_then(Value::as_str)
            .unwrap_or("");
        if !payload.starts_with(INVOICE_PAYLOAD_PREFIX) {
            return;
        }

        self.service.grant_subscription(user_id, self.premium.days);
        self.analytics.record(
            "premium_purchased",
            user_id,
            json!({
                "amount": payment.get("total_amount").and_then(Value::as_u64),
                "currency": payment.get("currency").and_then(Value::as_str),
            }),
        );
        let _ = self
            .send_text(
                chat_id,
                &format!(
                    "🎉 <b>Thank you!</b>\n\nPremium is active for {} days: \
                     unlimited analyses, drafts, and job tailoring.",
                    self.premium.days
                ),
            )
            .await;
    }

    // ── Rendering ─────────────────────────────────────────────────────

    fn welcome_text(&self) -> String {
        format!(
            "👋 <b>Welcome to CareerLens!</b>\n\n\
             I'll analyze your resume the way an ATS does:\n\
             • 📊 ATS compatibility score\n\
             • 🎯 Concrete improvements\n\
             • 🔑 Missing keywords\n\n\
             <b>How:</b> just send your resume as text or a file (PDF/DOCX/TXT).\n\n\
             <b>Free:</b> {} analyses per day\n\
             <b>Premium:</b> unlimited → /premium\n\n\
             More: /tailor matches your resume to a job posting, /rewrite drafts \
             an improved version.",
            self.limits.free_daily_limit
        )
    }

    fn help_text(&self) -> String {
        format!(
            "🧭 <b>Commands</b>\n\n\
             • /start - intro\n\
             • /stats - your usage\n\
             • /tailor - match resume to a job posting\n\
             • /rewrite - generate an improved draft\n\
             • /premium - unlimited access\n\
             • /privacy - data handling\n\n\
             Send a resume as text or a file (PDF/DOCX/TXT). Free tier: {} analyses per day.",
            self.limits.free_daily_limit
        )
    }

    async fn send_stats(&self, chat_id: i64, user_id: i64) -> Result<()> {
        let usage = self.service.usage(user_id);
        let quota_label = if self.service.is_unlimited(user_id) {
            "∞ (Premium)".to_string()
        } else {
            format!(
                "{}/{}",
                usage.requests_today,
                self.service.free_daily_limit()
            )
        };
        let last = usage
            .last_request
            .map_or_else(|| "not yet".to_string(), |t| t.format("%H:%M UTC").to_string());

        self.send_text(
            chat_id,
            &format!(
                "📊 <b>Your stats</b>\n\n\
                 📅 With us since: {}\n\
                 🔢 Requests today: {quota_label}\n\
                 ⏱ Last analysis: {last}",
                usage.registered_at.format("%d.%m.%Y")
            ),
        )
        .await
    }

    fn remaining_label(&self, user_id: i64) -> String {
        if self.service.is_unlimited(user_id) {
            "∞ (Premium)".to_string()
        } else {
            self.service.remaining_quota(user_id).to_string()
        }
    }

    /// Render a failure. User-actionable errors (limit, validation) go out
    /// as-is; internal faults get an apologetic note plus a correlation id
    /// that also keys the full log line.
    async fn report_failure(
        &self,
        chat_id: i64,
        user_id: i64,
        action: &str,
        err: &AnalysisError,
    ) {
        if err.is_user_actionable() {
            let _ = self.send_text(chat_id, &err.user_message()).await;
            return;
        }

        let rid = correlation_id();
        tracing::error!(
            rid = %rid,
            identity = user_id,
            action,
            error = %err,
            "operation failed"
        );
        let text = format!(
            "{}\n\nError code: <code>{rid}</code>\nSupport: {}",
            err.user_message(),
            escape_html(&self.telegram.support_handle)
        );
        let _ = self.send_text(chat_id, &text).await;
    }
}

#[async_trait]
impl Channel for TelegramChannel {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn send(&self, recipient: &str, message: &str) -> Result<()> {
        let chat_id: i64 = recipient.parse().context("telegram recipient must be a chat id")?;
        self.send_text(chat_id, message).await
    }

    async fn run(&self) -> Result<()> {
        anyhow::ensure!(
            !self.telegram.bot_token.trim().is_empty(),
            "telegram bot_token is not configured"
        );
        tracing::info!(channel = "telegram", "starting long-poll loop");

        let deadline = Duration::from_secs(self.telegram.handler_deadline_secs);
        let mut offset = 0i64;
        loop {
            let updates = match self.get_updates(offset).await {
                Ok(updates) => updates,
                Err(err) => {
                    tracing::warn!(error = %err, "getUpdates failed, backing off");
                    tokio::time::sleep(Duration::from_secs(3)).await;
                    continue;
                }
            };

            for update in updates {
                let update_id = update
                    .get("update_id")
                    .and_then(Value::as_i64)
                    .unwrap_or(0);
                offset = offset.max(update_id + 1);

                if tokio::time::timeout(deadline, self.handle_update(&update))
                    .await
                    .is_err()
                {
                    tracing::warn!(update_id, "update exceeded handling deadline, abandoned");
                }
            }
        }
    }
}

/// Short id pairing a user-visible error message with its full log line.
fn correlation_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(8);
    id
}

// ── Pure formatting helpers ───────────────────────────────────────────

fn score_verdict(score: u8) -> &'static str {
    match score {
        80.. => "🟢 Excellent - this resume passes most ATS filters",
        60..=79 => "🟡 Good, with room to improve",
        40..=59 => "🟠 Needs serious rework",
        _ => "🔴 Critical - this resume won't pass ATS filters",
    }
}

fn format_analysis(result: &AnalysisResult, remaining: &str) -> String {
    format!(
        "✅ <b>Analysis complete!</b>\n\n\
         📊 <b>ATS Score: {}/100</b>\n{}\n\n\
         <b>🧾 Summary:</b>\n{}\n\n\
         <b>💪 Strengths:</b>\n{}\n\n\
         <b>🎯 Top improvements:</b>\n{}\n\n\
         <b>🔑 Missing keywords:</b>\n<code>{}</code>\n\n\
         <i>Free analyses left today: {remaining}</i>",
        result.score,
        score_verdict(result.score),
        non_empty_or(&escape_html(&result.summary), "—"),
        format_bullets(&result.strengths),
        format_improvements(&result.improvements),
        escape_html(&format_keywords(&result.missing_keywords)),
    )
}

fn format_tailor(result: &TailorResult, remaining: &str) -> String {
    let bullets = if result.rewritten_bullets.is_empty() {
        String::new()
    } else {
        let rendered = result
            .rewritten_bullets
            .iter()
            .map(|b| {
                format!(
                    "<i>Before:</i> {}\n<i>After:</i> {}",
                    escape_html(&b.before),
                    escape_html(&b.after)
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        format!("\n\n<b>✍️ Rewritten bullets:</b>\n{rendered}")
    };

    format!(
        "🎯 <b>Job match</b>\n\n\
         📌 <b>Fit Score: {}/100</b>\n\n\
         <b>🔑 Missing keywords:</b>\n<code>{}</code>\n\n\
         <b>⚡ Quick fixes:</b>\n{}{bullets}\n\n\
         <i>Free analyses left today: {remaining}</i>",
        result.fit_score,
        escape_html(&format_keywords(&result.missing_keywords)),
        format_bullets(
            &result
                .quick_fixes
                .iter()
                .take(MAX_QUICK_FIXES_SHOWN)
                .cloned()
                .collect::<Vec<_>>()
        ),
    )
}

fn format_bullets(items: &[String]) -> String {
    if items.is_empty() {
        return "• Nothing found".to_string();
    }
    items
        .iter()
        .map(|item| format!("• {}", escape_html(item)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_improvements(items: &[Improvement]) -> String {
    if items.is_empty() {
        return "1. Keep doing what you're doing!".to_string();
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let mut chunk = format!("{}. <b>{}</b>", i + 1, escape_html(&item.title));
            if !item.why.is_empty() {
                chunk.push_str(&format!("\n<i>Why:</i> {}", escape_html(&item.why)));
            }
            if !item.how.is_empty() {
                chunk.push_str(&format!("\n<i>How:</i> {}", escape_html(&item.how)));
            }
            chunk
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn format_keywords(items: &[String]) -> String {
    if items.is_empty() {
        return "nothing found".to_string();
    }
    items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .take(MAX_KEYWORDS_SHOWN)
        .collect::<Vec<_>>()
        .join(", ")
}

fn non_empty_or<'a>(text: &'a str, fallback: &'a str) -> &'a str {
    if text.trim().is_empty() {
        fallback
    } else {
        text
    }
}
