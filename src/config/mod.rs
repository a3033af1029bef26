//! Configuration loading for CareerLens.
//!
//! Resolution order for the config file: `CAREERLENS_CONFIG` env var, then
//! `~/.careerlens/config.toml`. A missing file yields defaults; secrets are
//! taken from the environment when present so tokens never have to live in
//! the file.

use anyhow::{Context, Result};
use directories::UserDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level CareerLens configuration, loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Path the config was loaded from - computed, not serialized.
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Telegram channel settings (`[telegram]`).
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Gemini model gateway settings (`[gemini]`).
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Free-tier limits and input budgets (`[limits]`).
    #[serde(default)]
    pub limits: LimitsConfig,

    /// Response cache settings (`[cache]`).
    #[serde(default)]
    pub cache: CacheConfig,

    /// Premium subscription and payment settings (`[premium]`).
    #[serde(default)]
    pub premium: PremiumConfig,
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot token from BotFather. Overridden by `CAREERLENS_BOT_TOKEN` or
    /// `BOT_TOKEN` env vars.
    #[serde(default)]
    pub bot_token: String,
    /// Bot API base URL (override for local test servers).
    #[serde(default = "default_telegram_api_base")]
    pub api_base: String,
    /// Support handle shown in error messages.
    #[serde(default = "default_support_handle")]
    pub support_handle: String,
    /// Long-poll timeout passed to getUpdates. Must stay below the HTTP
    /// client's request timeout.
    #[serde(default = "default_poll_timeout_secs")]
    pub poll_timeout_secs: u64,
    /// Per-update handling deadline; updates exceeding it are abandoned.
    #[serde(default = "default_handler_deadline_secs")]
    pub handler_deadline_secs: u64,
    /// Maximum accepted attachment size in bytes.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

/// Gemini `generateContent` settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// API key. Overridden by `GEMINI_API_KEY` or `GOOGLE_API_KEY` env vars.
    #[serde(default)]
    pub api_key: Option<String>,
    /// API base URL (override for proxy deployments).
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
    /// Model name routed through `generateContent`.
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_top_p")]
    pub top_p: f64,
    /// Output token budget. Full analysis JSON needs headroom or responses
    /// get cut at the budget and rejected as truncated.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

/// Free-tier limits and text budgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Free analyses per identity per UTC day.
    #[serde(default = "default_free_daily_limit")]
    pub free_daily_limit: u32,
    /// Resume text budget sent to the model; longer input is cut with a marker.
    #[serde(default = "default_max_resume_chars")]
    pub max_resume_chars: usize,
    /// Job-description budget for tailoring.
    #[serde(default = "default_max_job_chars")]
    pub max_job_chars: usize,
    /// Minimum resume length accepted from chat.
    #[serde(default = "default_min_resume_chars")]
    pub min_resume_chars: usize,
    /// Minimum job-description length accepted for tailoring.
    #[serde(default = "default_min_job_chars")]
    pub min_job_chars: usize,
}

/// Response cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Time-to-live for cached results.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

/// Premium subscription settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremiumConfig {
    /// Telegram payment provider token from BotFather. Empty disables the
    /// purchase flow. Overridden by `PAYMENT_PROVIDER_TOKEN` env var.
    #[serde(default)]
    pub provider_token: String,
    /// Price in minor currency units (cents for USD).
    #[serde(default = "default_premium_price")]
    pub price_minor_units: u32,
    /// ISO 4217 currency code.
    #[serde(default = "default_premium_currency")]
    pub currency: String,
    /// Subscription duration granted per purchase.
    #[serde(default = "default_premium_days")]
    pub days: u32,
}

fn default_telegram_api_base() -> String {
    "https://api.telegram.org".into()
}
fn default_support_handle() -> String {
    "@CareerLensSupport".into()
}
fn default_poll_timeout_secs() -> u64 {
    25
}
fn default_handler_deadline_secs() -> u64 {
    25
}
fn default_max_file_bytes() -> u64 {
    2 * 1024 * 1024
}
fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".into()
}
fn default_gemini_model() -> String {
    "gemini-2.5-flash".into()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_top_p() -> f64 {
    0.95
}
fn default_max_output_tokens() -> u32 {
    4000
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_connect_timeout_secs() -> u64 {
    10
}
fn default_free_daily_limit() -> u32 {
    3
}
fn default_max_resume_chars() -> usize {
    3500
}
fn default_max_job_chars() -> usize {
    4000
}
fn default_min_resume_chars() -> usize {
    100
}
fn default_min_job_chars() -> usize {
    80
}
fn default_cache_ttl_secs() -> u64 {
    6 * 3600
}
fn default_premium_price() -> u32 {
    999
}
fn default_premium_currency() -> String {
    "USD".into()
}
fn default_premium_days() -> u32 {
    30
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            api_base: default_telegram_api_base(),
            support_handle: default_support_handle(),
            poll_timeout_secs: default_poll_timeout_secs(),
            handler_deadline_secs: default_handler_deadline_secs(),
            max_file_bytes: default_max_file_bytes(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            free_daily_limit: default_free_daily_limit(),
            max_resume_chars: default_max_resume_chars(),
            max_job_chars: default_max_job_chars(),
            min_resume_chars: default_min_resume_chars(),
            min_job_chars: default_min_job_chars(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for PremiumConfig {
    fn default() -> Self {
        Self {
            provider_token: String::new(),
            price_minor_units: default_premium_price(),
            currency: default_premium_currency(),
            days: default_premium_days(),
        }
    }
}

impl Config {
    /// Load configuration from `override_path` or the default location.
    /// A missing file is not an error; defaults apply.
    pub fn load(override_path: Option<&Path>) -> Result<Self> {
        let path = match override_path {
            Some(p) => p.to_path_buf(),
            None => Self::default_path()?,
        };

        let mut config: Config = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config {}", path.display()))?;
            toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))?
        } else {
            Config::default()
        };

        config.config_path = path;
        config.apply_env_overrides();
        Ok(config)
    }

    fn default_path() -> Result<PathBuf> {
        if let Some(path) = non_empty_env("CAREERLENS_CONFIG") {
            return Ok(PathBuf::from(path));
        }
        let dirs = UserDirs::new().context("cannot determine home directory")?;
        Ok(dirs.home_dir().join(".careerlens").join("config.toml"))
    }

    /// Environment variables override file-provided secrets.
    fn apply_env_overrides(&mut self) {
        if let Some(token) =
            non_empty_env("CAREERLENS_BOT_TOKEN").or_else(|| non_empty_env("BOT_TOKEN"))
        {
            self.telegram.bot_token = token;
        }
        if let Some(key) = non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("GOOGLE_API_KEY"))
        {
            self.gemini.api_key = Some(key);
        }
        if let Some(token) = non_empty_env("PAYMENT_PROVIDER_TOKEN") {
            self.premium.provider_token = token;
        }
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Build the shared long-lived HTTP client used for all outbound calls.
/// Created once at startup and reused for the process lifetime.
pub fn build_http_client(config: &GeminiConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .build()
        .context("building HTTP client")
}
