use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use careerlens::analysis::AnalysisService;
use careerlens::analytics::AnalyticsSink;
use careerlens::channels::{Channel, TelegramChannel};
use careerlens::config::{build_http_client, Config};
use careerlens::providers::GeminiClient;
use careerlens::quota::QuotaLedger;

#[derive(Parser)]
#[command(
    name = "careerlens",
    version,
    about = "Resume-analysis assistant for Telegram"
)]
struct Cli {
    /// Path to config.toml (default: ~/.careerlens/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot (default)
    Run,
    /// Validate configuration and credentials without starting
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("careerlens=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Doctor => doctor(&config),
        Commands::Run => run(config).await,
    }
}

async fn run(config: Config) -> Result<()> {
    anyhow::ensure!(
        !config.telegram.bot_token.trim().is_empty(),
        "telegram bot_token is not configured (set BOT_TOKEN or [telegram].bot_token in {})",
        config.config_path.display()
    );

    // One HTTP client for the process lifetime, shared by the gateway and
    // the Telegram loop.
    let client = build_http_client(&config.gemini)?;
    let gateway = Arc::new(GeminiClient::new(client.clone(), &config.gemini)?);

    let analytics = Arc::new(AnalyticsSink::new());
    let service = Arc::new(AnalysisService::new(
        gateway,
        QuotaLedger::new(config.limits.free_daily_limit),
        analytics.clone(),
        config.limits.clone(),
        config.cache_ttl(),
        config.gemini.max_output_tokens,
    ));

    let channel = TelegramChannel::new(client, &config, service, analytics);

    tokio::select! {
        result = channel.run() => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown requested");
            Ok(())
        }
    }
}

fn doctor(config: &Config) -> Result<()> {
    println!("config file:     {}", config.config_path.display());
    println!(
        "telegram token:  {}",
        if config.telegram.bot_token.trim().is_empty() {
            "MISSING (set BOT_TOKEN)"
        } else {
            "present"
        }
    );
    println!(
        "gemini api key:  {}",
        if config
            .gemini
            .api_key
            .as_deref()
            .is_some_and(|k| !k.trim().is_empty())
        {
            "present"
        } else {
            "MISSING (set GEMINI_API_KEY)"
        }
    );
    println!("gemini model:    {}", config.gemini.model);
    println!(
        "free tier:       {} analyses/day, resume budget {} chars",
        config.limits.free_daily_limit, config.limits.max_resume_chars
    );
    println!(
        "cache ttl:       {}h",
        config.cache.ttl_secs / 3600
    );
    println!(
        "payments:        {}",
        if config.premium.provider_token.is_empty() {
            "disabled"
        } else {
            "enabled"
        }
    );
    Ok(())
}
