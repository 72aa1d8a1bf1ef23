use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const DEFAULT_AI_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1";
pub const DEFAULT_AI_MODEL: &str = "google/gemini-2.5-flash";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_key: String,
    pub port: u16,
    pub ai: AiConfig,
    pub telegram: TelegramConfig,
    pub scraper: ScraperConfig,
}

/// LLM gateway settings. No key means enrichment is disabled.
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub channel_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScraperConfig {
    pub requests_per_minute: u32,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Empty values count as unset
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let scraper = ScraperConfig {
            requests_per_minute: var("SCRAPER_REQUESTS_PER_MINUTE")
                .map(|v| v.parse::<u32>())
                .transpose()
                .context("SCRAPER_REQUESTS_PER_MINUTE must be a valid number")?
                .unwrap_or(60)
                .max(1),
            timeout: Duration::from_secs(
                var("SCRAPER_TIMEOUT_SECS")
                    .map(|v| v.parse::<u64>())
                    .transpose()
                    .context("SCRAPER_TIMEOUT_SECS must be a valid number")?
                    .unwrap_or(30),
            ),
            user_agent: var("SCRAPER_USER_AGENT").unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        };

        Ok(Self {
            supabase_url: var("SUPABASE_URL").context("SUPABASE_URL must be set")?,
            supabase_key: var("SUPABASE_SERVICE_ROLE_KEY")
                .context("SUPABASE_SERVICE_ROLE_KEY must be set")?,
            port: var("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            ai: AiConfig {
                api_key: var("AI_GATEWAY_API_KEY"),
                base_url: var("AI_GATEWAY_URL")
                    .unwrap_or_else(|| DEFAULT_AI_GATEWAY_URL.to_string()),
                model: var("AI_MODEL").unwrap_or_else(|| DEFAULT_AI_MODEL.to_string()),
            },
            telegram: TelegramConfig {
                bot_token: var("TELEGRAM_BOT_TOKEN"),
                channel_id: var("TELEGRAM_CHANNEL_ID"),
            },
            scraper,
        })
    }
}
