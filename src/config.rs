use std::env;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Which sports data API fixtures come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    FootballData,
    ApiFootball,
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "football-data" | "football_data" => Ok(ProviderKind::FootballData),
            "api-football" | "api_football" | "api-sports" => Ok(ProviderKind::ApiFootball),
            other => bail!("Unknown FOOTBALL_PROVIDER: {}", other),
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token
    pub telegram_token: String,

    /// Telegram Bot API base URL
    pub telegram_api_url: String,

    /// Long-poll window in seconds for getUpdates
    pub poll_timeout: u64,

    /// Selected fixture provider
    pub provider: ProviderKind,

    /// football-data.org base URL and token
    pub football_data_url: String,
    pub football_data_token: Option<String>,

    /// API-Football base URL and key
    pub api_football_url: String,
    pub api_football_key: Option<String>,

    /// IANA timezone passed to API-Football fixture queries
    pub api_football_timezone: Option<String>,

    /// Seconds a computed tip list stays cached
    pub cache_ttl: u64,

    /// Seconds a user must wait between tip requests
    pub user_cooldown: u64,

    /// Interval in seconds between settlement runs
    pub settle_interval: u64,

    /// Recent matches used to compute team form
    pub form_matches: usize,

    /// Tips below this probability are not offered
    pub min_probability: f64,

    /// Maximum tips per reply
    pub max_tips: usize,

    /// SQLite database path
    pub database_url: String,
}

fn parse_var<T: FromStr>(name: &str, default: &str) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .with_context(|| format!("{} must be a valid number", name))
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let provider: ProviderKind = env::var("FOOTBALL_PROVIDER")
            .unwrap_or_else(|_| "football-data".to_string())
            .parse()?;

        let config = Config {
            telegram_token: env::var("TELEGRAM_TOKEN").context("TELEGRAM_TOKEN must be set")?,

            telegram_api_url: env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| "https://api.telegram.org".to_string()),

            poll_timeout: parse_var("POLL_TIMEOUT", "25")?,

            provider,

            football_data_url: env::var("FOOTBALL_DATA_URL")
                .unwrap_or_else(|_| "https://api.football-data.org/v4".to_string()),
            football_data_token: env::var("FOOTBALL_DATA_TOKEN").ok(),

            api_football_url: env::var("API_FOOTBALL_URL")
                .unwrap_or_else(|_| "https://v3.football.api-sports.io".to_string()),
            api_football_key: env::var("API_FOOTBALL_KEY").ok(),
            api_football_timezone: env::var("API_FOOTBALL_TIMEZONE").ok(),

            cache_ttl: parse_var("CACHE_TTL", "300")?,
            user_cooldown: parse_var("USER_COOLDOWN", "30")?,
            settle_interval: parse_var("SETTLE_INTERVAL", "900")?,
            form_matches: parse_var("FORM_MATCHES", "10")?,
            min_probability: parse_var("MIN_PROBABILITY", "0.0")?,
            max_tips: parse_var("MAX_TIPS", "10")?,

            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:data/tips.db".to_string()),
        };

        config.validate()?;
        Ok(config)
    }

    /// Check the selected provider has credentials and numbers are in range
    pub fn validate(&self) -> Result<()> {
        match self.provider {
            ProviderKind::FootballData if self.football_data_token.is_none() => {
                bail!("FOOTBALL_DATA_TOKEN must be set when FOOTBALL_PROVIDER=football-data")
            }
            ProviderKind::ApiFootball if self.api_football_key.is_none() => {
                bail!("API_FOOTBALL_KEY must be set when FOOTBALL_PROVIDER=api-football")
            }
            _ => {}
        }

        if !(0.0..=1.0).contains(&self.min_probability) {
            bail!("MIN_PROBABILITY must be between 0 and 1");
        }
        if self.form_matches == 0 {
            bail!("FORM_MATCHES must be at least 1");
        }

        Ok(())
    }
}
