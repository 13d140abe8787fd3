//! Bot configuration
//!
//! Layered: built-in defaults, then an optional `price-bot.{toml,yaml,json}` file in the
//! working directory, then `PRICE_BOT_*` environment variables (a `.env` file is loaded
//! first when present).

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::types::{BotError, Result};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct BotConfig {
    /// Command prefix
    #[serde(default = "default_prefix")]
    pub prefix: String,
    #[serde(default = "default_coingecko_base_url")]
    pub coingecko_base_url: String,
    #[serde(default)]
    pub coingecko_api_key: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Currencies shown on price cards; the first one drives charts
    #[serde(default = "default_vs_currencies")]
    pub vs_currencies: Vec<String>,
    #[serde(default = "default_chart_days")]
    pub chart_days: u32,
    #[serde(default = "default_max_points")]
    pub max_points: usize,
    #[serde(default = "default_chart_base_url")]
    pub chart_base_url: String,
    /// IANA zone for chart labels and the daily schedule
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Local time of the daily broadcast, `HH:MM`
    #[serde(default = "default_daily_update_time")]
    pub daily_update_time: String,
    #[serde(default = "default_true")]
    pub daily_update_enabled: bool,
    /// Destination of the daily broadcast
    #[serde(default)]
    pub discord_webhook_url: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: default_prefix(),
            coingecko_base_url: default_coingecko_base_url(),
            coingecko_api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
            vs_currencies: default_vs_currencies(),
            chart_days: default_chart_days(),
            max_points: default_max_points(),
            chart_base_url: default_chart_base_url(),
            timezone: default_timezone(),
            daily_update_time: default_daily_update_time(),
            daily_update_enabled: true,
            discord_webhook_url: None,
            port: default_port(),
        }
    }
}

impl BotConfig {
    /// Load from `.env`, config file and process environment
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::load_from(None)
    }

    /// Load with an explicit environment map instead of the process environment
    pub fn load_from(env: Option<config::Map<String, String>>) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name("price-bot").required(false))
            .add_source(
                config::Environment::with_prefix("PRICE_BOT")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("vs_currencies")
                    .source(env),
            )
            .build()
            .map_err(|e| BotError::Config(e.to_string()))?;

        let cfg: BotConfig = settings
            .try_deserialize()
            .map_err(|e| BotError::Config(e.to_string()))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.prefix.trim().is_empty() {
            return Err(BotError::Config("prefix must not be empty".to_string()));
        }
        if self.vs_currencies.is_empty() {
            return Err(BotError::Config("vs_currencies must not be empty".to_string()));
        }
        if self.max_points == 0 {
            return Err(BotError::Config("max_points must be at least 1".to_string()));
        }
        if self.chart_days == 0 {
            return Err(BotError::Config("chart_days must be at least 1".to_string()));
        }
        self.tz()?;
        self.daily_time()?;
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| BotError::Config(format!("bad timezone {}: {}", self.timezone, e)))
    }

    pub fn daily_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.daily_update_time, "%H:%M").map_err(|e| {
            BotError::Config(format!(
                "bad daily_update_time {}: {}",
                self.daily_update_time, e
            ))
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

fn default_prefix() -> String { "!".to_string() }
fn default_coingecko_base_url() -> String { crate::sources::coingecko::DEFAULT_BASE_URL.to_string() }
fn default_request_timeout_secs() -> u64 { 10 }
fn default_vs_currencies() -> Vec<String> { vec!["usd".into(), "idr".into(), "eur".into()] }
fn default_chart_days() -> u32 { 7 }
fn default_max_points() -> usize { crate::reducer::DEFAULT_MAX_POINTS }
fn default_chart_base_url() -> String { crate::chart::DEFAULT_CHART_BASE_URL.to_string() }
fn default_timezone() -> String { "UTC".to_string() }
fn default_daily_update_time() -> String { "08:00".to_string() }
fn default_true() -> bool { true }
fn default_port() -> u16 { 8080 }

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> config::Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults() {
        let cfg = BotConfig::load_from(Some(env(&[]))).unwrap();
        assert_eq!(cfg, BotConfig::default());
        assert_eq!(cfg.prefix, "!");
        assert_eq!(cfg.max_points, 7);
        assert_eq!(cfg.tz().unwrap(), Tz::UTC);
    }

    #[test]
    fn test_environment_overrides() {
        let cfg = BotConfig::load_from(Some(env(&[
            ("PRICE_BOT_PREFIX", "$"),
            ("PRICE_BOT_VS_CURRENCIES", "eur,usd"),
            ("PRICE_BOT_TIMEZONE", "Asia/Jakarta"),
            ("PRICE_BOT_DAILY_UPDATE_TIME", "07:30"),
            ("PRICE_BOT_PORT", "9000"),
            ("PRICE_BOT_DISCORD_WEBHOOK_URL", "https://discord.test/api/webhooks/1/abc"),
        ])))
        .unwrap();

        assert_eq!(cfg.prefix, "$");
        assert_eq!(cfg.vs_currencies, vec!["eur".to_string(), "usd".to_string()]);
        assert_eq!(cfg.tz().unwrap(), chrono_tz::Asia::Jakarta);
        assert_eq!(cfg.daily_time().unwrap(), NaiveTime::from_hms_opt(7, 30, 0).unwrap());
        assert_eq!(cfg.port, 9000);
        assert!(cfg.discord_webhook_url.is_some());
    }

    #[test]
    fn test_validation_errors() {
        let bad_tz = BotConfig { timezone: "Mars/Olympus".into(), ..Default::default() };
        assert!(matches!(bad_tz.validate(), Err(BotError::Config(_))));

        let bad_time = BotConfig { daily_update_time: "25:00".into(), ..Default::default() };
        assert!(bad_time.validate().is_err());

        let no_points = BotConfig { max_points: 0, ..Default::default() };
        assert!(no_points.validate().is_err());

        let no_currency = BotConfig { vs_currencies: vec![], ..Default::default() };
        assert!(no_currency.validate().is_err());
    }
}
