use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Canonical CoinGecko coin id ("bitcoin", "manta-network")
pub type AssetId = String;

/// One historical sample as delivered by the price-history endpoint
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp_ms: i64,
    pub price: f64,
}

impl PricePoint {
    pub fn new(timestamp_ms: i64, price: f64) -> Self {
        Self { timestamp_ms, price }
    }
}

/// Price of one asset in one fiat currency
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyQuote {
    pub currency: String,        // "usd", "idr", "eur"
    pub price: f64,
    pub change_24h: Option<f64>, // percent
}

/// Current prices of an asset across the configured currencies
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetQuote {
    pub asset: AssetId,
    pub quotes: Vec<CurrencyQuote>,
}

impl AssetQuote {
    pub fn get(&self, currency: &str) -> Option<&CurrencyQuote> {
        self.quotes
            .iter()
            .find(|q| q.currency.eq_ignore_ascii_case(currency))
    }
}

/// Quotes keyed by asset id
pub type QuoteMap = HashMap<AssetId, AssetQuote>;

/// Direction of a reduced series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Flat,
}

impl Trend {
    /// Classify from first and last price; only a strict increase counts as rising
    pub fn classify(first: Decimal, last: Decimal) -> Self {
        if first < last {
            Trend::Rising
        } else if first > last {
            Trend::Falling
        } else {
            Trend::Flat
        }
    }

    pub fn is_rising(&self) -> bool {
        matches!(self, Trend::Rising)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Rising => "rising",
            Trend::Falling => "falling",
            Trend::Flat => "flat",
        }
    }

    /// Presentation colour: green when rising, red otherwise
    pub fn color(&self) -> u32 {
        if self.is_rising() {
            0x00ff00
        } else {
            0xff0000
        }
    }

    pub fn emoji(&self) -> &'static str {
        if self.is_rising() {
            "🟢"
        } else {
            "🔴"
        }
    }
}

/// One labeled, rounded point of a reduced series
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub timestamp_ms: i64,
    pub label: String, // "17/10"
    pub price: Decimal,
}

/// Down-sampled series ready for rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReducedSeries {
    pub points: Vec<ChartPoint>,
    pub trend: Trend,
}

impl ReducedSeries {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&ChartPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&ChartPoint> {
        self.points.last()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.label.as_str()).collect()
    }

    pub fn prices(&self) -> Vec<Decimal> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Change from first to last point in percent, None when the first price is zero
    pub fn change_percent(&self) -> Option<Decimal> {
        let first = self.first()?.price;
        let last = self.last()?.price;
        if first.is_zero() {
            return None;
        }
        Some((last - first) / first * Decimal::from(100))
    }
}

/// Data source health/status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceHealth {
    pub source: String,
    pub is_healthy: bool,
    pub last_success: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub success_rate: f64,
    pub avg_latency_ms: u64,
}

/// Error types for the bot
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("unknown asset: {0}")]
    AssetNotFound(String),

    #[error("no historical data available")]
    EmptyHistory,

    #[error("invalid price value: {0}")]
    InvalidPrice(f64),

    #[error("upstream request failed: {0}")]
    Upstream(String),

    #[error("rate limit exceeded for {source_name}")]
    RateLimited { source_name: String, retry_after: Option<u64> },

    #[error("invalid response format: {0}")]
    InvalidResponse(String),

    #[error("chat gateway error: {0}")]
    Gateway(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl BotError {
    /// True for failures of the remote price API rather than of user input
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            BotError::Upstream(_) | BotError::RateLimited { .. } | BotError::InvalidResponse(_)
        )
    }
}

/// Result type for bot operations
pub type Result<T> = std::result::Result<T, BotError>;

/// Trait for price data sources
#[async_trait::async_trait]
pub trait PriceDataSource: Send + Sync {
    /// Current prices for the given assets in each requested currency
    async fn fetch_quotes(&self, ids: &[AssetId], vs_currencies: &[String]) -> Result<QuoteMap>;

    /// Historical `[timestamp, price]` samples, oldest first
    async fn fetch_history(&self, id: &str, vs_currency: &str, days: u32)
        -> Result<Vec<PricePoint>>;

    /// Source health status
    async fn health(&self) -> SourceHealth;

    /// Source name
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_trend_classification() {
        assert_eq!(Trend::classify(d("100"), d("120")), Trend::Rising);
        assert_eq!(Trend::classify(d("120"), d("100")), Trend::Falling);
        assert_eq!(Trend::classify(d("100"), d("100")), Trend::Flat);
        assert!(!Trend::Flat.is_rising());
        assert_eq!(Trend::Flat.emoji(), "🔴");
        assert_eq!(Trend::Rising.color(), 0x00ff00);
    }

    #[test]
    fn test_change_percent() {
        let series = ReducedSeries {
            points: vec![
                ChartPoint { timestamp_ms: 0, label: "1/1".into(), price: d("100") },
                ChartPoint { timestamp_ms: 1, label: "2/1".into(), price: d("110") },
            ],
            trend: Trend::Rising,
        };
        assert_eq!(series.change_percent(), Some(d("10")));
        assert_eq!(series.labels(), vec!["1/1", "2/1"]);
    }

    #[test]
    fn test_upstream_classification() {
        assert!(BotError::Upstream("boom".into()).is_upstream());
        assert!(!BotError::EmptyHistory.is_upstream());
        assert_eq!(BotError::AssetNotFound("foo".into()).to_string(), "unknown asset: foo");
    }
}
