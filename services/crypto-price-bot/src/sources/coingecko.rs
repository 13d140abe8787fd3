use crate::normalizers;
use crate::types::*;
use chrono::{DateTime, Utc};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

/// Internal health tracking for API-free health checks
struct HealthTracker {
    /// Timestamp of last successful request (millis since epoch)
    last_success_ms: AtomicU64,
    /// Timestamp of last failed request (millis since epoch)
    last_failure_ms: AtomicU64,
    success_count: AtomicU64,
    failure_count: AtomicU64,
    /// Last known latency in ms
    last_latency_ms: AtomicU64,
}

impl HealthTracker {
    fn new() -> Self {
        Self {
            last_success_ms: AtomicU64::new(0),
            last_failure_ms: AtomicU64::new(0),
            success_count: AtomicU64::new(0),
            failure_count: AtomicU64::new(0),
            last_latency_ms: AtomicU64::new(0),
        }
    }

    fn record_success(&self, latency_ms: u64) {
        let now_ms = Utc::now().timestamp_millis() as u64;
        self.last_success_ms.store(now_ms, Ordering::Relaxed);
        self.last_latency_ms.store(latency_ms, Ordering::Relaxed);
        self.success_count.fetch_add(1, Ordering::Relaxed);
    }

    fn record_failure(&self) {
        let now_ms = Utc::now().timestamp_millis() as u64;
        self.last_failure_ms.store(now_ms, Ordering::Relaxed);
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    fn is_healthy(&self) -> bool {
        let last_success = self.last_success_ms.load(Ordering::Relaxed);
        let last_failure = self.last_failure_ms.load(Ordering::Relaxed);

        // No traffic yet counts as healthy; otherwise the latest outcome decides
        if last_success == 0 && last_failure == 0 {
            return true;
        }
        last_success >= last_failure
    }

    fn success_rate(&self) -> f64 {
        let successes = self.success_count.load(Ordering::Relaxed);
        let failures = self.failure_count.load(Ordering::Relaxed);
        let total = successes + failures;
        if total == 0 {
            return 1.0;
        }
        successes as f64 / total as f64
    }
}

/// CoinGecko API client
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    request_timeout: Duration,
    health_tracker: HealthTracker,
}

impl CoinGeckoClient {
    pub fn new(base_url: &str, api_key: Option<String>, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| BotError::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            request_timeout,
            health_tracker: HealthTracker::new(),
        })
    }

    /// Build request with optional API key
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut req = self.client.get(&url);

        if let Some(key) = &self.api_key {
            req = req.header("x-cg-pro-api-key", key);
        }

        req
    }

    /// Single GET with timeout; failures are reported, never retried
    async fn request<T: serde::de::DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let request_start = Instant::now();
        debug!("CoinGecko GET {}", endpoint);

        let response = match tokio::time::timeout(
            self.request_timeout,
            self.build_request(endpoint).send(),
        )
        .await
        {
            Ok(Ok(resp)) => resp,
            Ok(Err(e)) => {
                self.health_tracker.record_failure();
                return Err(BotError::Upstream(e.to_string()));
            }
            Err(_) => {
                self.health_tracker.record_failure();
                return Err(BotError::Upstream(format!(
                    "CoinGecko request to {} timed out after {}s",
                    endpoint,
                    self.request_timeout.as_secs()
                )));
            }
        };

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());

            self.health_tracker.record_failure();
            return Err(BotError::RateLimited {
                source_name: "coingecko".to_string(),
                retry_after,
            });
        }

        if !status.is_success() {
            self.health_tracker.record_failure();
            let text = response.text().await.unwrap_or_default();
            return Err(BotError::Upstream(format!(
                "CoinGecko API error ({}): {}",
                status, text
            )));
        }

        let parsed = response.json::<T>().await.map_err(|e| {
            self.health_tracker.record_failure();
            BotError::InvalidResponse(e.to_string())
        })?;

        let latency_ms = request_start.elapsed().as_millis() as u64;
        self.health_tracker.record_success(latency_ms);

        Ok(parsed)
    }

    /// Current prices with 24h change for several coins at once
    pub async fn get_quotes(&self, ids: &[AssetId], vs_currencies: &[String]) -> Result<QuoteMap> {
        if ids.is_empty() || vs_currencies.is_empty() {
            return Ok(QuoteMap::new());
        }

        let currencies: Vec<String> = vs_currencies.iter().map(|c| c.to_lowercase()).collect();
        let endpoint = format!(
            "/simple/price?ids={}&vs_currencies={}&include_24hr_change=true",
            ids.join(","),
            currencies.join(",")
        );

        // {"bitcoin": {"usd": 67000.1, "usd_24h_change": -1.2, ...}, ...}
        let response: HashMap<String, HashMap<String, serde_json::Value>> =
            self.request(&endpoint).await?;

        let mut quotes = QuoteMap::new();
        for id in ids {
            let Some(data) = response.get(id) else {
                debug!("CoinGecko returned no quote for {}", id);
                continue;
            };

            let per_currency: Vec<CurrencyQuote> = currencies
                .iter()
                .filter_map(|currency| {
                    let price = data.get(currency).and_then(|v| v.as_f64())?;
                    let change_24h = data
                        .get(&format!("{}_24h_change", currency))
                        .and_then(|v| v.as_f64());
                    Some(CurrencyQuote {
                        currency: currency.clone(),
                        price,
                        change_24h,
                    })
                })
                .collect();

            if per_currency.is_empty() {
                continue;
            }

            quotes.insert(
                id.clone(),
                AssetQuote {
                    asset: id.clone(),
                    quotes: per_currency,
                },
            );
        }

        Ok(quotes)
    }

    /// Historical prices from `/coins/{id}/market_chart`
    ///
    /// Granularity is chosen by CoinGecko from `days`:
    /// - 1 day: ~5 minute points
    /// - 2-90 days: hourly points
    /// - above 90 days: daily points
    pub async fn get_history(&self, id: &str, vs_currency: &str, days: u32) -> Result<Vec<PricePoint>> {
        let endpoint = format!(
            "/coins/{}/market_chart?vs_currency={}&days={}",
            id,
            vs_currency.to_lowercase(),
            days.max(1)
        );

        let response: MarketChartResponse = self.request(&endpoint).await?;

        Ok(normalizers::normalize_history(id, &response.prices))
    }

    /// Get health status using internal metrics (no API call)
    pub async fn health(&self) -> SourceHealth {
        let last_success_ms = self.health_tracker.last_success_ms.load(Ordering::Relaxed);
        let last_success = if last_success_ms > 0 {
            DateTime::from_timestamp_millis(last_success_ms as i64)
        } else {
            None
        };

        let is_healthy = self.health_tracker.is_healthy();
        let success_rate = self.health_tracker.success_rate();
        let latency = self.health_tracker.last_latency_ms.load(Ordering::Relaxed);

        SourceHealth {
            source: "coingecko".to_string(),
            is_healthy,
            last_success,
            last_error: if is_healthy {
                None
            } else {
                Some("Recent failures detected".to_string())
            },
            success_rate,
            avg_latency_ms: latency,
        }
    }
}

// Response types for CoinGecko API
#[derive(Debug, serde::Deserialize)]
struct MarketChartResponse {
    /// `[[timestamp_ms, price], ...]`
    prices: Vec<[Option<f64>; 2]>,
}

#[async_trait::async_trait]
impl PriceDataSource for CoinGeckoClient {
    async fn fetch_quotes(&self, ids: &[AssetId], vs_currencies: &[String]) -> Result<QuoteMap> {
        self.get_quotes(ids, vs_currencies).await
    }

    async fn fetch_history(
        &self,
        id: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<Vec<PricePoint>> {
        self.get_history(id, vs_currency, days).await
    }

    async fn health(&self) -> SourceHealth {
        CoinGeckoClient::health(self).await
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}
