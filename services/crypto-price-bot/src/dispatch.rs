//! Message dispatch: parse, resolve, fetch, reduce, render

use chrono::Utc;
use chrono_tz::Tz;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::assets::{Asset, AssetRegistry};
use crate::chart::ChartSpec;
use crate::commands::{self, Command};
use crate::config::BotConfig;
use crate::reducer;
use crate::render::{self, Reply};
use crate::types::*;

/// Upper bound accepted for `!chart <asset> <days>`
const MAX_CHART_DAYS: u32 = 365;

/// Dispatcher settings derived from [`BotConfig`]
#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub prefix: String,
    pub vs_currencies: Vec<String>,
    pub chart_days: u32,
    pub max_points: usize,
    pub tz: Tz,
    pub chart_base_url: String,
}

impl DispatchSettings {
    pub fn from_config(cfg: &BotConfig) -> Result<Self> {
        Ok(Self {
            prefix: cfg.prefix.clone(),
            vs_currencies: cfg.vs_currencies.iter().map(|c| c.to_lowercase()).collect(),
            chart_days: cfg.chart_days,
            max_points: cfg.max_points,
            tz: cfg.tz()?,
            chart_base_url: cfg.chart_base_url.clone(),
        })
    }

    fn chart_currency(&self) -> &str {
        self.vs_currencies.first().map(|c| c.as_str()).unwrap_or("usd")
    }
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
            vs_currencies: vec!["usd".into(), "idr".into(), "eur".into()],
            chart_days: 7,
            max_points: reducer::DEFAULT_MAX_POINTS,
            tz: Tz::UTC,
            chart_base_url: crate::chart::DEFAULT_CHART_BASE_URL.to_string(),
        }
    }
}

/// Turns inbound chat messages into replies
pub struct Dispatcher {
    registry: Arc<AssetRegistry>,
    source: Arc<dyn PriceDataSource>,
    settings: DispatchSettings,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<AssetRegistry>,
        source: Arc<dyn PriceDataSource>,
        settings: DispatchSettings,
    ) -> Self {
        Self {
            registry,
            source,
            settings,
        }
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn source(&self) -> &Arc<dyn PriceDataSource> {
        &self.source
    }

    /// Handle one chat message; `None` means stay silent
    pub async fn handle_message(&self, content: &str, author_is_bot: bool) -> Option<Reply> {
        if author_is_bot {
            return None;
        }
        let command = commands::parse(content, &self.settings.prefix)?;
        debug!("Parsed command {:?}", command);
        self.handle(command).await
    }

    pub async fn handle(&self, command: Command) -> Option<Reply> {
        match command {
            Command::Price(token) => {
                // Bare unknown commands may belong to another bot sharing the prefix
                let asset = self.registry.resolve(&token)?.clone();
                Some(self.price(&asset).await)
            }
            Command::Summary => Some(self.summary().await),
            Command::Help => Some(render::help_card(&self.settings.prefix, &self.registry)),
            Command::Chart { token: None, .. } => Some(render::usage(&format!(
                "{}chart <asset> [days]",
                self.settings.prefix
            ))),
            Command::Chart {
                token: Some(token),
                days,
            } => Some(self.chart(&token, days).await),
        }
    }

    async fn price(&self, asset: &Asset) -> Reply {
        let ids = vec![asset.id.clone()];
        match self
            .source
            .fetch_quotes(&ids, &self.settings.vs_currencies)
            .await
        {
            Ok(quotes) => match quotes.get(&asset.id) {
                Some(quote) => render::price_card(asset, quote, Utc::now()),
                None => {
                    warn!("No quote returned for {}", asset.id);
                    render::fetch_failed(&format!("{} data", asset.name))
                }
            },
            Err(e) => {
                warn!("Error fetching price for {}: {}", asset.id, e);
                render::fetch_failed("cryptocurrency data")
            }
        }
    }

    async fn summary(&self) -> Reply {
        let ids = self.registry.ids();
        let usd = vec!["usd".to_string()];
        match self.source.fetch_quotes(&ids, &usd).await {
            Ok(quotes) if !quotes.is_empty() => render::summary_card(
                "💰 Cryptocurrency Price Summary",
                &self.registry,
                &quotes,
                &[],
                self.settings.chart_days,
                Utc::now(),
            ),
            Ok(_) => {
                warn!("Summary request returned no quotes");
                render::fetch_failed("cryptocurrency data")
            }
            Err(e) => {
                warn!("Error fetching all cryptocurrency data: {}", e);
                render::fetch_failed("cryptocurrency data")
            }
        }
    }

    async fn chart(&self, token: &str, days: Option<u32>) -> Reply {
        let Some(asset) = self.registry.resolve(token) else {
            return render::unknown_asset(token, &self.registry);
        };
        let days = days
            .unwrap_or(self.settings.chart_days)
            .clamp(1, MAX_CHART_DAYS);

        match self.chart_series(&asset.id, days).await {
            Ok(series) => {
                let chart_url = ChartSpec::from_series(format!("{} {}d", asset.name, days), &series)
                    .image_url(&self.settings.chart_base_url)
                    .map_err(|e| warn!("Chart URL not built: {}", e))
                    .ok();
                render::chart_card(
                    asset,
                    &series,
                    self.settings.chart_currency(),
                    days,
                    chart_url,
                    Utc::now(),
                )
            }
            Err(BotError::EmptyHistory) => render::no_history(asset),
            Err(e) => {
                warn!("Error building chart for {}: {}", asset.id, e);
                render::fetch_failed(&format!("{} history", asset.name))
            }
        }
    }

    /// Fetch and reduce the history of one asset in the chart currency
    pub async fn chart_series(&self, asset_id: &str, days: u32) -> Result<ReducedSeries> {
        self.series_in(asset_id, self.settings.chart_currency(), days).await
    }

    async fn series_in(&self, asset_id: &str, currency: &str, days: u32) -> Result<ReducedSeries> {
        let history = self.source.fetch_history(asset_id, currency, days).await?;
        reducer::reduce(&history, self.settings.max_points, self.settings.tz)
    }

    /// Daily broadcast: every quote plus a trend over the configured window
    pub async fn daily_summary(&self) -> Result<Reply> {
        let ids = self.registry.ids();
        let usd = vec!["usd".to_string()];
        let quotes = self.source.fetch_quotes(&ids, &usd).await?;
        if quotes.is_empty() {
            return Err(BotError::InvalidResponse("no quotes returned".to_string()));
        }

        let days = self.settings.chart_days;
        // Trends in USD to match the quotes on the card
        let series = join_all(ids.iter().map(|id| self.series_in(id, "usd", days))).await;

        let trends: Vec<(String, Trend)> = ids
            .iter()
            .zip(series)
            .filter_map(|(id, result)| match result {
                Ok(s) => Some((id.clone(), s.trend)),
                Err(e) => {
                    warn!(
                        "No trend for {} in daily summary: {}",
                        self.registry.display_name(id),
                        e
                    );
                    None
                }
            })
            .collect();

        let now = Utc::now();
        let date = now.with_timezone(&self.settings.tz).format("%-d/%-m/%Y");
        info!(
            "Daily summary built: {} quotes, {} trends",
            quotes.len(),
            trends.len()
        );

        Ok(render::summary_card(
            &format!("📅 Daily Crypto Update ({})", date),
            &self.registry,
            &quotes,
            &trends,
            days,
            now,
        ))
    }
}
