//! Presentation: build chat replies (Discord message/embed JSON shape)

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::assets::{Asset, AssetRegistry};
use crate::types::{AssetQuote, QuoteMap, ReducedSeries, Trend};

pub const COLOR_UP: u32 = 0x00ff00;
pub const COLOR_DOWN: u32 = 0xff0000;
pub const COLOR_INFO: u32 = 0x0099ff;

const FOOTER_SOURCE: &str = "Data from CoinGecko API";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedImage {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<EmbedField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<EmbedImage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Embed {
    pub fn new(title: impl Into<String>, color: u32) -> Self {
        Self {
            title: title.into(),
            color,
            ..Default::default()
        }
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
            inline,
        });
        self
    }

    pub fn image(mut self, url: impl Into<String>) -> Self {
        self.image = Some(EmbedImage { url: url.into() });
        self
    }

    pub fn footer(mut self, text: impl Into<String>) -> Self {
        self.footer = Some(EmbedFooter { text: text.into() });
        self
    }

    pub fn timestamp(mut self, at: DateTime<Utc>) -> Self {
        self.timestamp = Some(at);
        self
    }
}

/// A message to post: plain text, embeds, or both
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub embeds: Vec<Embed>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            embeds: Vec::new(),
        }
    }

    pub fn embed(embed: Embed) -> Self {
        Self {
            content: None,
            embeds: vec![embed],
        }
    }
}

/// Group the integer part with commas: 67123 -> "67,123"
fn group_thousands(int_part: &str) -> String {
    let digits: Vec<char> = int_part.chars().collect();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    out
}

/// Human amount: 2 decimals with grouping from 1 up, up to 6 decimals below 1
pub fn format_amount(value: f64) -> String {
    if !value.is_finite() {
        return "N/A".to_string();
    }

    let negative = value < 0.0;
    let abs = value.abs();

    let formatted = if abs >= 1.0 {
        let fixed = format!("{:.2}", abs);
        let (int_part, frac) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
        format!("{}.{}", group_thousands(int_part), frac)
    } else {
        let fixed = format!("{:.6}", abs);
        let trimmed = fixed.trim_end_matches('0');
        if trimmed.ends_with('.') {
            format!("{}00", trimmed)
        } else {
            trimmed.to_string()
        }
    };

    if negative {
        format!("-{}", formatted)
    } else {
        formatted
    }
}

/// Amount with the currency's usual prefix
pub fn format_money(currency: &str, value: f64) -> String {
    let amount = format_amount(value);
    match currency.to_lowercase().as_str() {
        "usd" => format!("${}", amount),
        "idr" => format!("Rp{}", amount),
        "eur" => format!("€{}", amount),
        other => format!("{} {}", amount, other.to_uppercase()),
    }
}

/// Signed percentage, "N/A" when unknown
pub fn format_change(change: Option<f64>) -> String {
    match change {
        Some(c) if c.is_finite() => format!("{:+.2}%", c),
        _ => "N/A".to_string(),
    }
}

/// A missing or negative 24h change renders as falling
fn change_is_up(change: Option<f64>) -> bool {
    change.map(|c| c >= 0.0).unwrap_or(false)
}

fn currency_label(currency: &str) -> String {
    let emoji = match currency.to_lowercase().as_str() {
        "usd" => "💵",
        "idr" => "💴",
        "eur" => "💶",
        _ => "💱",
    };
    format!("{} {}", emoji, currency.to_uppercase())
}

/// Price card for a single asset
pub fn price_card(asset: &Asset, quote: &AssetQuote, now: DateTime<Utc>) -> Reply {
    let primary_change = quote
        .get("usd")
        .or_else(|| quote.quotes.first())
        .and_then(|q| q.change_24h);
    let color = if change_is_up(primary_change) { COLOR_UP } else { COLOR_DOWN };

    let mut embed = Embed::new(format!("💰 {} Price Info", asset.name), color)
        .description(format!("Current price of {}", asset.name));

    for q in &quote.quotes {
        embed = embed.field(
            currency_label(&q.currency),
            format!("{} ({})", format_money(&q.currency, q.price), format_change(q.change_24h)),
            true,
        );
    }

    Reply::embed(embed.footer(FOOTER_SOURCE).timestamp(now))
}

/// One-line-per-asset USD overview, in registry order
pub fn summary_card(
    title: &str,
    registry: &AssetRegistry,
    quotes: &QuoteMap,
    trends: &[(String, Trend)],
    trend_days: u32,
    now: DateTime<Utc>,
) -> Reply {
    let mut embed = Embed::new(title, COLOR_INFO)
        .description("Current cryptocurrency prices in USD");

    for asset in registry.assets() {
        let Some(quote) = quotes.get(&asset.id) else {
            continue;
        };
        let Some(usd) = quote.get("usd").or_else(|| quote.quotes.first()) else {
            continue;
        };

        let emoji = if change_is_up(usd.change_24h) { "🟢" } else { "🔴" };
        let mut value = format!(
            "{} ({} {})",
            format_money(&usd.currency, usd.price),
            emoji,
            format_change(usd.change_24h)
        );
        if let Some((_, trend)) = trends.iter().find(|(id, _)| id == &asset.id) {
            value.push_str(&format!("\n{}d: {} {}", trend_days, trend.emoji(), trend.as_str()));
        }

        embed = embed.field(asset.name.clone(), value, true);
    }

    Reply::embed(embed.footer(FOOTER_SOURCE).timestamp(now))
}

/// Reduced-series chart card; `currency` is the one the history was fetched in
pub fn chart_card(
    asset: &Asset,
    series: &ReducedSeries,
    currency: &str,
    days: u32,
    chart_url: Option<String>,
    now: DateTime<Utc>,
) -> Reply {
    let color = series.trend.color();
    let change = series
        .change_percent()
        .map(|c| format!("{:+.2}%", c.round_dp(2)))
        .unwrap_or_else(|| "N/A".to_string());

    let mut embed = Embed::new(format!("📈 {} {}d chart", asset.name, days), color).description(
        format!("Trend: {} {} ({})", series.trend.emoji(), series.trend.as_str(), change),
    );

    for point in &series.points {
        let price = point.price.to_f64().unwrap_or_default();
        embed = embed.field(point.label.clone(), format_money(currency, price), true);
    }

    if let Some(url) = chart_url {
        embed = embed.image(url);
    }

    Reply::embed(embed.footer(FOOTER_SOURCE).timestamp(now))
}

/// Command reference
pub fn help_card(prefix: &str, registry: &AssetRegistry) -> Reply {
    let mut embed = Embed::new("🤖 Crypto Price Tracker Commands", COLOR_INFO)
        .description("Available commands:");

    for asset in registry.assets() {
        let names = asset
            .aliases
            .iter()
            .map(|a| format!("{}{}", prefix, a))
            .collect::<Vec<_>>()
            .join(" or ");
        embed = embed.field(names, format!("Current {} price", asset.name), true);
    }

    embed = embed
        .field(
            format!("{p}crypto or {p}all", p = prefix),
            "Price summary of every cryptocurrency",
            false,
        )
        .field(
            format!("{}chart <asset> [days]", prefix),
            "Price chart with trend (default 7 days)",
            false,
        )
        .field(format!("{}help", prefix), "Show this command list", false);

    Reply::embed(embed.footer("Cryptocurrency Price Tracker Bot"))
}

pub fn unknown_asset(token: &str, registry: &AssetRegistry) -> Reply {
    Reply::text(format!(
        "unknown asset: {}. Known assets: {}",
        token,
        registry.short_aliases().join(", ")
    ))
}

pub fn no_history(asset: &Asset) -> Reply {
    Reply::text(format!("No historical data available for {}.", asset.name))
}

pub fn fetch_failed(what: &str) -> Reply {
    Reply::text(format!(
        "Sorry, could not fetch {} right now. Please try again later.",
        what
    ))
}

pub fn usage(text: &str) -> Reply {
    Reply::text(format!("Usage: {}", text))
}
