//! Chart description payload (Chart.js config, renderable by QuickChart)

use rust_decimal::prelude::ToPrimitive;
use serde_json::{json, Value};
use url::Url;

use crate::types::{BotError, ReducedSeries, Result, Trend};

pub const DEFAULT_CHART_BASE_URL: &str = "https://quickchart.io/chart";

const DEFAULT_WIDTH: u32 = 600;
const DEFAULT_HEIGHT: u32 = 300;

/// Line chart built from a reduced series
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub labels: Vec<String>,
    pub data: Vec<f64>,
    pub trend: Trend,
    pub width: u32,
    pub height: u32,
}

impl ChartSpec {
    pub fn from_series(title: impl Into<String>, series: &ReducedSeries) -> Self {
        Self {
            title: title.into(),
            labels: series.points.iter().map(|p| p.label.clone()).collect(),
            data: series
                .points
                .iter()
                .map(|p| p.price.to_f64().unwrap_or_default())
                .collect(),
            trend: series.trend,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    fn line_color(&self) -> &'static str {
        if self.trend.is_rising() {
            "rgb(0, 200, 83)"
        } else {
            "rgb(213, 0, 0)"
        }
    }

    /// Chart.js configuration object
    pub fn to_json(&self) -> Value {
        json!({
            "type": "line",
            "data": {
                "labels": self.labels,
                "datasets": [{
                    "label": self.title,
                    "data": self.data,
                    "fill": false,
                    "borderColor": self.line_color(),
                    "tension": 0.3,
                }]
            },
            "options": {
                "plugins": {
                    "legend": { "display": false },
                    "title": { "display": true, "text": self.title },
                }
            }
        })
    }

    /// Image URL with the config passed as the `c` query parameter
    pub fn image_url(&self, base_url: &str) -> Result<String> {
        let mut url = Url::parse(base_url)
            .map_err(|e| BotError::Config(format!("invalid chart base url {}: {}", base_url, e)))?;

        url.query_pairs_mut()
            .append_pair("w", &self.width.to_string())
            .append_pair("h", &self.height.to_string())
            .append_pair("c", &self.to_json().to_string());

        Ok(url.into())
    }
}
