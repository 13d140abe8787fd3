//! Series reduction: down-sample a price history to a handful of labeled points.
//!
//! The walk starts at index 0 and advances by `max(1, n / max_points)`, stopping once
//! `max_points` samples are collected. The final input sample is always present in the
//! output; when the walk skipped it, it is appended, so a reduced series may hold
//! `max_points + 1` points.

use chrono::{DateTime, TimeZone};
use chrono_tz::Tz;
use rust_decimal::prelude::*;

use crate::types::{BotError, ChartPoint, PricePoint, ReducedSeries, Result, Trend};

/// Default number of points kept by the step walk
pub const DEFAULT_MAX_POINTS: usize = 7;

/// Reduce `samples` to at most `max_points` (+1 for the trailing sample).
///
/// Samples are taken in the order given. An empty input is an error, never an
/// empty series.
pub fn reduce(samples: &[PricePoint], max_points: usize, tz: Tz) -> Result<ReducedSeries> {
    if samples.is_empty() {
        return Err(BotError::EmptyHistory);
    }

    let indices = sample_indices(samples.len(), max_points);

    let points = indices
        .into_iter()
        .map(|idx| to_chart_point(&samples[idx], tz))
        .collect::<Result<Vec<_>>>()?;

    // Non-empty input always yields at least one point
    let trend = match (points.first(), points.last()) {
        (Some(first), Some(last)) => Trend::classify(first.price, last.price),
        _ => return Err(BotError::EmptyHistory),
    };

    Ok(ReducedSeries { points, trend })
}

/// Indices picked by the step walk, including the trailing index
pub fn sample_indices(n: usize, max_points: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }

    let max_points = max_points.max(1);
    let step = (n / max_points).max(1);

    let mut indices: Vec<usize> = (0..n).step_by(step).take(max_points).collect();

    let last = n - 1;
    if indices.last() != Some(&last) {
        indices.push(last);
    }

    indices
}

/// Round to 2 decimal places, half away from zero
pub fn round_price(price: f64) -> Result<Decimal> {
    if !price.is_finite() {
        return Err(BotError::InvalidPrice(price));
    }

    let value = Decimal::from_f64(price).ok_or(BotError::InvalidPrice(price))?;
    Ok(value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// `day/month` label without leading zeros, in the display time zone
pub fn format_label(timestamp_ms: i64, tz: Tz) -> String {
    match DateTime::from_timestamp_millis(timestamp_ms) {
        Some(utc) => tz
            .from_utc_datetime(&utc.naive_utc())
            .format("%-d/%-m")
            .to_string(),
        None => timestamp_ms.to_string(),
    }
}

fn to_chart_point(sample: &PricePoint, tz: Tz) -> Result<ChartPoint> {
    Ok(ChartPoint {
        timestamp_ms: sample.timestamp_ms,
        label: format_label(sample.timestamp_ms, tz),
        price: round_price(sample.price)?,
    })
}
