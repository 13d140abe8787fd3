// Boundary validation: turn raw upstream rows into well-formed price points
use crate::types::*;
use tracing::warn;

/// Normalize `[timestamp_ms, price]` rows, dropping anything unusable
pub fn normalize_history(asset: &str, rows: &[[Option<f64>; 2]]) -> Vec<PricePoint> {
    let mut dropped = 0usize;

    let points: Vec<PricePoint> = rows
        .iter()
        .filter_map(|row| {
            let point = match row {
                [Some(ts), Some(price)] if ts.is_finite() => PricePoint::new(*ts as i64, *price),
                _ => {
                    dropped += 1;
                    return None;
                }
            };
            match validate_price(&point) {
                Ok(()) => Some(point),
                Err(_) => {
                    dropped += 1;
                    None
                }
            }
        })
        .collect();

    if dropped > 0 {
        warn!("Dropped {} malformed history rows for {}", dropped, asset);
    }

    points
}

/// Validate that a price is usable (finite, not negative)
pub fn validate_price(point: &PricePoint) -> Result<()> {
    if !point.price.is_finite() || point.price < 0.0 {
        return Err(BotError::InvalidPrice(point.price));
    }

    Ok(())
}
