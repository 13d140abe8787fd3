//! Daily broadcast scheduling
//!
//! The trigger is a wall-clock time in the display time zone. Around DST changes a
//! nonexistent local time (spring-forward gap) is shifted forward minute by minute, and an
//! ambiguous one (fall-back) resolves to the earlier instant.

use chrono::{DateTime, Duration, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::sync::Arc;
use tracing::{error, info};

use crate::dispatch::Dispatcher;
use crate::gateway::ChatGateway;
use crate::types::Result;

/// When the daily broadcast fires
#[derive(Debug, Clone, Copy)]
pub struct DailySchedule {
    pub time: NaiveTime,
    pub tz: Tz,
}

impl DailySchedule {
    pub fn new(time: NaiveTime, tz: Tz) -> Self {
        Self { time, tz }
    }

    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        next_run_after(now, self.time, self.tz)
    }
}

/// Resolve a local wall time to UTC, preferring the earliest instant
fn resolve_local(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<Utc>> {
    use chrono::offset::LocalResult::*;

    let mut t = naive;
    // Gaps are at most a couple of hours
    for _ in 0..=180 {
        match tz.from_local_datetime(&t) {
            Single(dt) => return Some(dt.with_timezone(&Utc)),
            Ambiguous(earliest, _) => return Some(earliest.with_timezone(&Utc)),
            None => t += Duration::minutes(1),
        }
    }
    Option::None
}

/// First trigger strictly after `now`
pub fn next_run_after(now: DateTime<Utc>, time: NaiveTime, tz: Tz) -> DateTime<Utc> {
    let local_today = now.with_timezone(&tz).date_naive();

    for offset in 0..=2 {
        let day = local_today + Duration::days(offset);
        if let Some(candidate) = resolve_local(day.and_time(time), tz) {
            if candidate > now {
                return candidate;
            }
        }
    }

    // Unreachable for real zones; keep a sane fallback
    now + Duration::days(1)
}

/// Build and post one daily summary
pub async fn broadcast_once(dispatcher: &Dispatcher, gateway: &dyn ChatGateway) -> Result<()> {
    let reply = dispatcher.daily_summary().await?;
    gateway.post(&reply).await?;
    info!("Daily summary posted via {}", gateway.name());
    Ok(())
}

/// Run the daily broadcast forever; failures are logged and the next day is awaited
pub async fn run_daily_broadcast(
    dispatcher: Arc<Dispatcher>,
    gateway: Arc<dyn ChatGateway>,
    schedule: DailySchedule,
) {
    loop {
        let now = Utc::now();
        let next = schedule.next_after(now);
        let wait = (next - now).to_std().unwrap_or_default();
        info!(
            "Next daily summary at {} ({})",
            next.with_timezone(&schedule.tz).format("%Y-%m-%d %H:%M %Z"),
            schedule.tz
        );

        tokio::time::sleep(wait).await;

        if let Err(e) = broadcast_once(&dispatcher, gateway.as_ref()).await {
            error!("Daily summary failed: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_later_today() {
        let next = next_run_after(utc(2024, 5, 1, 6, 0), at(8, 0), Tz::UTC);
        assert_eq!(next, utc(2024, 5, 1, 8, 0));
    }

    #[test]
    fn test_already_passed_rolls_to_tomorrow() {
        let next = next_run_after(utc(2024, 5, 1, 8, 0), at(8, 0), Tz::UTC);
        assert_eq!(next, utc(2024, 5, 2, 8, 0));

        let next = next_run_after(utc(2024, 12, 31, 23, 59), at(8, 0), Tz::UTC);
        assert_eq!(next, utc(2025, 1, 1, 8, 0));
    }

    #[test]
    fn test_uses_display_time_zone() {
        // 08:00 in Jakarta (UTC+7) is 01:00Z
        let next = next_run_after(utc(2024, 5, 1, 0, 30), at(8, 0), chrono_tz::Asia::Jakarta);
        assert_eq!(next, utc(2024, 5, 1, 1, 0));

        // At 02:00Z Jakarta is already past 08:00, so tomorrow
        let next = next_run_after(utc(2024, 5, 1, 2, 0), at(8, 0), chrono_tz::Asia::Jakarta);
        assert_eq!(next, utc(2024, 5, 2, 1, 0));
    }

    #[test]
    fn test_spring_forward_gap_shifts_forward() {
        // 2024-03-10 02:30 does not exist in New York; first valid instant is 03:00 EDT
        let next = next_run_after(
            utc(2024, 3, 10, 5, 0),
            at(2, 30),
            chrono_tz::America::New_York,
        );
        assert_eq!(next, utc(2024, 3, 10, 7, 0));
    }

    #[test]
    fn test_fall_back_takes_earliest() {
        // 2024-11-03 01:30 occurs twice in New York; earliest is 05:30Z (EDT)
        let next = next_run_after(
            utc(2024, 11, 3, 4, 0),
            at(1, 30),
            chrono_tz::America::New_York,
        );
        assert_eq!(next, utc(2024, 11, 3, 5, 30));
    }
}
