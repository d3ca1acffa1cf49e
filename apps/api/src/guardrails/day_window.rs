//! Calendar-day window used to reset the daily approval quota.

use chrono::{DateTime, Duration, Utc};

/// Half-open interval `[start, end)` covering one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Returns the UTC day window containing `now`: midnight of `now`'s calendar
/// day through midnight of the next day. `end` is exactly 24 hours after
/// `start`. Quota counting only checks the lower bound, since callers only
/// look backward from "now".
pub fn day_window(now: DateTime<Utc>) -> DayWindow {
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc();
    DayWindow {
        start,
        end: start + Duration::days(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_window_is_utc_midnight_to_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 2, 14, 15, 30, 0).unwrap();
        let w = day_window(now);
        assert_eq!(w.start, Utc.with_ymd_and_hms(2026, 2, 14, 0, 0, 0).unwrap());
        assert_eq!(w.end, Utc.with_ymd_and_hms(2026, 2, 15, 0, 0, 0).unwrap());
        assert!(w.end > w.start);
    }

    #[test]
    fn test_window_spans_24_hours() {
        let now = Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap();
        let w = day_window(now);
        assert_eq!(w.end - w.start, Duration::days(1));
        assert_eq!(w.start, Utc.with_ymd_and_hms(2026, 12, 31, 0, 0, 0).unwrap());
        assert_eq!(w.end, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_midnight_maps_to_its_own_day() {
        let midnight = Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap();
        let w = day_window(midnight);
        assert_eq!(w.start, midnight);
    }
}
