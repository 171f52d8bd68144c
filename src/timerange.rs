//! Time-window computation for seeding and rendering chart feeds.
//!
//! Live feeds anchor their axis to the current time truncated *down* to
//! the nearest 15-minute boundary. History feeds span whole plant-local
//! days with an inclusive `23:59:59` cutoff. The floor (not round) and
//! the inclusive cutoff are deliberate; operators and the snapshot store
//! both rely on these exact boundaries.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};
use once_cell::sync::Lazy;

use crate::buffer::DEFAULT_MAX_POINTS;

/// The plant's local zone (Asia/Jakarta). WIB is a fixed UTC+7 with no
/// daylight saving, so a fixed offset is exact.
pub static PLANT_TZ: Lazy<FixedOffset> =
    Lazy::new(|| FixedOffset::east_opt(7 * 3600).expect("UTC+7 is in range"));

/// Axis interval of the live view.
pub const QUARTER_MINUTES: u32 = 15;

/// Truncate a timestamp down to the previous `minutes` boundary.
/// This is a floor, not a round-to-nearest.
pub fn floor_to_minutes(t: DateTime<Utc>, minutes: u32) -> DateTime<Utc> {
    let step_ms = 1000 * 60 * minutes as i64;
    let floored = (t.timestamp_millis().div_euclid(step_ms)) * step_ms;
    DateTime::from_timestamp_millis(floored).unwrap_or(t)
}

/// The live-mode window around `now`: starts one full buffer span
/// (10,800 s) before the floored quarter-hour, ends one quarter-hour
/// after it. The snapshot seed fetches `[start, now]`; the end marks the
/// right edge of the axis.
pub fn live_window(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let anchor = floor_to_minutes(now, QUARTER_MINUTES);
    (
        anchor - Duration::seconds(DEFAULT_MAX_POINTS as i64),
        anchor + Duration::minutes(QUARTER_MINUTES as i64),
    )
}

/// The history-mode window for an explicit date range: midnight at the
/// start of `start_date` through `23:59:59` on `end_date`, both in the
/// plant zone, expressed in UTC.
pub fn history_window(start_date: NaiveDate, end_date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_date.and_hms_opt(0, 0, 0).expect("midnight exists");
    let end = end_date.and_hms_opt(23, 59, 59).expect("23:59:59 exists");
    // Fixed offsets have no DST gaps; the local->UTC mapping is unique.
    (
        PLANT_TZ.from_local_datetime(&start).unwrap().with_timezone(&Utc),
        PLANT_TZ.from_local_datetime(&end).unwrap().with_timezone(&Utc),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    #[test]
    fn floor_truncates_down_never_rounds_up() {
        // 08:44:59 is closer to 08:45 but must floor to 08:30.
        assert_eq!(
            floor_to_minutes(utc("2025-03-14T08:44:59Z"), 15),
            utc("2025-03-14T08:30:00Z")
        );
        assert_eq!(
            floor_to_minutes(utc("2025-03-14T08:45:00Z"), 15),
            utc("2025-03-14T08:45:00Z")
        );
        assert_eq!(
            floor_to_minutes(utc("2025-03-14T08:00:01Z"), 15),
            utc("2025-03-14T08:00:00Z")
        );
    }

    #[test]
    fn live_window_spans_buffer_plus_margin() {
        let (start, end) = live_window(utc("2025-03-14T08:37:12Z"));
        // Anchor floors to 08:30.
        assert_eq!(start, utc("2025-03-14T05:30:00Z")); // 3 h earlier
        assert_eq!(end, utc("2025-03-14T08:45:00Z")); // 15 min later
    }

    #[test]
    fn history_window_is_one_plant_day_inclusive() {
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let (start, end) = history_window(day, day);
        // Jakarta midnight = 17:00 UTC the previous day.
        assert_eq!(start, utc("2024-12-31T17:00:00Z"));
        assert_eq!(end, utc("2025-01-01T16:59:59Z"));
        assert!(start < end);
    }

    #[test]
    fn history_window_multi_day() {
        let start_d = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end_d = NaiveDate::from_ymd_opt(2025, 1, 3).unwrap();
        let (start, end) = history_window(start_d, end_d);
        assert_eq!((end - start).num_seconds(), 3 * 86_400 - 1);
    }
}
