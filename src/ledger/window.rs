//! Local-calendar-day window in a fixed reference timezone.
//!
//! "Today" runs from local midnight in the reference zone up to the instant
//! being evaluated. It is recomputed on every query; no day boundary is
//! stored. Only `chrono-tz` offset data is consulted, never the host's local
//! timezone setting.

use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::model::TimeWindow;

/// How far before a skipped midnight to read the pre-transition offset.
const GAP_LOOKBACK_HOURS: i64 = 3;

/// Decides whether instants fall within the current local day.
#[derive(Debug, Clone, Copy)]
pub struct DailyWindow {
    tz: Tz,
}

impl DailyWindow {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// The local calendar date of `instant` in the reference zone.
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// First instant of the local day containing `now`.
    ///
    /// Events stamped exactly at this instant belong to the new day.
    pub fn today_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.start_of(self.local_date(now))
    }

    /// `[today_start(now), now]`.
    pub fn today(&self, now: DateTime<Utc>) -> TimeWindow {
        TimeWindow {
            start: self.today_start(now),
            end: now,
        }
    }

    /// Whether `instant` lies within today as seen from `now`.
    pub fn contains(&self, instant: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.today(now).contains(instant)
    }

    /// First instant of `date` in the reference zone.
    ///
    /// When midnight is skipped by a DST transition the day starts where the
    /// gap ends; when midnight repeats, the earlier occurrence wins.
    pub fn start_of(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        match self.tz.from_local_datetime(&midnight) {
            LocalResult::Single(dt) => dt.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
            LocalResult::None => self.gap_end(midnight),
        }
    }

    /// Start of the local day after `date`.
    pub fn end_of(&self, date: NaiveDate) -> DateTime<Utc> {
        match date.checked_add_days(Days::new(1)) {
            Some(next) => self.start_of(next),
            None => DateTime::<Utc>::MAX_UTC,
        }
    }

    fn gap_end(&self, midnight: NaiveDateTime) -> DateTime<Utc> {
        // Wall time that does not exist maps to the transition instant when
        // read with the offset in force just before the gap.
        let earlier = midnight - chrono::Duration::hours(GAP_LOOKBACK_HOURS);
        let before = self
            .tz
            .offset_from_local_datetime(&earlier)
            .earliest()
            .map(|o| o.fix())
            .unwrap_or_else(|| self.tz.offset_from_utc_datetime(&midnight).fix());
        let utc = midnight - chrono::Duration::seconds(i64::from(before.local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_lagos_day_starts_at_2300_utc() {
        let window = DailyWindow::new(chrono_tz::Africa::Lagos);
        let now = ts("2024-03-10T12:00:00Z");
        assert_eq!(window.today_start(now), ts("2024-03-09T23:00:00Z"));
    }

    #[test]
    fn test_utc_late_evening_is_next_lagos_day() {
        let window = DailyWindow::new(chrono_tz::Africa::Lagos);
        // 23:30 UTC is 00:30 the following day in Lagos.
        let now = ts("2024-03-10T23:30:00Z");
        assert_eq!(window.today_start(now), ts("2024-03-10T23:00:00Z"));
        assert!(!window.contains(ts("2024-03-10T22:59:59Z"), now));
    }

    #[test]
    fn test_event_at_local_midnight_belongs_to_new_day() {
        let window = DailyWindow::new(chrono_tz::Africa::Lagos);
        let midnight = ts("2024-03-09T23:00:00Z");
        let now = ts("2024-03-10T08:00:00Z");
        assert!(window.contains(midnight, now));
        assert!(!window.contains(ts("2024-03-09T22:59:59.999Z"), now));
    }

    #[test]
    fn test_future_instant_is_not_today() {
        let window = DailyWindow::new(chrono_tz::Africa::Lagos);
        let now = ts("2024-03-10T08:00:00Z");
        assert!(!window.contains(ts("2024-03-10T08:00:01Z"), now));
    }

    #[test]
    fn test_new_york_follows_daylight_saving() {
        let window = DailyWindow::new(chrono_tz::America::New_York);
        // EST (UTC-5) in January, EDT (UTC-4) in July.
        assert_eq!(
            window.today_start(ts("2024-01-15T12:00:00Z")),
            ts("2024-01-15T05:00:00Z")
        );
        assert_eq!(
            window.today_start(ts("2024-07-15T12:00:00Z")),
            ts("2024-07-15T04:00:00Z")
        );
    }

    #[test]
    fn test_new_york_spring_forward_day_is_23_hours() {
        let window = DailyWindow::new(chrono_tz::America::New_York);
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        let length = window.end_of(date) - window.start_of(date);
        assert_eq!(length, chrono::Duration::hours(23));
    }

    #[test]
    fn test_skipped_midnight_starts_day_at_gap_end() {
        // Chile moved clocks from 00:00 (UTC-4) to 01:00 (UTC-3) on 2023-09-03.
        let window = DailyWindow::new(chrono_tz::America::Santiago);
        let now = ts("2023-09-03T15:00:00Z");
        let start = window.today_start(now);
        assert_eq!(start, ts("2023-09-03T04:00:00Z"));
        assert!(window.contains(ts("2023-09-03T04:00:00Z"), now));
        assert!(!window.contains(ts("2023-09-03T03:59:59Z"), now));
    }

    #[test]
    fn test_repeated_midnight_starts_day_at_first_occurrence() {
        // Cuba fell back from 01:00 (UTC-4) to 00:00 (UTC-5) on 2023-11-05,
        // so local midnight happened at 04:00 and again at 05:00 UTC.
        let window = DailyWindow::new(chrono_tz::America::Havana);
        let now = ts("2023-11-05T12:00:00Z");
        assert_eq!(window.today_start(now), ts("2023-11-05T04:00:00Z"));
        assert!(window.contains(ts("2023-11-05T04:30:00Z"), now));

        let date = NaiveDate::from_ymd_opt(2023, 11, 5).unwrap();
        let length = window.end_of(date) - window.start_of(date);
        assert_eq!(length, chrono::Duration::hours(25));
    }

    #[test]
    fn test_local_date_uses_reference_zone() {
        let window = DailyWindow::new(chrono_tz::Asia::Tokyo);
        let date = window.local_date(ts("2024-03-10T16:00:00Z"));
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    }
}
