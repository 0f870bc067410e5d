//! Calendar-day and calendar-week boundaries
//!
//! All day math for streaks and mission periods goes through [`Calendar`].
//! Days are projected in a fixed UTC offset; weeks run Monday through Sunday,
//! so on a Sunday the current week ends today.
//!
//! Days are stored as "YYYY-MM-DD" strings and instants as Unix milliseconds.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};

/// Source of the current wall-clock time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Reads the system clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to (tests, replays)
#[derive(Debug)]
pub struct ManualClock {
    millis: AtomicI64,
}

impl ManualClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            millis: AtomicI64::new(at.timestamp_millis()),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        self.millis.store(at.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.millis.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.millis.load(Ordering::SeqCst)).unwrap_or_default()
    }
}

/// Day and week boundaries in a configured UTC offset
#[derive(Clone)]
pub struct Calendar {
    offset: FixedOffset,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for Calendar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Calendar")
            .field("offset", &self.offset)
            .field("now", &self.now())
            .finish()
    }
}

impl Calendar {
    pub fn new(offset: FixedOffset, clock: Arc<dyn Clock>) -> Self {
        Self { offset, clock }
    }

    /// UTC calendar on the system clock
    pub fn utc() -> Self {
        Self::new(utc_offset(), Arc::new(SystemClock))
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current instant in Unix milliseconds
    pub fn now_ms(&self) -> i64 {
        self.now().timestamp_millis()
    }

    /// Project an instant onto its local calendar day
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    pub fn today(&self) -> NaiveDate {
        self.day_of(self.now())
    }

    pub fn yesterday(&self) -> NaiveDate {
        let today = self.today();
        today.pred_opt().unwrap_or(today)
    }

    /// Monday of the current week
    pub fn start_of_week(&self) -> NaiveDate {
        week_start(self.today())
    }

    /// Last millisecond of today
    pub fn end_of_day(&self) -> DateTime<Utc> {
        self.end_of(self.today())
    }

    /// Last millisecond of the coming Sunday (today, if today is Sunday)
    pub fn end_of_week(&self) -> DateTime<Utc> {
        self.end_of(week_end(self.today()))
    }

    /// Last millisecond of `day` in local time, expressed in UTC
    pub fn end_of(&self, day: NaiveDate) -> DateTime<Utc> {
        let next = day.succ_opt().unwrap_or(day);
        let local_midnight = next.and_time(NaiveTime::MIN);
        let utc_midnight =
            local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        utc_midnight.and_utc() - Duration::milliseconds(1)
    }
}

/// Monday of the week containing `day`
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_monday()))
}

/// Sunday of the week containing `day`
pub fn week_end(day: NaiveDate) -> NaiveDate {
    week_start(day) + Duration::days(6)
}

pub fn utc_offset() -> FixedOffset {
    Utc.fix()
}

/// Parse an offset like "+05:30", "-0800", "Z" or "UTC"
pub fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("z") || s.eq_ignore_ascii_case("utc") {
        return Some(utc_offset());
    }
    s.parse::<FixedOffset>().ok()
}

/// Format a day as "YYYY-MM-DD"
pub fn day_string(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Parse a "YYYY-MM-DD" day string
pub fn parse_day(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};

    fn calendar_at(offset: &str, at: DateTime<Utc>) -> Calendar {
        Calendar::new(
            parse_utc_offset(offset).unwrap(),
            Arc::new(ManualClock::new(at)),
        )
    }

    #[test]
    fn test_parse_utc_offset() {
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("+05:30").unwrap().local_minus_utc(), 19800);
        assert_eq!(parse_utc_offset("-0800").unwrap().local_minus_utc(), -28800);
        assert_eq!(parse_utc_offset("utc").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset(" -08:00 ").unwrap().local_minus_utc(), -28800);
        assert!(parse_utc_offset("05:00").is_none());
        assert!(parse_utc_offset("+5").is_none());
        assert!(parse_utc_offset("+01:75").is_none());
    }

    #[test]
    fn test_day_projection_respects_offset() {
        // 2024-03-10 23:30 UTC is already the 11th in UTC+01:00
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
        assert_eq!(
            calendar_at("Z", at).today(),
            NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
        );
        assert_eq!(
            calendar_at("+01:00", at).today(),
            NaiveDate::from_ymd_opt(2024, 3, 11).unwrap()
        );
    }

    #[test]
    fn test_end_of_day_is_last_millisecond() {
        let at = Utc.with_ymd_and_hms(2024, 3, 10, 8, 0, 0).unwrap();
        let cal = calendar_at("+02:00", at);
        let end = cal.end_of_day();
        // Local midnight of the 11th in UTC+2 is 22:00 UTC on the 10th
        assert_eq!(
            end,
            Utc.with_ymd_and_hms(2024, 3, 10, 21, 59, 59).unwrap() + Duration::milliseconds(999)
        );
        assert_eq!(cal.day_of(end), cal.today());
        assert_ne!(cal.day_of(end + Duration::milliseconds(1)), cal.today());
    }

    #[test]
    fn test_week_boundaries() {
        // Wednesday
        let wed = Utc.with_ymd_and_hms(2024, 3, 13, 12, 0, 0).unwrap();
        let cal = calendar_at("Z", wed);
        assert_eq!(cal.start_of_week().weekday(), Weekday::Mon);
        assert_eq!(cal.start_of_week(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
        assert_eq!(cal.day_of(cal.end_of_week()), NaiveDate::from_ymd_opt(2024, 3, 17).unwrap());
    }

    #[test]
    fn test_week_ends_today_on_sunday() {
        let sun = Utc.with_ymd_and_hms(2024, 3, 17, 9, 0, 0).unwrap();
        let cal = calendar_at("Z", sun);
        assert_eq!(cal.end_of_week(), cal.end_of_day());
        assert_eq!(cal.start_of_week(), NaiveDate::from_ymd_opt(2024, 3, 11).unwrap());
    }

    #[test]
    fn test_manual_clock_advance() {
        let at = Utc.with_ymd_and_hms(2024, 3, 17, 9, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(at));
        let cal = Calendar::new(utc_offset(), clock.clone());
        clock.advance(Duration::days(1));
        assert_eq!(cal.today(), NaiveDate::from_ymd_opt(2024, 3, 18).unwrap());
        assert_eq!(cal.yesterday(), NaiveDate::from_ymd_opt(2024, 3, 17).unwrap());
    }

    #[test]
    fn test_day_string_roundtrip() {
        let day = NaiveDate::from_ymd_opt(2023, 12, 28).unwrap();
        assert_eq!(day_string(day), "2023-12-28");
        assert_eq!(parse_day("2023-12-28"), Some(day));
        assert_eq!(parse_day("2023-13-28"), None);
    }
}
