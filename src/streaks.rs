//! Daily activity streaks
//!
//! One activity per calendar day counts. Activity on consecutive days
//! extends the streak; a missed day restarts it at 1.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::calendar::Calendar;
use crate::error::Result;
use crate::store::{GamificationStore, StreakRecord};

/// Outcome of recording an activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StreakUpdate {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub total_days_active: u32,
    /// First activity of the day
    pub is_new_day: bool,
    /// False when a gap reset the streak
    pub streak_maintained: bool,
}

impl StreakUpdate {
    fn same_day(record: &StreakRecord) -> Self {
        Self {
            current_streak: record.current_streak,
            longest_streak: record.longest_streak,
            total_days_active: record.total_days_active,
            is_new_day: false,
            streak_maintained: true,
        }
    }
}

#[derive(Clone)]
pub struct StreakTracker {
    store: Arc<dyn GamificationStore>,
    calendar: Calendar,
}

impl StreakTracker {
    pub fn new(store: Arc<dyn GamificationStore>, calendar: Calendar) -> Self {
        Self { store, calendar }
    }

    /// Current streak record, if the user was ever active
    pub fn streak(&self, user_id: &str) -> Result<Option<StreakRecord>> {
        Ok(self.store.get_streak(user_id)?)
    }

    pub fn record_activity(&self, user_id: &str) -> Result<StreakUpdate> {
        let today = self.calendar.today();
        let yesterday = self.calendar.yesterday();

        let existing = self.store.get_streak(user_id)?;
        let (next, maintained) = match existing {
            None => (
                StreakRecord {
                    user_id: user_id.to_string(),
                    current_streak: 1,
                    longest_streak: 1,
                    last_active_date: Some(today),
                    total_days_active: 1,
                    version: 0,
                },
                true,
            ),
            Some(record) if record.last_active_date == Some(today) => {
                debug!(user_id, streak = record.current_streak, "Activity already counted today");
                return Ok(StreakUpdate::same_day(&record));
            }
            Some(record) if record.last_active_date == Some(yesterday) => {
                let current = record.current_streak + 1;
                (
                    StreakRecord {
                        current_streak: current,
                        longest_streak: record.longest_streak.max(current),
                        last_active_date: Some(today),
                        total_days_active: record.total_days_active + 1,
                        ..record
                    },
                    true,
                )
            }
            Some(record) => {
                info!(
                    user_id,
                    lost = record.current_streak,
                    last_active = ?record.last_active_date,
                    "Streak reset"
                );
                (
                    StreakRecord {
                        current_streak: 1,
                        longest_streak: record.longest_streak.max(1),
                        last_active_date: Some(today),
                        total_days_active: record.total_days_active + 1,
                        ..record
                    },
                    false,
                )
            }
        };

        if !self.store.save_streak(&next)? {
            // A concurrent request recorded activity first; report its result
            warn!(user_id, "Streak update lost race, reloading");
            let winner = self.store.get_streak(user_id)?.unwrap_or(next);
            return Ok(StreakUpdate::same_day(&winner));
        }

        if maintained && next.current_streak > 1 {
            info!(user_id, streak = next.current_streak, "Streak extended");
        }

        Ok(StreakUpdate {
            current_streak: next.current_streak,
            longest_streak: next.longest_streak,
            total_days_active: next.total_days_active,
            is_new_day: true,
            streak_maintained: maintained,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{utc_offset, ManualClock};
    use crate::store::testing::HookedStore;
    use crate::store::SqliteStore;
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn setup() -> (StreakTracker, Arc<SqliteStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 13, 10, 0, 0).unwrap(),
        ));
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let tracker = StreakTracker::new(store.clone(), Calendar::new(utc_offset(), clock.clone()));
        (tracker, store, clock)
    }

    #[test]
    fn test_first_activity() {
        let (tracker, _store, _clock) = setup();
        let update = tracker.record_activity("u1").unwrap();
        assert_eq!(
            update,
            StreakUpdate {
                current_streak: 1,
                longest_streak: 1,
                total_days_active: 1,
                is_new_day: true,
                streak_maintained: true,
            }
        );
    }

    #[test]
    fn test_same_day_is_counted_once() {
        let (tracker, store, clock) = setup();
        tracker.record_activity("u1").unwrap();
        for _ in 0..5 {
            clock.advance(Duration::minutes(30));
            let update = tracker.record_activity("u1").unwrap();
            assert!(!update.is_new_day);
            assert!(update.streak_maintained);
            assert_eq!(update.current_streak, 1);
        }
        let record = store.get_streak("u1").unwrap().unwrap();
        assert_eq!(record.total_days_active, 1);
    }

    #[test]
    fn test_consecutive_days_extend() {
        let (tracker, _store, clock) = setup();
        tracker.record_activity("u1").unwrap();
        clock.advance(Duration::days(1));
        let update = tracker.record_activity("u1").unwrap();
        assert_eq!((update.current_streak, update.longest_streak), (2, 2));
        assert!(update.is_new_day && update.streak_maintained);
    }

    #[test]
    fn test_gap_resets_but_keeps_longest() {
        let (tracker, store, clock) = setup();
        for _ in 0..4 {
            tracker.record_activity("u1").unwrap();
            clock.advance(Duration::days(1));
        }
        // Last activity was 5 days before the next one
        clock.advance(Duration::days(4));
        let update = tracker.record_activity("u1").unwrap();
        assert_eq!(update.current_streak, 1);
        assert_eq!(update.longest_streak, 4);
        assert!(update.is_new_day);
        assert!(!update.streak_maintained);
        assert_eq!(update.total_days_active, 5);

        let record = store.get_streak("u1").unwrap().unwrap();
        assert_eq!(record.last_active_date, NaiveDate::from_ymd_opt(2024, 3, 21));
    }

    #[test]
    fn test_longest_never_below_current() {
        let (tracker, _store, clock) = setup();
        // Active with gaps of 1, 1, 3, 1, 1, 1, 2 days
        for gap in [1, 1, 3, 1, 1, 1, 2] {
            let update = tracker.record_activity("u1").unwrap();
            assert!(update.longest_streak >= update.current_streak);
            clock.advance(Duration::days(gap));
        }
        let update = tracker.record_activity("u1").unwrap();
        assert_eq!(update.current_streak, 1);
        assert_eq!(update.longest_streak, 4);
    }

    /// Tracker whose store lets a competing write land right before each save
    fn racing_setup() -> (StreakTracker, Arc<HookedStore>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 3, 13, 10, 0, 0).unwrap(),
        ));
        let raced = AtomicBool::new(false);
        let store = Arc::new(
            HookedStore::new(SqliteStore::open_in_memory().unwrap()).before_save_streak(
                move |inner, record| {
                    if record.user_id == "racer" && !raced.swap(true, Ordering::SeqCst) {
                        // Same computation, saved first by another request
                        assert!(inner.save_streak(record).unwrap());
                    }
                },
            ),
        );
        let tracker = StreakTracker::new(store.clone(), Calendar::new(utc_offset(), clock.clone()));
        (tracker, store, clock)
    }

    #[test]
    fn test_lost_race_on_first_activity_reports_winner() {
        let (tracker, store, _clock) = racing_setup();
        let update = tracker.record_activity("racer").unwrap();
        assert!(!update.is_new_day);
        assert_eq!(update.current_streak, 1);
        assert_eq!(update.total_days_active, 1);

        let record = store.get_streak("racer").unwrap().unwrap();
        assert_eq!((record.total_days_active, record.version), (1, 1));
    }

    #[test]
    fn test_lost_race_on_stale_version_writes_nothing() {
        let (tracker, store, clock) = racing_setup();
        // Yesterday's activity, stored without going through the hook
        store
            .inner
            .save_streak(&StreakRecord {
                user_id: "racer".to_string(),
                current_streak: 3,
                longest_streak: 3,
                last_active_date: NaiveDate::from_ymd_opt(2024, 3, 12),
                total_days_active: 3,
                version: 0,
            })
            .unwrap();

        let update = tracker.record_activity("racer").unwrap();
        assert!(!update.is_new_day);
        assert!(update.streak_maintained);
        assert_eq!(update.current_streak, 4);

        // Only the competing write was applied
        let record = store.get_streak("racer").unwrap().unwrap();
        assert_eq!((record.current_streak, record.total_days_active), (4, 4));
        assert_eq!(record.version, 2);

        // Later activity proceeds normally
        clock.advance(Duration::days(1));
        let next = tracker.record_activity("racer").unwrap();
        assert!(next.is_new_day);
        assert_eq!(next.current_streak, 5);
    }

    #[test]
    fn test_streak_is_active() {
        let (tracker, _store, clock) = setup();
        tracker.record_activity("u1").unwrap();
        let record = tracker.streak("u1").unwrap().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 13).unwrap();
        assert!(record.is_active(today));
        assert!(record.is_active(today + Duration::days(1)));
        assert!(!record.is_active(today + Duration::days(2)));

        clock.advance(Duration::days(2));
        assert!(tracker.streak("u2").unwrap().is_none());
    }
}
