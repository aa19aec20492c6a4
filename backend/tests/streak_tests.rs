//! Task completion streak tests
//!
//! Tests for the streak tracker including:
//! - consecutive, same-day and gap completions
//! - best streak never below the current streak
//! - reverting a completion restores the previous counters
//! - rain-delayed reminders

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use proptest::prelude::*;
use shared::{CompletionRecord, ScheduledTime, TaskStreakState, WeatherSnapshot};

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn noon(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(12, 0, 0).unwrap())
}

/// State built by recording each date in turn from a fresh task
fn build(dates: &[NaiveDate]) -> TaskStreakState {
    dates
        .iter()
        .fold(TaskStreakState::default(), |state, d| {
            state.record_completion(*d, noon(*d))
        })
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn on_a_run(current: u32, best: u32, last: &str) -> TaskStreakState {
        TaskStreakState {
            current_streak: current,
            best_streak: best,
            last_completed_date: Some(day(last)),
            ..Default::default()
        }
    }

    #[test]
    fn test_next_day_extends_streak() {
        let state = on_a_run(5, 7, "2024-01-10");
        let next = state.record_completion(day("2024-01-11"), noon(day("2024-01-11")));

        assert_eq!(next.current_streak, 6);
        assert_eq!(next.best_streak, 7);
        assert_eq!(next.last_completed_date, Some(day("2024-01-11")));
        assert!(next.completed);
        assert_eq!(next.completion_history.len(), 1);
    }

    #[test]
    fn test_gap_resets_streak() {
        let state = on_a_run(5, 5, "2024-01-10");
        let next = state.record_completion(day("2024-01-20"), noon(day("2024-01-20")));

        assert_eq!(next.current_streak, 1);
        assert_eq!(next.best_streak, 5);
    }

    #[test]
    fn test_same_day_holds_streak() {
        let state = on_a_run(3, 3, "2024-01-10");
        let next = state.record_completion(day("2024-01-10"), noon(day("2024-01-10")));

        assert_eq!(next.current_streak, 3);
        assert_eq!(next.best_streak, 3);
        assert_eq!(next.completion_history.len(), 1);
    }

    #[test]
    fn test_first_completion_starts_streak() {
        let next = TaskStreakState::default()
            .record_completion(day("2024-03-01"), noon(day("2024-03-01")));
        assert_eq!(next.current_streak, 1);
        assert_eq!(next.best_streak, 1);
    }

    #[test]
    fn test_new_best_tracks_current() {
        let state = on_a_run(4, 4, "2024-02-28");
        let next = state.record_completion(day("2024-02-29"), noon(day("2024-02-29")));
        assert_eq!(next.current_streak, 5);
        assert_eq!(next.best_streak, 5);
    }

    #[test]
    fn test_revert_last_day_recomputes() {
        let state = build(&[day("2024-01-01"), day("2024-01-02"), day("2024-01-03")]);
        assert_eq!(state.current_streak, 3);

        let reverted = state.revert_completion(day("2024-01-03"));
        assert_eq!(reverted.current_streak, 2);
        assert_eq!(reverted.best_streak, 2);
        assert_eq!(reverted.last_completed_date, Some(day("2024-01-02")));
        assert!(!reverted.completed);
        assert!(!reverted.completed_on(day("2024-01-03")));
    }

    #[test]
    fn test_revert_keeps_earlier_best() {
        let state = build(&[
            day("2024-01-01"),
            day("2024-01-02"),
            day("2024-01-03"),
            day("2024-01-10"),
        ]);
        assert_eq!(state.best_streak, 3);

        let reverted = state.revert_completion(day("2024-01-10"));
        assert_eq!(reverted.current_streak, 3);
        assert_eq!(reverted.best_streak, 3);
    }

    #[test]
    fn test_revert_unknown_date_only_clears_flag() {
        let state = build(&[day("2024-01-01"), day("2024-01-02")]);
        let reverted = state.revert_completion(day("2023-12-25"));

        assert!(!reverted.completed);
        assert_eq!(reverted.completion_history, state.completion_history);
        assert_eq!(reverted.current_streak, state.current_streak);
    }

    #[test]
    fn test_out_of_order_history_is_tolerated() {
        let state = TaskStreakState {
            completion_history: vec![
                CompletionRecord {
                    date: day("2024-01-05"),
                    timestamp: noon(day("2024-01-05")),
                },
                CompletionRecord {
                    date: day("2024-01-03"),
                    timestamp: noon(day("2024-01-03")),
                },
            ],
            current_streak: 1,
            best_streak: 1,
            last_completed_date: Some(day("2024-01-05")),
            ..Default::default()
        };
        assert!(!state.is_history_well_formed());

        // Only the last completed date drives the streak
        let next = state.record_completion(day("2024-01-06"), noon(day("2024-01-06")));
        assert_eq!(next.current_streak, 2);
    }

    #[test]
    fn test_rain_delays_reminder() {
        let schedule = ScheduledTime {
            hour: 7,
            minute: 30,
            weather_dependent: true,
            avoid_rain: true,
        };
        let rain = WeatherSnapshot::new(50.0, "Rain", 5.0, 0.2);
        let clear = WeatherSnapshot::new(50.0, "Clear", 5.0, 0.0);

        assert_eq!(
            schedule.reminder_time(Some(&rain)),
            NaiveTime::from_hms_opt(9, 30, 0)
        );
        assert_eq!(
            schedule.reminder_time(Some(&clear)),
            NaiveTime::from_hms_opt(7, 30, 0)
        );
        assert_eq!(schedule.reminder_time(None), NaiveTime::from_hms_opt(7, 30, 0));

        let indifferent = ScheduledTime {
            avoid_rain: false,
            ..schedule
        };
        assert_eq!(
            indifferent.reminder_time(Some(&rain)),
            NaiveTime::from_hms_opt(7, 30, 0)
        );
    }

    #[test]
    fn test_late_reminder_wraps_past_midnight() {
        let schedule = ScheduledTime {
            hour: 23,
            minute: 0,
            weather_dependent: true,
            avoid_rain: true,
        };
        let rain = WeatherSnapshot::new(50.0, "rain", 5.0, 0.2);
        assert_eq!(
            schedule.reminder_time(Some(&rain)),
            NaiveTime::from_hms_opt(1, 0, 0)
        );
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Day offsets from a fixed start, in any order and with repeats
    fn offsets_strategy() -> impl Strategy<Value = Vec<i64>> {
        prop::collection::vec(0i64..60, 0..30)
    }

    fn to_dates(offsets: &[i64]) -> Vec<NaiveDate> {
        let start = day("2024-01-01");
        offsets.iter().map(|o| start + Duration::days(*o)).collect()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Best streak is never below the current streak, in any order
        #[test]
        fn prop_best_bounds_current(offsets in offsets_strategy()) {
            let mut state = TaskStreakState::default();
            let mut max_seen = 0;
            for d in to_dates(&offsets) {
                state = state.record_completion(d, noon(d));
                max_seen = max_seen.max(state.current_streak);
                prop_assert!(state.best_streak >= state.current_streak);
            }
            prop_assert_eq!(state.best_streak, max_seen);
        }

        /// Each recording appends exactly one history record
        #[test]
        fn prop_history_grows_by_one(offsets in offsets_strategy()) {
            let dates = to_dates(&offsets);
            let state = build(&dates);
            prop_assert_eq!(state.completion_history.len(), dates.len());
        }

        /// Recording then reverting a completion restores the counters of a
        /// chronologically built task
        #[test]
        fn prop_revert_restores(mut offsets in offsets_strategy(), extra in 0i64..5) {
            offsets.sort_unstable();
            let dates = to_dates(&offsets);
            let before = build(&dates);

            let next_day = before
                .last_completed_date
                .map(|d| d + Duration::days(extra))
                .unwrap_or_else(|| day("2024-01-01"));
            let after = before
                .record_completion(next_day, noon(next_day))
                .revert_completion(next_day);

            prop_assert_eq!(after.current_streak, before.current_streak);
            prop_assert_eq!(after.best_streak, before.best_streak);
            prop_assert_eq!(after.last_completed_date, before.last_completed_date);
            prop_assert_eq!(after.completion_history, before.completion_history);
        }

        /// Reverting any recorded day, after recording in any order, keeps
        /// the best streak at or above a current streak that matches the
        /// remaining history
        #[test]
        fn prop_revert_any_day_keeps_bounds(
            offsets in prop::collection::vec(0i64..20, 1..30),
            pick in any::<prop::sample::Index>(),
        ) {
            let dates = to_dates(&offsets);
            let reverted_day = dates[pick.index(dates.len())];
            let state = build(&dates).revert_completion(reverted_day);

            prop_assert!(state.best_streak >= state.current_streak);
            prop_assert_eq!(state.completion_history.len(), dates.len() - 1);

            let remaining: std::collections::BTreeSet<NaiveDate> =
                state.completion_history.iter().map(|r| r.date).collect();
            prop_assert_eq!(state.last_completed_date, remaining.iter().next_back().copied());
            if let Some(last) = state.last_completed_date {
                let mut run = 0;
                let mut cursor = Some(last);
                while let Some(d) = cursor.filter(|d| remaining.contains(d)) {
                    run += 1;
                    cursor = d.pred_opt();
                }
                prop_assert_eq!(state.current_streak, run);
            } else {
                prop_assert_eq!(state.current_streak, 0);
            }
        }
    }
}
