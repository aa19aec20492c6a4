//! Barn task models and the completion streak tracker

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::WeatherSnapshot;

/// Hours a rain-sensitive reminder is pushed back when it is raining
pub const RAIN_DELAY_HOURS: i64 = 2;

/// A recurring barn-care duty
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: TaskCategory,
    pub frequency: TaskFrequency,
    pub priority: TaskPriority,
    pub scheduled_time: Option<ScheduledTime>,
    #[serde(flatten)]
    pub streak: TaskStreakState,
    pub created_at: DateTime<Utc>,
}

/// Task categories
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskCategory {
    Grooming,
    Feeding,
    Medical,
    Maintenance,
    Other,
}

impl TaskCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskCategory::Grooming => "grooming",
            TaskCategory::Feeding => "feeding",
            TaskCategory::Medical => "medical",
            TaskCategory::Maintenance => "maintenance",
            TaskCategory::Other => "other",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "grooming" => Some(TaskCategory::Grooming),
            "feeding" => Some(TaskCategory::Feeding),
            "medical" => Some(TaskCategory::Medical),
            "maintenance" => Some(TaskCategory::Maintenance),
            "other" => Some(TaskCategory::Other),
            _ => None,
        }
    }
}

/// How often a task recurs
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskFrequency {
    Daily,
    Weekly,
    Monthly,
    Annual,
    Once,
}

impl TaskFrequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFrequency::Daily => "daily",
            TaskFrequency::Weekly => "weekly",
            TaskFrequency::Monthly => "monthly",
            TaskFrequency::Annual => "annual",
            TaskFrequency::Once => "once",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(TaskFrequency::Daily),
            "weekly" => Some(TaskFrequency::Weekly),
            "monthly" => Some(TaskFrequency::Monthly),
            "annual" => Some(TaskFrequency::Annual),
            "once" => Some(TaskFrequency::Once),
            _ => None,
        }
    }
}

/// Task priority
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPriority::Low => "low",
            TaskPriority::Medium => "medium",
            TaskPriority::High => "high",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "low" => Some(TaskPriority::Low),
            "medium" => Some(TaskPriority::Medium),
            "high" => Some(TaskPriority::High),
            _ => None,
        }
    }
}

/// A single logged completion of a task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompletionRecord {
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
}

/// Completion flags, history and derived streak counters of a task.
///
/// `current_streak` and `best_streak` are derived from completion events and
/// only change through [`record_completion`](Self::record_completion) and
/// [`revert_completion`](Self::revert_completion). `current_streak <= best_streak`
/// holds after either.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TaskStreakState {
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completion_history: Vec<CompletionRecord>,
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub best_streak: u32,
    pub last_completed_date: Option<NaiveDate>,
}

impl TaskStreakState {
    /// Record a completion on `completion_date`, returning the updated state.
    ///
    /// The streak grows when the previous completion was the day before (or
    /// there was none), holds when it was the same day, and restarts at 1
    /// after any longer gap. Only `last_completed_date` drives the decision;
    /// the history is appended to but never consulted.
    pub fn record_completion(&self, completion_date: NaiveDate, at: DateTime<Utc>) -> Self {
        let new_streak = match self.last_completed_date {
            None => self.current_streak + 1,
            Some(last) if completion_date.pred_opt() == Some(last) => self.current_streak + 1,
            Some(last) if last == completion_date => self.current_streak,
            Some(_) => 1,
        };

        let mut completion_history = self.completion_history.clone();
        completion_history.push(CompletionRecord {
            date: completion_date,
            timestamp: at,
        });

        Self {
            completed: true,
            completed_at: Some(at),
            completion_history,
            current_streak: new_streak,
            best_streak: new_streak.max(self.best_streak),
            last_completed_date: Some(completion_date),
        }
    }

    /// Undo a completion made on `date`, returning the updated state.
    ///
    /// Removes the latest history record for that date, then recomputes
    /// `last_completed_date` and `current_streak` from the remaining history.
    /// A best streak that was the run just shortened falls back to the longest
    /// remaining run; `best_streak >= current_streak` holds either way.
    pub fn revert_completion(&self, date: NaiveDate) -> Self {
        let mut next = self.clone();
        next.completed = false;
        next.completed_at = None;

        let Some(pos) = next.completion_history.iter().rposition(|r| r.date == date) else {
            return next;
        };
        next.completion_history.remove(pos);

        let last = next.completion_history.iter().map(|r| r.date).max();
        let current = last.map_or(0, |day| next.run_ending_at(day));

        next.last_completed_date = last;
        next.current_streak = current;
        if self.best_streak == self.current_streak && self.current_streak > current {
            next.best_streak = current.max(next.longest_run());
        }
        next.best_streak = next.best_streak.max(current);
        next
    }

    /// Whether the history is in chronological order.
    ///
    /// Repeated dates are expected (re-marking a task on the same day appends
    /// another record); dates or timestamps going backwards are not.
    pub fn is_history_well_formed(&self) -> bool {
        self.completion_history
            .windows(2)
            .all(|w| w[0].date <= w[1].date && w[0].timestamp <= w[1].timestamp)
    }

    pub fn completed_on(&self, date: NaiveDate) -> bool {
        self.completion_history.iter().any(|r| r.date == date)
    }

    fn distinct_dates(&self) -> BTreeSet<NaiveDate> {
        self.completion_history.iter().map(|r| r.date).collect()
    }

    /// Consecutive distinct days in the history ending at `day`
    fn run_ending_at(&self, day: NaiveDate) -> u32 {
        let dates = self.distinct_dates();
        let mut run = 0;
        let mut cursor = Some(day);
        while let Some(d) = cursor.filter(|d| dates.contains(d)) {
            run += 1;
            cursor = d.pred_opt();
        }
        run
    }

    /// Longest run of consecutive distinct days anywhere in the history
    fn longest_run(&self) -> u32 {
        let mut longest = 0;
        let mut run = 0;
        let mut previous: Option<NaiveDate> = None;
        for date in self.distinct_dates() {
            run = match previous {
                Some(p) if p.succ_opt() == Some(date) => run + 1,
                _ => 1,
            };
            longest = longest.max(run);
            previous = Some(date);
        }
        longest
    }
}

/// Daily reminder time for a task
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduledTime {
    pub hour: u32,
    pub minute: u32,
    #[serde(default)]
    pub weather_dependent: bool,
    /// Push the reminder back while it is raining
    #[serde(default)]
    pub avoid_rain: bool,
}

impl ScheduledTime {
    pub fn time(&self) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(self.hour, self.minute, 0)
    }

    /// When to fire the reminder given the current weather, if known.
    ///
    /// Weather-dependent tasks that avoid rain are delayed by
    /// [`RAIN_DELAY_HOURS`] while it is raining, wrapping past midnight.
    pub fn reminder_time(&self, weather: Option<&WeatherSnapshot>) -> Option<NaiveTime> {
        let base = self.time()?;
        let raining = weather.map(WeatherSnapshot::is_raining).unwrap_or(false);
        if self.weather_dependent && self.avoid_rain && raining {
            let (delayed, _) = base.overflowing_add_signed(Duration::hours(RAIN_DELAY_HOURS));
            Some(delayed)
        } else {
            Some(base)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn at(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&format!("{}T08:00:00Z", s))
            .unwrap()
            .with_timezone(&Utc)
    }

    fn five_day_streak() -> TaskStreakState {
        let completion_history = ["2024-01-06", "2024-01-07", "2024-01-08", "2024-01-09", "2024-01-10"]
            .iter()
            .map(|d| CompletionRecord {
                date: day(d),
                timestamp: at(d),
            })
            .collect();
        TaskStreakState {
            completed: true,
            completed_at: Some(at("2024-01-10")),
            completion_history,
            current_streak: 5,
            best_streak: 5,
            last_completed_date: Some(day("2024-01-10")),
        }
    }

    #[test]
    fn test_first_completion_starts_streak() {
        let state = TaskStreakState::default().record_completion(day("2024-03-01"), at("2024-03-01"));
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.best_streak, 1);
        assert!(state.completed);
        assert_eq!(state.last_completed_date, Some(day("2024-03-01")));
        assert_eq!(state.completion_history.len(), 1);
    }

    #[test]
    fn test_next_day_extends_streak() {
        let state = five_day_streak().record_completion(day("2024-01-11"), at("2024-01-11"));
        assert_eq!(state.current_streak, 6);
        assert_eq!(state.best_streak, 6);
    }

    #[test]
    fn test_gap_resets_streak() {
        let state = five_day_streak().record_completion(day("2024-01-20"), at("2024-01-20"));
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.best_streak, 5);
    }

    #[test]
    fn test_same_day_holds_streak_but_appends() {
        let start = five_day_streak();
        let state = start.record_completion(day("2024-01-10"), at("2024-01-10"));
        assert_eq!(state.current_streak, 5);
        assert_eq!(state.completion_history.len(), start.completion_history.len() + 1);
    }

    #[test]
    fn test_record_does_not_mutate_input() {
        let start = five_day_streak();
        let _ = start.record_completion(day("2024-01-11"), at("2024-01-11"));
        assert_eq!(start, five_day_streak());
    }

    #[test]
    fn test_revert_restores_previous_counters() {
        let start = five_day_streak();
        let reverted = start
            .record_completion(day("2024-01-11"), at("2024-01-11"))
            .revert_completion(day("2024-01-11"));

        assert!(!reverted.completed);
        assert_eq!(reverted.completed_at, None);
        assert_eq!(reverted.current_streak, 5);
        assert_eq!(reverted.best_streak, 5);
        assert_eq!(reverted.last_completed_date, Some(day("2024-01-10")));
        assert_eq!(reverted.completion_history, start.completion_history);
    }

    #[test]
    fn test_revert_keeps_best_from_an_earlier_run() {
        let mut start = five_day_streak();
        start.best_streak = 9;
        let reverted = start
            .record_completion(day("2024-01-20"), at("2024-01-20"))
            .revert_completion(day("2024-01-20"));
        assert_eq!(reverted.current_streak, 5);
        assert_eq!(reverted.best_streak, 9);
    }

    #[test]
    fn test_revert_of_same_day_remark_keeps_counters() {
        let state = five_day_streak()
            .record_completion(day("2024-01-10"), at("2024-01-10"))
            .revert_completion(day("2024-01-10"));
        assert_eq!(state.current_streak, 5);
        assert_eq!(state.last_completed_date, Some(day("2024-01-10")));
        assert!(!state.completed);
    }

    #[test]
    fn test_revert_inside_run_splits_it() {
        let state = TaskStreakState::default()
            .record_completion(day("2024-01-08"), at("2024-01-08"))
            .record_completion(day("2024-01-09"), at("2024-01-09"))
            .record_completion(day("2024-01-10"), at("2024-01-10"))
            .revert_completion(day("2024-01-09"));

        assert_eq!(state.current_streak, 1);
        assert_eq!(state.best_streak, 1);
        assert_eq!(state.last_completed_date, Some(day("2024-01-10")));
        assert!(!state.completed_on(day("2024-01-09")));
    }

    #[test]
    fn test_revert_after_out_of_order_records_keeps_best_bound() {
        let state = TaskStreakState::default()
            .record_completion(day("2024-01-02"), at("2024-01-02"))
            .record_completion(day("2024-01-01"), at("2024-01-01"))
            .record_completion(day("2024-01-03"), at("2024-01-03"));
        assert_eq!(state.current_streak, 1);
        assert_eq!(state.best_streak, 1);

        let reverted = state.revert_completion(day("2024-01-03"));
        assert_eq!(reverted.current_streak, 2);
        assert_eq!(reverted.best_streak, 2);
        assert_eq!(reverted.last_completed_date, Some(day("2024-01-02")));
    }

    #[test]
    fn test_revert_without_record_only_clears_flags() {
        let start = five_day_streak();
        let state = start.revert_completion(day("2024-02-01"));
        assert!(!state.completed);
        assert_eq!(state.completion_history, start.completion_history);
        assert_eq!(state.current_streak, 5);
    }

    #[test]
    fn test_revert_only_completion_empties_state() {
        let state = TaskStreakState::default()
            .record_completion(day("2024-03-01"), at("2024-03-01"))
            .revert_completion(day("2024-03-01"));
        assert_eq!(state.current_streak, 0);
        assert_eq!(state.best_streak, 0);
        assert_eq!(state.last_completed_date, None);
    }

    #[test]
    fn test_malformed_history_is_tolerated() {
        let mut state = five_day_streak();
        state.completion_history.reverse();
        assert!(!state.is_history_well_formed());

        let next = state.record_completion(day("2024-01-11"), at("2024-01-11"));
        assert_eq!(next.current_streak, 6);
        assert!(five_day_streak().is_history_well_formed());
    }

    #[test]
    fn test_reminder_delayed_by_rain() {
        let scheduled = ScheduledTime {
            hour: 7,
            minute: 30,
            weather_dependent: true,
            avoid_rain: true,
        };
        let rain = WeatherSnapshot::new(50.0, "Rain", 4.0, 0.05);
        let clear = WeatherSnapshot::new(50.0, "Clear", 4.0, 0.0);

        assert_eq!(
            scheduled.reminder_time(Some(&rain)),
            NaiveTime::from_hms_opt(9, 30, 0)
        );
        assert_eq!(
            scheduled.reminder_time(Some(&clear)),
            NaiveTime::from_hms_opt(7, 30, 0)
        );
        assert_eq!(scheduled.reminder_time(None), NaiveTime::from_hms_opt(7, 30, 0));
    }

    #[test]
    fn test_reminder_wraps_past_midnight() {
        let scheduled = ScheduledTime {
            hour: 23,
            minute: 0,
            weather_dependent: true,
            avoid_rain: true,
        };
        let rain = WeatherSnapshot::new(50.0, "Rain", 4.0, 0.05);
        assert_eq!(
            scheduled.reminder_time(Some(&rain)),
            NaiveTime::from_hms_opt(1, 0, 0)
        );
    }

    #[test]
    fn test_invalid_scheduled_time() {
        let scheduled = ScheduledTime {
            hour: 25,
            minute: 0,
            weather_dependent: false,
            avoid_rain: false,
        };
        assert_eq!(scheduled.reminder_time(None), None);
    }
}
