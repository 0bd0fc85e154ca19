//! Read-only habit statistics for dashboards.

use crate::engine::streak::{compute_streak_as_of, longest_streak};
use crate::model::habit::HabitLog;
use chrono::{Days, NaiveDate};

/// Default trailing window for completion rate.
pub const DEFAULT_WINDOW_DAYS: u32 = 30;

/// Aggregated view over one habit log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HabitStats {
    pub total_completions: usize,
    pub longest_streak: u32,
    /// Streak still alive on `today`: zero once neither today nor yesterday is completed.
    pub current_streak: u32,
    /// Completed days in the trailing window divided by the window length.
    pub completion_rate: f64,
}

/// Computes stats as seen on `today` over a trailing `window_days` window.
pub fn habit_stats(log: &HabitLog, today: NaiveDate, window_days: u32) -> HabitStats {
    let summary = compute_streak_as_of(log, today);
    let alive = summary
        .last_completed_date
        .is_some_and(|last| last == today || today.pred_opt() == Some(last));

    HabitStats {
        total_completions: log.completed_dates().count(),
        longest_streak: longest_streak(log),
        current_streak: if alive { summary.streak } else { 0 },
        completion_rate: completion_rate(log, today, window_days),
    }
}

fn completion_rate(log: &HabitLog, today: NaiveDate, window_days: u32) -> f64 {
    if window_days == 0 {
        return 0.0;
    }
    let window_start = today
        .checked_sub_days(Days::new(u64::from(window_days - 1)))
        .unwrap_or(NaiveDate::MIN);
    let completed = log
        .completed_dates()
        .filter(|date| *date >= window_start && *date <= today)
        .count();
    completed as f64 / f64::from(window_days)
}

#[cfg(test)]
mod tests {
    use super::habit_stats;
    use crate::model::habit::{EntryDetails, HabitLog, HabitLogEntry};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    fn completed_log(days: &[u32]) -> HabitLog {
        days.iter()
            .map(|d| HabitLogEntry::completed(day(*d), EntryDetails::default()))
            .collect()
    }

    #[test]
    fn current_streak_survives_until_end_of_next_day() {
        let log = completed_log(&[1, 2, 3]);
        assert_eq!(habit_stats(&log, day(3), 7).current_streak, 3);
        assert_eq!(habit_stats(&log, day(4), 7).current_streak, 3);
        assert_eq!(habit_stats(&log, day(5), 7).current_streak, 0);
    }

    #[test]
    fn completion_rate_counts_trailing_window_only() {
        let log = completed_log(&[1, 8, 9, 10]);
        let stats = habit_stats(&log, day(10), 5);
        assert_eq!(stats.total_completions, 4);
        assert_eq!(stats.longest_streak, 3);
        assert!((stats.completion_rate - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_window_has_zero_rate() {
        let log = completed_log(&[1]);
        assert_eq!(habit_stats(&log, day(1), 0).completion_rate, 0.0);
    }
}
