//! Consecutive-day streak calculation.
//!
//! A streak is the length of the run of consecutive completed calendar days
//! ending at the most recent completed day. Backfilled entries can merge two
//! runs, so the result is always derived from a full rescan of the log.

use crate::model::habit::HabitLog;
use chrono::NaiveDate;

/// Result of one streak scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreakSummary {
    pub streak: u32,
    pub last_completed_date: Option<NaiveDate>,
}

/// Computes the streak over every entry in the log.
pub fn compute_streak(log: &HabitLog) -> StreakSummary {
    compute_streak_as_of(log, NaiveDate::MAX)
}

/// Computes the streak ignoring entries dated after `as_of`.
pub fn compute_streak_as_of(log: &HabitLog, as_of: NaiveDate) -> StreakSummary {
    let mut completed = log.completed_dates().rev().filter(|date| *date <= as_of);
    let Some(last) = completed.next() else {
        return StreakSummary::default();
    };

    let mut streak: u32 = 1;
    let mut cursor = last;
    for date in completed {
        // Dates arrive strictly descending; anything but the previous day is a gap.
        if cursor.pred_opt() != Some(date) {
            break;
        }
        streak = streak.saturating_add(1);
        cursor = date;
    }

    StreakSummary {
        streak,
        last_completed_date: Some(last),
    }
}

/// Returns the longest run of consecutive completed days anywhere in the log.
pub fn longest_streak(log: &HabitLog) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    let mut previous: Option<NaiveDate> = None;

    for date in log.completed_dates() {
        current = match previous {
            Some(prev) if prev.succ_opt() == Some(date) => current + 1,
            _ => 1,
        };
        longest = longest.max(current);
        previous = Some(date);
    }

    longest
}
