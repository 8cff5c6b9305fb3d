//! Streak and consistency computation
//!
//! Everything is recomputed from the full activity log on each call. The log
//! is reduced to the set of distinct local days on which the habit was
//! logged, so several records on one day count as a single active day.

use std::collections::BTreeSet;

use crate::calendar::{sub_days, Calendar, DateWindow};
use crate::types::{ActivityRecord, CalendarDay, HabitKey, Period, StreakState};

/// Distinct local days on which `habit` was logged
pub fn active_days(
    records: &[ActivityRecord],
    habit: &HabitKey,
    calendar: &Calendar,
) -> BTreeSet<CalendarDay> {
    records
        .iter()
        .filter(|r| &r.habit == habit)
        .map(|r| calendar.day_of(&r.timestamp))
        .collect()
}

/// Consecutive active days ending today, or yesterday if today is not logged yet
///
/// Today never breaks a streak; the first missing day before it does.
pub fn current_streak(days: &BTreeSet<CalendarDay>, today: CalendarDay) -> u32 {
    let mut cursor = if days.contains(&today) {
        today
    } else {
        sub_days(today, 1)
    };

    let mut streak = 0;
    while days.contains(&cursor) {
        streak += 1;
        let prev = sub_days(cursor, 1);
        if prev == cursor {
            break;
        }
        cursor = prev;
    }
    streak
}

/// Longest run of consecutive active days anywhere in the log
pub fn best_streak(days: &BTreeSet<CalendarDay>) -> u32 {
    let mut best = 0;
    let mut run = 0;
    let mut previous: Option<CalendarDay> = None;

    for day in days {
        run = match previous {
            Some(prev) if prev.succ_opt() == Some(*day) => run + 1,
            _ => 1,
        };
        best = best.max(run);
        previous = Some(*day);
    }
    best
}

/// Share of the target reached, as a percentage capped at 100
///
/// A zero target counts as met once any day is completed.
pub fn consistency_percent(completed_days: u32, target_days: u32) -> f64 {
    if target_days == 0 {
        return if completed_days > 0 { 100.0 } else { 0.0 };
    }
    (f64::from(completed_days) / f64::from(target_days)).min(1.0) * 100.0
}

/// Number of records of `habit` whose local day falls in `window`
pub fn period_count(
    records: &[ActivityRecord],
    habit: &HabitKey,
    window: &DateWindow,
    calendar: &Calendar,
) -> u32 {
    records
        .iter()
        .filter(|r| &r.habit == habit && window.contains(calendar.day_of(&r.timestamp)))
        .count() as u32
}

/// Streak state builder for one habit
pub struct StreakCalculator;

impl StreakCalculator {
    /// Compute the streak state of `habit` as of `today`
    ///
    /// `target_days` is the period goal used for the consistency percentage.
    pub fn compute(
        records: &[ActivityRecord],
        habit: &HabitKey,
        period: Period,
        today: CalendarDay,
        target_days: u32,
        calendar: &Calendar,
    ) -> StreakState {
        let days = active_days(records, habit, calendar);
        if days.is_empty() {
            return StreakState::default();
        }

        let this_period = calendar.period_window(period, today);
        let last_period = calendar.previous_period_window(period, today);

        let completed_days = days.iter().filter(|d| this_period.contains(**d)).count() as u32;

        StreakState {
            current_streak: current_streak(&days, today),
            best_streak: best_streak(&days),
            this_period_count: period_count(records, habit, &this_period, calendar),
            last_period_count: period_count(records, habit, &last_period, calendar),
            consistency_percent: consistency_percent(completed_days, target_days),
            active_days: days.len() as u32,
        }
    }
}
