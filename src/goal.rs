//! Goal targets and end-of-period projection
//!
//! Projection is a plain linear extrapolation of the pace so far over the
//! whole period. Day-of-week patterns are not modeled.

use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;
use crate::streak::period_count;
use crate::types::{ActivityRecord, CalendarDay, GoalProjection, HabitKey, Period};

pub const DEFAULT_WEEKLY_GOAL: u32 = 3;
pub const DEFAULT_MONTHLY_GOAL: u32 = 12;
pub const DEFAULT_YEARLY_GOAL: u32 = 150;

/// Per-habit goal targets; unset periods fall back to the defaults
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitGoalOverride {
    pub habit: HabitKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weekly: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monthly: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yearly: Option<u32>,
}

/// Goal configuration for all habits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HabitGoals {
    pub weekly: u32,
    pub monthly: u32,
    pub yearly: u32,
    pub overrides: Vec<HabitGoalOverride>,
}

impl Default for HabitGoals {
    fn default() -> Self {
        Self {
            weekly: DEFAULT_WEEKLY_GOAL,
            monthly: DEFAULT_MONTHLY_GOAL,
            yearly: DEFAULT_YEARLY_GOAL,
            overrides: Vec::new(),
        }
    }
}

impl HabitGoals {
    /// Target count of `habit` for `period`
    pub fn target(&self, habit: &HabitKey, period: Period) -> u32 {
        let custom = self.overrides.iter().find(|o| &o.habit == habit).and_then(|o| match period {
            Period::Week => o.weekly,
            Period::Month => o.monthly,
            Period::Year => o.yearly,
        });

        custom.unwrap_or(match period {
            Period::Week => self.weekly,
            Period::Month => self.monthly,
            Period::Year => self.yearly,
        })
    }

    /// Set (or replace) the target of one habit for one period
    pub fn set_target(&mut self, habit: HabitKey, period: Period, target: u32) {
        let index = match self.overrides.iter().position(|o| o.habit == habit) {
            Some(i) => i,
            None => {
                self.overrides.push(HabitGoalOverride {
                    habit,
                    weekly: None,
                    monthly: None,
                    yearly: None,
                });
                self.overrides.len() - 1
            }
        };
        let entry = &mut self.overrides[index];
        match period {
            Period::Week => entry.weekly = Some(target),
            Period::Month => entry.monthly = Some(target),
            Period::Year => entry.yearly = Some(target),
        }
    }
}

/// Linearly project the end-of-period total from the pace so far
///
/// Returns 0 when no day of the period has elapsed.
pub fn project(completed_so_far: u32, days_elapsed: u32, total_days: u32) -> u32 {
    if days_elapsed == 0 {
        return 0;
    }
    let pace = f64::from(completed_so_far) / f64::from(days_elapsed);
    (pace * f64::from(total_days)).round() as u32
}

impl GoalProjection {
    pub fn evaluate(completed: u32, days_elapsed: u32, total_days: u32, goal: u32) -> Self {
        let pace = if days_elapsed == 0 {
            0.0
        } else {
            f64::from(completed) / f64::from(days_elapsed)
        };
        let projected_total = project(completed, days_elapsed, total_days);

        Self {
            completed,
            goal,
            days_elapsed,
            total_days,
            pace,
            projected_total,
            is_on_track: projected_total >= goal,
            remaining: goal.saturating_sub(completed),
        }
    }
}

/// Resolves goal progress from the activity log
pub struct GoalTracker;

impl GoalTracker {
    /// Progress of `habit` toward its `period` goal as of `today`
    pub fn progress(
        records: &[ActivityRecord],
        habit: &HabitKey,
        period: Period,
        today: CalendarDay,
        goals: &HabitGoals,
        calendar: &Calendar,
    ) -> GoalProjection {
        let window = calendar.period_window(period, today);
        let completed = period_count(records, habit, &window, calendar);
        let days_elapsed = calendar.days_elapsed(period, today);

        GoalProjection::evaluate(
            completed,
            days_elapsed,
            window.len_days(),
            goals.target(habit, period),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_day;
    use chrono::{NaiveTime, TimeZone, Utc};

    fn record(habit: HabitKey, date: &str) -> ActivityRecord {
        let day = parse_day(date).unwrap();
        let ts = Utc.from_utc_datetime(&day.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap()));
        ActivityRecord::manual(habit, ts)
    }

    #[test]
    fn test_projection_literal_case() {
        assert_eq!(project(6, 10, 30), 18);
    }

    #[test]
    fn test_projection_zero_elapsed() {
        assert_eq!(project(4, 0, 30), 0);
        let p = GoalProjection::evaluate(4, 0, 30, 10);
        assert_eq!(p.projected_total, 0);
        assert_eq!(p.pace, 0.0);
        assert!(!p.is_on_track);
    }

    #[test]
    fn test_on_track_flag() {
        let p = GoalProjection::evaluate(6, 10, 30, 18);
        assert!(p.is_on_track);
        assert_eq!(p.remaining, 12);

        let p = GoalProjection::evaluate(6, 10, 30, 20);
        assert!(!p.is_on_track);
    }

    #[test]
    fn test_remaining_saturates() {
        let p = GoalProjection::evaluate(25, 20, 30, 20);
        assert_eq!(p.remaining, 0);
        assert!(p.is_on_track);
    }

    #[test]
    fn test_goal_overrides_fall_back_to_defaults() {
        let mut goals = HabitGoals::default();
        goals.set_target(HabitKey::Sauna, Period::Week, 5);

        assert_eq!(goals.target(&HabitKey::Sauna, Period::Week), 5);
        assert_eq!(goals.target(&HabitKey::Sauna, Period::Month), DEFAULT_MONTHLY_GOAL);
        assert_eq!(goals.target(&HabitKey::Running, Period::Week), DEFAULT_WEEKLY_GOAL);

        goals.set_target(HabitKey::Sauna, Period::Week, 4);
        assert_eq!(goals.overrides.len(), 1);
        assert_eq!(goals.target(&HabitKey::Sauna, Period::Week), 4);
    }

    #[test]
    fn test_progress_from_log() {
        let records: Vec<_> = ["2024-01-02", "2024-01-04", "2024-01-06", "2024-01-09", "2024-01-10", "2024-01-10"]
            .iter()
            .map(|d| record(HabitKey::ColdPlunge, d))
            .collect();
        let mut goals = HabitGoals::default();
        goals.set_target(HabitKey::ColdPlunge, Period::Month, 20);

        let p = GoalTracker::progress(
            &records,
            &HabitKey::ColdPlunge,
            Period::Month,
            parse_day("2024-01-10").unwrap(),
            &goals,
            &Calendar::default(),
        );

        assert_eq!(p.completed, 6);
        assert_eq!(p.days_elapsed, 10);
        assert_eq!(p.total_days, 31);
        // 0.6 per day over 31 days
        assert_eq!(p.projected_total, 19);
        assert!(!p.is_on_track);
    }

    #[test]
    fn test_progress_with_no_records() {
        let p = GoalTracker::progress(
            &[],
            &HabitKey::Yoga,
            Period::Week,
            parse_day("2024-01-10").unwrap(),
            &HabitGoals::default(),
            &Calendar::default(),
        );
        assert_eq!(p.completed, 0);
        assert_eq!(p.projected_total, 0);
    }
}
