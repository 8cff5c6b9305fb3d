//! Date-window partitioning
//!
//! Splits the days of a window into days on which a habit was logged and
//! days on which it was not. The baseline day set comes from the window
//! itself, so a habit with no records puts every day in the "without" group.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::calendar::{Calendar, DateWindow};
use crate::types::{ActivityRecord, CalendarDay, HabitKey};

/// Days of a window split by habit presence
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPartition {
    pub with_habit: BTreeSet<CalendarDay>,
    pub without_habit: BTreeSet<CalendarDay>,
}

impl DayPartition {
    /// Union of both groups; equal to every day of the partitioned window
    pub fn all_days(&self) -> BTreeSet<CalendarDay> {
        self.with_habit.union(&self.without_habit).copied().collect()
    }
}

/// Partition `window` (`[start, end)`) by whether `habit` was logged on each day
pub fn partition(
    records: &[ActivityRecord],
    habit: &HabitKey,
    window: &DateWindow,
    calendar: &Calendar,
) -> DayPartition {
    let with_habit: BTreeSet<CalendarDay> = records
        .iter()
        .filter(|r| &r.habit == habit)
        .map(|r| calendar.day_of(&r.timestamp))
        .filter(|d| window.contains(*d))
        .collect();

    let without_habit = window.days().filter(|d| !with_habit.contains(d)).collect();

    DayPartition {
        with_habit,
        without_habit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_day;
    use chrono::{NaiveTime, TimeZone, Utc};

    fn record(habit: HabitKey, date: &str, hour: u32) -> ActivityRecord {
        let day = parse_day(date).unwrap();
        let time = NaiveTime::from_hms_opt(hour, 15, 0).unwrap();
        let ts = Utc.from_utc_datetime(&day.and_time(time));
        ActivityRecord::manual(habit, ts)
    }

    fn window(start: &str, end: &str) -> DateWindow {
        DateWindow::new(parse_day(start).unwrap(), parse_day(end).unwrap())
    }

    #[test]
    fn test_partition_is_complete_and_disjoint() {
        let records = vec![
            record(HabitKey::Sauna, "2024-01-02", 7),
            record(HabitKey::Sauna, "2024-01-02", 19),
            record(HabitKey::Sauna, "2024-01-05", 12),
            record(HabitKey::Running, "2024-01-03", 6),
        ];
        let w = window("2024-01-01", "2024-01-08");
        let cal = Calendar::default();

        let p = partition(&records, &HabitKey::Sauna, &w, &cal);

        assert_eq!(p.with_habit.len(), 2);
        assert_eq!(p.without_habit.len(), 5);
        assert!(p.with_habit.is_disjoint(&p.without_habit));
        assert_eq!(p.all_days(), w.days().collect());
    }

    #[test]
    fn test_records_outside_window_ignored() {
        let records = vec![
            record(HabitKey::Meditation, "2023-12-31", 8),
            record(HabitKey::Meditation, "2024-01-08", 8),
            record(HabitKey::Meditation, "2024-01-04", 8),
        ];
        let w = window("2024-01-01", "2024-01-08");

        let p = partition(&records, &HabitKey::Meditation, &w, &Calendar::default());

        assert_eq!(
            p.with_habit.into_iter().collect::<Vec<_>>(),
            vec![parse_day("2024-01-04").unwrap()]
        );
    }

    #[test]
    fn test_no_records_puts_whole_window_without() {
        let w = window("2024-01-01", "2024-01-31");
        let p = partition(&[], &HabitKey::ColdPlunge, &w, &Calendar::default());

        assert!(p.with_habit.is_empty());
        assert_eq!(p.without_habit.len(), 30);
    }

    #[test]
    fn test_partition_is_deterministic() {
        let records = vec![
            record(HabitKey::Yoga, "2024-01-03", 9),
            record(HabitKey::Yoga, "2024-01-01", 9),
        ];
        let w = window("2024-01-01", "2024-01-05");
        let cal = Calendar::default();

        let a = partition(&records, &HabitKey::Yoga, &w, &cal);
        let b = partition(&records, &HabitKey::Yoga, &w, &cal);
        assert_eq!(a, b);
    }

    #[test]
    fn test_local_offset_moves_late_record_to_next_day() {
        let records = vec![record(HabitKey::Sauna, "2024-01-01", 22)];
        let w = window("2024-01-01", "2024-01-03");
        let cal = Calendar::from_offset_minutes(180, chrono::Weekday::Mon).unwrap();

        let p = partition(&records, &HabitKey::Sauna, &w, &cal);
        assert!(p.with_habit.contains(&parse_day("2024-01-02").unwrap()));
    }
}
