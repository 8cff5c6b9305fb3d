//! Comparative metric aggregation
//!
//! Compares the mean of a daily metric over two groups of days. Missing and
//! non-finite values are excluded from a group's sample; an empty sample or a
//! zero baseline mean is reported as absent instead of dividing by zero.

use std::collections::BTreeSet;

use crate::types::{CalendarDay, DailyMetricSeries, GroupComparison};

/// Source of one metric's value per calendar day
pub trait MetricLookup {
    fn value_on(&self, day: CalendarDay) -> Option<f64>;
}

impl MetricLookup for DailyMetricSeries {
    fn value_on(&self, day: CalendarDay) -> Option<f64> {
        self.get(day)
    }
}

impl<F> MetricLookup for F
where
    F: Fn(CalendarDay) -> Option<f64>,
{
    fn value_on(&self, day: CalendarDay) -> Option<f64> {
        self(day)
    }
}

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Percentage change from `baseline` to `value`; `None` for a zero baseline
pub fn percent_change(value: f64, baseline: f64) -> Option<f64> {
    if baseline == 0.0 {
        return None;
    }
    Some((value - baseline) / baseline * 100.0)
}

fn sample<L: MetricLookup + ?Sized>(lookup: &L, days: &BTreeSet<CalendarDay>) -> Vec<f64> {
    days.iter()
        .filter_map(|d| lookup.value_on(*d))
        .filter(|v| v.is_finite())
        .collect()
}

/// Compare a metric over `group_a` (habit days) and `group_b` (other days)
///
/// Returns `None` when either group has no valid samples.
pub fn compare<L: MetricLookup + ?Sized>(
    lookup: &L,
    group_a: &BTreeSet<CalendarDay>,
    group_b: &BTreeSet<CalendarDay>,
) -> Option<GroupComparison> {
    let with = sample(lookup, group_a);
    let without = sample(lookup, group_b);

    let mean_with_habit = mean(&with)?;
    let mean_without_habit = mean(&without)?;

    Some(GroupComparison {
        mean_with_habit,
        mean_without_habit,
        percent_delta: percent_change(mean_with_habit, mean_without_habit),
        sample_size_with: with.len(),
        sample_size_without: without.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_day;
    use pretty_assertions::assert_eq;

    fn days(list: &[&str]) -> BTreeSet<CalendarDay> {
        list.iter().map(|s| parse_day(s).unwrap()).collect()
    }

    fn series(pairs: &[(&str, f64)]) -> DailyMetricSeries {
        pairs
            .iter()
            .map(|(d, v)| (parse_day(d).unwrap(), *v))
            .collect()
    }

    #[test]
    fn test_compare_means_and_delta() {
        let hrv = series(&[
            ("2024-01-01", 60.0),
            ("2024-01-02", 70.0),
            ("2024-01-03", 50.0),
            ("2024-01-04", 50.0),
        ]);
        let with = days(&["2024-01-01", "2024-01-02"]);
        let without = days(&["2024-01-03", "2024-01-04"]);

        let result = compare(&hrv, &with, &without).unwrap();

        assert_eq!(
            result,
            GroupComparison {
                mean_with_habit: 65.0,
                mean_without_habit: 50.0,
                percent_delta: Some(30.0),
                sample_size_with: 2,
                sample_size_without: 2,
            }
        );
    }

    #[test]
    fn test_missing_days_excluded_from_sample() {
        let rhr = series(&[("2024-01-01", 55.0), ("2024-01-03", 60.0)]);
        let with = days(&["2024-01-01", "2024-01-02"]);
        let without = days(&["2024-01-03", "2024-01-04", "2024-01-05"]);

        let result = compare(&rhr, &with, &without).unwrap();
        assert_eq!(result.sample_size_with, 1);
        assert_eq!(result.sample_size_without, 1);
    }

    #[test]
    fn test_all_missing_group_yields_none() {
        let lookup = |d: CalendarDay| {
            if d == parse_day("2024-01-01").unwrap() {
                Some(42.0)
            } else {
                None
            }
        };
        let with = days(&["2024-01-01"]);
        let without = days(&["2024-01-02", "2024-01-03"]);

        assert!(compare(&lookup, &with, &without).is_none());
        assert!(compare(&lookup, &BTreeSet::new(), &with).is_none());
    }

    #[test]
    fn test_zero_baseline_has_no_delta() {
        let steps = series(&[("2024-01-01", 1000.0), ("2024-01-02", 0.0)]);
        let result = compare(&steps, &days(&["2024-01-01"]), &days(&["2024-01-02"])).unwrap();

        assert_eq!(result.mean_without_habit, 0.0);
        assert_eq!(result.percent_delta, None);
    }

    #[test]
    fn test_non_finite_values_ignored() {
        let lookup = |_: CalendarDay| Some(f64::NAN);
        let with = days(&["2024-01-01"]);
        let without = days(&["2024-01-02"]);
        assert!(compare(&lookup, &with, &without).is_none());
    }

    #[test]
    fn test_mean_and_percent_change_helpers() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[2.0, 4.0]), Some(3.0));
        assert_eq!(percent_change(110.0, 100.0), Some(10.0));
        assert_eq!(percent_change(1.0, 0.0), None);
    }
}
