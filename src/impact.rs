//! Impact ranking
//!
//! Runs the habit/no-habit comparison for every habit and metric pair,
//! drops pairs with too little data, and orders what is left by the size of
//! the direction-normalized change.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::aggregate::compare;
use crate::calendar::{Calendar, DateWindow};
use crate::metrics::{ImprovementDirection, MetricDefinition};
use crate::partition::partition;
use crate::provider::MetricSnapshot;
use crate::types::{ActivityRecord, CalendarDay, ComparisonResult, HabitKey};

/// Minimum valid samples required in each group
pub const MIN_SAMPLE_SIZE: usize = 3;

/// A ranked habit/metric comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResult {
    #[serde(flatten)]
    pub comparison: ComparisonResult,
    pub direction: ImprovementDirection,
    /// Percentage change with the sign flipped for lower-is-better metrics,
    /// so positive always means the metric improved on habit days
    pub improvement_pct: f64,
    pub is_improvement: bool,
}

impl ImpactResult {
    fn new(comparison: ComparisonResult, direction: ImprovementDirection, delta: f64) -> Self {
        let improvement_pct = delta * direction.sign();
        Self {
            comparison,
            direction,
            improvement_pct,
            is_improvement: improvement_pct > 0.0,
        }
    }
}

/// Compare one metric for one habit over the metric's trailing window
pub fn compare_habit_metric(
    records: &[ActivityRecord],
    habit: &HabitKey,
    metric: &MetricDefinition,
    snapshot: &MetricSnapshot,
    today: CalendarDay,
    calendar: &Calendar,
) -> Option<ComparisonResult> {
    let series = snapshot.get(metric.key)?;
    let window = DateWindow::trailing(metric.window.days(), today);
    let days = partition(records, habit, &window, calendar);

    compare(series, &days.with_habit, &days.without_habit)
        .map(|stats| ComparisonResult::new(*habit, metric.key, stats))
}

/// Rank every habit x metric impact that passes the sample-size gate
pub fn rank_impacts(
    habits: &[HabitKey],
    metrics: &[MetricDefinition],
    records: &[ActivityRecord],
    snapshot: &MetricSnapshot,
    today: CalendarDay,
    calendar: &Calendar,
    min_sample_size: usize,
) -> Vec<ImpactResult> {
    let mut results = Vec::new();

    for habit in habits {
        for metric in metrics {
            let Some(comparison) =
                compare_habit_metric(records, habit, metric, snapshot, today, calendar)
            else {
                continue;
            };

            if comparison.min_sample_size() < min_sample_size {
                tracing::trace!(
                    habit = %habit,
                    metric = metric.key.as_str(),
                    with = comparison.stats.sample_size_with,
                    without = comparison.stats.sample_size_without,
                    "impact below sample-size gate"
                );
                continue;
            }

            let Some(delta) = comparison.stats.percent_delta else {
                tracing::trace!(habit = %habit, metric = metric.key.as_str(), "impact has zero baseline");
                continue;
            };

            results.push(ImpactResult::new(comparison, metric.direction, delta));
        }
    }

    results.sort_by(|a, b| {
        b.improvement_pct
            .abs()
            .partial_cmp(&a.improvement_pct.abs())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.comparison.habit.cmp(&b.comparison.habit))
            .then_with(|| a.comparison.metric.cmp(&b.comparison.metric))
    });

    tracing::debug!(
        habits = habits.len(),
        metrics = metrics.len(),
        ranked = results.len(),
        "ranked impacts"
    );
    results
}

/// The `n` largest improvements from an already-ranked list
pub fn top_improvements(ranked: &[ImpactResult], n: usize) -> Vec<ImpactResult> {
    ranked
        .iter()
        .filter(|r| r.is_improvement)
        .take(n)
        .cloned()
        .collect()
}
