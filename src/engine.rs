//! Engine orchestration
//!
//! This module provides the public API for Synheart Insights. It wires the
//! stateless analytics stages together over one resolved snapshot of the
//! activity log and the biometric series.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::calendar::{parse_day, Calendar, DateWindow};
use crate::config::InsightConfig;
use crate::error::InsightError;
use crate::goal::GoalTracker;
use crate::impact::{compare_habit_metric, rank_impacts, ImpactResult};
use crate::input::InputAdapter;
use crate::metrics::{find_definition, MetricKey};
use crate::partition::{partition, DayPartition};
use crate::provider::{ActivityLogProvider, BiometricMetricProvider, MetricSnapshot};
use crate::streak::StreakCalculator;
use crate::types::{
    ActivityRecord, CalendarDay, ComparisonResult, GoalProjection, HabitKey, Period, StreakState,
};
use crate::{INSIGHTS_VERSION, PRODUCER_NAME};

/// Streak and goal state of one habit for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitSummary {
    pub habit: HabitKey,
    pub period: Period,
    pub streak: StreakState,
    pub goal: GoalProjection,
}

/// Everything the presentation layer renders for a dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsightReport {
    pub producer: String,
    pub version: String,
    pub today: CalendarDay,
    pub habits: Vec<HabitSummary>,
    pub top_impacts: Vec<ImpactResult>,
}

/// Analytics engine bound to one configuration
#[derive(Debug, Clone)]
pub struct InsightEngine {
    config: InsightConfig,
    calendar: Calendar,
}

impl Default for InsightEngine {
    fn default() -> Self {
        Self {
            config: InsightConfig::default(),
            calendar: Calendar::default(),
        }
    }
}

impl InsightEngine {
    /// Create an engine, validating the configuration
    pub fn new(config: InsightConfig) -> Result<Self, InsightError> {
        config.validate()?;
        let calendar = config.calendar()?;
        Ok(Self { config, calendar })
    }

    pub fn config(&self) -> &InsightConfig {
        &self.config
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    /// Split `window` into habit and non-habit days
    pub fn partition(
        &self,
        records: &[ActivityRecord],
        habit: &HabitKey,
        window: &DateWindow,
    ) -> DayPartition {
        partition(records, habit, window, &self.calendar)
    }

    /// Compare one metric on habit vs. non-habit days over its configured window
    ///
    /// Metrics absent from the configuration are not compared.
    pub fn compare_habit(
        &self,
        records: &[ActivityRecord],
        habit: &HabitKey,
        metric: MetricKey,
        snapshot: &MetricSnapshot,
        today: CalendarDay,
    ) -> Option<ComparisonResult> {
        let definition = find_definition(&self.config.metrics, metric)?;
        compare_habit_metric(records, habit, definition, snapshot, today, &self.calendar)
    }

    pub fn streak_state(
        &self,
        records: &[ActivityRecord],
        habit: &HabitKey,
        period: Period,
        today: CalendarDay,
    ) -> StreakState {
        let target = self.config.goals.target(habit, period);
        StreakCalculator::compute(records, habit, period, today, target, &self.calendar)
    }

    pub fn goal_projection(
        &self,
        records: &[ActivityRecord],
        habit: &HabitKey,
        period: Period,
        today: CalendarDay,
    ) -> GoalProjection {
        GoalTracker::progress(records, habit, period, today, &self.config.goals, &self.calendar)
    }

    /// Ranked impacts of `habits` against every configured metric
    pub fn rank_impacts(
        &self,
        habits: &[HabitKey],
        records: &[ActivityRecord],
        snapshot: &MetricSnapshot,
        today: CalendarDay,
    ) -> Vec<ImpactResult> {
        rank_impacts(
            habits,
            &self.config.metrics,
            records,
            snapshot,
            today,
            &self.calendar,
            self.config.min_sample_size,
        )
    }

    pub fn habit_summary(
        &self,
        records: &[ActivityRecord],
        habit: &HabitKey,
        period: Period,
        today: CalendarDay,
    ) -> HabitSummary {
        HabitSummary {
            habit: *habit,
            period,
            streak: self.streak_state(records, habit, period, today),
            goal: self.goal_projection(records, habit, period, today),
        }
    }

    /// Build a full report for every habit present in the log
    pub fn report(
        &self,
        records: &[ActivityRecord],
        snapshot: &MetricSnapshot,
        period: Period,
        today: CalendarDay,
    ) -> InsightReport {
        let habits: Vec<HabitKey> = records
            .iter()
            .map(|r| r.habit)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        tracing::debug!(
            records = records.len(),
            habits = habits.len(),
            metrics = self.config.metrics.len(),
            %today,
            "building insight report"
        );

        let summaries = habits
            .iter()
            .map(|h| self.habit_summary(records, h, period, today))
            .collect();

        let mut top_impacts = self.rank_impacts(&habits, records, snapshot, today);
        top_impacts.truncate(self.config.top_impacts);

        InsightReport {
            producer: PRODUCER_NAME.to_string(),
            version: INSIGHTS_VERSION.to_string(),
            today,
            habits: summaries,
            top_impacts,
        }
    }

    /// Fetch the full log and the widest metric window, then build a report
    pub fn report_from_providers<L, M>(
        &self,
        log: &L,
        biometrics: &M,
        period: Period,
        today: CalendarDay,
    ) -> Result<InsightReport, InsightError>
    where
        L: ActivityLogProvider + ?Sized,
        M: BiometricMetricProvider + ?Sized,
    {
        let records = log.fetch_records(None, None, None)?;

        let widest = self
            .config
            .metrics
            .iter()
            .map(|m| m.window.days())
            .max()
            .unwrap_or(0);
        let days: Vec<CalendarDay> = DateWindow::trailing(widest, today).days().collect();
        let keys: Vec<MetricKey> = self.config.metrics.iter().map(|m| m.key).collect();
        let snapshot = MetricSnapshot::collect(biometrics, &keys, &days)?;

        Ok(self.report(&records, &snapshot, period, today))
    }
}

/// Build a weekly insight report from raw JSON documents.
///
/// # Arguments
/// * `records_json` - JSON array of activity records
/// * `samples_json` - JSON array of daily metric samples
/// * `config_json` - Optional engine configuration; defaults when `None`
/// * `today` - Reference day (`YYYY-MM-DD`) in the configured local calendar
///
/// # Returns
/// The report serialized as JSON
///
/// # Example
/// ```ignore
/// let report = insights_report_json(records, samples, None, "2024-01-15")?;
/// ```
pub fn insights_report_json(
    records_json: &str,
    samples_json: &str,
    config_json: Option<&str>,
    today: &str,
) -> Result<String, InsightError> {
    let config = match config_json {
        Some(json) => InsightConfig::from_json(json)?,
        None => InsightConfig::default(),
    };
    let engine = InsightEngine::new(config)?;
    let today = parse_day(today)?;

    let records = InputAdapter::to_records(InputAdapter::parse_records_array(records_json)?);
    let snapshot = InputAdapter::to_snapshot(&InputAdapter::parse_samples_array(samples_json)?);

    let report = engine.report(&records, &snapshot, Period::Week, today);
    Ok(serde_json::to_string(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::add_days;
    use chrono::{NaiveTime, TimeZone, Utc};

    fn day(s: &str) -> CalendarDay {
        parse_day(s).unwrap()
    }

    fn record(habit: HabitKey, d: CalendarDay) -> ActivityRecord {
        let ts = Utc.from_utc_datetime(&d.and_time(NaiveTime::from_hms_opt(6, 30, 0).unwrap()));
        ActivityRecord::manual(habit, ts)
    }

    /// Meditation every other day through January with higher HRV on those days
    fn january() -> (Vec<ActivityRecord>, MetricSnapshot) {
        let start = day("2024-01-01");
        let mut records = Vec::new();
        let mut snapshot = MetricSnapshot::new();
        for i in 0..31 {
            let d = add_days(start, i);
            let on = i % 2 == 0;
            if on {
                records.push(record(HabitKey::Meditation, d));
            }
            snapshot.record(MetricKey::HeartRateVariability, d, if on { 59.0 } else { 50.0 });
            snapshot.record(MetricKey::RestingHeartRate, d, 55.0);
        }
        records.push(record(HabitKey::Sauna, day("2024-01-30")));
        (records, snapshot)
    }

    #[test]
    fn test_report_covers_logged_habits() {
        let (records, snapshot) = january();
        let engine = InsightEngine::default();

        let report = engine.report(&records, &snapshot, Period::Week, day("2024-01-31"));

        assert_eq!(report.producer, PRODUCER_NAME);
        let habits: Vec<_> = report.habits.iter().map(|h| h.habit).collect();
        assert_eq!(habits, vec![HabitKey::Sauna, HabitKey::Meditation]);

        let meditation = &report.habits[1];
        assert_eq!(meditation.streak.current_streak, 1);
        assert_eq!(meditation.streak.best_streak, 1);

        let hrv = report
            .top_impacts
            .iter()
            .find(|i| i.comparison.metric == MetricKey::HeartRateVariability)
            .unwrap();
        assert_eq!(hrv.comparison.habit, HabitKey::Meditation);
        assert!((hrv.improvement_pct - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_flat_metric_ranks_as_zero_change() {
        let (records, snapshot) = january();
        let engine = InsightEngine::default();

        let rhr = engine
            .compare_habit(&records, &HabitKey::Meditation, MetricKey::RestingHeartRate, &snapshot, day("2024-01-31"))
            .unwrap();
        assert_eq!(rhr.stats.percent_delta, Some(0.0));
    }

    #[test]
    fn test_top_impacts_truncated() {
        let (records, snapshot) = january();
        let config = InsightConfig {
            top_impacts: 1,
            ..Default::default()
        };
        let engine = InsightEngine::new(config).unwrap();

        let report = engine.report(&records, &snapshot, Period::Month, day("2024-01-31"));
        assert_eq!(report.top_impacts.len(), 1);
    }

    #[test]
    fn test_empty_inputs_produce_empty_report() {
        let engine = InsightEngine::default();
        let report = engine.report(&[], &MetricSnapshot::new(), Period::Week, day("2024-01-31"));

        assert!(report.habits.is_empty());
        assert!(report.top_impacts.is_empty());

        let streak = engine.streak_state(&[], &HabitKey::Sauna, Period::Week, day("2024-01-31"));
        assert_eq!(streak, StreakState::default());
        let goal = engine.goal_projection(&[], &HabitKey::Sauna, Period::Week, day("2024-01-31"));
        assert_eq!(goal.projected_total, 0);
        assert!(engine
            .compare_habit(&[], &HabitKey::Sauna, MetricKey::HeartRateVariability, &MetricSnapshot::new(), day("2024-01-31"))
            .is_none());
    }

    #[test]
    fn test_insights_report_json() {
        let records = r#"[
            {"habit": "sauna", "timestamp": "2024-01-14T18:00:00Z"},
            {"habit": "sauna", "timestamp": "2024-01-15T18:00:00Z"},
            {"habit": "sauna", "timestamp": "not a date"}
        ]"#;
        let samples = r#"[{"metric": "steps", "date": "2024-01-15", "value": 8000}]"#;

        let json = insights_report_json(records, samples, Some(r#"{"first_weekday": "Mon"}"#), "2024-01-15").unwrap();
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(report["today"], "2024-01-15");
        assert_eq!(report["habits"][0]["habit"], "sauna");
        assert_eq!(report["habits"][0]["streak"]["current_streak"], 2);
        // 2024-01-15 is a Monday, so only that record is in this week
        assert_eq!(report["habits"][0]["streak"]["this_period_count"], 1);
        assert_eq!(report["habits"][0]["streak"]["last_period_count"], 1);
        assert!(report["top_impacts"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_insights_report_json_errors() {
        assert!(insights_report_json("not json", "[]", None, "2024-01-15").is_err());
        assert!(insights_report_json("[]", "[]", None, "January").is_err());
        assert!(insights_report_json("[]", "[]", Some(r#"{"min_sample_size": 0}"#), "2024-01-15").is_err());
    }

    #[test]
    fn test_report_from_providers_matches_direct_report() {
        let (records, snapshot) = january();
        let engine = InsightEngine::default();
        let log = crate::provider::InMemoryActivityLog::new(records.clone());

        let via_providers = engine
            .report_from_providers(&log, &snapshot, Period::Week, day("2024-01-31"))
            .unwrap();
        let direct = engine.report(&records, &snapshot, Period::Week, day("2024-01-31"));

        assert_eq!(via_providers, direct);
    }

    #[test]
    fn test_malformed_fields_do_not_drop_batch() {
        let records = r#"[
            {"habit": "sauna", "timestamp": "2024-01-15T18:00:00Z"},
            {"habit": "sauna", "timestamp": 1705300000},
            {"habit": "custom_300", "timestamp": "2024-01-15T18:00:00Z"}
        ]"#;
        let samples = r#"[
            {"metric": "steps", "date": "2024-01-15", "value": 8000},
            {"metric": "steps", "date": "2024-01-14", "value": null}
        ]"#;

        let json = insights_report_json(records, samples, None, "2024-01-15").unwrap();
        let report: serde_json::Value = serde_json::from_str(&json).unwrap();

        let habits = report["habits"].as_array().unwrap();
        assert_eq!(habits.len(), 1);
        assert_eq!(habits[0]["habit"], "sauna");
        assert_eq!(habits[0]["streak"]["this_period_count"], 1);
    }
}
