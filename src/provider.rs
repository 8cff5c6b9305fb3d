//! External data providers
//!
//! The analytics core never fetches anything itself. The host app implements
//! these traits over its own stores and either resolves a snapshot itself or
//! passes them to `InsightEngine::report_from_providers`. The in-memory
//! implementations here back the FFI, the CLI and tests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::InsightError;
use crate::metrics::MetricKey;
use crate::types::{ActivityRecord, CalendarDay, DailyMetricSeries, HabitKey};

/// Source of activity records
pub trait ActivityLogProvider {
    /// Records matching the optional habit filter within `[from, to)`
    ///
    /// Ordering is unspecified; the core sorts where it needs to.
    fn fetch_records(
        &self,
        habit: Option<&HabitKey>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<ActivityRecord>, InsightError>;
}

/// Source of per-day biometric values
pub trait BiometricMetricProvider {
    /// Values of `metric` for the requested days; missing days mean no data
    fn fetch_daily_metric(
        &self,
        metric: MetricKey,
        days: &[CalendarDay],
    ) -> Result<DailyMetricSeries, InsightError>;
}

/// Activity log held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemoryActivityLog {
    records: Vec<ActivityRecord>,
}

impl InMemoryActivityLog {
    pub fn new(records: Vec<ActivityRecord>) -> Self {
        Self { records }
    }

    pub fn push(&mut self, record: ActivityRecord) {
        self.records.push(record);
    }

    /// Delete a record by id; returns whether it existed
    pub fn remove(&mut self, id: &uuid::Uuid) -> bool {
        let before = self.records.len();
        self.records.retain(|r| &r.id != id);
        self.records.len() != before
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ActivityLogProvider for InMemoryActivityLog {
    fn fetch_records(
        &self,
        habit: Option<&HabitKey>,
        from: Option<DateTime<Utc>>,
        to: Option<DateTime<Utc>>,
    ) -> Result<Vec<ActivityRecord>, InsightError> {
        Ok(self
            .records
            .iter()
            .filter(|r| habit.map_or(true, |h| &r.habit == h))
            .filter(|r| from.map_or(true, |f| r.timestamp >= f))
            .filter(|r| to.map_or(true, |t| r.timestamp < t))
            .cloned()
            .collect())
    }
}

/// Resolved per-metric daily series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricSnapshot {
    series: HashMap<MetricKey, DailyMetricSeries>,
}

impl MetricSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, metric: MetricKey, series: DailyMetricSeries) {
        self.series.insert(metric, series);
    }

    pub fn get(&self, metric: MetricKey) -> Option<&DailyMetricSeries> {
        self.series.get(&metric)
    }

    /// Add or replace one day's value
    pub fn record(&mut self, metric: MetricKey, day: CalendarDay, value: f64) {
        self.series.entry(metric).or_default().insert(day, value);
    }

    pub fn metrics(&self) -> impl Iterator<Item = MetricKey> + '_ {
        self.series.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.series.values().all(DailyMetricSeries::is_empty)
    }

    /// Fetch every metric for `days` from a provider into one snapshot
    pub fn collect<P: BiometricMetricProvider + ?Sized>(
        provider: &P,
        metrics: &[MetricKey],
        days: &[CalendarDay],
    ) -> Result<Self, InsightError> {
        let mut snapshot = Self::new();
        for metric in metrics {
            let series = provider.fetch_daily_metric(*metric, days)?;
            tracing::debug!(metric = metric.as_str(), days = series.len(), "fetched metric series");
            snapshot.insert(*metric, series);
        }
        Ok(snapshot)
    }
}

impl BiometricMetricProvider for MetricSnapshot {
    fn fetch_daily_metric(
        &self,
        metric: MetricKey,
        days: &[CalendarDay],
    ) -> Result<DailyMetricSeries, InsightError> {
        Ok(self
            .get(metric)
            .map(|s| s.restricted_to(days))
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::parse_day;
    use chrono::TimeZone;

    #[test]
    fn test_in_memory_log_filters() {
        let t1 = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 1, 5, 8, 0, 0).unwrap();
        let log = InMemoryActivityLog::new(vec![
            ActivityRecord::manual(HabitKey::Sauna, t1),
            ActivityRecord::manual(HabitKey::Sauna, t2),
            ActivityRecord::manual(HabitKey::Running, t2),
        ]);

        assert_eq!(log.fetch_records(None, None, None).unwrap().len(), 3);
        assert_eq!(log.fetch_records(Some(&HabitKey::Sauna), None, None).unwrap().len(), 2);
        assert_eq!(log.fetch_records(Some(&HabitKey::Sauna), Some(t2), None).unwrap().len(), 1);
        assert_eq!(log.fetch_records(None, None, Some(t2)).unwrap().len(), 1);
    }

    #[test]
    fn test_remove_record() {
        let record = ActivityRecord::manual(HabitKey::Yoga, Utc::now());
        let id = record.id;
        let mut log = InMemoryActivityLog::new(vec![record]);

        assert!(log.remove(&id));
        assert!(!log.remove(&id));
        assert!(log.is_empty());
    }

    #[test]
    fn test_snapshot_collect_returns_partial_series() {
        let d1 = parse_day("2024-01-01").unwrap();
        let d2 = parse_day("2024-01-02").unwrap();
        let mut source = MetricSnapshot::new();
        source.record(MetricKey::HeartRateVariability, d1, 62.0);

        let snapshot = MetricSnapshot::collect(
            &source,
            &[MetricKey::HeartRateVariability, MetricKey::Steps],
            &[d1, d2],
        )
        .unwrap();

        let hrv = snapshot.get(MetricKey::HeartRateVariability).unwrap();
        assert_eq!(hrv.len(), 1);
        assert_eq!(hrv.get(d2), None);
        assert!(snapshot.get(MetricKey::Steps).unwrap().is_empty());
    }
}
