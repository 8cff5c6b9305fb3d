//! JSON input adapter
//!
//! Converts raw activity-log and metric-sample documents handed over by the
//! host app into core types. Records with unusable fields are logged and
//! skipped rather than failing the whole batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::calendar::parse_day;
use crate::error::{InsightError, ValidationError};
use crate::metrics::MetricKey;
use crate::provider::MetricSnapshot;
use crate::types::{ActivityRecord, CalendarDay, HabitKey, RecordSource, CUSTOM_HABIT_SLOTS};

/// Activity record as stored by the host app
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawActivityRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    /// Habit key as written by the host (`sauna`, `custom_3`, ...)
    pub habit: String,
    /// RFC 3339 timestamp; any other JSON type fails validation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<RecordSource>,
}

impl RawActivityRecord {
    /// Check the record and resolve its habit and timestamp
    pub fn validate(&self) -> Result<(HabitKey, DateTime<Utc>), ValidationError> {
        let habit: HabitKey = self
            .habit
            .parse()
            .map_err(|_| ValidationError::UnknownHabit(self.habit.clone()))?;
        if let HabitKey::Custom(slot) = habit {
            if slot >= CUSTOM_HABIT_SLOTS {
                return Err(ValidationError::CustomSlotOutOfRange {
                    slot,
                    max: CUSTOM_HABIT_SLOTS - 1,
                });
            }
        }

        if let Some(duration) = self.duration_seconds {
            if !duration.is_finite() || duration < 0.0 {
                return Err(ValidationError::InvalidDuration(duration));
            }
        }

        let raw = match &self.timestamp {
            None => return Err(ValidationError::MissingTimestamp),
            Some(Value::String(raw)) => raw,
            Some(other) => return Err(ValidationError::InvalidTimestamp(other.to_string())),
        };
        let timestamp = DateTime::parse_from_rfc3339(raw.trim())
            .map(|ts| ts.with_timezone(&Utc))
            .map_err(|e| ValidationError::InvalidTimestamp(format!("{raw}: {e}")))?;
        Ok((habit, timestamp))
    }

    /// Convert into an `ActivityRecord`
    pub fn into_record(self) -> Result<ActivityRecord, ValidationError> {
        let (habit, timestamp) = self.validate()?;
        Ok(ActivityRecord {
            id: self.id.unwrap_or_else(Uuid::new_v4),
            habit,
            timestamp,
            duration_seconds: self.duration_seconds,
            source: self.source.unwrap_or_default(),
        })
    }
}

/// One biometric value attributed to a calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMetricSample {
    pub metric: MetricKey,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `null` means no reading for that day
    #[serde(default)]
    pub value: Option<f64>,
}

/// Problem found in one record of a batch
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordIssue {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub error: String,
}

/// Adapter between host JSON documents and core types
pub struct InputAdapter;

impl InputAdapter {
    /// Parse a JSON array of activity records
    pub fn parse_records_array(json: &str) -> Result<Vec<RawActivityRecord>, InsightError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse newline-delimited activity records
    pub fn parse_records_ndjson(ndjson: &str) -> Result<Vec<RawActivityRecord>, InsightError> {
        parse_ndjson(ndjson)
    }

    /// Parse a JSON array of metric samples
    pub fn parse_samples_array(json: &str) -> Result<Vec<RawMetricSample>, InsightError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse newline-delimited metric samples
    pub fn parse_samples_ndjson(ndjson: &str) -> Result<Vec<RawMetricSample>, InsightError> {
        parse_ndjson(ndjson)
    }

    /// Convert raw records, skipping the ones that fail validation
    pub fn to_records(raw: Vec<RawActivityRecord>) -> Vec<ActivityRecord> {
        let total = raw.len();
        let records: Vec<ActivityRecord> = raw
            .into_iter()
            .enumerate()
            .filter_map(|(index, r)| {
                let id = r.id;
                match r.into_record() {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!(index, id = ?id, error = %e, "skipping activity record");
                        None
                    }
                }
            })
            .collect();

        tracing::debug!(total, kept = records.len(), "converted activity records");
        records
    }

    /// Group samples into per-metric daily series
    ///
    /// Several samples for the same metric and day are averaged.
    pub fn to_snapshot(samples: &[RawMetricSample]) -> MetricSnapshot {
        let mut sums: BTreeMap<(MetricKey, CalendarDay), (f64, u32)> = BTreeMap::new();

        for (index, sample) in samples.iter().enumerate() {
            let day = match parse_day(&sample.date) {
                Ok(day) => day,
                Err(e) => {
                    tracing::warn!(index, date = %sample.date, error = %e, "skipping metric sample");
                    continue;
                }
            };
            let Some(value) = sample.value.filter(|v| v.is_finite()) else {
                tracing::warn!(index, metric = sample.metric.as_str(), "skipping metric sample without a finite value");
                continue;
            };
            let entry = sums.entry((sample.metric, day)).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }

        let mut snapshot = MetricSnapshot::new();
        for ((metric, day), (sum, count)) in sums {
            snapshot.record(metric, day, sum / f64::from(count));
        }
        snapshot
    }

    /// Validation problems in a batch, by position
    pub fn validate_records(raw: &[RawActivityRecord]) -> Vec<RecordIssue> {
        raw.iter()
            .enumerate()
            .filter_map(|(index, r)| {
                r.validate().err().map(|e| RecordIssue {
                    index,
                    id: r.id,
                    error: e.to_string(),
                })
            })
            .collect()
    }
}

fn parse_ndjson<T: serde::de::DeserializeOwned>(ndjson: &str) -> Result<Vec<T>, InsightError> {
    let mut items = Vec::new();
    for (line_num, line) in ndjson.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let item = serde_json::from_str::<T>(trimmed).map_err(|e| {
            InsightError::ParseError(format!("Failed to parse line {}: {}", line_num + 1, e))
        })?;
        items.push(item);
    }
    Ok(items)
}
