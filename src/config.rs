//! Engine configuration
//!
//! Everything the engine needs is passed in explicitly through
//! `InsightConfig`; there is no process-wide state. Every field has a default
//! so partial JSON documents load.

use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::calendar::{Calendar, MAX_UTC_OFFSET_MINUTES};
use crate::error::InsightError;
use crate::goal::HabitGoals;
use crate::impact::MIN_SAMPLE_SIZE;
use crate::metrics::{default_catalog, MetricDefinition};

/// Number of ranked impacts included in a report by default
pub const DEFAULT_TOP_IMPACTS: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InsightConfig {
    /// First day of a calendar week
    pub first_weekday: Weekday,
    /// Local calendar offset east of UTC, in minutes
    pub utc_offset_minutes: i32,
    pub min_sample_size: usize,
    pub top_impacts: usize,
    pub goals: HabitGoals,
    pub metrics: Vec<MetricDefinition>,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            first_weekday: Weekday::Mon,
            utc_offset_minutes: 0,
            min_sample_size: MIN_SAMPLE_SIZE,
            top_impacts: DEFAULT_TOP_IMPACTS,
            goals: HabitGoals::default(),
            metrics: default_catalog(),
        }
    }
}

impl InsightConfig {
    pub fn validate(&self) -> Result<(), InsightError> {
        if self.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
            return Err(InsightError::InvalidUtcOffset(self.utc_offset_minutes));
        }
        if self.min_sample_size == 0 {
            return Err(InsightError::InvalidConfig(
                "min_sample_size must be at least 1".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for metric in &self.metrics {
            if !seen.insert(metric.key) {
                return Err(InsightError::InvalidConfig(format!(
                    "duplicate metric definition: {}",
                    metric.key.as_str()
                )));
            }
        }
        Ok(())
    }

    /// Calendar described by the offset and first weekday
    pub fn calendar(&self) -> Result<Calendar, InsightError> {
        Calendar::from_offset_minutes(self.utc_offset_minutes, self.first_weekday)
    }

    /// Load configuration from JSON
    pub fn from_json(json: &str) -> Result<Self, InsightError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
