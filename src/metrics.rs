//! Biometric metric catalog
//!
//! Each tracked metric carries an explicit improvement direction and a
//! natural comparison window. Ranking uses this table to normalize the sign
//! of a percentage change, so "lower resting heart rate" and "higher HRV"
//! both rank as improvements.

use serde::{Deserialize, Serialize};

use crate::types::ComparisonWindow;

/// Biometric metric identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKey {
    RestingHeartRate,
    HeartRate,
    HeartRateVariability,
    SleepDuration,
    DeepSleep,
    RemSleep,
    BloodOxygen,
    RespiratoryRate,
    Vo2Max,
    Steps,
    ActiveCalories,
}

impl MetricKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKey::RestingHeartRate => "resting_heart_rate",
            MetricKey::HeartRate => "heart_rate",
            MetricKey::HeartRateVariability => "heart_rate_variability",
            MetricKey::SleepDuration => "sleep_duration",
            MetricKey::DeepSleep => "deep_sleep",
            MetricKey::RemSleep => "rem_sleep",
            MetricKey::BloodOxygen => "blood_oxygen",
            MetricKey::RespiratoryRate => "respiratory_rate",
            MetricKey::Vo2Max => "vo2_max",
            MetricKey::Steps => "steps",
            MetricKey::ActiveCalories => "active_calories",
        }
    }

    /// Display unit of the daily value
    pub fn unit(&self) -> &'static str {
        match self {
            MetricKey::RestingHeartRate | MetricKey::HeartRate => "bpm",
            MetricKey::HeartRateVariability => "ms",
            MetricKey::SleepDuration | MetricKey::DeepSleep | MetricKey::RemSleep => "minutes",
            MetricKey::BloodOxygen => "%",
            MetricKey::RespiratoryRate => "breaths/min",
            MetricKey::Vo2Max => "ml/kg/min",
            MetricKey::Steps => "count",
            MetricKey::ActiveCalories => "kcal",
        }
    }
}

/// Which way a metric moves when it improves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImprovementDirection {
    HigherIsBetter,
    LowerIsBetter,
}

impl ImprovementDirection {
    /// Multiplier that turns a raw percentage change into an improvement
    pub fn sign(&self) -> f64 {
        match self {
            ImprovementDirection::HigherIsBetter => 1.0,
            ImprovementDirection::LowerIsBetter => -1.0,
        }
    }
}

/// A metric considered for impact ranking
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricDefinition {
    pub key: MetricKey,
    pub window: ComparisonWindow,
    pub direction: ImprovementDirection,
}

impl MetricDefinition {
    pub const fn new(
        key: MetricKey,
        window: ComparisonWindow,
        direction: ImprovementDirection,
    ) -> Self {
        Self {
            key,
            window,
            direction,
        }
    }
}

/// Built-in metric catalog
pub fn default_catalog() -> Vec<MetricDefinition> {
    use ComparisonWindow::{Month, Week, Year};
    use ImprovementDirection::{HigherIsBetter, LowerIsBetter};

    vec![
        MetricDefinition::new(MetricKey::RestingHeartRate, Month, LowerIsBetter),
        MetricDefinition::new(MetricKey::HeartRate, Month, LowerIsBetter),
        MetricDefinition::new(MetricKey::HeartRateVariability, Month, HigherIsBetter),
        MetricDefinition::new(MetricKey::SleepDuration, Month, HigherIsBetter),
        MetricDefinition::new(MetricKey::DeepSleep, Month, HigherIsBetter),
        MetricDefinition::new(MetricKey::RemSleep, Month, HigherIsBetter),
        MetricDefinition::new(MetricKey::BloodOxygen, Month, HigherIsBetter),
        MetricDefinition::new(MetricKey::RespiratoryRate, Month, LowerIsBetter),
        MetricDefinition::new(MetricKey::Vo2Max, Year, HigherIsBetter),
        MetricDefinition::new(MetricKey::Steps, Week, HigherIsBetter),
        MetricDefinition::new(MetricKey::ActiveCalories, Week, HigherIsBetter),
    ]
}

/// Look up a metric in a catalog
pub fn find_definition(catalog: &[MetricDefinition], key: MetricKey) -> Option<&MetricDefinition> {
    catalog.iter().find(|d| d.key == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_covers_every_metric_once() {
        let catalog = default_catalog();
        assert_eq!(catalog.len(), 11);

        let mut keys: Vec<_> = catalog.iter().map(|d| d.key).collect();
        keys.sort();
        keys.dedup();
        assert_eq!(keys.len(), catalog.len());
    }

    #[test]
    fn test_heart_rate_metrics_improve_downward() {
        let catalog = default_catalog();
        let rhr = find_definition(&catalog, MetricKey::RestingHeartRate).unwrap();
        let hrv = find_definition(&catalog, MetricKey::HeartRateVariability).unwrap();

        assert_eq!(rhr.direction, ImprovementDirection::LowerIsBetter);
        assert_eq!(hrv.direction, ImprovementDirection::HigherIsBetter);
        assert_eq!(rhr.direction.sign(), -1.0);
    }

    #[test]
    fn test_metric_key_serde_matches_as_str() {
        let json = serde_json::to_string(&MetricKey::Vo2Max).unwrap();
        assert_eq!(json, format!("\"{}\"", MetricKey::Vo2Max.as_str()));
    }
}
