//! Core types for Synheart Insights
//!
//! This module defines the values that flow through the analytics stages:
//! activity records coming in from the log, per-day metric series coming in
//! from the biometric store, and the derived comparison, streak and goal
//! results going out.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::metrics::MetricKey;

/// A date with time-of-day discarded; the join key between logs and metrics
pub type CalendarDay = NaiveDate;

/// Number of user-defined habit slots available next to the built-in set
pub const CUSTOM_HABIT_SLOTS: u8 = 10;

/// Trackable habit / therapy type
///
/// Serialized as its snake_case name (`cold_plunge`, `custom_3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HabitKey {
    Sauna,
    ColdPlunge,
    Running,
    Walking,
    Cycling,
    Swimming,
    StrengthTraining,
    Yoga,
    Stretching,
    Meditation,
    Breathwork,
    Journaling,
    Medication,
    Supplement,
    WaterIntake,
    PainRating,
    MoodRating,
    /// User-defined slot, `0..CUSTOM_HABIT_SLOTS`
    Custom(u8),
}

const BUILTIN_HABITS: [HabitKey; 17] = [
    HabitKey::Sauna,
    HabitKey::ColdPlunge,
    HabitKey::Running,
    HabitKey::Walking,
    HabitKey::Cycling,
    HabitKey::Swimming,
    HabitKey::StrengthTraining,
    HabitKey::Yoga,
    HabitKey::Stretching,
    HabitKey::Meditation,
    HabitKey::Breathwork,
    HabitKey::Journaling,
    HabitKey::Medication,
    HabitKey::Supplement,
    HabitKey::WaterIntake,
    HabitKey::PainRating,
    HabitKey::MoodRating,
];

impl HabitKey {
    /// The fixed, built-in habit set (custom slots excluded)
    pub fn builtin() -> &'static [HabitKey] {
        &BUILTIN_HABITS
    }

    /// Name of a built-in habit; `None` for custom slots
    pub fn builtin_name(&self) -> Option<&'static str> {
        let name = match self {
            HabitKey::Sauna => "sauna",
            HabitKey::ColdPlunge => "cold_plunge",
            HabitKey::Running => "running",
            HabitKey::Walking => "walking",
            HabitKey::Cycling => "cycling",
            HabitKey::Swimming => "swimming",
            HabitKey::StrengthTraining => "strength_training",
            HabitKey::Yoga => "yoga",
            HabitKey::Stretching => "stretching",
            HabitKey::Meditation => "meditation",
            HabitKey::Breathwork => "breathwork",
            HabitKey::Journaling => "journaling",
            HabitKey::Medication => "medication",
            HabitKey::Supplement => "supplement",
            HabitKey::WaterIntake => "water_intake",
            HabitKey::PainRating => "pain_rating",
            HabitKey::MoodRating => "mood_rating",
            HabitKey::Custom(_) => return None,
        };
        Some(name)
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, HabitKey::Custom(_))
    }
}

impl fmt::Display for HabitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HabitKey::Custom(slot) => write!(f, "custom_{slot}"),
            builtin => f.write_str(builtin.builtin_name().unwrap_or_default()),
        }
    }
}

impl FromStr for HabitKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(slot) = s.strip_prefix("custom_") {
            return slot
                .parse::<u8>()
                .map(HabitKey::Custom)
                .map_err(|_| format!("invalid custom habit slot: {s}"));
        }
        BUILTIN_HABITS
            .iter()
            .find(|h| h.builtin_name() == Some(s))
            .copied()
            .ok_or_else(|| format!("unknown habit: {s}"))
    }
}

impl TryFrom<String> for HabitKey {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HabitKey> for String {
    fn from(habit: HabitKey) -> Self {
        habit.to_string()
    }
}

/// Where an activity record came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    #[default]
    Manual,
    /// Automatic import from a wearable device sync
    Wearable,
}

/// One logged occurrence of a habit
///
/// Records are never mutated; an edit in the host app is a delete followed by
/// a new record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    pub id: Uuid,
    pub habit: HabitKey,
    pub timestamp: DateTime<Utc>,
    /// Duration in seconds, absent for non-timed habits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub source: RecordSource,
}

impl ActivityRecord {
    /// A manually logged record with a fresh id
    pub fn manual(habit: HabitKey, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            habit,
            timestamp,
            duration_seconds: None,
            source: RecordSource::Manual,
        }
    }

    /// A record imported from a wearable sync
    pub fn imported(habit: HabitKey, timestamp: DateTime<Utc>) -> Self {
        Self {
            source: RecordSource::Wearable,
            ..Self::manual(habit, timestamp)
        }
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }
}

/// Per-day values of one biometric metric
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DailyMetricSeries {
    values: BTreeMap<CalendarDay, f64>,
}

impl DailyMetricSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, day: CalendarDay, value: f64) -> Option<f64> {
        self.values.insert(day, value)
    }

    pub fn get(&self, day: CalendarDay) -> Option<f64> {
        self.values.get(&day).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CalendarDay, f64)> + '_ {
        self.values.iter().map(|(d, v)| (*d, *v))
    }

    /// Restrict the series to the given days
    pub fn restricted_to(&self, days: &[CalendarDay]) -> Self {
        days.iter()
            .filter_map(|d| self.get(*d).map(|v| (*d, v)))
            .collect()
    }
}

impl FromIterator<(CalendarDay, f64)> for DailyMetricSeries {
    fn from_iter<I: IntoIterator<Item = (CalendarDay, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Goal / counting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Week,
    Month,
    Year,
}

impl Period {
    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }
}

/// Trailing comparison window ending on "today"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComparisonWindow {
    Week,
    Month,
    Year,
}

impl ComparisonWindow {
    /// Window length in days
    pub fn days(&self) -> u32 {
        match self {
            ComparisonWindow::Week => 7,
            ComparisonWindow::Month => 30,
            ComparisonWindow::Year => 365,
        }
    }
}

/// Statistics of one metric over two day groups
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupComparison {
    pub mean_with_habit: f64,
    pub mean_without_habit: f64,
    /// Percentage change relative to the without-habit mean; `None` when that
    /// mean is zero
    pub percent_delta: Option<f64>,
    pub sample_size_with: usize,
    pub sample_size_without: usize,
}

/// A metric comparison attributed to a habit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    pub habit: HabitKey,
    pub metric: MetricKey,
    #[serde(flatten)]
    pub stats: GroupComparison,
}

impl ComparisonResult {
    pub fn new(habit: HabitKey, metric: MetricKey, stats: GroupComparison) -> Self {
        Self {
            habit,
            metric,
            stats,
        }
    }

    /// Smaller of the two group sample sizes
    pub fn min_sample_size(&self) -> usize {
        self.stats.sample_size_with.min(self.stats.sample_size_without)
    }
}

/// Streak and consistency snapshot for one habit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreakState {
    pub current_streak: u32,
    pub best_streak: u32,
    /// Records logged in the current period
    pub this_period_count: u32,
    /// Records logged in the previous period
    pub last_period_count: u32,
    /// Distinct active days this period against the target (0-100)
    pub consistency_percent: f64,
    /// Distinct active days over the whole log
    pub active_days: u32,
}

/// End-of-period projection of a habit goal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalProjection {
    pub completed: u32,
    pub goal: u32,
    pub days_elapsed: u32,
    pub total_days: u32,
    /// Completions per elapsed day
    pub pace: f64,
    pub projected_total: u32,
    pub is_on_track: bool,
    /// Completions still needed to reach the goal
    pub remaining: u32,
}
