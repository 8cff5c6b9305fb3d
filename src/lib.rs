//! Synheart Insights - On-device habit impact and streak analytics
//!
//! Insights correlates a user's wellness activity log (sauna, cold plunge,
//! meditation, medication, ...) with daily biometric series (resting heart
//! rate, HRV, sleep, SpO2, ...) through stateless stages: day partitioning →
//! comparative aggregation → impact ranking, alongside streak, consistency
//! and goal projection over the raw log.
//!
//! ## Modules
//!
//! - **Analytics**: `partition`, `aggregate`, `streak`, `goal`, `impact`
//! - **Boundary**: `provider` traits, the JSON `input` adapter, and `ffi`

pub mod aggregate;
pub mod calendar;
pub mod config;
pub mod engine;
pub mod error;
pub mod goal;
pub mod impact;
pub mod input;
pub mod metrics;
pub mod partition;
pub mod provider;
pub mod streak;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use calendar::{Calendar, DateWindow};
pub use config::InsightConfig;
pub use engine::{insights_report_json, HabitSummary, InsightEngine, InsightReport};
pub use error::{InsightError, ValidationError};
pub use impact::{rank_impacts, ImpactResult, MIN_SAMPLE_SIZE};
pub use metrics::{ImprovementDirection, MetricDefinition, MetricKey};
pub use provider::{ActivityLogProvider, BiometricMetricProvider, InMemoryActivityLog, MetricSnapshot};
pub use types::{
    ActivityRecord, CalendarDay, ComparisonResult, DailyMetricSeries, GoalProjection, HabitKey,
    Period, StreakState,
};

/// Library version embedded in all reports
pub const INSIGHTS_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for reports
pub const PRODUCER_NAME: &str = "synheart-insights";
