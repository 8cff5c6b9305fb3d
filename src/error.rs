//! Error types for Synheart Insights
//!
//! Analytics functions never fail; these errors only arise at the boundary
//! (parsing input, loading configuration, talking to providers).

use thiserror::Error;

/// Errors that can occur while preparing inputs for computation
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("Failed to parse input: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid UTC offset: {0} minutes")]
    InvalidUtcOffset(i32),

    #[error("Date parse error: {0}")]
    DateParseError(String),

    #[error("Provider error: {0}")]
    ProviderError(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] ValidationError),
}

/// Reasons a raw activity record cannot be turned into an `ActivityRecord`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Missing timestamp")]
    MissingTimestamp,

    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("Unknown habit: {0}")]
    UnknownHabit(String),

    #[error("Custom habit slot {slot} out of range (max {max})")]
    CustomSlotOutOfRange { slot: u8, max: u8 },

    #[error("Invalid duration: {0}")]
    InvalidDuration(f64),
}
