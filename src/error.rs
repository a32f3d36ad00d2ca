use std::time::Duration;

use thiserror::Error;

use crate::kernel::region::RegionId;

/// Rejected before any extraction or network work begins.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("non-finite time range: start={start}, end={end}")]
    NonFinite { start: f64, end: f64 },

    #[error("empty time range: start={start} >= end={end}")]
    EmptyRange { start: f64, end: f64 },

    #[error("range [{start}, {end}) lies outside audio of {duration}s")]
    OutOfBounds { start: f64, end: f64, duration: f64 },

    #[error("unknown region: {0}")]
    UnknownRegion(RegionId),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Contained to the affected region: surfaces as `ExtractionStatus::Failed`.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("invalid sample range [{start_sample}, {end_sample})")]
    InvalidRange {
        start_sample: usize,
        end_sample: usize,
    },

    #[error("decode failed: {0}")]
    Decode(String),

    #[error("extraction task failed: {0}")]
    Task(String),
}

/// Halts the pipeline run it occurred in. Never retried.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InferenceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("chunk extraction failed: {0}")]
    Extraction(#[from] ExtractionError),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SessionError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),
}
