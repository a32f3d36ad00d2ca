use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::ValidationError;

/// Shortest region the kernel will hold, in seconds.
pub const MIN_REGION_SECONDS: f64 = 0.065;

/// Region fill colors, cycled round-robin per kernel instance.
pub const REGION_PALETTE: [&str; 8] = [
    "rgba(255, 99, 132, 0.30)",
    "rgba(54, 162, 235, 0.30)",
    "rgba(255, 206, 86, 0.30)",
    "rgba(75, 192, 192, 0.30)",
    "rgba(153, 102, 255, 0.30)",
    "rgba(255, 159, 64, 0.30)",
    "rgba(46, 204, 113, 0.30)",
    "rgba(231, 76, 60, 0.30)",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(format!("region-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ColorToken(pub usize);

impl ColorToken {
    pub fn css(&self) -> &'static str {
        REGION_PALETTE[self.0 % REGION_PALETTE.len()]
    }
}

/// Round-robin color counter. Independent of region identity; wraps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColorCycle {
    next: usize,
}

impl ColorCycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn peek(&self) -> ColorToken {
        ColorToken(self.next)
    }

    pub fn advance(&mut self) {
        self.next = (self.next + 1) % REGION_PALETTE.len();
    }

    pub fn reset(&mut self) {
        self.next = 0;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub color: ColorToken,
}

impl Region {
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    pub fn midpoint(&self) -> f64 {
        (self.start_seconds + self.end_seconds) / 2.0
    }

    pub fn contains(&self, t: f64) -> bool {
        t >= self.start_seconds && t < self.end_seconds
    }

    pub fn same_bounds(&self, start: f64, end: f64) -> bool {
        (self.start_seconds - start).abs() < 1e-9 && (self.end_seconds - end).abs() < 1e-9
    }
}

/// Widens a too-short interval to `min` around its midpoint, never starting
/// before 0. Intervals already long enough are returned unchanged.
pub fn enforce_min_duration(start: f64, end: f64, min: f64) -> (f64, f64) {
    if end - start >= min {
        return (start, end);
    }
    let center = (start + end) / 2.0;
    let new_start = (center - min / 2.0).max(0.0);
    (new_start, new_start + min)
}

/// Raw event bounds -> kernel bounds.
///
/// `start > end` is rejected; a zero-width click (`start == end`) is widened
/// by the minimum-duration policy. A range ending at or before 0 is out of
/// bounds, and one straddling 0 is clamped to start there. When the source
/// duration is known, a start at or past the end of audio is rejected and
/// an end past it is clamped to the duration. The widened interval never
/// leaves `[0, duration]`.
pub fn normalize_bounds(
    raw_start: f64,
    raw_end: f64,
    min: f64,
    source_duration: Option<f64>,
) -> Result<(f64, f64), ValidationError> {
    if !raw_start.is_finite() || !raw_end.is_finite() {
        return Err(ValidationError::NonFinite {
            start: raw_start,
            end: raw_end,
        });
    }
    if raw_start > raw_end {
        return Err(ValidationError::EmptyRange {
            start: raw_start,
            end: raw_end,
        });
    }
    let out_of_bounds = |duration: f64| ValidationError::OutOfBounds {
        start: raw_start,
        end: raw_end,
        duration,
    };
    if raw_end < 0.0 || (raw_end == 0.0 && raw_start < 0.0) {
        return Err(out_of_bounds(source_duration.unwrap_or(f64::INFINITY)));
    }

    let start = raw_start.max(0.0);
    let mut end = raw_end;
    if let Some(duration) = source_duration {
        if start >= duration {
            return Err(out_of_bounds(duration));
        }
        end = end.min(duration);
    }

    let (start, end) = enforce_min_duration(start, end, min);
    match source_duration {
        Some(duration) if end > duration => Ok(((duration - min).max(0.0), duration)),
        _ => Ok((start, end)),
    }
}
