//! Extraction and asset telemetry.
//!
//! # SAFETY INVARIANT
//! Telemetry is a READ-ONLY side-effect layer.
//! It must **NEVER** be read inside decision logic (reactor or scheduler).
//!
//! # PRIVACY INVARIANT
//! Events carry ids, generations, counts and durations only. Never samples.

pub mod event;
pub mod metrics;
pub mod recorder;

pub use event::{AssetEventKind, TelemetryEvent};
pub use metrics::{compute_snapshot, TelemetrySnapshot};
pub use recorder::TelemetryRecorder;
