use std::collections::VecDeque;

use super::event::{AssetEventKind, TelemetryEvent};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TelemetrySnapshot {
    pub extraction_stats: ExtractionStats,
    pub asset_stats: AssetStats,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractionStats {
    pub requested: u64,
    pub completed: u64,
    pub failed: u64,
    pub discarded: u64,
    pub total_elapsed_ms: u64,
    pub avg_elapsed_ms: f64,
    pub max_elapsed_ms: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetStats {
    pub registered: u64,
    pub released: u64,
    pub release_rejected: u64,
}

impl AssetStats {
    /// Registered assets not yet released. Non-zero after teardown is a leak.
    pub fn outstanding(&self) -> u64 {
        self.registered.saturating_sub(self.released)
    }
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::ExtractionRequested { .. } => {
                snap.extraction_stats.requested += 1;
            }
            TelemetryEvent::ExtractionCompleted { elapsed_ms, .. } => {
                let stats = &mut snap.extraction_stats;
                stats.completed += 1;
                stats.total_elapsed_ms += elapsed_ms;
                stats.max_elapsed_ms = stats.max_elapsed_ms.max(*elapsed_ms);
            }
            TelemetryEvent::ExtractionFailed { .. } => {
                snap.extraction_stats.failed += 1;
            }
            TelemetryEvent::ExtractionDiscarded { .. } => {
                snap.extraction_stats.discarded += 1;
            }
            TelemetryEvent::Asset { kind, .. } => match kind {
                AssetEventKind::Registered => snap.asset_stats.registered += 1,
                AssetEventKind::Released => snap.asset_stats.released += 1,
                AssetEventKind::ReleaseRejected => snap.asset_stats.release_rejected += 1,
            },
        }
    }

    // Finalize averages
    if snap.extraction_stats.completed > 0 {
        snap.extraction_stats.avg_elapsed_ms =
            snap.extraction_stats.total_elapsed_ms as f64 / snap.extraction_stats.completed as f64;
    }

    snap
}
