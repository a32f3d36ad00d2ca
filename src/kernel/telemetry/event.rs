use serde::{Deserialize, Serialize};

use crate::audio::AssetHandle;
use crate::kernel::region::RegionId;

// Allowed: ids, generations, durations, counts
// Forbidden: audio samples, prediction payloads

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    ExtractionRequested {
        region_id: RegionId,
        generation: u64,
    },

    ExtractionCompleted {
        region_id: RegionId,
        generation: u64,
        elapsed_ms: u64,
    },

    ExtractionFailed {
        region_id: RegionId,
        generation: u64,
    },

    /// A result that arrived after its ticket was superseded.
    ExtractionDiscarded {
        region_id: RegionId,
        generation: u64,
    },

    Asset {
        handle: AssetHandle,
        kind: AssetEventKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetEventKind {
    Registered,
    Released,
    /// Double release or unknown handle.
    ReleaseRejected,
}
