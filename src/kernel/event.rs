use super::region::RegionId;
use crate::audio::AssetHandle;
use crate::error::ExtractionError;

/// Identifies one extraction request. Only the ticket currently held by the
/// selection may write the extracted-asset slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExtractionTicket {
    pub region_id: RegionId,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
    Play,
    Pause,
    Finish,
}

/// Every trigger into the region kernel. Waveform-library callbacks
/// (created, updated, clicked, removed) may fire more than once for the same
/// logical gesture; the kernel treats repeats as no-ops.
#[derive(Debug, Clone)]
pub enum RegionEvent {
    SourceLoaded { duration_seconds: f64 },
    SourceUnloaded,

    DraftStarted { at_seconds: f64 },
    DraftMoved { to_seconds: f64 },
    DraftFinished { id: RegionId },
    DraftCancelled,

    Created {
        id: RegionId,
        start_seconds: f64,
        end_seconds: f64,
    },
    Updated {
        id: RegionId,
        start_seconds: f64,
        end_seconds: f64,
    },
    Clicked { id: RegionId },
    Removed { id: RegionId },
    Cleared,

    ExtractionFinished {
        ticket: ExtractionTicket,
        outcome: Result<AssetHandle, ExtractionError>,
    },
    Playback {
        handle: AssetHandle,
        event: PlaybackEvent,
    },
}
