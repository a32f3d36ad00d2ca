//! Play/pause for the cropped view.

use crate::audio::AssetHandle;
use crate::kernel::event::PlaybackEvent;
use crate::kernel::state::{ExtractionStatus, SelectedRegionState};

/// What "play region" drives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerTarget {
    /// The extracted slice, start to end.
    Extracted(AssetHandle),
    /// The original recording, limited to the region's range.
    OriginalRange { start_seconds: f64, end_seconds: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportState {
    pub target: Option<PlayerTarget>,
    pub enabled: bool,
    pub playing: bool,
}

/// Playing state always comes from player events. For the extracted
/// player those land in the kernel (`is_playing_extracted`); for the
/// original-range fallback they are tracked here.
#[derive(Debug, Default)]
pub struct RegionTransport {
    original_playing: bool,
}

impl RegionTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn target(selection: &SelectedRegionState) -> Option<PlayerTarget> {
        let region = selection.region.as_ref()?;
        match (&selection.extraction_status, selection.extracted_asset) {
            (ExtractionStatus::Failed(_), _) => None,
            (ExtractionStatus::Ready, Some(handle)) => Some(PlayerTarget::Extracted(handle)),
            _ => Some(PlayerTarget::OriginalRange {
                start_seconds: region.start_seconds,
                end_seconds: region.end_seconds,
            }),
        }
    }

    /// Event from the original-recording player.
    pub fn on_original_event(&mut self, event: PlaybackEvent) {
        self.original_playing = event == PlaybackEvent::Play;
    }

    pub fn state(&self, selection: &SelectedRegionState) -> TransportState {
        let target = Self::target(selection);
        let playing = match target {
            Some(PlayerTarget::Extracted(_)) => selection.is_playing_extracted,
            Some(PlayerTarget::OriginalRange { .. }) => self.original_playing,
            None => false,
        };
        TransportState {
            target,
            enabled: target.is_some(),
            playing,
        }
    }
}
