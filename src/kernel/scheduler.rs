use super::event::ExtractionTicket;
use super::region::Region;
use super::state::{RegionState, StateDelta};
use crate::audio::AssetHandle;

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionRequest {
    pub ticket: ExtractionTicket,
    pub start_seconds: f64,
    pub end_seconds: f64,
}

/// Work the kernel asks its driver to perform. The kernel itself never
/// awaits I/O.
#[derive(Debug, Clone, PartialEq)]
pub enum SideEffect {
    StartExtraction(ExtractionRequest),
    /// The ticket was superseded; its result will be discarded on arrival.
    CancelExtraction(ExtractionTicket),
    ReleaseAsset(AssetHandle),
    Log(String),
}

pub struct Scheduler;

impl Scheduler {
    /// Everything the current selection holds that must not outlive it:
    /// the in-flight ticket and the extracted asset.
    pub fn retire(&self, state: &RegionState) -> Vec<SideEffect> {
        let mut effects = Vec::new();
        if let Some(sel) = state.selected() {
            if let Some(ticket) = &sel.ticket {
                effects.push(SideEffect::CancelExtraction(ticket.clone()));
            }
            if let Some(handle) = sel.asset {
                effects.push(SideEffect::ReleaseAsset(handle));
            }
        }
        effects
    }

    /// Pure projection: selected region + state -> (deltas, effects) that
    /// (re)start extraction, superseding whatever is in flight.
    pub fn schedule(&self, state: &RegionState, region: &Region) -> (Vec<StateDelta>, Vec<SideEffect>) {
        let mut effects = self.retire(state);

        let Some(duration) = state.source_duration() else {
            effects.push(SideEffect::Log(format!(
                "no audio loaded; extraction for {} deferred",
                region.id
            )));
            return (vec![StateDelta::ExtractionIdle], effects);
        };

        if region.start_seconds >= duration {
            let reason = format!(
                "region starts at {:.3}s, past the end of audio ({:.3}s)",
                region.start_seconds, duration
            );
            return (vec![StateDelta::ExtractionFailed(reason)], effects);
        }

        let ticket = ExtractionTicket {
            region_id: region.id.clone(),
            generation: state.last_generation() + 1,
        };
        effects.push(SideEffect::StartExtraction(ExtractionRequest {
            ticket: ticket.clone(),
            start_seconds: region.start_seconds,
            end_seconds: region.end_seconds,
        }));
        (vec![StateDelta::ExtractionRequested(ticket)], effects)
    }
}
