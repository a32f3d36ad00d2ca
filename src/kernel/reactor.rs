use tracing::debug;

use super::event::{ExtractionTicket, PlaybackEvent, RegionEvent};
use super::region::{normalize_bounds, Region, RegionId, MIN_REGION_SECONDS};
use super::scheduler::{Scheduler, SideEffect};
use super::state::{Draft, RegionState, StateDelta};
use crate::audio::AssetHandle;
use crate::config::Config;
use crate::error::{ExtractionError, ValidationError};

/// The region/selection kernel: events in, side effects out.
///
/// **KERNEL LAW**: `step` never awaits and never touches I/O. All state
/// mutation goes through `StateDelta`; all outside work is returned as
/// `SideEffect` for the driver to execute.
pub struct RegionReactor {
    pub state: RegionState,
    pub scheduler: Scheduler,
    min_region_seconds: f64,
}

impl Default for RegionReactor {
    fn default() -> Self {
        Self::new(MIN_REGION_SECONDS)
    }
}

impl RegionReactor {
    pub fn new(min_region_seconds: f64) -> Self {
        Self {
            state: RegionState::new(),
            scheduler: Scheduler,
            min_region_seconds,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.min_region_seconds)
    }

    pub fn min_region_seconds(&self) -> f64 {
        self.min_region_seconds
    }

    pub fn step(&mut self, event: RegionEvent) -> Result<Vec<SideEffect>, ValidationError> {
        debug!(?event, version = self.state.version, "region event");
        match event {
            RegionEvent::SourceLoaded { duration_seconds } => self.on_source_loaded(duration_seconds),
            RegionEvent::SourceUnloaded => Ok(self.on_source_unloaded()),
            RegionEvent::DraftStarted { at_seconds } => self.on_draft_started(at_seconds),
            RegionEvent::DraftMoved { to_seconds } => self.on_draft_moved(to_seconds),
            RegionEvent::DraftFinished { id } => self.on_draft_finished(id),
            RegionEvent::DraftCancelled => {
                if self.state.draft().is_some() {
                    self.state.reduce(StateDelta::DraftSet(None));
                }
                Ok(Vec::new())
            }
            RegionEvent::Created {
                id,
                start_seconds,
                end_seconds,
            } => self.on_created(id, start_seconds, end_seconds),
            RegionEvent::Updated {
                id,
                start_seconds,
                end_seconds,
            } => self.on_updated(id, start_seconds, end_seconds),
            RegionEvent::Clicked { id } => self.on_clicked(id),
            RegionEvent::Removed { id } => Ok(self.on_removed(id)),
            RegionEvent::Cleared => Ok(self.on_cleared()),
            RegionEvent::ExtractionFinished { ticket, outcome } => {
                Ok(self.on_extraction_finished(ticket, outcome))
            }
            RegionEvent::Playback { handle, event } => Ok(self.on_playback(handle, event)),
        }
    }

    /// Creates a region with a fresh id. Convenience over `RegionEvent::Created`.
    pub fn create(
        &mut self,
        raw_start: f64,
        raw_end: f64,
    ) -> Result<(RegionId, Vec<SideEffect>), ValidationError> {
        let id = RegionId::generate();
        let effects = self.on_created(id.clone(), raw_start, raw_end)?;
        Ok((id, effects))
    }

    fn apply(&mut self, deltas: Vec<StateDelta>) {
        for delta in deltas {
            self.state.reduce(delta);
        }
    }

    fn selected_id(&self) -> Option<&RegionId> {
        self.state.selected().map(|s| &s.region_id)
    }

    fn on_source_loaded(&mut self, duration: f64) -> Result<Vec<SideEffect>, ValidationError> {
        if !duration.is_finite() {
            return Err(ValidationError::NonFinite {
                start: 0.0,
                end: duration,
            });
        }
        if duration <= 0.0 {
            return Err(ValidationError::EmptyRange {
                start: 0.0,
                end: duration,
            });
        }
        self.state.reduce(StateDelta::SourceAttached(Some(duration)));
        match self.state.selected_region().cloned() {
            Some(region) => {
                let (deltas, effects) = self.scheduler.schedule(&self.state, &region);
                self.apply(deltas);
                Ok(effects)
            }
            None => Ok(Vec::new()),
        }
    }

    fn on_source_unloaded(&mut self) -> Vec<SideEffect> {
        let effects = self.scheduler.retire(&self.state);
        self.state.reduce(StateDelta::SourceAttached(None));
        if self.state.selected().is_some() {
            self.state.reduce(StateDelta::ExtractionIdle);
        }
        effects
    }

    fn on_draft_started(&mut self, at: f64) -> Result<Vec<SideEffect>, ValidationError> {
        if !at.is_finite() {
            return Err(ValidationError::NonFinite { start: at, end: at });
        }
        self.state.reduce(StateDelta::DraftSet(Some(Draft {
            anchor: at,
            cursor: at,
        })));
        Ok(Vec::new())
    }

    fn on_draft_moved(&mut self, to: f64) -> Result<Vec<SideEffect>, ValidationError> {
        let Some(draft) = self.state.draft().copied() else {
            return Ok(Vec::new());
        };
        if !to.is_finite() {
            return Err(ValidationError::NonFinite {
                start: draft.anchor,
                end: to,
            });
        }
        self.state.reduce(StateDelta::DraftSet(Some(Draft {
            anchor: draft.anchor,
            cursor: to,
        })));
        Ok(Vec::new())
    }

    fn on_draft_finished(&mut self, id: RegionId) -> Result<Vec<SideEffect>, ValidationError> {
        // Repeat of an already-committed drag.
        let Some(draft) = self.state.draft().copied() else {
            return Ok(Vec::new());
        };
        let (start, end) = draft.bounds();
        self.state.reduce(StateDelta::DraftSet(None));
        self.on_created(id, start, end)
    }

    fn on_created(
        &mut self,
        id: RegionId,
        raw_start: f64,
        raw_end: f64,
    ) -> Result<Vec<SideEffect>, ValidationError> {
        if self.state.region(&id).is_some() {
            // Duplicate create callback: no second color, no second extraction.
            return Ok(Vec::new());
        }
        let (start, end) = normalize_bounds(
            raw_start,
            raw_end,
            self.min_region_seconds,
            self.state.source_duration(),
        )?;

        let region = Region {
            id: id.clone(),
            start_seconds: start,
            end_seconds: end,
            color: self.state.colors().peek(),
        };
        let mut deltas = vec![StateDelta::ColorConsumed, StateDelta::RegionInserted(region)];
        if self.state.draft().is_some() {
            deltas.push(StateDelta::DraftSet(None));
        }
        self.apply(deltas);

        Ok(self.select_region(&id))
    }

    fn on_updated(
        &mut self,
        id: RegionId,
        raw_start: f64,
        raw_end: f64,
    ) -> Result<Vec<SideEffect>, ValidationError> {
        let Some(existing) = self.state.region(&id) else {
            return Err(ValidationError::UnknownRegion(id));
        };
        let (start, end) = normalize_bounds(
            raw_start,
            raw_end,
            self.min_region_seconds,
            self.state.source_duration(),
        )?;
        if existing.same_bounds(start, end) {
            return Ok(Vec::new());
        }

        self.state.reduce(StateDelta::RegionBoundsChanged {
            id: id.clone(),
            start_seconds: start,
            end_seconds: end,
        });

        if self.selected_id() != Some(&id) {
            return Ok(Vec::new());
        }
        // Resizing invalidates the extracted asset of the selected region.
        match self.state.region(&id).cloned() {
            Some(region) => {
                let (deltas, effects) = self.scheduler.schedule(&self.state, &region);
                self.apply(deltas);
                Ok(effects)
            }
            None => Ok(Vec::new()),
        }
    }

    fn on_clicked(&mut self, id: RegionId) -> Result<Vec<SideEffect>, ValidationError> {
        if self.state.region(&id).is_none() {
            return Err(ValidationError::UnknownRegion(id));
        }
        if self.selected_id() == Some(&id) {
            return Ok(Vec::new());
        }
        Ok(self.select_region(&id))
    }

    fn select_region(&mut self, id: &RegionId) -> Vec<SideEffect> {
        let mut effects = self.scheduler.retire(&self.state);
        self.state
            .reduce(StateDelta::SelectionChanged(Some(id.clone())));

        if let Some(region) = self.state.region(id).cloned() {
            let (deltas, more) = self.scheduler.schedule(&self.state, &region);
            self.apply(deltas);
            effects.extend(more);
        }
        effects
    }

    fn on_removed(&mut self, id: RegionId) -> Vec<SideEffect> {
        if self.state.region(&id).is_none() {
            return Vec::new();
        }
        let mut effects = Vec::new();
        if self.selected_id() == Some(&id) {
            effects = self.scheduler.retire(&self.state);
        }
        self.state.reduce(StateDelta::RegionDeleted(id.clone()));
        effects.push(SideEffect::Log(format!("removed {id}")));
        effects
    }

    fn on_cleared(&mut self) -> Vec<SideEffect> {
        let effects = self.scheduler.retire(&self.state);
        self.state.reduce(StateDelta::RegionsCleared);
        effects
    }

    fn on_extraction_finished(
        &mut self,
        ticket: ExtractionTicket,
        outcome: Result<AssetHandle, ExtractionError>,
    ) -> Vec<SideEffect> {
        let current = self.state.selected().and_then(|s| s.ticket.as_ref());
        if current == Some(&ticket) {
            match outcome {
                Ok(handle) => self.state.reduce(StateDelta::ExtractionSucceeded(handle)),
                Err(e) => self.state.reduce(StateDelta::ExtractionFailed(e.to_string())),
            }
            return Vec::new();
        }

        // STALE REJECTION: a superseded result never touches the slot, but
        // whatever it allocated still has to be released.
        let mut effects = Vec::new();
        if let Ok(handle) = outcome {
            effects.push(SideEffect::ReleaseAsset(handle));
        }
        effects.push(SideEffect::Log(format!(
            "discarded stale extraction {} for {}",
            ticket.generation, ticket.region_id
        )));
        effects
    }

    fn on_playback(&mut self, handle: AssetHandle, event: PlaybackEvent) -> Vec<SideEffect> {
        let is_current = self.state.selected().and_then(|s| s.asset) == Some(handle);
        if is_current {
            self.state
                .reduce(StateDelta::PlaybackChanged(event == PlaybackEvent::Play));
        }
        Vec::new()
    }
}
