use super::event::ExtractionTicket;
use super::region::{ColorCycle, Region, RegionId};
use crate::audio::AssetHandle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractionStatus {
    Idle,
    Extracting,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NoRegion,
    RegionDrafting,
    RegionSelected,
}

/// In-progress drag. `anchor` is where the drag began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draft {
    pub anchor: f64,
    pub cursor: f64,
}

impl Draft {
    pub fn bounds(&self) -> (f64, f64) {
        (self.anchor.min(self.cursor), self.anchor.max(self.cursor))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Selected {
    pub region_id: RegionId,
    pub status: ExtractionStatus,
    pub asset: Option<AssetHandle>,
    pub ticket: Option<ExtractionTicket>,
    pub is_playing_extracted: bool,
}

impl Selected {
    fn new(region_id: RegionId) -> Self {
        Self {
            region_id,
            status: ExtractionStatus::Idle,
            asset: None,
            ticket: None,
            is_playing_extracted: false,
        }
    }
}

/// Derived view of the current selection; not independently authoritative.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedRegionState {
    pub region: Option<Region>,
    pub extracted_asset: Option<AssetHandle>,
    pub extraction_status: ExtractionStatus,
    pub is_playing_extracted: bool,
}

/// Strict state delta. This is the ONLY way region state mutates.
#[derive(Debug, Clone, PartialEq)]
pub enum StateDelta {
    SourceAttached(Option<f64>),
    DraftSet(Option<Draft>),
    ColorConsumed,
    RegionInserted(Region),
    RegionBoundsChanged {
        id: RegionId,
        start_seconds: f64,
        end_seconds: f64,
    },
    RegionDeleted(RegionId),
    RegionsCleared,
    SelectionChanged(Option<RegionId>),
    ExtractionRequested(ExtractionTicket),
    ExtractionIdle,
    ExtractionSucceeded(AssetHandle),
    ExtractionFailed(String),
    PlaybackChanged(bool),
}

#[derive(Debug, Clone, Default)]
pub struct RegionState {
    regions: Vec<Region>,
    draft: Option<Draft>,
    selected: Option<Selected>,
    colors: ColorCycle,
    source_duration: Option<f64>,
    last_generation: u64,
    /// Monotonic version, bumped on every reduction.
    pub version: u64,
}

impl RegionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pure reduction: State + Delta -> Mutated State
    pub fn reduce(&mut self, delta: StateDelta) {
        self.version += 1;

        match delta {
            StateDelta::SourceAttached(duration) => {
                self.source_duration = duration;
            }
            StateDelta::DraftSet(draft) => {
                self.draft = draft;
            }
            StateDelta::ColorConsumed => {
                self.colors.advance();
            }
            StateDelta::RegionInserted(region) => {
                self.regions.push(region);
            }
            StateDelta::RegionBoundsChanged {
                id,
                start_seconds,
                end_seconds,
            } => {
                if let Some(region) = self.regions.iter_mut().find(|r| r.id == id) {
                    region.start_seconds = start_seconds;
                    region.end_seconds = end_seconds;
                }
            }
            StateDelta::RegionDeleted(id) => {
                self.regions.retain(|r| r.id != id);
                if self.selected.as_ref().map(|s| &s.region_id) == Some(&id) {
                    self.selected = None;
                }
            }
            StateDelta::RegionsCleared => {
                self.regions.clear();
                self.selected = None;
                self.draft = None;
                self.colors.reset();
            }
            StateDelta::SelectionChanged(id) => {
                self.selected = id.map(Selected::new);
            }
            StateDelta::ExtractionRequested(ticket) => {
                self.last_generation = self.last_generation.max(ticket.generation);
                if let Some(sel) = self.selected.as_mut() {
                    sel.status = ExtractionStatus::Extracting;
                    sel.asset = None;
                    sel.ticket = Some(ticket);
                    sel.is_playing_extracted = false;
                }
            }
            StateDelta::ExtractionIdle => {
                if let Some(sel) = self.selected.as_mut() {
                    sel.status = ExtractionStatus::Idle;
                    sel.asset = None;
                    sel.ticket = None;
                    sel.is_playing_extracted = false;
                }
            }
            StateDelta::ExtractionSucceeded(handle) => {
                if let Some(sel) = self.selected.as_mut() {
                    sel.status = ExtractionStatus::Ready;
                    sel.asset = Some(handle);
                    sel.ticket = None;
                }
            }
            StateDelta::ExtractionFailed(reason) => {
                if let Some(sel) = self.selected.as_mut() {
                    sel.status = ExtractionStatus::Failed(reason);
                    sel.asset = None;
                    sel.ticket = None;
                    sel.is_playing_extracted = false;
                }
            }
            StateDelta::PlaybackChanged(playing) => {
                if let Some(sel) = self.selected.as_mut() {
                    sel.is_playing_extracted = playing;
                }
            }
        }
    }

    // Read-only accessors

    pub fn phase(&self) -> Phase {
        if self.draft.is_some() {
            Phase::RegionDrafting
        } else if self.selected.is_some() {
            Phase::RegionSelected
        } else {
            Phase::NoRegion
        }
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn region(&self, id: &RegionId) -> Option<&Region> {
        self.regions.iter().find(|r| &r.id == id)
    }

    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    pub fn selected(&self) -> Option<&Selected> {
        self.selected.as_ref()
    }

    pub fn selected_region(&self) -> Option<&Region> {
        self.selected.as_ref().and_then(|s| self.region(&s.region_id))
    }

    pub fn colors(&self) -> &ColorCycle {
        &self.colors
    }

    pub fn source_duration(&self) -> Option<f64> {
        self.source_duration
    }

    pub fn last_generation(&self) -> u64 {
        self.last_generation
    }

    pub fn snapshot(&self) -> SelectedRegionState {
        match &self.selected {
            Some(sel) => SelectedRegionState {
                region: self.region(&sel.region_id).cloned(),
                extracted_asset: sel.asset,
                extraction_status: sel.status.clone(),
                is_playing_extracted: sel.is_playing_extracted,
            },
            None => SelectedRegionState {
                region: None,
                extracted_asset: None,
                extraction_status: ExtractionStatus::Idle,
                is_playing_extracted: false,
            },
        }
    }
}
