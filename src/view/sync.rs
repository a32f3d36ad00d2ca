//! Keeps the cropped view in step with the current selection.
//!
//! The cropped view renders the extracted asset once it is ready. Until
//! then (and when extraction failed) it zooms into the original recording
//! at the region's bounds. A change of rendered asset always tears the view
//! down and builds a new one; only zoom/scroll within the same asset is
//! applied in place.

use crate::audio::AssetHandle;
use crate::kernel::region::Region;
use crate::kernel::state::{ExtractionStatus, SelectedRegionState};
use crate::markers::MarkerBoard;

use super::timeline::{timeline_labels, TimelineLabel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CroppedSource {
    Extracted { handle: AssetHandle },
    Original,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProjectedMarker {
    pub x: f64,
    pub group_id: String,
    pub selection_id: String,
    pub color: String,
}

/// One built instance of the cropped view.
#[derive(Debug, Clone, PartialEq)]
pub struct CroppedView {
    /// Bumped on every rebuild.
    pub generation: u64,
    pub source: CroppedSource,
    pub region: Region,
    pub width_px: f64,
    pub px_per_second: f64,
    /// Left edge, in the rendered asset's own time.
    pub scroll_seconds: f64,
    /// Added to asset time to get recording time for labels.
    pub label_offset_seconds: f64,
    pub visible_duration: f64,
}

impl CroppedView {
    fn layout(generation: u64, source: CroppedSource, region: &Region, width_px: f64) -> Self {
        let duration = region.duration().max(f64::EPSILON);
        let (scroll_seconds, label_offset_seconds) = match source {
            // The slice starts at asset time 0; labels show true elapsed time.
            CroppedSource::Extracted { .. } => (0.0, region.start_seconds),
            CroppedSource::Original => (region.start_seconds, 0.0),
        };
        Self {
            generation,
            source,
            region: region.clone(),
            width_px,
            px_per_second: width_px / duration,
            scroll_seconds,
            label_offset_seconds,
            visible_duration: duration,
        }
    }

    /// Zoom factor relative to one pixel per second.
    pub fn zoom(&self) -> f64 {
        self.px_per_second
    }

    /// `[start, end)` of the rendered asset that is on screen.
    pub fn asset_range(&self) -> (f64, f64) {
        (self.scroll_seconds, self.scroll_seconds + self.visible_duration)
    }

    pub fn labels(&self) -> Vec<TimelineLabel> {
        timeline_labels(
            self.scroll_seconds,
            self.visible_duration,
            self.label_offset_seconds,
        )
    }

    /// Pixel x for a recording time, if it is on screen.
    pub fn x_for_time(&self, recording_seconds: f64) -> Option<f64> {
        let local = recording_seconds - self.region.start_seconds;
        if !(local >= 0.0 && local <= self.visible_duration) {
            return None;
        }
        Some(local * self.px_per_second)
    }

    /// Visible markers mapped onto this view.
    pub fn project(&self, board: &MarkerBoard) -> Vec<ProjectedMarker> {
        board
            .visible_in(self.region.start_seconds, self.region.end_seconds)
            .into_iter()
            .filter_map(|m| {
                Some(ProjectedMarker {
                    x: self.x_for_time(m.selection.begin_time)?,
                    group_id: m.group.id.clone(),
                    selection_id: m.selection.id.clone(),
                    color: m.group.color.clone(),
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewUpdate {
    Unchanged,
    /// A fresh instance was created (any previous one was torn down).
    Built { generation: u64 },
    /// Same instance, new zoom/scroll.
    Repositioned,
    TornDown,
}

#[derive(Debug)]
pub struct DualViewController {
    width_px: f64,
    current: Option<CroppedView>,
    next_generation: u64,
}

impl DualViewController {
    pub fn new(width_px: f64) -> Self {
        Self {
            width_px,
            current: None,
            next_generation: 0,
        }
    }

    pub fn current(&self) -> Option<&CroppedView> {
        self.current.as_ref()
    }

    pub fn width_px(&self) -> f64 {
        self.width_px
    }

    /// Which asset the cropped view should render for `selection`.
    pub fn preferred_source(selection: &SelectedRegionState) -> CroppedSource {
        match (&selection.extraction_status, selection.extracted_asset) {
            (ExtractionStatus::Ready, Some(handle)) => CroppedSource::Extracted { handle },
            _ => CroppedSource::Original,
        }
    }

    pub fn sync(&mut self, selection: &SelectedRegionState) -> ViewUpdate {
        let Some(region) = &selection.region else {
            return match self.current.take() {
                Some(_) => ViewUpdate::TornDown,
                None => ViewUpdate::Unchanged,
            };
        };
        let source = Self::preferred_source(selection);

        if let Some(view) = self.current.as_mut() {
            if view.source == source {
                if view.region == *region {
                    return ViewUpdate::Unchanged;
                }
                *view = CroppedView::layout(view.generation, source, region, self.width_px);
                return ViewUpdate::Repositioned;
            }
        }

        self.next_generation += 1;
        let generation = self.next_generation;
        self.current = Some(CroppedView::layout(generation, source, region, self.width_px));
        ViewUpdate::Built { generation }
    }

    /// Viewport width changed; relayout in place.
    pub fn resize(&mut self, width_px: f64) -> ViewUpdate {
        self.width_px = width_px;
        match self.current.as_mut() {
            Some(view) => {
                *view = CroppedView::layout(view.generation, view.source, &view.region, width_px);
                ViewUpdate::Repositioned
            }
            None => ViewUpdate::Unchanged,
        }
    }
}
