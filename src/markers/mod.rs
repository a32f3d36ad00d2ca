//! Click markers and the groups that own them.

pub mod parse;

use serde::{Deserialize, Serialize};

pub use parse::{format_selection_file, parse_selection_file};

/// One click detection. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub id: String,
    pub begin_time: f64,
    pub end_time: f64,
    pub source_group_id: String,
    pub audio_id: Option<String>,
    /// File name the click was recorded against, extension included.
    #[serde(default)]
    pub source_file: Option<String>,
}

/// Ordered markers from a single source (ground truth or one algorithm).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionGroup {
    pub id: String,
    pub name: String,
    pub color: String,
    pub selections: Vec<Selection>,
    pub visible: bool,
}

impl SelectionGroup {
    pub fn new(id: impl Into<String>, name: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            color: color.into(),
            selections: Vec::new(),
            visible: true,
        }
    }

    pub fn with_selections(mut self, mut selections: Vec<Selection>) -> Self {
        selections.sort_by(|a, b| a.begin_time.total_cmp(&b.begin_time));
        self.selections = selections;
        self
    }

    pub fn len(&self) -> usize {
        self.selections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selections.is_empty()
    }
}

/// A marker from a visible group that falls inside a queried window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleMarker<'a> {
    pub group: &'a SelectionGroup,
    pub selection: &'a Selection,
}

/// Every marker group shown over the waveforms. Visibility is a flag on the
/// group; hiding never removes data.
#[derive(Debug, Clone, Default)]
pub struct MarkerBoard {
    groups: Vec<SelectionGroup>,
}

impl MarkerBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `group`, replacing an existing group with the same id in place.
    pub fn upsert_group(&mut self, group: SelectionGroup) {
        match self.groups.iter_mut().find(|g| g.id == group.id) {
            Some(existing) => *existing = group,
            None => self.groups.push(group),
        }
    }

    pub fn group(&self, id: &str) -> Option<&SelectionGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn groups(&self) -> &[SelectionGroup] {
        &self.groups
    }

    pub fn remove_group(&mut self, id: &str) -> Option<SelectionGroup> {
        let pos = self.groups.iter().position(|g| g.id == id)?;
        Some(self.groups.remove(pos))
    }

    pub fn set_visible(&mut self, id: &str, visible: bool) -> bool {
        match self.groups.iter_mut().find(|g| g.id == id) {
            Some(group) => {
                group.visible = visible;
                true
            }
            None => false,
        }
    }

    /// Returns the new visibility, or `None` for an unknown group.
    pub fn toggle(&mut self, id: &str) -> Option<bool> {
        let group = self.groups.iter_mut().find(|g| g.id == id)?;
        group.visible = !group.visible;
        Some(group.visible)
    }

    /// Streams pipeline output into a group, keeping it time-ordered.
    /// Returns `false` if the group does not exist.
    pub fn append(&mut self, group_id: &str, selections: &[Selection]) -> bool {
        let Some(group) = self.groups.iter_mut().find(|g| g.id == group_id) else {
            return false;
        };
        for selection in selections {
            let at = group
                .selections
                .partition_point(|s| s.begin_time <= selection.begin_time);
            group.selections.insert(at, selection.clone());
        }
        true
    }

    /// Markers of visible groups with `begin_time` in `[start, end]`.
    pub fn visible_in(&self, start: f64, end: f64) -> Vec<VisibleMarker<'_>> {
        self.groups
            .iter()
            .filter(|g| g.visible)
            .flat_map(|group| {
                group
                    .selections
                    .iter()
                    .filter(move |s| s.begin_time >= start && s.begin_time <= end)
                    .map(move |selection| VisibleMarker { group, selection })
            })
            .collect()
    }
}
