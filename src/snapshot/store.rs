//! Snapshot collection state and the scrubbing operations over it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::snapshot::record::{Point, SnapshotRecord};
use crate::state::RunState;
use crate::surface::{AutSurface, SharedSurface};

/// Extra context for drawing a highlight (the command's hit-box position).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HighlightProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coords: Option<Point>,
}

/// The snapshots of the command currently being inspected.
///
/// `state_index` is always a valid index while `snapshots` is non-empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotCollectionState {
    pub snapshots: Vec<SnapshotRecord>,
    pub state_index: usize,
    pub showing_highlights: bool,
    #[serde(default)]
    pub highlight: HighlightProps,
}

impl Default for SnapshotCollectionState {
    fn default() -> Self {
        Self {
            snapshots: Vec::new(),
            state_index: 0,
            showing_highlights: true,
            highlight: HighlightProps::default(),
        }
    }
}

impl SnapshotCollectionState {
    /// Fresh collection positioned on the first snapshot with highlights on.
    pub fn showing(snapshots: Vec<SnapshotRecord>, highlight: HighlightProps) -> Self {
        Self {
            snapshots,
            highlight,
            ..Self::default()
        }
    }

    pub fn current(&self) -> Option<&SnapshotRecord> {
        self.snapshots.get(self.state_index)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Restore `snapshot` into the live frame, then draw or clear its highlight.
///
/// The restore always happens first so the overlay is positioned against
/// the restored document.
pub fn apply_snapshot(
    surface: &mut AutSurface,
    snapshot: &SnapshotRecord,
    showing_highlights: bool,
    props: &HighlightProps,
) {
    surface.restore_dom(snapshot);
    if showing_highlights && snapshot.has_element() {
        surface.highlight_el(snapshot, props);
    } else {
        surface.remove_highlights();
    }
}

/// Scrubbing controls over the shared snapshot collection.
#[derive(Clone)]
pub struct SnapshotControls {
    state: Arc<RunState>,
    surface: SharedSurface,
}

impl SnapshotControls {
    pub fn new(state: Arc<RunState>, surface: SharedSurface) -> Self {
        Self { state, surface }
    }

    pub fn current_index(&self) -> usize {
        self.state.snapshot.with(|s| s.state_index)
    }

    pub fn len(&self) -> usize {
        self.state.snapshot.with(|s| s.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Show snapshot `index`. Out-of-range indices are ignored.
    pub fn select(&self, index: usize) -> bool {
        let current = self.state.snapshot.get();
        let Some(snapshot) = current.snapshots.get(index).cloned() else {
            tracing::debug!(
                index,
                len = current.len(),
                "Ignoring snapshot selection out of range"
            );
            return false;
        };

        let showing = current.showing_highlights;
        let props = current.highlight.clone();
        self.state.snapshot.set(SnapshotCollectionState {
            state_index: index,
            ..current
        });

        apply_snapshot(&mut self.surface.lock(), &snapshot, showing, &props);
        self.state.flush_after_update();
        true
    }

    /// Move by `delta` snapshots, clamped to the collection bounds.
    pub fn step(&self, delta: isize) -> bool {
        let (index, len) = self.state.snapshot.with(|s| (s.state_index, s.len()));
        if len == 0 {
            return false;
        }
        let last = (len - 1) as isize;
        let target = (index as isize).saturating_add(delta).clamp(0, last);
        self.select(target as usize)
    }

    /// Flip highlight visibility and apply it to the current snapshot
    /// immediately. Returns the new visibility.
    pub fn toggle_highlights(&self) -> bool {
        let mut next = self.state.snapshot.get();
        next.showing_highlights = !next.showing_highlights;
        let showing = next.showing_highlights;
        let snapshot = next.current().cloned();
        let props = next.highlight.clone();
        self.state.snapshot.set(next);

        {
            let mut surface = self.surface.lock();
            match snapshot {
                Some(snapshot) if showing && snapshot.has_element() => {
                    surface.highlight_el(&snapshot, &props);
                }
                _ => surface.remove_highlights(),
            }
        }
        self.state.flush_after_update();
        showing
    }
}
