//! Integration tests for snapshot display and scrubbing
//!
//! Snapshots arrive through `show:snapshot` and are scrubbed through
//! [`SnapshotControls`](aut_runner::SnapshotControls).

use super::common::{snapshots, Harness};
use aut_runner::events::SnapshotProps;
use aut_runner::runner::{PINNED_SNAPSHOT_MESSAGE, SNAPSHOT_MESSAGE};
use aut_runner::snapshot::Point;
use aut_runner::surface::{Layer, LayerKind, SurfaceCall};
use aut_runner::{RunnerEvent, Viewport};
use proptest::prelude::*;

fn props(count: usize) -> SnapshotProps {
    SnapshotProps {
        name: "type".to_string(),
        url: Some("http://localhost:3000/form".to_string()),
        viewport: Some(Viewport::new(800, 600)),
        snapshots: snapshots(count),
        coords: Some(Point { x: 4.0, y: 2.0 }),
    }
}

/// Harness with a loaded frame and `count` snapshots on display
fn showing(count: usize) -> Harness {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");
    h.bus.emit(RunnerEvent::WindowLoad);
    h.bus.emit(RunnerEvent::ShowSnapshot(props(count)));
    h
}

/// Showing a command's snapshots restores the first one
#[test]
fn test_show_restores_first_snapshot() {
    let h = showing(3);
    let state = h.state().snapshot.get();

    assert_eq!(state.len(), 3);
    assert_eq!(state.state_index, 0);
    assert!(state.showing_highlights);
    assert_eq!(h.live_body().as_deref(), Some("<p>state 0</p>"));
    assert_eq!(h.state().message.get().as_deref(), Some(SNAPSHOT_MESSAGE));
    assert_eq!(h.state().viewport.get(), Viewport::new(800, 600));
    // Snapshot 0 has no element, so nothing is highlighted
    assert!(!h.dom.has_layer(LayerKind::Highlight));
}

/// Selecting restores the DOM, then highlights the element
#[test]
fn test_select_restores_then_highlights() {
    let h = showing(3);
    let controls = h.runner.snapshot_controls();

    assert!(controls.select(1));
    assert_eq!(h.live_body().as_deref(), Some("<p>state 1</p>"));
    match h.dom.layer(LayerKind::Highlight) {
        Some(Layer::Highlight(highlight)) => {
            assert_eq!(highlight.selector.as_deref(), Some("#el-1"));
            assert_eq!(highlight.coords, Some(Point { x: 4.0, y: 2.0 }));
        }
        other => panic!("expected highlight layer, got {other:?}"),
    }

    assert!(controls.select(2));
    assert!(!h.dom.has_layer(LayerKind::Highlight));
}

/// Turning highlights off applies immediately and survives scrubbing
#[test]
fn test_toggle_highlights() {
    let h = showing(4);
    let controls = h.runner.snapshot_controls();
    controls.select(1);
    assert!(h.dom.has_layer(LayerKind::Highlight));

    assert!(!controls.toggle_highlights());
    assert!(!h.dom.has_layer(LayerKind::Highlight));

    controls.select(3);
    assert!(!h.dom.has_layer(LayerKind::Highlight));
    assert_eq!(h.live_body().as_deref(), Some("<p>state 3</p>"));

    assert!(controls.toggle_highlights());
    assert!(h.dom.has_layer(LayerKind::Highlight));
}

/// With highlights off, showing and then selecting replaces the document
/// exactly twice and never draws an overlay
#[test]
fn test_show_then_select_replaces_document_twice() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");
    h.dom.clear_journal();

    h.bus.emit(RunnerEvent::ShowSnapshot(props(3)));
    let controls = h.runner.snapshot_controls();
    assert!(!controls.toggle_highlights());
    assert!(controls.select(1));

    let journal = h.dom.journal();
    let bodies: Vec<&str> = journal
        .iter()
        .filter_map(|call| match call {
            SurfaceCall::ReplaceDocument { body, .. } => Some(body.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(bodies, ["<p>state 0</p>", "<p>state 1</p>"]);
    assert!(!journal
        .iter()
        .any(|call| *call == SurfaceCall::ShowLayer(LayerKind::Highlight)));
    assert!(!h.dom.has_layer(LayerKind::Highlight));
}

/// Restoring a snapshot never navigates the frame
#[test]
fn test_scrubbing_keeps_navigation() {
    let h = showing(5);
    let before = h.navigation();
    let frame = h.dom.live_frames()[0];
    let navigations = h.dom.frame(frame).map(|f| f.navigations);

    let controls = h.runner.snapshot_controls();
    for index in [4, 0, 2] {
        controls.select(index);
    }
    assert_eq!(h.navigation(), before);
    assert_eq!(h.dom.frame(frame).map(|f| f.navigations), navigations);
}

/// Hiding puts back the document and url the AUT had before
#[test]
fn test_hide_restores_original_document() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");
    h.bus
        .emit(RunnerEvent::UrlChanged("http://localhost:3000/".to_string()));
    let original = h.live_body();

    h.bus.emit(RunnerEvent::ShowSnapshot(props(2)));
    h.runner.snapshot_controls().select(1);
    h.bus.emit(RunnerEvent::HideSnapshot);

    assert_eq!(h.live_body(), original);
    assert_eq!(h.state().url.get(), "http://localhost:3000/");
    assert!(h.state().snapshot.get().is_empty());
    assert!(!h.dom.has_layer(LayerKind::Highlight));
}

/// A pinned snapshot ignores hover events until unpinned
#[test]
fn test_pin_and_unpin() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");

    h.bus.emit(RunnerEvent::PinSnapshot(props(2)));
    assert_eq!(
        h.state().message.get().as_deref(),
        Some(PINNED_SNAPSHOT_MESSAGE)
    );
    h.bus.emit(RunnerEvent::HideSnapshot);
    assert_eq!(h.state().snapshot.get().len(), 2);

    h.bus.emit(RunnerEvent::UnpinSnapshot);
    assert!(h.state().snapshot.get().is_empty());
    assert_eq!(h.state().message.get(), None);
}

/// Selection after the frame is gone changes state but touches no frame
#[test]
fn test_select_without_frame_is_harmless() {
    let h = showing(3);
    h.runner.surface().lock().destroy();
    h.dom.clear_journal();

    assert!(h.runner.snapshot_controls().select(2));
    assert_eq!(h.state().snapshot.get().state_index, 2);
    assert!(h
        .dom
        .journal()
        .iter()
        .all(|call| !matches!(call, SurfaceCall::ReplaceDocument { .. })));
}

proptest! {
    /// Any selection keeps the index inside the collection, and in-range
    /// selections show exactly that snapshot
    #[test]
    fn prop_select_keeps_index_valid(count in 1usize..12, picks in prop::collection::vec(0usize..20, 1..30)) {
        let h = showing(count);
        let controls = h.runner.snapshot_controls();

        for pick in picks {
            let before = controls.current_index();
            let applied = controls.select(pick);
            let index = controls.current_index();

            prop_assert!(index < count);
            if pick < count {
                prop_assert!(applied);
                prop_assert_eq!(index, pick);
                let expected = format!("<p>state {pick}</p>");
                prop_assert_eq!(h.live_body(), Some(expected));
            } else {
                prop_assert!(!applied);
                prop_assert_eq!(index, before);
            }
        }
    }

    /// Stepping clamps to the ends of the collection
    #[test]
    fn prop_step_clamps(count in 1usize..12, deltas in prop::collection::vec(-15isize..15, 1..30)) {
        let h = showing(count);
        let controls = h.runner.snapshot_controls();

        let mut expected: isize = 0;
        for delta in deltas {
            controls.step(delta);
            expected = (expected + delta).clamp(0, count as isize - 1);
            prop_assert_eq!(controls.current_index(), expected as usize);
        }
    }

    /// The highlight layer is drawn exactly when highlights are on and the
    /// current snapshot has an element
    #[test]
    fn prop_highlight_matches_state(count in 1usize..8, ops in prop::collection::vec((any::<bool>(), 0usize..8), 1..20)) {
        let h = showing(count);
        let controls = h.runner.snapshot_controls();

        for (toggle, pick) in ops {
            if toggle {
                controls.toggle_highlights();
            } else {
                controls.select(pick);
            }
            let state = h.state().snapshot.get();
            let has_element = state.current().map(|s| s.has_element()).unwrap_or(false);
            prop_assert_eq!(
                h.dom.has_layer(LayerKind::Highlight),
                state.showing_highlights && has_element
            );
        }
    }
}
