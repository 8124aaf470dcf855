//! Integration tests for the run lifecycle
//!
//! Covers spec selection, the readiness gate, restarts, teardown and the
//! events the runner reacts to while a spec is running.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::common::Harness;
use aut_runner::events::{
    ChannelCall, ScreenshotConfig, SelectorMethod, SelectorQuery, VisitFailure,
};
use aut_runner::surface::{LayerKind, SurfaceCall};
use aut_runner::{RunPhase, RunnerEvent, SpecDescriptor};

fn visit_failure() -> VisitFailure {
    VisitFailure {
        url: "http://localhost:3000/missing".to_string(),
        status: Some(404),
        status_text: Some("Not Found".to_string()),
        content_type: Some("text/html".to_string()),
        message: None,
    }
}

/// Selecting a spec before readiness sets up the run without touching the
/// surface
#[test]
fn test_run_waits_for_readiness() {
    let h = Harness::mounted();
    h.select("src/App.spec.js");

    assert_eq!(h.runner.model().phase(), RunPhase::Loading);
    assert!(h.dom.live_frames().is_empty());
    assert!(h.bus.calls().iter().any(|call| matches!(
        call,
        ChannelCall::Setup { spec: Some(spec) } if spec.absolute == "src/App.spec.js"
    )));
    assert_eq!(h.initialize_count(), 0);

    h.state().set_ready_to_run_tests(true);
    assert_eq!(h.dom.live_frames().len(), 1);
    assert_eq!(h.dom.container(), h.dom.live_frames());
    assert_eq!(
        h.navigation().as_deref(),
        Some("/__cypress/iframes/src/App.spec.js")
    );
    assert_eq!(h.initialize_count(), 1);
}

/// Outbound calls happen in order: start, setup, initialize
#[test]
fn test_channel_call_order() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");

    let calls = h.bus.calls();
    assert!(matches!(calls[0], ChannelCall::Start { .. }));
    assert!(matches!(calls[1], ChannelCall::Setup { .. }));
    match &calls[2] {
        ChannelCall::Initialize { surface, spec } => {
            assert_eq!(spec.as_ref().map(|s| s.absolute.as_str()), Some("a.spec.js"));
            assert!(h.runner.surface().lock().is_live(surface));
        }
        other => panic!("expected initialize, got {other:?}"),
    }
}

/// The frame shows blank contents after navigation, before the spec paints
#[test]
fn test_new_frame_navigates_then_blanks() {
    let h = Harness::mounted();
    h.dom.clear_journal();
    h.run_ready("a.spec.js");

    let journal = h.dom.journal();
    let navigate = journal
        .iter()
        .position(|call| matches!(call, SurfaceCall::Navigate { .. }))
        .expect("frame should navigate");
    let blank = journal
        .iter()
        .position(|call| matches!(call, SurfaceCall::ReplaceDocument { body, .. } if body.is_empty()))
        .expect("frame should be blanked");
    assert!(navigate < blank);
}

/// Selecting a new spec while the previous one still waits for readiness
/// only ever initializes the new one
#[test]
fn test_superseded_run_never_initializes() {
    let h = Harness::mounted();
    h.select("first.spec.js");
    h.select("second.spec.js");
    h.state().set_ready_to_run_tests(true);

    assert_eq!(h.initialize_count(), 1);
    assert_eq!(h.dom.live_frames().len(), 1);
    assert_eq!(
        h.navigation().as_deref(),
        Some("/__cypress/iframes/second.spec.js")
    );
}

/// Restarting replaces the frame and the previous run's handlers
#[test]
fn test_restart_replaces_frame_and_handlers() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");
    let first_frame = h.dom.live_frames()[0];
    let first_run = h.runner.current_run();
    let handlers = h.bus.handler_count();

    h.bus.emit(RunnerEvent::Restart);

    let frames = h.dom.live_frames();
    assert_eq!(frames.len(), 1);
    assert_ne!(frames[0], first_frame);
    assert_ne!(h.runner.current_run(), first_run);
    assert_eq!(h.bus.handler_count(), handlers);
    assert_eq!(h.initialize_count(), 2);
}

/// Rapid restarts never leave more than one frame
#[test]
fn test_repeated_restarts_keep_one_frame() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");
    for _ in 0..5 {
        h.runner.restart();
        assert_eq!(h.dom.live_frames().len(), 1);
        assert_eq!(h.dom.container().len(), 1);
    }
}

/// Restart without a spec is ignored
#[test]
fn test_restart_without_spec_is_noop() {
    let h = Harness::mounted();
    h.bus.clear_calls();
    h.bus.emit(RunnerEvent::Restart);

    assert!(h.bus.calls().is_empty());
    assert_eq!(h.runner.model().phase(), RunPhase::NoSpec);
}

/// Restart re-runs a spec started directly, even with nothing selected
#[test]
fn test_restart_after_direct_run() {
    let h = Harness::mounted();
    h.state().set_ready_to_run_tests(true);
    h.runner.run(SpecDescriptor::new("direct.spec.js"));
    assert_eq!(h.initialize_count(), 1);
    assert_eq!(h.state().spec.get(), None);

    h.bus.emit(RunnerEvent::Restart);
    assert_eq!(h.initialize_count(), 2);
    assert_eq!(h.dom.live_frames().len(), 1);
    assert_eq!(
        h.navigation().as_deref(),
        Some("/__cypress/iframes/direct.spec.js")
    );
}

/// An after-update callback runs as soon as it is installed
#[test]
fn test_after_update_callback_runs_on_install() {
    let h = Harness::mounted();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    h.state().set_callback_after_update(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(hits.load(Ordering::SeqCst), 1);

    h.run_ready("a.spec.js");
    h.bus.emit(RunnerEvent::WindowLoad);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

/// The devtools handshake fires once per run
#[test]
fn test_devtools_registered_once_per_run() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");

    h.bus.emit(RunnerEvent::WindowBeforeLoad);
    h.bus.emit(RunnerEvent::WindowBeforeLoad);
    assert_eq!(h.state().devtools_registrations(), 1);

    h.runner.restart();
    h.bus.emit(RunnerEvent::WindowBeforeLoad);
    assert_eq!(h.state().devtools_registrations(), 2);
}

/// A script error moves the model to Error; restarting recovers
#[test]
fn test_script_error_then_restart() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");
    h.bus.emit(RunnerEvent::WindowLoad);
    assert_eq!(h.runner.model().phase(), RunPhase::Stable);

    h.bus
        .emit(RunnerEvent::ScriptError(Some("ReferenceError: x".to_string())));
    assert_eq!(h.runner.model().phase(), RunPhase::Error);
    assert!(h.state().script_error.get().is_some());

    h.bus.emit(RunnerEvent::Restart);
    assert_eq!(h.runner.model().phase(), RunPhase::Loading);
    assert_eq!(h.state().script_error.get(), None);
}

/// A visit failure stays up until the next load
#[test]
fn test_visit_failure_until_next_load() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");

    h.bus.emit(RunnerEvent::VisitFailed(visit_failure()));
    assert!(h.dom.has_layer(LayerKind::VisitFailure));

    h.dom.clear_journal();
    h.runner.surface().lock().show_blank_contents();
    assert!(h.dom.journal().is_empty());

    h.runner.restart();
    assert!(!h.dom.has_layer(LayerKind::VisitFailure));
    assert_eq!(h.live_body().as_deref(), Some(""));
}

/// Deselecting the spec tears the frame down and shows the placeholder
#[test]
fn test_clearing_spec_shows_placeholder() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");
    assert_eq!(h.dom.live_frames().len(), 1);

    h.state().set_spec(None);
    assert!(h.dom.live_frames().is_empty());
    assert!(h.dom.has_layer(LayerKind::NoSpec));
    assert_eq!(h.runner.model().phase(), RunPhase::NoSpec);

    h.select("b.spec.js");
    assert!(!h.dom.has_layer(LayerKind::NoSpec));
    assert_eq!(h.runner.model().phase(), RunPhase::Loading);
}

/// A spec selected before mounting runs as soon as the runner mounts
#[test]
fn test_mount_runs_selected_spec() {
    let h = Harness::new();
    h.state().set_ready_to_run_tests(true);
    h.state()
        .set_spec(Some(SpecDescriptor::new("/abs/c.spec.js").with_relative("c.spec.js")));
    assert!(h.dom.live_frames().is_empty());

    h.runner.mount();
    assert_eq!(
        h.navigation().as_deref(),
        Some("/__cypress/iframes//abs/c.spec.js")
    );
}

/// The running spec is only reported when unmounting
#[test]
fn test_running_spec_notified_only_at_unmount() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");
    h.runner.restart();
    assert!(!h
        .bus
        .calls()
        .iter()
        .any(|call| matches!(call, ChannelCall::NotifyRunningSpec { .. })));

    h.runner.unmount();
    let calls = h.bus.calls();
    let tail = &calls[calls.len() - 2..];
    assert_eq!(
        tail,
        &[ChannelCall::NotifyRunningSpec { spec: None }, ChannelCall::Stop]
    );
}

/// Unmount releases every handler and observer
#[test]
fn test_unmount_releases_everything() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");
    assert!(h.bus.handler_count() > 0);
    assert!(h.state().spec.observer_count() > 0);

    h.runner.unmount();
    assert_eq!(h.bus.handler_count(), 0);
    assert_eq!(h.state().spec.observer_count(), 0);
    assert_eq!(h.state().ready_to_run_tests.observer_count(), 0);
    assert_eq!(h.runner.run_subscription_count(), 0);
    assert!(h.dom.live_frames().is_empty());

    // Events after unmount reach nobody
    assert_eq!(h.bus.emit(RunnerEvent::Restart), 0);
    h.state().set_spec(Some(SpecDescriptor::new("late.spec.js")));
    assert!(h.dom.live_frames().is_empty());
}

/// Screenshots hide overlays and render unscaled
#[test]
fn test_screenshot_round_trip() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");
    h.runner.selector_playground().set_enabled(true);
    h.state()
        .update_container_size(aut_runner::Viewport::new(500, 330));
    assert_eq!(h.state().effective_scale(), 0.5);

    let config = ScreenshotConfig {
        blackout: vec![".ad".to_string()],
        ..ScreenshotConfig::default()
    };
    h.bus.emit(RunnerEvent::BeforeScreenshot(config.clone()));
    assert!(h.state().screenshotting.get());
    assert_eq!(h.state().effective_scale(), 1.0);
    assert!(!h.dom.has_layer(LayerKind::SelectorPlayground));
    assert!(h.dom.has_layer(LayerKind::Blackout));

    h.bus.emit(RunnerEvent::AfterScreenshot(config));
    assert!(!h.state().screenshotting.get());
    assert!(h.dom.has_layer(LayerKind::SelectorPlayground));
    assert!(!h.dom.has_layer(LayerKind::Blackout));
}

/// Selector printing reaches the frame console, and is harmless without one
#[test]
fn test_print_selector_elements() {
    let h = Harness::mounted();
    let query = SelectorQuery {
        selector: "button".to_string(),
        method: SelectorMethod::Get,
    };
    h.bus
        .emit(RunnerEvent::PrintSelectorElementsToConsole(query.clone()));

    h.run_ready("a.spec.js");
    h.bus.emit(RunnerEvent::PrintSelectorElementsToConsole(query));
    let frame = h.dom.live_frames()[0];
    let console = h.dom.frame(frame).map(|f| f.console).unwrap_or_default();
    assert_eq!(console.len(), 1);
}

/// Tests can wait on the phase asynchronously
#[tokio::test]
async fn test_wait_for_stable_phase() {
    let h = Harness::mounted();
    h.run_ready("a.spec.js");

    let bus = h.bus.clone();
    let loader = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(5)).await;
        bus.emit(RunnerEvent::WindowLoad);
    });

    let phase = h
        .runner
        .model()
        .phase_signal()
        .wait_for(|phase| *phase == RunPhase::Stable)
        .await;
    assert_eq!(phase, RunPhase::Stable);
    loader.await.unwrap();
}
