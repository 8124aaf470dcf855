//! Lifecycle of the AUT frame across a run, plus the snapshot display
//! logic driven by the reporter's show/hide/pin events.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde::Serialize;

use crate::events::{EventChannel, RunnerEvent, RunnerEventKind, SnapshotProps};
use crate::reactive::{Observable, Subscription, SubscriptionSet};
use crate::snapshot::{apply_snapshot, SnapshotCollectionState};
use crate::state::{RunState, Viewport};
use crate::surface::{DocumentState, SharedSurface};

pub const SNAPSHOT_MESSAGE: &str = "DOM Snapshot";
pub const PINNED_SNAPSHOT_MESSAGE: &str = "DOM Snapshot (pinned)";
pub const MISSING_SNAPSHOT_MESSAGE: &str =
    "The snapshot is missing. Displaying current state of the DOM.";

/// Events the model reacts to, all dispatched through [`IframeModel::handle`].
const LISTENED: [RunnerEventKind; 10] = [
    RunnerEventKind::RunStart,
    RunnerEventKind::RunEnd,
    RunnerEventKind::ViewportChanged,
    RunnerEventKind::UrlChanged,
    RunnerEventKind::PageLoading,
    RunnerEventKind::WindowLoad,
    RunnerEventKind::ShowSnapshot,
    RunnerEventKind::HideSnapshot,
    RunnerEventKind::PinSnapshot,
    RunnerEventKind::UnpinSnapshot,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    NoSpec,
    Loading,
    Stable,
    Error,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::NoSpec => "no_spec",
            RunPhase::Loading => "loading",
            RunPhase::Stable => "stable",
            RunPhase::Error => "error",
        }
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the AUT looked like before the first snapshot was shown.
struct OriginalState {
    document: Option<DocumentState>,
    url: String,
    viewport: Viewport,
}

#[derive(Default)]
struct ModelInner {
    is_running: bool,
    pinned: bool,
    original: Option<OriginalState>,
}

/// Tracks the run phase and swaps snapshots in and out of the live frame.
///
/// Every mutation ends by flushing the after-update callback held by
/// [`RunState`].
pub struct IframeModel {
    state: Arc<RunState>,
    surface: SharedSurface,
    phase: Observable<RunPhase>,
    inner: Mutex<ModelInner>,
}

impl IframeModel {
    pub fn new(state: Arc<RunState>, surface: SharedSurface) -> Arc<Self> {
        Arc::new(Self {
            state,
            surface,
            phase: Observable::new(RunPhase::NoSpec),
            inner: Mutex::new(ModelInner::default()),
        })
    }

    pub fn phase(&self) -> RunPhase {
        self.phase.get()
    }

    /// Observable phase, for callers that want to wait on transitions.
    pub fn phase_signal(&self) -> Observable<RunPhase> {
        self.phase.clone()
    }

    pub fn is_running(&self) -> bool {
        self.inner.lock().is_running
    }

    pub fn is_pinned(&self) -> bool {
        self.inner.lock().pinned
    }

    /// Subscribe to the channel events and state signals the model follows.
    pub fn listen(self: &Arc<Self>, channel: &dyn EventChannel) -> SubscriptionSet {
        let mut subscriptions: SubscriptionSet = LISTENED
            .iter()
            .map(|kind| {
                let model = Arc::downgrade(self);
                channel.on(
                    *kind,
                    Box::new(move |event| {
                        if let Some(model) = model.upgrade() {
                            model.handle(event);
                        }
                    }),
                )
            })
            .collect();
        subscriptions.push(self.watch_script_error());
        subscriptions.push(self.watch_after_update());
        // A callback installed before listening runs now
        self.after_update();
        subscriptions
    }

    fn watch_after_update(self: &Arc<Self>) -> Subscription {
        let model: Weak<Self> = Arc::downgrade(self);
        self.state.after_update_installs.observe(move |_| {
            if let Some(model) = model.upgrade() {
                model.after_update();
            }
        })
    }

    fn watch_script_error(self: &Arc<Self>) -> Subscription {
        let model: Weak<Self> = Arc::downgrade(self);
        self.state.script_error.observe(move |error| {
            let Some(error) = error else {
                return;
            };
            if let Some(model) = model.upgrade() {
                model.script_errored(error);
            }
        })
    }

    pub fn handle(&self, event: &RunnerEvent) {
        match event {
            RunnerEvent::RunStart => self.run_started(),
            RunnerEvent::RunEnd => self.run_ended(),
            RunnerEvent::ViewportChanged(viewport) => self.update_viewport(*viewport),
            RunnerEvent::UrlChanged(url) => self.update_url(url),
            RunnerEvent::PageLoading(loading) => self.page_loading(*loading),
            RunnerEvent::WindowLoad => self.frame_loaded(),
            RunnerEvent::ShowSnapshot(props) => self.show_snapshot(props),
            RunnerEvent::HideSnapshot => self.hide_snapshot(),
            RunnerEvent::PinSnapshot(props) => self.pin_snapshot(props),
            RunnerEvent::UnpinSnapshot => self.unpin_snapshot(),
            other => {
                tracing::debug!(event = %other.kind(), "Event not handled by lifecycle model");
            }
        }
    }

    fn set_phase(&self, phase: RunPhase) {
        let previous = self.phase.get();
        if self.phase.set(phase) {
            tracing::debug!(from = %previous, to = %phase, "AUT phase changed");
        }
    }

    fn after_update(&self) {
        self.state.flush_after_update();
    }

    /// A new spec was selected: forget the previous run and wait for the
    /// frame to load.
    pub fn begin_run(&self) {
        *self.inner.lock() = ModelInner::default();
        self.state.reset_snapshots();
        self.state.message.set(None);
        self.set_phase(RunPhase::Loading);
        self.after_update();
    }

    pub fn enter_no_spec(&self) {
        *self.inner.lock() = ModelInner::default();
        self.state.reset_snapshots();
        self.state.message.set(None);
        self.set_phase(RunPhase::NoSpec);
        self.after_update();
    }

    /// The spec document finished loading.
    pub fn frame_loaded(&self) {
        if self.phase.get() == RunPhase::Loading {
            self.set_phase(RunPhase::Stable);
        } else {
            tracing::debug!(phase = %self.phase.get(), "Ignoring window load outside of loading");
        }
        self.after_update();
    }

    /// A script error aborts whatever run was in flight.
    pub fn script_errored(&self, error: &str) {
        tracing::warn!(error = %error, "Script error in AUT");
        self.inner.lock().is_running = false;
        self.set_phase(RunPhase::Error);
        self.after_update();
    }

    fn run_started(&self) {
        {
            let mut inner = self.inner.lock();
            inner.is_running = true;
            inner.pinned = false;
            inner.original = None;
        }
        self.state.reset_snapshots();
        self.state.message.set(None);
        self.surface.lock().remove_highlights();
        self.after_update();
    }

    fn run_ended(&self) {
        self.inner.lock().is_running = false;
        self.after_update();
    }

    pub fn update_viewport(&self, viewport: Viewport) {
        self.state.update_dimensions(viewport);
        self.after_update();
    }

    /// Resize the viewport, then run `callback` once the change is applied.
    pub fn update_viewport_then(&self, viewport: Viewport, callback: impl FnOnce() + Send + 'static) {
        self.update_viewport(viewport);
        self.state.set_callback_after_update(callback);
    }

    pub fn update_url(&self, url: &str) {
        self.state.url.set(url.to_string());
        self.after_update();
    }

    pub fn page_loading(&self, loading: bool) {
        self.state.is_loading_url.set(loading);
        self.after_update();
    }

    /// Show a command's snapshots. Ignored while tests are running or a
    /// snapshot is pinned.
    pub fn show_snapshot(&self, props: &SnapshotProps) {
        {
            let inner = self.inner.lock();
            if inner.is_running || inner.pinned {
                tracing::debug!(
                    running = inner.is_running,
                    pinned = inner.pinned,
                    "Ignoring snapshot display"
                );
                return;
            }
        }
        self.display_snapshot(props, SNAPSHOT_MESSAGE);
        self.after_update();
    }

    pub fn hide_snapshot(&self) {
        if self.inner.lock().pinned {
            tracing::debug!("Snapshot pinned, keeping it on hide");
            return;
        }
        self.clear_snapshots();
        self.after_update();
    }

    pub fn pin_snapshot(&self, props: &SnapshotProps) {
        if self.inner.lock().is_running {
            tracing::debug!("Ignoring snapshot pin while tests run");
            return;
        }
        self.display_snapshot(props, PINNED_SNAPSHOT_MESSAGE);
        self.inner.lock().pinned = true;
        self.after_update();
    }

    pub fn unpin_snapshot(&self) {
        self.inner.lock().pinned = false;
        self.clear_snapshots();
        self.after_update();
    }

    fn display_snapshot(&self, props: &SnapshotProps, message: &str) {
        self.store_original_state();

        if let Some(viewport) = props.viewport {
            self.state.update_dimensions(viewport);
        }
        if let Some(url) = &props.url {
            self.state.url.set(url.clone());
        }

        let Some(first) = props.snapshots.first().cloned() else {
            tracing::debug!(name = %props.name, "Command has no snapshots");
            self.state.reset_snapshots();
            self.surface.lock().remove_highlights();
            self.state
                .message
                .set(Some(MISSING_SNAPSHOT_MESSAGE.to_string()));
            return;
        };

        let highlight = props.highlight_props();
        self.state.snapshot.set(SnapshotCollectionState::showing(
            props.snapshots.clone(),
            highlight.clone(),
        ));
        self.state.message.set(Some(message.to_string()));
        apply_snapshot(&mut self.surface.lock(), &first, true, &highlight);
    }

    /// Remember the live document, url and viewport the first time a
    /// snapshot replaces them.
    fn store_original_state(&self) {
        if self.inner.lock().original.is_some() {
            return;
        }
        let document = self.surface.lock().detach_dom();
        let original = OriginalState {
            document,
            url: self.state.url.get(),
            viewport: self.state.viewport.get(),
        };
        self.inner.lock().original = Some(original);
    }

    fn clear_snapshots(&self) {
        let original = self.inner.lock().original.take();
        self.state.message.set(None);
        self.state.reset_snapshots();

        {
            let mut surface = self.surface.lock();
            surface.remove_highlights();
            if let Some(document) = original.as_ref().and_then(|o| o.document.as_ref()) {
                surface.restore_document(document);
            }
        }

        if let Some(original) = original {
            self.state.url.set(original.url);
            self.state.update_dimensions(original.viewport);
        }
    }
}

impl std::fmt::Debug for IframeModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("IframeModel")
            .field("phase", &self.phase.get())
            .field("is_running", &inner.is_running)
            .field("pinned", &inner.pinned)
            .finish_non_exhaustive()
    }
}
