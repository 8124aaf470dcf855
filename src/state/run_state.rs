use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::reactive::Observable;
use crate::snapshot::SnapshotCollectionState;
use crate::state::SpecDescriptor;

/// Callback run once after the next state change the lifecycle model makes.
pub type AfterUpdate = Box<dyn FnOnce() + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1000,
            height: 660,
        }
    }
}

/// Process-wide state for the current run.
///
/// Every field is an [`Observable`], so components watch exactly the
/// fields they depend on and writes are whole-field reassignments.
pub struct RunState {
    /// Selected spec; assigning a new spec starts a run
    pub spec: Observable<Option<SpecDescriptor>>,
    /// Error raised inside the AUT frame, shown by the error widget
    pub script_error: Observable<Option<String>>,
    /// Readiness gate: tests start only after this becomes true
    pub ready_to_run_tests: Observable<bool>,
    pub screenshotting: Observable<bool>,
    pub viewport: Observable<Viewport>,
    pub scale: Observable<f64>,
    /// URL shown in the AUT address bar
    pub url: Observable<String>,
    pub is_loading_url: Observable<bool>,
    /// Banner above the AUT (e.g. "DOM Snapshot")
    pub message: Observable<Option<String>>,
    pub snapshot: Observable<SnapshotCollectionState>,
    /// Bumped every time an after-update callback is installed
    pub after_update_installs: Observable<u64>,
    container: Mutex<Option<Viewport>>,
    after_update: Mutex<Option<AfterUpdate>>,
    devtools_registrations: AtomicU64,
}

impl RunState {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            spec: Observable::new(None),
            script_error: Observable::new(None),
            ready_to_run_tests: Observable::new(false),
            screenshotting: Observable::new(false),
            viewport: Observable::new(viewport),
            scale: Observable::new(1.0),
            url: Observable::new(String::new()),
            is_loading_url: Observable::new(false),
            message: Observable::new(None),
            snapshot: Observable::new(SnapshotCollectionState::default()),
            after_update_installs: Observable::new(0),
            container: Mutex::new(None),
            after_update: Mutex::new(None),
            devtools_registrations: AtomicU64::new(0),
        }
    }

    pub fn set_spec(&self, spec: Option<SpecDescriptor>) {
        self.spec.set(spec);
    }

    pub fn set_script_error(&self, error: Option<String>) {
        self.script_error.set(error);
    }

    pub fn set_ready_to_run_tests(&self, ready: bool) {
        self.ready_to_run_tests.set(ready);
    }

    /// Devtools handshake target, called when the AUT window is about to load.
    pub fn register_devtools(&self) -> u64 {
        let count = self.devtools_registrations.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::debug!(count, "Registered devtools for AUT window");
        count
    }

    pub fn devtools_registrations(&self) -> u64 {
        self.devtools_registrations.load(Ordering::SeqCst)
    }

    pub fn reset_snapshots(&self) {
        self.snapshot.set(SnapshotCollectionState::default());
    }

    /// Set the AUT viewport and rescale to the current container.
    pub fn update_dimensions(&self, viewport: Viewport) {
        self.viewport.set(viewport);
        self.rescale();
    }

    /// Record the space available to the AUT and rescale to fit it.
    pub fn update_container_size(&self, available: Viewport) {
        *self.container.lock() = Some(available);
        self.rescale();
    }

    fn rescale(&self) {
        let Some(container) = *self.container.lock() else {
            return;
        };
        let viewport = self.viewport.get();
        if viewport.width == 0 || viewport.height == 0 {
            return;
        }
        let by_width = f64::from(container.width) / f64::from(viewport.width);
        let by_height = f64::from(container.height) / f64::from(viewport.height);
        self.scale.set(by_width.min(by_height).min(1.0));
    }

    /// Scale to render at; screenshots are always taken unscaled.
    pub fn effective_scale(&self) -> f64 {
        if self.screenshotting.get() {
            1.0
        } else {
            self.scale.get()
        }
    }

    /// Install the callback to run after the next model update, replacing
    /// any callback still pending. A listening lifecycle model runs it as
    /// soon as it is installed.
    pub fn set_callback_after_update(&self, callback: impl FnOnce() + Send + 'static) {
        *self.after_update.lock() = Some(Box::new(callback));
        self.after_update_installs.update(|installs| *installs += 1);
    }

    pub fn has_pending_after_update(&self) -> bool {
        self.after_update.lock().is_some()
    }

    /// Run the pending after-update callback, if any.
    pub fn flush_after_update(&self) -> bool {
        let callback = self.after_update.lock().take();
        match callback {
            Some(callback) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl std::fmt::Debug for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunState")
            .field("spec", &self.spec)
            .field("script_error", &self.script_error)
            .field("ready_to_run_tests", &self.ready_to_run_tests)
            .field("viewport", &self.viewport)
            .field("scale", &self.scale)
            .finish_non_exhaustive()
    }
}
