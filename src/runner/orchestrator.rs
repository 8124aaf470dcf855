//! Sequences a run: channel setup, the readiness gate, frame creation and
//! handing the fresh surface to the channel.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use uuid::Uuid;

use crate::config::RuntimeConfig;
use crate::events::{EventChannel, RunnerEvent, RunnerEventKind};
use crate::reactive::{Subscription, SubscriptionSet};
use crate::runner::bridge::connect_signals;
use crate::runner::iframe_model::IframeModel;
use crate::runner::spec_url;
use crate::snapshot::SnapshotControls;
use crate::state::{RunState, SelectorPlaygroundModel, SpecDescriptor};
use crate::surface::SharedSurface;

type InnerHandler = fn(&Arc<RunnerInner>, &RunnerEvent);

/// Owns the AUT for as long as it is mounted.
///
/// Selecting a spec in [`RunState`] starts a run; a `restart` event or
/// [`AutRunner::restart`] repeats it. Every run tears down the previous
/// frame and everything the previous run registered.
pub struct AutRunner {
    inner: Arc<RunnerInner>,
}

struct RunnerInner {
    config: Mutex<RuntimeConfig>,
    state: Arc<RunState>,
    selector_playground: SelectorPlaygroundModel,
    surface: SharedSurface,
    model: Arc<IframeModel>,
    channel: Arc<dyn EventChannel>,
    /// Subscriptions held between mount and unmount
    mounted: Mutex<Option<SubscriptionSet>>,
    /// Subscriptions owned by the current run; released when the next run
    /// starts
    run_scope: Mutex<SubscriptionSet>,
    current_run: Mutex<Option<Uuid>>,
}

impl AutRunner {
    pub fn new(
        config: RuntimeConfig,
        state: Arc<RunState>,
        selector_playground: SelectorPlaygroundModel,
        surface: SharedSurface,
        channel: Arc<dyn EventChannel>,
    ) -> Self {
        let model = IframeModel::new(state.clone(), surface.clone());
        Self {
            inner: Arc::new(RunnerInner {
                config: Mutex::new(config),
                state,
                selector_playground,
                surface,
                model,
                channel,
                mounted: Mutex::new(None),
                run_scope: Mutex::new(SubscriptionSet::new()),
                current_run: Mutex::new(None),
            }),
        }
    }

    pub fn state(&self) -> &Arc<RunState> {
        &self.inner.state
    }

    pub fn surface(&self) -> &SharedSurface {
        &self.inner.surface
    }

    pub fn model(&self) -> &Arc<IframeModel> {
        &self.inner.model
    }

    pub fn selector_playground(&self) -> &SelectorPlaygroundModel {
        &self.inner.selector_playground
    }

    /// Config as last handed to the channel (spec attached once a run starts).
    pub fn config(&self) -> RuntimeConfig {
        self.inner.config.lock().clone()
    }

    pub fn snapshot_controls(&self) -> SnapshotControls {
        SnapshotControls::new(self.inner.state.clone(), self.inner.surface.clone())
    }

    pub fn is_mounted(&self) -> bool {
        self.inner.mounted.lock().is_some()
    }

    /// Id of the run currently owning the surface.
    pub fn current_run(&self) -> Option<Uuid> {
        *self.inner.current_run.lock()
    }

    /// Subscriptions the current run still holds.
    pub fn run_subscription_count(&self) -> usize {
        self.inner.run_scope.lock().len()
    }

    /// Register event handlers, start the channel and begin following the
    /// selected spec. A spec that is already selected runs immediately.
    pub fn mount(&self) {
        self.inner.mount();
    }

    /// Notify the channel that nothing is running, stop it, release every
    /// subscription and destroy the frame.
    pub fn unmount(&self) {
        self.inner.unmount();
    }

    /// Start a run of `spec`, replacing any run in progress.
    pub fn run(&self, spec: SpecDescriptor) {
        self.inner.run(spec);
    }

    /// Re-run the spec of the current run with the same config.
    pub fn restart(&self) {
        self.inner.restart();
    }
}

impl Drop for AutRunner {
    fn drop(&mut self) {
        self.inner.unmount();
    }
}

impl std::fmt::Debug for AutRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutRunner")
            .field("mounted", &self.is_mounted())
            .field("current_run", &self.current_run())
            .field("model", &self.inner.model)
            .finish_non_exhaustive()
    }
}

impl RunnerInner {
    fn on(self: &Arc<Self>, kind: RunnerEventKind, handler: InnerHandler) -> Subscription {
        let inner: Weak<Self> = Arc::downgrade(self);
        self.channel.on(
            kind,
            Box::new(move |event| {
                if let Some(inner) = inner.upgrade() {
                    handler(&inner, event);
                }
            }),
        )
    }

    fn mount(self: &Arc<Self>) {
        if self.mounted.lock().is_some() {
            tracing::warn!("AUT runner already mounted");
            return;
        }

        let mut subscriptions = SubscriptionSet::new();
        subscriptions.push(self.on(RunnerEventKind::VisitFailed, |inner, event| {
            if let RunnerEvent::VisitFailed(failure) = event {
                tracing::info!(failure = %failure.summary(), "Visit failed");
                inner.surface.lock().show_visit_failure(failure);
            }
        }));
        subscriptions.push(self.on(RunnerEventKind::BeforeScreenshot, |inner, event| {
            if let RunnerEvent::BeforeScreenshot(config) = event {
                inner.state.screenshotting.set(true);
                inner.surface.lock().before_screenshot(config);
            }
        }));
        subscriptions.push(self.on(RunnerEventKind::AfterScreenshot, |inner, event| {
            if let RunnerEvent::AfterScreenshot(config) = event {
                inner.surface.lock().after_screenshot(config);
                inner.state.screenshotting.set(false);
            }
        }));
        subscriptions.push(self.on(RunnerEventKind::ScriptError, |inner, event| {
            if let RunnerEvent::ScriptError(error) = event {
                inner.state.set_script_error(error.clone());
            }
        }));
        subscriptions.push(self.on(RunnerEventKind::Restart, |inner, _| inner.restart()));
        subscriptions.push(self.on(
            RunnerEventKind::PrintSelectorElementsToConsole,
            |inner, event| {
                if let RunnerEvent::PrintSelectorElementsToConsole(query) = event {
                    inner.surface.lock().print_selector_elements_to_console(query);
                }
            },
        ));

        let config = self.config.lock().clone();
        self.channel.start(&config);
        tracing::info!(namespace = %config.namespace, "Mounted AUT runner");

        subscriptions.extend(self.model.listen(self.channel.as_ref()));

        let inner = Arc::downgrade(self);
        subscriptions.extend(connect_signals(
            &self.selector_playground,
            &self.state,
            &self.surface,
            move |spec| {
                if let Some(inner) = inner.upgrade() {
                    inner.spec_changed(spec);
                }
            },
        ));

        *self.mounted.lock() = Some(subscriptions);
    }

    fn spec_changed(self: &Arc<Self>, spec: Option<&SpecDescriptor>) {
        match spec {
            Some(spec) => self.run(spec.clone()),
            None => self.show_no_spec(),
        }
    }

    fn show_no_spec(&self) {
        let mut previous = std::mem::take(&mut *self.run_scope.lock());
        previous.dispose_all();
        *self.current_run.lock() = None;
        self.config.lock().spec = None;

        self.model.enter_no_spec();
        let mut surface = self.surface.lock();
        surface.destroy();
        surface.show_no_spec();
        tracing::info!("No spec selected");
    }

    fn run(self: &Arc<Self>, spec: SpecDescriptor) {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", %run_id, spec = %spec);
        let _guard = span.enter();

        // Everything the previous run registered goes before this run
        // registers anything.
        let mut previous = std::mem::take(&mut *self.run_scope.lock());
        let released = previous.dispose_all();
        *self.current_run.lock() = Some(run_id);

        let config = {
            let mut config = self.config.lock();
            *config = config.with_spec(spec.clone());
            config.clone()
        };

        self.state.set_script_error(None);
        self.model.begin_run();
        self.channel.setup(&config);
        tracing::info!(released, "Run set up, waiting for readiness");

        let inner = Arc::downgrade(self);
        let gate = self.state.ready_to_run_tests.when(
            |ready| *ready,
            move || {
                if let Some(inner) = inner.upgrade() {
                    inner.start_run(run_id, &spec, &config);
                }
            },
        );
        if gate.is_active() {
            self.run_scope.lock().push(gate);
        }
    }

    /// Readiness reached: build a fresh frame for the spec and hand it to
    /// the channel.
    fn start_run(&self, run_id: Uuid, spec: &SpecDescriptor, config: &RuntimeConfig) {
        let span = tracing::info_span!("run", %run_id, spec = %spec);
        let _guard = span.enter();

        if *self.current_run.lock() != Some(run_id) {
            tracing::debug!("Readiness reached for a superseded run, ignoring");
            return;
        }

        let state = Arc::downgrade(&self.state);
        let devtools = self.channel.once(
            RunnerEventKind::WindowBeforeLoad,
            Box::new(move |_| {
                if let Some(state) = state.upgrade() {
                    state.register_devtools();
                }
            }),
        );
        self.run_scope.lock().push(devtools);

        let url = spec_url(&config.namespace, Some(spec), &config.iframe_prefix);
        let handle = {
            let mut surface = self.surface.lock();
            let handle = surface.create();
            surface.attach(&handle);
            surface.load(&url);
            surface.show_blank_contents();
            handle
        };

        tracing::info!(frame = %handle.frame(), url = %url, "Initializing AUT frame");
        self.channel.initialize(handle, config);
    }

    fn restart(self: &Arc<Self>) {
        let spec = self.config.lock().spec.clone();
        match spec {
            Some(spec) => {
                tracing::info!(spec = %spec, "Restarting run");
                self.run(spec);
            }
            None => tracing::debug!("Restart requested without a spec, ignoring"),
        }
    }

    fn unmount(&self) {
        let Some(mut subscriptions) = self.mounted.lock().take() else {
            return;
        };

        self.channel.notify_running_spec(None);
        self.channel.stop();

        let released = subscriptions.dispose_all();
        let mut run_scope = std::mem::take(&mut *self.run_scope.lock());
        let released = released + run_scope.dispose_all();
        *self.current_run.lock() = None;

        self.surface.lock().destroy();
        tracing::info!(released, "Unmounted AUT runner");
    }
}
