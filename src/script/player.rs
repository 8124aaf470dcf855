//! Drives a headless runner from a [`RunScript`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::config::RuntimeConfig;
use crate::events::{ChannelCall, LocalEventBus};
use crate::runner::{AutRunner, RunPhase};
use crate::script::tape::{RunScript, ScriptStep};
use crate::state::{RunState, SelectorPlaygroundModel, SpecDescriptor, Viewport};
use crate::surface::{AutSurface, FrameId, HeadlessSurface, LayerKind};

/// Final state of a replay, printed by the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub steps: usize,
    pub mounted: bool,
    pub phase: RunPhase,
    pub live_frames: Vec<FrameId>,
    pub container: Vec<FrameId>,
    /// Navigation target of the live frame
    pub navigation: Option<String>,
    pub url: String,
    pub viewport: Viewport,
    pub scale: f64,
    pub snapshot: SnapshotSummary,
    pub message: Option<String>,
    pub script_error: Option<String>,
    pub devtools_registrations: u64,
    pub layers: Vec<LayerKind>,
    pub channel_calls: Vec<ChannelCall>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub count: usize,
    pub index: usize,
    pub showing_highlights: bool,
}

/// A mounted runner over a [`HeadlessSurface`] and [`LocalEventBus`].
pub struct ScriptPlayer {
    runner: AutRunner,
    bus: Arc<LocalEventBus>,
    dom: HeadlessSurface,
    steps: usize,
}

impl ScriptPlayer {
    pub fn new(config: RuntimeConfig) -> Self {
        let dom = HeadlessSurface::new();
        let bus = Arc::new(LocalEventBus::new());
        let state = Arc::new(RunState::new(config.viewport));
        let runner = AutRunner::new(
            config,
            state,
            SelectorPlaygroundModel::new(),
            AutSurface::new(dom.clone()).shared(),
            bus.clone(),
        );
        runner.mount();
        Self {
            runner,
            bus,
            dom,
            steps: 0,
        }
    }

    pub fn runner(&self) -> &AutRunner {
        &self.runner
    }

    pub fn bus(&self) -> &LocalEventBus {
        &self.bus
    }

    pub fn dom(&self) -> &HeadlessSurface {
        &self.dom
    }

    /// Apply one step. Returns how long to pause for `delay` steps.
    pub fn apply(&mut self, step: &ScriptStep) -> Option<Duration> {
        self.steps += 1;
        tracing::debug!(step = self.steps, ?step, "Applying script step");

        let state = self.runner.state();
        match step {
            ScriptStep::SetSpec { absolute, relative } => {
                let mut spec = SpecDescriptor::new(absolute.as_str());
                if let Some(relative) = relative {
                    spec = spec.with_relative(relative.as_str());
                }
                state.set_spec(Some(spec));
            }
            ScriptStep::ClearSpec => state.set_spec(None),
            ScriptStep::Ready { ready } => state.set_ready_to_run_tests(*ready),
            ScriptStep::Emit { event } => {
                let delivered = self.bus.emit(event.clone());
                tracing::debug!(event = %event.kind(), delivered, "Emitted scripted event");
            }
            ScriptStep::SelectSnapshot { index } => {
                self.runner.snapshot_controls().select(*index);
            }
            ScriptStep::StepSnapshot { delta } => {
                self.runner.snapshot_controls().step(*delta);
            }
            ScriptStep::ToggleHighlights => {
                self.runner.snapshot_controls().toggle_highlights();
            }
            ScriptStep::SelectorPlayground { enabled } => {
                self.runner.selector_playground().set_enabled(*enabled);
            }
            ScriptStep::SelectorHighlight { showing } => {
                self.runner
                    .selector_playground()
                    .set_showing_highlight(*showing);
            }
            ScriptStep::ContainerSize { width, height } => {
                state.update_container_size(Viewport::new(*width, *height));
            }
            ScriptStep::Delay { ms } => return Some(Duration::from_millis(*ms)),
            ScriptStep::Unmount => self.runner.unmount(),
        }
        None
    }

    pub fn summary(&self) -> ReplaySummary {
        let state = self.runner.state();
        let live_frames = self.dom.live_frames();
        let navigation = self
            .runner
            .surface()
            .lock()
            .live_handle()
            .and_then(|handle| self.dom.frame(handle.frame()))
            .and_then(|frame| frame.src);
        let snapshot = state.snapshot.with(|s| SnapshotSummary {
            count: s.len(),
            index: s.state_index,
            showing_highlights: s.showing_highlights,
        });

        ReplaySummary {
            steps: self.steps,
            mounted: self.runner.is_mounted(),
            phase: self.runner.model().phase(),
            live_frames,
            container: self.dom.container(),
            navigation,
            url: state.url.get(),
            viewport: state.viewport.get(),
            scale: state.effective_scale(),
            snapshot,
            message: state.message.get(),
            script_error: state.script_error.get(),
            devtools_registrations: state.devtools_registrations(),
            layers: self.dom.layers().iter().map(|layer| layer.kind()).collect(),
            channel_calls: self.bus.calls(),
        }
    }
}

/// Replay `script` against a fresh headless runner.
///
/// Steps are fed through a channel by a separate task so `delay` steps
/// suspend only the player.
pub async fn replay(script: RunScript, config: RuntimeConfig) -> ReplaySummary {
    let mut player = ScriptPlayer::new(config);
    let (tx, mut rx) = mpsc::channel::<ScriptStep>(16);

    let feeder = tokio::spawn(async move {
        for step in script.steps {
            if tx.send(step).await.is_err() {
                break;
            }
        }
    });

    while let Some(step) = rx.recv().await {
        if let Some(delay) = player.apply(&step) {
            tokio::time::sleep(delay).await;
        }
    }
    if let Err(e) = feeder.await {
        tracing::warn!(error = %e, "Script feeder task failed");
    }

    player.summary()
}
