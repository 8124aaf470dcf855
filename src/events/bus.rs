//! In-process event channel.

use parking_lot::Mutex;

use crate::config::RuntimeConfig;
use crate::events::channel::{ChannelCall, EventChannel, EventHandler, OnceHandler};
use crate::events::event::{RunnerEvent, RunnerEventKind};
use crate::reactive::{ObserverList, Subscription};
use crate::state::SpecDescriptor;
use crate::surface::SurfaceHandle;

/// Channel that dispatches synchronously to in-process handlers and records
/// every outbound call.
#[derive(Default)]
pub struct LocalEventBus {
    handlers: ObserverList<RunnerEvent>,
    calls: Mutex<Vec<ChannelCall>>,
}

impl LocalEventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every handler registered for its kind.
    pub fn emit(&self, event: RunnerEvent) -> usize {
        tracing::debug!(event = %event.kind(), "Dispatching runner event");
        self.handlers.notify(&event)
    }

    /// Outbound calls so far, oldest first.
    pub fn calls(&self) -> Vec<ChannelCall> {
        self.calls.lock().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().clear();
    }

    /// Registered handlers across all event kinds.
    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    fn record(&self, call: ChannelCall) {
        self.calls.lock().push(call);
    }
}

impl EventChannel for LocalEventBus {
    fn on(&self, kind: RunnerEventKind, handler: EventHandler) -> Subscription {
        self.handlers.subscribe(move |event| {
            if event.kind() == kind {
                handler(event);
            }
        })
    }

    fn once(&self, kind: RunnerEventKind, handler: OnceHandler) -> Subscription {
        let slot = Mutex::new(Some(handler));
        self.handlers.subscribe_until(move |event| {
            if event.kind() != kind {
                return true;
            }
            let handler = slot.lock().take();
            if let Some(handler) = handler {
                handler(event);
            }
            false
        })
    }

    fn start(&self, config: &RuntimeConfig) {
        self.record(ChannelCall::Start {
            namespace: config.namespace.clone(),
        });
    }

    fn setup(&self, config: &RuntimeConfig) {
        self.record(ChannelCall::Setup {
            spec: config.spec.clone(),
        });
    }

    fn initialize(&self, surface: SurfaceHandle, config: &RuntimeConfig) {
        self.record(ChannelCall::Initialize {
            surface,
            spec: config.spec.clone(),
        });
    }

    fn stop(&self) {
        self.record(ChannelCall::Stop);
    }

    fn notify_running_spec(&self, spec: Option<&SpecDescriptor>) {
        self.record(ChannelCall::NotifyRunningSpec {
            spec: spec.cloned(),
        });
    }
}
