use serde::Serialize;

use crate::config::RuntimeConfig;
use crate::events::event::{RunnerEvent, RunnerEventKind};
use crate::reactive::Subscription;
use crate::state::SpecDescriptor;
use crate::surface::SurfaceHandle;

pub type EventHandler = Box<dyn Fn(&RunnerEvent) + Send + Sync>;
pub type OnceHandler = Box<dyn FnOnce(&RunnerEvent) + Send>;

/// Publish/subscribe channel to the test driver.
///
/// The transport behind it is opaque. Handlers may be invoked re-entrantly
/// from inside any of the outbound calls.
pub trait EventChannel: Send + Sync {
    fn on(&self, kind: RunnerEventKind, handler: EventHandler) -> Subscription;

    /// Handle only the next event of `kind`.
    fn once(&self, kind: RunnerEventKind, handler: OnceHandler) -> Subscription;

    fn start(&self, config: &RuntimeConfig);

    fn setup(&self, config: &RuntimeConfig);

    /// Hand the freshly created AUT frame to the driver and begin execution.
    fn initialize(&self, surface: SurfaceHandle, config: &RuntimeConfig);

    fn stop(&self);

    fn notify_running_spec(&self, spec: Option<&SpecDescriptor>);
}

/// Outbound call made on a channel, as recorded by [`LocalEventBus`].
///
/// [`LocalEventBus`]: crate::events::LocalEventBus
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum ChannelCall {
    Start {
        namespace: String,
    },
    Setup {
        spec: Option<SpecDescriptor>,
    },
    Initialize {
        surface: SurfaceHandle,
        spec: Option<SpecDescriptor>,
    },
    Stop,
    NotifyRunningSpec {
        spec: Option<SpecDescriptor>,
    },
}
