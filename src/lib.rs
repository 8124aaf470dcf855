pub mod config;
pub mod events;
pub mod reactive;
pub mod runner;
pub mod script;
pub mod snapshot;
pub mod state;
pub mod surface;
pub mod util;

pub use config::{ConfigError, RuntimeConfig};
pub use events::{EventChannel, LocalEventBus, RunnerEvent, RunnerEventKind};
pub use reactive::{Observable, Subscription, SubscriptionSet};
pub use runner::{spec_url, AutRunner, IframeModel, RunPhase};
pub use script::{RunScript, ScriptParseError, ScriptPlayer, ScriptStep};
pub use snapshot::{SnapshotCollectionState, SnapshotControls, SnapshotRecord};
pub use state::{RunState, SelectorPlaygroundModel, SpecDescriptor, Viewport};
pub use surface::{AutSurface, HeadlessSurface, SharedSurface, SurfaceBackend, SurfaceHandle};
