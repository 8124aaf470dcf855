//! The event channel between the test driver and the AUT surface.

mod bus;
mod channel;
mod event;

pub use bus::LocalEventBus;
pub use channel::{ChannelCall, EventChannel, EventHandler, OnceHandler};
pub use event::{
    RunnerEvent, RunnerEventKind, ScreenshotCapture, ScreenshotConfig, SelectorMethod,
    SelectorQuery, SnapshotProps, VisitFailure,
};
