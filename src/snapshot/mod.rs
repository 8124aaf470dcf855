//! DOM snapshot records and the time-travel store built on them.

pub mod record;
pub mod store;

pub use record::{Point, Rect, SnapshotRecord, StyleRule};
pub use store::{apply_snapshot, HighlightProps, SnapshotCollectionState, SnapshotControls};
