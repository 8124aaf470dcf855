//! The AUT rendering surface: the capability interface a concrete frame
//! implementation provides, an in-memory implementation of it, and the
//! controller that owns the single live frame.

mod aut;
mod backend;
mod headless;

use std::sync::Arc;

use parking_lot::Mutex;

pub use aut::{AutSurface, SurfaceHandle};
pub use backend::{
    DocumentState, FrameId, Highlight, Layer, LayerKind, SurfaceBackend, SurfaceError,
};
pub use headless::{HeadlessFrame, HeadlessSurface, SurfaceCall};

/// The surface controller as shared between the runner components.
pub type SharedSurface = Arc<Mutex<AutSurface>>;
