use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::events::{SelectorQuery, VisitFailure};
use crate::snapshot::{Point, Rect, SnapshotRecord, StyleRule};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    #[error("Frame not found: {0}")]
    FrameNotFound(FrameId),
    #[error("Frame has no execution context: {0}")]
    NoExecutionContext(FrameId),
    #[error("Invalid selector: {0:?}")]
    InvalidSelector(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameId(pub u64);

impl std::fmt::Display for FrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "frame-{}", self.0)
    }
}

/// Document-level state of a frame that a snapshot can replace.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    pub body: String,
    pub styles: Vec<StyleRule>,
    pub html_attrs: BTreeMap<String, String>,
    pub body_attrs: BTreeMap<String, String>,
}

impl DocumentState {
    /// Neutral contents shown until the spec's own document paints.
    pub fn blank() -> Self {
        Self::default()
    }
}

impl From<&SnapshotRecord> for DocumentState {
    fn from(snapshot: &SnapshotRecord) -> Self {
        Self {
            body: snapshot.body.clone(),
            styles: snapshot.styles.clone(),
            html_attrs: snapshot.html_attrs.clone(),
            body_attrs: snapshot.body_attrs.clone(),
        }
    }
}

/// Overlay describing the element a snapshot points at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Highlight {
    pub selector: Option<String>,
    pub rect: Option<Rect>,
    pub coords: Option<Point>,
}

/// Cosmetic layers drawn above the frame. None of them touch the frame's
/// document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layer {
    /// Placeholder shown while no spec is selected
    NoSpec,
    VisitFailure(VisitFailure),
    Highlight(Highlight),
    /// Boxes covering elements excluded from a screenshot
    Blackout { selectors: Vec<String> },
    SelectorPlayground { highlighting: bool },
}

impl Layer {
    pub fn kind(&self) -> LayerKind {
        match self {
            Layer::NoSpec => LayerKind::NoSpec,
            Layer::VisitFailure(_) => LayerKind::VisitFailure,
            Layer::Highlight(_) => LayerKind::Highlight,
            Layer::Blackout { .. } => LayerKind::Blackout,
            Layer::SelectorPlayground { .. } => LayerKind::SelectorPlayground,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerKind {
    NoSpec,
    VisitFailure,
    Highlight,
    Blackout,
    SelectorPlayground,
}

/// What a concrete frame implementation must provide.
///
/// Implementations hold at most one layer per [`LayerKind`]; showing a layer
/// replaces the previous one of the same kind.
pub trait SurfaceBackend: Send {
    /// Create a detached frame.
    fn create_frame(&mut self) -> FrameId;

    /// Tear down a frame and detach it if attached. Unknown ids are ignored.
    fn destroy_frame(&mut self, frame: FrameId);

    /// Remove everything from the attachment container.
    fn empty_container(&mut self);

    fn attach(&mut self, frame: FrameId);

    /// Point the frame at `url`, reloading its document.
    fn set_navigation_target(&mut self, frame: FrameId, url: &str);

    /// Replace the frame's document without navigating.
    fn replace_document_state(&mut self, frame: FrameId, state: &DocumentState);

    fn read_document_state(&self, frame: FrameId) -> Option<DocumentState>;

    fn show_layer(&mut self, layer: Layer);

    fn clear_layer(&mut self, kind: LayerKind);

    /// Log the elements matching `query` to the frame's console, returning
    /// how many matched.
    fn log_selector_elements(
        &mut self,
        frame: FrameId,
        query: &SelectorQuery,
    ) -> Result<usize, SurfaceError>;
}
