//! In-memory frame implementation.
//!
//! Models frames, the attachment container and overlay layers without a
//! browser, and keeps a journal of every call so runs can be inspected
//! afterwards (by the CLI summary and by tests).

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::events::{SelectorMethod, SelectorQuery};
use crate::surface::backend::{
    DocumentState, FrameId, Layer, LayerKind, SurfaceBackend, SurfaceError,
};

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum SurfaceCall {
    CreateFrame { frame: FrameId },
    DestroyFrame { frame: FrameId },
    EmptyContainer,
    Attach { frame: FrameId },
    Navigate { frame: FrameId, url: String },
    ReplaceDocument { frame: FrameId, body: String },
    ShowLayer(LayerKind),
    ClearLayer(LayerKind),
    LogSelector { frame: FrameId, selector: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeadlessFrame {
    /// Current navigation target
    pub src: Option<String>,
    pub document: DocumentState,
    /// Number of navigations; each one starts a new execution context
    pub navigations: u32,
    pub console: Vec<String>,
}

#[derive(Debug, Default)]
struct HeadlessDom {
    next_frame: u64,
    frames: BTreeMap<FrameId, HeadlessFrame>,
    container: Vec<FrameId>,
    layers: Vec<Layer>,
    journal: Vec<SurfaceCall>,
}

/// Cloneable handle to a shared in-memory DOM. Clones observe the same
/// frames, so a test can keep one while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct HeadlessSurface {
    dom: Arc<Mutex<HeadlessDom>>,
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames that exist (created and not destroyed).
    pub fn live_frames(&self) -> Vec<FrameId> {
        self.dom.lock().frames.keys().copied().collect()
    }

    /// Frames currently attached to the container, in order.
    pub fn container(&self) -> Vec<FrameId> {
        self.dom.lock().container.clone()
    }

    pub fn frame(&self, frame: FrameId) -> Option<HeadlessFrame> {
        self.dom.lock().frames.get(&frame).cloned()
    }

    pub fn layers(&self) -> Vec<Layer> {
        self.dom.lock().layers.clone()
    }

    pub fn layer(&self, kind: LayerKind) -> Option<Layer> {
        self.dom
            .lock()
            .layers
            .iter()
            .find(|layer| layer.kind() == kind)
            .cloned()
    }

    pub fn has_layer(&self, kind: LayerKind) -> bool {
        self.layer(kind).is_some()
    }

    pub fn journal(&self) -> Vec<SurfaceCall> {
        self.dom.lock().journal.clone()
    }

    pub fn clear_journal(&self) {
        self.dom.lock().journal.clear();
    }
}

impl HeadlessDom {
    fn record(&mut self, call: SurfaceCall) {
        self.journal.push(call);
    }
}

fn count_matches(body: &str, query: &SelectorQuery) -> Result<usize, SurfaceError> {
    let selector = query.selector.trim();
    if selector.is_empty() {
        return Err(SurfaceError::InvalidSelector(query.selector.clone()));
    }

    let count = match query.method {
        SelectorMethod::Contains => body.matches(selector).count(),
        SelectorMethod::Get => {
            if let Some(id) = selector.strip_prefix('#') {
                body.matches(&format!("id=\"{id}\"")).count()
            } else if let Some(class) = selector.strip_prefix('.') {
                body.split("class=\"")
                    .skip(1)
                    .filter(|rest| {
                        rest.split('"')
                            .next()
                            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
                    })
                    .count()
            } else if selector.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                body.matches(&format!("<{selector}")).count()
            } else {
                return Err(SurfaceError::InvalidSelector(query.selector.clone()));
            }
        }
    };
    Ok(count)
}

impl SurfaceBackend for HeadlessSurface {
    fn create_frame(&mut self) -> FrameId {
        let mut dom = self.dom.lock();
        dom.next_frame += 1;
        let frame = FrameId(dom.next_frame);
        dom.frames.insert(frame, HeadlessFrame::default());
        dom.record(SurfaceCall::CreateFrame { frame });
        frame
    }

    fn destroy_frame(&mut self, frame: FrameId) {
        let mut dom = self.dom.lock();
        if dom.frames.remove(&frame).is_some() {
            dom.container.retain(|attached| *attached != frame);
            dom.record(SurfaceCall::DestroyFrame { frame });
        }
    }

    fn empty_container(&mut self) {
        let mut dom = self.dom.lock();
        dom.container.clear();
        dom.record(SurfaceCall::EmptyContainer);
    }

    fn attach(&mut self, frame: FrameId) {
        let mut dom = self.dom.lock();
        if dom.frames.contains_key(&frame) && !dom.container.contains(&frame) {
            dom.container.push(frame);
            dom.record(SurfaceCall::Attach { frame });
        }
    }

    fn set_navigation_target(&mut self, frame: FrameId, url: &str) {
        let mut dom = self.dom.lock();
        if let Some(target) = dom.frames.get_mut(&frame) {
            target.src = Some(url.to_string());
            target.navigations += 1;
            target.document = DocumentState::default();
            dom.record(SurfaceCall::Navigate {
                frame,
                url: url.to_string(),
            });
        }
    }

    fn replace_document_state(&mut self, frame: FrameId, state: &DocumentState) {
        let mut dom = self.dom.lock();
        if let Some(target) = dom.frames.get_mut(&frame) {
            target.document = state.clone();
            dom.record(SurfaceCall::ReplaceDocument {
                frame,
                body: state.body.clone(),
            });
        }
    }

    fn read_document_state(&self, frame: FrameId) -> Option<DocumentState> {
        self.dom
            .lock()
            .frames
            .get(&frame)
            .map(|target| target.document.clone())
    }

    fn show_layer(&mut self, layer: Layer) {
        let mut dom = self.dom.lock();
        let kind = layer.kind();
        dom.layers.retain(|existing| existing.kind() != kind);
        dom.layers.push(layer);
        dom.record(SurfaceCall::ShowLayer(kind));
    }

    fn clear_layer(&mut self, kind: LayerKind) {
        let mut dom = self.dom.lock();
        dom.layers.retain(|existing| existing.kind() != kind);
        dom.record(SurfaceCall::ClearLayer(kind));
    }

    fn log_selector_elements(
        &mut self,
        frame: FrameId,
        query: &SelectorQuery,
    ) -> Result<usize, SurfaceError> {
        let mut dom = self.dom.lock();
        let target = dom
            .frames
            .get_mut(&frame)
            .ok_or(SurfaceError::FrameNotFound(frame))?;
        if target.navigations == 0 {
            return Err(SurfaceError::NoExecutionContext(frame));
        }

        let count = count_matches(&target.document.body, query)?;
        target.console.push(format!(
            "cy.{}('{}') yielded {} element(s)",
            query.method.as_str(),
            query.selector,
            count
        ));
        dom.record(SurfaceCall::LogSelector {
            frame,
            selector: query.selector.clone(),
        });
        Ok(count)
    }
}
