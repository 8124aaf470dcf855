use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::events::{ScreenshotConfig, SelectorQuery, VisitFailure};
use crate::snapshot::{HighlightProps, SnapshotRecord};
use crate::surface::backend::{
    DocumentState, FrameId, Highlight, Layer, LayerKind, SurfaceBackend,
};
use crate::surface::SharedSurface;

/// Opaque reference to one incarnation of the AUT frame.
///
/// The generation changes every time the frame is recreated, so a handle
/// kept by a previous run never matches the live frame again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SurfaceHandle {
    frame: FrameId,
    generation: u64,
}

impl SurfaceHandle {
    pub fn frame(&self) -> FrameId {
        self.frame
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Controller for the AUT frame.
///
/// Owns exactly one live frame at a time. Operations that need a frame are
/// silent no-ops while none is live, since that only happens mid-teardown.
pub struct AutSurface {
    backend: Box<dyn SurfaceBackend>,
    live: Option<SurfaceHandle>,
    generation: u64,
    visit_failure: Option<VisitFailure>,
    /// Highlight currently drawn (or hidden by an in-flight screenshot)
    highlight: Option<Highlight>,
    selector_playground: bool,
    selector_highlight: bool,
    screenshotting: bool,
}

impl AutSurface {
    pub fn new(backend: impl SurfaceBackend + 'static) -> Self {
        Self {
            backend: Box::new(backend),
            live: None,
            generation: 0,
            visit_failure: None,
            highlight: None,
            selector_playground: false,
            selector_highlight: false,
            screenshotting: false,
        }
    }

    pub fn shared(self) -> SharedSurface {
        Arc::new(Mutex::new(self))
    }

    pub fn live_handle(&self) -> Option<SurfaceHandle> {
        self.live
    }

    pub fn is_live(&self, handle: &SurfaceHandle) -> bool {
        self.live.as_ref() == Some(handle)
    }

    fn live_frame(&self, operation: &'static str) -> Option<FrameId> {
        let frame = self.live.map(|handle| handle.frame);
        if frame.is_none() {
            tracing::debug!(operation, "No live AUT frame, skipping");
        }
        frame
    }

    /// Destroy any existing frame and create a fresh, detached one.
    pub fn create(&mut self) -> SurfaceHandle {
        self.destroy();
        self.generation += 1;
        let frame = self.backend.create_frame();
        let handle = SurfaceHandle {
            frame,
            generation: self.generation,
        };
        self.live = Some(handle);
        tracing::debug!(%frame, generation = self.generation, "Created AUT frame");
        handle
    }

    /// Tear down the live frame. Returns `false` if there was none.
    pub fn destroy(&mut self) -> bool {
        let Some(handle) = self.live.take() else {
            return false;
        };
        if self.highlight.take().is_some() {
            self.backend.clear_layer(LayerKind::Highlight);
        }
        self.backend.destroy_frame(handle.frame);
        tracing::debug!(frame = %handle.frame, "Destroyed AUT frame");
        true
    }

    /// Empty the container and attach `handle`'s frame to it. Stale handles
    /// are ignored.
    pub fn attach(&mut self, handle: &SurfaceHandle) -> bool {
        if !self.is_live(handle) {
            tracing::debug!(frame = %handle.frame, "Not attaching stale AUT frame");
            return false;
        }
        self.backend.empty_container();
        self.backend.attach(handle.frame);
        true
    }

    /// Navigate the live frame to `url`. Clears any visit failure and
    /// overlay, since the document they refer to is going away.
    pub fn load(&mut self, url: &str) {
        if url.is_empty() {
            tracing::warn!("Refusing to load an empty AUT url");
            return;
        }
        let Some(frame) = self.live_frame("load") else {
            return;
        };
        if self.visit_failure.take().is_some() {
            self.backend.clear_layer(LayerKind::VisitFailure);
        }
        self.highlight = None;
        self.backend.clear_layer(LayerKind::Highlight);
        self.backend.clear_layer(LayerKind::NoSpec);
        self.backend.set_navigation_target(frame, url);
        tracing::debug!(%frame, url, "Loading AUT");
    }

    /// Show neutral contents until the spec document paints. Suppressed
    /// while a visit failure is displayed.
    pub fn show_blank_contents(&mut self) {
        if self.visit_failure.is_some() {
            return;
        }
        if let Some(frame) = self.live_frame("show_blank_contents") {
            self.backend
                .replace_document_state(frame, &DocumentState::blank());
        }
    }

    /// Placeholder for when no spec is selected.
    pub fn show_no_spec(&mut self) {
        self.backend.show_layer(Layer::NoSpec);
    }

    /// Replace the live document with the snapshot's body, styles and
    /// attributes. Navigation and execution context are untouched.
    pub fn restore_dom(&mut self, snapshot: &SnapshotRecord) -> bool {
        self.restore_document(&DocumentState::from(snapshot))
    }

    pub fn restore_document(&mut self, document: &DocumentState) -> bool {
        let Some(frame) = self.live_frame("restore_dom") else {
            return false;
        };
        self.backend.replace_document_state(frame, document);
        true
    }

    /// Capture the live document so it can be restored later.
    pub fn detach_dom(&self) -> Option<DocumentState> {
        let frame = self.live_frame("detach_dom")?;
        self.backend.read_document_state(frame)
    }

    /// Draw an overlay over the snapshot's element.
    pub fn highlight_el(&mut self, snapshot: &SnapshotRecord, props: &HighlightProps) -> bool {
        if self.live_frame("highlight_el").is_none() || !snapshot.has_element() {
            return false;
        }
        let highlight = Highlight {
            selector: snapshot.element_selector.clone(),
            rect: snapshot.element_dimensions,
            coords: props.coords,
        };
        self.highlight = Some(highlight.clone());
        if !self.screenshotting {
            self.backend.show_layer(Layer::Highlight(highlight));
        }
        true
    }

    pub fn remove_highlights(&mut self) {
        self.highlight = None;
        self.backend.clear_layer(LayerKind::Highlight);
    }

    pub fn toggle_selector_playground(&mut self, enabled: bool) {
        self.selector_playground = enabled;
        self.render_selector_playground();
    }

    pub fn toggle_selector_highlight(&mut self, enabled: bool) {
        self.selector_highlight = enabled;
        if self.selector_playground {
            self.render_selector_playground();
        }
    }

    fn render_selector_playground(&mut self) {
        if self.selector_playground && !self.screenshotting {
            self.backend.show_layer(Layer::SelectorPlayground {
                highlighting: self.selector_highlight,
            });
        } else {
            self.backend.clear_layer(LayerKind::SelectorPlayground);
        }
    }

    /// Show the failure overlay; blank contents stay suppressed until the
    /// next `load`.
    pub fn show_visit_failure(&mut self, failure: &VisitFailure) {
        tracing::debug!(url = %failure.url, "Showing visit failure");
        self.visit_failure = Some(failure.clone());
        self.backend.show_layer(Layer::VisitFailure(failure.clone()));
    }

    pub fn visit_failure(&self) -> Option<&VisitFailure> {
        self.visit_failure.as_ref()
    }

    /// Hide overlays that must not appear in the capture and black out the
    /// configured elements.
    pub fn before_screenshot(&mut self, config: &ScreenshotConfig) {
        self.screenshotting = true;
        if self.highlight.is_some() {
            self.backend.clear_layer(LayerKind::Highlight);
        }
        if self.selector_playground {
            self.backend.clear_layer(LayerKind::SelectorPlayground);
        }
        if !config.blackout.is_empty() {
            self.backend.show_layer(Layer::Blackout {
                selectors: config.blackout.clone(),
            });
        }
    }

    pub fn after_screenshot(&mut self, config: &ScreenshotConfig) {
        self.screenshotting = false;
        if !config.blackout.is_empty() {
            self.backend.clear_layer(LayerKind::Blackout);
        }
        if let Some(highlight) = self.highlight.clone() {
            if self.live.is_some() {
                self.backend.show_layer(Layer::Highlight(highlight));
            } else {
                self.highlight = None;
            }
        }
        if self.selector_playground {
            self.render_selector_playground();
        }
    }

    /// Forward a selector query to the live frame's console. Failures are
    /// logged, never raised.
    pub fn print_selector_elements_to_console(&mut self, query: &SelectorQuery) {
        let Some(frame) = self.live_frame("print_selector_elements_to_console") else {
            tracing::warn!(selector = %query.selector, "Cannot print selector elements: no AUT frame");
            return;
        };
        match self.backend.log_selector_elements(frame, query) {
            Ok(count) => {
                tracing::debug!(selector = %query.selector, count, "Printed selector elements")
            }
            Err(e) => {
                tracing::warn!(selector = %query.selector, error = %e, "Failed to print selector elements")
            }
        }
    }
}

impl std::fmt::Debug for AutSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AutSurface")
            .field("live", &self.live)
            .field("generation", &self.generation)
            .field("visit_failure", &self.visit_failure)
            .field("selector_playground", &self.selector_playground)
            .finish_non_exhaustive()
    }
}
