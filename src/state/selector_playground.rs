use crate::reactive::Observable;

/// The two selector-playground signals the AUT surface follows.
///
/// The playground's own logic lives elsewhere; this only carries its state.
#[derive(Debug, Clone, Default)]
pub struct SelectorPlaygroundModel {
    pub is_enabled: Observable<bool>,
    pub is_showing_highlight: Observable<bool>,
}

impl SelectorPlaygroundModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.is_enabled.set(enabled);
    }

    pub fn set_showing_highlight(&self, showing: bool) {
        self.is_showing_highlight.set(showing);
    }

    pub fn toggle_enabled(&self) -> bool {
        let next = !self.is_enabled.get();
        self.is_enabled.set(next);
        next
    }
}
