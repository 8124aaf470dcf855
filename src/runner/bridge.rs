use crate::reactive::SubscriptionSet;
use crate::state::{RunState, SelectorPlaygroundModel, SpecDescriptor};
use crate::surface::SharedSurface;

/// Wire the reactive signals to the surface and to `on_spec`.
///
/// Each observer runs once immediately with the current value and again on
/// every change. Everything is released when the returned set is disposed.
pub fn connect_signals(
    selector_playground: &SelectorPlaygroundModel,
    state: &RunState,
    surface: &SharedSurface,
    on_spec: impl Fn(Option<&SpecDescriptor>) + Send + Sync + 'static,
) -> SubscriptionSet {
    let mut subscriptions = SubscriptionSet::new();

    let playground_surface = surface.clone();
    subscriptions.push(selector_playground.is_enabled.autorun(move |enabled| {
        playground_surface.lock().toggle_selector_playground(*enabled);
    }));

    let highlight_surface = surface.clone();
    subscriptions.push(
        selector_playground
            .is_showing_highlight
            .autorun(move |showing| {
                highlight_surface.lock().toggle_selector_highlight(*showing);
            }),
    );

    subscriptions.push(state.spec.autorun(move |spec| on_spec(spec.as_ref())));

    subscriptions
}
