//! Shared run state observed by the runner components.

mod run_state;
mod selector_playground;
mod spec;

pub use run_state::{AfterUpdate, RunState, Viewport};
pub use selector_playground::SelectorPlaygroundModel;
pub use spec::SpecDescriptor;
