//! Run orchestration: the lifecycle model, the signal bridge and the
//! orchestrator that sequences a run.

mod bridge;
mod iframe_model;
mod orchestrator;

pub use bridge::connect_signals;
pub use iframe_model::{
    IframeModel, RunPhase, MISSING_SNAPSHOT_MESSAGE, PINNED_SNAPSHOT_MESSAGE, SNAPSHOT_MESSAGE,
};
pub use orchestrator::AutRunner;

use crate::state::SpecDescriptor;

/// URL the resource server serves `spec` under:
/// `{prefix}/{namespace}/iframes/{spec.absolute}`. Empty without a spec.
pub fn spec_url(namespace: &str, spec: Option<&SpecDescriptor>, prefix: &str) -> String {
    match spec {
        Some(spec) => format!("{prefix}/{namespace}/iframes/{}", spec.absolute),
        None => String::new(),
    }
}
