//! JSONL run scripts and the headless player that replays them.

pub mod player;
pub mod tape;

pub use player::{replay, ReplaySummary, ScriptPlayer, SnapshotSummary};
pub use tape::{RunScript, ScriptParseError, ScriptStep, SCRIPT_SCHEMA_VERSION};
