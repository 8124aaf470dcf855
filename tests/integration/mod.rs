//! Integration tests for aut-runner
//!
//! These tests drive a mounted runner end to end over the headless surface
//! and the in-process event bus.

#[path = "../common/mod.rs"]
pub mod common;

pub mod cli;
pub mod run_lifecycle;
pub mod snapshot_scrub;
