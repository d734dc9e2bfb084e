//! Testing utilities for framegrab pipelines.
//!
//! This module provides:
//! - A scripted tool runner that records invocations instead of spawning
//! - A recording stage for custom stage lists

mod mocks;

pub use mocks::{RecordingStage, ScriptedRunner};
