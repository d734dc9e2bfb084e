//! Pipeline orchestration.
//!
//! This module provides:
//! - The [`PipelineOrchestrator`] driver loop and its state tracking
//! - Success and failure reports, and their terminal rendering

mod orchestrator;
mod report;

pub use orchestrator::{default_stages, PipelineOrchestrator};
pub use report::{render_failure, render_success, PipelineFailure, PipelineReport};
