//! Core domain model types for framegrab.
//!
//! This module contains the fundamental types used throughout the pipeline:
//! - The pipeline state machine
//! - The execution mode that controls failure verbosity
//! - The stage output type

mod output;
mod status;

pub use output::StageOutput;
pub use status::{ExecutionMode, PipelineState};
