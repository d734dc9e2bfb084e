//! Context threaded through a pipeline run.
//!
//! This module provides:
//! - The [`PipelineContext`] accumulator handed from stage to stage
//! - The [`WorkspacePaths`] computed for one video

mod execution;

pub use execution::{PipelineContext, WorkspacePaths};
