//! Stage trait and the pipeline's stages.
//!
//! Stages are the atomic units of work in a run. Each one takes the
//! context by value and either returns the next version of it or fails.

mod cleanup;
mod download;
mod extract;

pub use cleanup::CleanupStage;
pub use download::{DownloadStage, DOWNLOAD_FORMAT};
pub use extract::{ExtractionStage, FRAME_PATTERN, FRAME_QUALITY, VIDEO_FILTER};

use crate::context::PipelineContext;
use crate::core::{PipelineState, StageOutput};
use crate::errors::FramegrabError;
use async_trait::async_trait;
use std::fmt::Debug;

/// Trait for pipeline stages.
#[async_trait]
pub trait Stage: Send + Sync + Debug {
    /// Returns the name of the stage.
    fn name(&self) -> &str;

    /// Returns the state the pipeline enters when this stage succeeds.
    fn completes(&self) -> PipelineState;

    /// Executes the stage.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The context produced by the previous step
    ///
    /// # Returns
    ///
    /// The extended context and any warnings, or the failure that aborts the run.
    async fn execute(&self, ctx: PipelineContext) -> Result<StageOutput, FramegrabError>;
}
