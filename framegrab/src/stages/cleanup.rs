//! Intermediate file cleanup.

use super::Stage;
use crate::context::PipelineContext;
use crate::core::{PipelineState, StageOutput};
use crate::errors::{FramegrabError, StageWarning};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Removes the downloaded video once frames exist.
///
/// Only runs after a successful extraction. A removal failure never fails
/// the run; it comes back as a [`StageWarning::Cleanup`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CleanupStage;

impl CleanupStage {
    /// Creates a cleanup stage.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for CleanupStage {
    fn name(&self) -> &str {
        "cleanup"
    }

    fn completes(&self) -> PipelineState {
        PipelineState::CleanedUp
    }

    async fn execute(&self, ctx: PipelineContext) -> Result<StageOutput, FramegrabError> {
        let video_path = ctx.video_path()?.to_path_buf();

        match tokio::fs::remove_file(&video_path).await {
            Ok(()) => {
                debug!(video_path = %video_path.display(), "Removed intermediate video");
                Ok(StageOutput::ok(ctx))
            }
            Err(err) => {
                warn!(video_path = %video_path.display(), error = %err, "Could not remove intermediate video");
                Ok(StageOutput::ok(ctx).with_warning(StageWarning::cleanup(video_path, err)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::WorkspacePaths;
    use std::path::Path;
    use uuid::Uuid;

    fn context(dir: &Path) -> PipelineContext {
        PipelineContext::new(Uuid::new_v4())
            .with_workspace(WorkspacePaths {
                output_dir: dir.to_path_buf(),
                video_path: dir.join("abc123.webm"),
                frame_dir: dir.to_path_buf(),
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_removes_video() {
        let tmp = tempfile::tempdir().unwrap();
        let video = tmp.path().join("abc123.webm");
        std::fs::write(&video, b"video").unwrap();

        let output = CleanupStage::new().execute(context(tmp.path())).await.unwrap();

        assert!(!video.exists());
        assert!(!output.has_warnings());
    }

    #[tokio::test]
    async fn test_missing_video_is_warning() {
        let tmp = tempfile::tempdir().unwrap();

        let output = CleanupStage::new().execute(context(tmp.path())).await.unwrap();

        assert_eq!(output.warnings.len(), 1);
        let StageWarning::Cleanup { ref path, ref source } = output.warnings[0];
        assert_eq!(path, &tmp.path().join("abc123.webm"));
        assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_leaves_frames_alone() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("abc123.webm"), b"video").unwrap();
        std::fs::write(tmp.path().join("1.png"), b"frame").unwrap();

        CleanupStage::new().execute(context(tmp.path())).await.unwrap();

        assert!(tmp.path().join("1.png").exists());
    }
}
