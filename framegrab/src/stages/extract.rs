//! Frame extraction stage.

use super::Stage;
use crate::config::ExtractionOptions;
use crate::context::PipelineContext;
use crate::core::{PipelineState, StageOutput};
use crate::errors::FramegrabError;
use crate::tools::{ToolInvocation, ToolRunner};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Thumbnail detection followed by one frame per second.
pub const VIDEO_FILTER: &str = "thumbnail,fps=1";

/// Highest output quality for `-q:v`.
pub const FRAME_QUALITY: &str = "1";

/// Output naming; numbering is the transcoder's own and starts at 1.
pub const FRAME_PATTERN: &str = "%d.png";

/// Writes still frames from `ctx.video_path` into `ctx.frame_dir`.
pub struct ExtractionStage {
    runner: Arc<dyn ToolRunner>,
    program: PathBuf,
    options: ExtractionOptions,
}

impl ExtractionStage {
    /// Creates an extraction stage running `program`.
    #[must_use]
    pub fn new(runner: Arc<dyn ToolRunner>, program: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            program: program.into(),
            options: ExtractionOptions::default(),
        }
    }

    /// Sets the optional trimming options.
    #[must_use]
    pub fn with_options(mut self, options: ExtractionOptions) -> Self {
        self.options = options;
        self
    }

    /// Builds `<transcoder> -i <video> [-ss s] [-t d] -vf thumbnail,fps=1 -q:v 1 <frame_dir>/%d.png`.
    #[must_use]
    pub fn invocation(&self, video_path: &Path, frame_dir: &Path) -> ToolInvocation {
        let mut invocation = ToolInvocation::new(&self.program).arg("-i").path_arg(video_path);

        if let Some(ref start) = self.options.start_time {
            invocation = invocation.args(["-ss", start.as_str()]);
        }
        if let Some(ref duration) = self.options.duration {
            invocation = invocation.args(["-t", duration.as_str()]);
        }

        invocation
            .args(["-vf", VIDEO_FILTER, "-q:v", FRAME_QUALITY])
            .path_arg(&frame_dir.join(FRAME_PATTERN))
    }
}

impl std::fmt::Debug for ExtractionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionStage")
            .field("program", &self.program)
            .field("options", &self.options)
            .finish()
    }
}

#[async_trait]
impl Stage for ExtractionStage {
    fn name(&self) -> &str {
        "extract"
    }

    fn completes(&self) -> PipelineState {
        PipelineState::Extracted
    }

    async fn execute(&self, ctx: PipelineContext) -> Result<StageOutput, FramegrabError> {
        let video_path = ctx.video_path()?;
        let frame_dir = ctx.frame_dir()?;

        tokio::fs::create_dir_all(frame_dir)
            .await
            .map_err(|source| FramegrabError::workspace(frame_dir, source))?;

        info!(
            video_path = %video_path.display(),
            frame_dir = %frame_dir.display(),
            "Extracting frames"
        );
        let result = self.runner.run(&self.invocation(video_path, frame_dir)).await;

        match result {
            Ok(()) => Ok(StageOutput::ok(ctx)),
            Err(source) if source.is_spawn() => Err(FramegrabError::Spawn(source)),
            Err(source) => Err(FramegrabError::ExtractionFailed {
                video_path: video_path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::WorkspacePaths;
    use crate::errors::ToolError;
    use crate::identifier::parse_video_id;
    use crate::tools::MockToolRunner;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn context(root: &Path, frames_subdir: Option<&str>) -> PipelineContext {
        let output_dir = root.join("abc123");
        let frame_dir = frames_subdir.map_or_else(|| output_dir.clone(), |s| output_dir.join(s));
        PipelineContext::new(Uuid::new_v4())
            .with_video_id(parse_video_id("https://youtu.be/abc123").unwrap())
            .unwrap()
            .with_workspace(WorkspacePaths {
                video_path: output_dir.join("abc123.webm"),
                output_dir,
                frame_dir,
            })
            .unwrap()
    }

    #[test]
    fn test_invocation_arguments() {
        let stage = ExtractionStage::new(Arc::new(MockToolRunner::new()), "ffmpeg");
        let invocation = stage.invocation(
            Path::new("./output/abc123/abc123.webm"),
            Path::new("./output/abc123"),
        );

        assert_eq!(
            invocation.args,
            vec![
                "-i",
                "./output/abc123/abc123.webm",
                "-vf",
                "thumbnail,fps=1",
                "-q:v",
                "1",
                "./output/abc123/%d.png",
            ]
        );
    }

    #[test]
    fn test_invocation_with_trimming() {
        let options = ExtractionOptions {
            start_time: Some("00:00:05".to_string()),
            duration: Some("10".to_string()),
            frames_subdir: None,
        };
        let stage =
            ExtractionStage::new(Arc::new(MockToolRunner::new()), "ffmpeg").with_options(options);
        let invocation = stage.invocation(Path::new("in.webm"), Path::new("out"));

        assert_eq!(
            invocation.args,
            vec![
                "-i", "in.webm", "-ss", "00:00:05", "-t", "10", "-vf", "thumbnail,fps=1", "-q:v",
                "1", "out/%d.png",
            ]
        );
    }

    #[tokio::test]
    async fn test_creates_frame_dir_before_running() {
        let tmp = tempfile::tempdir().unwrap();
        let ctx = context(tmp.path(), Some("frames"));
        let frame_dir = ctx.frame_dir().unwrap().to_path_buf();

        let mut runner = MockToolRunner::new();
        let expected_dir = frame_dir.clone();
        runner.expect_run().times(1).returning(move |_| {
            assert!(expected_dir.is_dir());
            Ok(())
        });

        let stage = ExtractionStage::new(Arc::new(runner), "ffmpeg");
        tokio_test::assert_ok!(stage.execute(ctx).await);
        assert!(frame_dir.is_dir());
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_extraction_failed() {
        let tmp = tempfile::tempdir().unwrap();
        let mut runner = MockToolRunner::new();
        runner
            .expect_run()
            .times(1)
            .returning(|_| Err(ToolError::non_zero_exit("ffmpeg", Some(1))));

        let stage = ExtractionStage::new(Arc::new(runner), "ffmpeg");
        let err = stage.execute(context(tmp.path(), None)).await.unwrap_err();

        match err {
            FramegrabError::ExtractionFailed { video_path, source } => {
                assert_eq!(video_path, tmp.path().join("abc123").join("abc123.webm"));
                assert_eq!(source.exit_code(), Some(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_spawn_failure_is_spawn_error() {
        let tmp = tempfile::tempdir().unwrap();
        let mut runner = MockToolRunner::new();
        runner.expect_run().times(1).returning(|_| {
            Err(ToolError::spawn("ffmpeg", std::io::ErrorKind::PermissionDenied.into()))
        });

        let stage = ExtractionStage::new(Arc::new(runner), "ffmpeg");
        let err = stage.execute(context(tmp.path(), None)).await.unwrap_err();
        assert!(matches!(err, FramegrabError::Spawn(_)));
    }
}
