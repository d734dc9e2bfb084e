//! Download stage.

use super::Stage;
use crate::context::PipelineContext;
use crate::core::{PipelineState, StageOutput};
use crate::errors::{FramegrabError, ToolError};
use crate::tools::{ToolInvocation, ToolRunner};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Format selector for the best video-only stream.
pub const DOWNLOAD_FORMAT: &str = "bv";

/// Fetches the video with the downloader tool into `ctx.video_path`.
///
/// With `fallback_to_url` set, a downloader that rejects the parsed
/// identifier gets exactly one more attempt with the raw source URL.
pub struct DownloadStage {
    runner: Arc<dyn ToolRunner>,
    program: PathBuf,
    fallback_to_url: bool,
}

impl DownloadStage {
    /// Creates a download stage running `program`.
    #[must_use]
    pub fn new(runner: Arc<dyn ToolRunner>, program: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            program: program.into(),
            fallback_to_url: false,
        }
    }

    /// Enables or disables the single raw-URL retry.
    #[must_use]
    pub fn with_fallback_to_url(mut self, enabled: bool) -> Self {
        self.fallback_to_url = enabled;
        self
    }

    /// Builds `<downloader> -f bv --no-part -o <video_path> <target>`.
    #[must_use]
    pub fn invocation(&self, target: &str, video_path: &Path) -> ToolInvocation {
        ToolInvocation::new(&self.program)
            .args(["-f", DOWNLOAD_FORMAT, "--no-part", "-o"])
            .path_arg(video_path)
            .arg(target)
    }

    async fn attempt(&self, target: &str, video_path: &Path) -> Result<(), ToolError> {
        info!(target = %target, video_path = %video_path.display(), "Downloading video");
        self.runner.run(&self.invocation(target, video_path)).await
    }

    fn fallback_target<'a>(&self, ctx: &'a PipelineContext, video_id: &str) -> Option<&'a str> {
        if !self.fallback_to_url {
            return None;
        }
        ctx.source_url().filter(|url| *url != video_id)
    }
}

fn download_error(target: &str, source: ToolError) -> FramegrabError {
    if source.is_spawn() {
        FramegrabError::Spawn(source)
    } else {
        FramegrabError::DownloadFailed {
            video_id: target.to_string(),
            source,
        }
    }
}

impl std::fmt::Debug for DownloadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadStage")
            .field("program", &self.program)
            .field("fallback_to_url", &self.fallback_to_url)
            .finish()
    }
}

#[async_trait]
impl Stage for DownloadStage {
    fn name(&self) -> &str {
        "download"
    }

    fn completes(&self) -> PipelineState {
        PipelineState::Downloaded
    }

    async fn execute(&self, ctx: PipelineContext) -> Result<StageOutput, FramegrabError> {
        let video_id = ctx.video_id()?.as_str();
        let video_path = ctx.video_path()?;

        let result = self.attempt(video_id, video_path).await;
        let first = match result {
            Ok(()) => return Ok(StageOutput::ok(ctx)),
            Err(err) if err.is_spawn() => return Err(FramegrabError::Spawn(err)),
            Err(err) => err,
        };

        let Some(url) = self.fallback_target(&ctx, video_id) else {
            return Err(download_error(video_id, first));
        };

        warn!(
            video_id = %video_id,
            error = %first,
            "Downloader rejected the identifier, retrying once with the source URL"
        );
        let retry = self.attempt(url, video_path).await;
        match retry {
            Ok(()) => Ok(StageOutput::ok(ctx)),
            Err(err) => Err(download_error(url, err)),
        }
    }
}
