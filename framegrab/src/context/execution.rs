//! The pipeline context accumulator.

use crate::errors::FramegrabError;
use crate::identifier::VideoId;
use serde::Serialize;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Paths computed for one video's workspace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkspacePaths {
    /// Root directory for this video's artifacts.
    pub output_dir: PathBuf,
    /// Where the downloader writes the video.
    pub video_path: PathBuf,
    /// Where the transcoder writes frames. Not created by the workspace step.
    pub frame_dir: PathBuf,
}

/// The record threaded through every stage of a run.
///
/// Fields are filled strictly left to right. Each setter consumes the
/// context and returns the extended value; setting a field twice is a
/// [`FramegrabError::ContextConflict`], so a populated field is read-only
/// for everything downstream.
#[derive(Debug, Clone, Serialize)]
pub struct PipelineContext {
    run_id: Uuid,
    source_url: Option<String>,
    video_id: Option<VideoId>,
    output_dir: Option<PathBuf>,
    video_path: Option<PathBuf>,
    frame_dir: Option<PathBuf>,
}

fn set_once<T>(slot: &mut Option<T>, value: T, field: &'static str) -> Result<(), FramegrabError> {
    if slot.is_some() {
        return Err(FramegrabError::ContextConflict(field));
    }
    *slot = Some(value);
    Ok(())
}

impl PipelineContext {
    /// Creates an empty context for the run `run_id`.
    #[must_use]
    pub fn new(run_id: Uuid) -> Self {
        Self {
            run_id,
            source_url: None,
            video_id: None,
            output_dir: None,
            video_path: None,
            frame_dir: None,
        }
    }

    /// Records the URL the run was started with.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Result<Self, FramegrabError> {
        set_once(&mut self.source_url, url.into(), "source_url")?;
        Ok(self)
    }

    /// Records the resolved video identifier.
    pub fn with_video_id(mut self, video_id: VideoId) -> Result<Self, FramegrabError> {
        set_once(&mut self.video_id, video_id, "video_id")?;
        Ok(self)
    }

    /// Records the workspace paths.
    pub fn with_workspace(mut self, paths: WorkspacePaths) -> Result<Self, FramegrabError> {
        set_once(&mut self.output_dir, paths.output_dir, "output_dir")?;
        set_once(&mut self.video_path, paths.video_path, "video_path")?;
        set_once(&mut self.frame_dir, paths.frame_dir, "frame_dir")?;
        Ok(self)
    }

    /// Returns the run ID.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Returns the source URL, if recorded.
    #[must_use]
    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    /// Returns the video identifier.
    pub fn video_id(&self) -> Result<&VideoId, FramegrabError> {
        self.video_id
            .as_ref()
            .ok_or(FramegrabError::MissingContextField("video_id"))
    }

    /// Returns the per-video output directory.
    pub fn output_dir(&self) -> Result<&Path, FramegrabError> {
        self.output_dir
            .as_deref()
            .ok_or(FramegrabError::MissingContextField("output_dir"))
    }

    /// Returns the downloaded video path.
    pub fn video_path(&self) -> Result<&Path, FramegrabError> {
        self.video_path
            .as_deref()
            .ok_or(FramegrabError::MissingContextField("video_path"))
    }

    /// Returns the frame output directory.
    pub fn frame_dir(&self) -> Result<&Path, FramegrabError> {
        self.frame_dir
            .as_deref()
            .ok_or(FramegrabError::MissingContextField("frame_dir"))
    }
}
