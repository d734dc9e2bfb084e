//! On-disk output layout for a video.

use crate::context::WorkspacePaths;
use crate::errors::FramegrabError;
use crate::identifier::VideoId;
use std::path::{Path, PathBuf};
use tracing::debug;

/// File extension of the intermediate download.
pub const VIDEO_EXTENSION: &str = "webm";

/// Computes and creates the per-video directory tree.
///
/// The layout is `<root>/<id>/<id>.webm` for the download and either
/// `<root>/<id>` or `<root>/<id>/<frames_subdir>` for frames.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    root: PathBuf,
    frames_subdir: Option<String>,
}

impl WorkspaceLayout {
    /// Creates a layout rooted at `root` that writes frames next to the video.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            frames_subdir: None,
        }
    }

    /// Writes frames into a subdirectory of the video directory.
    #[must_use]
    pub fn with_frames_subdir(mut self, subdir: Option<String>) -> Self {
        self.frames_subdir = subdir.filter(|s| !s.is_empty());
        self
    }

    /// Computes the paths for `video_id` without touching the filesystem.
    #[must_use]
    pub fn paths(&self, video_id: &VideoId) -> WorkspacePaths {
        let output_dir = self.root.join(video_id.as_str());
        let video_path = output_dir.join(format!("{video_id}.{VIDEO_EXTENSION}"));
        let frame_dir = match self.frames_subdir {
            Some(ref subdir) => output_dir.join(subdir),
            None => output_dir.clone(),
        };

        WorkspacePaths {
            output_dir,
            video_path,
            frame_dir,
        }
    }

    /// Creates `root` and `root/<id>` if absent and returns the paths.
    ///
    /// Idempotent. The frame directory is left for the extraction stage to
    /// create, so a failed download leaves no empty frame directory behind.
    pub async fn ensure(&self, video_id: &VideoId) -> Result<WorkspacePaths, FramegrabError> {
        let paths = self.paths(video_id);

        create_dir_if_missing(&self.root).await?;
        create_dir_if_missing(&paths.output_dir).await?;

        debug!(
            video_id = %video_id,
            output_dir = %paths.output_dir.display(),
            "Workspace ready"
        );
        Ok(paths)
    }
}

/// Ensures the default layout under `root` exists for `video_id`.
pub async fn ensure_workspace(
    root: &Path,
    video_id: &VideoId,
) -> Result<WorkspacePaths, FramegrabError> {
    WorkspaceLayout::new(root).ensure(video_id).await
}

async fn create_dir_if_missing(dir: &Path) -> Result<(), FramegrabError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| FramegrabError::workspace(dir, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::parse_video_id;

    fn video_id() -> VideoId {
        parse_video_id("https://youtu.be/abc123").unwrap()
    }

    #[test]
    fn test_paths_default_layout() {
        let paths = WorkspaceLayout::new("./output").paths(&video_id());

        assert_eq!(paths.output_dir, Path::new("./output/abc123"));
        assert_eq!(paths.video_path, Path::new("./output/abc123/abc123.webm"));
        assert_eq!(paths.frame_dir, Path::new("./output/abc123"));
    }

    #[test]
    fn test_paths_with_frames_subdir() {
        let paths = WorkspaceLayout::new("./output")
            .with_frames_subdir(Some("frames".to_string()))
            .paths(&video_id());
        assert_eq!(paths.frame_dir, Path::new("./output/abc123/frames"));

        let empty = WorkspaceLayout::new("./output")
            .with_frames_subdir(Some(String::new()))
            .paths(&video_id());
        assert_eq!(empty.frame_dir, Path::new("./output/abc123"));
    }

    #[tokio::test]
    async fn test_ensure_creates_directories() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("output");

        let paths = ensure_workspace(&root, &video_id()).await.unwrap();

        assert!(root.is_dir());
        assert!(paths.output_dir.is_dir());
        assert!(!paths.video_path.exists());
    }

    #[tokio::test]
    async fn test_ensure_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("output");

        let first = ensure_workspace(&root, &video_id()).await.unwrap();
        std::fs::write(first.output_dir.join("keep.txt"), b"x").unwrap();
        let second = ensure_workspace(&root, &video_id()).await.unwrap();

        assert_eq!(first, second);
        assert!(second.output_dir.join("keep.txt").exists());
    }

    #[tokio::test]
    async fn test_ensure_does_not_create_frame_subdir() {
        let tmp = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::new(tmp.path().join("output"))
            .with_frames_subdir(Some("frames".to_string()));

        let paths = layout.ensure(&video_id()).await.unwrap();
        assert!(!paths.frame_dir.exists());
    }

    #[tokio::test]
    async fn test_ensure_reports_blocked_root() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path().join("output");
        std::fs::write(&root, b"not a directory").unwrap();

        let err = ensure_workspace(&root, &video_id()).await.unwrap_err();
        assert!(matches!(err, FramegrabError::Workspace { .. }));
    }
}
