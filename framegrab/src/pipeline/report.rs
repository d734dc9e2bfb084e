//! Run reports and their terminal rendering.

use crate::context::PipelineContext;
use crate::core::{ExecutionMode, PipelineState};
use crate::errors::{FramegrabError, StageWarning};
use crate::identifier::VideoId;
use chrono::{DateTime, Utc};
use std::error::Error as _;
use std::fmt::Write as _;
use std::path::PathBuf;
use thiserror::Error;
use uuid::Uuid;

/// The outcome of a run that reached `Done`.
#[derive(Debug)]
pub struct PipelineReport {
    /// The run ID.
    pub run_id: Uuid,
    /// The resolved video identifier.
    pub video_id: VideoId,
    /// Where the frames were written.
    pub frame_dir: PathBuf,
    /// The final context.
    pub context: PipelineContext,
    /// Non-fatal warnings collected along the way.
    pub warnings: Vec<StageWarning>,
    /// Every state the run entered, starting with `Idle`.
    pub transitions: Vec<PipelineState>,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
}

impl PipelineReport {
    /// Returns the state the run ended in.
    #[must_use]
    pub fn final_state(&self) -> PipelineState {
        self.transitions.last().copied().unwrap_or_default()
    }

    /// Returns the wall-clock duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// The outcome of a run that reached `Failed`.
#[derive(Debug, Error)]
#[error("Pipeline failed after reaching '{failed_from}'")]
pub struct PipelineFailure {
    /// The run ID.
    pub run_id: Uuid,
    /// The last state reached before the failure.
    pub failed_from: PipelineState,
    /// The failure that aborted the run.
    #[source]
    pub error: FramegrabError,
    /// Every state the run entered, ending with `Failed`.
    pub transitions: Vec<PipelineState>,
}

impl PipelineFailure {
    /// Returns the failure kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.error.kind()
    }

    /// Returns true if the run passed through `state` before failing.
    #[must_use]
    pub fn reached(&self, state: PipelineState) -> bool {
        self.transitions.contains(&state)
    }
}

/// Renders the success message and any warnings.
#[must_use]
pub fn render_success(report: &PipelineReport) -> String {
    let mut out = format!("Success: frames saved to {}", report.frame_dir.display());
    for warning in &report.warnings {
        let _ = write!(out, "\nwarning: {warning}");
    }
    out
}

/// Renders a failure for the terminal.
///
/// Production mode prints the kind and message only. Development mode adds
/// the full cause chain and the debug form of the error.
#[must_use]
pub fn render_failure(error: &FramegrabError, mode: ExecutionMode) -> String {
    let mut out = format!("{}: {error}", error.kind());
    if mode.is_production() {
        return out;
    }

    let mut cause = error.source();
    while let Some(err) = cause {
        let _ = write!(out, "\n  caused by: {err}");
        cause = err.source();
    }
    let _ = write!(out, "\n\n{error:#?}");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ToolError;

    fn download_failure() -> FramegrabError {
        FramegrabError::DownloadFailed {
            video_id: "abc123".to_string(),
            source: ToolError::non_zero_exit("yt-dlp", Some(1)),
        }
    }

    #[test]
    fn test_render_failure_production_is_terse() {
        let text = render_failure(&download_failure(), ExecutionMode::Production);
        assert_eq!(text, "download_failed: Failed to download video 'abc123'");
    }

    #[test]
    fn test_render_failure_development_has_detail() {
        let text = render_failure(&download_failure(), ExecutionMode::Development);

        assert!(text.starts_with("download_failed: Failed to download video 'abc123'"));
        assert!(text.contains("caused by: yt-dlp exited with code 1"));
        assert!(text.contains("DownloadFailed"));
    }

    #[test]
    fn test_render_success_lists_warnings() {
        let report = PipelineReport {
            run_id: Uuid::new_v4(),
            video_id: "https://youtu.be/abc123".parse().unwrap(),
            frame_dir: PathBuf::from("./output/abc123"),
            context: PipelineContext::new(Uuid::new_v4()),
            warnings: vec![StageWarning::cleanup(
                "./output/abc123/abc123.webm",
                std::io::ErrorKind::NotFound.into(),
            )],
            transitions: vec![PipelineState::Idle, PipelineState::Done],
            started_at: Utc::now(),
            finished_at: Utc::now(),
        };

        let text = render_success(&report);
        assert!(text.starts_with("Success: frames saved to ./output/abc123"));
        assert!(text.contains("\nwarning: Could not remove ./output/abc123/abc123.webm"));
        assert_eq!(report.final_state(), PipelineState::Done);
    }
}
