//! Error types for the framegrab pipeline.
//!
//! Every failure a run can end with is a [`FramegrabError`]. Failures of an
//! individual external process are [`ToolError`]s, which the stages wrap into
//! the pipeline-level variant that names what was being attempted. Problems
//! that must be reported but never abort a run are [`StageWarning`]s.

use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for framegrab operations.
#[derive(Debug, Error)]
pub enum FramegrabError {
    /// No URL was supplied on the command line or at the prompt.
    #[error("Please provide a video URL")]
    MissingUrl,

    /// No video identifier could be extracted from the input.
    #[error("Invalid video URL '{url}'. Please provide a valid video URL")]
    InvalidUrl {
        /// The rejected input.
        url: String,
    },

    /// A required external tool is missing or could not be probed.
    #[error("{tool} is not installed. Please install {tool} and try again")]
    Environment {
        /// The tool that failed the probe.
        tool: String,
        /// The underlying probe failure.
        #[source]
        source: ToolError,
    },

    /// An external process could not be started at all.
    #[error("Could not start {}", .0.tool())]
    Spawn(#[source] ToolError),

    /// The downloader exited with a failure.
    #[error("Failed to download video '{video_id}'")]
    DownloadFailed {
        /// The identifier (or raw URL) handed to the downloader last.
        video_id: String,
        /// The downloader failure.
        #[source]
        source: ToolError,
    },

    /// The transcoder exited with a failure.
    #[error("Failed to extract frames from {}", video_path.display())]
    ExtractionFailed {
        /// The video the transcoder was reading.
        video_path: PathBuf,
        /// The transcoder failure.
        #[source]
        source: ToolError,
    },

    /// A workspace directory could not be created.
    #[error("Failed to prepare directory {}", path.display())]
    Workspace {
        /// The directory being created.
        path: PathBuf,
        /// The filesystem error.
        #[source]
        source: io::Error,
    },

    /// A stage read a context field no earlier step populated.
    #[error("Pipeline context is missing '{0}'")]
    MissingContextField(&'static str),

    /// A step tried to overwrite a context field that was already populated.
    #[error("Pipeline context field '{0}' is already set")]
    ContextConflict(&'static str),

    /// The configuration could not be loaded.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl FramegrabError {
    /// Creates an invalid URL error.
    #[must_use]
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a workspace error for `path`.
    #[must_use]
    pub fn workspace(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Workspace {
            path: path.into(),
            source,
        }
    }

    /// Returns a stable short name for the kind of failure.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingUrl => "missing_url",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::Environment { .. } => "environment",
            Self::Spawn(_) => "spawn",
            Self::DownloadFailed { .. } => "download_failed",
            Self::ExtractionFailed { .. } => "extraction_failed",
            Self::Workspace { .. } => "workspace",
            Self::MissingContextField(_) | Self::ContextConflict(_) => "context",
            Self::Config(_) => "config",
        }
    }

    /// Converts to a dictionary representation for event payloads.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("kind".to_string(), serde_json::json!(self.kind()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));

        match self {
            Self::Environment { tool, source } => {
                map.insert("tool".to_string(), serde_json::json!(tool));
                map.insert("cause".to_string(), serde_json::json!(source.to_string()));
            }
            Self::Spawn(source) => {
                map.insert("tool".to_string(), serde_json::json!(source.tool()));
                map.insert("cause".to_string(), serde_json::json!(source.to_string()));
            }
            Self::DownloadFailed { video_id, source } => {
                map.insert("video_id".to_string(), serde_json::json!(video_id));
                map.insert("exit_code".to_string(), serde_json::json!(source.exit_code()));
            }
            Self::ExtractionFailed { video_path, source } => {
                map.insert(
                    "video_path".to_string(),
                    serde_json::json!(video_path.display().to_string()),
                );
                map.insert("exit_code".to_string(), serde_json::json!(source.exit_code()));
            }
            _ => {}
        }

        map
    }
}

/// Errors raised while running one external process.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The process could not be started (not found, not executable).
    #[error("Failed to start {tool}: {source}")]
    Spawn {
        /// The tool name.
        tool: String,
        /// The spawn error.
        #[source]
        source: io::Error,
    },

    /// The process ran and terminated unsuccessfully.
    #[error("{tool} exited with {}", exit_label(.code))]
    NonZeroExit {
        /// The tool name.
        tool: String,
        /// The exit code, `None` when the process was killed by a signal.
        code: Option<i32>,
    },

    /// Forwarding the process output or waiting on it failed.
    #[error("I/O error while running {tool}: {source}")]
    Io {
        /// The tool name.
        tool: String,
        /// The I/O error.
        #[source]
        source: io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

impl ToolError {
    /// Creates a spawn error.
    #[must_use]
    pub fn spawn(tool: impl Into<String>, source: io::Error) -> Self {
        Self::Spawn {
            tool: tool.into(),
            source,
        }
    }

    /// Creates a nonzero exit error.
    #[must_use]
    pub fn non_zero_exit(tool: impl Into<String>, code: Option<i32>) -> Self {
        Self::NonZeroExit {
            tool: tool.into(),
            code,
        }
    }

    /// Returns the name of the tool that failed.
    #[must_use]
    pub fn tool(&self) -> &str {
        match self {
            Self::Spawn { tool, .. } | Self::NonZeroExit { tool, .. } | Self::Io { tool, .. } => {
                tool
            }
        }
    }

    /// Returns the exit code, if the process ran to completion with one.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { code, .. } => *code,
            _ => None,
        }
    }

    /// Returns true if the process never started.
    #[must_use]
    pub fn is_spawn(&self) -> bool {
        matches!(self, Self::Spawn { .. })
    }
}

/// Non-fatal problems surfaced alongside a successful stage.
#[derive(Debug, Error)]
pub enum StageWarning {
    /// The intermediate video could not be removed.
    #[error("Could not remove {}: {source}", path.display())]
    Cleanup {
        /// The file that should have been removed.
        path: PathBuf,
        /// The filesystem error.
        #[source]
        source: io::Error,
    },
}

impl StageWarning {
    /// Creates a cleanup warning.
    #[must_use]
    pub fn cleanup(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Cleanup {
            path: path.into(),
            source,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        match self {
            Self::Cleanup { path, .. } => {
                map.insert("type".to_string(), serde_json::json!("CleanupWarning"));
                map.insert("path".to_string(), serde_json::json!(path.display().to_string()));
            }
        }
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map
    }
}
