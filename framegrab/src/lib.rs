//! # Framegrab
//!
//! Downloads a single online video and extracts one representative still
//! frame per second of playback into a per-video directory.
//!
//! The work is delegated to two external tools, a downloader (`yt-dlp`) and
//! a transcoder (`ffmpeg`), driven as a strictly sequential pipeline:
//!
//! - **Preflight**: both tools must start and answer a version probe
//! - **Identifier**: the video ID is parsed out of the URL
//! - **Workspace**: `<root>/<id>/` is created if absent
//! - **Stages**: download, extract, then remove the intermediate video
//!
//! Any failure stops the run. Every state transition is published to an
//! [`events::EventSink`].
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use framegrab::prelude::*;
//! use std::sync::Arc;
//!
//! let config = Config::load(None)?;
//! let orchestrator = PipelineOrchestrator::new(&config, Arc::new(ProcessRunner::new()));
//!
//! let report = orchestrator.run("https://www.youtube.com/watch?v=abc123").await?;
//! println!("{}", render_success(&report));
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod identifier;
pub mod pipeline;
pub mod stages;
pub mod testing;
pub mod tools;
pub mod workspace;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, ExtractionOptions, ToolConfig};
    pub use crate::context::{PipelineContext, WorkspacePaths};
    pub use crate::core::{ExecutionMode, PipelineState, StageOutput};
    pub use crate::errors::{FramegrabError, StageWarning, ToolError};
    pub use crate::events::{
        CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink, PipelineEvent,
    };
    pub use crate::identifier::{parse_video_id, VideoId};
    pub use crate::pipeline::{
        render_failure, render_success, PipelineFailure, PipelineOrchestrator, PipelineReport,
    };
    pub use crate::stages::{CleanupStage, DownloadStage, ExtractionStage, Stage};
    pub use crate::tools::{ProcessRunner, ToolInvocation, ToolRunner};
    pub use crate::workspace::{ensure_workspace, WorkspaceLayout};
}
