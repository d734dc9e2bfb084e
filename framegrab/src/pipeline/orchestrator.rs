//! The pipeline driver loop.

use super::report::{PipelineFailure, PipelineReport};
use crate::config::Config;
use crate::context::PipelineContext;
use crate::core::PipelineState;
use crate::errors::{FramegrabError, StageWarning};
use crate::events::{
    EventSink, NoOpEventSink, PipelineEvent, PIPELINE_COMPLETED, PIPELINE_FAILED,
    PIPELINE_STARTED, STAGE_COMPLETED, STAGE_FAILED, STAGE_STARTED, STAGE_WARNING, STATE_CHANGED,
};
use crate::identifier::parse_video_id;
use crate::stages::{CleanupStage, DownloadStage, ExtractionStage, Stage};
use crate::tools::{probe_tool, ToolRunner};
use crate::workspace::WorkspaceLayout;
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Builds the download, extract, cleanup stage list for `config`.
#[must_use]
pub fn default_stages(config: &Config, runner: &Arc<dyn ToolRunner>) -> Vec<Arc<dyn Stage>> {
    vec![
        Arc::new(
            DownloadStage::new(Arc::clone(runner), config.downloader_program())
                .with_fallback_to_url(config.download_fallback),
        ),
        Arc::new(
            ExtractionStage::new(Arc::clone(runner), config.transcoder_program())
                .with_options(config.extraction.clone()),
        ),
        Arc::new(CleanupStage::new()),
    ]
}

/// A resolved external tool for the preflight.
#[derive(Debug, Clone)]
struct ProbeTarget {
    program: PathBuf,
    probe_args: Vec<String>,
}

/// Tracks and announces state transitions for one run.
struct RunTracker<'a> {
    run_id: Uuid,
    state: PipelineState,
    transitions: Vec<PipelineState>,
    sink: &'a dyn EventSink,
}

impl<'a> RunTracker<'a> {
    fn new(run_id: Uuid, sink: &'a dyn EventSink) -> Self {
        Self {
            run_id,
            state: PipelineState::Idle,
            transitions: vec![PipelineState::Idle],
            sink,
        }
    }

    fn advance(&mut self, to: PipelineState) {
        if !self.state.can_transition_to(to) {
            warn!(from = %self.state, to = %to, "Unexpected pipeline transition");
        }
        self.emit(
            STATE_CHANGED,
            serde_json::json!({"from": self.state, "to": to}),
        );
        self.state = to;
        self.transitions.push(to);
    }

    fn fail(mut self, error: FramegrabError) -> PipelineFailure {
        let failed_from = self.state;
        error!(
            run_id = %self.run_id,
            state = %failed_from,
            kind = error.kind(),
            error = %error,
            "Pipeline failed"
        );
        self.advance(PipelineState::Failed);
        self.emit(PIPELINE_FAILED, serde_json::json!(error.to_dict()));

        PipelineFailure {
            run_id: self.run_id,
            failed_from,
            error,
            transitions: self.transitions,
        }
    }

    fn emit(&self, event_type: &'static str, data: serde_json::Value) {
        self.sink
            .emit(&PipelineEvent::new(event_type, self.run_id, data));
    }
}

/// Runs the whole pipeline for one URL.
///
/// The run is strictly sequential: preflight, identifier, workspace, then
/// each stage in order. The first failure moves the run to `Failed` and no
/// later step runs.
pub struct PipelineOrchestrator {
    runner: Arc<dyn ToolRunner>,
    layout: WorkspaceLayout,
    probes: [ProbeTarget; 2],
    stages: Vec<Arc<dyn Stage>>,
    event_sink: Arc<dyn EventSink>,
}

impl PipelineOrchestrator {
    /// Creates an orchestrator with the default stages.
    #[must_use]
    pub fn new(config: &Config, runner: Arc<dyn ToolRunner>) -> Self {
        let stages = default_stages(config, &runner);
        let probes = [
            ProbeTarget {
                program: config.downloader_program(),
                probe_args: config.downloader.probe_args.clone(),
            },
            ProbeTarget {
                program: config.transcoder_program(),
                probe_args: config.transcoder.probe_args.clone(),
            },
        ];

        Self {
            runner,
            layout: WorkspaceLayout::new(&config.output_root)
                .with_frames_subdir(config.extraction.frames_subdir.clone()),
            probes,
            stages,
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the event sink.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Replaces the stage list.
    #[must_use]
    pub fn with_stages(mut self, stages: Vec<Arc<dyn Stage>>) -> Self {
        self.stages = stages;
        self
    }

    /// Returns the stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Runs the pipeline for `url`.
    pub async fn run(&self, url: &str) -> Result<PipelineReport, PipelineFailure> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let mut tracker = RunTracker::new(run_id, self.event_sink.as_ref());

        info!(run_id = %run_id, url = %url, "Pipeline started");
        tracker.emit(PIPELINE_STARTED, serde_json::json!({"url": url}));

        match self.drive(url, run_id, &mut tracker).await {
            Ok((context, warnings)) => {
                let resolved = context
                    .video_id()
                    .cloned()
                    .and_then(|id| Ok((id, context.frame_dir()?.to_path_buf())));
                let (video_id, frame_dir) = match resolved {
                    Ok(resolved) => resolved,
                    Err(error) => return Err(tracker.fail(error)),
                };
                tracker.advance(PipelineState::Done);

                let report = PipelineReport {
                    run_id,
                    video_id,
                    frame_dir,
                    context,
                    warnings,
                    transitions: tracker.transitions.clone(),
                    started_at,
                    finished_at: Utc::now(),
                };

                info!(
                    run_id = %run_id,
                    frame_dir = %report.frame_dir.display(),
                    warnings = report.warnings.len(),
                    duration_ms = report.duration_ms(),
                    "Pipeline completed"
                );
                tracker.emit(
                    PIPELINE_COMPLETED,
                    serde_json::json!({
                        "video_id": report.video_id,
                        "frame_dir": report.frame_dir.display().to_string(),
                        "warnings": report.warnings.len(),
                        "duration_ms": report.duration_ms(),
                    }),
                );

                Ok(report)
            }
            Err(error) => Err(tracker.fail(error)),
        }
    }

    async fn drive(
        &self,
        url: &str,
        run_id: Uuid,
        tracker: &mut RunTracker<'_>,
    ) -> Result<(PipelineContext, Vec<StageWarning>), FramegrabError> {
        self.preflight().await?;
        tracker.advance(PipelineState::EnvironmentChecked);

        let video_id = parse_video_id(url)?;
        info!(video_id = %video_id, "Resolved video identifier");
        tracker.advance(PipelineState::IdentifierResolved);

        let paths = self.layout.ensure(&video_id).await?;
        tracker.advance(PipelineState::WorkspaceReady);

        let mut ctx = PipelineContext::new(run_id)
            .with_source_url(url.trim())?
            .with_video_id(video_id)?
            .with_workspace(paths)?;
        let mut warnings = Vec::new();

        for stage in &self.stages {
            tracker.emit(STAGE_STARTED, serde_json::json!({"stage": stage.name()}));

            let output = match stage.execute(ctx).await {
                Ok(output) => output,
                Err(err) => {
                    tracker.emit(
                        STAGE_FAILED,
                        serde_json::json!({"stage": stage.name(), "error": err.to_dict()}),
                    );
                    return Err(err);
                }
            };

            for warning in &output.warnings {
                warn!(stage = stage.name(), warning = %warning, "Stage warning");
                tracker.emit(
                    STAGE_WARNING,
                    serde_json::json!({"stage": stage.name(), "warning": warning.to_dict()}),
                );
            }
            tracker.emit(STAGE_COMPLETED, serde_json::json!({"stage": stage.name()}));
            tracker.advance(stage.completes());

            warnings.extend(output.warnings);
            ctx = output.context;
        }

        Ok((ctx, warnings))
    }

    async fn preflight(&self) -> Result<(), FramegrabError> {
        for probe in &self.probes {
            probe_tool(self.runner.as_ref(), &probe.program, &probe.probe_args).await?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for PipelineOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineOrchestrator")
            .field("layout", &self.layout)
            .field("probes", &self.probes)
            .field("stages", &self.stage_names())
            .finish()
    }
}
