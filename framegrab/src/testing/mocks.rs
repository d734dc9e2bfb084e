//! Scripted runners and stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use crate::context::PipelineContext;
use crate::core::{PipelineState, StageOutput};
use crate::errors::{FramegrabError, ToolError};
use crate::stages::{Stage, FRAME_PATTERN};
use crate::tools::{OutputPolicy, ToolInvocation, ToolRunner};

#[derive(Debug, Clone, Copy)]
enum Script {
    Exit { code: i32, remaining: Option<usize> },
    Missing,
}

/// A [`ToolRunner`] that never spawns anything.
///
/// Every invocation is recorded. Tools succeed unless scripted otherwise,
/// matched by the file name of the program. With [`Self::create_outputs`]
/// a successful downloader writes an empty file at its `-o` target and a
/// successful transcoder writes `1.png` next to its frame pattern.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    scripts: Mutex<HashMap<String, Script>>,
    invocations: Mutex<Vec<ToolInvocation>>,
    create_outputs: bool,
}

impl ScriptedRunner {
    /// Creates a runner where every tool succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes successful runs write their output files.
    #[must_use]
    pub fn create_outputs(mut self, enabled: bool) -> Self {
        self.create_outputs = enabled;
        self
    }

    /// Makes every non-probe run of `program` exit with `code`.
    #[must_use]
    pub fn fail_program(self, program: &str, code: i32) -> Self {
        self.scripts.lock().insert(
            program.to_string(),
            Script::Exit { code, remaining: None },
        );
        self
    }

    /// Makes only the next non-probe run of `program` exit with `code`.
    #[must_use]
    pub fn fail_program_once(self, program: &str, code: i32) -> Self {
        self.scripts.lock().insert(
            program.to_string(),
            Script::Exit { code, remaining: Some(1) },
        );
        self
    }

    /// Makes `program` impossible to start, probes included.
    #[must_use]
    pub fn missing_program(self, program: &str) -> Self {
        self.scripts.lock().insert(program.to_string(), Script::Missing);
        self
    }

    /// Wraps the runner for [`crate::pipeline::PipelineOrchestrator::new`].
    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Returns every recorded invocation in order.
    #[must_use]
    pub fn invocations(&self) -> Vec<ToolInvocation> {
        self.invocations.lock().clone()
    }

    /// Returns the non-probe invocations of `program`.
    #[must_use]
    pub fn invocations_of(&self, program: &str) -> Vec<ToolInvocation> {
        self.invocations
            .lock()
            .iter()
            .filter(|inv| inv.tool_name() == program && inv.output != OutputPolicy::Capture)
            .cloned()
            .collect()
    }

    /// Returns the recorded probe invocations.
    #[must_use]
    pub fn probes(&self) -> Vec<ToolInvocation> {
        self.invocations
            .lock()
            .iter()
            .filter(|inv| inv.output == OutputPolicy::Capture)
            .cloned()
            .collect()
    }

    fn scripted_result(&self, invocation: &ToolInvocation) -> Result<(), ToolError> {
        let tool = invocation.tool_name();
        let mut scripts = self.scripts.lock();
        let Some(script) = scripts.get_mut(&tool) else {
            return Ok(());
        };

        match script {
            Script::Missing => Err(ToolError::spawn(
                &tool,
                io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
            )),
            Script::Exit { .. } if invocation.output == OutputPolicy::Capture => Ok(()),
            Script::Exit { remaining: Some(0), .. } => Ok(()),
            Script::Exit { code, remaining } => {
                let code = *code;
                if let Some(left) = remaining {
                    *left -= 1;
                }
                Err(ToolError::non_zero_exit(&tool, Some(code)))
            }
        }
    }

    async fn write_outputs(invocation: &ToolInvocation) -> Result<(), ToolError> {
        let tool = invocation.tool_name();
        let io_error = |source| ToolError::Io { tool: tool.clone(), source };

        if let Some(pos) = invocation.args.iter().position(|a| a == "-o") {
            if let Some(target) = invocation.args.get(pos + 1) {
                tokio::fs::write(target, b"").await.map_err(io_error)?;
            }
        }
        if let Some(pattern) = invocation.args.last().filter(|a| a.ends_with(FRAME_PATTERN)) {
            let frame = PathBuf::from(pattern).with_file_name("1.png");
            tokio::fs::write(frame, b"").await.map_err(io_error)?;
        }
        Ok(())
    }
}

#[async_trait]
impl ToolRunner for ScriptedRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<(), ToolError> {
        self.invocations.lock().push(invocation.clone());
        self.scripted_result(invocation)?;

        if self.create_outputs && invocation.output != OutputPolicy::Capture {
            Self::write_outputs(invocation).await?;
        }
        Ok(())
    }
}

/// A stage that appends its name to a shared log.
///
/// Fails with a download error when built with [`Self::failing`].
#[derive(Debug)]
pub struct RecordingStage {
    name: String,
    completes: PipelineState,
    log: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl RecordingStage {
    /// Creates a stage that succeeds and moves the run to `completes`.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        completes: PipelineState,
        log: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            name: name.into(),
            completes,
            log,
            fail: false,
        }
    }

    /// Makes the stage fail after logging.
    #[must_use]
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    fn completes(&self) -> PipelineState {
        self.completes
    }

    async fn execute(&self, ctx: PipelineContext) -> Result<StageOutput, FramegrabError> {
        self.log.lock().push(self.name.clone());
        if self.fail {
            return Err(FramegrabError::DownloadFailed {
                video_id: ctx.video_id()?.to_string(),
                source: ToolError::non_zero_exit(&self.name, Some(1)),
            });
        }
        Ok(StageOutput::ok(ctx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_runner_records_and_fails() {
        let runner = ScriptedRunner::new().fail_program_once("yt-dlp", 2);
        let download = ToolInvocation::new("yt-dlp").arg("abc123");

        let first = runner.run(&download).await.unwrap_err();
        assert_eq!(first.exit_code(), Some(2));
        assert!(runner.run(&download).await.is_ok());
        assert_eq!(runner.invocations_of("yt-dlp").len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_runner_probes_pass_exit_scripts() {
        let runner = ScriptedRunner::new().fail_program("ffmpeg", 1);
        let probe = ToolInvocation::new("ffmpeg")
            .arg("-version")
            .with_output(OutputPolicy::Capture);

        assert!(runner.run(&probe).await.is_ok());
        assert_eq!(runner.probes().len(), 1);
        assert!(runner.invocations_of("ffmpeg").is_empty());
    }

    #[tokio::test]
    async fn test_scripted_runner_missing_program() {
        let runner = ScriptedRunner::new().missing_program("yt-dlp");
        let err = runner.run(&ToolInvocation::new("yt-dlp")).await.unwrap_err();
        assert!(err.is_spawn());
    }
}
