//! Process runner with line-by-line output streaming.

use super::{OutputPolicy, ToolInvocation};
use crate::errors::{FramegrabError, ToolError};
use async_trait::async_trait;
use std::io;
use std::path::Path;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs one external process to completion.
///
/// Implementations resolve `Ok(())` only for exit code 0. A process that
/// cannot be started is a [`ToolError::Spawn`], distinct from a process
/// that ran and failed ([`ToolError::NonZeroExit`]).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Runs `invocation` and waits for it to exit.
    async fn run(&self, invocation: &ToolInvocation) -> Result<(), ToolError>;
}

/// Runs real processes with `tokio::process`.
///
/// There is no timeout: a child that never exits blocks the run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Creates a new process runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, invocation: &ToolInvocation) -> Result<(), ToolError> {
        run_process(invocation, tokio::io::stdout(), tokio::io::stderr()).await
    }
}

/// Spawns `invocation` and forwards its output into `stdout` and `stderr`.
///
/// The outcome is decided by the exit status. Failing to write forwarded
/// output is logged and never fails the run; only reading the child's pipes
/// or waiting on it can produce [`ToolError::Io`].
async fn run_process<O, E>(invocation: &ToolInvocation, stdout: O, stderr: E) -> Result<(), ToolError>
where
    O: AsyncWrite + Unpin,
    E: AsyncWrite + Unpin,
{
    let tool = invocation.tool_name();
    debug!(tool = %tool, command = %invocation.command_line(), "Spawning tool");

    let mut child = Command::new(&invocation.program)
        .args(&invocation.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| ToolError::spawn(&tool, source))?;

    let (stdout_result, stderr_result) = tokio::join!(
        forward_lines(child.stdout.take(), stdout, invocation.output, &tool, "stdout"),
        forward_lines(child.stderr.take(), stderr, invocation.output, &tool, "stderr"),
    );

    let status = child.wait().await.map_err(|source| ToolError::Io {
        tool: tool.clone(),
        source,
    })?;

    stdout_result
        .and(stderr_result)
        .map_err(|source| ToolError::Io {
            tool: tool.clone(),
            source,
        })?;

    if status.success() {
        debug!(tool = %tool, "Tool exited successfully");
        Ok(())
    } else {
        Err(ToolError::non_zero_exit(tool, status.code()))
    }
}

/// Forwards `reader` to `sink` one line at a time, or logs it when captured.
///
/// A failing sink stops forwarding but the reader is still drained, so the
/// child never blocks on a full pipe. Only read errors are returned.
async fn forward_lines<R, W>(
    reader: Option<R>,
    mut sink: W,
    policy: OutputPolicy,
    tool: &str,
    stream: &'static str,
) -> io::Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let Some(reader) = reader else {
        return Ok(());
    };

    let mut segments = BufReader::new(reader).split(b'\n');
    let mut forwarding = true;

    while let Some(mut segment) = segments.next_segment().await? {
        match policy {
            OutputPolicy::Inherit => {
                if !forwarding {
                    continue;
                }
                segment.push(b'\n');
                let written = async {
                    sink.write_all(&segment).await?;
                    sink.flush().await
                }
                .await;
                if let Err(err) = written {
                    warn!(tool, stream, error = %err, "Stopped forwarding tool output");
                    forwarding = false;
                }
            }
            OutputPolicy::Capture => {
                let line = String::from_utf8_lossy(&segment);
                debug!(tool, stream, "{}", line.trim_end());
            }
        }
    }

    Ok(())
}

/// Checks that a tool can be started and answers its probe arguments.
///
/// Output is captured so the probe stays off the console. Any failure is an
/// [`FramegrabError::Environment`] naming the tool.
pub async fn probe_tool(
    runner: &dyn ToolRunner,
    program: &Path,
    probe_args: &[String],
) -> Result<(), FramegrabError> {
    let invocation = ToolInvocation::new(program)
        .args(probe_args.iter().cloned())
        .with_output(OutputPolicy::Capture);
    let tool = invocation.tool_name();

    debug!(tool = %tool, "Probing tool");
    runner
        .run(&invocation)
        .await
        .map_err(|source| FramegrabError::Environment { tool, source })
}
