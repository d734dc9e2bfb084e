//! Tool invocation descriptors.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// What happens to a child process's stdout and stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputPolicy {
    /// Forward each line to the parent's stdout/stderr as it arrives.
    #[default]
    Inherit,
    /// Keep output off the console; lines are logged at debug level.
    Capture,
}

/// One external process call: executable, ordered arguments, output policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// The executable path or bare name resolved through `PATH`.
    pub program: PathBuf,
    /// Arguments in order.
    pub args: Vec<String>,
    /// Output handling.
    #[serde(default)]
    pub output: OutputPolicy,
}

impl ToolInvocation {
    /// Creates an invocation of `program` with no arguments.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            output: OutputPolicy::Inherit,
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends a path argument.
    #[must_use]
    pub fn path_arg(self, path: &Path) -> Self {
        self.arg(path.to_string_lossy().into_owned())
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Sets the output policy.
    #[must_use]
    pub fn with_output(mut self, output: OutputPolicy) -> Self {
        self.output = output;
        self
    }

    /// Returns the tool name used in logs and errors: the program's file name.
    #[must_use]
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map_or_else(|| self.program.to_string_lossy(), |name| name.to_string_lossy())
            .into_owned()
    }

    /// Returns a shell-like rendering for logs.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
