//! External tool execution.
//!
//! This module provides:
//! - [`ToolInvocation`] descriptors for one process call
//! - The [`ToolRunner`] seam the stages run tools through
//! - [`ProcessRunner`], which spawns real processes and streams their output
//! - [`probe_tool`] for the environment preflight

mod invocation;
mod runner;

pub use invocation::{OutputPolicy, ToolInvocation};
#[cfg(test)]
pub use runner::MockToolRunner;
pub use runner::{probe_tool, ProcessRunner, ToolRunner};
