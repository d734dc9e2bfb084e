//! Pipeline state and execution mode enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The states a pipeline run moves through.
///
/// Runs advance strictly left to right:
/// `Idle → EnvironmentChecked → IdentifierResolved → WorkspaceReady →
/// Downloaded → Extracted → CleanedUp → Done`. `Failed` is reachable from
/// every non-terminal state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    /// Nothing has run yet.
    #[default]
    Idle,
    /// Both external tools answered their probe.
    EnvironmentChecked,
    /// A video identifier was extracted from the input URL.
    IdentifierResolved,
    /// The per-video output directory exists.
    WorkspaceReady,
    /// The video file is on disk.
    Downloaded,
    /// Frame images were written.
    Extracted,
    /// The intermediate video was removed (or a warning was recorded).
    CleanedUp,
    /// The run finished successfully.
    Done,
    /// The run aborted.
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::EnvironmentChecked => write!(f, "environment_checked"),
            Self::IdentifierResolved => write!(f, "identifier_resolved"),
            Self::WorkspaceReady => write!(f, "workspace_ready"),
            Self::Downloaded => write!(f, "downloaded"),
            Self::Extracted => write!(f, "extracted"),
            Self::CleanedUp => write!(f, "cleaned_up"),
            Self::Done => write!(f, "done"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl PipelineState {
    /// Returns the state that follows this one on the success path.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::EnvironmentChecked),
            Self::EnvironmentChecked => Some(Self::IdentifierResolved),
            Self::IdentifierResolved => Some(Self::WorkspaceReady),
            Self::WorkspaceReady => Some(Self::Downloaded),
            Self::Downloaded => Some(Self::Extracted),
            Self::Extracted => Some(Self::CleanedUp),
            Self::CleanedUp => Some(Self::Done),
            Self::Done | Self::Failed => None,
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if `to` is a legal transition from this state.
    #[must_use]
    pub fn can_transition_to(self, to: Self) -> bool {
        if self.is_terminal() {
            return false;
        }
        to == Self::Failed || self.next() == Some(to)
    }
}

/// Controls how much detail failure reports contain.
///
/// The mode never changes what the pipeline does.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Full diagnostic detail on failure.
    #[default]
    Development,
    /// Kind and message only.
    Production,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl ExecutionMode {
    /// Interprets an environment value; only `production` selects production.
    #[must_use]
    pub fn from_env_value(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("production") {
            Self::Production
        } else {
            Self::Development
        }
    }

    /// Returns true in production mode.
    #[must_use]
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path_order() {
        let mut state = PipelineState::Idle;
        let mut visited = vec![state];
        while let Some(next) = state.next() {
            assert!(state.can_transition_to(next));
            visited.push(next);
            state = next;
        }

        assert_eq!(
            visited,
            vec![
                PipelineState::Idle,
                PipelineState::EnvironmentChecked,
                PipelineState::IdentifierResolved,
                PipelineState::WorkspaceReady,
                PipelineState::Downloaded,
                PipelineState::Extracted,
                PipelineState::CleanedUp,
                PipelineState::Done,
            ]
        );
    }

    #[test]
    fn test_failed_reachable_from_non_terminal() {
        assert!(PipelineState::Idle.can_transition_to(PipelineState::Failed));
        assert!(PipelineState::Downloaded.can_transition_to(PipelineState::Failed));
        assert!(!PipelineState::Done.can_transition_to(PipelineState::Failed));
        assert!(!PipelineState::Failed.can_transition_to(PipelineState::Failed));
    }

    #[test]
    fn test_no_skipping_states() {
        assert!(!PipelineState::WorkspaceReady.can_transition_to(PipelineState::Extracted));
        assert!(!PipelineState::Idle.can_transition_to(PipelineState::Done));
    }

    #[test]
    fn test_defaults() {
        assert_eq!(PipelineState::default(), PipelineState::Idle);
        assert_eq!(ExecutionMode::default(), ExecutionMode::Development);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PipelineState::EnvironmentChecked.to_string(), "environment_checked");
        assert_eq!(PipelineState::CleanedUp.to_string(), "cleaned_up");
    }

    #[test]
    fn test_execution_mode_from_env_value() {
        assert_eq!(ExecutionMode::from_env_value("production"), ExecutionMode::Production);
        assert_eq!(ExecutionMode::from_env_value(" Production "), ExecutionMode::Production);
        assert_eq!(ExecutionMode::from_env_value("staging"), ExecutionMode::Development);
        assert_eq!(ExecutionMode::from_env_value(""), ExecutionMode::Development);
    }
}
