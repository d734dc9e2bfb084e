//! Stage output type.

use crate::context::PipelineContext;
use crate::errors::StageWarning;

/// The successful result of a stage.
///
/// Carries the next version of the pipeline context and any non-fatal
/// warnings the stage produced. Failures are returned as errors instead,
/// so there is no partially successful output.
#[derive(Debug)]
pub struct StageOutput {
    /// The context handed to the next stage.
    pub context: PipelineContext,
    /// Warnings raised while the stage still succeeded.
    pub warnings: Vec<StageWarning>,
}

impl StageOutput {
    /// Creates an output with no warnings.
    #[must_use]
    pub fn ok(context: PipelineContext) -> Self {
        Self {
            context,
            warnings: Vec::new(),
        }
    }

    /// Adds a warning.
    #[must_use]
    pub fn with_warning(mut self, warning: StageWarning) -> Self {
        self.warnings.push(warning);
        self
    }

    /// Returns true if any warnings were raised.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use uuid::Uuid;

    #[test]
    fn test_output_ok() {
        let output = StageOutput::ok(PipelineContext::new(Uuid::new_v4()));
        assert!(!output.has_warnings());
    }

    #[test]
    fn test_output_with_warning() {
        let output = StageOutput::ok(PipelineContext::new(Uuid::new_v4()))
            .with_warning(StageWarning::cleanup("a.webm", io::ErrorKind::NotFound.into()));
        assert!(output.has_warnings());
        assert_eq!(output.warnings.len(), 1);
    }
}
