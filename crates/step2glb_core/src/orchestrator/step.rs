//! Pipeline step trait definition.
//!
//! All pipeline steps implement this trait, providing a consistent
//! interface for validation and execution.

use super::errors::StepResult;
use super::types::{Context, JobState};

/// Trait for pipeline steps.
///
/// The pipeline runner calls these methods in order:
///
/// 1. `validate_input` - Check preconditions before any tool is launched
/// 2. `execute` - Run the tool and record results in `JobState`
/// 3. `validate_output` - Verify the tool actually produced its file
///
/// # Example
///
/// ```ignore
/// struct TouchStep { path: PathBuf }
///
/// impl PipelineStep for TouchStep {
///     fn name(&self) -> &str { "Touch" }
///
///     fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
///         Ok(())
///     }
///
///     fn execute(&self, _ctx: &Context, _state: &mut JobState) -> StepResult<()> {
///         std::fs::write(&self.path, b"x").map_err(|e| StepError::io_error("touch", e))
///     }
///
///     fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
///         if !self.path.exists() {
///             return Err(StepError::missing_output("touch", self.path.display().to_string()));
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait PipelineStep: Send + Sync {
    /// Get the step name (for logging and error context).
    fn name(&self) -> &str;

    /// Validate inputs before execution.
    ///
    /// Should check that input files exist with the right kind and that
    /// the external tool is available.
    fn validate_input(&self, ctx: &Context) -> StepResult<()>;

    /// Execute the step's main work and record results in `state`.
    fn execute(&self, ctx: &Context, state: &mut JobState) -> StepResult<()>;

    /// Validate outputs after execution.
    ///
    /// A tool that exits 0 without writing its file still fails here.
    fn validate_output(&self, ctx: &Context, state: &JobState) -> StepResult<()>;

    /// Human-readable description of what this step does.
    fn description(&self) -> &str {
        self.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct MockStep {
        name: &'static str,
    }

    impl PipelineStep for MockStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context) -> StepResult<()> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> StepResult<()> {
            Ok(())
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> StepResult<()> {
            Ok(())
        }
    }

    #[test]
    fn step_trait_object_works() {
        let step: Box<dyn PipelineStep> = Box::new(MockStep { name: "TestStep" });

        assert_eq!(step.name(), "TestStep");
        assert_eq!(step.description(), "TestStep");
    }
}
