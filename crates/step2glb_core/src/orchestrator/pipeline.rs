//! Pipeline runner that executes steps in sequence.

use super::errors::{PipelineError, PipelineResult};
use super::step::PipelineStep;
use super::types::{Context, JobState};

/// Pipeline that runs a sequence of steps.
///
/// Steps run in order with validation before and after each one.
/// The first failure stops the pipeline; later steps never start.
pub struct Pipeline {
    /// Steps to execute in order.
    steps: Vec<Box<dyn PipelineStep>>,
}

impl Pipeline {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Add a step to the pipeline.
    pub fn add_step<S: PipelineStep + 'static>(&mut self, step: S) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Add a step (builder pattern).
    pub fn with_step<S: PipelineStep + 'static>(mut self, step: S) -> Self {
        self.add_step(step);
        self
    }

    /// Run the pipeline with the given context and state.
    ///
    /// Executes each step in order:
    /// 1. Run `validate_input`
    /// 2. Run `execute`
    /// 3. Run `validate_output`
    pub fn run(&self, ctx: &Context, state: &mut JobState) -> PipelineResult<PipelineRunResult> {
        let mut result = PipelineRunResult {
            steps_completed: Vec::new(),
        };

        let total_steps = self.steps.len();

        for (i, step) in self.steps.iter().enumerate() {
            let step_name = step.name();
            ctx.logger.phase(&format!(
                "Step {}/{}: {}",
                i + 1,
                total_steps,
                step.description()
            ));

            ctx.logger.debug(&format!("Validating input for '{}'", step_name));
            if let Err(e) = step.validate_input(ctx) {
                ctx.logger.error(&format!("Input validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
            }

            ctx.logger.debug(&format!("Executing '{}'", step_name));
            step.execute(ctx, state).map_err(|e| {
                ctx.logger.error(&format!("{} failed: {}", step_name, e));
                PipelineError::step_failed(&ctx.job_name, step_name, e)
            })?;

            ctx.logger
                .debug(&format!("Validating output for '{}'", step_name));
            if let Err(e) = step.validate_output(ctx, state) {
                ctx.logger.error(&format!("Output validation failed: {}", e));
                return Err(PipelineError::step_failed(&ctx.job_name, step_name, e));
            }

            ctx.logger.success(&format!("{} completed", step_name));
            result.steps_completed.push(step_name.to_string());
        }

        if let Ok(json) = serde_json::to_string(state) {
            ctx.logger.trace(&format!("Job state: {}", json));
        }

        Ok(result)
    }

    /// Get the number of steps in the pipeline.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get step names in order.
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    /// Steps that completed successfully, in order.
    pub steps_completed: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::logging::JobLoggerBuilder;
    use crate::orchestrator::errors::StepError;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingStep {
        name: &'static str,
        execute_count: Arc<AtomicUsize>,
        fail: bool,
    }

    impl CountingStep {
        fn new(name: &'static str, fail: bool) -> (Self, Arc<AtomicUsize>) {
            let count = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    name,
                    execute_count: Arc::clone(&count),
                    fail,
                },
                count,
            )
        }
    }

    impl PipelineStep for CountingStep {
        fn name(&self) -> &str {
            self.name
        }

        fn validate_input(&self, _ctx: &Context) -> Result<(), StepError> {
            Ok(())
        }

        fn execute(&self, _ctx: &Context, _state: &mut JobState) -> Result<(), StepError> {
            self.execute_count.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StepError::command_failed(self.name, 1, "boom"));
            }
            Ok(())
        }

        fn validate_output(&self, _ctx: &Context, _state: &JobState) -> Result<(), StepError> {
            Ok(())
        }
    }

    fn context() -> Context {
        crate::logging::init_test_tracing();
        let logger = JobLoggerBuilder::new("pipeline-test").build().unwrap();
        Context::new("pipeline-test", Settings::default(), Arc::new(logger))
    }

    #[test]
    fn pipeline_builds_correctly() {
        let (first, _) = CountingStep::new("Step1", false);
        let (second, _) = CountingStep::new("Step2", false);
        let pipeline = Pipeline::new().with_step(first).with_step(second);

        assert_eq!(pipeline.step_count(), 2);
        assert_eq!(pipeline.step_names(), vec!["Step1", "Step2"]);
    }

    #[test]
    fn runs_all_steps_in_order() {
        let (first, first_count) = CountingStep::new("Export", false);
        let (second, second_count) = CountingStep::new("Transcode", false);
        let pipeline = Pipeline::new().with_step(first).with_step(second);

        let ctx = context();
        let mut state = JobState::new("job");
        let result = pipeline.run(&ctx, &mut state).unwrap();

        assert_eq!(result.steps_completed, vec!["Export", "Transcode"]);
        assert_eq!(first_count.load(Ordering::SeqCst), 1);
        assert_eq!(second_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn first_failure_stops_the_pipeline() {
        let (first, _) = CountingStep::new("Export", true);
        let (second, second_count) = CountingStep::new("Transcode", false);
        let pipeline = Pipeline::new().with_step(first).with_step(second);

        let ctx = context();
        let mut state = JobState::new("job");
        let err = pipeline.run(&ctx, &mut state).unwrap_err();

        assert_eq!(err.step_name(), Some("Export"));
        assert_eq!(second_count.load(Ordering::SeqCst), 0);
    }
}
