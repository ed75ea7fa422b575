//! Pipeline orchestrator for STEP → GLB conversions.
//!
//! A conversion is a short pipeline of steps, each driving one external
//! tool. Every step validates its input, runs, then checks that the tool
//! really produced a non-empty file. The first failing step ends the run.
//!
//! # Architecture
//!
//! ```text
//! convert_step_to_glb
//!     ├── Step: Export     (FreeCAD, STEP → OBJ)
//!     └── Step: Transcode  (obj2gltf, OBJ → GLB)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use step2glb_core::config::Settings;
//! use step2glb_core::logging::JobLoggerBuilder;
//! use step2glb_core::orchestrator::{convert_step_to_glb, ConversionRequest};
//!
//! let logger = Arc::new(JobLoggerBuilder::new("bracket").build().unwrap());
//! let request = ConversionRequest::new("bracket.step", "bracket.glb");
//!
//! let report = convert_step_to_glb(&request, &Settings::default(), logger)?;
//! println!("Completed: {:?}", report.steps_completed);
//! # Ok::<(), step2glb_core::orchestrator::PipelineError>(())
//! ```

mod convert;
mod errors;
mod pipeline;
mod step;
pub mod steps;
mod types;

pub use convert::{
    convert_obj_to_glb, convert_step_to_glb, convert_step_to_obj, job_name_for, validate_source,
    ConversionReport, ConversionRequest, IntermediateArtifact,
};
pub use errors::{PipelineError, PipelineResult, StepError, StepResult};
pub use pipeline::{Pipeline, PipelineRunResult};
pub use step::PipelineStep;
pub use steps::{ExportStep, TranscodeStep};
pub use types::{Context, JobState, ToolRunOutput};
