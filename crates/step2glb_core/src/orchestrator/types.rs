//! Core types for the conversion pipeline.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Settings;
use crate::logging::JobLogger;

/// Read-only context passed to pipeline steps.
///
/// Contains configuration and shared resources that steps can read
/// but not modify. Mutable state goes in `JobState`.
pub struct Context {
    /// Job name/identifier (input file stem).
    pub job_name: String,
    /// Application settings.
    pub settings: Settings,
    /// Per-run logger.
    pub logger: Arc<JobLogger>,
}

impl Context {
    /// Create a new context for a job.
    pub fn new(job_name: impl Into<String>, settings: Settings, logger: Arc<JobLogger>) -> Self {
        Self {
            job_name: job_name.into(),
            settings,
            logger,
        }
    }

    /// Configured FreeCAD executable.
    pub fn freecad_path(&self) -> PathBuf {
        PathBuf::from(&self.settings.tools.freecad_path)
    }

    /// Root for scoped temporary files.
    pub fn temp_root(&self) -> PathBuf {
        self.settings.temp_root()
    }
}

/// Mutable job state that accumulates results from pipeline steps.
///
/// Each step's output is stored in its own section and written once.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobState {
    /// Unique job identifier.
    pub job_id: String,
    /// When the job started.
    pub started_at: Option<String>,
    /// Export results (from the Export step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export: Option<ToolRunOutput>,
    /// Transcode results (from the Transcode step).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcode: Option<ToolRunOutput>,
}

impl JobState {
    /// Create a new job state with the given ID.
    pub fn new(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            started_at: Some(chrono::Local::now().to_rfc3339()),
            ..Default::default()
        }
    }

    /// Check if the export step recorded its output.
    pub fn has_export(&self) -> bool {
        self.export.is_some()
    }

    /// Check if the transcode step recorded its output.
    pub fn has_transcode(&self) -> bool {
        self.transcode.is_some()
    }
}

/// What a tool-driving step produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRunOutput {
    /// File the tool was asked to write.
    pub output_path: PathBuf,
    /// Tool exit code.
    pub exit_code: i32,
    /// Command line that was run.
    pub command: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_state_tracks_completion() {
        let mut state = JobState::new("part");
        assert!(!state.has_export());

        state.export = Some(ToolRunOutput {
            output_path: PathBuf::from("/tmp/part.obj"),
            exit_code: 0,
            command: "freecadcmd -c ...".to_string(),
        });

        assert!(state.has_export());
        assert!(!state.has_transcode());
    }

    #[test]
    fn job_state_serializes() {
        let state = JobState::new("part");
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"job_id\":\"part\""));
        assert!(!json.contains("transcode"));
    }
}
