//! Blocking execution of external tools with captured output.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::logging::JobLogger;
use crate::orchestrator::{StepError, StepResult};

/// Number of output lines carried into a `CommandFailed` message.
const FAILURE_MESSAGE_LINES: usize = 5;

/// Captured result of a finished tool.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Command line that was run.
    pub command: String,
    /// Exit code (-1 when the process was killed by a signal).
    pub exit_code: i32,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

impl ToolOutput {
    /// Check if the tool exited with status 0.
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Last few non-empty diagnostic lines, stderr preferred.
    fn failure_message(&self) -> String {
        let source = if self.stderr.trim().is_empty() {
            &self.stdout
        } else {
            &self.stderr
        };

        let lines: Vec<&str> = source.lines().filter(|l| !l.trim().is_empty()).collect();
        if lines.is_empty() {
            return "no output".to_string();
        }
        let start = lines.len().saturating_sub(FAILURE_MESSAGE_LINES);
        lines[start..].join("\n")
    }
}

/// One invocation of an external tool.
#[derive(Debug, Clone)]
pub struct ToolCommand {
    tool: String,
    program: PathBuf,
    args: Vec<OsString>,
    envs: Vec<(String, OsString)>,
}

impl ToolCommand {
    /// Create a command; `tool` is the label used in diagnostics.
    pub fn new(tool: impl Into<String>, program: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    /// Set an environment variable for the child process.
    pub fn env(mut self, key: impl Into<String>, value: impl AsRef<OsStr>) -> Self {
        self.envs.push((key.into(), value.as_ref().to_owned()));
        self
    }

    /// Tool label.
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Program that will be executed.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// Environment variables set for the child, in insertion order.
    pub fn envs(&self) -> &[(String, OsString)] {
        &self.envs
    }

    /// Render a shell-like command line for logs.
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(|a| a.as_os_str()))
            .map(|part| quote_for_display(&part.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the tool to completion.
    ///
    /// Output lines are relayed to the logger. A failed launch or a
    /// non-zero exit is returned as an error; the caller decides about
    /// postconditions on the produced files.
    pub fn run(&self, logger: &JobLogger) -> StepResult<ToolOutput> {
        // The tail shown on failure must hold this tool's output only
        logger.clear_tail();
        logger.command(&self.display());
        for (key, value) in &self.envs {
            logger.debug(&format!("  {}={}", key, value.to_string_lossy()));
        }

        tracing::debug!("Running {}: {}", self.tool, self.display());

        let result = Command::new(&self.program)
            .args(&self.args)
            .envs(self.envs.iter().map(|(k, v)| (k.as_str(), v.as_os_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| StepError::launch_failed(&self.tool, e))?;

        let output = ToolOutput {
            command: self.display(),
            exit_code: result.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&result.stdout).to_string(),
            stderr: String::from_utf8_lossy(&result.stderr).to_string(),
        };

        for line in output.stdout.lines() {
            logger.output_line(line, false);
        }
        for line in output.stderr.lines() {
            logger.output_line(line, true);
        }

        if !output.success() {
            logger.show_tail(&self.tool);
            return Err(StepError::command_failed(
                &self.tool,
                output.exit_code,
                output.failure_message(),
            ));
        }

        tracing::debug!("{} exited successfully", self.tool);
        Ok(output)
    }
}

/// Quote an argument for display when it contains shell-significant characters.
fn quote_for_display(part: &str) -> String {
    let needs_quotes = part.is_empty()
        || part
            .chars()
            .any(|c| c.is_whitespace() || "'\"\\$`()[]{};&|<>*?!#".contains(c));
    if needs_quotes {
        format!("'{}'", part.replace('\'', r"'\''"))
    } else {
        part.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::JobLoggerBuilder;

    fn logger() -> JobLogger {
        JobLoggerBuilder::new("runner-test").build().unwrap()
    }

    #[test]
    fn display_quotes_special_arguments() {
        let cmd = ToolCommand::new("obj2gltf", "npx")
            .arg("obj2gltf")
            .args(["-i", "/tmp/my part.obj"]);
        assert_eq!(cmd.display(), "npx obj2gltf -i '/tmp/my part.obj'");
    }

    #[test]
    fn quote_escapes_single_quotes() {
        assert_eq!(quote_for_display("it's"), r"'it'\''s'");
        assert_eq!(quote_for_display(""), "''");
        assert_eq!(quote_for_display("plain"), "plain");
    }

    #[test]
    fn failure_message_prefers_stderr_tail() {
        let output = ToolOutput {
            command: "obj2gltf".to_string(),
            exit_code: 2,
            stdout: "progress\n".to_string(),
            stderr: "a\nb\n\nc\nd\ne\nf\n".to_string(),
        };
        assert_eq!(output.failure_message(), "b\nc\nd\ne\nf");
    }

    #[test]
    fn failure_message_falls_back_to_stdout() {
        let output = ToolOutput {
            command: "freecadcmd".to_string(),
            exit_code: 1,
            stdout: "Error: No shapes found\n".to_string(),
            stderr: "  \n".to_string(),
        };
        assert_eq!(output.failure_message(), "Error: No shapes found");
    }

    #[test]
    fn missing_program_is_a_launch_failure() {
        let cmd = ToolCommand::new("ghost", "/nonexistent/step2glb/ghost-tool");
        let err = cmd.run(&logger()).unwrap_err();
        assert!(matches!(err, StepError::LaunchFailed { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn captures_output_and_exit_code() {
        let logger = logger();
        let ok = ToolCommand::new("sh", "sh")
            .args(["-c", "echo \"$GREETING\"; echo oops >&2"])
            .env("GREETING", "hello")
            .run(&logger)
            .unwrap();
        assert!(ok.success());
        assert_eq!(ok.stdout.trim(), "hello");
        assert_eq!(ok.stderr.trim(), "oops");
        assert_eq!(logger.get_tail(), vec!["hello", "oops"]);

        let err = ToolCommand::new("sh", "sh")
            .args(["-c", "echo broken >&2; exit 3"])
            .run(&logger)
            .unwrap_err();
        match err {
            StepError::CommandFailed {
                exit_code, message, ..
            } => {
                assert_eq!(exit_code, 3);
                assert_eq!(message, "broken");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn tail_only_holds_the_latest_run() {
        let logger = logger();
        ToolCommand::new("first", "sh")
            .args(["-c", "echo from-first"])
            .run(&logger)
            .unwrap();

        ToolCommand::new("second", "sh")
            .args(["-c", "echo from-second >&2; exit 2"])
            .run(&logger)
            .unwrap_err();

        assert_eq!(logger.get_tail(), vec!["from-second"]);
    }
}
