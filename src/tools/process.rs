use async_trait::async_trait;
use std::io::ErrorKind;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::{ToolCommand, ToolOutcome, ToolRunner};
use crate::error::{ExitStatusText, PipelineError, Result};

/// Runs tools as local child processes.
///
/// The child's stdout is sent to our stderr so that standard output only ever
/// carries the final report.
#[derive(Debug, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutcome> {
        debug!("Running command: {}", command);
        debug!("Description: {}", command.description);

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(command.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::from(std::io::stderr()))
            .stderr(Stdio::inherit());

        let status = cmd.status().await.map_err(|e| match e.kind() {
            ErrorKind::NotFound | ErrorKind::PermissionDenied => PipelineError::ToolMissing {
                tool: command.tool_name(),
                path: command.program.clone(),
                hint: command
                    .missing_hint
                    .clone()
                    .unwrap_or_else(|| format!("Could not start it: {}", e)),
            },
            _ => PipelineError::Io(e),
        })?;

        let outcome = ToolOutcome {
            status: ExitStatusText(status.code()),
        };
        debug!("{} finished with {}", command.tool_name(), outcome.status);
        Ok(outcome)
    }
}
