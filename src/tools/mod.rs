// External tool invocation
//
// Every stage talks to its tool through the ToolRunner trait:
// - Command: ToolCommand builder describing one invocation
// - Process: local subprocess backend (tokio::process)

pub mod command;
pub mod process;

use async_trait::async_trait;
use std::path::Path;

pub use command::*;
pub use process::*;

use crate::error::{ExitStatusText, Result};

/// Result of a finished tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToolOutcome {
    pub status: ExitStatusText,
}

impl ToolOutcome {
    pub fn from_code(code: i32) -> Self {
        Self {
            status: ExitStatusText(Some(code)),
        }
    }

    pub fn success(&self) -> bool {
        self.status.0 == Some(0)
    }
}

/// Runs an external tool to completion.
///
/// Implementations block the pipeline until the tool has exited. Failing to start
/// the tool is an error; a nonzero exit is reported through [`ToolOutcome`] so each
/// stage can apply its own policy.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToolRunner: Send + Sync {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutcome>;
}

/// Factory for creating tool runner instances
pub struct ToolRunnerFactory;

impl ToolRunnerFactory {
    /// Create the default runner (local subprocesses)
    pub fn create_runner() -> Box<dyn ToolRunner> {
        Box::new(ProcessRunner::new())
    }
}

/// Whether `path` is a regular file the current user may execute.
pub fn is_executable(path: &Path) -> bool {
    let Ok(metadata) = std::fs::metadata(path) else {
        return false;
    };
    metadata.is_file() && has_exec_bit(&metadata)
}

#[cfg(unix)]
fn has_exec_bit(metadata: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn has_exec_bit(_metadata: &std::fs::Metadata) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_success() {
        assert!(ToolOutcome::from_code(0).success());
        assert!(!ToolOutcome::from_code(1).success());
        assert!(!ToolOutcome {
            status: ExitStatusText(None)
        }
        .success());
    }

    #[test]
    fn test_is_executable() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("tool");
        std::fs::write(&file, "#!/bin/sh\n").unwrap();

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o644)).unwrap();
            assert!(!is_executable(&file));
            std::fs::set_permissions(&file, std::fs::Permissions::from_mode(0o755)).unwrap();
        }

        assert!(is_executable(&file));
        assert!(!is_executable(dir.path()));
        assert!(!is_executable(&dir.path().join("absent")));
    }
}
