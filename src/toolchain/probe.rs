use std::path::Path;
use std::time::Duration;

use super::ToolchainError;
use crate::process::{self, RunError};

/// Asks a compiler for its version banner.
pub trait VersionProbe {
    fn query(&self, compiler: &Path) -> Result<String, ToolchainError>;
}

/// Runs `<compiler> --version` as a child process.
#[derive(Debug, Clone)]
pub struct ProcessProbe {
    pub timeout: Duration,
}

impl Default for ProcessProbe {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl VersionProbe for ProcessProbe {
    fn query(&self, compiler: &Path) -> Result<String, ToolchainError> {
        let captured = process::run_with_timeout(compiler, &["--version"], self.timeout)
            .map_err(|e| match e {
                RunError::Spawn(source) => ToolchainError::Spawn {
                    path: compiler.to_path_buf(),
                    source,
                },
                RunError::TimedOut => ToolchainError::Timeout {
                    path: compiler.to_path_buf(),
                    timeout: self.timeout,
                },
            })?;

        if !captured.status.success() {
            return Err(ToolchainError::ProbeFailed {
                path: compiler.to_path_buf(),
                status: captured.status.to_string(),
            });
        }
        Ok(captured.combined())
    }
}
