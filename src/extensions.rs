//! Keeping the editor's extension set in the wanted state.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::process::{self, RunError};

/// Extensions that duplicate or fight with the generated tasks and
/// IntelliSense setup. Versioned with the tool, not user configurable.
pub const DENYLIST: &[&str] = &[
    "formulahendry.code-runner",
    "austin.code-gnu-global",
    "danielpinto8zz6.c-cpp-compile-run",
    "mitaki28.vscode-clang",
    "jaycetyle.vscode-gnu-global",
    "franneck94.c-cpp-runner",
    "ajshort.include-autocomplete",
    "xaver.clang-format",
    "jbenden.c-cpp-flylint",
];

pub const CPPTOOLS: &str = "ms-vscode.cpptools";
pub const CHINESE_LANGUAGE_PACK: &str = "ms-ceintl.vscode-language-pack-zh-hans";

#[derive(Debug, Error)]
pub enum ExtensionError {
    #[error("failed to run {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        source: std::io::Error,
    },
    #[error("`{command}` exited with {status}: {stderr}")]
    Failed {
        command: String,
        status: String,
        stderr: String,
    },
    #[error("`{command}` timed out after {}s", .timeout.as_secs())]
    Timeout { command: String, timeout: Duration },
}

/// The editor's command line extension interface.
pub trait EditorCli {
    fn list_extensions(&self) -> Result<Vec<String>, ExtensionError>;
    fn install_extension(&self, id: &str) -> Result<(), ExtensionError>;
    fn uninstall_extension(&self, id: &str) -> Result<(), ExtensionError>;
    /// Opens `workspace` (and `file` in it) without waiting for the editor.
    fn open(&self, workspace: &Path, file: Option<&Path>) -> Result<(), ExtensionError>;
}

/// `code --list-extensions` and friends.
#[derive(Debug, Clone)]
pub struct CodeCli {
    program: PathBuf,
    timeout: Duration,
}

impl CodeCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, args: &[&str]) -> Result<String, ExtensionError> {
        let command = format!("{} {}", self.program.display(), args.join(" "));
        debug!("running {}", command);
        let captured = process::run_with_timeout(&self.program, args, self.timeout).map_err(
            |e| match e {
                RunError::Spawn(source) => ExtensionError::Spawn {
                    program: self.program.clone(),
                    source,
                },
                RunError::TimedOut => ExtensionError::Timeout {
                    command: command.clone(),
                    timeout: self.timeout,
                },
            },
        )?;
        if !captured.status.success() {
            return Err(ExtensionError::Failed {
                command,
                status: captured.status.to_string(),
                stderr: captured.stderr.trim().to_string(),
            });
        }
        Ok(captured.stdout)
    }
}

impl EditorCli for CodeCli {
    fn list_extensions(&self) -> Result<Vec<String>, ExtensionError> {
        let out = self.run(&["--list-extensions"])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(String::from)
            .collect())
    }

    fn install_extension(&self, id: &str) -> Result<(), ExtensionError> {
        self.run(&["--install-extension", id]).map(|_| ())
    }

    fn uninstall_extension(&self, id: &str) -> Result<(), ExtensionError> {
        self.run(&["--uninstall-extension", id]).map(|_| ())
    }

    fn open(&self, workspace: &Path, file: Option<&Path>) -> Result<(), ExtensionError> {
        let mut cmd = Command::new(&self.program);
        cmd.arg(workspace);
        if let Some(file) = file {
            cmd.arg(file);
        }
        debug!("launching {:?}", cmd);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(|_| ())
            .map_err(|source| ExtensionError::Spawn {
                program: self.program.clone(),
                source,
            })
    }
}

/// What a reconciliation pass changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub installed: Vec<String>,
    pub removed: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.installed.is_empty() && self.removed.is_empty() && self.failed.is_empty()
    }

    fn merge(&mut self, other: ReconcileReport) {
        self.installed.extend(other.installed);
        self.removed.extend(other.removed);
        self.failed.extend(other.failed);
    }
}

/// Install/uninstall driver over an [`EditorCli`].
///
/// Individual failures are logged and recorded; the batch carries on.
pub struct ExtensionManager<'a> {
    cli: &'a dyn EditorCli,
}

impl<'a> ExtensionManager<'a> {
    pub fn new(cli: &'a dyn EditorCli) -> Self {
        Self { cli }
    }

    /// Installed extension ids, lowercased.
    pub fn list(&self) -> Result<BTreeSet<String>, ExtensionError> {
        Ok(self
            .cli
            .list_extensions()?
            .into_iter()
            .map(|id| id.to_ascii_lowercase())
            .collect())
    }

    pub fn install(&self, id: &str) -> Result<(), ExtensionError> {
        self.cli.install_extension(id)
    }

    pub fn uninstall(&self, id: &str) -> Result<(), ExtensionError> {
        self.cli.uninstall_extension(id)
    }

    /// Removes every installed extension on the [`DENYLIST`].
    pub fn uninstall_all(&self) -> Result<ReconcileReport, ExtensionError> {
        let installed = self.list()?;
        let mut report = ReconcileReport::default();
        for id in DENYLIST.iter().filter(|id| installed.contains(**id)) {
            match self.uninstall(id) {
                Ok(()) => report.removed.push(id.to_string()),
                Err(e) => {
                    warn!("failed to uninstall {}: {}", id, e);
                    report.failed.push((id.to_string(), e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// Installs whichever of `wanted` is missing.
    pub fn ensure_installed(&self, wanted: &[&str]) -> Result<ReconcileReport, ExtensionError> {
        let installed = self.list()?;
        let mut report = ReconcileReport::default();
        for id in wanted
            .iter()
            .filter(|id| !installed.contains(&id.to_ascii_lowercase()))
        {
            match self.install(id) {
                Ok(()) => report.installed.push(id.to_string()),
                Err(e) => {
                    warn!("failed to install {}: {}", id, e);
                    report.failed.push((id.to_string(), e.to_string()));
                }
            }
        }
        Ok(report)
    }

    /// One full pass: install what is wanted, then optionally clean up.
    pub fn reconcile(
        &self,
        wanted: &[&str],
        remove_denylisted: bool,
    ) -> Result<ReconcileReport, ExtensionError> {
        let mut report = self.ensure_installed(wanted)?;
        if remove_denylisted {
            report.merge(self.uninstall_all()?);
        }
        Ok(report)
    }
}

/// Extensions a configuration run wants present.
pub fn desired_extensions(install_l10n: bool) -> Vec<&'static str> {
    let mut wanted = vec![CPPTOOLS];
    if install_l10n {
        wanted.push(CHINESE_LANGUAGE_PACK);
    }
    wanted
}


#[cfg(test)]
mod tests {
    use super::testing::FakeEditor;
    use super::*;

    #[test]
    fn test_uninstall_all_is_idempotent() {
        let editor = FakeEditor::with_installed(&[
            "formulahendry.code-runner",
            "ms-vscode.cpptools",
            "xaver.clang-format",
        ]);
        let manager = ExtensionManager::new(&editor);

        let first = manager.uninstall_all().unwrap();
        assert_eq!(
            first.removed,
            vec!["formulahendry.code-runner", "xaver.clang-format"]
        );
        assert!(editor.installed.borrow().contains("ms-vscode.cpptools"));

        let calls_before = editor.calls.borrow().len();
        let second = manager.uninstall_all().unwrap();
        assert!(second.is_noop());
        assert_eq!(editor.calls.borrow().len(), calls_before);
    }

    #[test]
    fn test_failure_does_not_abort_batch() {
        let mut editor = FakeEditor::with_installed(&[
            "austin.code-gnu-global",
            "jbenden.c-cpp-flylint",
        ]);
        editor.broken.insert("austin.code-gnu-global".to_string());
        let report = ExtensionManager::new(&editor).uninstall_all().unwrap();
        assert_eq!(report.removed, vec!["jbenden.c-cpp-flylint"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "austin.code-gnu-global");
    }

    #[test]
    fn test_ensure_installed_skips_present() {
        let editor = FakeEditor::with_installed(&["MS-VSCODE.CPPTOOLS"]);
        let manager = ExtensionManager::new(&editor);
        let report = manager.ensure_installed(&desired_extensions(true)).unwrap();
        assert_eq!(report.installed, vec![CHINESE_LANGUAGE_PACK]);

        let again = manager.ensure_installed(&desired_extensions(true)).unwrap();
        assert!(again.is_noop());
    }

    #[test]
    fn test_reconcile_combines_both_passes() {
        let editor = FakeEditor::with_installed(&["mitaki28.vscode-clang"]);
        let report = ExtensionManager::new(&editor)
            .reconcile(&desired_extensions(false), true)
            .unwrap();
        assert_eq!(report.installed, vec![CPPTOOLS]);
        assert_eq!(report.removed, vec!["mitaki28.vscode-clang"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_code_cli_reports_missing_program() {
        let cli = CodeCli::new("/nonexistent/code").with_timeout(Duration::from_secs(1));
        assert!(matches!(
            cli.list_extensions(),
            Err(ExtensionError::Spawn { .. })
        ));
    }
}
