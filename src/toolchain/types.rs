use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use super::version;
use crate::config::Language;
use crate::prompt::PromptError;

/// Compiler families with distinct standard-support histories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompilerFamily {
    /// GNU Compiler Collection and MinGW builds of it
    Gcc,
    /// Clang/LLVM, including Apple clang
    Clang,
}

impl CompilerFamily {
    /// Short lowercase name, as used in IntelliSense modes.
    pub fn as_str(&self) -> &'static str {
        match self {
            CompilerFamily::Gcc => "gcc",
            CompilerFamily::Clang => "clang",
        }
    }

    pub fn debugger_name(&self) -> &'static str {
        match self {
            CompilerFamily::Gcc => "gdb",
            CompilerFamily::Clang => "lldb",
        }
    }
}

impl fmt::Display for CompilerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompilerFamily::Gcc => "GCC",
            CompilerFamily::Clang => "Clang",
        })
    }
}

/// Which target languages a compiler driver handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LanguageSupport {
    C,
    Cpp,
    /// A toolchain directory shipping both drivers (MinGW `bin`)
    Both,
}

impl LanguageSupport {
    pub fn supports(&self, language: Language) -> bool {
        matches!(
            (self, language),
            (LanguageSupport::Both, _)
                | (LanguageSupport::C, Language::C)
                | (LanguageSupport::Cpp, Language::Cpp)
        )
    }
}

impl fmt::Display for LanguageSupport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LanguageSupport::C => "C",
            LanguageSupport::Cpp => "C++",
            LanguageSupport::Both => "C/C++",
        })
    }
}

/// A compiler that answered a version probe.
///
/// Fields are private: the only constructor parses real probe output, so a
/// value of this type always stands for a compiler that actually ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolchainInfo {
    path: PathBuf,
    family: CompilerFamily,
    version: String,
    package: Option<String>,
    languages: LanguageSupport,
}

impl ToolchainInfo {
    pub fn from_version_output(
        path: impl Into<PathBuf>,
        languages: LanguageSupport,
        output: &str,
    ) -> Result<Self, ToolchainError> {
        let path = path.into();
        let parsed = version::parse(output).ok_or_else(|| ToolchainError::UnparsableVersion {
            path: path.clone(),
            output: output.lines().next().unwrap_or_default().trim().to_string(),
        })?;

        Ok(Self {
            path,
            family: parsed.family,
            version: parsed.version,
            package: parsed.package,
            languages,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn family(&self) -> CompilerFamily {
        self.family
    }

    /// Raw dotted version, e.g. `13.2.0`.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    pub fn languages(&self) -> LanguageSupport {
        self.languages
    }

    /// The driver to invoke for `language`.
    ///
    /// Only a [`LanguageSupport::Both`] install (a MinGW `bin`) maps its C++
    /// driver to the C sibling: `g++` becomes `gcc`, any other name just
    /// loses its `++`. A single-language driver is used as probed.
    pub fn compiler_for(&self, language: Language) -> PathBuf {
        if language == Language::Cpp || self.languages != LanguageSupport::Both {
            return self.path.clone();
        }
        let Some(name) = self.path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            return self.path.clone();
        };
        if !name.contains("++") {
            return self.path.clone();
        }
        let c_name = if name.starts_with("g++") {
            name.replacen("g++", "gcc", 1)
        } else {
            name.replacen("++", "", 1)
        };
        self.path.with_file_name(c_name)
    }

    /// One-line description for lists and prompts.
    pub fn label(&self) -> String {
        match &self.package {
            Some(package) => format!(
                "{} {} ({}) - {}",
                self.family,
                self.version,
                package,
                self.path.display()
            ),
            None => format!("{} {} - {}", self.family, self.version, self.path.display()),
        }
    }
}

impl fmt::Display for ToolchainInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Error type for toolchain operations
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("no {0} compiler found; install GCC or Clang, or pass --compiler")]
    NotFound(&'static str),

    #[error("compiler at {} is not usable: {reason}", .path.display())]
    InvalidExplicit { path: PathBuf, reason: String },

    #[error("failed to run {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} did not answer --version within {}s", .path.display(), .timeout.as_secs())]
    Timeout { path: PathBuf, timeout: Duration },

    #[error("{} exited with {status} when asked for its version", .path.display())]
    ProbeFailed { path: PathBuf, status: String },

    #[error("could not read a version from {}: {output:?}", .path.display())]
    UnparsableVersion { path: PathBuf, output: String },

    #[error("toolchain selection failed: {0}")]
    Selection(#[from] PromptError),
}
