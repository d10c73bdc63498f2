//! The configuration request.
//!
//! [`Options`] is built once by the CLI layer (optionally seeded from a TOML
//! [`Profile`]) and then moved through discovery into
//! [`Options::finalize`], which produces the [`ResolvedOptions`] the
//! generator consumes. There is no global options instance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::standard::{self, LanguageStandard, StandardPair};
use crate::toolchain::ToolchainInfo;

/// Errors in the user's request. All of them end the run with exit code 1.
#[derive(Debug, Error)]
pub enum OptionsError {
    #[error("'{0}' is not a supported target language (expected c++ or c)")]
    UnsupportedLanguage(String),

    #[error("'{0}' is not a known language standard")]
    UnknownStandard(String),

    #[error("{standard} is not a valid {language} standard (valid: {valid})")]
    StandardMismatch {
        standard: String,
        language: &'static str,
        valid: String,
    },

    #[error("workspace path is required (--workspace-path)")]
    MissingWorkspace,

    #[error("failed to read profile {}: {source}", .path.display())]
    ProfileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse profile {}: {source}", .path.display())]
    ProfileParse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Target language of the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "c++")]
    Cpp,
    #[serde(rename = "c")]
    C,
}

impl Language {
    /// Human readable name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Language::Cpp => "C++",
            Language::C => "C",
        }
    }

    /// VS Code language identifier.
    pub fn vscode_id(&self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::C => "c",
        }
    }

    pub fn source_extension(&self) -> &'static str {
        match self {
            Language::Cpp => "cpp",
            Language::C => "c",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Language::Cpp => "c++",
            Language::C => "c",
        })
    }
}

impl FromStr for Language {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "c++" | "cpp" | "cxx" => Ok(Language::Cpp),
            "c" => Ok(Language::C),
            _ => Err(OptionsError::UnsupportedLanguage(s.to_string())),
        }
    }
}

/// When to write the `helloworld` source into the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestFileMode {
    /// Only if the workspace has no C/C++ sources yet.
    #[default]
    Auto,
    Always,
    Never,
}

/// Operating system flavour the generated files target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Windows,
    Linux,
    MacOs,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Extension of the executables built from the single-file tasks.
    pub fn exe_extension(&self) -> &'static str {
        match self {
            Platform::Windows => "exe",
            Platform::Linux | Platform::MacOs => "out",
        }
    }

    /// Configuration name expected by the C/C++ extension.
    pub fn properties_name(&self) -> &'static str {
        match self {
            Platform::Windows => "Win32",
            Platform::Linux => "Linux",
            Platform::MacOs => "Mac",
        }
    }

    pub fn intellisense_prefix(&self) -> &'static str {
        match self {
            Platform::Windows => "windows",
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
        }
    }

    pub fn path_separator(&self) -> &'static str {
        match self {
            Platform::Windows => "\\",
            Platform::Linux | Platform::MacOs => "/",
        }
    }
}

/// Settings that only exist on one platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformExtras {
    Windows {
        apply_non_ascii_check: bool,
        generate_desktop_shortcut: bool,
        no_set_env: bool,
    },
    Linux {
        debugger: Option<PathBuf>,
    },
    MacOs {
        debugger: Option<PathBuf>,
        no_install_clt: bool,
    },
}

impl PlatformExtras {
    pub fn for_platform(platform: Platform) -> Self {
        match platform {
            Platform::Windows => PlatformExtras::Windows {
                apply_non_ascii_check: false,
                generate_desktop_shortcut: false,
                no_set_env: false,
            },
            Platform::Linux => PlatformExtras::Linux { debugger: None },
            Platform::MacOs => PlatformExtras::MacOs {
                debugger: None,
                no_install_clt: false,
            },
        }
    }

    pub fn platform(&self) -> Platform {
        match self {
            PlatformExtras::Windows { .. } => Platform::Windows,
            PlatformExtras::Linux { .. } => Platform::Linux,
            PlatformExtras::MacOs { .. } => Platform::MacOs,
        }
    }

    pub fn debugger_override(&self) -> Option<&Path> {
        match self {
            PlatformExtras::Windows { .. } => None,
            PlatformExtras::Linux { debugger } | PlatformExtras::MacOs { debugger, .. } => {
                debugger.as_deref()
            }
        }
    }

    pub fn apply_non_ascii_check(&self) -> bool {
        matches!(
            self,
            PlatformExtras::Windows {
                apply_non_ascii_check: true,
                ..
            }
        )
    }
}

/// A configuration request as handed over by the CLI layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub workspace: PathBuf,
    /// Editor executable; detected when absent.
    pub editor_path: Option<PathBuf>,
    /// Editor user directory holding `keybindings.json`; defaults per platform.
    pub user_data_dir: Option<PathBuf>,
    pub language: Language,
    pub standard: Option<LanguageStandard>,
    /// Compiler name or path (MinGW directory on Windows). `None` = discover.
    pub compiler: Option<String>,
    pub compile_args: Vec<String>,
    pub external_terminal: bool,
    pub install_l10n: bool,
    pub uninstall_extensions: bool,
    pub generate_test: TestFileMode,
    pub open_editor: bool,
    pub no_analytics: bool,
    pub assume_yes: bool,
    pub extras: PlatformExtras,
}

impl Default for Options {
    fn default() -> Self {
        Self::for_platform(Platform::current())
    }
}

impl Options {
    pub fn for_platform(platform: Platform) -> Self {
        Self {
            workspace: PathBuf::new(),
            editor_path: None,
            user_data_dir: None,
            language: Language::Cpp,
            standard: None,
            compiler: None,
            compile_args: Vec::new(),
            external_terminal: false,
            install_l10n: false,
            uninstall_extensions: false,
            generate_test: TestFileMode::Auto,
            open_editor: false,
            no_analytics: false,
            assume_yes: false,
            extras: PlatformExtras::for_platform(platform),
        }
    }

    pub fn platform(&self) -> Platform {
        self.extras.platform()
    }

    /// The beginner preset: non-interactive, chatty, with warnings enabled.
    pub fn apply_newbie_preset(&mut self) {
        self.assume_yes = true;
        self.external_terminal = true;
        self.install_l10n = true;
        self.uninstall_extensions = true;
        self.open_editor = true;
        self.compile_args = vec!["-Wall".to_string(), "-Wextra".to_string()];
        if let PlatformExtras::Windows {
            apply_non_ascii_check,
            ..
        } = &mut self.extras
        {
            *apply_non_ascii_check = true;
        }
    }

    /// Checks the parts of the request that do not depend on the environment.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.workspace.as_os_str().is_empty() {
            return Err(OptionsError::MissingWorkspace);
        }
        if let Some(standard) = self.standard {
            check_standard(standard, self.language)?;
        }
        if self.standard.is_none()
            && let Some(value) = std_flag_value(&self.compile_args)
        {
            check_standard(value.parse()?, self.language)?;
        }
        Ok(())
    }

    /// Fixes the standard and the compile arguments against the chosen
    /// toolchain. After this the argument list holds exactly one `-std=`.
    pub fn finalize(
        mut self,
        toolchain: ToolchainInfo,
        editor_path: PathBuf,
    ) -> Result<ResolvedOptions, OptionsError> {
        let supported = standard::resolve(toolchain.family(), toolchain.version());

        let chosen = match self.standard {
            Some(standard) => standard,
            None => match std_flag_value(&self.compile_args) {
                Some(value) => value.parse()?,
                None => supported.for_language(self.language),
            },
        };
        check_standard(chosen, self.language)?;

        self.standard = Some(chosen);
        normalize_std_flag(&mut self.compile_args, chosen);

        let compiler = toolchain.compiler_for(self.language);
        Ok(ResolvedOptions {
            standards: supported.with(chosen),
            compiler,
            toolchain,
            editor_path,
            arch: std::env::consts::ARCH.to_string(),
            options: self,
        })
    }
}

fn check_standard(standard: LanguageStandard, language: Language) -> Result<(), OptionsError> {
    if standard.language() == language {
        Ok(())
    } else {
        Err(OptionsError::StandardMismatch {
            standard: standard.to_string(),
            language: language.name(),
            valid: LanguageStandard::valid_names(language),
        })
    }
}

/// Value of the last `-std=` entry in `args`, if any.
pub fn std_flag_value(args: &[String]) -> Option<&str> {
    args.iter().rev().find_map(|arg| arg.strip_prefix("-std="))
}

/// Drops every `-std=` entry and appends the one for `standard`.
///
/// Idempotent: running it again with the same standard changes nothing.
pub fn normalize_std_flag(args: &mut Vec<String>, standard: LanguageStandard) {
    args.retain(|arg| !arg.starts_with("-std="));
    args.push(standard.flag());
}

/// A request with every environment-dependent decision made.
#[derive(Debug, Clone)]
pub struct ResolvedOptions {
    pub options: Options,
    pub toolchain: ToolchainInfo,
    /// Driver for the target language (`gcc` for C on a MinGW `g++` install).
    pub compiler: PathBuf,
    pub editor_path: PathBuf,
    /// Target-language standard plus its counterpart, for IntelliSense.
    pub standards: StandardPair,
    /// Host architecture (`std::env::consts::ARCH` naming).
    pub arch: String,
}

impl ResolvedOptions {
    pub fn platform(&self) -> Platform {
        self.options.platform()
    }

    pub fn language(&self) -> Language {
        self.options.language
    }

    pub fn standard(&self) -> LanguageStandard {
        self.standards.for_language(self.options.language)
    }

    pub fn compile_args(&self) -> &[String] {
        &self.options.compile_args
    }

    pub fn workspace(&self) -> &Path {
        &self.options.workspace
    }
}

/// Saved answers to the configure questions, stored as TOML.
///
/// Every field is optional; only the ones present override defaults, and
/// explicit command-line flags override the profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Profile {
    pub workspace_path: Option<PathBuf>,
    pub vscode_path: Option<PathBuf>,
    pub compiler: Option<String>,
    pub language: Option<Language>,
    pub language_standard: Option<LanguageStandard>,
    pub compile_args: Option<Vec<String>>,
    pub external_terminal: Option<bool>,
    pub install_chinese: Option<bool>,
    pub uninstall_extensions: Option<bool>,
    pub generate_test: Option<TestFileMode>,
    pub open_vscode: Option<bool>,
    pub no_send_analytics: Option<bool>,
    pub debugger: Option<PathBuf>,
    pub apply_nonascii_check: Option<bool>,
}

impl Profile {
    pub fn load(path: &Path) -> Result<Self, OptionsError> {
        let content = fs::read_to_string(path).map_err(|source| OptionsError::ProfileRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| OptionsError::ProfileParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        use anyhow::Context;

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn from_options(options: &Options) -> Self {
        Self {
            workspace_path: Some(options.workspace.clone()),
            vscode_path: options.editor_path.clone(),
            compiler: options.compiler.clone(),
            language: Some(options.language),
            language_standard: options.standard,
            compile_args: Some(options.compile_args.clone()),
            external_terminal: Some(options.external_terminal),
            install_chinese: Some(options.install_l10n),
            uninstall_extensions: Some(options.uninstall_extensions),
            generate_test: Some(options.generate_test),
            open_vscode: Some(options.open_editor),
            no_send_analytics: Some(options.no_analytics),
            debugger: options.extras.debugger_override().map(Path::to_path_buf),
            apply_nonascii_check: match options.extras {
                PlatformExtras::Windows {
                    apply_non_ascii_check,
                    ..
                } => Some(apply_non_ascii_check),
                _ => None,
            },
        }
    }

    /// Copies every value present in the profile onto `options`.
    pub fn apply_to(&self, options: &mut Options) {
        if let Some(v) = &self.workspace_path {
            options.workspace = v.clone();
        }
        if let Some(v) = &self.vscode_path {
            options.editor_path = Some(v.clone());
        }
        if let Some(v) = &self.compiler {
            options.compiler = Some(v.clone());
        }
        if let Some(v) = self.language {
            options.language = v;
        }
        if let Some(v) = self.language_standard {
            options.standard = Some(v);
        }
        if let Some(v) = &self.compile_args {
            options.compile_args = v.clone();
        }
        if let Some(v) = self.external_terminal {
            options.external_terminal = v;
        }
        if let Some(v) = self.install_chinese {
            options.install_l10n = v;
        }
        if let Some(v) = self.uninstall_extensions {
            options.uninstall_extensions = v;
        }
        if let Some(v) = self.generate_test {
            options.generate_test = v;
        }
        if let Some(v) = self.open_vscode {
            options.open_editor = v;
        }
        if let Some(v) = self.no_send_analytics {
            options.no_analytics = v;
        }
        match &mut options.extras {
            PlatformExtras::Windows {
                apply_non_ascii_check,
                ..
            } => {
                if let Some(v) = self.apply_nonascii_check {
                    *apply_non_ascii_check = v;
                }
            }
            PlatformExtras::Linux { debugger } | PlatformExtras::MacOs { debugger, .. } => {
                if let Some(v) = &self.debugger {
                    *debugger = Some(v.clone());
                }
            }
        }
    }
}
