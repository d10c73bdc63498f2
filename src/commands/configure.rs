//! Configure command handler
//!
//! Handles `vscch configure`: resolves the toolchain, the editor and the
//! language standard, then writes the workspace configuration.

use anyhow::{Result, bail};
use colored::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{Options, PlatformExtras, ResolvedOptions};
use crate::editor;
use crate::extensions::{CodeCli, EditorCli};
use crate::ide::{self, GenerationReport, Generator};
use crate::prompt::{InquirePrompter, Prompter};
use crate::telemetry::{LocalUsageLog, UsageRecorder};
use crate::toolchain::{self, Candidate, ProcessProbe, VersionProbe};

/// Builds the editor CLI for a `code` entry point.
pub type EditorCliFactory = Box<dyn Fn(&Path) -> Box<dyn EditorCli>>;

/// Everything `configure` needs from the outside world.
pub struct Env {
    pub prompter: Box<dyn Prompter>,
    pub probe: Box<dyn VersionProbe>,
    pub editor_cli: EditorCliFactory,
    pub usage: Option<Box<dyn UsageRecorder>>,
    /// Compilers to consider when none is named; `None` searches this machine.
    pub candidates: Option<Vec<Candidate>>,
    /// Home directory for the POSIX script directory.
    pub home: Option<PathBuf>,
}

impl Env {
    /// The real terminal, processes and filesystem.
    pub fn system() -> Self {
        Self {
            prompter: Box::new(InquirePrompter),
            probe: Box::new(ProcessProbe::default()),
            editor_cli: Box::new(|program: &Path| -> Box<dyn EditorCli> {
                Box::new(CodeCli::new(program))
            }),
            usage: LocalUsageLog::default_location()
                .map(|log| Box::new(log) as Box<dyn UsageRecorder>),
            candidates: None,
            home: dirs::home_dir(),
        }
    }
}

/// Resolves `options` against the environment without writing anything.
pub fn resolve(options: Options, env: &mut Env) -> Result<ResolvedOptions> {
    options.validate()?;
    warn_unsupported(&options.extras);

    let platform = options.platform();
    let toolchain = match &options.compiler {
        Some(selector) => toolchain::validate_explicit(selector, platform, env.probe.as_ref())?,
        None => {
            let found = match &env.candidates {
                Some(candidates) => toolchain::discover(candidates, env.probe.as_ref()),
                None => toolchain::detect_all(platform, env.probe.as_ref()),
            };
            debug!("{} usable toolchain(s)", found.len());
            toolchain::select(
                found,
                options.language,
                options.assume_yes,
                env.prompter.as_mut(),
            )?
        }
    };
    info!("using {}", toolchain);

    let editor_path = editor::resolve(options.editor_path.as_deref(), platform)?;
    let resolved = options.finalize(toolchain, editor_path)?;
    if resolved.compiler.as_path() != resolved.toolchain.path() {
        toolchain::verify_driver(&resolved.compiler, env.probe.as_ref())?;
        debug!("C driver {}", resolved.compiler.display());
    }
    Ok(resolved)
}

/// Run `vscch configure`.
pub fn run(options: Options, env: &mut Env) -> Result<GenerationReport> {
    let resolved = resolve(options, env)?;
    let workspace = resolved.workspace();

    let existing = workspace.join(ide::CONFIG_DIR);
    if existing.exists() && !resolved.options.assume_yes {
        let question = format!("{} already exists. Overwrite it?", existing.display());
        if !env.prompter.confirm(&question, true)? {
            bail!("Kept the existing {}; nothing was written", existing.display());
        }
    }

    let platform = resolved.platform();
    let script_dir = editor::script_directory(&resolved.editor_path, platform, env.home.as_deref());
    let cli = (env.editor_cli)(&editor::cli_path(&resolved.editor_path, platform));
    let user_data_dir = resolved
        .options
        .user_data_dir
        .clone()
        .or_else(editor::default_user_data_dir);

    println!(
        "{} Configuring {} for {} ({})",
        "⚙️".cyan(),
        workspace.display().to_string().bold(),
        resolved.language().name(),
        resolved.standard()
    );

    let mut generator = Generator::new(&resolved, script_dir)
        .with_user_data_dir(user_data_dir)
        .with_editor(cli.as_ref());
    if let Some(usage) = &env.usage {
        generator = generator.with_usage_recorder(usage.as_ref());
    }
    let report = generator.generate()?;

    println!(
        "{} Configured with {} (debugger: {})",
        "✓".green(),
        resolved.toolchain.label(),
        generator.layout().debugger.display()
    );
    if report.test_file.is_some() {
        println!("  Open the test file and press {} to build and run.", "F6".bold());
    }
    Ok(report)
}

fn warn_unsupported(extras: &PlatformExtras) {
    match extras {
        PlatformExtras::Windows {
            generate_desktop_shortcut,
            no_set_env,
            ..
        } => {
            if *generate_desktop_shortcut {
                warn!("desktop shortcuts are not supported; ignoring --generate-shortcut");
            }
            if *no_set_env {
                debug!("environment variables are never modified; --no-set-env has no effect");
            }
        }
        PlatformExtras::MacOs { no_install_clt, .. } => {
            if *no_install_clt {
                debug!("command line tools are never installed; --no-install-clt has no effect");
            }
        }
        PlatformExtras::Linux { .. } => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Platform, TestFileMode};
    use crate::extensions::testing::FakeEditor;
    use crate::prompt::testing::ScriptedPrompter;
    use crate::standard::LanguageStandard;
    use crate::toolchain::LanguageSupport;
    use crate::toolchain::testing::FakeProbe;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        tmp: TempDir,
        workspace: PathBuf,
        code: PathBuf,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let workspace = tmp.path().join("ws");
            fs::create_dir(&workspace).unwrap();
            let code = tmp.path().join("code");
            fs::write(&code, "").unwrap();
            Self {
                tmp,
                workspace,
                code,
            }
        }

        fn options(&self) -> Options {
            let mut options = Options::for_platform(Platform::Linux);
            options.workspace = self.workspace.clone();
            options.editor_path = Some(self.code.clone());
            options.user_data_dir = Some(self.tmp.path().join("user"));
            options.generate_test = TestFileMode::Never;
            options.no_analytics = true;
            options
        }

        fn env(&self, prompter: ScriptedPrompter, probe: FakeProbe) -> Env {
            Env {
                prompter: Box::new(prompter),
                probe: Box::new(probe),
                editor_cli: Box::new(|_: &Path| -> Box<dyn EditorCli> {
                    Box::new(FakeEditor::default())
                }),
                usage: None,
                candidates: Some(vec![
                    Candidate::new("/opt/gcc9/bin/g++", LanguageSupport::Cpp),
                    Candidate::new("/usr/bin/clang++", LanguageSupport::Cpp),
                ]),
                home: Some(self.tmp.path().join("home")),
            }
        }
    }

    fn probe() -> FakeProbe {
        FakeProbe::default()
            .with("/opt/gcc9/bin/g++", "g++ (GCC) 9.2.0")
            .with("/usr/bin/clang++", "clang version 14.0.0")
    }

    #[test]
    fn test_assume_yes_takes_first_toolchain() {
        let fx = Fixture::new();
        let mut options = fx.options();
        options.assume_yes = true;
        let mut env = fx.env(ScriptedPrompter::default(), probe());

        let resolved = resolve(options, &mut env).unwrap();
        assert_eq!(resolved.toolchain.version(), "9.2.0");
        assert_eq!(resolved.standard(), LanguageStandard::Cpp17);
        assert_eq!(resolved.compile_args(), ["-std=c++17"]);
    }

    #[test]
    fn test_prompts_between_toolchains() {
        let fx = Fixture::new();
        let mut env = fx.env(ScriptedPrompter::with_indices([1]), probe());
        let resolved = resolve(fx.options(), &mut env).unwrap();
        assert_eq!(resolved.standard(), LanguageStandard::Cpp20);
    }

    #[test]
    fn test_invalid_standard_fails_before_discovery() {
        let fx = Fixture::new();
        let mut options = fx.options();
        options.standard = Some(LanguageStandard::C11);
        let mut env = fx.env(ScriptedPrompter::default(), FakeProbe::default());
        let err = resolve(options, &mut env).unwrap_err();
        assert!(err.to_string().contains("c11"));
    }

    #[test]
    fn test_no_toolchain_writes_nothing() {
        let fx = Fixture::new();
        let mut env = fx.env(ScriptedPrompter::default(), FakeProbe::default());
        assert!(run(fx.options(), &mut env).is_err());
        assert!(!fx.workspace.join(".vscode").exists());
    }

    #[test]
    fn test_explicit_compiler_failure_names_path() {
        let fx = Fixture::new();
        let mut options = fx.options();
        options.compiler = Some("/missing/g++".into());
        let mut env = fx.env(ScriptedPrompter::default(), probe());
        let err = format!("{:#}", resolve(options, &mut env).unwrap_err());
        assert!(err.contains("/missing/g++"), "{err}");
    }

    #[test]
    fn test_overwrite_refusal_keeps_existing_config() {
        let fx = Fixture::new();
        let existing = fx.workspace.join(".vscode");
        fs::create_dir(&existing).unwrap();
        fs::write(existing.join("tasks.json"), "{}").unwrap();

        let mut options = fx.options();
        options.compiler = Some("/opt/gcc9/bin/g++".into());
        let mut env = fx.env(ScriptedPrompter::with_confirms([false]), probe());
        assert!(run(options, &mut env).is_err());
        assert_eq!(fs::read_to_string(existing.join("tasks.json")).unwrap(), "{}");
    }

    #[test]
    fn test_c_on_single_driver_uses_it_as_given() {
        let fx = Fixture::new();
        let mut options = fx.options();
        options.language = crate::config::Language::C;
        options.compiler = Some("/usr/bin/g++".into());
        let probe = FakeProbe::default().with("/usr/bin/g++", "g++ (GCC) 12.2.0");
        let mut env = fx.env(ScriptedPrompter::default(), probe);

        let resolved = resolve(options, &mut env).unwrap();
        assert_eq!(resolved.compiler, PathBuf::from("/usr/bin/g++"));
    }

    #[test]
    fn test_unanswered_c_sibling_fails_with_its_path() {
        let fx = Fixture::new();
        let mut options = fx.options();
        options.language = crate::config::Language::C;
        options.assume_yes = true;
        let mut env = fx.env(
            ScriptedPrompter::default(),
            FakeProbe::default().with("/opt/mingw/bin/g++", "g++ (GCC) 12.2.0"),
        );
        env.candidates = Some(vec![Candidate::new(
            "/opt/mingw/bin/g++",
            LanguageSupport::Both,
        )]);

        let err = format!("{:#}", resolve(options, &mut env).unwrap_err());
        assert!(err.contains("/opt/mingw/bin/gcc"), "{err}");
    }

    #[test]
    fn test_overwrite_question_defaults_to_yes() {
        let fx = Fixture::new();
        fs::create_dir(fx.workspace.join(".vscode")).unwrap();
        let mut options = fx.options();
        options.compiler = Some("/opt/gcc9/bin/g++".into());
        let prompter = ScriptedPrompter::with_confirms([true]);
        let defaults = prompter.confirm_defaults.clone();
        let mut env = fx.env(prompter, probe());

        run(options, &mut env).unwrap();
        assert_eq!(*defaults.borrow(), vec![true]);
    }

    #[test]
    fn test_run_writes_configuration() {
        let fx = Fixture::new();
        let mut options = fx.options();
        options.compiler = Some("/opt/gcc9/bin/g++".into());
        options.compile_args = vec!["-Wall".into(), "-std=c++11".into()];
        let mut env = fx.env(ScriptedPrompter::default(), probe());

        let report = run(options, &mut env).unwrap();
        assert_eq!(report.documents.len(), 4);
        assert_eq!(report.scripts.len(), 2);
        assert!(
            report.scripts[0].starts_with(fx.tmp.path().join("home/.vscode/scripts")),
            "{:?}",
            report.scripts
        );

        let tasks = fs::read_to_string(fx.workspace.join(".vscode/tasks.json")).unwrap();
        assert!(tasks.contains("-std=c++11"));
        assert!(!tasks.contains("-std=c++17"));
        let ext = report.extensions.unwrap();
        assert_eq!(ext.installed, vec![crate::extensions::CPPTOOLS]);
    }
}
