//! # vscch CLI Entry Point
//!
//! Parses the command line with clap and routes each subcommand to its
//! handler in [`vscch::commands`].
//!
//! - `configure`: write `.vscode` for a workspace
//! - `remove-scripts`: delete the installed helper scripts
//! - `toolchains`: list the compilers that were found
//! - `completion`: print a shell completion script

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use colored::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vscch::commands;
use vscch::config::{Language, Options, Platform, PlatformExtras, Profile, TestFileMode};
use vscch::standard::LanguageStandard;
use vscch::toolchain::ProcessProbe;

#[derive(Parser)]
#[command(name = "vscch")]
#[command(about = "Set up VS Code for C and C++", version = env!("CARGO_PKG_VERSION"))]
#[command(propagate_version = true)]
struct Cli {
    /// Show debug output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the .vscode configuration for a workspace
    Configure(ConfigureArgs),
    /// Remove the helper scripts installed by `configure`
    RemoveScripts {
        /// Path to the VS Code executable
        #[arg(long)]
        vscode_path: Option<PathBuf>,
    },
    /// List the compilers that `configure` can use
    Toolchains,
    /// Generate shell completions
    Completion { shell: Shell },
}

#[derive(Args)]
struct ConfigureArgs {
    /// Workspace folder to configure
    #[arg(short = 'w', long)]
    workspace_path: Option<PathBuf>,

    /// Path to the VS Code executable (detected if omitted)
    #[arg(long)]
    vscode_path: Option<PathBuf>,

    /// Compiler name or path; on Windows the MinGW folder
    #[arg(short = 'c', long)]
    compiler: Option<String>,

    /// Target language: c++ or c
    #[arg(long)]
    language: Option<Language>,

    /// Language standard, e.g. c++17 or c11 (newest supported if omitted)
    #[arg(long)]
    language_standard: Option<LanguageStandard>,

    /// Extra compiler argument (repeatable)
    #[arg(short = 'a', long = "compile-arg", allow_hyphen_values = true)]
    compile_args: Vec<String>,

    /// Run programs in an external terminal
    #[arg(short = 'e', long)]
    external_terminal: bool,

    /// Install the Chinese (Simplified) language pack
    #[arg(long)]
    install_chinese: bool,

    /// Uninstall extensions known to conflict with the C/C++ extension
    #[arg(long)]
    uninstall_extensions: bool,

    /// Always create a test source file
    #[arg(long, conflicts_with = "no_generate_test")]
    generate_test: bool,

    /// Never create a test source file
    #[arg(long)]
    no_generate_test: bool,

    /// Open VS Code when done
    #[arg(short = 'o', long)]
    open_vscode: bool,

    /// Do not record the anonymous usage event
    #[arg(long)]
    no_send_analytics: bool,

    /// Answer yes to every question
    #[arg(short = 'y', long)]
    assume_yes: bool,

    /// Beginner preset (implies -y -e -o, extension cleanup and warnings)
    #[arg(short = 'n', long)]
    newbie_mode: bool,

    /// Debugger to use instead of the one next to the compiler (Linux/macOS)
    #[arg(long)]
    debugger: Option<PathBuf>,

    /// Check source file names for non-ASCII characters before building (Windows)
    #[arg(long)]
    apply_nonascii_check: bool,

    /// Create a desktop shortcut (Windows, not supported)
    #[arg(long)]
    generate_shortcut: bool,

    /// Do not modify environment variables (Windows)
    #[arg(long)]
    no_set_env: bool,

    /// Do not offer to install the command line tools (macOS)
    #[arg(long)]
    no_install_clt: bool,

    /// Load answers from a TOML profile; flags given here take precedence
    #[arg(long)]
    profile: Option<PathBuf>,

    /// Save the effective answers as a TOML profile
    #[arg(long)]
    save_profile: Option<PathBuf>,
}

impl ConfigureArgs {
    /// Defaults, then the profile, then the newbie preset, then explicit flags.
    fn into_options(self, platform: Platform) -> Result<Options> {
        let mut options = Options::for_platform(platform);
        if let Some(path) = &self.profile {
            Profile::load(path)?.apply_to(&mut options);
        }
        if self.newbie_mode {
            options.apply_newbie_preset();
        }

        if let Some(v) = self.workspace_path {
            options.workspace = v;
        }
        if !options.workspace.as_os_str().is_empty() {
            options.workspace = std::path::absolute(&options.workspace)
                .with_context(|| format!("Invalid workspace {}", options.workspace.display()))?;
        }
        if let Some(v) = self.vscode_path {
            options.editor_path = Some(v);
        }
        if let Some(v) = self.compiler {
            options.compiler = Some(v);
        }
        if let Some(v) = self.language {
            options.language = v;
        }
        if let Some(v) = self.language_standard {
            options.standard = Some(v);
        }
        if !self.compile_args.is_empty() {
            options.compile_args = self.compile_args;
        }
        options.external_terminal |= self.external_terminal;
        options.install_l10n |= self.install_chinese;
        options.uninstall_extensions |= self.uninstall_extensions;
        options.open_editor |= self.open_vscode;
        options.no_analytics |= self.no_send_analytics;
        options.assume_yes |= self.assume_yes;
        if self.generate_test {
            options.generate_test = TestFileMode::Always;
        } else if self.no_generate_test {
            options.generate_test = TestFileMode::Never;
        }

        match &mut options.extras {
            PlatformExtras::Windows {
                apply_non_ascii_check,
                generate_desktop_shortcut,
                no_set_env,
            } => {
                *apply_non_ascii_check |= self.apply_nonascii_check;
                *generate_desktop_shortcut |= self.generate_shortcut;
                *no_set_env |= self.no_set_env;
            }
            PlatformExtras::Linux { debugger } => {
                if self.debugger.is_some() {
                    *debugger = self.debugger;
                }
            }
            PlatformExtras::MacOs {
                debugger,
                no_install_clt,
            } => {
                if self.debugger.is_some() {
                    *debugger = self.debugger;
                }
                *no_install_clt |= self.no_install_clt;
            }
        }
        Ok(options)
    }
}

fn main() {
    // Only 0 and 1 leave this binary; clap's usage errors would exit with 2.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };
    if let Err(e) = run(cli) {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let filter = if cli.verbose {
        EnvFilter::new("vscch=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vscch=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    let platform = Platform::current();
    match cli.command {
        Commands::Configure(args) => {
            let save_profile = args.save_profile.clone();
            let options = args.into_options(platform)?;
            if let Some(path) = &save_profile {
                Profile::from_options(&options).save(path)?;
                println!("{} Saved profile to {}", "✓".green(), path.display());
            }
            commands::configure::run(options, &mut commands::configure::Env::system())?;
            Ok(())
        }
        Commands::RemoveScripts { vscode_path } => {
            let home = dirs::home_dir();
            commands::remove_scripts::run(vscode_path.as_deref(), platform, home.as_deref())?;
            Ok(())
        }
        Commands::Toolchains => {
            commands::toolchains::run(platform, &ProcessProbe::default())?;
            Ok(())
        }
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
    }
}
