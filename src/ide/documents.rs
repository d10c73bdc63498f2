//! The `.vscode` documents, as JSON values.
//!
//! Everything here is pure: the same [`ResolvedOptions`] and [`Layout`]
//! always render to the same bytes. All documents take the compiler, the
//! debugger and the argument list from the same place, so they cannot drift
//! apart.

use serde_json::{Value, json};
use std::path::{Path, PathBuf};

use super::scripts;
use crate::config::{Language, Platform, ResolvedOptions};
use crate::toolchain::CompilerFamily;

pub const BUILD_TASK: &str = "single file build";
pub const RUN_TASK: &str = "run and pause";
pub const ASCII_TASK: &str = "check non-ascii";
pub const DEBUG_CONFIG: &str = "single file debug";

/// Paths decided outside the documents themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub debugger: PathBuf,
    pub script_dir: PathBuf,
}

/// `${fileDirname}/${fileBasenameNoExtension}.out` or the Windows `.exe` form.
pub fn program_expr(platform: Platform) -> String {
    format!(
        "${{fileDirname}}{}${{fileBasenameNoExtension}}.{}",
        platform.path_separator(),
        platform.exe_extension()
    )
}

pub fn display(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn script(layout: &Layout, name: &str) -> String {
    display(&layout.script_dir.join(name))
}

pub fn tasks(resolved: &ResolvedOptions, layout: &Layout) -> Value {
    let platform = resolved.platform();
    let program = program_expr(platform);
    let ascii_check = resolved.options.extras.apply_non_ascii_check();

    let mut args: Vec<String> = resolved.compile_args().to_vec();
    args.extend(["-g".into(), "${file}".into(), "-o".into(), program.clone()]);

    let mut build = json!({
        "label": BUILD_TASK,
        "type": "process",
        "command": display(&resolved.compiler),
        "args": args,
        "options": { "cwd": "${fileDirname}" },
        "presentation": {
            "reveal": "silent",
            "focus": false,
            "echo": false,
            "showReuseMessage": true,
            "panel": "shared",
            "clear": false
        },
        "problemMatcher": "$gcc",
        "group": { "kind": "build", "isDefault": true }
    });
    if ascii_check {
        build["dependsOn"] = json!(ASCII_TASK);
    }

    let external = resolved.options.external_terminal;
    let (command, run_args) = run_command(platform, external, layout, &program);
    let run = json!({
        "label": RUN_TASK,
        "type": "shell",
        "command": command,
        "args": run_args,
        "options": { "cwd": "${fileDirname}" },
        "presentation": {
            "reveal": "always",
            "focus": true,
            "panel": "new"
        },
        "problemMatcher": [],
        "dependsOn": BUILD_TASK
    });

    let mut list = vec![build, run];
    if ascii_check {
        list.push(json!({
            "label": ASCII_TASK,
            "type": "process",
            "command": "powershell",
            "args": [
                "-ExecutionPolicy", "ByPass", "-NoProfile", "-File",
                script(layout, scripts::CHECK_ASCII),
                "${file}"
            ],
            "presentation": { "reveal": "silent", "echo": false, "panel": "shared" },
            "problemMatcher": []
        }));
    }

    json!({
        "version": "2.0.0",
        "tasks": list
    })
}

fn run_command(
    platform: Platform,
    external: bool,
    layout: &Layout,
    program: &str,
) -> (String, Vec<String>) {
    match platform {
        Platform::Windows => {
            let mut args = vec![
                "-ExecutionPolicy".to_string(),
                "ByPass".to_string(),
                "-NoProfile".to_string(),
                "-File".to_string(),
                script(layout, scripts::PAUSE_CONSOLE_PS1),
                program.to_string(),
            ];
            if external {
                args.insert(0, "powershell".to_string());
                ("START".to_string(), args)
            } else {
                ("powershell".to_string(), args)
            }
        }
        Platform::Linux => {
            let name = if external {
                scripts::PAUSE_CONSOLE_LAUNCHER
            } else {
                scripts::PAUSE_CONSOLE_SH
            };
            ("bash".to_string(), vec![script(layout, name), program.to_string()])
        }
        Platform::MacOs => {
            let mut args = vec![script(layout, scripts::PAUSE_CONSOLE_RB)];
            if external {
                args.push("--external".to_string());
            }
            args.push(program.to_string());
            ("ruby".to_string(), args)
        }
    }
}

pub fn launch(resolved: &ResolvedOptions, layout: &Layout) -> Value {
    let family = resolved.toolchain.family();
    let mut config = json!({
        "name": DEBUG_CONFIG,
        "type": "cppdbg",
        "request": "launch",
        "program": program_expr(resolved.platform()),
        "args": [],
        "stopAtEntry": false,
        "cwd": "${fileDirname}",
        "environment": [],
        "externalConsole": resolved.options.external_terminal,
        "MIMode": family.debugger_name(),
        "miDebuggerPath": display(&layout.debugger),
        "preLaunchTask": BUILD_TASK,
        "internalConsoleOptions": "neverOpen"
    });
    if family == CompilerFamily::Gcc {
        config["setupCommands"] = json!([
            {
                "description": "Enable pretty-printing for gdb",
                "text": "-enable-pretty-printing",
                "ignoreFailures": true
            }
        ]);
    }

    json!({
        "version": "0.2.0",
        "configurations": [config]
    })
}

/// IntelliSense mode architecture suffix for a Rust `ARCH` name.
pub fn intellisense_arch(arch: &str) -> &'static str {
    match arch {
        "x86" => "x86",
        "aarch64" => "arm64",
        "arm" => "arm",
        _ => "x64",
    }
}

pub fn properties(resolved: &ResolvedOptions) -> Value {
    let platform = resolved.platform();
    let mut include_path = vec!["${workspaceFolder}/**".to_string()];
    if platform == Platform::MacOs {
        include_path.push("/usr/local/include".to_string());
    }

    json!({
        "configurations": [
            {
                "name": platform.properties_name(),
                "includePath": include_path,
                "defines": [],
                "compilerPath": display(&resolved.compiler),
                "compilerArgs": resolved.compile_args(),
                "cStandard": resolved.standards.c.as_str(),
                "cppStandard": resolved.standards.cpp.as_str(),
                "intelliSenseMode": format!(
                    "{}-{}-{}",
                    platform.intellisense_prefix(),
                    resolved.toolchain.family().as_str(),
                    intellisense_arch(&resolved.arch)
                )
            }
        ],
        "version": 4
    })
}

pub fn settings(resolved: &ResolvedOptions) -> Value {
    let language = resolved.language();
    json!({
        "files.defaultLanguage": language.vscode_id(),
        "editor.formatOnType": true,
        "editor.suggest.snippetsPreventQuickSuggestions": false,
        "editor.acceptSuggestionOnEnter": "off",
        "C_Cpp.clang_format_sortIncludes": true,
        "C_Cpp.errorSquiggles": "enabled",
        "C_Cpp.intelliSenseEngine": "default",
        "C_Cpp.default.compilerPath": display(&resolved.compiler),
        "C_Cpp.default.cStandard": resolved.standards.c.as_str(),
        "C_Cpp.default.cppStandard": resolved.standards.cpp.as_str(),
        "debug.onTaskErrors": "abort",
        "debug.showBreakpointsInOverviewRuler": true,
        "files.associations": if language == Language::C {
            json!({ "*.h": "c" })
        } else {
            json!({})
        }
    })
}

/// Pretty JSON with a trailing newline.
pub fn render(value: &Value) -> String {
    let mut text = serde_json::to_string_pretty(value).unwrap_or_default();
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Options, PlatformExtras};
    use crate::toolchain::{LanguageSupport, ToolchainInfo};

    fn resolved(platform: Platform, banner: &str, compiler: &str) -> ResolvedOptions {
        let mut options = Options::for_platform(platform);
        options.workspace = PathBuf::from("/ws");
        options.compile_args = vec!["-Wall".into(), "-std=c++11".into(), "-O2".into()];
        options.standard = Some(crate::standard::LanguageStandard::Cpp17);
        let info =
            ToolchainInfo::from_version_output(compiler, LanguageSupport::Both, banner).unwrap();
        options.finalize(info, PathBuf::from("code")).unwrap()
    }

    fn layout() -> Layout {
        Layout {
            debugger: PathBuf::from("/usr/bin/gdb"),
            script_dir: PathBuf::from("/home/u/.vscode/scripts"),
        }
    }

    #[test]
    fn test_program_expr() {
        assert_eq!(
            program_expr(Platform::Linux),
            "${fileDirname}/${fileBasenameNoExtension}.out"
        );
        assert_eq!(
            program_expr(Platform::Windows),
            "${fileDirname}\\${fileBasenameNoExtension}.exe"
        );
    }

    #[test]
    fn test_build_task_has_single_std_flag() {
        let r = resolved(Platform::Linux, "g++ (GCC) 12.1.0", "/usr/bin/g++");
        let doc = tasks(&r, &layout());
        let args: Vec<&str> = doc["tasks"][0]["args"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(args.iter().filter(|a| a.starts_with("-std=")).count(), 1);
        assert_eq!(&args[..3], ["-Wall", "-O2", "-std=c++17"]);
        assert_eq!(doc["tasks"][0]["command"], "/usr/bin/g++");
        assert_eq!(doc["tasks"][1]["command"], "bash");
        assert_eq!(doc["tasks"][1]["dependsOn"], BUILD_TASK);
    }

    #[test]
    fn test_documents_share_compiler_and_args() {
        let r = resolved(Platform::Linux, "g++ (GCC) 12.1.0", "/usr/bin/g++");
        let t = tasks(&r, &layout());
        let p = properties(&r);
        let l = launch(&r, &layout());
        let s = settings(&r);

        let props = &p["configurations"][0];
        assert_eq!(t["tasks"][0]["command"], props["compilerPath"]);
        assert_eq!(s["C_Cpp.default.compilerPath"], props["compilerPath"]);
        assert_eq!(props["compilerArgs"], json!(r.compile_args()));
        assert_eq!(props["cppStandard"], "c++17");
        let mode = props["intelliSenseMode"].as_str().unwrap();
        assert_eq!(mode.split('-').nth(1), Some("gcc"));
        assert_eq!(l["configurations"][0]["program"], t["tasks"][0]["args"][6]);
        assert_eq!(l["configurations"][0]["preLaunchTask"], t["tasks"][0]["label"]);
    }

    #[test]
    fn test_windows_ascii_check_task() {
        let mut r = resolved(
            Platform::Windows,
            "g++.exe (MinGW-W64) 8.1.0",
            r"C:\mingw64\bin\g++.exe",
        );
        r.options.extras = PlatformExtras::Windows {
            apply_non_ascii_check: true,
            generate_desktop_shortcut: false,
            no_set_env: false,
        };
        r.options.external_terminal = true;
        let doc = tasks(&r, &layout());
        let list = doc["tasks"].as_array().unwrap();
        assert_eq!(list.len(), 3);
        assert_eq!(list[0]["dependsOn"], ASCII_TASK);
        assert_eq!(list[1]["command"], "START");
        assert_eq!(list[2]["label"], ASCII_TASK);
        assert_eq!(properties(&r)["configurations"][0]["name"], "Win32");
    }

    #[test]
    fn test_clang_launch_uses_lldb() {
        let r = resolved(Platform::MacOs, "Apple clang version 15.0.0", "/usr/bin/clang++");
        let mut l = layout();
        l.debugger = PathBuf::from("lldb");
        let doc = launch(&r, &l);
        let config = &doc["configurations"][0];
        assert_eq!(config["MIMode"], "lldb");
        assert!(config.get("setupCommands").is_none());
        let props = properties(&r);
        assert_eq!(props["configurations"][0]["name"], "Mac");
        assert_eq!(props["configurations"][0]["includePath"][1], "/usr/local/include");
    }

    #[test]
    fn test_render_is_deterministic() {
        let r = resolved(Platform::Linux, "g++ (GCC) 12.1.0", "/usr/bin/g++");
        assert_eq!(render(&tasks(&r, &layout())), render(&tasks(&r, &layout())));
        assert!(render(&settings(&r)).ends_with("}\n"));
    }

    #[test]
    fn test_intellisense_arch() {
        assert_eq!(intellisense_arch("x86_64"), "x64");
        assert_eq!(intellisense_arch("aarch64"), "arm64");
    }
}
