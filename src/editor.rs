//! Locating VS Code and the directories it uses.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::Platform;

/// Finds the editor executable without user input.
///
/// Windows: the `vscode://` URL handler in the registry, then the per-user
/// install under `%LOCALAPPDATA%`, then `code` on `PATH`.
/// Elsewhere: `code` on `PATH` (plus the standard app bundle on macOS).
pub fn detect(platform: Platform) -> Option<PathBuf> {
    match platform {
        Platform::Windows => registry_editor()
            .or_else(|| {
                dirs::data_local_dir()
                    .map(|d| d.join("Programs").join("Microsoft VS Code").join("Code.exe"))
                    .filter(|p| p.is_file())
            })
            .or_else(|| {
                // PATH holds `<install>\bin\code.cmd`
                let cmd = which::which("code").ok()?;
                let exe = cmd.parent()?.parent()?.join("Code.exe");
                exe.is_file().then_some(exe)
            }),
        Platform::Linux => which::which("code").ok(),
        Platform::MacOs => which::which("code").ok().or_else(|| {
            let bundled = PathBuf::from(
                "/Applications/Visual Studio Code.app/Contents/Resources/app/bin/code",
            );
            bundled.is_file().then_some(bundled)
        }),
    }
}

/// Uses `explicit` if given (it must exist), otherwise [`detect`]s.
pub fn resolve(explicit: Option<&Path>, platform: Platform) -> Result<PathBuf> {
    match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("VS Code path {} does not exist", path.display());
            }
            info!("using VS Code at {}", path.display());
            Ok(path.to_path_buf())
        }
        None => {
            let path = detect(platform)
                .context("VS Code not found; install it or pass --vscode-path")?;
            info!("detected VS Code at {}", path.display());
            Ok(path)
        }
    }
}

/// The command line entry point (`code`), used for extensions and launching.
pub fn cli_path(editor: &Path, platform: Platform) -> PathBuf {
    match platform {
        Platform::Windows => match editor.parent() {
            Some(dir) => dir.join("bin").join("code.cmd"),
            None => PathBuf::from("code.cmd"),
        },
        Platform::Linux | Platform::MacOs => editor.to_path_buf(),
    }
}

/// Where the helper scripts live.
///
/// On Windows next to `Code.exe`; system installs elsewhere are read-only,
/// so POSIX uses the per-user `~/.vscode/scripts`.
pub fn script_directory(editor: &Path, platform: Platform, home: Option<&Path>) -> PathBuf {
    match platform {
        Platform::Windows => editor
            .parent()
            .map(|dir| dir.join("scripts"))
            .unwrap_or_else(|| PathBuf::from("scripts")),
        Platform::Linux | Platform::MacOs => home
            .map(|h| h.join(".vscode").join("scripts"))
            .unwrap_or_else(|| PathBuf::from(".vscode").join("scripts")),
    }
}

/// `<config dir>/Code/User`, where `keybindings.json` lives.
pub fn default_user_data_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("Code").join("User"))
}

/// Extracts the executable from a shell open command such as
/// `"C:\VS Code\Code.exe" --open-url -- "%1"`.
pub fn parse_open_command(command: &str) -> Option<PathBuf> {
    let command = command.trim();
    let exe = match command.strip_prefix('"') {
        Some(rest) => rest.split('"').next()?,
        None => command.split_whitespace().next()?,
    };
    (!exe.is_empty()).then(|| PathBuf::from(exe))
}

#[cfg(windows)]
fn registry_editor() -> Option<PathBuf> {
    use winreg::RegKey;
    use winreg::enums::HKEY_CLASSES_ROOT;

    let key = RegKey::predef(HKEY_CLASSES_ROOT)
        .open_subkey(r"vscode\shell\open\command")
        .ok()?;
    let command: String = key.get_value("").ok()?;
    parse_open_command(&command).filter(|p| p.is_file())
}

#[cfg(not(windows))]
fn registry_editor() -> Option<PathBuf> {
    None
}
