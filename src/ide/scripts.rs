//! Helper scripts used by the generated tasks.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::write_atomic;
use crate::config::Platform;

pub const PAUSE_CONSOLE_PS1: &str = "pause-console.ps1";
pub const CHECK_ASCII: &str = "check-ascii.ps1";
pub const PAUSE_CONSOLE_SH: &str = "pause-console.sh";
pub const PAUSE_CONSOLE_LAUNCHER: &str = "pause-console-launcher.sh";
pub const PAUSE_CONSOLE_RB: &str = "pause-console.rb";

/// Every helper filename on every platform; `remove-scripts` deletes these.
pub const SCRIPT_FILENAMES: &[&str] = &[
    CHECK_ASCII,
    PAUSE_CONSOLE_LAUNCHER,
    PAUSE_CONSOLE_PS1,
    PAUSE_CONSOLE_SH,
    PAUSE_CONSOLE_RB,
];

const PAUSE_CONSOLE_PS1_BODY: &str = r#"# Runs a program, then waits for a key press.
$Host.UI.RawUI.WindowTitle = $args[0]
$watch = [System.Diagnostics.Stopwatch]::StartNew()
& $args[0]
$code = $LASTEXITCODE
$watch.Stop()
$seconds = [math]::Round($watch.Elapsed.TotalSeconds, 3)
Write-Host ""
Write-Host "----------------"
Write-Host "Process exited after $seconds seconds with return value $code"
Write-Host "Press any key to continue..."
$null = $Host.UI.RawUI.ReadKey("NoEcho,IncludeKeyDown")
"#;

const CHECK_ASCII_BODY: &str = r#"# MinGW cannot open source files whose path has non-ASCII characters.
if ($args[0] -match '[^\x00-\x7F]') {
    Write-Host "Path contains non-ASCII characters: $($args[0])" -ForegroundColor Red
    Write-Host "Rename the file or the folders above it and build again." -ForegroundColor Red
    exit 1
}
exit 0
"#;

const PAUSE_CONSOLE_SH_BODY: &str = r#"#!/usr/bin/env bash
# Runs a program, then waits for a key press.
start=$(date +%s%N)
"$@"
code=$?
end=$(date +%s%N)
elapsed=$(awk "BEGIN { printf \"%.3f\", ($end - $start) / 1000000000 }")
echo
echo "----------------"
echo "Process exited after ${elapsed} seconds with return value ${code}"
read -n 1 -s -r -p "Press any key to continue..."
echo
"#;

const PAUSE_CONSOLE_LAUNCHER_BODY: &str = r#"#!/usr/bin/env bash
# Opens pause-console.sh in a new terminal window.
dir=$(dirname "$(readlink -f "$0")")
for term in x-terminal-emulator gnome-terminal konsole xfce4-terminal xterm; do
    if command -v "$term" > /dev/null 2>&1; then
        case "$term" in
            gnome-terminal) exec "$term" -- bash "$dir/pause-console.sh" "$@" ;;
            *) exec "$term" -e bash "$dir/pause-console.sh" "$@" ;;
        esac
    fi
done
echo "No terminal emulator found." >&2
exit 1
"#;

const PAUSE_CONSOLE_RB_BODY: &str = r##"#!/usr/bin/env ruby
# Runs a program, then waits for a key press.
# With --external the same happens in a new Terminal.app window.
require 'io/console'
require 'shellwords'

if ARGV.first == '--external'
  ARGV.shift
  command = Shellwords.join(['ruby', File.expand_path(__FILE__)] + ARGV)
  escaped = command.gsub(/[\\"]/) { |c| "\\#{c}" }
  system('osascript',
         '-e', "tell application \"Terminal\" to do script \"#{escaped}\"",
         '-e', 'tell application "Terminal" to activate')
  exit
end

start = Process.clock_gettime(Process::CLOCK_MONOTONIC)
system(*ARGV)
code = $?.exitstatus || -1
elapsed = Process.clock_gettime(Process::CLOCK_MONOTONIC) - start
puts
puts '----------------'
printf("Process exited after %.3f seconds with return value %d\n", elapsed, code)
print 'Press any key to continue...'
STDIN.getch
puts
"##;

/// `(filename, contents, executable)` for each helper on `platform`.
pub fn scripts_for(platform: Platform) -> Vec<(&'static str, &'static str, bool)> {
    match platform {
        Platform::Windows => vec![
            (PAUSE_CONSOLE_PS1, PAUSE_CONSOLE_PS1_BODY, false),
            (CHECK_ASCII, CHECK_ASCII_BODY, false),
        ],
        Platform::Linux => vec![
            (PAUSE_CONSOLE_SH, PAUSE_CONSOLE_SH_BODY, true),
            (PAUSE_CONSOLE_LAUNCHER, PAUSE_CONSOLE_LAUNCHER_BODY, true),
        ],
        Platform::MacOs => vec![(PAUSE_CONSOLE_RB, PAUSE_CONSOLE_RB_BODY, true)],
    }
}

/// Writes the platform's helpers into `dir`, creating it if needed.
pub fn write_scripts(dir: &Path, platform: Platform) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create script directory {}", dir.display()))?;

    let mut written = Vec::new();
    for (name, body, executable) in scripts_for(platform) {
        let path = dir.join(name);
        let mode = if executable { 0o755 } else { 0o644 };
        write_atomic(&path, body.as_bytes(), mode)?;
        debug!("wrote script {}", path.display());
        written.push(path);
    }
    Ok(written)
}

/// Deletes every known helper from `dir`. Missing files, or a missing
/// directory, are not errors.
pub fn remove_scripts(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    for name in SCRIPT_FILENAMES {
        let path = dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => removed.push(path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to remove {}", path.display()));
            }
        }
    }
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_then_remove() {
        let dir = TempDir::new().unwrap();
        let scripts = dir.path().join("scripts");

        let written = write_scripts(&scripts, Platform::Linux).unwrap();
        assert_eq!(written.len(), 2);
        assert!(scripts.join(PAUSE_CONSOLE_SH).is_file());

        let removed = remove_scripts(&scripts).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(remove_scripts(&scripts).unwrap().is_empty());
    }

    #[test]
    fn test_remove_on_missing_directory() {
        let dir = TempDir::new().unwrap();
        let removed = remove_scripts(&dir.path().join("never-created")).unwrap();
        assert!(removed.is_empty());
    }

    #[test]
    fn test_every_platform_script_is_removable() {
        for platform in [Platform::Windows, Platform::Linux, Platform::MacOs] {
            for (name, body, _) in scripts_for(platform) {
                assert!(SCRIPT_FILENAMES.contains(&name));
                assert!(!body.is_empty());
            }
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_posix_scripts_are_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        write_scripts(dir.path(), Platform::Linux).unwrap();
        let mode = fs::metadata(dir.path().join(PAUSE_CONSOLE_LAUNCHER))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
