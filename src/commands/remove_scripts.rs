//! Remove-scripts command handler
//!
//! Handles `vscch remove-scripts`, which deletes the helper scripts that
//! `configure` installs. Safe to run any number of times.

use anyhow::Result;
use colored::*;
use std::path::{Path, PathBuf};

use crate::config::Platform;
use crate::editor;
use crate::ide::scripts;

/// The directory `configure` writes helpers into. Only Windows needs the
/// editor location for that.
pub fn script_directory(
    editor_path: Option<&Path>,
    platform: Platform,
    home: Option<&Path>,
) -> Result<PathBuf> {
    let editor = match platform {
        Platform::Windows => editor::resolve(editor_path, platform)?,
        Platform::Linux | Platform::MacOs => {
            editor_path.map(Path::to_path_buf).unwrap_or_default()
        }
    };
    Ok(editor::script_directory(&editor, platform, home))
}

/// Run `vscch remove-scripts`.
pub fn run(
    editor_path: Option<&Path>,
    platform: Platform,
    home: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let dir = script_directory(editor_path, platform, home)?;
    let removed = scripts::remove_scripts(&dir)?;
    if removed.is_empty() {
        println!("{} No helper scripts in {}", "✓".green(), dir.display());
    } else {
        for path in &removed {
            println!(
                "   {} Removed {}",
                "-".yellow(),
                path.file_name().unwrap_or_default().to_string_lossy()
            );
        }
        println!(
            "{} Removed {} helper script(s) from {}",
            "✓".green(),
            removed.len(),
            dir.display()
        );
    }
    Ok(removed)
}
