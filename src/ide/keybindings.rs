//! The F6 shortcut in the user's `keybindings.json`.

use anyhow::{Context, Result};
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tracing::warn;

use super::write_atomic;

pub const RUN_KEY: &str = "f6";
pub const RUN_COMMAND: &str = "workbench.action.tasks.runTask";

/// Outcome of a merge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeybindingUpdate {
    Written,
    /// The existing file could not be understood and was left alone.
    Skipped,
}

/// Drops whole-line `//` comments, which VS Code puts in a fresh file.
fn strip_line_comments(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("//"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Returns `existing` with any binding of `key`, or of `command` with the
/// same `args`, replaced by the new one.
pub fn merge(existing: Vec<Value>, key: &str, command: &str, args: &str) -> Vec<Value> {
    let mut merged: Vec<Value> = existing
        .into_iter()
        .filter(|binding| {
            let same_key = binding["key"].as_str() == Some(key);
            let same_command = binding["command"].as_str() == Some(command)
                && binding["args"].as_str() == Some(args);
            !same_key && !same_command
        })
        .collect();
    merged.push(json!({ "key": key, "command": command, "args": args }));
    merged
}

/// Binds F6 to the task named `task` in `<user_dir>/keybindings.json`.
pub fn add_run_binding(user_dir: &Path, task: &str) -> Result<KeybindingUpdate> {
    let path = user_dir.join("keybindings.json");
    let existing = match fs::read_to_string(&path) {
        Ok(text) => {
            let stripped = strip_line_comments(&text);
            if stripped.trim().is_empty() {
                Vec::new()
            } else {
                match serde_json::from_str::<Vec<Value>>(&stripped) {
                    Ok(list) => list,
                    Err(e) => {
                        warn!("leaving {} untouched: {}", path.display(), e);
                        return Ok(KeybindingUpdate::Skipped);
                    }
                }
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(e).with_context(|| format!("Failed to read {}", path.display())),
    };

    let merged = merge(existing, RUN_KEY, RUN_COMMAND, task);
    fs::create_dir_all(user_dir)
        .with_context(|| format!("Failed to create {}", user_dir.display()))?;
    let mut text = serde_json::to_string_pretty(&merged)?;
    text.push('\n');
    write_atomic(&path, text.as_bytes(), 0o644)?;
    Ok(KeybindingUpdate::Written)
}
