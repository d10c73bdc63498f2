//! Anonymous usage events.
//!
//! Events are only appended to a local JSON Lines file; nothing is sent
//! anywhere.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::ResolvedOptions;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub tool_version: String,
    pub platform: String,
    pub language: String,
    pub standard: String,
    pub family: String,
    pub compiler_version: String,
}

impl UsageEvent {
    /// Describes a run without any path or user-identifying detail.
    pub fn from_resolved(resolved: &ResolvedOptions) -> Self {
        Self {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            platform: resolved.platform().properties_name().to_string(),
            language: resolved.language().to_string(),
            standard: resolved.standard().to_string(),
            family: resolved.toolchain.family().to_string(),
            compiler_version: resolved.toolchain.version().to_string(),
        }
    }
}

pub trait UsageRecorder {
    fn record(&self, event: &UsageEvent) -> Result<()>;
}

/// Appends events to `usage.jsonl` under the local data directory.
#[derive(Debug, Clone)]
pub struct LocalUsageLog {
    path: PathBuf,
}

impl LocalUsageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data_local_dir>/vscch/usage.jsonl`
    pub fn default_location() -> Option<Self> {
        dirs::data_local_dir().map(|d| Self::new(d.join("vscch").join("usage.jsonl")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl UsageRecorder for LocalUsageLog {
    fn record(&self, event: &UsageEvent) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open {}", self.path.display()))?;
        let line = serde_json::to_string(event)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
