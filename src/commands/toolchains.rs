//! Toolchains command handler
//!
//! Handles `vscch toolchains`, listing every compiler `configure` could use.

use anyhow::Result;
use colored::*;

use crate::config::Platform;
use crate::toolchain::{self, ToolchainInfo, VersionProbe};
use crate::ui;

/// One row per toolchain, in selection order.
pub fn table(toolchains: &[ToolchainInfo]) -> ui::Table {
    let mut table = ui::Table::new(&["#", "Compiler", "Version", "Languages", "Path"]);
    for (i, info) in toolchains.iter().enumerate() {
        let name = match info.package() {
            Some(package) => format!("{} ({})", info.family(), package),
            None => info.family().to_string(),
        };
        table.add_row(vec![
            i.to_string(),
            name,
            info.version().to_string(),
            info.languages().to_string(),
            info.path().display().to_string(),
        ]);
    }
    table
}

/// Run `vscch toolchains`.
pub fn run(platform: Platform, probe: &dyn VersionProbe) -> Result<Vec<ToolchainInfo>> {
    println!("{} Scanning for compilers...", "🔍".cyan());
    let found = toolchain::detect_all(platform, probe);
    if found.is_empty() {
        println!("{} No toolchains found.", "x".red());
        println!("  Install GCC or Clang and make sure it is on PATH.");
    } else {
        table(&found).print();
    }
    Ok(found)
}
