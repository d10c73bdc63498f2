//! VS Code configuration generator.
//!
//! Given a [`ResolvedOptions`] the [`Generator`] writes the `.vscode`
//! documents, the helper scripts, the F6 keybinding and optionally a test
//! source, then reconciles extensions and opens the editor. It overwrites
//! unconditionally; asking first is the caller's job.

pub mod documents;
pub mod keybindings;
pub mod scripts;

pub use documents::Layout;

use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::config::{Language, Platform, ResolvedOptions, TestFileMode};
use crate::extensions::{self, EditorCli, ExtensionManager, ReconcileReport};
use crate::telemetry::{UsageEvent, UsageRecorder};

pub const CONFIG_DIR: &str = ".vscode";

/// What one generation run touched.
#[derive(Debug, Default)]
pub struct GenerationReport {
    pub documents: Vec<PathBuf>,
    pub scripts: Vec<PathBuf>,
    pub keybindings: Option<PathBuf>,
    pub test_file: Option<PathBuf>,
    pub extensions: Option<ReconcileReport>,
    pub opened_editor: bool,
    pub usage_recorded: bool,
}

pub struct Generator<'a> {
    resolved: &'a ResolvedOptions,
    layout: Layout,
    user_data_dir: Option<PathBuf>,
    editor: Option<&'a dyn EditorCli>,
    usage: Option<&'a dyn UsageRecorder>,
}

impl<'a> Generator<'a> {
    pub fn new(resolved: &'a ResolvedOptions, script_dir: PathBuf) -> Self {
        let layout = Layout {
            debugger: debugger_path(resolved),
            script_dir,
        };
        Self {
            resolved,
            layout,
            user_data_dir: None,
            editor: None,
            usage: None,
        }
    }

    /// Directory holding `keybindings.json`; without one no binding is added.
    pub fn with_user_data_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.user_data_dir = dir;
        self
    }

    pub fn with_editor(mut self, editor: &'a dyn EditorCli) -> Self {
        self.editor = Some(editor);
        self
    }

    pub fn with_usage_recorder(mut self, usage: &'a dyn UsageRecorder) -> Self {
        self.usage = Some(usage);
        self
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn generate(&self) -> Result<GenerationReport> {
        let options = &self.resolved.options;
        let mut report = GenerationReport {
            documents: self.write_documents()?,
            ..GenerationReport::default()
        };

        let platform = self.resolved.platform();
        report.scripts = scripts::write_scripts(&self.layout.script_dir, platform)?;

        if let Some(dir) = &self.user_data_dir {
            match keybindings::add_run_binding(dir, documents::RUN_TASK) {
                Ok(keybindings::KeybindingUpdate::Written) => {
                    report.keybindings = Some(dir.join("keybindings.json"));
                }
                Ok(keybindings::KeybindingUpdate::Skipped) => {}
                Err(e) => warn!("could not add the F6 keybinding: {:#}", e),
            }
        }

        if let Some(editor) = self.editor {
            let manager = ExtensionManager::new(editor);
            let wanted = extensions::desired_extensions(options.install_l10n);
            match manager.reconcile(&wanted, options.uninstall_extensions) {
                Ok(outcome) => {
                    for id in &outcome.installed {
                        println!("   {} Installed extension {}", "+".green(), id);
                    }
                    for id in &outcome.removed {
                        println!("   {} Removed extension {}", "-".yellow(), id);
                    }
                    report.extensions = Some(outcome);
                }
                Err(e) => warn!("extension management skipped: {}", e),
            }
        }

        report.test_file = self.write_test_file()?;

        if options.open_editor
            && let Some(editor) = self.editor
        {
            match editor.open(self.resolved.workspace(), report.test_file.as_deref()) {
                Ok(()) => report.opened_editor = true,
                Err(e) => warn!("could not open VS Code: {}", e),
            }
        }

        if !options.no_analytics
            && let Some(usage) = self.usage
        {
            match usage.record(&UsageEvent::from_resolved(self.resolved)) {
                Ok(()) => report.usage_recorded = true,
                Err(e) => debug!("usage event not recorded: {:#}", e),
            }
        }

        Ok(report)
    }

    fn write_documents(&self) -> Result<Vec<PathBuf>> {
        let dir = self.resolved.workspace().join(CONFIG_DIR);
        fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

        let rendered = [
            ("tasks.json", documents::tasks(self.resolved, &self.layout)),
            ("launch.json", documents::launch(self.resolved, &self.layout)),
            ("c_cpp_properties.json", documents::properties(self.resolved)),
            ("settings.json", documents::settings(self.resolved)),
        ];

        let mut written = Vec::with_capacity(rendered.len());
        for (name, value) in rendered {
            let path = dir.join(name);
            write_atomic(&path, documents::render(&value).as_bytes(), 0o644)?;
            println!("   {} Created {}/{}", "+".green(), CONFIG_DIR, name);
            written.push(path);
        }
        Ok(written)
    }

    fn write_test_file(&self) -> Result<Option<PathBuf>> {
        let workspace = self.resolved.workspace();
        let wanted = match self.resolved.options.generate_test {
            TestFileMode::Always => true,
            TestFileMode::Never => false,
            TestFileMode::Auto => !has_sources(workspace),
        };
        if !wanted {
            return Ok(None);
        }

        let language = self.resolved.language();
        let path = workspace.join(format!("helloworld.{}", language.source_extension()));
        if path.exists() {
            debug!("{} already exists, keeping it", path.display());
            return Ok(Some(path));
        }
        write_atomic(&path, test_source(language).as_bytes(), 0o644)?;
        println!(
            "   {} Created {}",
            "+".green(),
            path.file_name().unwrap_or_default().to_string_lossy()
        );
        Ok(Some(path))
    }
}

/// Debugger override, else `gdb`/`lldb` next to the compiler, else the bare
/// name for `PATH` lookup.
pub fn debugger_path(resolved: &ResolvedOptions) -> PathBuf {
    if let Some(path) = resolved.options.extras.debugger_override() {
        return path.to_path_buf();
    }
    let name = resolved.toolchain.family().debugger_name();
    let file = match resolved.platform() {
        Platform::Windows => format!("{name}.exe"),
        Platform::Linux | Platform::MacOs => name.to_string(),
    };
    if let Some(dir) = resolved.compiler.parent() {
        let sibling = dir.join(&file);
        if sibling.is_file() {
            return sibling;
        }
    }
    PathBuf::from(file)
}

const SOURCE_EXTENSIONS: &[&str] = &["c", "cc", "cpp", "cxx", "c++", "h", "hh", "hpp", "hxx"];

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// True when a C/C++ source or header sits within three levels of
/// `workspace`. Hidden directories are not searched.
pub fn has_sources(workspace: &Path) -> bool {
    WalkDir::new(workspace)
        .max_depth(3)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .any(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    SOURCE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str())
                })
        })
}

pub fn test_source(language: Language) -> &'static str {
    match language {
        Language::Cpp => {
            r#"#include <iostream>

int main() {
    std::cout << "Hello, world!" << std::endl;
    // Press F6 to build and run, or F5 to debug.
    return 0;
}
"#
        }
        Language::C => {
            r#"#include <stdio.h>

int main(void) {
    printf("Hello, world!\n");
    // Press F6 to build and run, or F5 to debug.
    return 0;
}
"#
        }
    }
}

/// Writes `contents` to a temp file beside `path` and renames it into place,
/// so a reader never sees a half-written file.
pub(crate) fn write_atomic(path: &Path, contents: &[u8], mode: u32) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create a temporary file in {}", dir.display()))?;
    tmp.write_all(contents)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(tmp.path(), fs::Permissions::from_mode(mode))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Options, PlatformExtras};
    use crate::extensions::testing::FakeEditor;
    use crate::telemetry::LocalUsageLog;
    use crate::toolchain::{LanguageSupport, ToolchainInfo};
    use tempfile::TempDir;

    fn resolved(workspace: &Path, mode: TestFileMode) -> ResolvedOptions {
        let mut options = Options::for_platform(Platform::Linux);
        options.workspace = workspace.to_path_buf();
        options.generate_test = mode;
        options.extras = PlatformExtras::Linux { debugger: None };
        let info = ToolchainInfo::from_version_output(
            "/nonexistent/bin/g++",
            LanguageSupport::Cpp,
            "g++ (GCC) 9.2.0",
        )
        .unwrap();
        options.finalize(info, PathBuf::from("code")).unwrap()
    }

    #[test]
    fn test_generate_writes_all_documents() {
        let tmp = TempDir::new().unwrap();
        let ws = tmp.path().join("ws");
        fs::create_dir(&ws).unwrap();
        let r = resolved(&ws, TestFileMode::Auto);

        let report = Generator::new(&r, tmp.path().join("scripts"))
            .with_user_data_dir(Some(tmp.path().join("user")))
            .generate()
            .unwrap();

        assert_eq!(report.documents.len(), 4);
        for name in ["tasks.json", "launch.json", "c_cpp_properties.json", "settings.json"] {
            assert!(ws.join(".vscode").join(name).is_file(), "{name}");
        }
        assert_eq!(report.scripts.len(), 2);
        assert!(report.keybindings.is_some());
        assert_eq!(report.test_file, Some(ws.join("helloworld.cpp")));
        assert!(report.extensions.is_none());
    }

    #[test]
    fn test_generate_is_deterministic() {
        let tmp = TempDir::new().unwrap();
        let r = resolved(tmp.path(), TestFileMode::Never);
        let generator = Generator::new(&r, tmp.path().join("scripts"));

        generator.generate().unwrap();
        let first = fs::read(tmp.path().join(".vscode/tasks.json")).unwrap();
        generator.generate().unwrap();
        let second = fs::read(tmp.path().join(".vscode/tasks.json")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_auto_skips_test_file_when_sources_exist() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("src/app")).unwrap();
        fs::write(tmp.path().join("src/app/main.cc"), "int main(){}").unwrap();
        let r = resolved(tmp.path(), TestFileMode::Auto);

        let report = Generator::new(&r, tmp.path().join("scripts")).generate().unwrap();
        assert_eq!(report.test_file, None);
        assert!(!tmp.path().join("helloworld.cpp").exists());
    }

    #[test]
    fn test_has_sources_rules() {
        let tmp = TempDir::new().unwrap();
        assert!(!has_sources(tmp.path()));

        fs::create_dir_all(tmp.path().join(".git/objects")).unwrap();
        fs::write(tmp.path().join(".git/objects/x.c"), "").unwrap();
        fs::create_dir_all(tmp.path().join("a/b/c")).unwrap();
        fs::write(tmp.path().join("a/b/c/deep.cpp"), "").unwrap();
        fs::write(tmp.path().join("notes.txt"), "").unwrap();
        assert!(!has_sources(tmp.path()));

        fs::write(tmp.path().join("a/b/util.HPP"), "").unwrap();
        assert!(has_sources(tmp.path()));
    }

    #[test]
    fn test_always_keeps_existing_test_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("helloworld.cpp"), "// mine").unwrap();
        let r = resolved(tmp.path(), TestFileMode::Always);
        Generator::new(&r, tmp.path().join("scripts")).generate().unwrap();
        let kept = fs::read_to_string(tmp.path().join("helloworld.cpp")).unwrap();
        assert_eq!(kept, "// mine");
    }

    #[test]
    fn test_editor_and_usage_hooks() {
        let tmp = TempDir::new().unwrap();
        let ws = tmp.path().join("ws");
        fs::create_dir(&ws).unwrap();
        let mut r = resolved(&ws, TestFileMode::Always);
        r.options.open_editor = true;
        r.options.uninstall_extensions = true;

        let editor = FakeEditor::with_installed(&["formulahendry.code-runner"]);
        let log = LocalUsageLog::new(tmp.path().join("usage.jsonl"));
        let report = Generator::new(&r, tmp.path().join("scripts"))
            .with_editor(&editor)
            .with_usage_recorder(&log)
            .generate()
            .unwrap();

        let ext = report.extensions.unwrap();
        assert_eq!(ext.installed, vec![extensions::CPPTOOLS]);
        assert_eq!(ext.removed, vec!["formulahendry.code-runner"]);
        assert!(report.opened_editor);
        assert_eq!(
            *editor.opened.borrow(),
            vec![ws.clone(), ws.join("helloworld.cpp")]
        );
        assert!(report.usage_recorded);
        assert!(log.path().is_file());
    }

    #[test]
    fn test_no_analytics_skips_usage() {
        let tmp = TempDir::new().unwrap();
        let mut r = resolved(tmp.path(), TestFileMode::Never);
        r.options.no_analytics = true;
        let log = LocalUsageLog::new(tmp.path().join("usage.jsonl"));
        let report = Generator::new(&r, tmp.path().join("scripts"))
            .with_usage_recorder(&log)
            .generate()
            .unwrap();
        assert!(!report.usage_recorded);
        assert!(!log.path().exists());
    }

    #[test]
    fn test_debugger_path_fallbacks() {
        let tmp = TempDir::new().unwrap();
        let mut r = resolved(tmp.path(), TestFileMode::Never);
        assert_eq!(debugger_path(&r), PathBuf::from("gdb"));

        r.options.extras = PlatformExtras::Linux {
            debugger: Some(PathBuf::from("/opt/gdb/bin/gdb")),
        };
        assert_eq!(debugger_path(&r), PathBuf::from("/opt/gdb/bin/gdb"));
    }
}
