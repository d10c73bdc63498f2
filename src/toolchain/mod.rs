//! Toolchain discovery and validation
//!
//! Two code paths with different error contracts:
//!
//! - [`discover`] probes auto-enumerated candidates and silently drops any
//!   that do not answer with a parsable version.
//! - [`validate_explicit`] probes the one compiler the user named and fails
//!   loudly, reporting the exact path that was tried.

pub mod candidates;
pub mod probe;
pub mod types;
pub mod version;

pub use candidates::Candidate;
pub use probe::{ProcessProbe, VersionProbe};
pub use types::{CompilerFamily, LanguageSupport, ToolchainError, ToolchainInfo};

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::config::{Language, Platform};
use crate::prompt::Prompter;

/// Probes one candidate. Success means the compiler ran and its banner parsed.
pub fn validate(
    candidate: &Candidate,
    probe: &dyn VersionProbe,
) -> Result<ToolchainInfo, ToolchainError> {
    let output = probe.query(&candidate.path)?;
    ToolchainInfo::from_version_output(candidate.path.clone(), candidate.languages, &output)
}

/// Validates every candidate, keeping only the ones that work.
pub fn discover(candidates: &[Candidate], probe: &dyn VersionProbe) -> Vec<ToolchainInfo> {
    candidates
        .iter()
        .filter_map(|candidate| match validate(candidate, probe) {
            Ok(info) => {
                debug!("found {}", info);
                Some(info)
            }
            Err(e) => {
                debug!("skipping {}: {}", candidate.path.display(), e);
                None
            }
        })
        .collect()
}

/// Enumerates and validates everything on this machine.
pub fn detect_all(platform: Platform, probe: &dyn VersionProbe) -> Vec<ToolchainInfo> {
    discover(&candidates::enumerate(platform), probe)
}

/// Turns the `--compiler` value into a concrete path.
///
/// On Windows the selector is a MinGW directory (with or without `bin`);
/// elsewhere it is a compiler path or a name looked up on `PATH`.
pub fn resolve_explicit_path(
    selector: &str,
    platform: Platform,
) -> Result<Candidate, ToolchainError> {
    match platform {
        Platform::Windows => {
            let trimmed = selector.trim_end_matches(['\\', '/']);
            let last = trimmed.rsplit(['\\', '/']).next().unwrap_or(trimmed);
            let mut dir = PathBuf::from(trimmed);
            if !last.eq_ignore_ascii_case("bin") {
                dir.push("bin");
            }
            Ok(Candidate::new(dir.join("g++.exe"), LanguageSupport::Both))
        }
        Platform::Linux | Platform::MacOs => {
            if selector.contains('/') {
                return Ok(Candidate::from_driver(selector));
            }
            which::which(selector)
                .map(Candidate::from_driver)
                .map_err(|e| ToolchainError::InvalidExplicit {
                    path: PathBuf::from(selector),
                    reason: e.to_string(),
                })
        }
    }
}

/// Validates the compiler the user asked for. Any failure is an error that
/// names the probed path.
pub fn validate_explicit(
    selector: &str,
    platform: Platform,
    probe: &dyn VersionProbe,
) -> Result<ToolchainInfo, ToolchainError> {
    let candidate = resolve_explicit_path(selector, platform)?;
    validate(&candidate, probe).map_err(|e| ToolchainError::InvalidExplicit {
        path: candidate.path.clone(),
        reason: e.to_string(),
    })
}

/// Probes a driver derived from a validated toolchain, such as `gcc` next
/// to a MinGW `g++`. Failure names the derived path.
pub fn verify_driver(path: &Path, probe: &dyn VersionProbe) -> Result<(), ToolchainError> {
    validate(&Candidate::new(path, LanguageSupport::C), probe)
        .map(|_| ())
        .map_err(|e| ToolchainError::InvalidExplicit {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

/// Picks one toolchain for `language`.
///
/// None usable is an error, a single one is taken as is, and several are
/// resolved by taking the first under `assume_yes` or asking otherwise.
pub fn select(
    toolchains: Vec<ToolchainInfo>,
    language: Language,
    assume_yes: bool,
    prompter: &mut dyn Prompter,
) -> Result<ToolchainInfo, ToolchainError> {
    let mut usable: Vec<ToolchainInfo> = toolchains
        .into_iter()
        .filter(|t| t.languages().supports(language))
        .collect();

    match usable.len() {
        0 => Err(ToolchainError::NotFound(language.name())),
        1 => Ok(usable.remove(0)),
        _ if assume_yes => Ok(usable.remove(0)),
        len => {
            let labels: Vec<String> = usable.iter().map(ToolchainInfo::label).collect();
            loop {
                let index = prompter.select_index("Select a compiler", &labels)?;
                if index < len {
                    return Ok(usable.swap_remove(index));
                }
                debug!("index {} out of range, asking again", index);
            }
        }
    }
}
