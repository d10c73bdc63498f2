//! Where compilers are looked for.
//!
//! Enumeration only lists paths; nothing here runs a compiler. The
//! `*_in` functions take the search path explicitly so they can be tested
//! against a scratch directory.

use regex::Regex;
use std::collections::HashSet;
use std::env;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use super::LanguageSupport;
use crate::config::Platform;

/// Well-known MinGW install roots on Windows.
pub const MINGW_ROOTS: &[&str] = &[
    r"C:\mingw64\bin",
    r"C:\msys64\mingw64\bin",
    r"C:\msys64\ucrt64\bin",
];

/// A compiler path worth probing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub languages: LanguageSupport,
}

impl Candidate {
    pub fn new(path: impl Into<PathBuf>, languages: LanguageSupport) -> Self {
        Self {
            path: path.into(),
            languages,
        }
    }

    /// Guesses the language from a POSIX driver name (`clang++` is C++).
    pub fn from_driver(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let languages = match path.file_name().and_then(OsStr::to_str) {
            Some(name) if name.contains("++") => LanguageSupport::Cpp,
            _ => LanguageSupport::C,
        };
        Self { path, languages }
    }
}

static DRIVER_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(g\+\+|gcc|clang\+\+|clang)(-\d+(?:\.\d+)*)?$").expect("static regex")
});

/// Lists candidates for `platform` from the current environment.
pub fn enumerate(platform: Platform) -> Vec<Candidate> {
    let path_var = env::var_os("PATH").unwrap_or_default();
    match platform {
        Platform::Windows => {
            let mingw_home = env::var_os("MINGW_HOME").map(PathBuf::from);
            let roots: Vec<PathBuf> = MINGW_ROOTS.iter().map(PathBuf::from).collect();
            enumerate_windows_in(&path_var, mingw_home.as_deref(), &roots)
        }
        Platform::Linux => enumerate_posix_in(&path_var, &LINUX_PREFERENCE, &[]),
        Platform::MacOs => enumerate_posix_in(
            &path_var,
            &MACOS_PREFERENCE,
            &[
                PathBuf::from("/usr/bin/clang++"),
                PathBuf::from("/usr/bin/clang"),
            ],
        ),
    }
}

const LINUX_PREFERENCE: [&str; 4] = ["g++", "gcc", "clang++", "clang"];
const MACOS_PREFERENCE: [&str; 4] = ["clang++", "clang", "g++", "gcc"];

/// Scans every `PATH` directory for GCC/Clang drivers, including versioned
/// ones like `g++-13`. `extra` paths are appended when they exist.
pub fn enumerate_posix_in(
    path_var: &OsStr,
    preference: &[&str],
    extra: &[PathBuf],
) -> Vec<Candidate> {
    // (preference rank, versioned, PATH order, name) keeps output stable.
    let mut found: Vec<((usize, bool, usize, String), PathBuf)> = Vec::new();

    for (dir_index, dir) in env::split_paths(path_var).enumerate() {
        let Ok(entries) = fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(caps) = DRIVER_NAME.captures(&name) else {
                continue;
            };
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let base = caps.get(1).map_or("", |m| m.as_str());
            let rank = preference
                .iter()
                .position(|p| *p == base)
                .unwrap_or(preference.len());
            let versioned = caps.get(2).is_some();
            found.push(((rank, versioned, dir_index, name), path));
        }
    }
    found.sort_by(|a, b| a.0.cmp(&b.0));

    let paths = found
        .into_iter()
        .map(|(_, path)| path)
        .chain(extra.iter().filter(|p| p.is_file()).cloned());

    dedup(paths.map(Candidate::from_driver))
}

/// MinGW installs: `%MINGW_HOME%\bin`, then `PATH`, then the usual roots.
pub fn enumerate_windows_in(
    path_var: &OsStr,
    mingw_home: Option<&Path>,
    roots: &[PathBuf],
) -> Vec<Candidate> {
    let dirs = mingw_home
        .map(|home| home.join("bin"))
        .into_iter()
        .chain(env::split_paths(path_var))
        .chain(roots.iter().cloned());

    let candidates = dirs
        .map(|dir| dir.join("g++.exe"))
        .filter(|gxx| gxx.is_file())
        .map(|gxx| Candidate::new(gxx, LanguageSupport::Both));

    dedup(candidates)
}

/// Drops candidates that resolve to the same file for the same languages.
/// The first (best ranked) spelling of the path is kept.
fn dedup(candidates: impl Iterator<Item = Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .filter(|c| {
            let canonical = fs::canonicalize(&c.path).unwrap_or_else(|_| c.path.clone());
            seen.insert((canonical, c.languages))
        })
        .collect()
}
