//! Language standards and version-to-standard resolution.
//!
//! Each compiler family has an ordered table of `major version -> newest
//! supported standards`. The tables mirror the real release history of GCC
//! and Clang rather than any arithmetic rule, so they are plain data.
//!
//! Resolution never fails: anything that cannot be parsed degrades to
//! [`StandardPair::DEFAULT`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::{Language, OptionsError};
use crate::toolchain::CompilerFamily;

/// A named revision of C or C++ that maps to one `-std=` flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum LanguageStandard {
    Cpp98,
    Cpp11,
    Cpp14,
    Cpp17,
    Cpp20,
    Cpp23,
    C99,
    C11,
    C18,
}

pub const CPP_STANDARDS: [LanguageStandard; 6] = [
    LanguageStandard::Cpp98,
    LanguageStandard::Cpp11,
    LanguageStandard::Cpp14,
    LanguageStandard::Cpp17,
    LanguageStandard::Cpp20,
    LanguageStandard::Cpp23,
];

pub const C_STANDARDS: [LanguageStandard; 3] =
    [LanguageStandard::C99, LanguageStandard::C11, LanguageStandard::C18];

impl LanguageStandard {
    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageStandard::Cpp98 => "c++98",
            LanguageStandard::Cpp11 => "c++11",
            LanguageStandard::Cpp14 => "c++14",
            LanguageStandard::Cpp17 => "c++17",
            LanguageStandard::Cpp20 => "c++20",
            LanguageStandard::Cpp23 => "c++23",
            LanguageStandard::C99 => "c99",
            LanguageStandard::C11 => "c11",
            LanguageStandard::C18 => "c18",
        }
    }

    pub fn language(&self) -> Language {
        if CPP_STANDARDS.contains(self) {
            Language::Cpp
        } else {
            Language::C
        }
    }

    /// The compiler flag selecting this standard, e.g. `-std=c++17`.
    pub fn flag(&self) -> String {
        format!("-std={}", self.as_str())
    }

    /// Every standard accepted for `language`, oldest first.
    pub fn all_for(language: Language) -> &'static [LanguageStandard] {
        match language {
            Language::Cpp => &CPP_STANDARDS,
            Language::C => &C_STANDARDS,
        }
    }

    /// Comma separated list of valid names, for diagnostics.
    pub fn valid_names(language: Language) -> String {
        Self::all_for(language)
            .iter()
            .map(|s| s.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for LanguageStandard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageStandard {
    type Err = OptionsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        CPP_STANDARDS
            .iter()
            .chain(C_STANDARDS.iter())
            .find(|std| std.as_str() == wanted)
            .copied()
            .ok_or_else(|| OptionsError::UnknownStandard(s.to_string()))
    }
}

impl TryFrom<String> for LanguageStandard {
    type Error = OptionsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LanguageStandard> for String {
    fn from(value: LanguageStandard) -> Self {
        value.as_str().to_string()
    }
}

/// The newest C++ and C standards a compiler supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardPair {
    pub cpp: LanguageStandard,
    pub c: LanguageStandard,
}

impl StandardPair {
    /// Conservative pair used whenever a version string cannot be understood.
    pub const DEFAULT: StandardPair = StandardPair::new(LanguageStandard::Cpp14, LanguageStandard::C11);

    pub const fn new(cpp: LanguageStandard, c: LanguageStandard) -> Self {
        Self { cpp, c }
    }

    pub fn for_language(&self, language: Language) -> LanguageStandard {
        match language {
            Language::Cpp => self.cpp,
            Language::C => self.c,
        }
    }

    /// Replaces the entry matching `standard`'s language.
    pub fn with(self, standard: LanguageStandard) -> Self {
        match standard.language() {
            Language::Cpp => Self { cpp: standard, ..self },
            Language::C => Self { c: standard, ..self },
        }
    }
}

impl fmt::Display for StandardPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.cpp, self.c)
    }
}

use LanguageStandard::*;

/// Per-family resolution policy.
///
/// `entries` is ordered by ascending major version; an entry applies from its
/// major version up to (not including) the next one, and the last entry
/// covers every newer release.
struct FamilyTable {
    floor: i64,
    legacy: fn(major: i64, minor: i64) -> StandardPair,
    entries: &'static [(i64, StandardPair)],
}

const GCC_TABLE: FamilyTable = FamilyTable {
    floor: 5,
    legacy: gcc_legacy,
    entries: &[
        (5, StandardPair::new(Cpp14, C11)),
        (8, StandardPair::new(Cpp17, C18)),
        (10, StandardPair::new(Cpp20, C18)),
        (11, StandardPair::new(Cpp23, C18)),
    ],
};

// https://clang.llvm.org/cxx_status.html
const CLANG_TABLE: FamilyTable = FamilyTable {
    floor: 4,
    legacy: clang_legacy,
    entries: &[
        (4, StandardPair::new(Cpp14, C11)),
        (5, StandardPair::new(Cpp17, C18)),
        (10, StandardPair::new(Cpp20, C18)),
    ],
};

fn gcc_legacy(major: i64, minor: i64) -> StandardPair {
    if major == 4 && minor > 7 {
        StandardPair::new(Cpp11, C11)
    } else {
        StandardPair::new(Cpp98, C99)
    }
}

fn clang_legacy(major: i64, minor: i64) -> StandardPair {
    match (major, minor) {
        (3, m) if m >= 4 => StandardPair::new(Cpp14, C11),
        (3, 3) => StandardPair::new(Cpp11, C11),
        (3, _) => StandardPair::new(Cpp98, C11),
        _ => StandardPair::new(Cpp98, C99),
    }
}

fn table(family: CompilerFamily) -> &'static FamilyTable {
    match family {
        CompilerFamily::Gcc => &GCC_TABLE,
        CompilerFamily::Clang => &CLANG_TABLE,
    }
}

/// Maps a compiler family and its raw version string to the newest standards
/// it supports. Total: unparsable input yields [`StandardPair::DEFAULT`].
pub fn resolve(family: CompilerFamily, version: &str) -> StandardPair {
    try_resolve(family, version).unwrap_or(StandardPair::DEFAULT)
}

fn try_resolve(family: CompilerFamily, version: &str) -> Option<StandardPair> {
    let mut parts = version.split('.');
    let major: i64 = parts.next()?.trim().parse().ok()?;
    let table = table(family);

    if major < table.floor {
        // Old releases need the minor version to pick a row.
        let minor: i64 = parts.next()?.trim().parse().ok()?;
        return Some((table.legacy)(major, minor));
    }

    table
        .entries
        .iter()
        .rev()
        .find(|(first_major, _)| *first_major <= major)
        .map(|(_, pair)| *pair)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(cpp: &str, c: &str) -> StandardPair {
        StandardPair::new(cpp.parse().unwrap(), c.parse().unwrap())
    }

    #[test]
    fn test_gcc_table_rows() {
        assert_eq!(resolve(CompilerFamily::Gcc, "5.4.0"), pair("c++14", "c11"));
        assert_eq!(resolve(CompilerFamily::Gcc, "7.5.0"), pair("c++14", "c11"));
        assert_eq!(resolve(CompilerFamily::Gcc, "8.1.0"), pair("c++17", "c18"));
        assert_eq!(resolve(CompilerFamily::Gcc, "9.2.0"), pair("c++17", "c18"));
        assert_eq!(resolve(CompilerFamily::Gcc, "10.3.0"), pair("c++20", "c18"));
        assert_eq!(resolve(CompilerFamily::Gcc, "11.2.0"), pair("c++23", "c18"));
    }

    #[test]
    fn test_gcc_legacy_minor_boundary() {
        assert_eq!(resolve(CompilerFamily::Gcc, "4.8.5"), pair("c++11", "c11"));
        assert_eq!(resolve(CompilerFamily::Gcc, "4.7.2"), pair("c++98", "c99"));
        assert_eq!(resolve(CompilerFamily::Gcc, "3.4.6"), pair("c++98", "c99"));
    }

    #[test]
    fn test_gcc_clamps_to_newest_entry() {
        assert_eq!(resolve(CompilerFamily::Gcc, "13.2.1"), pair("c++23", "c18"));
        assert_eq!(resolve(CompilerFamily::Gcc, "99"), pair("c++23", "c18"));
    }

    #[test]
    fn test_clang_table_rows() {
        assert_eq!(resolve(CompilerFamily::Clang, "3.3"), pair("c++11", "c11"));
        assert_eq!(resolve(CompilerFamily::Clang, "3.4.2"), pair("c++14", "c11"));
        assert_eq!(resolve(CompilerFamily::Clang, "3.2"), pair("c++98", "c11"));
        assert_eq!(resolve(CompilerFamily::Clang, "2.9"), pair("c++98", "c99"));
        assert_eq!(resolve(CompilerFamily::Clang, "4.0.1"), pair("c++14", "c11"));
        assert_eq!(resolve(CompilerFamily::Clang, "9.0.0"), pair("c++17", "c18"));
        assert_eq!(resolve(CompilerFamily::Clang, "14.0.0"), pair("c++20", "c18"));
    }

    #[test]
    fn test_clang_clamps_to_newest_entry() {
        assert_eq!(resolve(CompilerFamily::Clang, "18.1.3"), pair("c++20", "c18"));
    }

    #[test]
    fn test_unparsable_versions_use_default() {
        for family in [CompilerFamily::Gcc, CompilerFamily::Clang] {
            for version in ["notaversion", "", ".", "x.1", "4", "3", "4.x", "abc.def.ghi"] {
                assert_eq!(
                    resolve(family, version),
                    StandardPair::DEFAULT,
                    "{family:?} {version:?}"
                );
            }
        }
        assert_eq!(StandardPair::DEFAULT, pair("c++14", "c11"));
    }

    #[test]
    fn test_standard_parse_and_language() {
        assert_eq!("C++17".parse::<LanguageStandard>().unwrap(), Cpp17);
        assert_eq!(" c18 ".parse::<LanguageStandard>().unwrap(), C18);
        assert!("gnu++17".parse::<LanguageStandard>().is_err());
        assert!("c89".parse::<LanguageStandard>().is_err());
        assert_eq!(Cpp20.language(), Language::Cpp);
        assert_eq!(C99.language(), Language::C);
        assert_eq!(Cpp23.flag(), "-std=c++23");
    }

    #[test]
    fn test_pair_with_replaces_matching_language() {
        let p = StandardPair::DEFAULT.with(C18);
        assert_eq!(p, pair("c++14", "c18"));
        assert_eq!(p.with(Cpp20).for_language(Language::Cpp), Cpp20);
    }
}
