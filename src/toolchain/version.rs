//! Parsing of `<compiler> --version` output.

use regex::Regex;
use std::sync::LazyLock;

use super::CompilerFamily;

static VERSION_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bversion\s+(\d+(?:\.\d+)*)").expect("static regex")
});

static DOTTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d+\.\d+(?:\.\d+)*)").expect("static regex"));

static PARENTHESISED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^()]*)\)").expect("static regex"));

static CLANG_VENDOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)\s*clang version").expect("static regex"));

/// What a version banner tells us about a compiler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedVersion {
    pub family: CompilerFamily,
    pub version: String,
    pub package: Option<String>,
}

/// Reads the first banner line that carries a version number.
///
/// Handles the usual shapes:
/// - `g++ (Ubuntu 11.4.0-1ubuntu1~22.04) 11.4.0`
/// - `gcc (GCC) 13.2.1 20230801`
/// - `Ubuntu clang version 14.0.0-1ubuntu1.1`
/// - `Apple clang version 15.0.0 (clang-1500.1.0.2.5)`
pub fn parse(output: &str) -> Option<ParsedVersion> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("Configured with"))
        .find_map(parse_line)
}

fn parse_line(line: &str) -> Option<ParsedVersion> {
    let family = if line.to_ascii_lowercase().contains("clang") {
        CompilerFamily::Clang
    } else {
        CompilerFamily::Gcc
    };

    let version = match VERSION_KEYWORD.captures(line) {
        Some(caps) => caps[1].to_string(),
        None => {
            // GCC puts its build label in parentheses, which may itself hold
            // a version; the real one follows it.
            let outside = PARENTHESISED.replace_all(line, " ");
            DOTTED.captures(&outside)?[1].to_string()
        }
    };

    let package = match family {
        CompilerFamily::Clang => CLANG_VENDOR
            .captures(line)
            .map(|caps| caps[1].trim().to_string())
            .filter(|vendor| !vendor.is_empty()),
        CompilerFamily::Gcc => PARENTHESISED
            .captures(line)
            .map(|caps| caps[1].trim().to_string())
            .filter(|label| !label.is_empty() && !label.eq_ignore_ascii_case("gcc")),
    };

    Some(ParsedVersion {
        family,
        version,
        package,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_distro_gcc() {
        let v = parse("g++ (Ubuntu 11.4.0-1ubuntu1~22.04) 11.4.0\nCopyright (C) 2021").unwrap();
        assert_eq!(v.family, CompilerFamily::Gcc);
        assert_eq!(v.version, "11.4.0");
        assert_eq!(v.package.as_deref(), Some("Ubuntu 11.4.0-1ubuntu1~22.04"));
    }

    #[test]
    fn test_parse_gcc_with_build_date() {
        let v = parse("gcc (GCC) 13.2.1 20230801").unwrap();
        assert_eq!(v.version, "13.2.1");
        assert_eq!(v.package, None);
    }

    #[test]
    fn test_parse_mingw() {
        let v = parse("g++.exe (x86_64-posix-seh-rev0, Built by MinGW-W64 project) 8.1.0").unwrap();
        assert_eq!(v.family, CompilerFamily::Gcc);
        assert_eq!(v.version, "8.1.0");
        assert!(v.package.unwrap().contains("MinGW-W64"));
    }

    #[test]
    fn test_parse_clang_variants() {
        let v = parse("Ubuntu clang version 14.0.0-1ubuntu1.1\nTarget: x86_64-pc-linux-gnu").unwrap();
        assert_eq!(v.family, CompilerFamily::Clang);
        assert_eq!(v.version, "14.0.0");
        assert_eq!(v.package.as_deref(), Some("Ubuntu"));

        let v = parse("Apple clang version 15.0.0 (clang-1500.1.0.2.5)").unwrap();
        assert_eq!(v.version, "15.0.0");
        assert_eq!(v.package.as_deref(), Some("Apple"));

        let v = parse("clang version 17.0.6").unwrap();
        assert_eq!(v.package, None);
    }

    #[test]
    fn test_parse_skips_configure_line() {
        let out = "Configured with: --with-gxx-include-dir=/usr/include/c++/4.2.1\n\
                   Apple clang version 14.0.3 (clang-1403.0.22.14.1)";
        let v = parse(out).unwrap();
        assert_eq!(v.family, CompilerFamily::Clang);
        assert_eq!(v.version, "14.0.3");
    }

    #[test]
    fn test_parse_rejects_noise() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("hello world"), None);
        assert_eq!(parse("usage: foo [options]"), None);
    }
}
