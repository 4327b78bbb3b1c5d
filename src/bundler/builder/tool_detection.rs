//! External tool detection and availability checking.
//!
//! Locates the freezer executable and the Python interpreter whose version
//! environment markers are evaluated against.

use crate::bundler::error::{Error, Result};
use crate::bundler::requirements::LanguageVersion;
use std::path::PathBuf;
use std::sync::LazyLock;

/// Interpreters tried, in order, when detecting the language version.
const PYTHON_CANDIDATES: [&str; 2] = ["python3", "python"];

/// Version of the first Python interpreter found on `PATH`.
///
/// Cached result to avoid repeated subprocess calls.
pub static PYTHON_VERSION: LazyLock<Option<LanguageVersion>> = LazyLock::new(|| {
    PYTHON_CANDIDATES.iter().find_map(|name| {
        let path = match which::which(name) {
            Ok(path) => path,
            Err(e) => {
                log::debug!("{} not found in PATH: {}", name, e);
                return None;
            }
        };
        log::debug!("Found {} at: {}", name, path.display());

        match std::process::Command::new(&path).arg("--version").output() {
            Ok(output) if output.status.success() => {
                // Python 2 prints its version on stderr.
                let stdout = String::from_utf8_lossy(&output.stdout);
                let stderr = String::from_utf8_lossy(&output.stderr);
                let version = parse_version_output(&stdout).or_else(|| parse_version_output(&stderr));
                if version.is_none() {
                    log::warn!(
                        "{} --version printed an unrecognized version: {}",
                        path.display(),
                        stdout.trim()
                    );
                }
                version
            }
            Ok(output) => {
                log::warn!(
                    "{} found at {} but --version check failed (exit code: {:?})",
                    name,
                    path.display(),
                    output.status.code()
                );
                None
            }
            Err(e) => {
                log::warn!(
                    "{} found at {} but failed to execute: {}. Check file permissions.",
                    name,
                    path.display(),
                    e
                );
                None
            }
        }
    })
});

/// Parses `Python X.Y[.Z]` as printed by `python --version`.
pub fn parse_version_output(output: &str) -> Option<LanguageVersion> {
    let raw = output.trim().strip_prefix("Python")?.trim();
    // Pre-release suffixes such as `3.13.0rc1` keep only the numeric release.
    let numeric: String = raw
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    LanguageVersion::parse(numeric.trim_end_matches('.')).ok()
}

/// Returns the detected language version.
///
/// # Errors
///
/// Fails when no Python interpreter on `PATH` reports a usable version.
pub fn detect_language_version() -> Result<LanguageVersion> {
    PYTHON_VERSION.clone().ok_or_else(|| {
        Error::GenericError(
            "could not detect the Python version (tried python3 and python); \
             use --python-version to set it"
                .to_string(),
        )
    })
}

/// Resolves the freezer program through `PATH`.
///
/// Falls back to the name as given so the spawn error names the program.
pub fn resolve_freezer(program: &str) -> PathBuf {
    match which::which(program) {
        Ok(path) => {
            log::debug!("Found {} at: {}", program, path.display());
            path
        }
        Err(e) => {
            log::warn!("{} not found in PATH: {}", program, e);
            PathBuf::from(program)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version_output() {
        let version = parse_version_output("Python 3.11.4\n").unwrap();
        assert_eq!(version.to_string(), "3.11.4");
        assert_eq!(version.short().to_string(), "3.11");

        let rc = parse_version_output("Python 3.13.0rc1").unwrap();
        assert_eq!(rc.to_string(), "3.13.0");

        assert!(parse_version_output("pyenv: python3: command not found").is_none());
        assert!(parse_version_output("Python").is_none());
    }

    #[test]
    fn test_resolve_freezer_falls_back_to_name() {
        let resolved = resolve_freezer("surely-not-an-installed-freezer");
        assert_eq!(resolved, PathBuf::from("surely-not-an-installed-freezer"));
    }
}
