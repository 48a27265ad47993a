//! Error type for lockfile resolution.
//! Every failure carries enough context (path, package, line) to be printed as-is by the CLI.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Main error type for lockpin operations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolveError {
    /// The lockfile could not be read from disk
    LockfileUnreadable {
        path: String,
        source: String,
    },
    /// The lockfile was read but its content is not a valid document
    LockfileUnparseable {
        path: String,
        line: Option<usize>,
        source: String,
    },
    /// No lockfile entry determines a resolution for the package
    ResolutionNotFound {
        package: String,
        details: Option<String>,
    },
    /// The installed package manifest is missing or has no version
    InstalledVersionUnavailable {
        package: String,
        path: String,
        source: String,
    },
    /// No supported lockfile exists in the project
    NoLockfile {
        dir: String,
    },
    /// A package manager was requested whose lockfile is absent
    PackageManagerMismatch {
        expected: String,
        found: String,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::LockfileUnreadable { path, source } => {
                write!(f, "Can't read lock file {}: {}", path, source)
            }
            ResolveError::LockfileUnparseable { path, line, source } => {
                write!(f, "Can't parse lock file {}: {}", path, source)?;
                if let Some(line) = line {
                    write!(f, " (line: {})", line)?;
                }
                Ok(())
            }
            ResolveError::ResolutionNotFound { package, details } => {
                write!(f, "Can't find lockfile entry for {}", package)?;
                if let Some(details) = details {
                    write!(f, " ({})", details)?;
                }
                Ok(())
            }
            ResolveError::InstalledVersionUnavailable { package, path, source } => {
                write!(
                    f,
                    "Can't read installed version of {}: {} (path: {})",
                    package, source, path
                )
            }
            ResolveError::NoLockfile { dir } => {
                write!(
                    f,
                    "No package-lock.json, npm-shrinkwrap.json, or yarn.lock file found in {}",
                    dir
                )
            }
            ResolveError::PackageManagerMismatch { expected, found } => {
                write!(
                    f,
                    "Package manager {} was requested but only a {} lockfile was found",
                    expected, found
                )
            }
        }
    }
}

impl std::error::Error for ResolveError {}

impl From<ResolveError> for String {
    fn from(e: ResolveError) -> Self {
        e.to_string()
    }
}

/// Constructors for the common error shapes.
pub mod utils {
    use super::*;

    pub fn unreadable(path: &Path, source: std::io::Error) -> ResolveError {
        ResolveError::LockfileUnreadable {
            path: path.display().to_string(),
            source: source.to_string(),
        }
    }

    pub fn unparseable(path: &Path, line: Option<usize>, source: &str) -> ResolveError {
        ResolveError::LockfileUnparseable {
            path: path.display().to_string(),
            line,
            source: source.to_string(),
        }
    }

    pub fn not_found(package: &str, details: Option<&str>) -> ResolveError {
        ResolveError::ResolutionNotFound {
            package: package.to_string(),
            details: details.map(String::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ResolveError::LockfileUnparseable {
            path: "/app/yarn.lock".to_string(),
            line: Some(12),
            source: "unexpected indentation".to_string(),
        };

        let display = format!("{}", error);
        assert!(display.contains("/app/yarn.lock"));
        assert!(display.contains("unexpected indentation"));
        assert!(display.contains("line: 12"));
    }

    #[test]
    fn test_not_found_mentions_package() {
        let error = utils::not_found("left-pad/is-odd", None);
        assert_eq!(error.to_string(), "Can't find lockfile entry for left-pad/is-odd");
    }

    #[test]
    fn test_error_into_string() {
        let error = ResolveError::NoLockfile { dir: "/tmp/app".to_string() };
        let s: String = error.into();
        assert!(s.contains("/tmp/app"));
    }
}
