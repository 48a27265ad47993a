//! Package manager kind and detection from the lockfiles present in a project.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error_handling::ResolveError;
use crate::utils::log;
use crate::workspaces::find_workspace_root;

pub const YARN_LOCK: &str = "yarn.lock";
pub const PACKAGE_LOCK: &str = "package-lock.json";
pub const NPM_SHRINKWRAP: &str = "npm-shrinkwrap.json";

/// Which package manager (and so which lockfile format) is in play.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub enum PackageManager {
    /// yarn.lock (classic flat-keyed format)
    #[serde(rename = "yarn")]
    Yarn,
    /// package-lock.json
    #[default]
    #[serde(rename = "npm")]
    Npm,
    /// npm-shrinkwrap.json
    #[serde(rename = "npm-shrinkwrap")]
    NpmShrinkwrap,
}

impl PackageManager {
    pub fn as_str(&self) -> &'static str {
        match self {
            PackageManager::Yarn => "yarn",
            PackageManager::Npm => "npm",
            PackageManager::NpmShrinkwrap => "npm-shrinkwrap",
        }
    }

    pub fn lockfile_name(&self) -> &'static str {
        match self {
            PackageManager::Yarn => YARN_LOCK,
            PackageManager::Npm => PACKAGE_LOCK,
            PackageManager::NpmShrinkwrap => NPM_SHRINKWRAP,
        }
    }
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PackageManager {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "yarn" => Ok(PackageManager::Yarn),
            "npm" => Ok(PackageManager::Npm),
            "npm-shrinkwrap" => Ok(PackageManager::NpmShrinkwrap),
            other => Err(format!("Unknown package manager: {}", other)),
        }
    }
}

/// Decide the package manager for `app_root`. `override_pm` wins only when both npm and yarn
/// lockfiles exist, or when it agrees with the lockfile found.
pub fn detect_package_manager(
    app_root: &Path,
    override_pm: Option<PackageManager>,
) -> Result<PackageManager, ResolveError> {
    let package_lock = app_root.join(PACKAGE_LOCK).exists();
    let shrinkwrap = app_root.join(NPM_SHRINKWRAP).exists();
    let yarn_lock = app_root.join(YARN_LOCK).exists();
    let npm_kind = if shrinkwrap {
        PackageManager::NpmShrinkwrap
    } else {
        PackageManager::Npm
    };

    if (package_lock || shrinkwrap) && yarn_lock {
        if let Some(pm) = override_pm {
            return Ok(pm);
        }
        log(&format!(
            "Found both {} and {}; using {}. Pass --package-manager yarn to use yarn.lock.",
            npm_kind.lockfile_name(),
            YARN_LOCK,
            npm_kind
        ));
        return Ok(npm_kind);
    }
    if package_lock || shrinkwrap {
        if override_pm == Some(PackageManager::Yarn) {
            return Err(ResolveError::PackageManagerMismatch {
                expected: PackageManager::Yarn.to_string(),
                found: npm_kind.lockfile_name().to_string(),
            });
        }
        return Ok(npm_kind);
    }
    if yarn_lock || find_workspace_root(app_root).is_some() {
        return Ok(PackageManager::Yarn);
    }
    Err(ResolveError::NoLockfile {
        dir: app_root.display().to_string(),
    })
}
