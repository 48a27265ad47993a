//! Resolve the exact source reference (tarball URL, git ref, `file:` path) of an installed package
//! from the project lockfile.
//!
//! Two lockfile shapes are handled:
//! - yarn.lock: flat `name@range` keys. Entries are filtered by the installed version read from
//!   the package's own manifest; disagreeing entries degrade to the bare version.
//! - package-lock.json / npm-shrinkwrap.json: a `dependencies` tree walked along the package's
//!   parent chain, searching the deepest declaring ancestor first.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error_handling::utils::not_found;
use crate::error_handling::ResolveError;
use crate::lockfile::{NestedLockfile, NestedNode, PackagesEntry};
use crate::package_details::PackageIdentity;
use crate::package_manager::PackageManager;
use crate::utils::{log_warn, resolve_path, to_slash};
use crate::yarn_lock::ClassicLockfile;

const FILE_PREFIX: &str = "file:";

/// Outcome of a resolution. Both variants print as a plain string.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Resolution {
    /// Exact reference recorded in the lockfile.
    Exact(String),
    /// Lockfile was ambiguous or had no reference; only the version is known.
    FallbackToVersion(String),
}

impl Resolution {
    pub fn as_str(&self) -> &str {
        match self {
            Resolution::Exact(s) | Resolution::FallbackToVersion(s) => s,
        }
    }

    pub fn into_string(self) -> String {
        match self {
            Resolution::Exact(s) | Resolution::FallbackToVersion(s) => s,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, Resolution::Exact(_))
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Loads parsed lockfile documents for a project.
pub trait LockfileLoader {
    fn load_classic(&self, project_root: &Path) -> Result<ClassicLockfile, ResolveError>;
    fn load_nested(&self, project_root: &Path, file_name: &str)
        -> Result<NestedLockfile, ResolveError>;
}

/// Reads the version of the package actually installed at `identity.path`.
pub trait InstalledVersionReader {
    fn installed_version(
        &self,
        project_root: &Path,
        identity: &PackageIdentity,
    ) -> Result<String, ResolveError>;
}

/// Resolve `identity` against the lockfile of `manager` in `project_root`.
pub fn resolve_package(
    identity: &PackageIdentity,
    manager: PackageManager,
    project_root: &Path,
    installed: &dyn InstalledVersionReader,
    lockfiles: &dyn LockfileLoader,
) -> Result<Resolution, ResolveError> {
    match manager {
        PackageManager::Yarn => {
            let lock = lockfiles.load_classic(project_root)?;
            let version = installed.installed_version(project_root, identity)?;
            resolve_classic(identity, &version, project_root, &lock)
        }
        PackageManager::Npm | PackageManager::NpmShrinkwrap => {
            let lock = lockfiles.load_nested(project_root, manager.lockfile_name())?;
            resolve_nested(identity, &lock)
        }
    }
}

/// yarn.lock strategy.
pub fn resolve_classic(
    identity: &PackageIdentity,
    installed_version: &str,
    project_root: &Path,
    lock: &ClassicLockfile,
) -> Result<Resolution, ResolveError> {
    let entries: Vec<_> = lock.matching(&identity.name, installed_version).collect();
    let first = entries.first().ok_or_else(|| {
        let details = format!("no {}@* entry at version {}", identity.name, installed_version);
        not_found(&identity.path_specifier, Some(details.as_str()))
    })?;

    // an absent `resolved` is a distinct value of its own
    let resolutions: BTreeSet<Option<&str>> =
        entries.iter().map(|e| e.resolved.as_deref()).collect();
    if resolutions.len() > 1 {
        log_warn(&format!(
            "Ambiguous lockfile entries for {}. Using version {}",
            identity.path_specifier, installed_version
        ));
        return Ok(Resolution::FallbackToVersion(installed_version.to_string()));
    }

    if let Some(resolved) = first.resolved.as_deref().filter(|r| !r.is_empty()) {
        return Ok(Resolution::Exact(resolved.to_string()));
    }

    let reference = &first.key[identity.name.len() + 1..];
    if let Some(rel) = reference.strip_prefix(FILE_PREFIX).filter(|r| r.starts_with('.')) {
        let abs = resolve_path(project_root, rel);
        return Ok(Resolution::Exact(format!("{}{}", FILE_PREFIX, to_slash(&abs))));
    }
    Ok(Resolution::Exact(reference.to_string()))
}

/// package-lock.json / npm-shrinkwrap.json strategy.
pub fn resolve_nested(
    identity: &PackageIdentity,
    lock: &NestedLockfile,
) -> Result<Resolution, ResolveError> {
    if lock.root.dependencies.is_none() {
        if let Some(packages) = &lock.packages {
            return resolve_packages_map(identity, packages);
        }
    }

    let mut stack: Vec<&NestedNode> = vec![&lock.root];
    for ancestor in identity.ancestors() {
        let current = stack[stack.len() - 1];
        match current.child(ancestor) {
            Some(child) => stack.push(child),
            // later ancestors are unreachable; search what was collected
            None => break,
        }
    }
    stack.reverse();

    let entry = stack
        .iter()
        .find_map(|node| node.child(&identity.name))
        .ok_or_else(|| {
            not_found(
                &identity.path_specifier,
                Some("no ancestor in the dependency tree declares it"),
            )
        })?;
    entry_resolution(identity, entry.resolved.as_deref(), entry.version.as_deref())
}

/// lockfileVersion 3: install paths are keys, nearest `node_modules` wins.
fn resolve_packages_map(
    identity: &PackageIdentity,
    packages: &std::collections::BTreeMap<String, PackagesEntry>,
) -> Result<Resolution, ResolveError> {
    let ancestors = identity.ancestors();
    let entry = (0..=ancestors.len())
        .rev()
        .map(|depth| {
            let mut names: Vec<&str> = ancestors[..depth].iter().map(String::as_str).collect();
            names.push(&identity.name);
            format!("node_modules/{}", names.join("/node_modules/"))
        })
        .find_map(|key| packages.get(&key))
        .ok_or_else(|| {
            not_found(
                &identity.path_specifier,
                Some("no install path in the packages map matches it"),
            )
        })?;
    entry_resolution(identity, entry.resolved.as_deref(), entry.version.as_deref())
}

fn entry_resolution(
    identity: &PackageIdentity,
    resolved: Option<&str>,
    version: Option<&str>,
) -> Result<Resolution, ResolveError> {
    if let Some(resolved) = resolved.filter(|r| !r.is_empty()) {
        return Ok(Resolution::Exact(resolved.to_string()));
    }
    match version.filter(|v| !v.is_empty()) {
        Some(version) => {
            log_warn(&format!(
                "No resolved field for {}. Using version {}",
                identity.path_specifier, version
            ));
            Ok(Resolution::FallbackToVersion(version.to_string()))
        }
        None => Err(not_found(
            &identity.path_specifier,
            Some("entry has neither resolved nor version"),
        )),
    }
}
