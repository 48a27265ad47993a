//! Filesystem-backed lockfile loader and installed-version reader.

use std::path::{Path, PathBuf};

use crate::error_handling::ResolveError;
use crate::lockfile::{read_nested_lockfile, NestedLockfile};
use crate::package_details::PackageIdentity;
use crate::package_manager::{PackageManager, YARN_LOCK};
use crate::resolution::{resolve_package, InstalledVersionReader, LockfileLoader, Resolution};
use crate::utils::log;
use crate::workspaces::find_workspace_root;
use crate::yarn_lock::{read_yarn_lock, ClassicLockfile};

/// Reads lockfiles and installed manifests from a project on disk.
#[derive(Clone, Copy, Debug, Default)]
pub struct FsProject;

impl FsProject {
    /// yarn.lock of the project, or of the enclosing workspace root when the project has none.
    pub fn yarn_lock_path(project_root: &Path) -> PathBuf {
        let own = project_root.join(YARN_LOCK);
        if own.exists() {
            return own;
        }
        match find_workspace_root(project_root) {
            Some(ws) if ws.join(YARN_LOCK).exists() => {
                log(&format!("Using {} from workspace root {}", YARN_LOCK, ws.display()));
                ws.join(YARN_LOCK)
            }
            _ => own,
        }
    }
}

/// Resolve a package against the lockfile on disk under `project_root`.
pub fn resolve_in_project(
    identity: &PackageIdentity,
    manager: PackageManager,
    project_root: &Path,
) -> Result<Resolution, ResolveError> {
    resolve_package(identity, manager, project_root, &FsProject, &FsProject)
}

impl LockfileLoader for FsProject {
    fn load_classic(&self, project_root: &Path) -> Result<ClassicLockfile, ResolveError> {
        read_yarn_lock(&Self::yarn_lock_path(project_root))
    }

    fn load_nested(
        &self,
        project_root: &Path,
        file_name: &str,
    ) -> Result<NestedLockfile, ResolveError> {
        read_nested_lockfile(&project_root.join(file_name))
    }
}

impl InstalledVersionReader for FsProject {
    fn installed_version(
        &self,
        project_root: &Path,
        identity: &PackageIdentity,
    ) -> Result<String, ResolveError> {
        let manifest = project_root.join(&identity.path).join("package.json");
        let unavailable = |source: String| ResolveError::InstalledVersionUnavailable {
            package: identity.path_specifier.clone(),
            path: manifest.display().to_string(),
            source,
        };
        let s = std::fs::read_to_string(&manifest).map_err(|e| unavailable(e.to_string()))?;
        let v: serde_json::Value =
            serde_json::from_str(&s).map_err(|e| unavailable(e.to_string()))?;
        v.get("version")
            .and_then(|x| x.as_str())
            .map(String::from)
            .ok_or_else(|| unavailable("no version field".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package_details::parse_package_specifier;

    #[test]
    fn reads_installed_version_of_nested_package() {
        let td = tempfile::tempdir().expect("tmp");
        let pkg = td.path().join("node_modules/a/node_modules/@scope/b");
        std::fs::create_dir_all(&pkg).expect("mkdir");
        std::fs::write(pkg.join("package.json"), r#"{"name":"@scope/b","version":"3.2.1"}"#)
            .expect("write");

        let identity = parse_package_specifier("a/@scope/b").expect("spec");
        let version = FsProject.installed_version(td.path(), &identity).expect("version");
        assert_eq!(version, "3.2.1");
    }

    #[test]
    fn missing_manifest_or_version_is_unavailable() {
        let td = tempfile::tempdir().expect("tmp");
        let identity = parse_package_specifier("ghost").expect("spec");
        let err = FsProject.installed_version(td.path(), &identity).unwrap_err();
        assert!(matches!(err, ResolveError::InstalledVersionUnavailable { .. }));

        let pkg = td.path().join("node_modules/ghost");
        std::fs::create_dir_all(&pkg).expect("mkdir");
        std::fs::write(pkg.join("package.json"), r#"{"name":"ghost"}"#).expect("write");
        let err = FsProject.installed_version(td.path(), &identity).unwrap_err();
        assert!(matches!(err, ResolveError::InstalledVersionUnavailable { .. }));
    }

    #[test]
    fn workspace_member_uses_root_yarn_lock() {
        let td = tempfile::tempdir().expect("tmp");
        let root = td.path();
        std::fs::write(root.join("package.json"), r#"{"workspaces":["packages/*"]}"#).expect("pj");
        std::fs::write(root.join(YARN_LOCK), "a@^1:\n  version \"1.0.0\"\n").expect("lock");
        let member = root.join("packages/app");
        std::fs::create_dir_all(&member).expect("mkdir");
        std::fs::write(member.join("package.json"), r#"{"name":"app"}"#).expect("pj");

        assert_eq!(FsProject::yarn_lock_path(&member), root.join(YARN_LOCK));
        let lock = FsProject.load_classic(&member).expect("lock");
        assert_eq!(lock.entries.len(), 1);
    }
}
