//! Workspace detection (package.json "workspaces" field).
//!
//! Only the two layouts yarn classic accepts are read: `"workspaces": ["packages/*"]` and
//! `"workspaces": { "packages": ["packages/*"] }`. A `*` selects the direct children of the
//! directory before it.

use std::path::{Path, PathBuf};

use serde_json::Value;

fn workspace_patterns(dir: &Path) -> Result<Vec<String>, String> {
    let manifest = dir.join("package.json");
    if !manifest.is_file() {
        return Ok(Vec::new());
    }
    let s = std::fs::read_to_string(&manifest).map_err(|e| e.to_string())?;
    let v: Value = serde_json::from_str(&s).map_err(|e| e.to_string())?;
    let declared = v
        .get("workspaces")
        .and_then(|w| w.as_array().or_else(|| w.get("packages").and_then(Value::as_array)));
    Ok(declared
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .map(|p| p.trim().trim_start_matches("./").trim_end_matches('/').to_string())
        .filter(|p| !p.is_empty())
        .collect())
}

/// `packages/*` -> `packages`; None for a literal member path.
fn glob_parent(pattern: &str) -> Option<&str> {
    pattern
        .split_once('*')
        .map(|(prefix, _)| prefix.trim_end_matches('/'))
}

fn is_package_dir(dir: &Path) -> bool {
    dir.is_dir() && dir.join("package.json").is_file()
}

/// Member package directories declared by `dir/package.json`, relative to `dir`, sorted.
pub fn list_workspace_roots(dir: &Path) -> Result<Vec<PathBuf>, String> {
    let mut members = Vec::new();
    for pattern in workspace_patterns(dir)? {
        match glob_parent(&pattern) {
            Some(parent) => {
                let Ok(children) = std::fs::read_dir(dir.join(parent)) else {
                    continue;
                };
                members.extend(
                    children
                        .flatten()
                        .map(|e| e.path())
                        .filter(|p| is_package_dir(p))
                        .filter_map(|p| p.strip_prefix(dir).ok().map(Path::to_path_buf)),
                );
            }
            None if is_package_dir(&dir.join(&pattern)) => members.push(PathBuf::from(&pattern)),
            None => {}
        }
    }
    members.sort();
    members.dedup();
    Ok(members)
}

/// True when `candidate` is a package directory selected by one of `root`'s workspace patterns.
/// Matches against the patterns directly instead of listing every member.
pub fn contains_member(root: &Path, candidate: &Path) -> bool {
    let Ok(rel) = candidate.strip_prefix(root) else {
        return false;
    };
    if rel.as_os_str().is_empty() || !is_package_dir(candidate) {
        return false;
    }
    let Ok(patterns) = workspace_patterns(root) else {
        return false;
    };
    patterns.iter().any(|pattern| match glob_parent(pattern) {
        Some(parent) => rel.parent() == Some(Path::new(parent)),
        None => rel == Path::new(pattern),
    })
}

/// Nearest proper ancestor of `dir` that declares `dir` as a workspace member.
pub fn find_workspace_root(dir: &Path) -> Option<PathBuf> {
    dir.ancestors()
        .skip(1)
        .find(|candidate| contains_member(candidate, dir))
        .map(Path::to_path_buf)
}
