//! Read package-lock.json / npm-shrinkwrap.json as a nested dependency tree.
//! lockfileVersion 1 and 2 carry the `dependencies` tree; version 3 only has the flat `packages` map.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error_handling::utils::{unparseable, unreadable};
use crate::error_handling::ResolveError;

/// A node of the `dependencies` tree. The document root is a node too.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct NestedNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<BTreeMap<String, NestedNode>>,
}

impl NestedNode {
    pub fn child(&self, name: &str) -> Option<&NestedNode> {
        self.dependencies.as_ref().and_then(|d| d.get(name))
    }
}

/// Entry of the flat `packages` map (key is the install path, "" for the root project).
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PackagesEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
}

/// Parsed npm lockfile.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NestedLockfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lockfile_version: Option<u32>,
    #[serde(flatten)]
    pub root: NestedNode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub packages: Option<BTreeMap<String, PackagesEntry>>,
}

/// Read and parse an npm lockfile.
pub fn read_nested_lockfile(path: &Path) -> Result<NestedLockfile, ResolveError> {
    let s = std::fs::read_to_string(path).map_err(|e| unreadable(path, e))?;
    parse_nested_lockfile(&s, path)
}

/// Parse npm lockfile JSON. `path` is only used for error messages.
pub fn parse_nested_lockfile(content: &str, path: &Path) -> Result<NestedLockfile, ResolveError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    serde_json::from_str(content).map_err(|e| unparseable(path, Some(e.line()), &e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_v1_tree() {
        let lock = parse_nested_lockfile(
            r#"{
  "name": "fixture",
  "version": "1.0.0",
  "lockfileVersion": 1,
  "requires": true,
  "dependencies": {
    "a": {
      "version": "1.0.0",
      "resolved": "https://registry.npmjs.org/a/-/a-1.0.0.tgz",
      "integrity": "sha512-xyz",
      "requires": { "b": "^2.0.0" },
      "dependencies": {
        "b": {
          "version": "2.0.0",
          "resolved": "https://registry.npmjs.org/b/-/b-2.0.0.tgz"
        }
      }
    }
  }
}"#,
            Path::new("package-lock.json"),
        )
        .expect("parse");
        assert_eq!(lock.lockfile_version, Some(1));
        let a = lock.root.child("a").expect("a");
        let b = a.child("b").expect("b");
        assert_eq!(b.resolved.as_deref(), Some("https://registry.npmjs.org/b/-/b-2.0.0.tgz"));
        assert!(lock.packages.is_none());
    }

    #[test]
    fn test_parse_v3_packages() {
        let lock = parse_nested_lockfile(
            r#"{
  "lockfileVersion": 3,
  "packages": {
    "": { "name": "fixture", "version": "1.0.0" },
    "node_modules/a": { "version": "1.0.0", "resolved": "https://registry.npmjs.org/a/-/a-1.0.0.tgz" }
  }
}"#,
            Path::new("package-lock.json"),
        )
        .expect("parse");
        assert!(lock.root.dependencies.is_none());
        let packages = lock.packages.expect("packages");
        assert_eq!(
            packages.get("node_modules/a").and_then(|e| e.version.as_deref()),
            Some("1.0.0")
        );
    }

    #[test]
    fn test_bom_prefixed_lockfile() {
        let td = tempfile::tempdir().expect("tmp");
        let path = td.path().join("package-lock.json");
        std::fs::write(
            &path,
            "\u{feff}{\"lockfileVersion\":1,\"dependencies\":{\"ms\":{\"version\":\"2.1.3\"}}}",
        )
        .expect("write");
        let lock = read_nested_lockfile(&path).expect("parse");
        assert_eq!(lock.lockfile_version, Some(1));
        assert_eq!(lock.root.child("ms").and_then(|n| n.version.as_deref()), Some("2.1.3"));
    }

    #[test]
    fn test_invalid_json_is_unparseable() {
        let err = parse_nested_lockfile("{\n  \"dependencies\": ", Path::new("package-lock.json"))
            .unwrap_err();
        assert!(matches!(err, ResolveError::LockfileUnparseable { .. }));
    }

    #[test]
    fn test_read_missing_file_is_unreadable() {
        let td = tempfile::tempdir().expect("tmp");
        let err = read_nested_lockfile(&td.path().join("package-lock.json")).unwrap_err();
        assert!(matches!(err, ResolveError::LockfileUnreadable { .. }));
    }
}
