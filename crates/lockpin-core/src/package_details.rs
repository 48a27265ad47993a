//! Package identity parsed from a CLI specifier like `foo`, `@scope/foo` or `foo/@scope/bar`.

use serde::{Deserialize, Serialize};

/// One installed package instance, addressed by its chain of parents under node_modules.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageIdentity {
    /// Bare package name (last element of `package_names`).
    pub name: String,
    /// Install path relative to the project root, e.g. `node_modules/a/node_modules/b`.
    pub path: String,
    /// Names from the top-level dependency down to this package.
    pub package_names: Vec<String>,
    /// The specifier as given, e.g. `a/b`.
    pub path_specifier: String,
    /// `a => b`
    pub human_readable_path_specifier: String,
    pub is_nested: bool,
}

impl PackageIdentity {
    /// Ancestors of the target in the dependency chain (all names except the last).
    pub fn ancestors(&self) -> &[String] {
        self.package_names
            .split_last()
            .map(|(_, ancestors)| ancestors)
            .unwrap_or(&[])
    }
}

/// Parse a CLI package specifier. Returns None for empty segments or a dangling/double scope.
pub fn parse_package_specifier(spec: &str) -> Option<PackageIdentity> {
    let normalized = spec.trim().replace('\\', "/");
    let trimmed = normalized.trim_matches('/');
    if trimmed.is_empty() {
        return None;
    }

    let mut package_names: Vec<String> = Vec::new();
    let mut scope: Option<&str> = None;
    for part in trimmed.split('/') {
        if part.is_empty() {
            return None;
        }
        if part.starts_with('@') {
            if scope.is_some() || part.len() == 1 {
                return None;
            }
            scope = Some(part);
        } else if let Some(s) = scope.take() {
            package_names.push(format!("{}/{}", s, part));
        } else {
            package_names.push(part.to_string());
        }
    }
    if scope.is_some() {
        return None;
    }

    let name = package_names.last()?.clone();
    Some(PackageIdentity {
        name,
        path: format!("node_modules/{}", package_names.join("/node_modules/")),
        human_readable_path_specifier: package_names.join(" => "),
        is_nested: package_names.len() > 1,
        path_specifier: trimmed.to_string(),
        package_names,
    })
}
