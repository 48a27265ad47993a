//! Core library for lockpin: find the exact resolved reference of an installed npm package
//! from yarn.lock, package-lock.json or npm-shrinkwrap.json.
//! Used by the CLI binary; can be reused by patching tools that pin to a resolved artifact.

pub mod config;
pub mod error_handling;
pub mod lockfile;
pub mod package_details;
pub mod package_manager;
pub mod project;
pub mod resolution;
pub mod utils;
pub mod workspaces;
pub mod yarn_lock;

// Re-export main API for CLI
pub use config::{effective_package_manager, load_config, Config};
pub use error_handling::ResolveError;
pub use lockfile::{read_nested_lockfile, NestedLockfile, NestedNode};
pub use package_details::{parse_package_specifier, PackageIdentity};
pub use package_manager::{detect_package_manager, PackageManager};
pub use project::{resolve_in_project, FsProject};
pub use resolution::{
    resolve_classic, resolve_nested, resolve_package, InstalledVersionReader, LockfileLoader,
    Resolution,
};
pub use utils::{log, log_error, log_warn, set_quiet};
pub use workspaces::{contains_member, find_workspace_root, list_workspace_roots};
pub use yarn_lock::{read_yarn_lock, ClassicLockEntry, ClassicLockfile};
