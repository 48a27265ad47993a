//! Optional config from .lockpinrc or ~/.lockpinrc (JSON). Merged with env and CLI.

use std::path::{Path, PathBuf};

use crate::package_manager::PackageManager;
use crate::utils::log_warn;

pub const CONFIG_FILE: &str = ".lockpinrc";

/// Optional config from file. CLI and env override these.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Config {
    pub package_manager: Option<PackageManager>,
    pub quiet: Option<bool>,
}

/// Load config from .lockpinrc in dir, then ~/.lockpinrc. Missing or invalid file = default.
pub fn load_config(dir: &Path) -> Config {
    load_config_from(&[Some(dir.join(CONFIG_FILE)), home_config_path()])
}

fn home_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_FILE))
}

fn load_config_from(candidates: &[Option<PathBuf>]) -> Config {
    let mut cfg = Config::default();
    for path in candidates.iter().flatten() {
        if !path.is_file() {
            continue;
        }
        if let Ok(s) = std::fs::read_to_string(path) {
            if let Ok(v) = serde_json::from_str::<serde_json::Value>(&s) {
                if let Some(pm) = v.get("packageManager").and_then(|x| x.as_str()) {
                    match pm.parse::<PackageManager>() {
                        Ok(pm) => cfg.package_manager = Some(pm),
                        Err(e) => log_warn(&format!("{} in {}", e, path.display())),
                    }
                }
                if let Some(q) = v.get("quiet").and_then(|x| x.as_bool()) {
                    cfg.quiet = Some(q);
                }
            }
        }
        break;
    }
    cfg
}

/// Package manager override: CLI flag, then LOCKPIN_PACKAGE_MANAGER, then config file.
pub fn effective_package_manager(
    cli: Option<PackageManager>,
    cfg: &Config,
) -> Option<PackageManager> {
    if cli.is_some() {
        return cli;
    }
    if let Ok(v) = std::env::var("LOCKPIN_PACKAGE_MANAGER") {
        if let Ok(pm) = v.trim().parse::<PackageManager>() {
            return Some(pm);
        }
    }
    cfg.package_manager
}
