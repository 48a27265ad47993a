use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Local;

/// When set, every log line is also appended to this file.
pub const LOG_FILE_ENV: &str = "LOCKPIN_LOG_FILE";

static QUIET_OVERRIDE: AtomicBool = AtomicBool::new(false);

/// Force quiet mode (from --quiet or .lockpinrc). Warnings still reach the log file.
pub fn set_quiet(quiet: bool) {
    QUIET_OVERRIDE.store(quiet, Ordering::Relaxed);
}

fn is_quiet() -> bool {
    if QUIET_OVERRIDE.load(Ordering::Relaxed) {
        return true;
    }
    if env::var("LOCKPIN_QUIET").map(|v| v == "1" || v == "true").unwrap_or(false) {
        return true;
    }
    env::var("LOCKPIN_LOG")
        .map(|v| v.to_lowercase() == "quiet" || v.to_lowercase() == "error")
        .unwrap_or(false)
}

fn write_line(message: &str, force: bool) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let log_message = format!("[{}] {}", timestamp, message);

    // stdout carries the resolution; logs go to stderr
    if force || !is_quiet() {
        eprintln!("{}", log_message);
    }

    if let Ok(path) = env::var(LOG_FILE_ENV) {
        if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) {
            let _ = writeln!(file, "{}", log_message);
        }
    }
}

pub fn log(message: &str) {
    write_line(message, false);
}

pub fn log_warn(message: &str) {
    write_line(&format!("warning: {}", message), false);
}

pub fn log_error(message: &str) {
    write_line(message, true);
}

/// Lexically normalize `base.join(rel)`: drop `.`, pop on `..`. Never touches the filesystem.
pub fn resolve_path(base: &Path, rel: &str) -> PathBuf {
    let joined = base.join(rel);
    let mut out = PathBuf::new();
    for comp in joined.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                // ".." at the root stays at the root
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Forward-slash form of a path, used in resolution strings.
pub fn to_slash(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Run `f` with the log file pointed at a fresh temp file and return what was written.
/// Serialized across tests because the log file is process-wide.
#[cfg(test)]
pub(crate) fn capture_log_file<F: FnOnce()>(f: F) -> String {
    use std::sync::Mutex;

    static LOG_FILE_LOCK: Mutex<()> = Mutex::new(());

    let _guard = LOG_FILE_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let td = tempfile::tempdir().expect("tmp");
    let log_path = td.path().join("lockpin.log");
    env::set_var(LOG_FILE_ENV, &log_path);
    f();
    env::remove_var(LOG_FILE_ENV);
    std::fs::read_to_string(&log_path).unwrap_or_default()
}
