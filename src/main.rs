//! Thin CLI layer: parse args, styled output, and call into lockpin-core.
//! Crash-proof: panic caught and reported; all errors return Result.

use clap::{Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use lockpin_core::PackageManager;

// ---- UI helpers (no-op when stdout isn't a TTY) ----

fn use_color() -> bool {
    std::io::stdout().is_terminal()
        && env::var("NO_COLOR").unwrap_or_default().is_empty()
}

fn error(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.red());
    } else {
        eprintln!("{}", msg);
    }
}

fn info(msg: &str) {
    if use_color() {
        println!("{}", msg.cyan());
    } else {
        println!("{}", msg);
    }
}

fn dim(msg: &str) {
    if use_color() {
        println!("{}", msg.dimmed());
    } else {
        println!("{}", msg);
    }
}

fn root_arg() -> Arg {
    Arg::new("root")
        .long("root")
        .value_name("DIR")
        .help("Project root containing the lockfile (default: current directory)")
}

fn json_arg() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Output machine-readable JSON result")
}

fn quiet_arg() -> Arg {
    Arg::new("quiet")
        .short('q')
        .long("quiet")
        .action(ArgAction::SetTrue)
        .help("Suppress log lines and warnings on stderr")
}

fn package_manager_arg() -> Arg {
    Arg::new("package-manager")
        .long("package-manager")
        .value_parser(["yarn", "npm", "npm-shrinkwrap"])
        .help("Lockfile to use when both yarn.lock and an npm lockfile exist")
}

fn project_root(sub: &ArgMatches) -> Result<PathBuf, String> {
    let root = match sub.get_one::<String>("root") {
        Some(dir) => PathBuf::from(dir),
        None => env::current_dir().map_err(|e| format!("Can't read current directory: {}", e))?,
    };
    // `file:` references are rewritten against this path, so make it absolute
    std::fs::canonicalize(&root).map_err(|e| format!("Invalid project root {}: {}", root.display(), e))
}

fn package_manager_flag(sub: &ArgMatches) -> Result<Option<PackageManager>, String> {
    sub.get_one::<String>("package-manager")
        .map(|s| s.parse::<PackageManager>())
        .transpose()
}

fn detect(sub: &ArgMatches, root: &Path) -> Result<PackageManager, String> {
    let cfg = lockpin_core::load_config(root);
    if sub.get_flag("quiet") || cfg.quiet.unwrap_or(false) {
        lockpin_core::set_quiet(true);
    }
    let override_pm = lockpin_core::effective_package_manager(package_manager_flag(sub)?, &cfg);
    lockpin_core::detect_package_manager(root, override_pm).map_err(|e| e.to_string())
}

fn run() -> Result<(), String> {
    let matches = Command::new("lockpin")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Find the exact resolved reference of an installed package from the project lockfile")
        .after_help(
            "Examples:\n  lockpin resolve lodash\n  lockpin resolve react-scripts/@babel/core\n  lockpin resolve left-pad --package-manager yarn --json\n  lockpin detect",
        )
        .subcommand(
            Command::new("resolve")
                .about("Print the lockfile resolution (tarball URL, git ref or file: path) of a package")
                .arg(
                    Arg::new("package")
                        .required(true)
                        .help("Package path specifier, e.g. lodash or parent/@scope/child"),
                )
                .arg(root_arg())
                .arg(package_manager_arg())
                .arg(json_arg())
                .arg(quiet_arg()),
        )
        .subcommand(
            Command::new("detect")
                .about("Print which package manager's lockfile will be used")
                .arg(root_arg())
                .arg(package_manager_arg())
                .arg(json_arg())
                .arg(quiet_arg()),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("resolve", sub)) => {
            let root = project_root(sub)?;
            let manager = detect(sub, &root)?;
            let spec = sub
                .get_one::<String>("package")
                .map(String::as_str)
                .unwrap_or_default();
            let identity = lockpin_core::parse_package_specifier(spec)
                .ok_or_else(|| format!("Can't find package {}", spec))?;
            let resolution = lockpin_core::resolve_in_project(&identity, manager, &root)
                .map_err(|e| e.to_string())?;

            if sub.get_flag("json") {
                let out = serde_json::json!({
                    "schemaVersion": "1",
                    "command": "resolve",
                    "package": identity.path_specifier,
                    "packageManager": manager.as_str(),
                    "resolution": resolution.as_str(),
                    "exact": resolution.is_exact(),
                });
                println!("{}", out);
            } else {
                println!("{}", resolution);
            }
        }
        Some(("detect", sub)) => {
            let root = project_root(sub)?;
            let manager = detect(sub, &root)?;
            if sub.get_flag("json") {
                let out = serde_json::json!({
                    "schemaVersion": "1",
                    "command": "detect",
                    "packageManager": manager.as_str(),
                    "lockfile": manager.lockfile_name(),
                });
                println!("{}", out);
            } else {
                info(manager.as_str());
            }
        }
        _ => {
            if use_color() {
                println!("{}", "lockpin".bright_cyan().bold());
            } else {
                println!("lockpin");
            }
            dim("Find the exact lockfile resolution of an installed package.");
            dim("\nRun `lockpin --help` for details.");
        }
    }

    Ok(())
}

fn main() {
    if !use_color() {
        colored::control::set_override(false);
    }

    let code = match std::panic::catch_unwind(run) {
        Ok(Ok(())) => 0,
        Ok(Err(e)) => {
            error(&e);
            1
        }
        Err(_) => {
            error("An unexpected error occurred. Please report this issue.");
            1
        }
    };
    std::process::exit(code);
}
