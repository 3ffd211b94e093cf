use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod commands;

/// Resolve a `--root` argument to an absolute project directory.
///
/// The directory need not exist yet (`init-project` creates it), in which case
/// the path is joined onto the working directory instead of canonicalized.
pub fn canonicalize_or_current(root: &str) -> Result<PathBuf> {
    let cwd = || env::current_dir().context("Failed to get current directory");
    let path = Path::new(root);
    if path == Path::new(".") {
        return cwd();
    }
    path.canonicalize().or_else(|_| Ok(cwd()?.join(path)))
}

/// Default project name: the root directory's final component, or
/// `unnamed-project` for roots such as `/`.
pub fn infer_project_name(root: &Path) -> String {
    root.file_name()
        .and_then(|name| name.to_str())
        .map_or_else(|| "unnamed-project".to_string(), str::to_string)
}

/// Initialise `env_logger`: `RUST_LOG` wins, otherwise `warn` (or `debug`
/// with `--verbose`).
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .try_init();
}
