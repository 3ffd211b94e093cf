use std::path::{Path, PathBuf};

/// Logical layout of a netlist project on disk.
///
/// Derived from a chosen root path. It does *not* perform any IO itself; the
/// CLI creates directories and files based on it.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
    /// Root directory of the project.
    pub root: PathBuf,
    /// Directory for internal metadata (.netlist).
    pub meta_dir: PathBuf,
    /// Path to the project config file (JSON).
    pub project_config_path: PathBuf,
    /// Path to the snapshot history database.
    pub history_path: PathBuf,
    /// Default path of the design document.
    pub design_path: PathBuf,
}

impl ProjectLayout {
    /// Compute the default layout for a project rooted at `root`.
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let meta_dir = root.join(".netlist");
        let project_config_path = meta_dir.join("project.json");
        let history_path = meta_dir.join("history.db");
        let design_path = root.join("design.json");

        Self { root, meta_dir, project_config_path, history_path, design_path }
    }

    /// `path` relative to the root when it lives under it, for storing in config.
    pub fn relative_string(&self, path: &Path) -> String {
        match path.strip_prefix(&self.root) {
            Ok(rel) => rel.to_string_lossy().to_string(),
            Err(_) => path.to_string_lossy().to_string(),
        }
    }

    /// Resolve a config path against the root unless it is already absolute.
    pub fn resolve(&self, configured: &str) -> PathBuf {
        let p = Path::new(configured);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.root.join(p)
        }
    }
}
