use serde::{Deserialize, Serialize};

/// Where the design document lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DesignConfig {
    /// Path to the design file (typically relative to project root).
    pub path: String,
}

/// Snapshot history settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Path to the history database (typically relative to project root).
    pub path: String,
    /// When false, edits are saved without recording checkpoints.
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

fn enabled_by_default() -> bool {
    true
}

/// Serializable configuration describing a netlist project.
///
/// Lives at `.netlist/project.json` in the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Human-friendly project name; also the design's name.
    pub name: String,
    /// Optional description / notes.
    pub description: Option<String>,
    /// Config format version.
    pub config_version: String,
    pub design: DesignConfig,
    pub history: HistoryConfig,
    /// Optional primitive library (YAML or JSON) seeded into new designs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primitives: Option<String>,
}

impl ProjectConfig {
    pub fn new(
        name: impl Into<String>,
        design_path: impl Into<String>,
        history_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            config_version: "0.1.0".to_string(),
            design: DesignConfig { path: design_path.into() },
            history: HistoryConfig { path: history_path.into(), enabled: true },
            primitives: None,
        }
    }
}
