//! Primitive block libraries loaded from YAML or JSON.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::ObjectKind;
use crate::model::check_name;

/// One primitive block type: a fixed, ordered pin list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveSpec {
    pub name: String,
    pub pins: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimitiveLibrary {
    #[serde(default)]
    pub primitives: Vec<PrimitiveSpec>,
}

impl PrimitiveLibrary {
    /// Library every new project starts from.
    pub fn builtin() -> Self {
        Self {
            primitives: vec![PrimitiveSpec {
                name: "transistor".to_string(),
                pins: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                description: Some("Three-terminal transistor".to_string()),
            }],
        }
    }

    /// Load a library, choosing JSON or YAML by file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path)
            .with_context(|| format!("Failed to read primitive library at {}", path.display()))?;
        let library: PrimitiveLibrary = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_slice(&bytes).context("Failed to parse primitive library JSON")?
        } else {
            serde_yaml::from_slice(&bytes).context("Failed to parse primitive library YAML")?
        };
        library.validate()?;
        Ok(library)
    }

    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for spec in &self.primitives {
            if spec.name.trim().is_empty() {
                return Err(anyhow!("Primitive 'name' is required"));
            }
            if !names.insert(spec.name.as_str()) {
                return Err(anyhow!("Primitive '{}' is defined more than once", spec.name));
            }
            let mut pins = HashSet::new();
            for pin in &spec.pins {
                if pin.trim().is_empty() {
                    return Err(anyhow!("Primitive '{}' has an empty pin name", spec.name));
                }
                check_name(ObjectKind::Pin, pin).map_err(|e| anyhow!("Primitive '{}': {}", spec.name, e))?;
                if !pins.insert(pin.as_str()) {
                    return Err(anyhow!("Primitive '{}' declares pin '{}' twice", spec.name, pin));
                }
            }
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&PrimitiveSpec> {
        self.primitives.iter().find(|p| p.name == name)
    }
}
