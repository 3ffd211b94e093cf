use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use log::info;

use crate::db::{load_project_config, open_history_db, Checkpoint, HistoryDb, ProjectConfig, ProjectLayout};
use crate::library::PrimitiveLibrary;
use crate::persist::{DesignStore, JsonDesignStore};
use crate::project::NetlistProject;
use crate::schematic::Schematic;

/// Convenience wrapper bundling layout, config, design path, and the open history.
#[derive(Debug)]
pub struct ProjectContext {
    pub layout: ProjectLayout,
    pub config: ProjectConfig,
    pub design_path: PathBuf,
    pub history_path: PathBuf,
    pub history: HistoryDb,
}

impl ProjectContext {
    /// Load project config and open the history database for a given root.
    pub fn from_root(root: impl AsRef<Path>) -> Result<Self> {
        let layout = ProjectLayout::new(root);
        let config = load_project_config(&layout)?;
        let design_path = layout.resolve(&config.design.path);
        let (history_path, history) = open_history_db(&layout, &config)?;
        Ok(Self { layout, config, design_path, history_path, history })
    }

    /// Primitive library configured for this project, or the built-in one.
    pub fn primitive_library(&self) -> Result<PrimitiveLibrary> {
        match &self.config.primitives {
            Some(path) => PrimitiveLibrary::load(&self.layout.resolve(path)),
            None => Ok(PrimitiveLibrary::builtin()),
        }
    }

    /// A fresh design seeded with the project's primitives.
    pub fn empty_schematic(&self) -> Result<Schematic> {
        let library = self.primitive_library()?;
        let project = NetlistProject::with_primitives(&self.config.name, &library)
            .context("Failed to seed design with primitives")?;
        Ok(Schematic::new(project))
    }

    /// Load the design document, or start a fresh one when none exists yet.
    pub fn load_schematic(&self) -> Result<Schematic> {
        if self.design_path.exists() {
            JsonDesignStore.load(&self.design_path)
        } else {
            self.empty_schematic()
        }
    }

    /// Save the design and record a history checkpoint for `action`.
    ///
    /// Returns the new checkpoint id, or `None` when nothing was recorded.
    pub fn commit(&mut self, schematic: &Schematic, action: &str) -> Result<Option<i64>> {
        JsonDesignStore.save(&self.design_path, schematic)?;
        if !self.config.history.enabled {
            return Ok(None);
        }
        let state = JsonDesignStore::to_json(schematic)?;
        let id = self.history.record(action, &state).context("Failed to record history checkpoint")?;
        Ok(id)
    }

    fn restore(&self, checkpoint: &Checkpoint) -> Result<()> {
        let schematic = JsonDesignStore::from_json(&checkpoint.state)
            .with_context(|| format!("Failed to restore checkpoint {}", checkpoint.id))?;
        JsonDesignStore.save(&self.design_path, &schematic)?;
        info!("restored checkpoint {} ({})", checkpoint.id, checkpoint.action);
        Ok(())
    }

    /// Restore the previous checkpoint.
    pub fn undo(&self) -> Result<Checkpoint> {
        let checkpoint = self.history.undo()?.ok_or_else(|| anyhow!("Nothing to undo"))?;
        self.restore(&checkpoint)?;
        Ok(checkpoint)
    }

    /// Restore the next checkpoint.
    pub fn redo(&self) -> Result<Checkpoint> {
        let checkpoint = self.history.redo()?.ok_or_else(|| anyhow!("Nothing to redo"))?;
        self.restore(&checkpoint)?;
        Ok(checkpoint)
    }
}
