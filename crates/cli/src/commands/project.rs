use std::fs;

use anyhow::{anyhow, Context, Result};
use netlist_core::db::{save_project_config, ProjectConfig, ProjectContext, ProjectLayout};
use netlist_core::library::PrimitiveLibrary;
use netlist_core::report::{render_text, summarize, BlockSummary};
use serde::Serialize;

use crate::commands::{open_context, print_path_status};
use crate::{canonicalize_or_current, infer_project_name};

#[derive(Serialize)]
pub struct ProjectInfoSnapshot {
    pub name: String,
    pub root: String,
    pub config_file: String,
    pub config_version: String,
    pub core_version: String,
    pub design_path: String,
    pub history_path: String,
    pub history_enabled: bool,
    pub primitives: Option<String>,
    pub blocks: usize,
    pub checkpoints: usize,
}

/// Initialize a new project at `root` and record its first checkpoint.
pub fn init_project_command(
    root: &str,
    name: Option<String>,
    primitives: Option<String>,
    no_history: bool,
) -> Result<()> {
    let root_path = canonicalize_or_current(root)?;
    let layout = ProjectLayout::new(&root_path);

    if layout.project_config_path.exists() {
        return Err(anyhow!("Project already initialized at {}", layout.root.display()));
    }

    // Derive project name if not provided.
    let project_name = match name {
        Some(n) => n,
        None => infer_project_name(&root_path),
    };

    fs::create_dir_all(&layout.meta_dir)
        .with_context(|| format!("Failed to create meta dir: {}", layout.meta_dir.display()))?;

    if let Some(path) = &primitives {
        // Fail before writing config when the library is unusable.
        PrimitiveLibrary::load(&layout.resolve(path))?;
    }

    let mut config = ProjectConfig::new(
        &project_name,
        layout.relative_string(&layout.design_path),
        layout.relative_string(&layout.history_path),
    );
    config.primitives = primitives;
    config.history.enabled = !no_history;
    save_project_config(&layout, &config)?;

    let mut ctx = ProjectContext::from_root(&root_path)?;
    let schematic = ctx.empty_schematic()?;
    ctx.commit(&schematic, "Initialize project")?;

    println!("Initialized netlist project:");
    println!("  Name: {}", project_name);
    println!("  Root: {}", layout.root.display());
    println!("  Config: {}", layout.project_config_path.display());
    println!("  Design (relative): {}", config.design.path);
    println!("  History (relative): {}", config.history.path);
    println!("  Primitives: {}", schematic.project().blocks().len());

    Ok(())
}

/// Show basic information about an existing project.
pub fn project_info_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let schematic = ctx.load_schematic()?;
    let checkpoints = ctx.history.list().context("Failed to list checkpoints")?;

    if json {
        let snapshot = ProjectInfoSnapshot {
            name: ctx.config.name.clone(),
            root: ctx.layout.root.display().to_string(),
            config_file: ctx.layout.project_config_path.display().to_string(),
            config_version: ctx.config.config_version.clone(),
            core_version: netlist_core::version().to_string(),
            design_path: ctx.config.design.path.clone(),
            history_path: ctx.config.history.path.clone(),
            history_enabled: ctx.config.history.enabled,
            primitives: ctx.config.primitives.clone(),
            blocks: schematic.project().blocks().len(),
            checkpoints: checkpoints.len(),
        };
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    println!("Netlist Project Info");
    println!("====================");
    println!("Name: {}", ctx.config.name);
    println!("Root: {}", ctx.layout.root.display());
    println!("Config file: {}", ctx.layout.project_config_path.display());
    println!("Config version: {}", ctx.config.config_version);
    println!("Core version: {}", netlist_core::version());
    println!("History enabled: {}", ctx.config.history.enabled);
    if let Some(p) = &ctx.config.primitives {
        println!("Primitive library: {}", p);
    }
    println!("Blocks: {}", schematic.project().blocks().len());
    println!("Checkpoints: {}", checkpoints.len());
    println!();
    println!("Files:");
    print_path_status("Meta dir (.netlist)", &ctx.layout.meta_dir);
    print_path_status("Design", &ctx.design_path);
    print_path_status("History", &ctx.history_path);

    Ok(())
}

/// Print the design, or a single block of it.
pub fn show_command(root: &str, block: Option<&str>, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let schematic = ctx.load_schematic()?;
    let mut blocks: Vec<BlockSummary> = summarize(&schematic);
    if let Some(name) = block {
        blocks.retain(|b| b.name == name);
        if blocks.is_empty() {
            return Err(anyhow!("Block '{}' not found", name));
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&blocks)?);
    } else {
        print!("{}", render_text(&blocks));
    }
    Ok(())
}
