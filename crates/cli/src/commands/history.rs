use anyhow::{Context, Result};
use netlist_core::db::Checkpoint;
use serde::Serialize;

use crate::commands::open_context;

#[derive(Serialize)]
struct HistoryEntry<'a> {
    id: i64,
    action: &'a str,
    created_at: &'a str,
    current: bool,
}

pub fn undo_command(root: &str) -> Result<()> {
    let ctx = open_context(root)?;
    let checkpoint = ctx.undo()?;
    println!("Undo: restored checkpoint {} ({})", checkpoint.id, checkpoint.action);
    Ok(())
}

pub fn redo_command(root: &str) -> Result<()> {
    let ctx = open_context(root)?;
    let checkpoint = ctx.redo()?;
    println!("Redo: restored checkpoint {} ({})", checkpoint.id, checkpoint.action);
    Ok(())
}

/// List checkpoints oldest first, marking the current one.
pub fn history_command(root: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let checkpoints: Vec<Checkpoint> = ctx.history.list().context("Failed to list checkpoints")?;
    let current = ctx.history.current_id().context("Failed to read history cursor")?;

    if json {
        let entries: Vec<HistoryEntry<'_>> = checkpoints
            .iter()
            .map(|c| HistoryEntry {
                id: c.id,
                action: &c.action,
                created_at: &c.created_at,
                current: Some(c.id) == current,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if checkpoints.is_empty() {
        println!("No checkpoints recorded.");
        return Ok(());
    }
    for c in &checkpoints {
        let marker = if Some(c.id) == current { "*" } else { " " };
        println!("{} {:>4}  {}  {}", marker, c.id, c.created_at, c.action);
    }
    Ok(())
}
