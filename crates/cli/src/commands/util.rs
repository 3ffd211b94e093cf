use std::path::Path;

use anyhow::{anyhow, Context, Result};
use netlist_core::db::ProjectContext;
use netlist_core::model::{JunctionId, RawId, SegmentId};
use netlist_core::{NetlistResult, Schematic, WireEnd};

use crate::canonicalize_or_current;

/// Open the project rooted at `root`.
pub fn open_context(root: &str) -> Result<ProjectContext> {
    let root_path = canonicalize_or_current(root)?;
    ProjectContext::from_root(&root_path)
}

/// Load the design, apply one edit, then save and checkpoint it as `action`.
///
/// A failing edit leaves the design file and history untouched.
pub fn edit<T>(
    root: &str,
    action: &str,
    apply: impl FnOnce(&mut Schematic) -> NetlistResult<T>,
) -> Result<T> {
    let mut ctx = open_context(root)?;
    let mut schematic = ctx.load_schematic()?;
    let out = apply(&mut schematic)?;
    ctx.commit(&schematic, action).with_context(|| format!("Failed to save '{action}'"))?;
    Ok(out)
}

/// Helper to print whether a path exists.
pub fn print_path_status(label: &str, path: &Path) {
    let exists = path.exists();
    println!("- {label}: {} ({})", if exists { "OK" } else { "MISSING" }, path.display());
}

/// Parse a wire end: `jN` names junction N, anything else is a pin path.
pub fn parse_wire_end(raw: &str) -> Result<WireEnd> {
    let raw = raw.trim();
    if let Some(id) = raw.strip_prefix('j').and_then(|rest| rest.parse::<u32>().ok()) {
        return Ok(WireEnd::Junction(JunctionId::from_raw(id)));
    }
    raw.parse().map(WireEnd::Pin).map_err(|e: String| anyhow!(e))
}

/// Parse a junction id written as `jN` or `N`.
pub fn parse_junction(raw: &str) -> Result<JunctionId> {
    let digits = raw.trim().trim_start_matches('j');
    digits
        .parse::<u32>()
        .map(JunctionId::from_raw)
        .map_err(|_| anyhow!("Invalid junction id '{raw}': expected 'jN' or 'N'"))
}

pub fn segment(id: u32) -> SegmentId {
    SegmentId::from_raw(id)
}
