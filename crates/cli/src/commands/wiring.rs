use anyhow::Result;
use netlist_core::Anchor;

use crate::commands::{edit, parse_junction, parse_wire_end, segment};

/// Draw a wire between two ends (`pin`, `inst.pin` or `jN`) of one block.
pub fn wire_command(root: &str, block: &str, from: &str, to: &str, name: Option<&str>) -> Result<()> {
    let start = Anchor { block: block.to_string(), end: parse_wire_end(from)? };
    let end = Anchor { block: block.to_string(), end: parse_wire_end(to)? };
    let wired = edit(root, &format!("Wire {from} to {to} in {block}"), |s| s.finish_wire(&start, &end, name))?;
    println!("Added wire {} on net '{}'", wired.segment, wired.net_name);
    if let Some(merged) = wired.merged {
        println!("Merged net '{}' into '{}'", merged, wired.net_name);
    }
    Ok(())
}

pub fn add_junction_command(root: &str, block: &str, wire: u32) -> Result<()> {
    let id = edit(root, &format!("Add junction on wire {wire} in {block}"), |s| s.add_junction(block, segment(wire)))?;
    println!("Added junction j{} on wire {}", id, wire);
    Ok(())
}

pub fn delete_junction_command(root: &str, block: &str, junction: &str) -> Result<()> {
    let id = parse_junction(junction)?;
    let removed = edit(root, &format!("Delete junction j{id} in {block}"), |s| s.delete_junction(block, id))?;
    println!("Deleted junction j{}", id);
    if let Some(net) = removed {
        println!("Deleted net '{}'", net);
    }
    Ok(())
}

/// Delete the wire's whole net: every connected segment and junction.
pub fn delete_wire_command(root: &str, block: &str, wire: u32) -> Result<()> {
    let removed = edit(root, &format!("Delete wire {wire} in {block}"), |s| s.delete_net_at(block, segment(wire)))?;
    match removed {
        Some(net) => println!("Deleted wire {} and net '{}'", wire, net),
        None => println!("Deleted wire {}", wire),
    }
    Ok(())
}

pub fn rename_wire_command(root: &str, block: &str, wire: u32, new: &str) -> Result<()> {
    edit(root, &format!("Rename net on wire {wire} to {new} in {block}"), |s| {
        s.rename_net_at(block, segment(wire), new)
    })?;
    println!("Renamed net on wire {} to '{}'", wire, new);
    Ok(())
}
