use anyhow::{anyhow, Result};
use netlist_core::model::PinPath;

use crate::commands::{edit, open_context};

fn parse_pin(raw: &str) -> Result<PinPath> {
    raw.parse().map_err(|e: String| anyhow!(e))
}

/// Add a net, optionally connecting `pins` to it in one step.
pub fn add_net_command(root: &str, block: &str, net: &str, pins: &[String]) -> Result<()> {
    let paths = pins.iter().map(|p| parse_pin(p)).collect::<Result<Vec<_>>>()?;
    if paths.is_empty() {
        edit(root, &format!("Add net {net} to {block}"), |s| s.add_net(block, net))?;
        println!("Added net '{}' to '{}'", net, block);
    } else {
        edit(root, &format!("Add net {net} to {block}"), |s| s.create_net_with_pins(block, net, &paths))?;
        println!("Added net '{}' to '{}' with {} pin(s)", net, block, paths.len());
    }
    Ok(())
}

pub fn remove_net_command(root: &str, block: &str, net: &str) -> Result<()> {
    edit(root, &format!("Remove net {net} from {block}"), |s| s.remove_net(block, net))?;
    println!("Removed net '{}' from '{}'", net, block);
    Ok(())
}

pub fn rename_net_command(root: &str, block: &str, old: &str, new: &str) -> Result<()> {
    edit(root, &format!("Rename net {old} to {new} in {block}"), |s| s.rename_net(block, old, new))?;
    println!("Renamed net '{}' to '{}' in '{}'", old, new, block);
    Ok(())
}

pub fn connect_command(root: &str, block: &str, net: &str, pin: &str) -> Result<()> {
    let path = parse_pin(pin)?;
    edit(root, &format!("Connect {path} to {net} in {block}"), |s| s.connect_pin(block, net, &path))?;
    println!("Connected '{}' to net '{}' in '{}'", path, net, block);
    Ok(())
}

pub fn disconnect_command(root: &str, block: &str, net: &str, pin: &str) -> Result<()> {
    let path = parse_pin(pin)?;
    edit(root, &format!("Disconnect {path} from {net} in {block}"), |s| s.disconnect_pin(block, net, &path))?;
    println!("Disconnected '{}' from net '{}' in '{}'", path, net, block);
    Ok(())
}

/// List the members of one net.
pub fn net_members_command(root: &str, block: &str, net: &str, json: bool) -> Result<()> {
    let ctx = open_context(root)?;
    let schematic = ctx.load_schematic()?;
    let members = schematic.project().net_members(block, net)?;
    if json {
        let rendered: Vec<String> = members.iter().map(ToString::to_string).collect();
        println!("{}", serde_json::to_string_pretty(&rendered)?);
        return Ok(());
    }
    if members.is_empty() {
        println!("Net '{}' in '{}' has no members.", net, block);
    }
    for member in members {
        println!("{}", member);
    }
    Ok(())
}
