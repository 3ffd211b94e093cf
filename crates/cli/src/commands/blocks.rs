use anyhow::{anyhow, Result};

use crate::commands::edit;

/// Split a comma-separated pin list, dropping blanks.
pub fn split_pins(raw: &str) -> Vec<String> {
    raw.split(',').map(str::trim).filter(|p| !p.is_empty()).map(str::to_string).collect()
}

pub fn add_block_command(root: &str, name: &str) -> Result<()> {
    edit(root, &format!("Add block {name}"), |s| s.add_block(name))?;
    println!("Added block '{}'", name);
    Ok(())
}

pub fn add_primitive_command(root: &str, name: &str, pins: &str) -> Result<()> {
    let pins = split_pins(pins);
    if pins.is_empty() {
        return Err(anyhow!("A primitive needs at least one pin"));
    }
    edit(root, &format!("Add primitive {name}"), |s| s.add_primitive_block(name, pins.as_slice()))?;
    println!("Added primitive '{}' with pins [{}]", name, pins.join(", "));
    Ok(())
}

pub fn remove_block_command(root: &str, name: &str) -> Result<()> {
    edit(root, &format!("Remove block {name}"), |s| s.remove_block(name))?;
    println!("Removed block '{}'", name);
    Ok(())
}

pub fn rename_block_command(root: &str, old: &str, new: &str) -> Result<()> {
    edit(root, &format!("Rename block {old} to {new}"), |s| s.rename_block(old, new))?;
    println!("Renamed block '{}' to '{}'", old, new);
    Ok(())
}

pub fn copy_block_command(root: &str, src: &str, new_name: &str) -> Result<()> {
    edit(root, &format!("Copy block {src} to {new_name}"), |s| s.copy_block(src, new_name))?;
    println!("Copied block '{}' to '{}'", src, new_name);
    Ok(())
}

pub fn add_pin_command(root: &str, block: &str, pin: &str) -> Result<()> {
    edit(root, &format!("Add pin {pin} to {block}"), |s| s.add_pin(block, pin))?;
    println!("Added pin '{}' to '{}'", pin, block);
    Ok(())
}

pub fn remove_pin_command(root: &str, block: &str, pin: &str) -> Result<()> {
    edit(root, &format!("Remove pin {pin} from {block}"), |s| s.remove_pin(block, pin))?;
    println!("Removed pin '{}' from '{}'", pin, block);
    Ok(())
}

pub fn rename_pin_command(root: &str, block: &str, old: &str, new: &str) -> Result<()> {
    edit(root, &format!("Rename pin {old} to {new} in {block}"), |s| s.rename_pin(block, old, new))?;
    println!("Renamed pin '{}' to '{}' in '{}'", old, new, block);
    Ok(())
}

pub fn add_instance_command(root: &str, parent: &str, name: &str, type_name: &str) -> Result<()> {
    edit(root, &format!("Add instance {name} of {type_name} to {parent}"), |s| {
        s.add_instance(parent, name, type_name)
    })?;
    println!("Added instance '{}' ({}) to '{}'", name, type_name, parent);
    Ok(())
}

pub fn remove_instance_command(root: &str, parent: &str, name: &str) -> Result<()> {
    edit(root, &format!("Remove instance {name} from {parent}"), |s| s.remove_instance(parent, name))?;
    println!("Removed instance '{}' from '{}'", name, parent);
    Ok(())
}

pub fn rename_instance_command(root: &str, parent: &str, old: &str, new: &str) -> Result<()> {
    edit(root, &format!("Rename instance {old} to {new} in {parent}"), |s| {
        s.rename_instance(parent, old, new)
    })?;
    println!("Renamed instance '{}' to '{}' in '{}'", old, new, parent);
    Ok(())
}

pub fn copy_instance_command(root: &str, parent: &str, src: &str, new_name: &str) -> Result<()> {
    edit(root, &format!("Copy instance {src} to {new_name} in {parent}"), |s| {
        s.copy_instance(parent, src, new_name)
    })?;
    println!("Copied instance '{}' to '{}' in '{}'", src, new_name, parent);
    Ok(())
}
