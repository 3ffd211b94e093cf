use anyhow::Result;
use clap::{Parser, Subcommand};
use netlist_edit::commands::*;
use netlist_edit::init_logging;

/// Hierarchical netlist editor.
///
/// This CLI is a thin wrapper around `netlist-core` (exposed in code as
/// `netlist_core`). Every edit loads the design, applies one operation, saves
/// it, and records an undo checkpoint.
#[derive(Parser, Debug)]
#[command(name = "netlist-edit", version, about = "Hierarchical netlist editor", long_about = None)]
struct Cli {
    /// Log debug output to stderr (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Initialize a new netlist project at the given root.
    ///
    /// This will:
    /// - Create a `.netlist` metadata directory.
    /// - Write a `.netlist/project.json` config file.
    /// - Write `design.json` seeded with the primitive library.
    InitProject {
        /// Project root directory. Defaults to the current working directory.
        #[arg(long, default_value = ".")]
        root: String,

        /// Optional project name. If omitted, the name is derived from the root directory.
        #[arg(long)]
        name: Option<String>,

        /// Primitive library file (JSON or YAML), relative to the root.
        #[arg(long)]
        primitives: Option<String>,

        /// Do not record undo checkpoints.
        #[arg(long)]
        no_history: bool,
    },

    /// Show basic information about an existing project.
    ProjectInfo {
        #[arg(long, default_value = ".")]
        root: String,

        /// Emit JSON instead of human-readable text.
        #[arg(long)]
        json: bool,
    },

    /// Print blocks, instances, pins, nets and wires.
    Show {
        #[arg(long, default_value = ".")]
        root: String,

        /// Only show this block.
        #[arg(long)]
        block: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Add an empty user block.
    AddBlock {
        #[arg(long, default_value = ".")]
        root: String,
        name: String,
    },

    /// Add a primitive block with a fixed pin list.
    AddPrimitive {
        #[arg(long, default_value = ".")]
        root: String,
        name: String,

        /// Comma-separated pin names, e.g. `a,b,c`.
        #[arg(long)]
        pins: String,
    },

    /// Remove a block and every instance of it.
    RemoveBlock {
        #[arg(long, default_value = ".")]
        root: String,
        name: String,
    },

    RenameBlock {
        #[arg(long, default_value = ".")]
        root: String,
        old: String,
        new: String,
    },

    /// Duplicate a block under a new name.
    CopyBlock {
        #[arg(long, default_value = ".")]
        root: String,
        src: String,
        new_name: String,
    },

    /// Add a pin to a block; every instance of it gains the pin.
    AddPin {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        pin: String,
    },

    RemovePin {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        pin: String,
    },

    RenamePin {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        old: String,
        new: String,
    },

    /// Place an instance of `type_name` inside `parent`.
    AddInstance {
        #[arg(long, default_value = ".")]
        root: String,
        parent: String,
        name: String,
        type_name: String,
    },

    RemoveInstance {
        #[arg(long, default_value = ".")]
        root: String,
        parent: String,
        name: String,
    },

    RenameInstance {
        #[arg(long, default_value = ".")]
        root: String,
        parent: String,
        old: String,
        new: String,
    },

    CopyInstance {
        #[arg(long, default_value = ".")]
        root: String,
        parent: String,
        src: String,
        new_name: String,
    },

    /// Add a net, optionally connecting pins (`pin` or `inst.pin`) to it.
    AddNet {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        net: String,

        /// Pins to connect; all or none are connected.
        #[arg(long = "pin")]
        pins: Vec<String>,
    },

    RemoveNet {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        net: String,
    },

    RenameNet {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        old: String,
        new: String,
    },

    /// List the pins connected to a net.
    NetMembers {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        net: String,

        #[arg(long)]
        json: bool,
    },

    /// Connect a pin (`pin` or `inst.pin`) to a net.
    Connect {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        net: String,
        pin: String,
    },

    Disconnect {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        net: String,
        pin: String,
    },

    /// Draw a wire. Ends are `pin`, `inst.pin`, or `jN` for junction N.
    Wire {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        from: String,
        to: String,

        /// Name for the net created by a pin-to-pin wire.
        #[arg(long)]
        name: Option<String>,
    },

    /// Place a junction on a wire.
    AddJunction {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        wire: u32,
    },

    /// Delete a junction; one with branches deletes its whole net.
    DeleteJunction {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        junction: String,
    },

    /// Delete a wire together with its net and every connected wire.
    DeleteWire {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        wire: u32,
    },

    /// Rename the net carried by a wire.
    RenameWire {
        #[arg(long, default_value = ".")]
        root: String,
        block: String,
        wire: u32,
        new: String,
    },

    /// Restore the previous checkpoint.
    Undo {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// Restore the next checkpoint after an undo.
    Redo {
        #[arg(long, default_value = ".")]
        root: String,
    },

    /// List recorded checkpoints.
    History {
        #[arg(long, default_value = ".")]
        root: String,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::InitProject { root, name, primitives, no_history } => {
            init_project_command(&root, name, primitives, no_history)?
        }
        Command::ProjectInfo { root, json } => project_info_command(&root, json)?,
        Command::Show { root, block, json } => show_command(&root, block.as_deref(), json)?,
        Command::AddBlock { root, name } => add_block_command(&root, &name)?,
        Command::AddPrimitive { root, name, pins } => add_primitive_command(&root, &name, &pins)?,
        Command::RemoveBlock { root, name } => remove_block_command(&root, &name)?,
        Command::RenameBlock { root, old, new } => rename_block_command(&root, &old, &new)?,
        Command::CopyBlock { root, src, new_name } => copy_block_command(&root, &src, &new_name)?,
        Command::AddPin { root, block, pin } => add_pin_command(&root, &block, &pin)?,
        Command::RemovePin { root, block, pin } => remove_pin_command(&root, &block, &pin)?,
        Command::RenamePin { root, block, old, new } => rename_pin_command(&root, &block, &old, &new)?,
        Command::AddInstance { root, parent, name, type_name } => {
            add_instance_command(&root, &parent, &name, &type_name)?
        }
        Command::RemoveInstance { root, parent, name } => remove_instance_command(&root, &parent, &name)?,
        Command::RenameInstance { root, parent, old, new } => {
            rename_instance_command(&root, &parent, &old, &new)?
        }
        Command::CopyInstance { root, parent, src, new_name } => {
            copy_instance_command(&root, &parent, &src, &new_name)?
        }
        Command::AddNet { root, block, net, pins } => add_net_command(&root, &block, &net, &pins)?,
        Command::RemoveNet { root, block, net } => remove_net_command(&root, &block, &net)?,
        Command::RenameNet { root, block, old, new } => rename_net_command(&root, &block, &old, &new)?,
        Command::NetMembers { root, block, net, json } => net_members_command(&root, &block, &net, json)?,
        Command::Connect { root, block, net, pin } => connect_command(&root, &block, &net, &pin)?,
        Command::Disconnect { root, block, net, pin } => disconnect_command(&root, &block, &net, &pin)?,
        Command::Wire { root, block, from, to, name } => {
            wire_command(&root, &block, &from, &to, name.as_deref())?
        }
        Command::AddJunction { root, block, wire } => add_junction_command(&root, &block, wire)?,
        Command::DeleteJunction { root, block, junction } => {
            delete_junction_command(&root, &block, &junction)?
        }
        Command::DeleteWire { root, block, wire } => delete_wire_command(&root, &block, wire)?,
        Command::RenameWire { root, block, wire, new } => rename_wire_command(&root, &block, wire, &new)?,
        Command::Undo { root } => undo_command(&root)?,
        Command::Redo { root } => redo_command(&root)?,
        Command::History { root, json } => history_command(&root, json)?,
    }

    Ok(())
}
