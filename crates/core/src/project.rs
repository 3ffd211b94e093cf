//! Project-wide registry of Blocks and the orchestration layer for every
//! structural edit.
//!
//! Each mutation is expressed here and fans out to the owning Block plus the
//! reverse instance index (type → live instances), which is how a pin added to
//! a Block reaches every instance of it regardless of where that instance lives.

use std::collections::{HashMap, HashSet};

use log::{debug, info};

use crate::error::{NetlistError, NetlistResult, ObjectKind};
use crate::library::PrimitiveLibrary;
use crate::model::{
    check_name, Block, BlockId, Instance, InstanceId, Named, NetId, PinId, PinPath, Registry, Terminal,
};

/// Address of one live instance anywhere in the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceKey {
    pub parent: BlockId,
    pub instance: InstanceId,
}

/// Id mapping produced when a Block is copied.
#[derive(Debug, Clone, Default)]
pub(crate) struct BlockCopy {
    pub terminals: HashMap<Terminal, Terminal>,
    pub nets: HashMap<NetId, NetId>,
}

/// Prefix used for generated net names (`net_1`, `net_2`, ...).
pub const NET_NAME_PREFIX: &str = "net_";

#[derive(Debug, Clone)]
pub struct NetlistProject {
    name: String,
    blocks: Registry<BlockId, Block>,
    instances_of: HashMap<BlockId, Vec<InstanceKey>>,
}

impl NetlistProject {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), blocks: Registry::new(), instances_of: HashMap::new() }
    }

    /// Create a project seeded with every primitive of `library`.
    pub fn with_primitives(
        name: impl Into<String>,
        library: &PrimitiveLibrary,
    ) -> NetlistResult<Self> {
        let mut project = Self::new(name);
        for spec in &library.primitives {
            project.add_primitive_block(&spec.name, spec.pins.as_slice())?;
        }
        Ok(project)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn scope(&self) -> String {
        format!("project '{}'", self.name)
    }

    // ---- read API -------------------------------------------------------

    pub fn blocks(&self) -> &Registry<BlockId, Block> {
        &self.blocks
    }

    pub fn block(&self, name: &str) -> Option<&Block> {
        self.blocks.by_name(name)
    }

    pub fn block_by_id(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn block_id(&self, name: &str) -> NetlistResult<BlockId> {
        self.blocks.id_of(name).ok_or_else(|| NetlistError::not_found(ObjectKind::Block, name, self.scope()))
    }

    pub(crate) fn require(&self, id: BlockId) -> NetlistResult<&Block> {
        self.blocks
            .get(id)
            .ok_or_else(|| NetlistError::not_found(ObjectKind::Block, &id.to_string(), self.scope()))
    }

    pub(crate) fn require_mut(&mut self, id: BlockId) -> NetlistResult<&mut Block> {
        let scope = self.scope();
        self.blocks
            .get_mut(id)
            .ok_or_else(|| NetlistError::not_found(ObjectKind::Block, &id.to_string(), scope))
    }

    /// Live instances of `block_id`, wherever they are placed.
    pub fn instance_keys_of(&self, block_id: BlockId) -> &[InstanceKey] {
        self.instances_of.get(&block_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Live instances of the named block as `(parent block, instance)` name pairs.
    pub fn instances_of(&self, type_name: &str) -> NetlistResult<Vec<(String, String)>> {
        let type_id = self.block_id(type_name)?;
        Ok(self
            .instance_keys_of(type_id)
            .iter()
            .filter_map(|key| {
                let parent = self.blocks.get(key.parent)?;
                let inst = parent.instances().get(key.instance)?;
                Some((parent.name().to_string(), inst.name().to_string()))
            })
            .collect())
    }

    pub fn instance(&self, parent: &str, name: &str) -> NetlistResult<&Instance> {
        let block = self.require(self.block_id(parent)?)?;
        block
            .instance(name)
            .ok_or_else(|| NetlistError::not_found(ObjectKind::Instance, name, block.scope()))
    }

    /// Name of the Block an instance is typed by.
    pub fn type_name(&self, instance: &Instance) -> &str {
        self.blocks.get(instance.type_id()).map(|b| b.name()).unwrap_or("?")
    }

    /// Members of a net as pin paths, in connection order.
    pub fn net_members(&self, block: &str, net: &str) -> NetlistResult<Vec<PinPath>> {
        let block_id = self.block_id(block)?;
        let b = self.require(block_id)?;
        let n = b.net(net).ok_or_else(|| NetlistError::not_found(ObjectKind::Net, net, b.scope()))?;
        Ok(n.members().iter().filter_map(|t| self.terminal_path(block_id, *t)).collect())
    }

    /// Name-based address of a terminal, if it still exists.
    pub fn terminal_path(&self, block_id: BlockId, terminal: Terminal) -> Option<PinPath> {
        let block = self.blocks.get(block_id)?;
        match terminal {
            Terminal::Port(pin) => Some(PinPath::port(block.pins().get(pin)?.name())),
            Terminal::Instance { instance, pin } => {
                let inst = block.instances().get(instance)?;
                let ty = self.blocks.get(inst.type_id())?;
                Some(PinPath::instance(inst.name(), ty.pins().get(pin)?.name()))
            }
        }
    }

    /// Resolve a pin path inside a block to its terminal.
    pub fn resolve(&self, block_id: BlockId, path: &PinPath) -> NetlistResult<Terminal> {
        let block = self.require(block_id)?;
        let missing_pin = |scope: String| NetlistError::not_found(ObjectKind::Pin, &path.to_string(), scope);
        match &path.instance {
            None => block.pins().id_of(&path.pin).map(Terminal::Port).ok_or_else(|| missing_pin(block.scope())),
            Some(instance_name) => {
                let instance = block.instance_id(instance_name)?;
                let inst = block.instances().get(instance).ok_or_else(|| missing_pin(block.scope()))?;
                let ty = self.require(inst.type_id())?;
                let pin = ty.pins().id_of(&path.pin).ok_or_else(|| missing_pin(block.scope()))?;
                if inst.pin(pin).is_none() {
                    return Err(missing_pin(block.scope()));
                }
                Ok(Terminal::Instance { instance, pin })
            }
        }
    }

    /// Human-readable label for a terminal, used in error messages.
    pub(crate) fn terminal_label(&self, block_id: BlockId, terminal: Terminal) -> String {
        self.terminal_path(block_id, terminal)
            .map(|p| p.to_string())
            .unwrap_or_else(|| format!("{terminal:?}"))
    }

    pub(crate) fn net_name(&self, block_id: BlockId, net: NetId) -> String {
        self.blocks
            .get(block_id)
            .and_then(|b| b.nets().get(net))
            .map(|n| n.name().to_string())
            .unwrap_or_else(|| format!("#{net}"))
    }

    /// First free generated net name (`net_1`, `net_2`, ...) within a block.
    pub fn next_net_name(&self, block_id: BlockId) -> String {
        let Some(block) = self.blocks.get(block_id) else {
            return format!("{NET_NAME_PREFIX}1");
        };
        (1..)
            .map(|idx| format!("{NET_NAME_PREFIX}{idx}"))
            .find(|candidate| !block.nets().contains_name(candidate))
            .unwrap_or_default()
    }

    // ---- blocks ---------------------------------------------------------

    pub fn add_block(&mut self, name: &str) -> NetlistResult<BlockId> {
        check_name(ObjectKind::Block, name)?;
        if self.blocks.contains_name(name) {
            return Err(NetlistError::duplicate(ObjectKind::Block, name, self.scope()));
        }
        let id = self.blocks.insert_with(|id| Block::new(id, name.to_string()));
        self.instances_of.entry(id).or_default();
        info!("added block '{}'", name);
        Ok(id)
    }

    pub fn add_primitive_block<S: AsRef<str>>(
        &mut self,
        name: &str,
        pins: &[S],
    ) -> NetlistResult<BlockId> {
        check_name(ObjectKind::Block, name)?;
        if self.blocks.contains_name(name) {
            return Err(NetlistError::duplicate(ObjectKind::Block, name, self.scope()));
        }
        let id = self.blocks.try_insert_with(|id| Block::primitive(id, name.to_string(), pins))?;
        self.instances_of.entry(id).or_default();
        info!("added primitive block '{}' ({} pins)", name, pins.len());
        Ok(id)
    }

    /// Remove a block together with every live instance of it.
    ///
    /// Returns the instances that were removed from other blocks.
    pub fn remove_block(&mut self, name: &str) -> NetlistResult<Vec<(InstanceKey, Instance)>> {
        let id = self.block_id(name)?;

        let mut removed = Vec::new();
        for key in self.instance_keys_of(id).to_vec() {
            if key.parent == id {
                continue;
            }
            let inst_name = match self.blocks.get(key.parent).and_then(|p| p.instances().get(key.instance)) {
                Some(inst) => inst.name().to_string(),
                None => continue,
            };
            let instance = self.require_mut(key.parent)?.remove_instance(&inst_name)?;
            removed.push((key, instance));
        }

        let block = self.blocks.remove(id).ok_or_else(|| NetlistError::not_found(ObjectKind::Block, name, self.scope()))?;
        for (instance_id, inst) in block.instances().iter() {
            if let Some(bucket) = self.instances_of.get_mut(&inst.type_id()) {
                bucket.retain(|k| !(k.parent == id && k.instance == instance_id));
            }
        }
        self.instances_of.remove(&id);
        info!("removed block '{}' and {} instance(s) of it", name, removed.len());
        Ok(removed)
    }

    /// Rename a block. Ids are stable, so the reverse index needs no update.
    pub fn rename_block(&mut self, old: &str, new: &str) -> NetlistResult<()> {
        let id = self.block_id(old)?;
        check_name(ObjectKind::Block, new)?;
        if !self.blocks.rename(id, new) {
            return Err(NetlistError::duplicate(ObjectKind::Block, new, self.scope()));
        }
        info!("renamed block '{}' -> '{}'", old, new);
        Ok(())
    }

    /// Copy a block under a new name.
    ///
    /// Composite blocks are copied with their pins, instances, and nets
    /// (memberships included); primitive blocks with their fixed pin set.
    pub fn copy_block(&mut self, src: &str, new_name: &str) -> NetlistResult<BlockId> {
        self.copy_block_mapped(src, new_name).map(|(id, _)| id)
    }

    pub(crate) fn copy_block_mapped(
        &mut self,
        src: &str,
        new_name: &str,
    ) -> NetlistResult<(BlockId, BlockCopy)> {
        let src_id = self.block_id(src)?;
        let source = self.require(src_id)?.clone();
        if self.blocks.contains_name(new_name) {
            return Err(NetlistError::duplicate(ObjectKind::Block, new_name, self.scope()));
        }

        if source.is_primitive() {
            let pins: Vec<String> = source.pins().values().map(|p| p.name().to_string()).collect();
            let id = self.add_primitive_block(new_name, pins.as_slice())?;
            return Ok((id, BlockCopy::default()));
        }

        let id = self.add_block(new_name)?;
        let mut copy = BlockCopy::default();

        for (pin_id, pin) in source.pins().iter() {
            let new_pin = self.require_mut(id)?.add_interface_pin(pin.name())?;
            copy.terminals.insert(Terminal::Port(pin_id), Terminal::Port(new_pin));
        }

        for (inst_id, inst) in source.instances().iter() {
            let type_pins = self.require(inst.type_id())?.pin_ids();
            let new_inst = self.require_mut(id)?.add_instance(inst.name(), inst.type_id(), &type_pins)?;
            self.instances_of
                .entry(inst.type_id())
                .or_default()
                .push(InstanceKey { parent: id, instance: new_inst });
            for pin_ref in inst.pins() {
                copy.terminals.insert(
                    Terminal::Instance { instance: inst_id, pin: pin_ref.pin() },
                    Terminal::Instance { instance: new_inst, pin: pin_ref.pin() },
                );
            }
        }

        for (net_id, net) in source.nets().iter() {
            let target = self.require_mut(id)?;
            let new_net = target.add_net(net.name())?;
            for member in net.members() {
                if let Some(mapped) = copy.terminals.get(member) {
                    target.connect(new_net, *mapped)?;
                }
            }
            copy.nets.insert(net_id, new_net);
        }

        info!("copied block '{}' to '{}'", src, new_name);
        Ok((id, copy))
    }

    // ---- pins -----------------------------------------------------------

    /// Add an interface pin, then give every instance of the block a fresh,
    /// unconnected ref for it.
    pub fn add_pin_to_block(&mut self, block: &str, pin: &str) -> NetlistResult<PinId> {
        let block_id = self.block_id(block)?;
        let pin_id = self.require_mut(block_id)?.add_interface_pin(pin)?;
        self.reconcile_instances(block_id)?;
        Ok(pin_id)
    }

    /// Remove an interface pin, then drop the matching ref from every instance
    /// of the block (disconnecting it from its net in the instance's parent).
    pub fn remove_pin_from_block(&mut self, block: &str, pin: &str) -> NetlistResult<PinId> {
        let block_id = self.block_id(block)?;
        let pin_id = self.require_mut(block_id)?.remove_interface_pin(pin)?;
        self.reconcile_instances(block_id)?;
        Ok(pin_id)
    }

    pub fn rename_pin_in_block(&mut self, block: &str, old: &str, new: &str) -> NetlistResult<()> {
        let block_id = self.block_id(block)?;
        self.require_mut(block_id)?.rename_interface_pin(old, new)
    }

    fn reconcile_instances(&mut self, type_id: BlockId) -> NetlistResult<()> {
        let type_pins = self.require(type_id)?.pin_ids();
        for key in self.instance_keys_of(type_id).to_vec() {
            if let Some(update) = self.require_mut(key.parent)?.reconcile_instance(key.instance, &type_pins) {
                if !update.is_empty() {
                    debug!(
                        "reconciled instance {:?}: +{} / -{} pin(s)",
                        key,
                        update.added.len(),
                        update.dropped.len()
                    );
                }
            }
        }
        Ok(())
    }

    // ---- instances ------------------------------------------------------

    /// Whether `from` contains an instance of `target`, directly or transitively.
    pub fn instantiates(&self, from: BlockId, target: BlockId) -> bool {
        let mut stack = vec![from];
        let mut seen = HashSet::new();
        while let Some(current) = stack.pop() {
            if current == target {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(block) = self.blocks.get(current) {
                stack.extend(block.instances().values().map(Instance::type_id));
            }
        }
        false
    }

    pub fn add_instance_to_block(
        &mut self,
        parent: &str,
        name: &str,
        type_name: &str,
    ) -> NetlistResult<InstanceId> {
        let parent_id = self.block_id(parent)?;
        let type_id = self.block_id(type_name)?;
        if self.require(parent_id)?.is_primitive() {
            return Err(NetlistError::ImmutableType { block: parent.to_string(), action: "add instance" });
        }
        if self.instantiates(type_id, parent_id) {
            return Err(NetlistError::InstantiationCycle {
                parent: parent.to_string(),
                child: type_name.to_string(),
            });
        }
        let type_pins = self.require(type_id)?.pin_ids();
        let instance = self.require_mut(parent_id)?.add_instance(name, type_id, &type_pins)?;
        self.instances_of
            .entry(type_id)
            .or_default()
            .push(InstanceKey { parent: parent_id, instance });
        Ok(instance)
    }

    pub fn remove_instance_from_block(&mut self, parent: &str, name: &str) -> NetlistResult<Instance> {
        let parent_id = self.block_id(parent)?;
        let removed = self.require_mut(parent_id)?.remove_instance(name)?;
        if let Some(bucket) = self.instances_of.get_mut(&removed.type_id()) {
            bucket.retain(|k| !(k.parent == parent_id && k.instance == removed.id()));
        }
        Ok(removed)
    }

    pub fn rename_instance_in_block(&mut self, parent: &str, old: &str, new: &str) -> NetlistResult<()> {
        let parent_id = self.block_id(parent)?;
        self.require_mut(parent_id)?.rename_instance(old, new)
    }

    /// Place another instance of the same type as `src` under `new_name`.
    /// The copy starts unconnected.
    pub fn copy_instance(&mut self, parent: &str, src: &str, new_name: &str) -> NetlistResult<InstanceId> {
        let type_name = {
            let inst = self.instance(parent, src)?;
            self.type_name(inst).to_string()
        };
        self.add_instance_to_block(parent, new_name, &type_name)
    }

    // ---- nets -----------------------------------------------------------

    pub fn add_net_to_block(&mut self, block: &str, net: &str) -> NetlistResult<NetId> {
        let block_id = self.block_id(block)?;
        self.require_mut(block_id)?.add_net(net)
    }

    pub fn remove_net_from_block(&mut self, block: &str, net: &str) -> NetlistResult<Vec<Terminal>> {
        let block_id = self.block_id(block)?;
        self.require_mut(block_id)?.remove_net(net)
    }

    pub fn rename_net_in_block(&mut self, block: &str, old: &str, new: &str) -> NetlistResult<()> {
        let block_id = self.block_id(block)?;
        self.require_mut(block_id)?.rename_net(old, new)
    }

    pub fn connect_pin_to_net_in_block(&mut self, block: &str, net: &str, pin: &PinPath) -> NetlistResult<()> {
        let block_id = self.block_id(block)?;
        let net_id = self.require(block_id)?.net_id(net)?;
        let terminal = self.resolve(block_id, pin)?;
        self.connect_terminal(block_id, net_id, terminal)
    }

    pub fn disconnect_pin_from_net_in_block(&mut self, block: &str, net: &str, pin: &PinPath) -> NetlistResult<()> {
        let block_id = self.block_id(block)?;
        let b = self.require(block_id)?;
        let net_id = b.net_id(net)?;
        let terminal = self.resolve(block_id, pin)?;
        if b.net_of(terminal) != Some(net_id) {
            return Err(NetlistError::not_found(ObjectKind::Pin, &pin.to_string(), format!("net '{net}'")));
        }
        self.disconnect_terminal(block_id, terminal);
        Ok(())
    }

    pub(crate) fn connect_terminal(&mut self, block_id: BlockId, net: NetId, terminal: Terminal) -> NetlistResult<()> {
        let block = self.require(block_id)?;
        if block.is_primitive() {
            return Err(NetlistError::ImmutableType { block: block.name().to_string(), action: "connect pin" });
        }
        if let Some(current) = block.net_of(terminal) {
            return Err(self.already_connected(block_id, terminal, current));
        }
        self.require_mut(block_id)?.connect(net, terminal)?;
        debug!(
            "block #{}: connected '{}' to net '{}'",
            block_id,
            self.terminal_label(block_id, terminal),
            self.net_name(block_id, net)
        );
        Ok(())
    }

    pub(crate) fn disconnect_terminal(&mut self, block_id: BlockId, terminal: Terminal) -> Option<NetId> {
        self.blocks.get_mut(block_id)?.disconnect(terminal)
    }

    pub(crate) fn already_connected(&self, block_id: BlockId, terminal: Terminal, net: NetId) -> NetlistError {
        NetlistError::AlreadyConnected {
            block: self.blocks.get(block_id).map(|b| b.name().to_string()).unwrap_or_default(),
            terminal: self.terminal_label(block_id, terminal),
            net: self.net_name(block_id, net),
        }
    }

    /// Create a net and connect every listed pin to it, or change nothing.
    ///
    /// Every precondition is checked before the first mutation.
    pub fn create_net_with_pins(&mut self, block: &str, name: &str, pins: &[PinPath]) -> NetlistResult<NetId> {
        let block_id = self.block_id(block)?;
        let terminals = pins.iter().map(|p| self.resolve(block_id, p)).collect::<NetlistResult<Vec<_>>>()?;
        self.create_net_with_terminals(block_id, name, &terminals)
    }

    pub(crate) fn create_net_with_terminals(
        &mut self,
        block_id: BlockId,
        name: &str,
        terminals: &[Terminal],
    ) -> NetlistResult<NetId> {
        let block = self.require(block_id)?;
        if block.is_primitive() {
            return Err(NetlistError::ImmutableType { block: block.name().to_string(), action: "add net" });
        }
        check_name(ObjectKind::Net, name)?;
        if block.nets().contains_name(name) {
            return Err(NetlistError::duplicate(ObjectKind::Net, name, block.scope()));
        }
        let mut seen = HashSet::new();
        for terminal in terminals {
            let Some(pin_ref) = block.pin_ref(*terminal) else {
                return Err(NetlistError::not_found(ObjectKind::Pin, &format!("{terminal:?}"), block.scope()));
            };
            if let Some(current) = pin_ref.net() {
                return Err(self.already_connected(block_id, *terminal, current));
            }
            if !seen.insert(*terminal) {
                return Err(NetlistError::InvalidConnection(format!(
                    "pin '{}' listed twice for net '{}'",
                    self.terminal_label(block_id, *terminal),
                    name
                )));
            }
        }

        let target = self.require_mut(block_id)?;
        let net = target.add_net(name)?;
        for terminal in terminals {
            target.connect(net, *terminal)?;
        }
        debug!("block #{}: created net '{}' with {} pin(s)", block_id, name, terminals.len());
        Ok(net)
    }

    /// Move every member of `absorbed` into `survivor` and delete `absorbed`.
    pub fn merge_nets(&mut self, block: &str, survivor: &str, absorbed: &str) -> NetlistResult<NetId> {
        let block_id = self.block_id(block)?;
        let b = self.require(block_id)?;
        let keep = b.net_id(survivor)?;
        let drop = b.net_id(absorbed)?;
        self.merge_net_ids(block_id, keep, drop)?;
        Ok(keep)
    }

    pub(crate) fn merge_net_ids(&mut self, block_id: BlockId, keep: NetId, drop: NetId) -> NetlistResult<()> {
        if keep == drop {
            return Err(NetlistError::InvalidConnection(format!(
                "net '{}' cannot be merged into itself",
                self.net_name(block_id, keep)
            )));
        }
        let absorbed_name = self.net_name(block_id, drop);
        let block = self.require_mut(block_id)?;
        let members = block.clear_net(drop);
        for member in &members {
            block.connect(keep, *member)?;
        }
        block.remove_net(&absorbed_name)?;
        debug!("block #{}: merged net '{}' ({} members)", block_id, absorbed_name, members.len());
        Ok(())
    }

    /// Remove a net by id, disconnecting its members.
    pub(crate) fn remove_net_id(&mut self, block_id: BlockId, net: NetId) -> NetlistResult<Vec<Terminal>> {
        let name = self.net_name(block_id, net);
        self.require_mut(block_id)?.remove_net(&name)
    }
}
