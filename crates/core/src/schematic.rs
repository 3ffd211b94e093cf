//! Connectivity engine: keeps each Block's wiring graph and its logical nets
//! in step.
//!
//! [`Schematic`] owns the [`NetlistProject`] and one [`WireGraph`] per Block.
//! Every edit that can touch wiring goes through it; after each one the
//! affected blocks are resynchronised so that every component reaching a
//! terminal maps to exactly one net and carries exactly one labelled segment.

use std::collections::HashSet;

use indexmap::IndexMap;
use log::{debug, warn};

use crate::error::{NetlistError, NetlistResult, ObjectKind};
use crate::model::{
    Block, BlockId, InstanceId, JunctionId, Named, NetId, PinId, PinPath, PinRef, SegmentId,
    Terminal,
};
use crate::project::NetlistProject;
use crate::wiring::{Component, Endpoint, WireGraph};

/// What a wire end is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireEnd {
    Pin(PinPath),
    Junction(JunctionId),
}

/// A wire end inside a named Block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    pub block: String,
    pub end: WireEnd,
}

impl Anchor {
    pub fn pin(block: impl Into<String>, pin: PinPath) -> Self {
        Self { block: block.into(), end: WireEnd::Pin(pin) }
    }

    pub fn junction(block: impl Into<String>, junction: JunctionId) -> Self {
        Self { block: block.into(), end: WireEnd::Junction(junction) }
    }
}

/// Result of a successful [`Schematic::finish_wire`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wired {
    pub segment: SegmentId,
    pub net: NetId,
    pub net_name: String,
    /// Name of the net absorbed by a junction-to-junction merge.
    pub merged: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Resolved {
    Terminal(Terminal),
    Junction(JunctionId),
}

impl Resolved {
    fn endpoint(self) -> Endpoint {
        match self {
            Resolved::Terminal(t) => Endpoint::Terminal(t),
            Resolved::Junction(j) => Endpoint::Junction(j),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Schematic {
    project: NetlistProject,
    wiring: IndexMap<BlockId, WireGraph>,
}

impl Schematic {
    pub fn new(project: NetlistProject) -> Self {
        Self { project, wiring: IndexMap::new() }
    }

    pub fn project(&self) -> &NetlistProject {
        &self.project
    }

    pub fn into_project(self) -> NetlistProject {
        self.project
    }

    /// Wiring graph of a block, if anything was ever drawn in it.
    pub fn wiring(&self, block: &str) -> Option<&WireGraph> {
        let id = self.project.blocks().id_of(block)?;
        self.wiring.get(&id)
    }

    pub fn wiring_by_id(&self, block: BlockId) -> Option<&WireGraph> {
        self.wiring.get(&block)
    }

    fn graph_mut(&mut self, block: BlockId) -> &mut WireGraph {
        self.wiring.entry(block).or_default()
    }

    fn scope(&self, block: BlockId) -> String {
        self.project.block_by_id(block).map(Block::scope).unwrap_or_default()
    }

    fn segment_not_found(&self, block: BlockId, segment: SegmentId) -> NetlistError {
        NetlistError::not_found(ObjectKind::Segment, &segment.to_string(), self.scope(block))
    }

    fn junction_not_found(&self, block: BlockId, junction: JunctionId) -> NetlistError {
        NetlistError::not_found(ObjectKind::Junction, &junction.to_string(), self.scope(block))
    }

    /// Net carried by the component a segment belongs to.
    pub fn net_at(&self, block: &str, segment: SegmentId) -> NetlistResult<Option<String>> {
        let block_id = self.project.block_id(block)?;
        let graph = self.wiring.get(&block_id).ok_or_else(|| self.segment_not_found(block_id, segment))?;
        if graph.segment(segment).is_none() {
            return Err(self.segment_not_found(block_id, segment));
        }
        Ok(graph.label(&graph.component(segment)).map(|(_, net)| self.project.net_name(block_id, net)))
    }

    // ---- wiring ---------------------------------------------------------

    /// Draw a wire between two anchors in the same block.
    ///
    /// Two pins create a new net (named `name` or generated). A pin and a
    /// junction join the junction's net. Two junctions in different components
    /// merge the end junction's net into the start junction's net; within one
    /// component they add a loop segment.
    pub fn finish_wire(&mut self, start: &Anchor, end: &Anchor, name: Option<&str>) -> NetlistResult<Wired> {
        if start.block != end.block {
            return Err(NetlistError::InvalidConnection(format!(
                "cannot wire block '{}' to block '{}'",
                start.block, end.block
            )));
        }
        if start.end == end.end {
            return Err(NetlistError::InvalidConnection("cannot wire an anchor to itself".to_string()));
        }
        let block_id = self.project.block_id(&start.block)?;
        let block = self.project.require(block_id)?;
        if block.is_primitive() {
            return Err(NetlistError::ImmutableType { block: block.name().to_string(), action: "add wire" });
        }

        let a = self.resolve_end(block_id, &start.end)?;
        let b = self.resolve_end(block_id, &end.end)?;

        let wired = match (a, b) {
            (Resolved::Terminal(ta), Resolved::Terminal(tb)) => self.wire_pins(block_id, ta, tb, name)?,
            (Resolved::Terminal(t), Resolved::Junction(j)) | (Resolved::Junction(j), Resolved::Terminal(t)) => {
                Self::reject_name(name)?;
                let net = self.junction_net(block_id, j)?;
                self.project.connect_terminal(block_id, net, t)?;
                let segment = self.graph_mut(block_id).add_segment(a.endpoint(), b.endpoint(), None);
                Wired { segment, net, net_name: self.project.net_name(block_id, net), merged: None }
            }
            (Resolved::Junction(ja), Resolved::Junction(jb)) => {
                Self::reject_name(name)?;
                self.wire_junctions(block_id, ja, jb)?
            }
        };
        debug!(
            "block '{}': wired segment {} on net '{}'",
            start.block, wired.segment, wired.net_name
        );
        self.resync(block_id)?;
        Ok(wired)
    }

    fn reject_name(name: Option<&str>) -> NetlistResult<()> {
        match name {
            Some(n) => Err(NetlistError::InvalidConnection(format!(
                "net name '{n}' can only be given when wiring two pins"
            ))),
            None => Ok(()),
        }
    }

    fn resolve_end(&self, block_id: BlockId, end: &WireEnd) -> NetlistResult<Resolved> {
        match end {
            WireEnd::Pin(path) => {
                let terminal = self.project.resolve(block_id, path)?;
                let block = self.project.require(block_id)?;
                if let Some(net) = block.net_of(terminal) {
                    return Err(self.project.already_connected(block_id, terminal, net));
                }
                if self.wiring.get(&block_id).and_then(|g| g.segment_at(terminal)).is_some() {
                    return Err(NetlistError::AlreadyConnected {
                        block: block.name().to_string(),
                        terminal: path.to_string(),
                        net: "<wire>".to_string(),
                    });
                }
                Ok(Resolved::Terminal(terminal))
            }
            WireEnd::Junction(j) => {
                if self.wiring.get(&block_id).and_then(|g| g.junction(*j)).is_none() {
                    return Err(self.junction_not_found(block_id, *j));
                }
                Ok(Resolved::Junction(*j))
            }
        }
    }

    fn junction_net(&self, block_id: BlockId, junction: JunctionId) -> NetlistResult<NetId> {
        let graph = self.wiring.get(&block_id).ok_or_else(|| self.junction_not_found(block_id, junction))?;
        graph
            .label(&graph.component_of_junction(junction))
            .map(|(_, net)| net)
            .ok_or_else(|| NetlistError::InvalidConnection(format!("junction {junction} carries no net")))
    }

    fn wire_pins(&mut self, block_id: BlockId, a: Terminal, b: Terminal, name: Option<&str>) -> NetlistResult<Wired> {
        let net_name = match name {
            Some(n) => n.to_string(),
            None => self.project.next_net_name(block_id),
        };
        let net = self.project.create_net_with_terminals(block_id, &net_name, &[a, b])?;
        let segment = self.graph_mut(block_id).add_segment(Endpoint::Terminal(a), Endpoint::Terminal(b), Some(net));
        Ok(Wired { segment, net, net_name, merged: None })
    }

    fn wire_junctions(&mut self, block_id: BlockId, ja: JunctionId, jb: JunctionId) -> NetlistResult<Wired> {
        let keep = self.junction_net(block_id, ja)?;
        let absorb = self.junction_net(block_id, jb)?;
        let absorbed = self.graph_mut(block_id).component_of_junction(jb);

        let merged = if absorbed.junctions.contains(&ja) {
            None
        } else {
            let absorbed_name = self.project.net_name(block_id, absorb);
            self.project.merge_net_ids(block_id, keep, absorb)?;
            let graph = self.graph_mut(block_id);
            for sid in &absorbed.segments {
                graph.set_label(*sid, None);
            }
            Some(absorbed_name)
        };

        let segment = self.graph_mut(block_id).add_segment(Endpoint::Junction(ja), Endpoint::Junction(jb), None);
        Ok(Wired { segment, net: keep, net_name: self.project.net_name(block_id, keep), merged })
    }

    /// Place a junction on an existing segment.
    pub fn add_junction(&mut self, block: &str, segment: SegmentId) -> NetlistResult<JunctionId> {
        let block_id = self.project.block_id(block)?;
        if self.wiring.get(&block_id).and_then(|g| g.segment(segment)).is_none() {
            return Err(self.segment_not_found(block_id, segment));
        }
        let id = self.graph_mut(block_id).add_junction(Some(segment));
        debug!("block '{}': added junction {} on segment {}", block, id, segment);
        Ok(id)
    }

    /// Delete a junction. One that anchors branches takes its whole net with
    /// it. Returns the name of the deleted net, if any.
    pub fn delete_junction(&mut self, block: &str, junction: JunctionId) -> NetlistResult<Option<String>> {
        let block_id = self.project.block_id(block)?;
        let graph = self.wiring.get(&block_id).ok_or_else(|| self.junction_not_found(block_id, junction))?;
        let host = graph.junction(junction).ok_or_else(|| self.junction_not_found(block_id, junction))?.host;

        if graph.branches(junction).is_empty() {
            self.graph_mut(block_id).remove_junction(junction);
            debug!("block '{}': deleted junction {}", block, junction);
            return Ok(None);
        }
        match host {
            Some(seed) => self.delete_net_at(block, seed),
            None => {
                let component = graph.component_of_junction(junction);
                self.delete_component(block_id, &component)
            }
        }
    }

    /// Delete the whole net the segment belongs to: every segment and junction
    /// of its component plus the net itself.
    pub fn delete_net_at(&mut self, block: &str, segment: SegmentId) -> NetlistResult<Option<String>> {
        let block_id = self.project.block_id(block)?;
        let graph = self.wiring.get(&block_id).ok_or_else(|| self.segment_not_found(block_id, segment))?;
        if graph.segment(segment).is_none() {
            return Err(self.segment_not_found(block_id, segment));
        }
        let component = graph.component(segment);
        self.delete_component(block_id, &component)
    }

    fn delete_component(&mut self, block_id: BlockId, component: &Component) -> NetlistResult<Option<String>> {
        let net = self.wiring.get(&block_id).and_then(|g| g.label(component)).map(|(_, n)| n);
        self.graph_mut(block_id).remove_component(component);

        let name = match net {
            Some(net) => {
                let name = self.project.net_name(block_id, net);
                self.project.remove_net_id(block_id, net)?;
                Some(name)
            }
            None => None,
        };
        debug!(
            "block #{}: deleted {} segment(s), {} junction(s), net {:?}",
            block_id,
            component.segments.len(),
            component.junctions.len(),
            name
        );
        self.resync(block_id)?;
        Ok(name)
    }

    /// Rename the net of the component a segment belongs to.
    pub fn rename_net_at(&mut self, block: &str, segment: SegmentId, new: &str) -> NetlistResult<()> {
        let old = self.net_at(block, segment)?.ok_or_else(|| {
            NetlistError::InvalidConnection(format!("segment {segment} carries no net"))
        })?;
        self.project.rename_net_in_block(block, &old, new)
    }

    // ---- cascading removals ---------------------------------------------

    pub fn remove_block(&mut self, name: &str) -> NetlistResult<()> {
        let id = self.project.block_id(name)?;
        let removed = self.project.remove_block(name)?;
        self.wiring.shift_remove(&id);

        let mut touched = Vec::new();
        for (key, instance) in removed {
            let terminals: Vec<Terminal> = instance.pins().map(PinRef::terminal).collect();
            self.detach(key.parent, &terminals);
            if !touched.contains(&key.parent) {
                touched.push(key.parent);
            }
        }
        for parent in touched {
            self.resync(parent)?;
        }
        Ok(())
    }

    pub fn remove_pin(&mut self, block: &str, pin: &str) -> NetlistResult<PinId> {
        let block_id = self.project.block_id(block)?;
        let keys = self.project.instance_keys_of(block_id).to_vec();
        let pin_id = self.project.remove_pin_from_block(block, pin)?;

        self.detach(block_id, &[Terminal::Port(pin_id)]);
        self.resync(block_id)?;
        for key in keys {
            self.detach(key.parent, &[Terminal::Instance { instance: key.instance, pin: pin_id }]);
            self.resync(key.parent)?;
        }
        Ok(pin_id)
    }

    pub fn remove_instance(&mut self, parent: &str, name: &str) -> NetlistResult<InstanceId> {
        let parent_id = self.project.block_id(parent)?;
        let removed = self.project.remove_instance_from_block(parent, name)?;
        let terminals: Vec<Terminal> = removed.pins().map(PinRef::terminal).collect();
        self.detach(parent_id, &terminals);
        self.resync(parent_id)?;
        Ok(removed.id())
    }

    /// Remove a net and every wire that carried it.
    pub fn remove_net(&mut self, block: &str, net: &str) -> NetlistResult<()> {
        let block_id = self.project.block_id(block)?;
        let net_id = self.project.require(block_id)?.net_id(net)?;
        let members = self.project.remove_net_from_block(block, net)?;

        if let Some(graph) = self.wiring.get_mut(&block_id) {
            for component in graph.components() {
                let labelled = graph.label(&component).is_some_and(|(_, n)| n == net_id);
                let touches = graph.terminals(&component).iter().any(|t| members.contains(t));
                if labelled || touches {
                    graph.remove_component(&component);
                }
            }
        }
        self.resync(block_id)
    }

    /// Disconnect one pin from a net, dropping the wire that ends at it.
    pub fn disconnect_pin(&mut self, block: &str, net: &str, pin: &PinPath) -> NetlistResult<()> {
        let block_id = self.project.block_id(block)?;
        let terminal = self.project.resolve(block_id, pin)?;
        self.project.disconnect_pin_from_net_in_block(block, net, pin)?;
        self.detach(block_id, &[terminal]);
        self.resync(block_id)
    }

    fn detach(&mut self, block_id: BlockId, terminals: &[Terminal]) {
        if let Some(graph) = self.wiring.get_mut(&block_id) {
            let dropped = graph.detach(terminals);
            if !dropped.is_empty() {
                debug!("block #{}: detached {} segment(s)", block_id, dropped.len());
            }
        }
    }

    // ---- resynchronisation ----------------------------------------------

    /// Restore the component/net correspondence of one block.
    ///
    /// Components without terminals are dropped. Each remaining component
    /// keeps its labelled net when that net still exists and is not claimed by
    /// an earlier component, falls back to a net already bound by one of its
    /// terminals, and otherwise gets a fresh generated net. Every terminal is
    /// then bound to that net and exactly one segment carries the label.
    pub(crate) fn resync(&mut self, block_id: BlockId) -> NetlistResult<()> {
        let Some(graph) = self.wiring.get_mut(&block_id) else {
            return Ok(());
        };
        let pruned = graph.prune_orphans();
        if !pruned.is_empty() {
            debug!("block #{}: pruned {} orphan junction(s)", block_id, pruned.len());
        }

        let mut claimed: HashSet<NetId> = HashSet::new();
        for component in graph.components() {
            let graph = self.graph_mut(block_id);
            let terminals = graph.terminals(&component);
            if terminals.is_empty() {
                graph.remove_component(&component);
                warn!("block #{}: dropped wiring that reaches no pin", block_id);
                continue;
            }
            let label = graph.label(&component);

            let block = self.project.require(block_id)?;
            let from_label = label.map(|(_, n)| n).filter(|n| block.nets().contains(*n) && !claimed.contains(n));
            let from_pins = terminals.iter().filter_map(|t| block.net_of(*t)).find(|n| !claimed.contains(n));

            let net = match from_label.or(from_pins) {
                Some(net) => net,
                None => {
                    let name = self.project.next_net_name(block_id);
                    warn!("block #{}: split wiring gets new net '{}'", block_id, name);
                    self.project.create_net_with_terminals(block_id, &name, &[])?
                }
            };
            claimed.insert(net);

            for terminal in &terminals {
                let current = self.project.require(block_id)?.net_of(*terminal);
                if current == Some(net) {
                    continue;
                }
                if current.is_some() {
                    self.project.disconnect_terminal(block_id, *terminal);
                }
                warn!(
                    "block #{}: rebinding '{}' to net '{}'",
                    block_id,
                    self.project.terminal_label(block_id, *terminal),
                    self.project.net_name(block_id, net)
                );
                self.project.connect_terminal(block_id, net, *terminal)?;
            }

            let graph = self.graph_mut(block_id);
            let carrier = component
                .segments
                .iter()
                .copied()
                .find(|sid| graph.segment(*sid).and_then(|s| s.net) == Some(net))
                .or_else(|| component.segments.first().copied());
            for sid in &component.segments {
                graph.set_label(*sid, if Some(*sid) == carrier { Some(net) } else { None });
            }
        }
        Ok(())
    }

    /// Install a wiring graph built outside the engine (document loading),
    /// checking every reference before accepting it.
    pub(crate) fn restore_wiring(&mut self, block_id: BlockId, graph: WireGraph) -> NetlistResult<()> {
        let block = self.project.require(block_id)?;
        let mut seen = HashSet::new();
        for segment in graph.segments() {
            for end in segment.ends() {
                match end {
                    Endpoint::Terminal(t) => {
                        if block.pin_ref(t).is_none() {
                            return Err(NetlistError::not_found(ObjectKind::Pin, &format!("{t:?}"), block.scope()));
                        }
                        if !seen.insert(t) {
                            return Err(NetlistError::AlreadyConnected {
                                block: block.name().to_string(),
                                terminal: self.project.terminal_label(block_id, t),
                                net: "<wire>".to_string(),
                            });
                        }
                    }
                    Endpoint::Junction(j) => {
                        if graph.junction(j).is_none() {
                            return Err(self.junction_not_found(block_id, j));
                        }
                    }
                }
            }
            if let Some(net) = segment.net {
                if !block.nets().contains(net) {
                    return Err(NetlistError::not_found(ObjectKind::Net, &format!("#{net}"), block.scope()));
                }
            }
        }
        self.wiring.insert(block_id, graph);
        self.resync(block_id)
    }

    // ---- pass-through edits ---------------------------------------------

    pub fn add_block(&mut self, name: &str) -> NetlistResult<BlockId> {
        self.project.add_block(name)
    }

    pub fn add_primitive_block<S: AsRef<str>>(&mut self, name: &str, pins: &[S]) -> NetlistResult<BlockId> {
        self.project.add_primitive_block(name, pins)
    }

    pub fn rename_block(&mut self, old: &str, new: &str) -> NetlistResult<()> {
        self.project.rename_block(old, new)
    }

    /// Copy a block, wiring included.
    pub fn copy_block(&mut self, src: &str, new_name: &str) -> NetlistResult<BlockId> {
        let src_id = self.project.block_id(src)?;
        let (id, mapping) = self.project.copy_block_mapped(src, new_name)?;
        if let Some(graph) = self.wiring.get(&src_id) {
            let copy = graph.remap(&mapping.terminals, &mapping.nets);
            self.wiring.insert(id, copy);
            self.resync(id)?;
        }
        Ok(id)
    }

    pub fn add_pin(&mut self, block: &str, pin: &str) -> NetlistResult<PinId> {
        self.project.add_pin_to_block(block, pin)
    }

    pub fn rename_pin(&mut self, block: &str, old: &str, new: &str) -> NetlistResult<()> {
        self.project.rename_pin_in_block(block, old, new)
    }

    pub fn add_instance(&mut self, parent: &str, name: &str, type_name: &str) -> NetlistResult<InstanceId> {
        self.project.add_instance_to_block(parent, name, type_name)
    }

    pub fn rename_instance(&mut self, parent: &str, old: &str, new: &str) -> NetlistResult<()> {
        self.project.rename_instance_in_block(parent, old, new)
    }

    pub fn copy_instance(&mut self, parent: &str, src: &str, new_name: &str) -> NetlistResult<InstanceId> {
        self.project.copy_instance(parent, src, new_name)
    }

    pub fn add_net(&mut self, block: &str, net: &str) -> NetlistResult<NetId> {
        self.project.add_net_to_block(block, net)
    }

    pub fn rename_net(&mut self, block: &str, old: &str, new: &str) -> NetlistResult<()> {
        self.project.rename_net_in_block(block, old, new)
    }

    pub fn connect_pin(&mut self, block: &str, net: &str, pin: &PinPath) -> NetlistResult<()> {
        self.project.connect_pin_to_net_in_block(block, net, pin)
    }

    pub fn create_net_with_pins(&mut self, block: &str, name: &str, pins: &[PinPath]) -> NetlistResult<NetId> {
        self.project.create_net_with_pins(block, name, pins)
    }
}
