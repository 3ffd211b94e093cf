use log::debug;

use crate::error::{NetlistError, NetlistResult, ObjectKind};
use crate::model::{
    check_name, BlockId, Instance, InstanceId, Named, Net, NetId, Pin, PinId, PinRef, PinUpdate, Registry,
    Terminal,
};

/// A named container of interface pins, nets, and instances.
///
/// Primitive blocks are created once with a fixed pin set and reject every
/// structural edit afterwards.
#[derive(Debug, Clone)]
pub struct Block {
    id: BlockId,
    name: String,
    primitive: bool,
    pins: Registry<PinId, Pin>,
    instances: Registry<InstanceId, Instance>,
    nets: Registry<NetId, Net>,
}

impl Block {
    pub(crate) fn new(id: BlockId, name: String) -> Self {
        Self {
            id,
            name,
            primitive: false,
            pins: Registry::new(),
            instances: Registry::new(),
            nets: Registry::new(),
        }
    }

    pub(crate) fn primitive<S: AsRef<str>>(
        id: BlockId,
        name: String,
        pins: &[S],
    ) -> NetlistResult<Self> {
        let mut block = Self::new(id, name);
        for pin in pins {
            block.add_interface_pin(pin.as_ref())?;
        }
        block.primitive = true;
        Ok(block)
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn is_primitive(&self) -> bool {
        self.primitive
    }

    pub fn pins(&self) -> &Registry<PinId, Pin> {
        &self.pins
    }

    pub fn instances(&self) -> &Registry<InstanceId, Instance> {
        &self.instances
    }

    pub fn nets(&self) -> &Registry<NetId, Net> {
        &self.nets
    }

    pub fn pin_ids(&self) -> Vec<PinId> {
        self.pins.ids().collect()
    }

    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.instances.by_name(name)
    }

    pub fn net(&self, name: &str) -> Option<&Net> {
        self.nets.by_name(name)
    }

    pub(crate) fn scope(&self) -> String {
        format!("block '{}'", self.name)
    }

    fn ensure_mutable(&self, action: &'static str) -> NetlistResult<()> {
        if self.primitive {
            return Err(NetlistError::ImmutableType { block: self.name.clone(), action });
        }
        Ok(())
    }

    fn pin_id(&self, name: &str) -> NetlistResult<PinId> {
        self.pins.id_of(name).ok_or_else(|| NetlistError::not_found(ObjectKind::Pin, name, self.scope()))
    }

    pub(crate) fn instance_id(&self, name: &str) -> NetlistResult<InstanceId> {
        self.instances
            .id_of(name)
            .ok_or_else(|| NetlistError::not_found(ObjectKind::Instance, name, self.scope()))
    }

    pub(crate) fn net_id(&self, name: &str) -> NetlistResult<NetId> {
        self.nets.id_of(name).ok_or_else(|| NetlistError::not_found(ObjectKind::Net, name, self.scope()))
    }

    pub fn add_interface_pin(&mut self, name: &str) -> NetlistResult<PinId> {
        self.ensure_mutable("add pin")?;
        check_name(ObjectKind::Pin, name)?;
        if self.pins.contains_name(name) {
            return Err(NetlistError::duplicate(ObjectKind::Pin, name, self.scope()));
        }
        let id = self.pins.insert_with(|id| Pin::new(id, name.to_string()));
        debug!("block '{}': added pin '{}'", self.name, name);
        Ok(id)
    }

    /// Remove an interface pin, first dropping its Block-context ref from any net.
    pub fn remove_interface_pin(&mut self, name: &str) -> NetlistResult<PinId> {
        self.ensure_mutable("remove pin")?;
        let id = self.pin_id(name)?;
        self.disconnect(Terminal::Port(id));
        self.pins.remove(id);
        debug!("block '{}': removed pin '{}'", self.name, name);
        Ok(id)
    }

    pub fn rename_interface_pin(&mut self, old: &str, new: &str) -> NetlistResult<()> {
        self.ensure_mutable("rename pin")?;
        let id = self.pin_id(old)?;
        check_name(ObjectKind::Pin, new)?;
        if !self.pins.rename(id, new) {
            return Err(NetlistError::duplicate(ObjectKind::Pin, new, self.scope()));
        }
        debug!("block '{}': renamed pin '{}' -> '{}'", self.name, old, new);
        Ok(())
    }

    pub fn add_instance(
        &mut self,
        name: &str,
        type_id: BlockId,
        type_pins: &[PinId],
    ) -> NetlistResult<InstanceId> {
        self.ensure_mutable("add instance")?;
        check_name(ObjectKind::Instance, name)?;
        if self.instances.contains_name(name) {
            return Err(NetlistError::duplicate(ObjectKind::Instance, name, self.scope()));
        }
        let parent = self.id;
        let id = self
            .instances
            .insert_with(|id| Instance::new(id, name.to_string(), type_id, parent, type_pins));
        debug!("block '{}': added instance '{}'", self.name, name);
        Ok(id)
    }

    /// Remove an instance after disconnecting every one of its refs.
    pub fn remove_instance(&mut self, name: &str) -> NetlistResult<Instance> {
        self.ensure_mutable("remove instance")?;
        let id = self.instance_id(name)?;
        let terminals: Vec<Terminal> = self
            .instances
            .get(id)
            .map(|inst| inst.pins().map(PinRef::terminal).collect())
            .unwrap_or_default();
        for terminal in terminals {
            self.disconnect(terminal);
        }
        let instance = self
            .instances
            .remove(id)
            .ok_or_else(|| NetlistError::not_found(ObjectKind::Instance, name, self.scope()))?;
        debug!("block '{}': removed instance '{}'", self.name, name);
        Ok(instance)
    }

    pub fn rename_instance(&mut self, old: &str, new: &str) -> NetlistResult<()> {
        self.ensure_mutable("rename instance")?;
        let id = self.instance_id(old)?;
        check_name(ObjectKind::Instance, new)?;
        if !self.instances.rename(id, new) {
            return Err(NetlistError::duplicate(ObjectKind::Instance, new, self.scope()));
        }
        debug!("block '{}': renamed instance '{}' -> '{}'", self.name, old, new);
        Ok(())
    }

    pub fn add_net(&mut self, name: &str) -> NetlistResult<NetId> {
        self.ensure_mutable("add net")?;
        check_name(ObjectKind::Net, name)?;
        if self.nets.contains_name(name) {
            return Err(NetlistError::duplicate(ObjectKind::Net, name, self.scope()));
        }
        let id = self.nets.insert_with(|_| Net::new(name.to_string()));
        debug!("block '{}': added net '{}'", self.name, name);
        Ok(id)
    }

    /// Remove a net after disconnecting all of its members. Returns the former members.
    pub fn remove_net(&mut self, name: &str) -> NetlistResult<Vec<Terminal>> {
        self.ensure_mutable("remove net")?;
        let id = self.net_id(name)?;
        let members = self.clear_net(id);
        self.nets.remove(id);
        debug!("block '{}': removed net '{}' ({} members)", self.name, name, members.len());
        Ok(members)
    }

    pub fn rename_net(&mut self, old: &str, new: &str) -> NetlistResult<()> {
        self.ensure_mutable("rename net")?;
        let id = self.net_id(old)?;
        check_name(ObjectKind::Net, new)?;
        if !self.nets.rename(id, new) {
            return Err(NetlistError::duplicate(ObjectKind::Net, new, self.scope()));
        }
        debug!("block '{}': renamed net '{}' -> '{}'", self.name, old, new);
        Ok(())
    }

    /// The ref behind a terminal of this block, if the terminal still exists.
    pub fn pin_ref(&self, terminal: Terminal) -> Option<&PinRef> {
        match terminal {
            Terminal::Port(pin) => self.pins.get(pin).map(Pin::port),
            Terminal::Instance { instance, pin } => {
                self.instances.get(instance).and_then(|inst| inst.pin(pin))
            }
        }
    }

    fn pin_ref_mut(&mut self, terminal: Terminal) -> Option<&mut PinRef> {
        match terminal {
            Terminal::Port(pin) => self.pins.get_mut(pin).map(Pin::port_mut),
            Terminal::Instance { instance, pin } => {
                self.instances.get_mut(instance).and_then(|inst| inst.pin_mut(pin))
            }
        }
    }

    pub fn net_of(&self, terminal: Terminal) -> Option<NetId> {
        self.pin_ref(terminal).and_then(PinRef::net)
    }

    /// Bind `terminal` to `net`.
    ///
    /// Fails with `NotFound` when either side is missing and with
    /// `AlreadyConnected` when the terminal is bound already.
    pub(crate) fn connect(&mut self, net: NetId, terminal: Terminal) -> NetlistResult<()> {
        let scope = self.scope();
        let block = self.name.clone();
        let Some(net_name) = self.nets.get(net).map(|n| n.name().to_string()) else {
            return Err(NetlistError::not_found(ObjectKind::Net, &format!("#{net}"), scope));
        };
        let Some(pin_ref) = self.pin_ref_mut(terminal) else {
            return Err(NetlistError::not_found(ObjectKind::Pin, &format!("{terminal:?}"), scope));
        };
        if let Err(current) = pin_ref.connect(net) {
            let net = self.nets.get(current).map_or(net_name, |n| n.name().to_string());
            return Err(NetlistError::AlreadyConnected { block, terminal: format!("{terminal:?}"), net });
        }
        if let Some(n) = self.nets.get_mut(net) {
            n.push(terminal);
        }
        Ok(())
    }

    /// Drop `terminal` from whatever net it belongs to. Returns that net.
    pub(crate) fn disconnect(&mut self, terminal: Terminal) -> Option<NetId> {
        let net = self.pin_ref_mut(terminal)?.disconnect()?;
        if let Some(n) = self.nets.get_mut(net) {
            n.remove(terminal);
        }
        Some(net)
    }

    /// Disconnect every member of `net`, leaving it empty.
    pub(crate) fn clear_net(&mut self, net: NetId) -> Vec<Terminal> {
        let members = self.nets.get_mut(net).map(Net::take_members).unwrap_or_default();
        for terminal in &members {
            if let Some(pin_ref) = self.pin_ref_mut(*terminal) {
                pin_ref.disconnect();
            }
        }
        members
    }

    /// Reconcile one instance against its type's current pins, disconnecting
    /// refs that are about to be dropped.
    pub(crate) fn reconcile_instance(
        &mut self,
        instance: InstanceId,
        type_pins: &[PinId],
    ) -> Option<PinUpdate> {
        let stale = self.instances.get(instance)?.stale_pins(type_pins);
        for pin in stale {
            self.disconnect(Terminal::Instance { instance, pin });
        }
        self.instances.get_mut(instance).map(|inst| inst.update_pins(type_pins))
    }
}

impl Named for Block {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawId;

    fn composite() -> Block {
        Block::new(BlockId::from_raw(0), "main".into())
    }

    #[test]
    fn duplicate_adds_leave_the_block_unchanged() {
        let mut block = composite();
        block.add_interface_pin("a").unwrap();
        block.add_net("n").unwrap();

        let err = block.add_interface_pin("a").unwrap_err();
        assert!(matches!(err, NetlistError::DuplicateName { kind: ObjectKind::Pin, .. }));
        assert!(block.add_net("n").is_err());
        assert_eq!(block.pins().len(), 1);
        assert_eq!(block.nets().len(), 1);
    }

    #[test]
    fn primitive_rejects_every_edit() {
        let mut prim = Block::primitive(BlockId::from_raw(1), "nmos".into(), &["d", "g", "s"])
            .unwrap();
        let errs = [
            prim.add_interface_pin("b").unwrap_err(),
            prim.remove_interface_pin("d").unwrap_err(),
            prim.rename_interface_pin("d", "x").unwrap_err(),
            prim.add_net("n").unwrap_err(),
            prim.add_instance("i", BlockId::from_raw(0), &[]).unwrap_err(),
            prim.remove_instance("i").unwrap_err(),
            prim.rename_instance("i", "j").unwrap_err(),
            prim.remove_net("n").unwrap_err(),
            prim.rename_net("n", "m").unwrap_err(),
        ];
        for err in errs {
            assert!(matches!(err, NetlistError::ImmutableType { .. }), "got {err}");
        }
        let names: Vec<&str> = prim.pins().values().map(|p| p.name()).collect();
        assert_eq!(names, vec!["d", "g", "s"]);
    }

    #[test]
    fn primitive_with_repeated_pin_names_is_rejected() {
        let err = Block::primitive(BlockId::from_raw(1), "bad".into(), &["a", "a"]).unwrap_err();
        assert!(matches!(err, NetlistError::DuplicateName { .. }));
    }

    #[test]
    fn removing_a_connected_pin_empties_its_net() {
        let mut block = composite();
        let a = block.add_interface_pin("a").unwrap();
        let net = block.add_net("n").unwrap();
        block.connect(net, Terminal::Port(a)).unwrap();
        assert_eq!(block.net("n").unwrap().len(), 1);

        block.remove_interface_pin("a").unwrap();
        assert!(block.net("n").unwrap().is_empty());
    }

    #[test]
    fn remove_net_unbinds_members() {
        let mut block = composite();
        let a = block.add_interface_pin("a").unwrap();
        let net = block.add_net("n").unwrap();
        block.connect(net, Terminal::Port(a)).unwrap();

        let members = block.remove_net("n").unwrap();
        assert_eq!(members, vec![Terminal::Port(a)]);
        assert_eq!(block.net_of(Terminal::Port(a)), None);
    }

    #[test]
    fn connect_reports_missing_and_bound_terminals() {
        let mut block = composite();
        let a = block.add_interface_pin("a").unwrap();
        let n = block.add_net("n").unwrap();
        let m = block.add_net("m").unwrap();

        let ghost = Terminal::Port(PinId::from_raw(99));
        let err = block.connect(n, ghost).unwrap_err();
        assert!(matches!(err, NetlistError::NotFound { kind: ObjectKind::Pin, .. }), "got {err}");
        let err = block.connect(NetId::from_raw(99), Terminal::Port(a)).unwrap_err();
        assert!(matches!(err, NetlistError::NotFound { kind: ObjectKind::Net, .. }), "got {err}");

        block.connect(n, Terminal::Port(a)).unwrap();
        let err = block.connect(m, Terminal::Port(a)).unwrap_err();
        assert!(matches!(&err, NetlistError::AlreadyConnected { net, .. } if net == "n"), "got {err}");
        assert!(block.net("m").unwrap().is_empty());
        assert!(block.net("n").unwrap().len() == 1);
    }

    #[test]
    fn rename_to_a_taken_name_fails() {
        let mut block = composite();
        block.add_interface_pin("a").unwrap();
        block.add_interface_pin("b").unwrap();
        let err = block.rename_interface_pin("a", "b").unwrap_err();
        assert!(matches!(err, NetlistError::DuplicateName { .. }));
        let err = block.rename_interface_pin("zz", "c").unwrap_err();
        assert!(matches!(err, NetlistError::NotFound { .. }));
    }
}
