use indexmap::IndexMap;

use crate::model::{BlockId, InstanceId, Named, PinId, PinRef, Terminal};

/// A typed placement of one Block inside another.
///
/// Holds one `PinRef` per interface pin of its type, in the type's pin order at
/// the time each ref was created.
#[derive(Debug, Clone)]
pub struct Instance {
    id: InstanceId,
    name: String,
    type_id: BlockId,
    parent: BlockId,
    pins: IndexMap<PinId, PinRef>,
}

/// What [`Instance::update_pins`] changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PinUpdate {
    pub added: Vec<PinId>,
    pub dropped: Vec<PinId>,
}

impl PinUpdate {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.dropped.is_empty()
    }
}

impl Instance {
    pub(crate) fn new(
        id: InstanceId,
        name: String,
        type_id: BlockId,
        parent: BlockId,
        type_pins: &[PinId],
    ) -> Self {
        let pins = type_pins
            .iter()
            .map(|pin| (*pin, PinRef::new(Terminal::Instance { instance: id, pin: *pin })))
            .collect();
        Self { id, name, type_id, parent, pins }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn type_id(&self) -> BlockId {
        self.type_id
    }

    pub fn parent(&self) -> BlockId {
        self.parent
    }

    pub fn pins(&self) -> impl Iterator<Item = &PinRef> {
        self.pins.values()
    }

    pub fn pin(&self, pin: PinId) -> Option<&PinRef> {
        self.pins.get(&pin)
    }

    pub(crate) fn pin_mut(&mut self, pin: PinId) -> Option<&mut PinRef> {
        self.pins.get_mut(&pin)
    }

    /// Pins of this instance that would be dropped by reconciling against `type_pins`.
    pub(crate) fn stale_pins(&self, type_pins: &[PinId]) -> Vec<PinId> {
        self.pins.keys().filter(|pin| !type_pins.contains(pin)).copied().collect()
    }

    /// Reconcile the ref set against the type's current interface.
    ///
    /// Refs for pins the type no longer declares are dropped; they must already
    /// be disconnected. Missing pins get a fresh, unconnected ref appended.
    pub(crate) fn update_pins(&mut self, type_pins: &[PinId]) -> PinUpdate {
        let dropped = self.stale_pins(type_pins);
        for pin in &dropped {
            if let Some(old) = self.pins.shift_remove(pin) {
                debug_assert!(!old.is_connected(), "dropping a connected pin ref");
            }
        }

        let mut added = Vec::new();
        for pin in type_pins {
            if !self.pins.contains_key(pin) {
                let terminal = Terminal::Instance { instance: self.id, pin: *pin };
                self.pins.insert(*pin, PinRef::new(terminal));
                added.push(*pin);
            }
        }

        PinUpdate { added, dropped }
    }
}

impl Named for Instance {
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

    fn pins(raw: &[u32]) -> Vec<PinId> {
        raw.iter().map(|r| PinId::from_raw(*r)).collect()
    }

    #[test]
    fn update_pins_adds_drops_and_is_idempotent() {
        let mut inst = Instance::new(
            InstanceId::from_raw(0),
            "t1".into(),
            BlockId::from_raw(1),
            BlockId::from_raw(2),
            &pins(&[0, 1, 2]),
        );

        let update = inst.update_pins(&pins(&[0, 2, 3]));
        assert_eq!(update.added, pins(&[3]));
        assert_eq!(update.dropped, pins(&[1]));
        assert_eq!(inst.pins().map(|p| p.pin()).collect::<Vec<_>>(), pins(&[0, 2, 3]));

        assert!(inst.update_pins(&pins(&[0, 2, 3])).is_empty());
    }
}
