use crate::model::{Named, Terminal};

/// A named, ordered collection of connected terminals scoped to one Block.
///
/// The Net only records membership. Keeping each member's `PinRef` binding in
/// step is the owning Block's job.
#[derive(Debug, Clone)]
pub struct Net {
    name: String,
    members: Vec<Terminal>,
}

impl Net {
    pub(crate) fn new(name: String) -> Self {
        Self { name, members: Vec::new() }
    }

    pub fn members(&self) -> &[Terminal] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn contains(&self, terminal: Terminal) -> bool {
        self.members.contains(&terminal)
    }

    pub(crate) fn push(&mut self, terminal: Terminal) {
        if !self.contains(terminal) {
            self.members.push(terminal);
        }
    }

    pub(crate) fn remove(&mut self, terminal: Terminal) -> bool {
        let before = self.members.len();
        self.members.retain(|m| *m != terminal);
        self.members.len() != before
    }

    pub(crate) fn take_members(&mut self) -> Vec<Terminal> {
        std::mem::take(&mut self.members)
    }
}

impl Named for Net {
    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
