use std::collections::HashMap;

use indexmap::IndexMap;

use crate::model::RawId;

/// Objects stored in a [`Registry`] expose their name so the index can follow renames.
pub trait Named {
    fn name(&self) -> &str;
    fn set_name(&mut self, name: String);
}

/// Insertion-ordered store of named objects addressed by stable ids.
///
/// Names are unique within one registry. The registry never reuses an id, so
/// ids held elsewhere either resolve to the same object or to nothing.
#[derive(Debug, Clone)]
pub struct Registry<K, T> {
    items: IndexMap<K, T>,
    by_name: HashMap<String, K>,
    next: u32,
}

impl<K: RawId, T: Named> Default for Registry<K, T> {
    fn default() -> Self {
        Self { items: IndexMap::new(), by_name: HashMap::new(), next: 0 }
    }
}

impl<K: RawId, T: Named> Registry<K, T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn contains(&self, id: K) -> bool {
        self.items.contains_key(&id)
    }

    pub fn id_of(&self, name: &str) -> Option<K> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, id: K) -> Option<&T> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: K) -> Option<&mut T> {
        self.items.get_mut(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&T> {
        self.id_of(name).and_then(|id| self.items.get(&id))
    }

    /// Allocate an id and store the object built for it.
    ///
    /// The caller checks name uniqueness first; inserting a taken name is a bug.
    pub fn insert_with(&mut self, make: impl FnOnce(K) -> T) -> K {
        let id = K::from_raw(self.next);
        self.next += 1;
        let item = make(id);
        debug_assert!(!self.by_name.contains_key(item.name()), "duplicate registry name");
        self.by_name.insert(item.name().to_string(), id);
        self.items.insert(id, item);
        id
    }

    /// Like [`Registry::insert_with`], but the id is only consumed when `make` succeeds.
    pub fn try_insert_with<E>(&mut self, make: impl FnOnce(K) -> Result<T, E>) -> Result<K, E> {
        let id = K::from_raw(self.next);
        let item = make(id)?;
        self.next += 1;
        debug_assert!(!self.by_name.contains_key(item.name()), "duplicate registry name");
        self.by_name.insert(item.name().to_string(), id);
        self.items.insert(id, item);
        Ok(id)
    }

    /// Remove by id, preserving the order of the remaining entries.
    pub fn remove(&mut self, id: K) -> Option<T> {
        let item = self.items.shift_remove(&id)?;
        self.by_name.remove(item.name());
        Some(item)
    }

    /// Rename in place. Returns `false` when `id` is unknown or `new_name` is
    /// taken by another entry; renaming to the current name is a no-op.
    pub fn rename(&mut self, id: K, new_name: &str) -> bool {
        if let Some(&holder) = self.by_name.get(new_name) {
            return holder == id;
        }
        let Some(item) = self.items.get_mut(&id) else {
            return false;
        };
        self.by_name.remove(item.name());
        item.set_name(new_name.to_string());
        self.by_name.insert(new_name.to_string(), id);
        true
    }

    pub fn ids(&self) -> impl Iterator<Item = K> + '_ {
        self.items.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (K, &T)> {
        self.items.iter().map(|(id, item)| (*id, item))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (K, &mut T)> {
        self.items.iter_mut().map(|(id, item)| (*id, item))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.items.values()
    }
}
