//! Arena keyed by frontend [`NodeId`].

use hashbrown::HashMap;

use crate::handle::Handle;
use crate::ids::NodeId;
use crate::manager::ResourceManager;

/// A [`ResourceManager`] whose entries are also reachable by the id the
/// frontend gave them. The id map and the arena are kept in lockstep; any
/// cross-references between resources are the caller's business.
#[derive(Debug)]
pub struct NodeManager<T> {
    resources: ResourceManager<T>,
    handles: HashMap<NodeId, Handle<T>>,
    owners: HashMap<Handle<T>, NodeId>,
}

impl<T> Default for NodeManager<T> {
    fn default() -> Self {
        Self {
            resources: ResourceManager::new(),
            handles: HashMap::new(),
            owners: HashMap::new(),
        }
    }
}

impl<T> NodeManager<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the handle for `id`, acquiring a default resource if none exists.
    pub fn get_or_acquire(&mut self, id: NodeId) -> Handle<T>
    where
        T: Default,
    {
        if let Some(h) = self.handles.get(&id) {
            return *h;
        }
        self.insert(id, T::default())
    }

    /// Store `value` under `id`, replacing (and dropping) any previous resource.
    pub fn insert(&mut self, id: NodeId, value: T) -> Handle<T> {
        self.release_resource(id);
        let handle = self.resources.insert(value);
        self.handles.insert(id, handle);
        self.owners.insert(handle, id);
        handle
    }

    pub fn release_resource(&mut self, id: NodeId) -> Option<T> {
        let handle = self.handles.remove(&id)?;
        self.owners.remove(&handle);
        self.resources.release(handle)
    }

    #[inline]
    pub fn lookup_handle(&self, id: NodeId) -> Option<Handle<T>> {
        self.handles.get(&id).copied()
    }

    #[inline]
    pub fn lookup_resource(&self, id: NodeId) -> Option<&T> {
        self.handles.get(&id).and_then(|h| self.resources.data(*h))
    }

    #[inline]
    pub fn lookup_resource_mut(&mut self, id: NodeId) -> Option<&mut T> {
        let handle = *self.handles.get(&id)?;
        self.resources.data_mut(handle)
    }

    #[inline]
    pub fn data(&self, handle: Handle<T>) -> Option<&T> {
        self.resources.data(handle)
    }

    #[inline]
    pub fn data_mut(&mut self, handle: Handle<T>) -> Option<&mut T> {
        self.resources.data_mut(handle)
    }

    #[inline]
    pub fn owner(&self, handle: Handle<T>) -> Option<NodeId> {
        self.owners.get(&handle).copied()
    }

    #[inline]
    pub fn contains(&self, id: NodeId) -> bool {
        self.handles.contains_key(&id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.handles.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> {
        let owners = &self.owners;
        self.resources
            .iter()
            .filter_map(move |(h, v)| owners.get(&h).map(|id| (*id, v)))
    }

    /// Mutable iteration in slot order. Each entry is yielded once, so the
    /// returned references are disjoint and may be handed to separate jobs.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (NodeId, &mut T)> {
        let owners = &self.owners;
        self.resources
            .iter_mut()
            .filter_map(move |(h, v)| owners.get(&h).map(|id| (*id, v)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_external_id() {
        let mut mgr: NodeManager<String> = NodeManager::new();
        let id = NodeId(42);
        mgr.insert(id, "clock".into());
        assert_eq!(mgr.lookup_resource(id).map(String::as_str), Some("clock"));
        assert!(mgr.lookup_resource(NodeId(7)).is_none());
    }

    #[test]
    fn replacing_an_id_invalidates_old_handle() {
        let mut mgr: NodeManager<u32> = NodeManager::new();
        let id = NodeId(1);
        let old = mgr.insert(id, 1);
        let new = mgr.insert(id, 2);
        assert!(mgr.data(old).is_none());
        assert_eq!(mgr.data(new), Some(&2));
        assert_eq!(mgr.len(), 1);
        assert_eq!(mgr.owner(new), Some(id));
        assert_eq!(mgr.owner(old), None);
    }

    #[test]
    fn get_or_acquire_is_idempotent() {
        let mut mgr: NodeManager<u32> = NodeManager::new();
        let a = mgr.get_or_acquire(NodeId(3));
        let b = mgr.get_or_acquire(NodeId(3));
        assert_eq!(a, b);
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn iter_mut_yields_owning_ids() {
        let mut mgr: NodeManager<u32> = NodeManager::new();
        mgr.insert(NodeId(10), 1);
        mgr.insert(NodeId(20), 2);
        for (_, v) in mgr.iter_mut() {
            *v *= 10;
        }
        let mut seen: Vec<_> = mgr.iter().map(|(id, v)| (id.0, *v)).collect();
        seen.sort();
        assert_eq!(seen, vec![(10, 10), (20, 20)]);
    }
}
