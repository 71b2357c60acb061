//! Vec-backed node storage addressed by `NodeId` handles

use std::fmt;
use std::ops::{Index, IndexMut};

/// Handle to a node slot inside an [`Arena`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    /// Reserved handle that never names an arena slot
    pub(crate) const NIL: NodeId = NodeId(u32::MAX);

    /// Handle for slot `index`; panics once the arena outgrows the `u32`
    /// handle space, whose last value is reserved for `NIL`
    fn from_index(index: usize) -> NodeId {
        match u32::try_from(index) {
            Ok(raw) if raw != NodeId::NIL.0 => NodeId(raw),
            _ => panic!("arena capacity exceeded: slot {} has no handle", index),
        }
    }

    #[inline]
    fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == NodeId::NIL {
            f.write_str("nil")
        } else {
            write!(f, "#{}", self.0)
        }
    }
}

/// Slab of nodes; removed slots go on a free list and are handed out again
pub(crate) struct Arena<N> {
    slots: Vec<Option<N>>,
    free: Vec<NodeId>,
}

impl<N> Arena<N> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }

    /// Store `node`, reusing a freed slot when one is available
    pub(crate) fn alloc(&mut self, node: N) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.slots[id.index()] = Some(node);
                id
            }
            None => {
                let id = NodeId::from_index(self.slots.len());
                self.slots.push(Some(node));
                id
            }
        }
    }

    /// Take the node out of its slot and put the slot on the free list
    pub(crate) fn release(&mut self, id: NodeId) -> Option<N> {
        let node = self.slots.get_mut(id.index())?.take()?;
        self.free.push(id);
        Some(node)
    }

    #[cfg(test)]
    pub(crate) fn get(&self, id: NodeId) -> Option<&N> {
        self.slots.get(id.index())?.as_ref()
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}

impl<N> Index<NodeId> for Arena<N> {
    type Output = N;

    fn index(&self, id: NodeId) -> &N {
        match self.slots.get(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("no live node at {}", id),
        }
    }
}

impl<N> IndexMut<NodeId> for Arena<N> {
    fn index_mut(&mut self, id: NodeId) -> &mut N {
        match self.slots.get_mut(id.index()) {
            Some(Some(node)) => node,
            _ => panic!("no live node at {}", id),
        }
    }
}
