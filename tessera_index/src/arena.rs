// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Slot arena with generational node handles.

use alloc::vec::Vec;
use core::ops::{Index, IndexMut};

/// Generational handle for a tree node.
///
/// Handles stay valid while their node is alive. Once a node is removed, or
/// the whole tree is cleared or rebuilt, the old handle no longer resolves,
/// even if its slot is reused.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32, u32);

impl NodeId {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Node handles are intentionally 32-bit; trees never hold 2^32 nodes."
    )]
    const fn new(idx: usize, generation: u32) -> Self {
        Self(idx as u32, generation)
    }

    /// Slot index of the node.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Generation of the slot when this handle was issued.
    pub const fn generation(self) -> u32 {
        self.1
    }
}

#[derive(Clone, Debug)]
struct Slot<N> {
    generation: u32,
    node: Option<N>,
}

#[derive(Clone, Debug)]
pub(crate) struct Arena<N> {
    slots: Vec<Slot<N>>,
    free_list: Vec<usize>,
    alive: usize,
}

impl<N> Default for Arena<N> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            alive: 0,
        }
    }
}

impl<N> Arena<N> {
    pub(crate) fn insert(&mut self, node: N) -> NodeId {
        self.alive += 1;
        if let Some(idx) = self.free_list.pop() {
            let slot = &mut self.slots[idx];
            slot.generation = slot.generation.wrapping_add(1);
            slot.node = Some(node);
            NodeId::new(idx, slot.generation)
        } else {
            self.slots.push(Slot {
                generation: 1,
                node: Some(node),
            });
            NodeId::new(self.slots.len() - 1, 1)
        }
    }

    pub(crate) fn remove(&mut self, id: NodeId) -> Option<N> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.generation != id.generation() {
            return None;
        }
        let node = slot.node.take()?;
        self.free_list.push(id.index());
        self.alive -= 1;
        Some(node)
    }

    pub(crate) fn get(&self, id: NodeId) -> Option<&N> {
        self.slots
            .get(id.index())
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.node.as_ref())
    }

    /// Free every slot but keep generations, so handles issued before the
    /// clear can never resolve again.
    pub(crate) fn clear(&mut self) {
        self.free_list.clear();
        for (idx, slot) in self.slots.iter_mut().enumerate().rev() {
            slot.node = None;
            self.free_list.push(idx);
        }
        self.alive = 0;
    }

    pub(crate) fn len(&self) -> usize {
        self.alive
    }
}

impl<N> Index<NodeId> for Arena<N> {
    type Output = N;

    fn index(&self, id: NodeId) -> &N {
        match self.get(id) {
            Some(node) => node,
            None => panic!("stale node handle {id:?}"),
        }
    }
}

impl<N> IndexMut<NodeId> for Arena<N> {
    fn index_mut(&mut self, id: NodeId) -> &mut N {
        match self
            .slots
            .get_mut(id.index())
            .filter(|s| s.generation == id.generation())
            .and_then(|s| s.node.as_mut())
        {
            Some(node) => node,
            None => panic!("stale node handle {id:?}"),
        }
    }
}
