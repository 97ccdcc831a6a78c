// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Steppable traversals: step values, cancellation, and highlight sets.
//!
//! Range searches on the k-d tree and intersection searches on the R-tree are
//! exposed as pull-based state machines. Each call to `next_step` does one
//! unit of work and reports it as a [`TraversalStep`], so a presentation
//! layer can animate a search on any clock it likes. The state holds only
//! [`NodeId`]s; the tree is passed back in on every step.
//!
//! A [`TraversalSlot`] enforces that at most one animated search is live at a
//! time: beginning a new one cancels the previous [`CancelToken`].

use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

use bitflags::bitflags;
use hashbrown::{HashMap, HashSet};

use crate::arena::NodeId;

/// One unit of work performed by a traversal.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TraversalStep<F> {
    /// The traversal examined this node.
    Visit(NodeId),
    /// The traversal produced a result.
    Found(F),
}

impl<F> TraversalStep<F> {
    /// The found element, if this step is a result.
    pub fn found(self) -> Option<F> {
        match self {
            Self::Found(f) => Some(f),
            Self::Visit(_) => None,
        }
    }
}

/// Shared cancellation flag for a traversal.
///
/// Clones observe the same flag. Cancelling is permanent.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The traversal stops before its next step.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Holder for the single live animated traversal of a view.
#[derive(Debug, Default)]
pub struct TraversalSlot {
    active: Option<CancelToken>,
}

impl TraversalSlot {
    /// Cancel whatever traversal is live and hand out a token for a new one.
    pub fn begin(&mut self) -> CancelToken {
        self.cancel();
        let token = CancelToken::new();
        self.active = Some(token.clone());
        token
    }

    /// Cancel the live traversal, if any.
    pub fn cancel(&mut self) {
        if let Some(prev) = self.active.take() {
            if !prev.is_cancelled() {
                tracing::debug!("cancelling live traversal");
            }
            prev.cancel();
        }
    }

    /// Whether a traversal was begun and has not been cancelled.
    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(|t| !t.is_cancelled())
    }
}

bitflags! {
    /// Per-node highlight state accumulated from traversal steps.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct Marks: u8 {
        /// The node was visited.
        const VISITED = 1 << 0;
        /// The node itself is a result.
        const FOUND = 1 << 1;
    }
}

impl Default for Marks {
    fn default() -> Self {
        Self::empty()
    }
}

/// Something a traversal can report as found.
pub trait Hit: Copy {
    /// Record this hit in a highlight set.
    fn record(self, highlight: &mut Highlight);
}

impl Hit for NodeId {
    fn record(self, highlight: &mut Highlight) {
        *highlight.nodes.entry(self).or_default() |= Marks::FOUND;
    }
}

/// Item slots, as found by R-tree intersection traversals.
impl Hit for usize {
    fn record(self, highlight: &mut Highlight) {
        highlight.items.insert(self);
    }
}

/// Id-keyed visited/found sets for rendering a traversal in progress.
#[derive(Clone, Debug, Default)]
pub struct Highlight {
    nodes: HashMap<NodeId, Marks>,
    items: HashSet<usize>,
}

impl Highlight {
    /// An empty highlight set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one traversal step into the set.
    pub fn apply<F: Hit>(&mut self, step: TraversalStep<F>) {
        match step {
            TraversalStep::Visit(id) => {
                *self.nodes.entry(id).or_default() |= Marks::VISITED;
            }
            TraversalStep::Found(hit) => hit.record(self),
        }
    }

    /// Marks accumulated for `id`.
    pub fn marks(&self, id: NodeId) -> Marks {
        self.nodes.get(&id).copied().unwrap_or_default()
    }

    /// Whether the item slot was reported as found.
    pub fn is_item_found(&self, slot: usize) -> bool {
        self.items.contains(&slot)
    }

    /// Number of visited nodes.
    pub fn visited_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|m| m.contains(Marks::VISITED))
            .count()
    }

    /// Number of found nodes and items.
    pub fn found_count(&self) -> usize {
        self.nodes
            .values()
            .filter(|m| m.contains(Marks::FOUND))
            .count()
            + self.items.len()
    }

    /// Forget every mark.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.items.clear();
    }
}
