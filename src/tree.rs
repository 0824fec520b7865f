//! Shortest-path tree storage
//!
//! Entries live in an arena owned by one query and refer to their parent by
//! arena index. A parent is always settled before its child, so following
//! `parent` from any entry ends at a source.

use crate::graph::{EdgeId, NodeId};

/// Index into an arena
pub type EntryIdx = usize;

/// One node (or traversal id) of a single-source tree
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SptEntry {
    pub node: NodeId,
    /// Edge used to reach `node`, `None` at the source
    pub edge: Option<EdgeId>,
    pub weight: f64,
    pub parent: Option<EntryIdx>,
    /// Set once the entry is popped from the frontier
    pub visited: bool,
}

impl SptEntry {
    pub fn root(node: NodeId) -> Self {
        Self {
            node,
            edge: None,
            weight: 0.0,
            parent: None,
            visited: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SptArena {
    entries: Vec<SptEntry>,
}

impl SptArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: SptEntry) -> EntryIdx {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn get(&self, idx: EntryIdx) -> Option<&SptEntry> {
        self.entries.get(idx)
    }

    pub fn get_mut(&mut self, idx: EntryIdx) -> Option<&mut SptEntry> {
        self.entries.get_mut(idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Edges from the source to `idx`, in travel order
    pub fn path_edges(&self, idx: EntryIdx) -> Vec<EdgeId> {
        let mut edges = Vec::new();
        let mut cur = Some(idx);
        // a well-formed tree never needs more steps than it has entries
        for _ in 0..=self.entries.len() {
            let Some(entry) = cur.and_then(|i| self.entries.get(i)) else {
                break;
            };
            if let Some(edge) = entry.edge {
                edges.push(edge);
            }
            cur = entry.parent;
        }
        edges.reverse();
        edges
    }

    /// Nodes from the source to `idx`, in travel order
    pub fn path_nodes(&self, idx: EntryIdx) -> Vec<NodeId> {
        let mut nodes = Vec::new();
        let mut cur = Some(idx);
        for _ in 0..=self.entries.len() {
            let Some(entry) = cur.and_then(|i| self.entries.get(i)) else {
                break;
            };
            nodes.push(entry.node);
            cur = entry.parent;
        }
        nodes.reverse();
        nodes
    }
}

/// Per-source label held by a [`MultiTreeEntry`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeSlot {
    pub weight: f64,
    /// Edge used to reach the node for this source, `None` at the source itself
    pub edge: Option<EdgeId>,
    /// Arena index of the predecessor entry (same source slot)
    pub parent: Option<EntryIdx>,
    /// Slot changed since the node was last expanded
    pub update: bool,
}

impl TreeSlot {
    pub fn root() -> Self {
        Self {
            weight: 0.0,
            edge: None,
            parent: None,
            update: true,
        }
    }
}

/// One node of a many-to-many search, one optional slot per source
#[derive(Debug, Clone, PartialEq)]
pub struct MultiTreeEntry {
    pub node: NodeId,
    slots: Vec<Option<TreeSlot>>,
    pub visited: bool,
}

impl MultiTreeEntry {
    pub fn new(node: NodeId, sources: usize) -> Self {
        Self {
            node,
            slots: vec![None; sources],
            visited: false,
        }
    }

    pub fn slot(&self, source: usize) -> Option<&TreeSlot> {
        self.slots.get(source).and_then(Option::as_ref)
    }

    pub fn slots(&self) -> &[Option<TreeSlot>] {
        &self.slots
    }

    pub fn set_slot(&mut self, source: usize, slot: TreeSlot) {
        if let Some(s) = self.slots.get_mut(source) {
            *s = Some(slot);
        }
    }

    /// Drop the label for `source`; it reads as unreached afterwards
    pub fn clear_slot(&mut self, source: usize) {
        if let Some(s) = self.slots.get_mut(source) {
            *s = None;
        }
    }

    /// Smallest weight over set slots; the frontier key
    pub fn min_weight(&self) -> f64 {
        self.slots
            .iter()
            .flatten()
            .map(|s| s.weight)
            .fold(f64::INFINITY, f64::min)
    }

    pub fn all_set(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn any_update(&self) -> bool {
        self.slots.iter().flatten().any(|s| s.update)
    }

    pub fn reset_update(&mut self, value: bool) {
        for slot in self.slots.iter_mut().flatten() {
            slot.update = value;
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MultiTreeArena {
    entries: Vec<MultiTreeEntry>,
}

impl MultiTreeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: MultiTreeEntry) -> EntryIdx {
        self.entries.push(entry);
        self.entries.len() - 1
    }

    pub fn get(&self, idx: EntryIdx) -> Option<&MultiTreeEntry> {
        self.entries.get(idx)
    }

    pub fn get_mut(&mut self, idx: EntryIdx) -> Option<&mut MultiTreeEntry> {
        self.entries.get_mut(idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Edges from `source` to the entry at `idx`, in travel order
    ///
    /// Empty when the slot is unset or `idx` is the source itself.
    pub fn path_edges(&self, idx: EntryIdx, source: usize) -> Vec<EdgeId> {
        let mut edges = Vec::new();
        let mut cur = Some(idx);
        for _ in 0..=self.entries.len() {
            let Some(slot) = cur
                .and_then(|i| self.entries.get(i))
                .and_then(|e| e.slot(source))
            else {
                break;
            };
            if let Some(edge) = slot.edge {
                edges.push(edge);
            }
            cur = slot.parent;
        }
        edges.reverse();
        edges
    }
}
