//! Copy-on-write overlay
//!
//! Transaction-scoped scratch space layered over the base table. Reads go
//! overlay-then-base; writes only ever land here until commit.
//!
//! ## Id Sets
//!
//! Every id is in exactly one logical set while a transaction is active:
//!
//! | Set | Meaning | Read result |
//! |-----|---------|-------------|
//! | deleted | removed in this transaction | absent |
//! | present | created or updated in this transaction | overlay copy |
//! | untouched | everything else | base copy (or absent) |
//!
//! Ids created and then deleted inside the same transaction are simply
//! dropped from `present`; base never knew them, so no tombstone is kept.
//! They are remembered as dropped so the id cannot be created again before
//! commit.
//!
//! The overlay is reset, not reallocated, between transactions so map
//! capacity is reused.

use crate::alias::AliasTable;
use folio_core::{Node, NodeId, Operation};
use folio_storage::NodeTable;
use rustc_hash::{FxHashMap, FxHashSet};

/// Where an id currently resolves within the overlay
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lookup<'a> {
    /// Removed in this transaction
    Deleted,
    /// Created or updated in this transaction
    Present(&'a Node),
    /// Not touched; read base
    Untouched,
}

/// Transaction-scoped scratch state
#[derive(Debug, Default)]
pub struct Overlay {
    present: FxHashMap<NodeId, Node>,
    deleted: FxHashSet<NodeId>,
    created: FxHashSet<NodeId>,
    dropped: FxHashSet<NodeId>,
    root_change: Option<NodeId>,
    operations: Vec<Operation>,
    aliases: AliasTable,
}

impl Overlay {
    /// Create an empty overlay
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every set, the operation buffer and the alias table
    pub fn reset(&mut self) {
        self.present.clear();
        self.deleted.clear();
        self.created.clear();
        self.dropped.clear();
        self.root_change = None;
        self.operations.clear();
        self.aliases.clear();
    }

    /// Classify an id
    pub fn lookup(&self, id: &str) -> Lookup<'_> {
        if self.deleted.contains(id) {
            Lookup::Deleted
        } else if let Some(node) = self.present.get(id) {
            Lookup::Present(node)
        } else {
            Lookup::Untouched
        }
    }

    /// Overlay-then-base read
    ///
    /// 1. deleted → `None`
    /// 2. present → overlay copy
    /// 3. otherwise → base copy
    pub fn read<'a>(&'a self, base: &'a NodeTable, id: &str) -> Option<&'a Node> {
        match self.lookup(id) {
            Lookup::Deleted => None,
            Lookup::Present(node) => Some(node),
            Lookup::Untouched => base.get(id),
        }
    }

    /// Check if an id has an overlay copy
    pub fn is_present(&self, id: &str) -> bool {
        self.present.contains_key(id)
    }

    /// Check if an id was deleted in this transaction
    pub fn is_deleted(&self, id: &str) -> bool {
        self.deleted.contains(id)
    }

    /// Check if an id was created in this transaction
    pub fn was_created(&self, id: &str) -> bool {
        self.created.contains(id)
    }

    /// Check if an id was created and then deleted in this transaction
    pub fn was_dropped(&self, id: &str) -> bool {
        self.dropped.contains(id)
    }

    /// Check if an id has been used by this transaction in a way that rules
    /// out creating it again (tombstoned or dropped)
    pub fn is_retired(&self, id: &str) -> bool {
        self.deleted.contains(id) || self.dropped.contains(id)
    }

    /// Mutable access to an existing overlay copy
    pub fn present_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.present.get_mut(id)
    }

    /// Store a copy of an existing node (the clone step of copy-on-write)
    pub fn insert_copy(&mut self, node: Node) {
        self.present.insert(node.id.clone(), node);
    }

    /// Store a node created in this transaction
    pub fn insert_created(&mut self, node: Node) {
        self.created.insert(node.id.clone());
        self.present.insert(node.id.clone(), node);
    }

    /// Remove an id from view
    ///
    /// Ids created in this transaction are dropped outright and stay reserved
    /// until reset; anything that may exist in base gets a tombstone. Returns
    /// the dropped overlay copy.
    pub fn mark_deleted(&mut self, id: &NodeId) -> Option<Node> {
        let removed = self.present.remove(id);
        if self.created.remove(id) {
            self.dropped.insert(id.clone());
        } else {
            self.deleted.insert(id.clone());
        }
        removed
    }

    /// Undo a creation that never became visible to the caller
    ///
    /// Unlike [`Overlay::mark_deleted`] the id stays free for a later create.
    pub fn discard_created(&mut self, id: &NodeId) -> Option<Node> {
        if !self.created.remove(id) {
            return None;
        }
        self.present.remove(id)
    }

    /// Append to the operation buffer
    pub fn record(&mut self, op: Operation) {
        self.operations.push(op);
    }

    /// Recorded operations, in request order
    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Drain the operation buffer
    pub fn take_operations(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.operations)
    }

    /// Drop every operation recorded after the first `len`
    pub fn truncate_operations(&mut self, len: usize) {
        self.operations.truncate(len);
    }

    /// Record a pending root change
    pub fn set_root_change(&mut self, id: NodeId) {
        self.root_change = Some(id);
    }

    /// Pending root change, if any
    pub fn root_change(&self) -> Option<&NodeId> {
        self.root_change.as_ref()
    }

    /// Drain the pending root change
    pub fn take_root_change(&mut self) -> Option<NodeId> {
        self.root_change.take()
    }

    /// Alias table
    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    /// Mutable alias table
    pub fn aliases_mut(&mut self) -> &mut AliasTable {
        &mut self.aliases
    }

    /// Number of overlay copies
    pub fn present_len(&self) -> usize {
        self.present.len()
    }

    /// Number of tombstones
    pub fn deleted_len(&self) -> usize {
        self.deleted.len()
    }

    /// Overlay copies, in arbitrary order
    pub fn present_nodes(&self) -> impl Iterator<Item = &Node> {
        self.present.values()
    }

    /// Tombstoned ids, in arbitrary order
    pub fn deleted_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.deleted.iter()
    }

    /// Check if nothing has been written
    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
            && self.deleted.is_empty()
            && self.dropped.is_empty()
            && self.root_change.is_none()
            && self.operations.is_empty()
    }
}
