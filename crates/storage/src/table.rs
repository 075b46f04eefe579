//! Base node table
//!
//! The committed mapping from node id to node value: the ground truth
//! outside any transaction. It is a passive map with no validation and no
//! locking; only the transaction controller's commit step mutates it.
//!
//! # Design
//!
//! - FxHashMap: O(1) lookups, fast non-crypto hash
//! - Version counter: bumped once per committed transaction
//! - Listing sorts by id for deterministic output

use folio_core::{Node, NodeId};
use rustc_hash::FxHashMap;

/// Committed node storage
pub struct NodeTable {
    nodes: FxHashMap<NodeId, Node>,
    version: u64,
}

impl NodeTable {
    /// Create an empty table at version 0
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            version: 0,
        }
    }

    /// Create a table with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            version: 0,
        }
    }

    /// Current version
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Increment version and return the new value
    #[inline]
    pub fn next_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Set version (used when restoring a snapshot)
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get a node by id
    #[inline]
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Get a mutable node by id
    #[inline]
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Insert or replace a node under `id`
    ///
    /// Returns the previous value, if any.
    #[inline]
    pub fn set(&mut self, id: NodeId, node: Node) -> Option<Node> {
        self.nodes.insert(id, node)
    }

    /// Remove a node
    ///
    /// Returns false if the id was not present.
    #[inline]
    pub fn delete(&mut self, id: &str) -> bool {
        self.nodes.remove(id).is_some()
    }

    /// Check if a node exists
    #[inline]
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Iterate over all nodes in arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.nodes.iter()
    }

    /// All ids, sorted
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<_> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// All nodes, sorted by id
    ///
    /// NOTE: O(n log n). Not for hot paths.
    pub fn list(&self) -> Vec<Node> {
        let mut nodes: Vec<_> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }

    /// Remove every node (version is kept)
    pub fn clear(&mut self) {
        self.nodes.clear();
    }
}

impl Default for NodeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for NodeTable {
    fn clone(&self) -> Self {
        Self {
            nodes: self.nodes.clone(),
            version: self.version,
        }
    }
}

impl FromIterator<Node> for NodeTable {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        let mut table = NodeTable::new();
        for node in iter {
            table.set(node.id.clone(), node);
        }
        table
    }
}

impl std::fmt::Debug for NodeTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeTable")
            .field("len", &self.len())
            .field("version", &self.version())
            .finish()
    }
}
