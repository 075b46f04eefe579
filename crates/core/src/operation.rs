//! Recorded mutations
//!
//! Every logical mutation inside a transaction appends one [`Operation`] to
//! the overlay's buffer, in request order. At commit the buffer is replayed
//! in fixed kind order (see [`in_commit_order`]) and the result is handed to
//! subscribers, who may replicate it elsewhere.

use crate::node::{Node, NodeId, NodePatch};
use serde::{Deserialize, Serialize};

/// Operation kind, ordered by commit precedence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Node creation
    Create,
    /// Field update
    Update,
    /// Reparenting
    Move,
    /// Node removal
    Delete,
}

impl OperationKind {
    /// Kinds in the order commit applies them
    pub const COMMIT_ORDER: [OperationKind; 4] = [
        OperationKind::Create,
        OperationKind::Update,
        OperationKind::Move,
        OperationKind::Delete,
    ];

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Create => "create",
            OperationKind::Update => "update",
            OperationKind::Move => "move",
            OperationKind::Delete => "delete",
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single recorded mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Operation {
    /// A node was created (full value at creation time)
    Create {
        /// The new node
        node: Node,
    },
    /// A node's fields were merged with a patch
    Update {
        /// Updated node
        node_id: NodeId,
        /// Fields that changed
        patch: NodePatch,
    },
    /// A node was reparented
    ///
    /// The parents' `content` edits are recorded as separate `Update`
    /// entries; replaying a move only rewrites the node's `parent_id`.
    Move {
        /// Moved node
        node_id: NodeId,
        /// Previous parent, if any
        from_parent: Option<NodeId>,
        /// New parent
        to_parent: NodeId,
        /// Index within the new parent's content
        position: usize,
    },
    /// A node was removed
    Delete {
        /// Removed node
        node_id: NodeId,
        /// Last visible value, for observers and undo
        node: Node,
    },
}

impl Operation {
    /// Kind of this operation
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Create { .. } => OperationKind::Create,
            Operation::Update { .. } => OperationKind::Update,
            Operation::Move { .. } => OperationKind::Move,
            Operation::Delete { .. } => OperationKind::Delete,
        }
    }

    /// Node this operation targets
    pub fn node_id(&self) -> &NodeId {
        match self {
            Operation::Create { node } => &node.id,
            Operation::Update { node_id, .. }
            | Operation::Move { node_id, .. }
            | Operation::Delete { node_id, .. } => node_id,
        }
    }
}

/// Reorder operations for commit: creates, updates, moves, deletes
///
/// The sort is stable, so request order is kept within each kind.
pub fn in_commit_order(mut ops: Vec<Operation>) -> Vec<Operation> {
    ops.sort_by_key(Operation::kind);
    ops
}
