//! Transaction manager for applying overlays to base
//!
//! Provides atomic commit by replaying the overlay's operation buffer
//! against the base table in fixed kind order:
//! 1. Creates (every referenced node exists before anything touches it)
//! 2. Updates (fields overwritten, attributes merged key-wise)
//! 3. Pending root change
//! 4. Moves (`parent_id` rewritten)
//! 5. Deletes (never remove a node a same-transaction move still needs)
//!
//! ## Commit Sequence
//!
//! ```text
//! 1. take_operations()     - Drain the buffer (request order)
//! 2. in_commit_order()     - Stable sort by kind
//! 3. parent_owners()       - Find moves superseded by a later parent update
//! 4. replay                - Apply each entry to base
//! 5. next_version()        - Bump the base version once
//! 6. reset()               - Clear overlay and aliases
//! 7. Return CommitReceipt  - Caller emits receipt.operations
//! ```
//!
//! Replay cannot fail. Every entry was validated when it was recorded and
//! the single writer lock rules out interference, so an entry that finds
//! its node missing is logged and skipped instead of aborting half-way.

use crate::overlay::Overlay;
use folio_core::{in_commit_order, NodeId, Operation};
use folio_storage::NodeTable;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Outcome of a successful commit
#[derive(Debug, Clone, PartialEq)]
pub struct CommitReceipt {
    /// Transaction id
    pub txn_id: u64,
    /// Base version after the commit
    pub version: u64,
    /// Applied operations, in commit order
    pub operations: Vec<Operation>,
}

/// Which kind of entry last set a node's parent, in request order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParentOwner {
    Update,
    Move,
}

/// Manages transaction ids and the commit/abort protocol
///
/// The manager is stateless apart from the id counter; overlay and base are
/// passed in by the controller that owns them.
pub struct TransactionManager {
    /// Next transaction ID
    next_txn_id: AtomicU64,
}

impl TransactionManager {
    /// Create a new transaction manager
    pub fn new() -> Self {
        Self::with_txn_id(0)
    }

    /// Create a manager whose next id follows `max_txn_id`
    pub fn with_txn_id(max_txn_id: u64) -> Self {
        TransactionManager {
            next_txn_id: AtomicU64::new(max_txn_id + 1),
        }
    }

    /// Allocate next transaction ID
    pub fn next_txn_id(&self) -> u64 {
        self.next_txn_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Apply an overlay to base atomically
    ///
    /// # Arguments
    /// * `txn_id` - Id allocated at `begin`
    /// * `overlay` - Transaction state, reset on return
    /// * `base` - Committed table
    /// * `root_id` - Committed root pointer
    ///
    /// # Returns
    /// The receipt whose operations must be emitted to subscribers.
    pub fn commit(
        &self,
        txn_id: u64,
        overlay: &mut Overlay,
        base: &mut NodeTable,
        root_id: &mut NodeId,
    ) -> CommitReceipt {
        let requested = overlay.take_operations();
        let owners = parent_owners(&requested);
        let ordered = in_commit_order(requested);
        let mut root_change = overlay.take_root_change();

        for op in &ordered {
            if matches!(op, Operation::Move { .. } | Operation::Delete { .. }) {
                if let Some(new_root) = root_change.take() {
                    apply_root(root_id, new_root);
                }
            }
            apply(base, op, &owners);
        }
        if let Some(new_root) = root_change.take() {
            apply_root(root_id, new_root);
        }

        let version = base.next_version();
        overlay.reset();

        info!(
            txn_id,
            version,
            operations = ordered.len(),
            "committed transaction"
        );

        CommitReceipt {
            txn_id,
            version,
            operations: ordered,
        }
    }

    /// Discard an overlay without touching base
    ///
    /// Returns the number of discarded operations.
    pub fn abort(&self, txn_id: u64, overlay: &mut Overlay) -> usize {
        let discarded = overlay.operations().len();
        overlay.reset();
        debug!(txn_id, discarded, "rolled back transaction");
        discarded
    }
}

impl Default for TransactionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TransactionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionManager")
            .field("next_txn_id", &self.next_txn_id.load(Ordering::Relaxed))
            .finish()
    }
}

/// Record, per node, whether an update or a move set its parent last
///
/// Updates replay before moves, so a move followed by an explicit
/// `parent_id` update would otherwise undo the update.
fn parent_owners(ops: &[Operation]) -> FxHashMap<NodeId, ParentOwner> {
    let mut owners = FxHashMap::default();
    for op in ops {
        match op {
            Operation::Update { node_id, patch } if patch.parent_id.is_some() => {
                owners.insert(node_id.clone(), ParentOwner::Update);
            }
            Operation::Move { node_id, .. } => {
                owners.insert(node_id.clone(), ParentOwner::Move);
            }
            _ => {}
        }
    }
    owners
}

fn apply(base: &mut NodeTable, op: &Operation, owners: &FxHashMap<NodeId, ParentOwner>) {
    match op {
        Operation::Create { node } => {
            if base.set(node.id.clone(), node.clone()).is_some() {
                warn!(node_id = %node.id, "create replaced an existing base node");
            }
        }
        Operation::Update { node_id, patch } => match base.get_mut(node_id.as_str()) {
            Some(node) => patch.apply_to(node),
            None => warn!(%node_id, "update skipped, node missing from base"),
        },
        Operation::Move {
            node_id, to_parent, ..
        } => {
            if owners.get(node_id) == Some(&ParentOwner::Update) {
                debug!(%node_id, "move superseded by a later parent update");
                return;
            }
            match base.get_mut(node_id.as_str()) {
                Some(node) => node.parent_id = Some(to_parent.clone()),
                None => warn!(%node_id, "move skipped, node missing from base"),
            }
        }
        Operation::Delete { node_id, .. } => {
            if !base.delete(node_id.as_str()) {
                warn!(%node_id, "delete skipped, node missing from base");
            }
        }
    }
}

fn apply_root(root_id: &mut NodeId, new_root: NodeId) {
    debug!(from = %root_id, to = %new_root, "root changed");
    *root_id = new_root;
}
