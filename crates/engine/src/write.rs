//! Structural write path: create, insert, update, delete, move
//!
//! Every mutation follows the same shape:
//!
//! ```text
//! resolve aliases → check visibility → validate → copy-on-write → record
//! ```
//!
//! Outside a transaction each call is wrapped in its own single-write
//! transaction (see [`DocumentStore::autocommit`]).

use crate::store::DocumentStore;
use folio_core::{Child, Error, Node, NodeDraft, NodeId, NodePatch, Operation, Result};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

impl DocumentStore {
    // ========================================================================
    // Create
    // ========================================================================

    /// Create a node (and any inline children) without linking it anywhere
    ///
    /// Inline children are created first, depth-first, with `parent_id` set
    /// to the new node, and replaced by id references in its `content`. If
    /// any node in the tree is rejected, none of them are kept.
    pub fn create_node(&mut self, draft: NodeDraft) -> Result<NodeId> {
        self.autocommit(|store| store.create_tree(draft, None))
    }

    /// Create a node and link it into `parent` at `position`
    ///
    /// The position is clamped to the parent's content length.
    pub fn insert_node(&mut self, parent: &str, position: usize, draft: NodeDraft) -> Result<NodeId> {
        let parent = parent.to_string();
        self.autocommit(move |store| {
            let parent = store.resolve(&parent);
            let content = store.require(&parent)?.content.clone().ok_or_else(|| {
                Error::InvalidMove {
                    node_id: parent.clone(),
                    reason: "parent cannot hold children".into(),
                }
            })?;

            let id = store.create_tree(draft, Some(parent.clone()))?;
            let mut content = content;
            let at = position.min(content.len());
            content.insert(at, id.clone());
            store.update_in_txn(&parent, NodePatch::new().content(content))?;
            Ok(id)
        })
    }

    fn create_tree(&mut self, draft: NodeDraft, parent: Option<NodeId>) -> Result<NodeId> {
        let mark = self.overlay.operations().len();
        let mut created = Vec::new();
        let mut claimed = FxHashSet::default();
        let result = self.create_one(draft, parent, &mut created, &mut claimed);
        if result.is_err() {
            for id in created.iter().rev() {
                self.overlay.discard_created(id);
            }
            self.overlay.truncate_operations(mark);
        }
        result
    }

    fn create_one(
        &mut self,
        draft: NodeDraft,
        parent: Option<NodeId>,
        created: &mut Vec<NodeId>,
        claimed: &mut FxHashSet<NodeId>,
    ) -> Result<NodeId> {
        let id = match draft.id {
            Some(id) => {
                // Ids dropped earlier in this transaction stay reserved until commit
                let taken = self.visible(id.as_str()).is_some()
                    || self.overlay.is_retired(id.as_str())
                    || claimed.contains(&id);
                if taken {
                    warn!(node_id = %id, "create rejected, id taken");
                    return Err(Error::NodeExists(id));
                }
                self.ids.observe(&id);
                id
            }
            None => self.fresh_id(),
        };
        claimed.insert(id.clone());

        let parent_id = match parent {
            Some(parent) => Some(parent),
            None => draft.parent_id.map(|p| self.resolve(p.as_str())),
        };

        let content = match draft.content {
            Some(children) => {
                let mut ids = Vec::with_capacity(children.len());
                for child in children {
                    let child_id = match child {
                        Child::Ref(child_id) => self.resolve(child_id.as_str()),
                        Child::Inline(child) => {
                            self.create_one(*child, Some(id.clone()), created, claimed)?
                        }
                    };
                    ids.push(child_id);
                }
                Some(ids)
            }
            None => None,
        };

        let node = Node {
            id: id.clone(),
            node_type: draft.node_type,
            parent_id,
            content,
            text: draft.text,
            attributes: draft.attributes,
            marks: draft.marks,
        };
        self.validate(&node)?;

        debug!(node_id = %id, node_type = %node.node_type, "created node");
        self.overlay.insert_created(node.clone());
        self.overlay.record(Operation::Create { node });
        created.push(id.clone());
        Ok(id)
    }

    // ========================================================================
    // Update
    // ========================================================================

    /// Merge a patch into a node
    ///
    /// Returns false when the patch would change nothing; in that case no
    /// copy is made and no operation is recorded.
    pub fn update_node(&mut self, id: &str, patch: NodePatch) -> Result<bool> {
        let id = id.to_string();
        self.autocommit(move |store| {
            let id = store.resolve(&id);
            store.update_in_txn(&id, patch)
        })
    }

    pub(crate) fn update_in_txn(&mut self, id: &NodeId, patch: NodePatch) -> Result<bool> {
        let current = self.require(id)?;
        if !patch.changes(current) {
            debug!(node_id = %id, "update is a no-op");
            return Ok(false);
        }

        let mut updated = current.clone();
        patch.apply_to(&mut updated);
        if self.options.validate_updates && !patch.is_structural_only() {
            self.validate(&updated)?;
        }

        *self.cow(id)? = updated;
        self.overlay.record(Operation::Update {
            node_id: id.clone(),
            patch,
        });
        Ok(true)
    }

    // ========================================================================
    // Delete
    // ========================================================================

    /// Delete a node and its descendants
    ///
    /// The node is unlinked from its parent's content. Returns the number of
    /// nodes removed.
    pub fn delete_node(&mut self, id: &str) -> Result<usize> {
        let id = id.to_string();
        self.autocommit(move |store| {
            let id = store.resolve(&id);
            store.delete_in_txn(&id)
        })
    }

    fn delete_in_txn(&mut self, id: &NodeId) -> Result<usize> {
        let root = self.root_id().clone();
        if *id == root {
            warn!(node_id = %id, "root deletion rejected");
            return Err(Error::RootDeletion(id.clone()));
        }

        let node = self.require(id)?;
        let parent_id = node.parent_id.clone();
        let subtree = self.subtree_ids(id);
        if subtree.contains(&root) {
            warn!(node_id = %id, root = %root, "deletion would remove the root");
            return Err(Error::RootDeletion(root));
        }

        if let Some(parent_id) = parent_id {
            let unlinked = self.visible(parent_id.as_str()).and_then(|parent| {
                parent.position_of(id).map(|_| {
                    parent
                        .child_ids()
                        .iter()
                        .filter(|c| *c != id)
                        .cloned()
                        .collect::<Vec<_>>()
                })
            });
            if let Some(content) = unlinked {
                self.update_in_txn(&parent_id, NodePatch::new().content(content))?;
            }
        }

        for node_id in &subtree {
            let Some(node) = self.visible(node_id.as_str()).cloned() else {
                continue;
            };
            self.overlay.mark_deleted(node_id);
            self.overlay.record(Operation::Delete {
                node_id: node_id.clone(),
                node,
            });
        }
        debug!(node_id = %id, removed = subtree.len(), "deleted subtree");
        Ok(subtree.len())
    }

    /// The node followed by its visible descendants, pre-order
    pub(crate) fn subtree_ids(&self, id: &NodeId) -> Vec<NodeId> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        let mut stack = vec![id.clone()];
        while let Some(next) = stack.pop() {
            if !seen.insert(next.clone()) {
                continue;
            }
            let Some(node) = self.visible(next.as_str()) else {
                continue;
            };
            stack.extend(node.child_ids().iter().rev().cloned());
            out.push(next);
        }
        out
    }

    // ========================================================================
    // Move
    // ========================================================================

    /// Reparent a node under `to_parent` at `position`
    ///
    /// The position is clamped to the target's content length (after the
    /// node has been removed from it, for moves within one parent).
    pub fn move_node(&mut self, id: &str, to_parent: &str, position: usize) -> Result<()> {
        let (id, to_parent) = (id.to_string(), to_parent.to_string());
        self.autocommit(move |store| {
            let id = store.resolve(&id);
            let to_parent = store.resolve(&to_parent);
            store.move_in_txn(&id, &to_parent, position)
        })
    }

    fn move_in_txn(&mut self, id: &NodeId, to_parent: &NodeId, position: usize) -> Result<()> {
        let invalid = |reason: &str| Error::InvalidMove {
            node_id: id.clone(),
            reason: reason.to_string(),
        };

        let from_parent = self.require(id)?.parent_id.clone();
        if id == self.root_id() {
            warn!(node_id = %id, "move of root rejected");
            return Err(invalid("cannot move the root"));
        }
        let target = self
            .visible(to_parent.as_str())
            .ok_or_else(|| invalid("target parent does not exist"))?;
        let mut target_content = target
            .content
            .clone()
            .ok_or_else(|| invalid("target parent cannot hold children"))?;
        if to_parent == id || self.is_ancestor(id, to_parent) {
            warn!(node_id = %id, to_parent = %to_parent, "move would create a cycle");
            return Err(invalid("target is the node itself or one of its descendants"));
        }

        let same_parent = from_parent.as_ref() == Some(to_parent);
        if same_parent {
            target_content.retain(|c| c != id);
        } else if let Some(from) = &from_parent {
            let old_content = self.visible(from.as_str()).and_then(|p| {
                p.position_of(id)
                    .map(|_| p.child_ids().iter().filter(|c| *c != id).cloned().collect::<Vec<_>>())
            });
            if let Some(content) = old_content {
                self.update_in_txn(from, NodePatch::new().content(content))?;
            }
        }

        let at = position.min(target_content.len());
        target_content.insert(at, id.clone());
        let relinked = self.update_in_txn(to_parent, NodePatch::new().content(target_content))?;

        if same_parent && !relinked {
            debug!(node_id = %id, "move is a no-op");
            return Ok(());
        }

        self.cow(id)?.parent_id = Some(to_parent.clone());
        self.overlay.record(Operation::Move {
            node_id: id.clone(),
            from_parent,
            to_parent: to_parent.clone(),
            position: at,
        });
        Ok(())
    }

    /// Check if `ancestor` is on `id`'s parent chain
    pub(crate) fn is_ancestor(&self, ancestor: &NodeId, id: &NodeId) -> bool {
        let mut seen = FxHashSet::default();
        let mut cursor = self.visible(id.as_str()).and_then(|n| n.parent_id.clone());
        while let Some(current) = cursor {
            if current == *ancestor {
                return true;
            }
            if !seen.insert(current.clone()) {
                return false;
            }
            cursor = self
                .visible(current.as_str())
                .and_then(|n| n.parent_id.clone());
        }
        false
    }
}
