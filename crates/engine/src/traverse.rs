//! Overlay-aware tree traversal
//!
//! All walks use the same read path as [`DocumentStore::get_node`], so inside
//! a transaction they see in-flight structure. Dangling child references are
//! skipped rather than reported.

use crate::store::DocumentStore;
use folio_core::{Node, Result};
use rustc_hash::FxHashSet;

impl DocumentStore {
    /// Visible children, in content order
    pub fn children(&self, id: &str) -> Result<Vec<&Node>> {
        let id = self.resolve(id);
        let node = self.require(&id)?;
        Ok(node
            .child_ids()
            .iter()
            .filter_map(|c| self.visible(c.as_str()))
            .collect())
    }

    /// Visible parent, if any
    pub fn parent(&self, id: &str) -> Result<Option<&Node>> {
        let id = self.resolve(id);
        let node = self.require(&id)?;
        Ok(node
            .parent_id
            .as_ref()
            .and_then(|p| self.visible(p.as_str())))
    }

    /// Parent chain, nearest first
    pub fn ancestors(&self, id: &str) -> Result<Vec<&Node>> {
        let id = self.resolve(id);
        let mut cursor = self.require(&id)?;
        let mut seen = FxHashSet::default();
        seen.insert(&cursor.id);

        let mut out = Vec::new();
        while let Some(parent) = cursor
            .parent_id
            .as_ref()
            .and_then(|p| self.visible(p.as_str()))
        {
            if !seen.insert(&parent.id) {
                break;
            }
            out.push(parent);
            cursor = parent;
        }
        Ok(out)
    }

    /// Every visible descendant, pre-order, excluding the node itself
    pub fn descendants(&self, id: &str) -> Result<Vec<&Node>> {
        let id = self.resolve(id);
        self.require(&id)?;
        Ok(self
            .subtree_ids(&id)
            .into_iter()
            .skip(1)
            .filter_map(|d| self.visible(d.as_str()))
            .collect())
    }
}
