//! Transaction-scoped aliases
//!
//! Lets one transaction refer to a node it is about to create by a symbolic
//! name, before any commit has assigned it a place in base. The table lives
//! in the overlay and is cleared at every commit and rollback.

use folio_core::{Error, NodeId, Result};
use rustc_hash::FxHashMap;

/// Mapping from caller-chosen names to node ids
#[derive(Debug, Clone, Default)]
pub struct AliasTable {
    entries: FxHashMap<String, NodeId>,
}

impl AliasTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `name` to `id`
    ///
    /// Rebinding to the same id is a no-op; rebinding to a different id
    /// fails with [`Error::DuplicateAlias`].
    pub fn set(&mut self, name: impl Into<String>, id: NodeId) -> Result<()> {
        let name = name.into();
        match self.entries.get(&name) {
            Some(existing) if *existing == id => Ok(()),
            Some(existing) => Err(Error::DuplicateAlias {
                alias: name,
                existing: existing.clone(),
                requested: id,
            }),
            None => {
                self.entries.insert(name, id);
                Ok(())
            }
        }
    }

    /// Resolve a name, falling through to the input when it is not an alias
    pub fn resolve(&self, name_or_id: &str) -> NodeId {
        self.entries
            .get(name_or_id)
            .cloned()
            .unwrap_or_else(|| NodeId::from(name_or_id))
    }

    /// Look up a name without fallthrough
    pub fn get(&self, name: &str) -> Option<&NodeId> {
        self.entries.get(name)
    }

    /// Remove a binding, returning its target
    pub fn remove(&mut self, name: &str) -> Option<NodeId> {
        self.entries.remove(name)
    }

    /// Remove every binding
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no bindings
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
