//! Transaction controller
//!
//! [`DocumentStore`] owns the base table, the overlay, and the operation
//! subscribers, and sequences them through the transaction state machine:
//!
//! ```text
//! Idle ──begin──▶ Active ──commit──▶ Idle   (ops applied, then emitted)
//!                    └───rollback──▶ Idle   (overlay dropped, nothing emitted)
//! ```
//!
//! ## Read Path
//!
//! Inside a transaction every read goes overlay-then-base (see
//! [`folio_concurrency::Overlay::read`]). Outside one, reads go straight to
//! base.
//!
//! ## Write Path
//!
//! Inside a transaction writes land in the overlay and append to the
//! operation buffer. Outside one, each write runs as its own single-write
//! transaction: the base changes immediately and subscribers see the
//! resulting operations right away.
//!
//! The store does not lock anything itself. Callers sharing a store across
//! threads pair it with a [`folio_concurrency::WriteLock`]; see
//! [`crate::Database`].

use crate::options::StoreOptions;
use crate::subscribers::{SubscriptionId, Subscribers};
use folio_concurrency::{CommitReceipt, Overlay, TransactionManager, TransactionStatus};
use folio_core::{
    AcceptAll, Error, IdGenerator, Node, NodeId, Operation, Result, SchemaValidator,
};
use folio_storage::{NodeTable, Snapshot};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// In-memory transactional document store
pub struct DocumentStore {
    pub(crate) base: NodeTable,
    pub(crate) root_id: NodeId,
    pub(crate) overlay: Overlay,
    pub(crate) status: TransactionStatus,
    pub(crate) txn_id: Option<u64>,
    pub(crate) manager: TransactionManager,
    pub(crate) ids: IdGenerator,
    pub(crate) validator: Arc<dyn SchemaValidator>,
    pub(crate) subscribers: Subscribers,
    pub(crate) options: StoreOptions,
}

impl DocumentStore {
    /// Create a store with default options
    ///
    /// The base holds a single empty root element (`"root"` of type `"doc"`).
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    /// Create a store with explicit options
    pub fn with_options(options: StoreOptions) -> Self {
        let mut base = NodeTable::new();
        let root = Node::element(options.root_id.clone(), options.root_type.clone());
        base.set(root.id.clone(), root);

        DocumentStore {
            base,
            root_id: options.root_id.clone(),
            overlay: Overlay::new(),
            status: TransactionStatus::Idle,
            txn_id: None,
            manager: TransactionManager::new(),
            ids: IdGenerator::new(options.session_id.clone()),
            validator: Arc::new(AcceptAll),
            subscribers: Subscribers::default(),
            options,
        }
    }

    /// Create a store whose base is loaded from a snapshot
    pub fn from_snapshot(options: StoreOptions, snapshot: Snapshot) -> Result<Self> {
        let mut store = Self::with_options(options);
        store.restore_from_snapshot(snapshot)?;
        Ok(store)
    }

    /// Replace the schema validator
    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Configured options
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Current controller state
    pub fn status(&self) -> TransactionStatus {
        self.status
    }

    /// Check if a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.status.is_active()
    }

    /// Id of the open transaction
    pub fn transaction_id(&self) -> Option<u64> {
        self.txn_id
    }

    /// Committed version (bumped once per commit)
    pub fn version(&self) -> u64 {
        self.base.version()
    }

    /// Committed table, ignoring any open transaction
    pub fn base(&self) -> &NodeTable {
        &self.base
    }

    /// Transaction scratch state
    pub fn overlay(&self) -> &Overlay {
        &self.overlay
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Open a transaction
    ///
    /// Reentrant `begin` fails with [`Error::TransactionState`].
    pub fn begin(&mut self) -> Result<u64> {
        self.status.expect(TransactionStatus::Idle)?;
        self.overlay.reset();
        let txn_id = self.manager.next_txn_id();
        self.txn_id = Some(txn_id);
        self.status = TransactionStatus::Active;
        debug!(txn_id, "began transaction");
        Ok(txn_id)
    }

    /// Copy of the operations recorded so far, in request order
    ///
    /// Leaves the transaction open and the overlay untouched; may be called
    /// any number of times.
    pub fn end(&self) -> Result<Vec<Operation>> {
        self.status.expect(TransactionStatus::Active)?;
        let ops = self.overlay.operations().to_vec();
        debug!(txn_id = ?self.txn_id, operations = ops.len(), "ended transaction");
        Ok(ops)
    }

    /// Apply the transaction to base and notify subscribers
    pub fn commit(&mut self) -> Result<CommitReceipt> {
        self.status.expect(TransactionStatus::Active)?;
        self.status = TransactionStatus::Committing;
        let txn_id = self.txn_id.take().unwrap_or_default();
        let receipt = self.manager.commit(
            txn_id,
            &mut self.overlay,
            &mut self.base,
            &mut self.root_id,
        );
        self.status = TransactionStatus::Idle;
        self.subscribers.emit(&receipt.operations);
        Ok(receipt)
    }

    /// Discard the transaction
    ///
    /// Returns the number of discarded operations. Base is untouched and
    /// subscribers hear nothing.
    pub fn rollback(&mut self) -> Result<usize> {
        self.status.expect(TransactionStatus::Active)?;
        self.status = TransactionStatus::RollingBack;
        let txn_id = self.txn_id.take().unwrap_or_default();
        let discarded = self.manager.abort(txn_id, &mut self.overlay);
        self.status = TransactionStatus::Idle;
        Ok(discarded)
    }

    /// Run `f` inside the open transaction, or inside its own transaction
    /// when none is open
    ///
    /// A single write that recorded nothing is rolled back, so the version
    /// only moves when base changes.
    pub(crate) fn autocommit<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        if self.status.is_active() {
            return f(self);
        }
        self.begin()?;
        match f(self) {
            Ok(value) => {
                if self.overlay.operations().is_empty() && self.overlay.root_change().is_none() {
                    self.rollback()?;
                } else {
                    self.commit()?;
                }
                Ok(value)
            }
            Err(e) => {
                self.rollback()?;
                Err(e)
            }
        }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Visible value of a node (aliases resolved)
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        if !self.status.is_active() {
            return self.base.get(id);
        }
        let id = self.overlay.aliases().resolve(id);
        self.overlay.read(&self.base, id.as_str())
    }

    /// Check if a node is visible
    pub fn contains(&self, id: &str) -> bool {
        self.get_node(id).is_some()
    }

    pub(crate) fn visible(&self, id: &str) -> Option<&Node> {
        self.overlay.read(&self.base, id)
    }

    pub(crate) fn require(&self, id: &NodeId) -> Result<&Node> {
        self.visible(id.as_str())
            .ok_or_else(|| Error::NodeNotFound(id.clone()))
    }

    pub(crate) fn resolve(&self, id: &str) -> NodeId {
        self.overlay.aliases().resolve(id)
    }

    // ========================================================================
    // Copy-on-write and validation helpers
    // ========================================================================

    /// Overlay copy of a visible node, cloned from base on first touch
    pub(crate) fn cow(&mut self, id: &NodeId) -> Result<&mut Node> {
        if !self.overlay.is_present(id.as_str()) {
            let copy = self.require(id)?.clone();
            debug!(node_id = %id, "copy-on-write");
            self.overlay.insert_copy(copy);
        }
        self.overlay
            .present_mut(id.as_str())
            .ok_or_else(|| Error::NodeNotFound(id.clone()))
    }

    pub(crate) fn validate(&self, node: &Node) -> Result<()> {
        let outcome = self.validator.validate(node);
        if outcome.valid {
            return Ok(());
        }
        warn!(node_id = %node.id, node_type = %node.node_type, errors = ?outcome.errors, "schema rejected node");
        Err(Error::Validation {
            node_id: node.id.clone(),
            errors: outcome.errors,
        })
    }

    // ========================================================================
    // Root pointer
    // ========================================================================

    /// Root id, including a change pending in the open transaction
    pub fn root_id(&self) -> &NodeId {
        self.overlay.root_change().unwrap_or(&self.root_id)
    }

    /// Point the root at another visible node
    ///
    /// Applied immediately outside a transaction, at commit inside one.
    pub fn set_root_id(&mut self, id: &str) -> Result<()> {
        let id = self.resolve(id);
        self.require(&id)?;
        if self.status.is_active() {
            debug!(root = %id, "root change recorded");
            self.overlay.set_root_change(id);
        } else {
            info!(from = %self.root_id, to = %id, "root changed");
            self.root_id = id;
        }
        Ok(())
    }

    // ========================================================================
    // Aliases
    // ========================================================================

    /// Bind a transaction-scoped alias
    pub fn set_alias(&mut self, name: &str, id: &str) -> Result<()> {
        self.status.expect(TransactionStatus::Active)?;
        let target = self.resolve(id);
        if let Err(e) = self.overlay.aliases_mut().set(name, target) {
            warn!(alias = name, error = %e, "alias rejected");
            return Err(e);
        }
        Ok(())
    }

    /// Resolve an alias, falling through to the input
    pub fn resolve_alias(&self, name_or_id: &str) -> NodeId {
        self.resolve(name_or_id)
    }

    /// Remove an alias, returning its target
    pub fn delete_alias(&mut self, name: &str) -> Option<NodeId> {
        self.overlay.aliases_mut().remove(name)
    }

    /// Remove every alias
    pub fn clear_aliases(&mut self) {
        self.overlay.aliases_mut().clear();
    }

    // ========================================================================
    // Ids
    // ========================================================================

    /// Session prefix of generated ids
    pub fn session_id(&self) -> &str {
        self.ids.session_id()
    }

    /// Switch the id session (resets the counter)
    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.ids.set_session_id(session_id);
    }

    /// Mint a fresh id not visible in the store
    pub(crate) fn fresh_id(&mut self) -> NodeId {
        loop {
            let id = self.ids.next_id();
            if self.visible(id.as_str()).is_none() && !self.overlay.is_retired(id.as_str()) {
                return id;
            }
        }
    }

    // ========================================================================
    // Subscribers
    // ========================================================================

    /// Register a callback for committed operations
    ///
    /// Callbacks run on the committing thread while the store is borrowed;
    /// they must not call back into the same store.
    pub fn on_operation<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: Fn(&Operation) + Send + 'static,
    {
        self.subscribers.add(Box::new(callback))
    }

    /// Remove a callback; returns false if it was already gone
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    /// Number of registered callbacks
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Copy the committed state
    pub fn export_snapshot(&self) -> Result<Snapshot> {
        self.status.expect(TransactionStatus::Idle)?;
        Ok(Snapshot::from_table(&self.base, &self.root_id))
    }

    /// Replace the committed state
    ///
    /// The id generator is advanced past every restored id of its session.
    pub fn restore_from_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        self.status.expect(TransactionStatus::Idle)?;
        snapshot.validate()?;

        for id in snapshot.nodes.keys() {
            self.ids.observe(id);
        }
        let root_id = snapshot.root_id.clone();
        let nodes = snapshot.len();
        let version = snapshot.version;

        self.base = snapshot.into_table();
        self.root_id = root_id;
        info!(nodes, version, root = %self.root_id, "restored snapshot");
        Ok(())
    }
}

impl Default for DocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DocumentStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentStore")
            .field("root_id", &self.root_id)
            .field("status", &self.status)
            .field("version", &self.base.version())
            .field("nodes", &self.base.len())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}
