//! Main entry point for folio.
//!
//! This module provides the `Folio` struct, a cloneable handle to one
//! transactional document store and its write lock.

use folio_concurrency::LockStats;
use folio_core::{Node, NodeId, Operation, Result, SchemaValidator};
use folio_engine::{Database, DocumentStore, StoreOptions, SubscriptionId};
use folio_storage::Snapshot;
use std::sync::Arc;
use std::time::Duration;

/// Owner name used for lock grants taken by the facade itself
const FACADE_OWNER: &str = "folio";

/// The folio document store.
///
/// Create a store using [`Folio::open`] or [`Folio::builder`]. Handles are
/// cheap to clone and share the same underlying database.
///
/// # Example
///
/// ```ignore
/// use foliodb::prelude::*;
///
/// let doc = Folio::open()?;
///
/// doc.transaction("editor", |txn| {
///     let p = txn.insert_node("root", 0, NodeDraft::text("paragraph", "Hello"))?;
///     txn.insert_text(p.as_str(), 5, " World")
/// })?;
///
/// let bytes = doc.save()?;
/// ```
#[derive(Clone)]
pub struct Folio {
    inner: Arc<Database>,
}

impl Folio {
    /// Open an empty store with default settings.
    ///
    /// The store holds a single empty root element `"root"` of type `"doc"`.
    pub fn open() -> Result<Self> {
        Self::builder().open()
    }

    /// Create a builder for store configuration.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let doc = Folio::builder()
    ///     .session_id("replica-a")
    ///     .lock_timeout(Duration::from_secs(1))
    ///     .validator(schema)
    ///     .open()?;
    /// ```
    pub fn builder() -> FolioBuilder {
        FolioBuilder::new()
    }

    /// Run `f` as one transaction.
    ///
    /// Acquires the write lock (FIFO), begins, runs `f`, then commits on
    /// `Ok` or rolls back on `Err`. The lock is always released.
    pub fn transaction<T, F>(&self, owner: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut DocumentStore) -> Result<T>,
    {
        self.inner.transaction(owner, f)
    }

    /// Committed value of a node.
    pub fn get_node(&self, id: &str) -> Option<Node> {
        self.inner.get_node(id)
    }

    /// Committed root id.
    pub fn root_id(&self) -> NodeId {
        self.inner.root_id()
    }

    /// Committed version.
    pub fn version(&self) -> u64 {
        self.inner.version()
    }

    /// Register a callback for committed operations.
    pub fn on_operation<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Operation) + Send + 'static,
    {
        self.inner.on_operation(callback)
    }

    /// Remove a callback.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.unsubscribe(id)
    }

    /// Copy the committed state.
    pub fn export_snapshot(&self) -> Result<Snapshot> {
        self.inner.export_snapshot()
    }

    /// Replace the committed state.
    pub fn restore_from_snapshot(&self, snapshot: Snapshot) -> Result<()> {
        self.inner.restore_from_snapshot(FACADE_OWNER, snapshot)
    }

    /// Encode the committed state as checksummed bytes.
    pub fn save(&self) -> Result<Vec<u8>> {
        self.export_snapshot()?.to_bytes()
    }

    /// Replace the committed state from bytes produced by [`Folio::save`].
    pub fn load(&self, bytes: &[u8]) -> Result<()> {
        self.restore_from_snapshot(Snapshot::from_bytes(bytes)?)
    }

    /// Write lock counters.
    pub fn lock_stats(&self) -> LockStats {
        self.inner.lock_stats()
    }

    /// The underlying engine database.
    pub fn database(&self) -> &Arc<Database> {
        &self.inner
    }
}

impl std::fmt::Debug for Folio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Folio")
            .field("root_id", &self.root_id())
            .field("version", &self.version())
            .finish()
    }
}

/// Builder for store configuration.
///
/// # Example
///
/// ```ignore
/// // Short lock budget, every update validated
/// let doc = Folio::builder().strict().open()?;
///
/// // Resume from saved bytes
/// let doc = Folio::builder()
///     .snapshot(Snapshot::from_bytes(&bytes)?)
///     .open()?;
/// ```
pub struct FolioBuilder {
    options: StoreOptions,
    validator: Option<Arc<dyn SchemaValidator>>,
    snapshot: Option<Snapshot>,
}

impl FolioBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            options: StoreOptions::default(),
            validator: None,
            snapshot: None,
        }
    }

    /// Set the session prefix for generated ids.
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.options.session_id = session_id.into();
        self
    }

    /// Use a random UUID v4 session prefix.
    pub fn random_session(mut self) -> Self {
        self.options.session_id = folio_core::IdGenerator::random_session()
            .session_id()
            .to_string();
        self
    }

    /// Set the root node created on open.
    pub fn root(mut self, root_id: impl Into<NodeId>, root_type: impl Into<String>) -> Self {
        self.options.root_id = root_id.into();
        self.options.root_type = root_type.into();
        self
    }

    /// Set the write lock wait budget.
    pub fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.options.lock_timeout = timeout;
        self
    }

    /// Set the schema validator.
    pub fn validator(mut self, validator: impl SchemaValidator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Enable or disable validation of non-structural updates.
    pub fn validate_updates(mut self, enabled: bool) -> Self {
        self.options.validate_updates = enabled;
        self
    }

    /// Use strict options (1 s lock budget, updates validated).
    ///
    /// Keeps the session and root already configured.
    pub fn strict(mut self) -> Self {
        self.options = StoreOptions {
            session_id: self.options.session_id,
            root_id: self.options.root_id,
            root_type: self.options.root_type,
            ..StoreOptions::strict()
        };
        self
    }

    /// Use relaxed options (30 s lock budget, updates not validated).
    ///
    /// Keeps the session and root already configured.
    pub fn relaxed(mut self) -> Self {
        self.options = StoreOptions {
            session_id: self.options.session_id,
            root_id: self.options.root_id,
            root_type: self.options.root_type,
            ..StoreOptions::relaxed()
        };
        self
    }

    /// Start from a snapshot instead of an empty root.
    pub fn snapshot(mut self, snapshot: Snapshot) -> Self {
        self.snapshot = Some(snapshot);
        self
    }

    /// Open the store.
    pub fn open(self) -> Result<Folio> {
        let mut store = match self.snapshot {
            Some(snapshot) => DocumentStore::from_snapshot(self.options, snapshot)?,
            None => DocumentStore::with_options(self.options),
        };
        if let Some(validator) = self.validator {
            store = store.with_validator(validator);
        }
        Ok(Folio {
            inner: Arc::new(Database::new(store)),
        })
    }
}

impl Default for FolioBuilder {
    fn default() -> Self {
        Self::new()
    }
}
