//! Shared store with its write lock
//!
//! [`Database`] pairs one [`DocumentStore`] with the [`WriteLock`] that
//! serializes its writers. Each database owns its own lock; there is no
//! process-wide lock state.
//!
//! ## Transaction Sequence
//!
//! ```text
//! 1. acquire(owner)   - FIFO, may block up to the lock timeout
//! 2. begin()          - Idle → Active
//! 3. closure runs     - reads/writes through the overlay
//! 4. commit()         - on Ok: replay, bump version, notify subscribers
//!    rollback()       - on Err: discard overlay
//! 5. release(lock_id) - always, including error paths
//! ```

use crate::options::StoreOptions;
use crate::store::DocumentStore;
use crate::subscribers::SubscriptionId;
use folio_concurrency::{LockId, LockStats, WriteLock};
use folio_core::{Node, NodeId, Operation, Result};
use folio_storage::Snapshot;
use parking_lot::{Mutex, MutexGuard};
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// A document store guarded by a FIFO write lock
#[derive(Debug)]
pub struct Database {
    lock: WriteLock,
    store: Mutex<DocumentStore>,
}

impl Database {
    /// Wrap a store; the lock uses the store's configured timeout
    pub fn new(store: DocumentStore) -> Self {
        let lock = WriteLock::with_options(store.options().lock_options());
        Database {
            lock,
            store: Mutex::new(store),
        }
    }

    /// Create a database over a fresh store
    pub fn with_options(options: StoreOptions) -> Self {
        Self::new(DocumentStore::with_options(options))
    }

    /// The write lock
    pub fn lock(&self) -> &WriteLock {
        &self.lock
    }

    /// Acquire the write lock (blocks while queued)
    pub fn acquire(&self, owner: &str) -> Result<LockId> {
        self.lock.acquire(owner)
    }

    /// Release the write lock
    pub fn release(&self, lock_id: LockId) -> Result<()> {
        self.lock.release(Some(lock_id))
    }

    /// Lock counters
    pub fn lock_stats(&self) -> LockStats {
        self.lock.stats()
    }

    /// Direct access to the store
    ///
    /// Callers driving `begin`/`commit` by hand must hold the write lock
    /// (see [`Database::acquire`]) for the whole transaction.
    pub fn store(&self) -> MutexGuard<'_, DocumentStore> {
        self.store.lock()
    }

    /// Run `f` as one transaction under the write lock
    ///
    /// Commits when `f` returns `Ok`, rolls back when it returns `Err`, and
    /// releases the lock in both cases. If `f` commits or rolls back on its
    /// own, the closing step is skipped.
    pub fn transaction<T, F>(&self, owner: &str, f: F) -> Result<T>
    where
        F: FnOnce(&mut DocumentStore) -> Result<T>,
    {
        let guard = self.lock.acquire_guard(owner)?;
        let mut store = RollbackOnDrop {
            store: self.store.lock(),
            owner,
        };
        store.begin()?;

        let result = f(&mut *store);
        if store.in_transaction() {
            match &result {
                Ok(_) => {
                    store.commit()?;
                }
                Err(e) => {
                    warn!(owner, error = %e, "transaction failed, rolling back");
                    store.rollback()?;
                }
            }
        }
        drop(store);
        guard.release()?;
        result
    }

    // ========================================================================
    // Committed reads
    // ========================================================================

    /// Committed value of a node
    ///
    /// Reads base only; an in-flight transaction is never visible here.
    pub fn get_node(&self, id: &str) -> Option<Node> {
        self.store.lock().base().get(id).cloned()
    }

    /// Committed root id
    pub fn root_id(&self) -> NodeId {
        self.store.lock().root_id.clone()
    }

    /// Committed version
    pub fn version(&self) -> u64 {
        self.store.lock().version()
    }

    // ========================================================================
    // Store-level passthroughs
    // ========================================================================

    /// Register a callback for committed operations
    ///
    /// Callbacks run while the store is locked and must not call back into
    /// this database.
    pub fn on_operation<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Operation) + Send + 'static,
    {
        self.store.lock().on_operation(callback)
    }

    /// Remove a callback
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.store.lock().unsubscribe(id)
    }

    /// Copy the committed state
    pub fn export_snapshot(&self) -> Result<Snapshot> {
        self.store.lock().export_snapshot()
    }

    /// Replace the committed state under the write lock
    pub fn restore_from_snapshot(&self, owner: &str, snapshot: Snapshot) -> Result<()> {
        let guard = self.lock.acquire_guard(owner)?;
        self.store.lock().restore_from_snapshot(snapshot)?;
        guard.release()
    }
}

impl Default for Database {
    fn default() -> Self {
        Self::new(DocumentStore::new())
    }
}

/// Store guard that rolls back an open transaction when dropped
///
/// Covers the unwind path: a panicking closure must not leave the store
/// `Active` for the next writer.
struct RollbackOnDrop<'a> {
    store: MutexGuard<'a, DocumentStore>,
    owner: &'a str,
}

impl Deref for RollbackOnDrop<'_> {
    type Target = DocumentStore;

    fn deref(&self) -> &DocumentStore {
        &self.store
    }
}

impl DerefMut for RollbackOnDrop<'_> {
    fn deref_mut(&mut self) -> &mut DocumentStore {
        &mut self.store
    }
}

impl Drop for RollbackOnDrop<'_> {
    fn drop(&mut self) {
        if self.store.in_transaction() {
            warn!(owner = self.owner, "transaction abandoned, rolling back");
            if let Err(e) = self.store.rollback() {
                warn!(owner = self.owner, error = %e, "rollback on drop failed");
            }
        }
    }
}
