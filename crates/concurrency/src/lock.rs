//! Single-writer lock with a FIFO wait queue
//!
//! At most one transaction mutates a store at a time. Writers that find the
//! lock held queue up and are granted strictly in arrival order. A waiter
//! that exceeds its timeout leaves the queue and fails with
//! [`Error::LockTimeout`].
//!
//! ## Protocol
//!
//! ```text
//! requested → (queued if held) → granted → held → released
//!                                                    ↓
//!                                   next waiter granted, or slot empty
//! ```
//!
//! `acquire` is the only blocking call in the store. Each grant carries a
//! fresh [`LockId`] that authorizes the matching `release`.

use folio_core::{Error, Result};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Identifier handed out per grant
pub type LockId = u64;

/// Default wait budget for `acquire`
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Write lock configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Maximum time a waiter stays queued
    pub timeout: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        LockOptions {
            timeout: DEFAULT_LOCK_TIMEOUT,
        }
    }
}

/// Lock counters, for observability only
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockStats {
    /// Successful grants
    pub acquisitions: u64,
    /// Successful releases
    pub releases: u64,
    /// Waiters that gave up
    pub timeouts: u64,
    /// Sum of time spent between request and grant
    pub total_wait: Duration,
}

impl LockStats {
    /// Mean time between request and grant
    pub fn average_wait(&self) -> Duration {
        if self.acquisitions == 0 {
            return Duration::ZERO;
        }
        let nanos = self.total_wait.as_nanos() / u128::from(self.acquisitions);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

#[derive(Debug)]
struct Holder {
    lock_id: LockId,
    owner: String,
}

#[derive(Debug)]
struct Waiter {
    ticket: u64,
    owner: String,
}

#[derive(Debug, Default)]
struct LockState {
    holder: Option<Holder>,
    queue: VecDeque<Waiter>,
    next_lock_id: LockId,
    next_ticket: u64,
    stats: LockStats,
}

impl LockState {
    fn grant(&mut self, owner: &str, requested_at: Instant) -> LockId {
        self.next_lock_id += 1;
        let lock_id = self.next_lock_id;
        self.holder = Some(Holder {
            lock_id,
            owner: owner.to_string(),
        });
        self.stats.acquisitions += 1;
        self.stats.total_wait += requested_at.elapsed();
        lock_id
    }

    fn is_next(&self, ticket: u64) -> bool {
        self.holder.is_none() && self.queue.front().map(|w| w.ticket) == Some(ticket)
    }
}

/// FIFO write lock
///
/// Each store owns its own lock; there is no process-wide lock state.
///
/// # Thread Safety
///
/// All methods take `&self`. Waiters block on a condvar; every release
/// wakes the queue and only the waiter at the front may take the slot.
#[derive(Debug)]
pub struct WriteLock {
    state: Mutex<LockState>,
    granted: Condvar,
    options: LockOptions,
}

impl WriteLock {
    /// Create a lock with default options
    pub fn new() -> Self {
        Self::with_options(LockOptions::default())
    }

    /// Create a lock with explicit options
    pub fn with_options(options: LockOptions) -> Self {
        WriteLock {
            state: Mutex::new(LockState::default()),
            granted: Condvar::new(),
            options,
        }
    }

    /// Configured options
    pub fn options(&self) -> LockOptions {
        self.options
    }

    /// Acquire using the configured timeout
    pub fn acquire(&self, owner: &str) -> Result<LockId> {
        self.acquire_timeout(owner, self.options.timeout)
    }

    /// Acquire, waiting at most `timeout`
    ///
    /// Grants immediately when the slot is free and nobody is queued.
    /// Otherwise the caller joins the back of the queue.
    pub fn acquire_timeout(&self, owner: &str, timeout: Duration) -> Result<LockId> {
        let requested_at = Instant::now();
        let deadline = requested_at + timeout;
        let mut state = self.state.lock();

        if state.holder.is_none() && state.queue.is_empty() {
            return Ok(state.grant(owner, requested_at));
        }

        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.queue.push_back(Waiter {
            ticket,
            owner: owner.to_string(),
        });
        debug!(owner, ticket, queued = state.queue.len(), "write lock busy, queued");

        loop {
            if state.is_next(ticket) {
                state.queue.pop_front();
                return Ok(state.grant(owner, requested_at));
            }

            if Instant::now() >= deadline {
                state.queue.retain(|w| w.ticket != ticket);
                state.stats.timeouts += 1;
                let waited = requested_at.elapsed();
                drop(state);
                // The next waiter may have been stuck behind us
                self.granted.notify_all();
                warn!(owner, waited_ms = waited.as_millis() as u64, "write lock timed out");
                return Err(Error::LockTimeout {
                    owner: owner.to_string(),
                    waited_ms: waited.as_millis() as u64,
                });
            }

            self.granted.wait_until(&mut state, deadline);
        }
    }

    /// Grant only if the lock is free right now
    pub fn try_acquire(&self, owner: &str) -> Option<LockId> {
        let mut state = self.state.lock();
        if state.holder.is_none() && state.queue.is_empty() {
            Some(state.grant(owner, Instant::now()))
        } else {
            None
        }
    }

    /// Acquire and wrap the grant in a guard that releases on drop
    pub fn acquire_guard(&self, owner: &str) -> Result<WriteLockGuard<'_>> {
        let lock_id = self.acquire(owner)?;
        Ok(WriteLockGuard {
            lock: self,
            lock_id,
            released: false,
        })
    }

    /// Release the lock
    ///
    /// With `Some(id)` the id must match the current holder. With `None`
    /// whoever holds the lock is released.
    pub fn release(&self, lock_id: Option<LockId>) -> Result<()> {
        let mut state = self.state.lock();
        let holder = state.holder.as_ref().ok_or(Error::LockNotHeld)?;
        if let Some(id) = lock_id {
            if id != holder.lock_id {
                return Err(Error::LockMismatch {
                    expected: holder.lock_id,
                    actual: id,
                });
            }
        }
        state.holder = None;
        state.stats.releases += 1;
        drop(state);
        self.granted.notify_all();
        Ok(())
    }

    /// Check if someone holds the lock
    pub fn is_locked(&self) -> bool {
        self.state.lock().holder.is_some()
    }

    /// Current holder's lock id and owner
    pub fn holder(&self) -> Option<(LockId, String)> {
        self.state
            .lock()
            .holder
            .as_ref()
            .map(|h| (h.lock_id, h.owner.clone()))
    }

    /// Number of queued waiters
    pub fn queue_len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Snapshot of the counters
    pub fn stats(&self) -> LockStats {
        self.state.lock().stats
    }
}

impl Default for WriteLock {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII grant of a [`WriteLock`]
///
/// Releases on drop, so every exit path (including `?` and panics) frees
/// the lock.
#[derive(Debug)]
pub struct WriteLockGuard<'a> {
    lock: &'a WriteLock,
    lock_id: LockId,
    released: bool,
}

impl WriteLockGuard<'_> {
    /// Id of this grant
    pub fn lock_id(&self) -> LockId {
        self.lock_id
    }

    /// Release now and surface any error
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        self.lock.release(Some(self.lock_id))
    }
}

impl Drop for WriteLockGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.lock.release(Some(self.lock_id)) {
                warn!(lock_id = self.lock_id, error = %e, "write lock guard release failed");
            }
        }
    }
}
