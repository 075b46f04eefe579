//! Concurrency layer for folio
//!
//! This crate implements the single-writer transaction machinery:
//! - [`WriteLock`]: FIFO write lock with timeouts and an RAII guard
//! - [`Overlay`]: copy-on-write scratch space over the base table
//! - [`AliasTable`]: transaction-scoped symbolic names
//! - [`TransactionManager`]: ordered replay of an overlay into base
//! - [`TransactionStatus`]: the controller state machine

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod alias;
pub mod lock;
pub mod manager;
pub mod overlay;
pub mod status;

pub use alias::AliasTable;
pub use lock::{LockId, LockOptions, LockStats, WriteLock, WriteLockGuard, DEFAULT_LOCK_TIMEOUT};
pub use manager::{CommitReceipt, TransactionManager};
pub use overlay::{Lookup, Overlay};
pub use status::TransactionStatus;
