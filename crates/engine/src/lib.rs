//! Transactional document store engine
//!
//! This crate wires the lower layers into the public store:
//! - [`DocumentStore`]: transaction controller with overlay-aware reads,
//!   copy-on-write writes, ordered commit, and operation subscribers
//! - [`Database`]: a store paired with its FIFO write lock, with closure
//!   transactions
//! - [`StoreOptions`]: configuration and presets
//!
//! # Example
//!
//! ```ignore
//! use folio_engine::{Database, NodeDraft, NodePatch};
//!
//! let db = Database::default();
//! db.transaction("editor", |txn| {
//!     let p = txn.insert_node("root", 0, NodeDraft::text("paragraph", "Hello"))?;
//!     txn.update_node(p.as_str(), NodePatch::new().text("Hello World"))?;
//!     Ok(())
//! })?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod database;
pub mod options;
pub mod store;
pub mod subscribers;
mod text;
mod traverse;
mod write;

pub use database::Database;
pub use options::{StoreOptions, DEFAULT_ROOT_ID, DEFAULT_ROOT_TYPE};
pub use store::DocumentStore;
pub use subscribers::{OperationCallback, SubscriptionId};

pub use folio_concurrency::{CommitReceipt, TransactionStatus};
pub use folio_core::{NodeDraft, NodePatch};
