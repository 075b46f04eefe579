//! # folio
//!
//! In-memory transactional document store for structured editors.
//!
//! folio holds a mutable tree of typed nodes and applies groups of edits
//! atomically: writes land in a copy-on-write overlay, commit replays them
//! into the base table in a fixed kind order, and a FIFO write lock keeps
//! one writer at a time.
//!
//! ## Quick Start
//!
//! ```ignore
//! use foliodb::prelude::*;
//!
//! let doc = Folio::open()?;
//!
//! doc.on_operation(|op| println!("{} {}", op.kind(), op.node_id()));
//!
//! doc.transaction("editor", |txn| {
//!     let p = txn.insert_node("root", 0, NodeDraft::text("paragraph", "Hello"))?;
//!     txn.set_alias("greeting", p.as_str())?;
//!     txn.insert_text("greeting", 5, " World")?;
//!     txn.add_mark("greeting", Mark::new("bold", 0, 5))
//! })?;
//! ```
//!
//! ## Layers
//!
//! - [`folio_core`]: node model, operations, ids, schema boundary, errors
//! - [`folio_storage`]: base table and snapshots
//! - [`folio_concurrency`]: write lock, overlay, aliases, commit replay
//! - [`folio_engine`]: the document store and its lock pairing

#![warn(missing_docs)]

mod database;

pub mod prelude;

// Re-export main entry points
pub use database::{Folio, FolioBuilder};
pub use folio_core::{Error, Result};

// Re-export layers
pub use folio_concurrency;
pub use folio_core;
pub use folio_engine;
pub use folio_storage;
