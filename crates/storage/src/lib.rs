//! Storage layer for folio
//!
//! This crate implements the committed side of the store:
//! - NodeTable: FxHashMap-based base table with a commit version
//! - Snapshot: flat export/import of a table plus its root id, with a
//!   checksummed MessagePack envelope

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod snapshot;
pub mod table;

pub use snapshot::{Snapshot, SNAPSHOT_FORMAT, SNAPSHOT_MAGIC};
pub use table::NodeTable;
