//! Convenient imports for folio.
//!
//! This module re-exports the most commonly used types so you can get started
//! with a single import:
//!
//! ```ignore
//! use foliodb::prelude::*;
//!
//! let doc = Folio::open()?;
//! doc.transaction("editor", |txn| txn.create_node(NodeDraft::leaf("image")))?;
//! ```

// Main entry point
pub use crate::database::{Folio, FolioBuilder};

// Error handling
pub use folio_core::{Error, Result};

// Node model
pub use folio_core::{Attributes, Child, Mark, Node, NodeDraft, NodeId, NodeKind, NodePatch, Value};

// Operation log
pub use folio_core::{Operation, OperationKind};

// Schema
pub use folio_core::{AcceptAll, NodeRule, SchemaValidator, TypeSchema, ValidationOutcome};

// Store
pub use folio_engine::{Database, DocumentStore, StoreOptions, SubscriptionId, TransactionStatus};

// Snapshots
pub use folio_storage::Snapshot;

// Re-export serde_json for convenience
pub use serde_json::json;
