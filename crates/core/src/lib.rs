//! Core types for the folio document store
//!
//! This crate defines the vocabulary shared by every layer:
//! - [`Node`], [`NodeId`], [`Mark`]: the unit of storage
//! - [`NodeDraft`], [`NodePatch`]: create and update inputs
//! - [`Operation`]: the recorded mutation log
//! - [`IdGenerator`]: coordination-free `session:counter` ids
//! - [`SchemaValidator`]: the validation boundary
//! - [`Error`], [`Result`]: the error taxonomy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id;
pub mod node;
pub mod operation;
pub mod schema;
pub mod value;

pub use error::{Error, Result};
pub use id::IdGenerator;
pub use node::{Child, Mark, Node, NodeDraft, NodeId, NodeKind, NodePatch};
pub use operation::{in_commit_order, Operation, OperationKind};
pub use schema::{AcceptAll, NodeRule, SchemaValidator, TypeSchema, ValidationOutcome};
pub use value::{Attributes, Value};
