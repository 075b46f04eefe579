//! Error types for the document store
//!
//! A single error enum covers every layer (table, overlay, lock, controller).
//! Callers classify errors with [`Error::is_retryable`] and
//! [`Error::is_caller_bug`] rather than matching every variant.

use crate::node::NodeId;
use thiserror::Error;

/// All document store errors
#[derive(Debug, Error)]
pub enum Error {
    /// Schema rejected a node shape
    ///
    /// Recoverable: fix the input and retry within the same transaction.
    #[error("validation failed for node {node_id}: {}", errors.join("; "))]
    Validation {
        /// Node whose shape was rejected
        node_id: NodeId,
        /// Validator messages
        errors: Vec<String>,
    },

    /// Attempted deletion of the root node
    #[error("cannot delete root node {0}")]
    RootDeletion(NodeId),

    /// Alias already points at a different node
    #[error("alias {alias} already resolves to {existing}, cannot rebind to {requested}")]
    DuplicateAlias {
        /// Alias name
        alias: String,
        /// Node the alias currently points to
        existing: NodeId,
        /// Node the caller tried to bind
        requested: NodeId,
    },

    /// Write lock acquisition exceeded its wait budget
    #[error("lock acquisition for {owner} timed out after {waited_ms}ms")]
    LockTimeout {
        /// Owner that was waiting
        owner: String,
        /// How long the owner waited
        waited_ms: u64,
    },

    /// Operation not valid in the current transaction state
    #[error("invalid transaction state: expected {expected}, found {actual}")]
    TransactionState {
        /// State the operation requires
        expected: &'static str,
        /// State the controller is in
        actual: &'static str,
    },

    /// Node is not visible (never existed, or deleted)
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    /// Node id is already taken
    #[error("node already exists: {0}")]
    NodeExists(NodeId),

    /// Move would break the tree
    #[error("cannot move {node_id}: {reason}")]
    InvalidMove {
        /// Node being moved
        node_id: NodeId,
        /// Why the move was refused
        reason: String,
    },

    /// Text range outside the node's text
    #[error("range {start}..{end} out of bounds for node {node_id} (len {len})")]
    InvalidRange {
        /// Node being edited
        node_id: NodeId,
        /// Range start
        start: usize,
        /// Range end
        end: usize,
        /// Text length in chars
        len: usize,
    },

    /// Release attempted while nobody holds the lock
    #[error("write lock is not held")]
    LockNotHeld,

    /// Release attempted with a stale or foreign lock id
    #[error("lock id mismatch: held by {expected}, release requested for {actual}")]
    LockMismatch {
        /// Lock id of the current holder
        expected: u64,
        /// Lock id passed to release
        actual: u64,
    },

    /// Serialization or deserialization failure
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Corrupt snapshot bytes
    #[error("corruption: {0}")]
    Corruption(String),
}

/// Result type for document store operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error may succeed on retry
    ///
    /// Only lock timeouts are retryable; everything else needs new input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::LockTimeout { .. })
    }

    /// Check if this is a schema validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Check if this error indicates misuse of the API
    pub fn is_caller_bug(&self) -> bool {
        matches!(
            self,
            Error::DuplicateAlias { .. }
                | Error::TransactionState { .. }
                | Error::LockNotHeld
                | Error::LockMismatch { .. }
                | Error::RootDeletion(_)
        )
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NodeNotFound(_))
    }
}

impl From<rmp_serde::encode::Error> for Error {
    fn from(e: rmp_serde::encode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for Error {
    fn from(e: rmp_serde::decode::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
