//! Store configuration

use folio_concurrency::{LockOptions, DEFAULT_LOCK_TIMEOUT};
use folio_core::id::DEFAULT_SESSION;
use folio_core::NodeId;
use std::time::Duration;

/// Default root node id
pub const DEFAULT_ROOT_ID: &str = "root";

/// Default root node type
pub const DEFAULT_ROOT_TYPE: &str = "doc";

/// Document store options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreOptions {
    /// Session prefix for generated ids
    pub session_id: String,
    /// Id of the root node created on open
    pub root_id: NodeId,
    /// Type of the root node created on open
    pub root_type: String,
    /// Wait budget for the write lock
    pub lock_timeout: Duration,
    /// Whether non-structural updates are schema-validated
    pub validate_updates: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        StoreOptions {
            session_id: DEFAULT_SESSION.to_string(),
            root_id: NodeId::from(DEFAULT_ROOT_ID),
            root_type: DEFAULT_ROOT_TYPE.to_string(),
            lock_timeout: DEFAULT_LOCK_TIMEOUT,
            validate_updates: true,
        }
    }
}

impl StoreOptions {
    /// Strict options - short lock budget, every update validated
    pub fn strict() -> Self {
        StoreOptions {
            lock_timeout: Duration::from_secs(1),
            validate_updates: true,
            ..Default::default()
        }
    }

    /// Relaxed options - long lock budget, only creates validated
    pub fn relaxed() -> Self {
        StoreOptions {
            lock_timeout: Duration::from_secs(30),
            validate_updates: false,
            ..Default::default()
        }
    }

    /// Lock options derived from these store options
    pub fn lock_options(&self) -> LockOptions {
        LockOptions {
            timeout: self.lock_timeout,
        }
    }
}
