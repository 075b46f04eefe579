//! Session-scoped node id generation
//!
//! Ids have the form `<session>:<counter>`. Two generators with different
//! session ids never mint the same id, so independent writers (e.g.
//! collaborating replicas) need no coordination.

use crate::node::NodeId;
use uuid::Uuid;

/// Session used when none is supplied
pub const DEFAULT_SESSION: &str = "0";

/// Mints `<session>:<counter>` node ids
///
/// The counter increases monotonically per session and is reset only by
/// [`IdGenerator::set_session_id`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdGenerator {
    session_id: String,
    counter: u64,
}

impl IdGenerator {
    /// Create a generator for the given session
    pub fn new(session_id: impl Into<String>) -> Self {
        IdGenerator {
            session_id: session_id.into(),
            counter: 0,
        }
    }

    /// Create a generator with a random UUID v4 session
    pub fn random_session() -> Self {
        Self::new(Uuid::new_v4().simple().to_string())
    }

    /// Mint the next id
    pub fn next_id(&mut self) -> NodeId {
        self.counter += 1;
        NodeId::new(format!("{}:{}", self.session_id, self.counter))
    }

    /// Current session id
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Last counter value handed out (0 if none)
    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Switch session, resetting the counter
    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = session_id.into();
        self.counter = 0;
    }

    /// Advance past an id minted elsewhere for this same session
    ///
    /// Used after restoring a snapshot so fresh ids cannot collide with
    /// restored ones. Ids from other sessions or custom ids are ignored.
    pub fn observe(&mut self, id: &NodeId) {
        if let Some((session, n)) = parse(id) {
            if session == self.session_id && n > self.counter {
                self.counter = n;
            }
        }
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION)
    }
}

/// Split a generated id into its session and counter
///
/// Returns `None` for ids not in `<session>:<counter>` form.
pub fn parse(id: &NodeId) -> Option<(&str, u64)> {
    let (session, counter) = id.as_str().rsplit_once(':')?;
    let n = counter.parse().ok()?;
    Some((session, n))
}
