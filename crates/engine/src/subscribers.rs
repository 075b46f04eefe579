//! Committed-operation subscribers
//!
//! Callbacks run synchronously after base mutation, once per operation, in
//! commit order. They never see uncommitted or rolled-back work.

use folio_core::Operation;

/// Handle returned by `on_operation`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw handle value
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// Boxed operation callback
pub type OperationCallback = Box<dyn Fn(&Operation) + Send + 'static>;

/// Registered subscribers, in registration order
#[derive(Default)]
pub(crate) struct Subscribers {
    entries: Vec<(SubscriptionId, OperationCallback)>,
    next_id: u64,
}

impl Subscribers {
    pub(crate) fn add(&mut self, callback: OperationCallback) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.entries.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(sid, _)| *sid != id);
        self.entries.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Deliver every operation to every subscriber
    ///
    /// Operations are the outer loop so each subscriber sees the full
    /// commit in order before the next operation starts.
    pub(crate) fn emit(&self, operations: &[Operation]) {
        for op in operations {
            for (_, callback) in &self.entries {
                callback(op);
            }
        }
    }
}

impl std::fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.entries.len())
            .finish()
    }
}
