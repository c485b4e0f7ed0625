//! Per-conversation exclusivity for exchanges.

use std::collections::HashSet;

use parking_lot::Mutex;
use pplx_common::ChatError;

/// Ids of conversations with an exchange in flight.
#[derive(Default)]
pub(crate) struct InFlight(Mutex<HashSet<String>>);

/// Marks a conversation busy until dropped, including when the owning
/// future is cancelled.
pub(crate) struct InFlightGuard<'a> {
    set: &'a InFlight,
    id: String,
}

impl<'a> InFlightGuard<'a> {
    /// Returns `ConversationBusy` if `id` already has an exchange running.
    pub(crate) fn acquire(set: &'a InFlight, id: &str) -> Result<Self, ChatError> {
        if !set.0.lock().insert(id.to_string()) {
            return Err(ChatError::ConversationBusy(id.to_string()));
        }
        Ok(Self {
            set,
            id: id.to_string(),
        })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.set.0.lock().remove(&self.id);
    }
}
