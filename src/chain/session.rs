//! In-memory chat session histories.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::types::Message;

/// Session-keyed message histories. A history is created lazily the
/// first time its id is read, so unknown ids behave like empty sessions
/// rather than errors.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Vec<Message>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the history for `session_id`, creating it if absent.
    pub fn history(&self, session_id: &str) -> Vec<Message> {
        self.sessions
            .write()
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    pub fn append(&self, session_id: &str, message: Message) {
        self.sessions
            .write()
            .entry(session_id.to_string())
            .or_default()
            .push(message);
    }

    pub fn len(&self, session_id: &str) -> usize {
        self.sessions
            .read()
            .get(session_id)
            .map(|h| h.len())
            .unwrap_or(0)
    }
}
