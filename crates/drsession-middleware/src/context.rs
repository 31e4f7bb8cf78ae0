//! Request-context attachment of sessions.

use std::collections::HashMap;

use drsession_session::Session;

/// Sessions attached to a request, keyed by attribute name.
///
/// Lives in the request extensions next to the bare [`Session`], so that
/// several session layers configured with different attribute names can be
/// stacked on one service.
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    sessions: HashMap<String, Session>,
}

impl SessionContext {
    /// Get the session attached under `attribute`.
    #[must_use]
    pub fn get(&self, attribute: &str) -> Option<&Session> {
        self.sessions.get(attribute)
    }

    /// Attach a session under `attribute`, replacing any previous one.
    pub fn insert(&mut self, attribute: impl Into<String>, session: Session) {
        self.sessions.insert(attribute.into(), session);
    }

    /// Number of attached sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Whether no session is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
